//! Element and attribute vocabulary.

/// Tags a component body may use.
pub const KNOWN_TAGS: &[&str] = &[
    "div", "span", "p", "ul", "li", "button", "input", "table", "progress", "hr", "br",
];

/// Tags that never take children.
pub fn is_void_tag(tag: &str) -> bool {
    matches!(tag, "hr" | "br" | "input")
}

pub fn is_known_tag(tag: &str) -> bool {
    KNOWN_TAGS.contains(&tag)
}

pub const KNOWN_ATTRIBUTES: &[&str] = &[
    // Dimensions
    "width",
    "widthPercent",
    "height",
    "heightPercent",
    "minWidth",
    "minHeight",
    "maxWidth",
    "maxHeight",
    // Flex container
    "direction",
    "justify",
    "align",
    "gap",
    // Flex item
    "flexGrow",
    "flexShrink",
    "alignSelf",
    // Spacing
    "padding",
    "margin",
    // Visual
    "border",
    "borderStyle",
    "background",
    // Text
    "text",
    "textStyle",
    "textAlign",
    // Focus and events
    "onFocus",
    "onBlur",
    "onEvent",
    "focusable",
    "onKeyPress",
    "onClick",
    "onChannel",
    "onTimer",
    // Scrolling
    "scrollable",
    "scrollOffset",
    "scrollbarStyle",
    "scrollbarThumbStyle",
    // Generic
    "disabled",
    "id",
    "class",
    "deps",
    // Refs
    "ref",
    "key",
];

pub fn is_known_attribute(name: &str) -> bool {
    KNOWN_ATTRIBUTES.contains(&name)
}

/// Common misspellings, keyed by lowercased name.
const ATTRIBUTE_TYPOS: &[(&str, &str)] = &[
    ("colour", "background"),
    ("color", "background"),
    ("onclick", "onEvent"),
    ("onfocus", "onFocus"),
    ("onblur", "onBlur"),
    ("flexgrow", "flexGrow"),
    ("flexshrink", "flexShrink"),
    ("textstyle", "textStyle"),
    ("textalign", "textAlign"),
    ("alignself", "alignSelf"),
    ("borderstyle", "borderStyle"),
];

/// Suggest a replacement for an unknown attribute name, if one is known.
pub fn suggest_attribute(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    ATTRIBUTE_TYPOS
        .iter()
        .find(|(typo, _)| *typo == lower)
        .map(|(_, fix)| *fix)
}

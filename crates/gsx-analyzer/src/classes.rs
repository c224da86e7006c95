//! Utility-class validation.
//!
//! A `class="..."` attribute holds whitespace-separated utility classes such
//! as `flex-col gap-2 border-rounded`. Each class is checked by a
//! [`ClassTranslator`]; the analyzer only needs to know whether a class is
//! valid, which runtime package it pulls in, and a suggestion when it is not.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Runtime packages a generated file may need to import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Element,
    Layout,
    Tui,
}

impl ImportKind {
    pub fn path(&self) -> &'static str {
        match self {
            ImportKind::Element => "github.com/grindlemire/go-tui/pkg/tui/element",
            ImportKind::Layout => "github.com/grindlemire/go-tui/pkg/layout",
            ImportKind::Tui => "github.com/grindlemire/go-tui/pkg/tui",
        }
    }
}

/// Result of translating one valid class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassTranslation {
    pub needs: Option<ImportKind>,
}

/// Pluggable class vocabulary.
pub trait ClassTranslator {
    /// `None` when the class is unknown.
    fn translate(&self, class: &str) -> Option<ClassTranslation>;

    /// A close valid class for an unknown one.
    fn suggest(&self, class: &str) -> Option<String>;
}

/// One class within an attribute value, with its character range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassToken<'a> {
    pub class: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Split a class attribute value on spaces and tabs. `start`/`end` count
/// characters from the start of the value.
pub fn class_tokens(value: &str) -> Vec<ClassToken<'_>> {
    let mut tokens = Vec::new();
    let mut current: Option<(usize, usize)> = None; // (byte start, char start)
    let mut chars = 0;

    for (byte, ch) in value.char_indices() {
        if ch == ' ' || ch == '\t' {
            if let Some((start_byte, start)) = current.take() {
                tokens.push(ClassToken {
                    class: &value[start_byte..byte],
                    start,
                    end: chars,
                });
            }
        } else if current.is_none() {
            current = Some((byte, chars));
        }
        chars += 1;
    }
    if let Some((start_byte, start)) = current {
        tokens.push(ClassToken {
            class: &value[start_byte..],
            start,
            end: chars,
        });
    }
    tokens
}

// ---------------------------------------------------------------------------
// Built-in vocabulary
// ---------------------------------------------------------------------------

const LAYOUT: Option<ImportKind> = Some(ImportKind::Layout);
const TUI: Option<ImportKind> = Some(ImportKind::Tui);

const STATIC_CLASSES: &[(&str, Option<ImportKind>)] = &[
    // Direction
    ("flex", LAYOUT),
    ("flex-row", LAYOUT),
    ("flex-col", LAYOUT),
    // Grow and shrink
    ("flex-grow", None),
    ("flex-shrink", None),
    ("grow", None),
    ("grow-0", None),
    ("shrink", None),
    ("shrink-0", None),
    ("flex-1", None),
    ("flex-auto", None),
    ("flex-initial", None),
    ("flex-none", None),
    // Justify
    ("justify-start", LAYOUT),
    ("justify-center", LAYOUT),
    ("justify-end", LAYOUT),
    ("justify-between", LAYOUT),
    ("justify-around", LAYOUT),
    ("justify-evenly", LAYOUT),
    // Align
    ("items-start", LAYOUT),
    ("items-center", LAYOUT),
    ("items-end", LAYOUT),
    ("items-stretch", LAYOUT),
    ("self-start", LAYOUT),
    ("self-end", LAYOUT),
    ("self-center", LAYOUT),
    ("self-stretch", LAYOUT),
    // Text alignment
    ("text-left", None),
    ("text-center", None),
    ("text-right", None),
    // Borders
    ("border", TUI),
    ("border-rounded", TUI),
    ("border-double", TUI),
    ("border-thick", TUI),
    ("border-red", TUI),
    ("border-green", TUI),
    ("border-blue", TUI),
    ("border-cyan", TUI),
    ("border-magenta", TUI),
    ("border-yellow", TUI),
    ("border-white", TUI),
    ("border-black", TUI),
    // Text style
    ("font-bold", None),
    ("font-dim", None),
    ("italic", None),
    ("underline", None),
    ("blink", None),
    ("reverse", None),
    ("strikethrough", None),
    // Foreground
    ("text-red", TUI),
    ("text-green", TUI),
    ("text-blue", TUI),
    ("text-cyan", TUI),
    ("text-magenta", TUI),
    ("text-yellow", TUI),
    ("text-white", TUI),
    ("text-black", TUI),
    // Background
    ("bg-red", TUI),
    ("bg-green", TUI),
    ("bg-blue", TUI),
    ("bg-cyan", TUI),
    ("bg-magenta", TUI),
    ("bg-yellow", TUI),
    ("bg-white", TUI),
    ("bg-black", TUI),
    // Scrolling
    ("overflow-scroll", None),
    ("overflow-y-scroll", None),
    ("overflow-x-scroll", None),
];

/// Numeric families: spacing, sizing, fractions, and grow/shrink factors.
/// Fractions with a zero denominator are rejected.
static PATTERN_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:gap-\d+|[pm][xytrbl]?-\d+|(?:min-|max-)?[wh]-\d+|[wh]-\d+/0*[1-9]\d*|[wh]-(?:full|auto)|flex-(?:grow|shrink)-\d+)$",
    )
    .expect("class pattern is a valid regex")
});

/// Misspellings and near-misses with a direct fix.
const SIMILAR_CLASSES: &[(&str, &str)] = &[
    ("flex-column", "flex-col"),
    ("flex-columns", "flex-col"),
    ("flex-rows", "flex-row"),
    ("col", "flex-col"),
    ("column", "flex-col"),
    ("columns", "flex-col"),
    ("row", "flex-row"),
    ("rows", "flex-row"),
    ("gap", "gap-1"),
    ("padding", "p-1"),
    ("margin", "m-1"),
    ("bold", "font-bold"),
    ("dim", "font-dim"),
    ("width", "w-1"),
    ("height", "h-1"),
    ("center", "text-center"),
    ("left", "text-left"),
    ("right", "text-right"),
    ("align-center", "text-center"),
    ("align-left", "text-left"),
    ("align-right", "text-right"),
    ("no-grow", "grow-0"),
    ("no-shrink", "shrink-0"),
    ("padding-top", "pt-1"),
    ("padding-bottom", "pb-1"),
    ("padding-left", "pl-1"),
    ("padding-right", "pr-1"),
    ("margin-top", "mt-1"),
    ("margin-bottom", "mb-1"),
    ("margin-left", "ml-1"),
    ("margin-right", "mr-1"),
];

/// Representative members of each numeric family, used as fuzzy-match
/// candidates alongside the static classes.
const PATTERN_EXAMPLES: &[&str] = &[
    "gap-1", "gap-2", "gap-3", "gap-4",
    "p-1", "p-2", "p-3", "p-4",
    "px-1", "px-2", "px-3", "px-4",
    "py-1", "py-2", "py-3", "py-4",
    "pt-1", "pt-2", "pt-3", "pt-4",
    "pr-1", "pr-2", "pr-3", "pr-4",
    "pb-1", "pb-2", "pb-3", "pb-4",
    "pl-1", "pl-2", "pl-3", "pl-4",
    "m-1", "m-2", "m-3", "m-4",
    "mt-1", "mt-2", "mt-3", "mt-4",
    "mr-1", "mr-2", "mr-3", "mr-4",
    "mb-1", "mb-2", "mb-3", "mb-4",
    "ml-1", "ml-2", "ml-3", "ml-4",
    "mx-1", "mx-2", "mx-3", "mx-4",
    "my-1", "my-2", "my-3", "my-4",
    "w-1", "w-10", "w-20", "w-50", "w-100", "w-full", "w-auto",
    "w-1/2", "w-1/3", "w-2/3", "w-1/4", "w-3/4",
    "h-1", "h-10", "h-20", "h-50", "h-100", "h-full", "h-auto",
    "h-1/2", "h-1/3", "h-2/3", "h-1/4", "h-3/4",
    "min-w-1", "min-w-10", "max-w-50", "max-w-100",
    "min-h-1", "min-h-10", "max-h-50", "max-h-100",
    "flex-grow-0", "flex-grow-1", "flex-grow-2",
    "flex-shrink-0", "flex-shrink-1", "flex-shrink-2",
];

/// Edit distance a fuzzy suggestion must stay strictly below.
const MAX_SUGGESTION_DISTANCE: usize = 4;

/// The built-in utility-class vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct UtilityClasses;

impl UtilityClasses {
    pub fn new() -> Self {
        Self
    }

    fn candidates() -> impl Iterator<Item = &'static str> {
        STATIC_CLASSES
            .iter()
            .map(|(name, _)| *name)
            .chain(PATTERN_EXAMPLES.iter().copied())
    }
}

impl ClassTranslator for UtilityClasses {
    fn translate(&self, class: &str) -> Option<ClassTranslation> {
        if let Some((_, needs)) = STATIC_CLASSES.iter().find(|(name, _)| *name == class) {
            return Some(ClassTranslation { needs: *needs });
        }
        if PATTERN_CLASS.is_match(class) {
            return Some(ClassTranslation { needs: None });
        }
        None
    }

    fn suggest(&self, class: &str) -> Option<String> {
        if let Some((_, fix)) = SIMILAR_CLASSES.iter().find(|(typo, _)| *typo == class) {
            return Some((*fix).to_string());
        }

        let mut best: Option<(&str, usize)> = None;
        for candidate in Self::candidates() {
            let distance = levenshtein(class, candidate);
            if distance >= MAX_SUGGESTION_DISTANCE {
                continue;
            }
            match best {
                Some((_, d)) if d <= distance => {}
                _ => best = Some((candidate, distance)),
            }
        }
        best.map(|(name, _)| name.to_string())
    }
}

/// Edit distance over characters, two rows at a time.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

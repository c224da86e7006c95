//! Element naming.
//!
//! Generated code refers to elements by name. An element with a `#Ref`
//! outside any loop takes its ref name; every other element takes the next
//! `__tmp_N` from a per-component counter. The counter also reserves a slot
//! for each expression or text child, except when the element is a `span`
//! or `p` with exactly one child (that child renders inline).
//!
//! Both state-binding detection and code generation must agree on these
//! names, so the walk lives here and nowhere else.

use gsx_parser::ast::{Element, Node};

/// An element reached by [`visit_elements`], with the name it is emitted as.
#[derive(Debug, Clone, Copy)]
pub struct NamedElement<'a> {
    pub element: &'a Element,
    pub name: &'a str,
    /// Inside an `@for` body at any depth.
    pub in_loop: bool,
    /// Names of the text elements generated for this element's text and
    /// expression children, in order. Empty when the single child renders
    /// inline.
    pub text_names: &'a [String],
}

impl NamedElement<'_> {
    /// Name of the element that displays text or expression child `index`.
    ///
    /// That is the element itself when its child renders inline, otherwise
    /// the child's own slot. `None` for element and directive children.
    pub fn child_name(&self, index: usize) -> Option<&str> {
        let children = &self.element.children;
        if !is_text_child(children.get(index)?) {
            return None;
        }
        if renders_inline(self.element) {
            return Some(self.name);
        }
        let rank = children[..index].iter().filter(|c| is_text_child(c)).count();
        self.text_names.get(rank).map(String::as_str)
    }
}

/// Visit every element of a component body in emission order.
///
/// The element bound by `@let` is not visited (it is emitted under the
/// binding's own name); its children are.
pub fn visit_elements<F>(body: &[Node], mut visit: F)
where
    F: FnMut(NamedElement<'_>),
{
    let mut namer = Namer::default();
    namer.walk(body, false, &mut visit);
}

/// Names of every element in a component body, in emission order.
pub fn element_names(body: &[Node]) -> Vec<String> {
    let mut names = Vec::new();
    visit_elements(body, |el| names.push(el.name.to_string()));
    names
}

#[derive(Default)]
struct Namer {
    next: usize,
}

impl Namer {
    fn assign(&mut self) -> String {
        let name = format!("__tmp_{}", self.next);
        self.next += 1;
        name
    }

    fn walk<F>(&mut self, nodes: &[Node], in_loop: bool, visit: &mut F)
    where
        F: FnMut(NamedElement<'_>),
    {
        for node in nodes {
            match node {
                Node::Element(el) => self.element(el, in_loop, visit),
                Node::Let(binding) => self.walk(&binding.element.children, in_loop, visit),
                Node::For(lp) => self.walk(&lp.body, true, visit),
                Node::If(stmt) => {
                    self.walk(&stmt.then_branch, in_loop, visit);
                    self.walk(&stmt.else_branch, in_loop, visit);
                }
                Node::Call(call) => self.walk(&call.children, in_loop, visit),
                _ => {}
            }
        }
    }

    fn element<F>(&mut self, el: &Element, in_loop: bool, visit: &mut F)
    where
        F: FnMut(NamedElement<'_>),
    {
        let name = match &el.named_ref {
            Some(name) if !in_loop => name.clone(),
            _ => self.assign(),
        };
        let text_names: Vec<String> = if renders_inline(el) {
            Vec::new()
        } else {
            el.children
                .iter()
                .filter(|c| is_text_child(c))
                .map(|_| self.assign())
                .collect()
        };
        visit(NamedElement {
            element: el,
            name: &name,
            in_loop,
            text_names: &text_names,
        });

        self.walk(&el.children, in_loop, visit);
    }
}

fn renders_inline(el: &Element) -> bool {
    matches!(el.tag.as_str(), "span" | "p") && el.children.len() == 1
}

fn is_text_child(node: &Node) -> bool {
    matches!(node, Node::GoExpr(_) | Node::Text(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(body: &str) -> Vec<String> {
        let source = format!("package ui\n\n@component C() {{\n{body}\n}}\n");
        let file = gsx_parser::parse("test.gsx", &source).into_result().unwrap();
        element_names(&file.components[0].body)
    }

    #[test]
    fn test_sequential_names() {
        assert_eq!(
            names("<div>\n<hr />\n<br />\n</div>"),
            vec!["__tmp_0", "__tmp_1", "__tmp_2"]
        );
    }

    #[test]
    fn test_ref_outside_loop_uses_ref_name() {
        assert_eq!(
            names("<div#Root2>\n<hr />\n</div>"),
            vec!["Root2", "__tmp_0"]
        );
    }

    #[test]
    fn test_ref_inside_loop_uses_counter() {
        assert_eq!(
            names("@for _, x := range xs {\n<span#Item>{x}</span>\n}"),
            vec!["__tmp_0"]
        );
    }

    #[test]
    fn test_inline_single_child_reserves_no_slot() {
        assert_eq!(
            names("<div>\n<span>{a}</span>\n<hr />\n</div>"),
            vec!["__tmp_0", "__tmp_1", "__tmp_2"]
        );
    }

    #[test]
    fn test_expression_children_reserve_slots() {
        // div: __tmp_0, then two slots for its text and expression children.
        assert_eq!(
            names("<div>\nhello\n{a}\n<hr />\n</div>"),
            vec!["__tmp_0", "__tmp_3"]
        );
    }

    fn child_names(body: &str) -> Vec<(String, Vec<Option<String>>)> {
        let source = format!("package ui\n\n@component C() {{\n{body}\n}}\n");
        let file = gsx_parser::parse("test.gsx", &source).into_result().unwrap();
        let mut out = Vec::new();
        visit_elements(&file.components[0].body, |el| {
            let children = (0..el.element.children.len())
                .map(|i| el.child_name(i).map(str::to_string))
                .collect();
            out.push((el.name.to_string(), children));
        });
        out
    }

    #[test]
    fn test_child_slots_follow_counted_parent() {
        assert_eq!(
            child_names("<div>{a}</div>"),
            vec![("__tmp_0".to_string(), vec![Some("__tmp_1".to_string())])]
        );
    }

    #[test]
    fn test_child_slots_follow_named_parent() {
        assert_eq!(
            child_names("<div#Box>\nlabel\n{a}\n<hr />\n</div>"),
            vec![
                (
                    "Box".to_string(),
                    vec![
                        Some("__tmp_0".to_string()),
                        Some("__tmp_1".to_string()),
                        None
                    ]
                ),
                ("__tmp_2".to_string(), vec![]),
            ]
        );
    }

    #[test]
    fn test_inline_child_uses_parent_name() {
        assert_eq!(
            child_names("<p#Msg>{a}</p>"),
            vec![("Msg".to_string(), vec![Some("Msg".to_string())])]
        );
    }

    #[test]
    fn test_let_element_is_skipped() {
        assert_eq!(
            names("@let header = <div>\n<hr />\n</div>\n<br />"),
            vec!["__tmp_0", "__tmp_1"]
        );
    }

    #[test]
    fn test_branches_share_one_counter() {
        assert_eq!(
            names("@if ok {\n<hr />\n} @else {\n<br />\n}\n<div></div>"),
            vec!["__tmp_0", "__tmp_1", "__tmp_2"]
        );
    }
}

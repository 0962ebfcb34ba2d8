//! Small helpers over the scraper DOM

use scraper::{ElementRef, Node};

/// Concatenates an element's direct text nodes, converting `<br>` children
/// to newlines and ignoring every other child element. Leading and trailing
/// whitespace is trimmed.
pub fn inner_text(element: &ElementRef) -> String {
    let mut out = String::new();
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Attribute value, or the empty string when absent.
pub fn attr_or_empty<'a>(element: &ElementRef<'a>, name: &str) -> &'a str {
    element.value().attr(name).unwrap_or_default()
}

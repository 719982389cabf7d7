//! Small helpers over `roxmltree`. Element lookups match on local names so
//! namespaced documents (Android repository manifests) and plain ones
//! (PackageInfo, Distribution) are handled the same way.

use crate::error::{ProcessorError, Result};
use roxmltree::{Document, Node};

pub fn parse<'a>(content: &'a str, source_name: &str) -> Result<Document<'a>> {
    Document::parse(content).map_err(|e| ProcessorError::xml(source_name, e))
}

pub fn children_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == name)
}

pub fn first_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == name)
}

pub fn last_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .filter(|child| child.is_element() && child.tag_name().name() == name)
        .last()
}

pub fn first_descendant<'a, 'input>(
    node: Node<'a, 'input>,
    name: &str,
) -> Option<Node<'a, 'input>> {
    node.descendants()
        .find(|child| child.is_element() && child.tag_name().name() == name)
}

/// Trimmed text content of a node, `""` when empty.
pub fn text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().map(str::trim).unwrap_or_default()
}

pub fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    first_child(node, name).map(text)
}

pub fn first_element_child<'a, 'input>(node: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.is_element())
}

/// Drop non-ASCII characters and escape control characters, quotes and
/// backslashes so multi-line license text fits on one line.
pub fn ascii_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars().filter(char::is_ascii) {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

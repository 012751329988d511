//! Label-based field extraction over parsed HTML.
//!
//! Each source declares its fields as `FieldSpec`s — a human-readable label
//! plus the strategy for reaching the value from it — and one generic
//! interpreter walks the document for all of them. Lookup failures are
//! reported as `FieldValue::Missing`, never as errors: a page with a field
//! missing still yields a record.

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node};
use tracing::debug;

/// How to reach a field's value from its label.
#[derive(Debug, Clone, Copy)]
pub enum Strategy {
    /// Label and value are cells of the same row; the value is the next
    /// `td`, `dd`, or grid value cell after the label in document order.
    TableRow,
    /// Label is a heading; the value is the following paragraph.
    HeadingParagraph,
    /// Zero or more value blocks follow the label; accumulate their text
    /// while the continuation class holds, stopping when it disappears.
    RepeatedSibling { class: &'static str },
}

/// One field to pull out of a detail page.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub label: &'static str,
    pub strategy: Strategy,
}

/// Lookup result. `Present` carries the value text (which may legitimately
/// be blank); `Missing` means the label was not found or the surrounding
/// markup had an unexpected shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Present(String),
    Missing,
}

impl FieldValue {
    pub fn into_option(self) -> Option<String> {
        match self {
            FieldValue::Present(v) => Some(v),
            FieldValue::Missing => None,
        }
    }

    pub fn unwrap_or_default(self) -> String {
        match self {
            FieldValue::Present(v) => v,
            FieldValue::Missing => String::new(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }
}

/// Evaluate one field spec against a document.
pub fn extract(doc: &Html, spec: &FieldSpec) -> FieldValue {
    let Some(label) = find_label_node(doc, spec.label) else {
        debug!(label = spec.label, "label not found");
        return FieldValue::Missing;
    };
    let value = match spec.strategy {
        Strategy::TableRow => next_matching(doc, label, is_value_cell),
        Strategy::HeadingParagraph => next_matching(doc, label, |el| el.value().name() == "p"),
        Strategy::RepeatedSibling { class } => accumulate_while(doc, label, class),
    };
    if value.is_missing() {
        debug!(label = spec.label, "label found but no value node");
    }
    value
}

/// Find the literal `needle` text in the document and return the `href` of
/// its enclosing anchor. Used for contact details: the contact name is
/// resolved first, then searched for verbatim.
pub fn anchor_href_for_text(doc: &Html, needle: &str) -> Option<String> {
    let node = find_label_node(doc, needle)?;
    let mut current = node.parent();
    while let Some(parent) = current {
        if let Some(el) = ElementRef::wrap(parent) {
            if el.value().name() == "a" {
                return el.value().attr("href").map(str::to_string);
            }
        }
        current = parent.parent();
    }
    None
}

/// Collapse an element's text content to one whitespace-normalized string.
pub fn element_text(el: ElementRef) -> String {
    let mut out = String::new();
    for chunk in el.text() {
        for word in chunk.split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(word);
        }
    }
    out
}

/// The text node whose trimmed content equals the label, in document order.
fn find_label_node<'a>(doc: &'a Html, label: &str) -> Option<NodeRef<'a, Node>> {
    doc.tree.root().descendants().find(|n| match n.value() {
        Node::Text(t) => t.trim() == label,
        _ => false,
    })
}

/// Elements after `from` in document order.
fn following<'a>(
    doc: &'a Html,
    from: NodeRef<'a, Node>,
) -> impl Iterator<Item = ElementRef<'a>> {
    let from_id = from.id();
    doc.tree
        .root()
        .descendants()
        .skip_while(move |n| n.id() != from_id)
        .skip(1)
        .filter_map(ElementRef::wrap)
}

fn next_matching(
    doc: &Html,
    label: NodeRef<'_, Node>,
    pred: impl Fn(&ElementRef) -> bool,
) -> FieldValue {
    match following(doc, label).find(|el| pred(el)) {
        Some(el) => FieldValue::Present(element_text(el)),
        None => FieldValue::Missing,
    }
}

fn accumulate_while(doc: &Html, label: NodeRef<'_, Node>, class: &str) -> FieldValue {
    let mut parts = Vec::new();
    for el in following(doc, label) {
        if el.value().classes().any(|c| c == class) {
            parts.push(element_text(el));
        } else {
            break;
        }
    }
    if parts.is_empty() {
        FieldValue::Missing
    } else {
        FieldValue::Present(parts.join("; "))
    }
}

/// Value cells: plain table cells, definition values, or the grid value
/// column some portals render rows with.
fn is_value_cell(el: &ElementRef) -> bool {
    matches!(el.value().name(), "td" | "dd") || el.value().classes().any(|c| c == "col-md-8")
}

// ── Tests ──

//! Source-preserving SVG document.
//!
//! The input is parsed once with `roxmltree`, which is read-only. Changes are
//! recorded against byte ranges of the original text and applied when the
//! document is serialized, so everything outside an edited span is written
//! back exactly as it was read.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::{Document, Node, NodeId, ParsingOptions};

use crate::error::SvgError;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s=/>"']+)\s*=\s*("[^"]*"|'[^']*')"#).unwrap()
});
static FLOAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").unwrap());

pub struct SvgDocument<'input> {
    source: &'input str,
    tree: Document<'input>,
    root: NodeId,
    attributes: Vec<(String, String)>,
    removed: Vec<Range<usize>>,
}

impl<'input> SvgDocument<'input> {
    /// Parses `source` and locates the first `<svg>` element in document order.
    pub fn parse(source: &'input str) -> Result<Self, SvgError> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let tree = Document::parse_with_options(source, options)?;
        let root = tree
            .descendants()
            .find(|node| node.is_element() && node.tag_name().name() == "svg")
            .map(|node| node.id())
            .ok_or(SvgError::NoSvgRoot)?;
        Ok(Self {
            source,
            tree,
            root,
            attributes: Vec::new(),
            removed: Vec::new(),
        })
    }

    pub fn source(&self) -> &'input str {
        self.source
    }

    pub fn tree(&self) -> &Document<'input> {
        &self.tree
    }

    pub fn root(&self) -> Node<'_, 'input> {
        self.tree
            .get_node(self.root)
            .unwrap_or_else(|| self.tree.root_element())
    }

    /// Sets an attribute on the root element, replacing any earlier value.
    pub fn set_root_attribute(&mut self, name: &str, value: &str) {
        if let Some(existing) = self.attributes.iter_mut().find(|(n, _)| n == name) {
            existing.1 = value.to_string();
        } else {
            self.attributes.push((name.to_string(), value.to_string()));
        }
    }

    /// Current value of a root attribute, including pending changes.
    pub fn root_attribute(&self, name: &str) -> Option<String> {
        if let Some((_, value)) = self.attributes.iter().find(|(n, _)| n == name) {
            return Some(value.clone());
        }
        self.root().attribute(name).map(str::to_string)
    }

    /// Cuts an element (and its subtree) out of the serialized output.
    ///
    /// Returns `false` when the node is the root, lies outside it, or is already
    /// covered by an earlier removal.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let Some(node) = self.tree.get_node(id) else {
            return false;
        };
        let range = node.range();
        let root = self.root().range();
        if id == self.root || range.start < root.start || range.end > root.end {
            return false;
        }
        if self
            .removed
            .iter()
            .any(|r| r.start <= range.start && range.end <= r.end)
        {
            return false;
        }
        self.removed
            .retain(|r| !(range.start <= r.start && r.end <= range.end));
        self.removed.push(range);
        true
    }

    /// Width and height of the document viewport in user units.
    ///
    /// Taken from the root `viewBox` when present, else from `width`/`height`.
    pub fn viewport(&self) -> Option<(f64, f64)> {
        let root = self.root();
        if let Some(view_box) = root.attribute("viewBox") {
            let values: Vec<f64> = view_box
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|s| !s.is_empty())
                .filter_map(|s| s.parse().ok())
                .collect();
            if let &[_, _, w, h] = values.as_slice() {
                if w > 0.0 && h > 0.0 {
                    return Some((w, h));
                }
            }
        }
        let width = root.attribute("width").and_then(parse_absolute)?;
        let height = root.attribute("height").and_then(parse_absolute)?;
        (width > 0.0 && height > 0.0).then_some((width, height))
    }

    /// The root element's markup with all pending edits applied.
    pub fn to_svg_string(&self) -> String {
        let root = self.root().range();
        let tag_end = start_tag_end(self.source, root.start).unwrap_or(root.end);
        let start_tag = &self.source[root.start..tag_end];
        let existing = scan_attributes(start_tag);

        let mut edits: Vec<(Range<usize>, String)> = Vec::new();
        let mut inserted = String::new();
        for (name, value) in &self.attributes {
            let markup = format!("{name}=\"{}\"", escape_attribute(value));
            match existing.iter().find(|(n, _)| n == name) {
                Some((_, span)) => {
                    edits.push((span.start + root.start..span.end + root.start, markup));
                }
                None => {
                    inserted.push(' ');
                    inserted.push_str(&markup);
                }
            }
        }
        if !inserted.is_empty() {
            let at = root.start + tag_name_end(start_tag);
            edits.push((at..at, inserted));
        }
        for range in &self.removed {
            edits.push((range.clone(), String::new()));
        }
        edits.sort_by_key(|(range, _)| range.start);

        let mut out = String::with_capacity(root.len());
        let mut cursor = root.start;
        for (range, replacement) in edits {
            out.push_str(&self.source[cursor..range.start]);
            out.push_str(&replacement);
            cursor = range.end;
        }
        out.push_str(&self.source[cursor..root.end]);
        out
    }
}

/// Whether the node is an element that belongs to SVG (or carries no namespace).
pub fn is_svg_element(node: &Node<'_, '_>) -> bool {
    node.is_element() && matches!(node.tag_name().namespace(), None | Some(SVG_NS))
}

/// Parses the leading number of a string the way lenient SVG consumers do
/// (`"100px"` is 100).
pub fn parse_float(text: &str) -> Option<f64> {
    let m = FLOAT_RE.find(text)?;
    m.as_str().trim().parse().ok().filter(|v: &f64| v.is_finite())
}

fn parse_absolute(text: &str) -> Option<f64> {
    if text.trim_end().ends_with('%') {
        return None;
    }
    parse_float(text)
}

/// Byte offset just past the `>` that closes the start tag at `start`.
fn start_tag_end(source: &str, start: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (idx, byte) in source.as_bytes()[start..].iter().enumerate() {
        match quote {
            Some(q) if *byte == q => quote = None,
            Some(_) => {}
            None => match byte {
                b'"' | b'\'' => quote = Some(*byte),
                b'>' => return Some(start + idx + 1),
                _ => {}
            },
        }
    }
    None
}

/// Offset (within the start tag) just past the element's qualified name.
fn tag_name_end(start_tag: &str) -> usize {
    start_tag
        .char_indices()
        .skip(1)
        .find(|(_, c)| c.is_whitespace() || *c == '/' || *c == '>')
        .map(|(idx, _)| idx)
        .unwrap_or(start_tag.len())
}

/// Attribute names and their full `name="value"` spans inside a start tag.
fn scan_attributes(start_tag: &str) -> Vec<(String, Range<usize>)> {
    let names_from = tag_name_end(start_tag);
    ATTRIBUTE_RE
        .captures_iter(&start_tag[names_from..])
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?.as_str().to_string();
            Some((name, whole.start() + names_from..whole.end() + names_from))
        })
        .collect()
}

pub(crate) fn escape_attribute(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nested_svg_root() {
        let src = r#"<html><body><svg width="10"/></body></html>"#;
        let doc = SvgDocument::parse(src).unwrap();
        assert_eq!(doc.to_svg_string(), r#"<svg width="10"/>"#);
    }

    #[test]
    fn rejects_document_without_svg() {
        let err = SvgDocument::parse("<root><rect/></root>").err().unwrap();
        assert!(matches!(err, SvgError::NoSvgRoot));
    }

    #[test]
    fn reports_xml_errors() {
        let err = SvgDocument::parse("<svg><g></svg>").err().unwrap();
        assert!(matches!(err, SvgError::Xml(_)));
    }

    #[test]
    fn accepts_doctype() {
        let src = concat!(
            r#"<?xml version="1.0"?>"#,
            "\n",
            r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">"#,
            "\n",
            r#"<svg xmlns="http://www.w3.org/2000/svg"><rect/></svg>"#
        );
        let doc = SvgDocument::parse(src).unwrap();
        assert_eq!(
            doc.to_svg_string(),
            r#"<svg xmlns="http://www.w3.org/2000/svg"><rect/></svg>"#
        );
    }

    #[test]
    fn replaces_existing_attribute_in_place() {
        let src = r#"<svg width='5' viewBox="0 0 1 1" height="7"><g/></svg>"#;
        let mut doc = SvgDocument::parse(src).unwrap();
        doc.set_root_attribute("viewBox", "1 2 3 4");
        doc.set_root_attribute("width", "3");
        assert_eq!(
            doc.to_svg_string(),
            r#"<svg width="3" viewBox="1 2 3 4" height="7"><g/></svg>"#
        );
    }

    #[test]
    fn inserts_missing_attributes_after_tag_name() {
        let src = r#"<svg xmlns="http://www.w3.org/2000/svg"><g/></svg>"#;
        let mut doc = SvgDocument::parse(src).unwrap();
        doc.set_root_attribute("viewBox", "0 0 1 1");
        doc.set_root_attribute("width", "1");
        assert_eq!(
            doc.to_svg_string(),
            r#"<svg viewBox="0 0 1 1" width="1" xmlns="http://www.w3.org/2000/svg"><g/></svg>"#
        );
    }

    #[test]
    fn attribute_values_in_other_attributes_are_not_matched() {
        let src = r#"<svg data-x="width=&quot;9&quot;" width="1"/>"#;
        let mut doc = SvgDocument::parse(src).unwrap();
        doc.set_root_attribute("width", "2");
        assert_eq!(
            doc.to_svg_string(),
            r#"<svg data-x="width=&quot;9&quot;" width="2"/>"#
        );
    }

    #[test]
    fn later_set_wins() {
        let mut doc = SvgDocument::parse("<svg/>").unwrap();
        doc.set_root_attribute("width", "1");
        doc.set_root_attribute("width", "2");
        assert_eq!(doc.root_attribute("width").as_deref(), Some("2"));
        assert_eq!(doc.to_svg_string(), r#"<svg width="2"/>"#);
    }

    fn find_id(doc: &SvgDocument<'_>, pred: impl Fn(&Node<'_, '_>) -> bool) -> NodeId {
        doc.tree().descendants().find(|n| pred(n)).unwrap().id()
    }

    #[test]
    fn removes_nodes_and_keeps_the_rest_verbatim() {
        let src = "<svg>\n  <path d='M0 0'/>\n  <!-- keep -->\n  <rect  x = '1' />\n</svg>";
        let mut doc = SvgDocument::parse(src).unwrap();
        let path = find_id(&doc, |n| n.has_tag_name("path"));
        assert!(doc.remove_node(path));
        assert_eq!(
            doc.to_svg_string(),
            "<svg>\n  \n  <!-- keep -->\n  <rect  x = '1' />\n</svg>"
        );
    }

    #[test]
    fn nested_removal_is_absorbed() {
        let src = "<svg><g id='outer'><g id='inner'/></g></svg>";
        let mut doc = SvgDocument::parse(src).unwrap();
        let outer = find_id(&doc, |n| n.attribute("id") == Some("outer"));
        let inner = find_id(&doc, |n| n.attribute("id") == Some("inner"));
        assert!(doc.remove_node(inner));
        assert!(doc.remove_node(outer));
        assert!(!doc.remove_node(inner));
        assert_eq!(doc.to_svg_string(), "<svg></svg>");
    }

    #[test]
    fn root_cannot_be_removed() {
        let mut doc = SvgDocument::parse("<svg/>").unwrap();
        let root = doc.root().id();
        assert!(!doc.remove_node(root));
    }

    #[test]
    fn escapes_attribute_values() {
        let mut doc = SvgDocument::parse("<svg/>").unwrap();
        doc.set_root_attribute("data-note", "a\"<b>&");
        assert_eq!(
            doc.to_svg_string(),
            r#"<svg data-note="a&quot;&lt;b&gt;&amp;"/>"#
        );
    }

    #[test]
    fn viewport_prefers_viewbox() {
        let doc = SvgDocument::parse(r#"<svg width="10" height="20" viewBox="0 0 300,400"/>"#)
            .unwrap();
        assert_eq!(doc.viewport(), Some((300.0, 400.0)));
        let doc = SvgDocument::parse(r#"<svg width="10px" height="20"/>"#).unwrap();
        assert_eq!(doc.viewport(), Some((10.0, 20.0)));
        let doc = SvgDocument::parse(r#"<svg width="100%"/>"#).unwrap();
        assert_eq!(doc.viewport(), None);
    }

    #[test]
    fn parse_float_takes_leading_number() {
        assert_eq!(parse_float("100px"), Some(100.0));
        assert_eq!(parse_float(" -2.5e1 "), Some(-25.0));
        assert_eq!(parse_float(".5"), Some(0.5));
        assert_eq!(parse_float("abc"), None);
    }
}

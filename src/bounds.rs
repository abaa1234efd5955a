//! Visible-content bounding box of an SVG document.
//!
//! Each shape element is measured on its own: its markup is handed to usvg,
//! and the resulting tree's bounds are the element's native bounds. When usvg
//! produces nothing usable, `path` elements fall back to
//! [`path_data::coarse_bounds`] and other shapes to their explicit
//! `x`/`y`/`width`/`height` attributes.

use std::sync::Arc;

use roxmltree::Node;
use usvg::fontdb;

use crate::bbox::{self, BBox};
use crate::document::{SVG_NS, SvgDocument, escape_attribute, is_svg_element, parse_float};
use crate::path_data;

const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Elements that carry geometry.
pub const SHAPE_TAGS: [&str; 9] = [
    "path", "rect", "circle", "ellipse", "line", "polyline", "polygon", "text", "image",
];

/// Containers whose content is never drawn in place.
const NON_RENDERED: [&str; 6] = ["defs", "clipPath", "mask", "marker", "pattern", "symbol"];

/// Measures documents. Holds the font database so it is loaded at most once
/// per run.
pub struct BoundsEngine {
    fontdb: Option<Arc<fontdb::Database>>,
}

impl BoundsEngine {
    /// An engine without fonts; `text` elements then have no native bounds.
    pub fn new() -> Self {
        Self { fontdb: None }
    }

    /// An engine that measures text with the fonts installed on the system.
    pub fn with_system_fonts() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        log::debug!("loaded {} font faces", db.len());
        Self {
            fontdb: Some(Arc::new(db)),
        }
    }

    /// Union of the bounds of every visible, non-degenerate shape in the document.
    pub fn content_bounds(&self, doc: &SvgDocument<'_>) -> Option<BBox> {
        let options = self.options_for(doc);
        let mut bounds: Option<BBox> = None;

        for node in doc.root().descendants().filter(is_candidate) {
            if is_hidden(&node) {
                log::trace!("skipping hidden <{}>", node.tag_name().name());
                continue;
            }
            match self.element_bounds(doc.source(), &node, &options) {
                Some(element) => {
                    log::trace!("<{}> contributes {element}", node.tag_name().name());
                    bounds = bbox::merge(bounds, element);
                }
                None => log::trace!("<{}> has no usable extent", node.tag_name().name()),
            }
        }

        bounds.filter(BBox::is_valid)
    }

    fn element_bounds(
        &self,
        source: &str,
        node: &Node<'_, '_>,
        options: &usvg::Options<'_>,
    ) -> Option<BBox> {
        if let Some(native) = native_bounds(source, node, options).filter(BBox::is_valid) {
            return Some(native);
        }
        if node.tag_name().name() == "path" {
            node.attribute("d").and_then(path_data::coarse_bounds)
        } else {
            attribute_bounds(node)
        }
    }

    fn options_for(&self, doc: &SvgDocument<'_>) -> usvg::Options<'static> {
        let mut options = usvg::Options::default();
        if let Some(size) = doc
            .viewport()
            .and_then(|(w, h)| usvg::Size::from_wh(w as f32, h as f32))
        {
            options.default_size = size;
        }
        if let Some(db) = &self.fontdb {
            options.fontdb = Arc::clone(db);
        }
        options
    }
}

impl Default for BoundsEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn is_candidate(node: &Node<'_, '_>) -> bool {
    is_svg_element(node)
        && SHAPE_TAGS.contains(&node.tag_name().name())
        && !node
            .ancestors()
            .skip(1)
            .any(|a| a.is_element() && NON_RENDERED.contains(&a.tag_name().name()))
}

/// `display:none` on the element or an ancestor, or an effective
/// `visibility` of `hidden`/`collapse`.
pub fn is_hidden(node: &Node<'_, '_>) -> bool {
    let elements = || node.ancestors().filter(Node::is_element);
    if elements().any(|n| presentation(&n, "display") == Some("none")) {
        return true;
    }
    elements()
        .find_map(|n| presentation(&n, "visibility"))
        .is_some_and(|v| v == "hidden" || v == "collapse")
}

/// A presentation property from the inline `style` (which wins) or the attribute.
fn presentation<'a>(node: &Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute("style")
        .and_then(|style| style_property(style, name))
        .or_else(|| node.attribute(name).map(str::trim))
}

fn style_property<'a>(style: &'a str, name: &str) -> Option<&'a str> {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .filter(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim().trim_end_matches("!important").trim())
        .last()
}

/// Bounds usvg computes for the element in isolation.
fn native_bounds(source: &str, node: &Node<'_, '_>, options: &usvg::Options<'_>) -> Option<BBox> {
    let markup = &source[node.range()];
    let wrapped = format!(
        r#"<svg xmlns="{SVG_NS}" xmlns:xlink="{XLINK_NS}"{}>{markup}</svg>"#,
        prefix_declarations(node)
    );
    let tree = match usvg::Tree::from_str(&wrapped, options) {
        Ok(tree) => tree,
        Err(err) => {
            log::debug!("usvg rejected <{}>: {err}", node.tag_name().name());
            return None;
        }
    };
    if tree.root().children().is_empty() {
        return None;
    }
    Some(BBox::from(tree.root().abs_bounding_box()))
}

/// `xmlns:*` declarations for the prefixes in scope on `node`, so markup
/// such as `<svg:circle>` still resolves once lifted out of the document.
fn prefix_declarations(node: &Node<'_, '_>) -> String {
    let mut declarations = String::new();
    for ns in node.namespaces() {
        let Some(prefix) = ns.name() else {
            continue;
        };
        if prefix == "xml" || prefix == "xmlns" || prefix == "xlink" {
            continue;
        }
        declarations.push_str(&format!(
            " xmlns:{prefix}=\"{}\"",
            escape_attribute(ns.uri())
        ));
    }
    declarations
}

/// Box from explicit `x`, `y`, `width` and `height` attributes.
fn attribute_bounds(node: &Node<'_, '_>) -> Option<BBox> {
    let number = |name: &str| match node.attribute(name) {
        Some(value) => parse_float(value),
        None => Some(0.0),
    };
    let bbox = BBox::new(number("x")?, number("y")?, number("width")?, number("height")?);
    bbox.is_valid().then_some(bbox)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds_of(src: &str) -> Option<BBox> {
        let doc = SvgDocument::parse(src).unwrap();
        BoundsEngine::new().content_bounds(&doc)
    }

    #[test]
    fn single_rect() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="500" height="500"><rect x="10" y="10" width="100" height="100"/></svg>"#;
        assert_eq!(bounds_of(svg), Some(BBox::new(10.0, 10.0, 100.0, 100.0)));
    }

    #[test]
    fn line_path() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0 0 L50 50"/></svg>"#;
        assert_eq!(bounds_of(svg), Some(BBox::new(0.0, 0.0, 50.0, 50.0)));
    }

    #[test]
    fn union_of_shapes() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <circle cx="0" cy="0" r="10"/>
            <g><ellipse cx="100" cy="50" rx="20" ry="10"/></g>
        </svg>"#;
        assert_eq!(bounds_of(svg), Some(BBox::new(-10.0, -10.0, 130.0, 70.0)));
    }

    #[test]
    fn hidden_shapes_are_ignored() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <rect style="display:none" x="0" y="0" width="10" height="10"/>
            <g display="none"><rect x="100" y="100" width="10" height="10"/></g>
            <rect visibility="hidden" x="-50" y="-50" width="10" height="10"/>
            <rect x="20" y="20" width="5" height="5"/>
        </svg>"#;
        assert_eq!(bounds_of(svg), Some(BBox::new(20.0, 20.0, 5.0, 5.0)));
    }

    #[test]
    fn nearest_visibility_wins() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <g style="visibility: hidden">
                <rect visibility="visible" x="1" y="2" width="3" height="4"/>
                <rect x="50" y="50" width="3" height="4"/>
            </g>
        </svg>"#;
        assert_eq!(bounds_of(svg), Some(BBox::new(1.0, 2.0, 3.0, 4.0)));
    }

    #[test]
    fn only_hidden_content_has_no_bounds() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><rect style="display: none" width="10" height="10"/></svg>"#;
        assert_eq!(bounds_of(svg), None);
    }

    #[test]
    fn definitions_do_not_count() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <defs><marker id="m"><path d="M 0 0 L 1000 1000"/></marker></defs>
            <rect x="1" y="1" width="2" height="2"/>
        </svg>"#;
        assert_eq!(bounds_of(svg), Some(BBox::new(1.0, 1.0, 2.0, 2.0)));
    }

    #[test]
    fn degenerate_shapes_are_skipped() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <rect x="5" y="5" width="0" height="10"/>
            <path d="M0 0 L100 0"/>
            <circle cx="3" cy="3" r="0"/>
        </svg>"#;
        assert_eq!(bounds_of(svg), None);
    }

    #[test]
    fn unloadable_image_uses_attributes() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
            <image href="missing.png" x="4" y="6" width="30" height="20"/>
        </svg>"#;
        assert_eq!(bounds_of(svg), Some(BBox::new(4.0, 6.0, 30.0, 20.0)));
    }

    #[test]
    fn text_without_fonts_is_skipped() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><text x="10" y="10">hi</text></svg>"#;
        assert_eq!(bounds_of(svg), None);
    }

    #[test]
    fn empty_document() {
        assert_eq!(bounds_of(r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#), None);
    }

    #[test]
    fn prefixed_svg_elements_are_measured() {
        let svg = r#"<svg:svg xmlns:svg="http://www.w3.org/2000/svg"><svg:circle cx="5" cy="5" r="5"/></svg:svg>"#;
        assert_eq!(bounds_of(svg), Some(BBox::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn declarations_cover_prefixes_in_scope() {
        let doc = roxmltree::Document::parse(
            r#"<s:svg xmlns:s="http://www.w3.org/2000/svg" xmlns:x="urn:x"><s:g><s:rect/></s:g></s:svg>"#,
        )
        .unwrap();
        let rect = doc.descendants().find(|n| n.has_tag_name("rect")).unwrap();
        let declarations = prefix_declarations(&rect);
        assert!(declarations.contains(r#" xmlns:s="http://www.w3.org/2000/svg""#));
        assert!(declarations.contains(r#" xmlns:x="urn:x""#));
        assert!(!declarations.contains("xmlns:xml="));
    }

    #[test]
    fn style_property_lookup() {
        assert_eq!(style_property("fill:red; display : none", "display"), Some("none"));
        assert_eq!(style_property("DISPLAY:none !important", "display"), Some("none"));
        assert_eq!(style_property("fill:red", "display"), None);
    }

    #[test]
    fn attribute_fallback_rules() {
        let doc = roxmltree::Document::parse(r#"<image width="30px" height="20"/>"#).unwrap();
        assert_eq!(
            attribute_bounds(&doc.root_element()),
            Some(BBox::new(0.0, 0.0, 30.0, 20.0))
        );
        let doc = roxmltree::Document::parse(r#"<image x="a" width="30" height="20"/>"#).unwrap();
        assert_eq!(attribute_bounds(&doc.root_element()), None);
        let doc = roxmltree::Document::parse(r#"<text x="3" y="4"/>"#).unwrap();
        assert_eq!(attribute_bounds(&doc.root_element()), None);
    }
}

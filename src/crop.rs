use std::path::Path;

use anyhow::{Context, Result};

use crate::bbox::{BBox, format_number};
use crate::bounds::BoundsEngine;
use crate::document::SvgDocument;

#[derive(Debug, Clone, Default)]
pub struct CropOptions {
    /// Extra space added around the content on every side, in user units.
    pub padding: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropOutcome {
    /// The root now shows exactly this region.
    Cropped(BBox),
    /// Nothing visible was found; the document was left alone.
    NoContent,
}

/// Points the root `viewBox`, `width` and `height` at the visible content.
pub fn crop_document(
    doc: &mut SvgDocument<'_>,
    engine: &BoundsEngine,
    options: &CropOptions,
) -> CropOutcome {
    let Some(content) = engine.content_bounds(doc) else {
        return CropOutcome::NoContent;
    };
    let view = content.padded(options.padding);
    if !view.is_valid() {
        return CropOutcome::NoContent;
    }
    doc.set_root_attribute("viewBox", &view.to_viewbox());
    doc.set_root_attribute("width", &format_number(view.width));
    doc.set_root_attribute("height", &format_number(view.height));
    CropOutcome::Cropped(view)
}

/// Crops the file at `path` in place. The file is only rewritten when content
/// was found.
pub fn crop_file(path: &Path, engine: &BoundsEngine, options: &CropOptions) -> Result<CropOutcome> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut doc = SvgDocument::parse(&source)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    let outcome = crop_document(&mut doc, engine, options);
    if let CropOutcome::Cropped(view) = outcome {
        std::fs::write(path, doc.to_svg_string())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::debug!("{}: viewBox set to {view}", path.display());
    }
    Ok(outcome)
}

use std::path::Path;

use anyhow::{Context, Result};

use crate::document::{SvgDocument, is_svg_element};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripReport {
    /// Number of `<path>` elements whose `fill` matched.
    pub removed: usize,
    pub fill: String,
}

/// Removes every `<path>` whose literal `fill` attribute equals `fill`,
/// ignoring case. Inherited fills and `style="fill:…"` are not consulted.
pub fn remove_paths_by_fill(doc: &mut SvgDocument<'_>, fill: &str) -> StripReport {
    let wanted = fill.to_lowercase();
    let matches: Vec<_> = doc
        .root()
        .descendants()
        .filter(|node| is_svg_element(node) && node.tag_name().name() == "path")
        .filter(|node| {
            node.attribute("fill")
                .is_some_and(|value| value.to_lowercase() == wanted)
        })
        .map(|node| node.id())
        .collect();

    for id in &matches {
        doc.remove_node(*id);
    }

    StripReport {
        removed: matches.len(),
        fill: fill.to_string(),
    }
}

/// Reads `input`, strips matching paths and writes the remaining SVG to `output`.
pub fn strip_file(input: &Path, fill: &str, output: &Path) -> Result<StripReport> {
    let source = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let mut doc = SvgDocument::parse(&source)
        .with_context(|| format!("Failed to load {}", input.display()))?;

    let report = remove_paths_by_fill(&mut doc, fill);
    std::fs::write(output, doc.to_svg_string())
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(report)
}

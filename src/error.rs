use thiserror::Error;

/// Failures while loading an SVG document.
#[derive(Debug, Error)]
pub enum SvgError {
    #[error("invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("no <svg> element found")]
    NoSvgRoot,
}

pub mod bbox;
pub mod bounds;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod crop;
pub mod document;
pub mod error;
pub mod path_data;
pub mod strip;

pub use bbox::BBox;
pub use bounds::BoundsEngine;
#[cfg(feature = "cli")]
pub use cli::{run_crop, run_strip};
pub use config::{Config, load_config};
pub use crop::{CropOptions, CropOutcome, crop_document, crop_file};
pub use document::SvgDocument;
pub use error::SvgError;
pub use strip::{StripReport, remove_paths_by_fill, strip_file};

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Where `svgrmpath` writes its result.
pub const DEFAULT_OUTPUT: &str = "output.svg";

#[derive(Debug, Clone)]
pub struct CropConfig {
    pub padding: f64,
    pub system_fonts: bool,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            padding: 0.0,
            system_fonts: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StripConfig {
    pub output: PathBuf,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub crop: CropConfig,
    pub strip: StripConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    crop: Option<CropSection>,
    strip: Option<StripSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CropSection {
    padding: Option<f64>,
    system_fonts: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StripSection {
    output: Option<PathBuf>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;

    if let Some(crop) = parsed.crop {
        if let Some(v) = crop.padding {
            if !v.is_finite() {
                anyhow::bail!("crop.padding must be a finite number");
            }
            config.crop.padding = v;
        }
        if let Some(v) = crop.system_fonts {
            config.crop.system_fonts = v;
        }
    }

    if let Some(strip) = parsed.strip {
        if let Some(v) = strip.output {
            config.strip.output = v;
        }
    }

    Ok(config)
}

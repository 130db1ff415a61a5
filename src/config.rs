use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub font: FontConfig,
    pub links: LinksConfig,
    pub code: CodeConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub family: String,
    pub code_family: String,
    /// Body text size in half-points.
    pub size: usize,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: "Malgun Gothic".to_string(),
            code_family: "Consolas".to_string(),
            size: 22,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    pub color: String,
    /// Color of the "(url)" annotation printed after each link label.
    pub annotation_color: String,
    pub underline: bool,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            color: "0563C1".to_string(),
            annotation_color: "70AD47".to_string(),
            underline: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CodeConfig {
    pub color: String,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            color: "CF222E".to_string(),
        }
    }
}

impl Config {
    /// Load config from a TOML file, or return defaults if not found.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }
}

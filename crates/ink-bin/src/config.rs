//! Configuration file loading and CLI value enums.
//!
//! `inkstream.toml` is discovered in the working directory first, then the
//! platform config dir. Every field is optional; CLI flags override file
//! values and unknown fields are ignored so the file can evolve without
//! breaking older binaries.

use anyhow::{Context, Result};
use clap::ValueEnum;
use core_stream::{Anchor, ColorMode, Strategy};
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyArg {
    Smart,
    Redraw,
}

impl From<StrategyArg> for Strategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Smart => Strategy::Smart,
            StrategyArg::Redraw => Strategy::Redraw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorArg {
    Cursor,
    Home,
}

impl From<AnchorArg> for Anchor {
    fn from(value: AnchorArg) -> Self {
        match value {
            AnchorArg::Cursor => Anchor::Cursor,
            AnchorArg::Home => Anchor::Home,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorArg {
    Auto,
    Always,
    Never,
}

impl From<ColorArg> for ColorMode {
    fn from(value: ColorArg) -> Self {
        match value {
            ColorArg::Auto => ColorMode::Auto,
            ColorArg::Always => ColorMode::Always,
            ColorArg::Never => ColorMode::Never,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub render: RenderSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub demo: DemoSection,
    #[serde(default)]
    pub highlight: HighlightSection,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RenderSection {
    pub strategy: Option<StrategyArg>,
    pub anchor: Option<AnchorArg>,
    pub viewport: Option<usize>,
    pub width: Option<usize>,
    pub color: Option<ColorArg>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct SessionSection {
    pub alt_screen: Option<bool>,
    pub synchronized: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct DemoSection {
    pub chunk_size: Option<usize>,
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct HighlightSection {
    pub enabled: Option<bool>,
    pub delay_ms: Option<u64>,
}

/// Local `inkstream.toml` first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("inkstream.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("inkstream").join("inkstream.toml");
    }
    local
}

/// Load the config file; a missing file yields defaults, a malformed one
/// is an error.
pub fn load_from(path: Option<PathBuf>) -> Result<ConfigFile> {
    let path = path.unwrap_or_else(discover);
    match fs::read_to_string(&path) {
        Ok(content) => {
            let file = toml::from_str::<ConfigFile>(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            info!(target: "runtime.config", file = %path.display(), "config_loaded");
            Ok(file)
        }
        Err(_) => Ok(ConfigFile::default()),
    }
}

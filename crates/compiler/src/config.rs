//! Tool configuration, loaded from an optional `symphony.toml`.
//!
//! Defaults apply when the file is absent; CLI flags override whatever the
//! file says.
//!
//! ```toml
//! keep_notes = true
//! color = "never"
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;
use symphony_core::SymphonyError;

/// When the batch runner colors its filename lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color only when stdout is a terminal
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Persist the `.note` quadruple listing next to each source file.
    pub keep_notes: bool,
    pub color: ColorMode,
}

impl Default for ToolConfig {
    fn default() -> Self {
        ToolConfig {
            keep_notes: false,
            color: ColorMode::Auto,
        }
    }
}

/// The configuration file the loader looks for.
pub const CONFIG_FILE: &str = "symphony.toml";

impl ToolConfig {
    pub fn from_toml(text: &str) -> Result<Self, SymphonyError> {
        toml::from_str(text)
            .map_err(|e| SymphonyError::io(format!("Failed to parse {}: {}", CONFIG_FILE, e)))
    }

    /// Read `symphony.toml` from a directory, falling back to defaults when
    /// it does not exist.
    pub fn load(directory: &Path) -> Result<Self, SymphonyError> {
        let path = directory.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)
            .map_err(|e| SymphonyError::io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }
}

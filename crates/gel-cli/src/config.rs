//! Project configuration.
//!
//! Settings come from an optional `gel.json` next to the sources, then from
//! command-line flags, which win.

use anyhow::{Context, Result};
use gel_backend::PsqlConfig;
use gel_compiler::ExpanderOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file looked up in the source root.
pub const CONFIG_FILE: &str = "gel.json";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GelConfig {
    /// Source file extension, without the dot.
    pub extension: Option<String>,
    /// Where `compile` writes the stream; stdout when unset.
    pub output: Option<PathBuf>,
    pub expander: ExpanderOptions,
    pub psql: PsqlConfig,
}

impl GelConfig {
    /// Load `gel.json` from the source root, or defaults if there is none.
    pub fn load(source_root: &Path) -> Result<Self> {
        let dir = if source_root.is_file() {
            source_root.parent().unwrap_or(Path::new("."))
        } else {
            source_root
        };
        let path = dir.join(CONFIG_FILE);

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

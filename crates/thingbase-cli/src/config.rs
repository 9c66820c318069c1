use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thingbase_locator::SchemeTable;
use thingbase_store::StoreConfig;

/// Settings read from `--config`. Flags given on the command line win.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Default context locator.
    pub context: Option<String>,
    /// Default schema locator for `validate`.
    pub schema: Option<String>,
    /// Editor command for `edit`.
    pub editor: Option<String>,
    pub schemes: SchemeTable,
    pub store: StoreConfig,
}

impl CliConfig {
    /// Load `path`, or the defaults when no file was given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// The context to resolve against: the flag, the file, then the current
    /// directory.
    pub fn context(&self, flag: Option<&str>) -> anyhow::Result<String> {
        if let Some(context) = flag.or(self.context.as_deref()) {
            return Ok(context.to_string());
        }
        let cwd = std::env::current_dir().context("reading the current directory")?;
        cwd.to_str()
            .map(str::to_owned)
            .with_context(|| format!("current directory {} is not UTF-8", cwd.display()))
    }

    /// The editor to spawn: the flag, the file, then `$EDITOR`.
    pub fn editor(&self, flag: Option<&str>) -> Option<String> {
        flag.map(str::to_owned)
            .or_else(|| self.editor.clone())
            .or_else(|| std::env::var("EDITOR").ok().filter(|e| !e.trim().is_empty()))
    }
}

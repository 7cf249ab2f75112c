use anyhow::{bail, Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for a transcript display buffer.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSettings {
    /// Most items kept; the oldest are evicted beyond this
    #[serde(default = "default_max_capacity")]
    pub max_capacity: usize,
    /// Identical content accepted less than this long ago is suppressed
    #[serde(default = "default_dedup_window_ms")]
    pub dedup_window_ms: u64,
}

fn default_max_capacity() -> usize {
    1000
}

fn default_dedup_window_ms() -> u64 {
    1000
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
            dedup_window_ms: default_dedup_window_ms(),
        }
    }
}

impl BufferSettings {
    /// Read settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings: BufferSettings = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        settings.validate()?;

        debug!("Loaded buffer settings from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_capacity == 0 {
            bail!("max_capacity must be at least 1");
        }
        Ok(())
    }
}

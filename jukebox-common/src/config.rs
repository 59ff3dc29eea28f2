//! Configuration loading

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Jukebox configuration
///
/// Loaded from a TOML file or constructed with defaults. Every field
/// has a default so a partial (or absent) config file is fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JukeboxConfig {
    /// Maximum number of sounds accepted in one queued sequence.
    /// Requests beyond this are rejected as invalid. Matches the
    /// capacity of the record containers that feed sequences.
    #[serde(default = "default_max_sequence_len")]
    pub max_sequence_len: usize,

    /// Capacity of the lifecycle event broadcast channel
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

fn default_max_sequence_len() -> usize {
    12
}

fn default_event_channel_capacity() -> usize {
    256
}

impl Default for JukeboxConfig {
    fn default() -> Self {
        Self {
            max_sequence_len: default_max_sequence_len(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl JukeboxConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {:?}: {}", path.as_ref(), e)))?;
        debug!(path = ?path.as_ref(), "loaded configuration");
        Ok(config)
    }
}

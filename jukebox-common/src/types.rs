//! Location keys and sound descriptors
//!
//! A `LocationKey` is the sole identity for "what is playing where":
//! an integer block position plus a dimension identifier. A `Sound`
//! is an opaque immutable descriptor owned by whoever supplies it;
//! the registry never mutates one.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a playback slot: block position plus dimension.
///
/// Two keys are equal iff position and dimension are both equal.
/// At most one playback job occupies a key at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// World/dimension identifier; the same coordinates in different
    /// dimensions are distinct slots
    pub dimension: i32,
}

impl LocationKey {
    pub fn new(x: i32, y: i32, z: i32, dimension: i32) -> Self {
        Self { x, y, z, dimension }
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})@{}", self.x, self.y, self.z, self.dimension)
    }
}

/// Immutable sound descriptor
///
/// Supplied by the glue layer (record items, stream blocks); the
/// registry reads it and hands it to the playback backend unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sound {
    pub name: String,
    pub author: String,
    /// Nominal duration in seconds; informational only, never used
    /// to time out playback
    pub duration_secs: u32,
    /// Resource handle or URL understood by the playback backend
    pub source: String,
}

impl Sound {
    pub fn new(
        name: impl Into<String>,
        author: impl Into<String>,
        duration_secs: u32,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            author: author.into(),
            duration_secs,
            source: source.into(),
        }
    }

    /// Validate a sound destined for sequence playback
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidRequest("sound has empty name".to_string()));
        }
        Ok(())
    }

    /// Validate a sound destined for stream playback
    ///
    /// Streams additionally require a non-empty source, since the
    /// backend has nothing else to open.
    pub fn validate_stream(&self) -> Result<()> {
        self.validate()?;
        if self.source.is_empty() {
            return Err(Error::InvalidRequest(format!(
                "stream sound '{}' has empty source",
                self.name
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.author.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} by {}", self.name, self.author)
        }
    }
}

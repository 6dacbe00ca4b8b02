use std::fmt::Display;
use std::path::Path;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{Error, Result};

/// Largest accepted read size, 4 MiB.
pub const MAX_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Default session gap threshold, 1.2 s in device clock microseconds.
pub const DEFAULT_JUMP_THRESHOLD: u32 = 1_200_000;

/// How device timestamps are converted to output timestamps. One mode applies to a
/// whole decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebaseMode {
    /// Microseconds since the Unix epoch, anchored on the device clock/UTC pairing
    /// recorded when the session went live.
    #[default]
    Absolute,
    /// Microseconds since the first device timestamp of the decode.
    Relative,
}

impl Display for RebaseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absolute => write!(f, "absolute"),
            Self::Relative => write!(f, "relative"),
        }
    }
}

/// Options for a single decode.
///
/// # Example
/// ```
/// use navlog::{DecodeConfig, RebaseMode};
///
/// let config = DecodeConfig::builder()
///     .rebase(RebaseMode::Relative)
///     .jump_threshold(2_000_000)
///     .build();
/// assert!(config.gate_aux);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    #[builder(default)]
    pub rebase: RebaseMode,
    /// Forward gap between consecutive clock messages, in device clock units, above
    /// which the session is considered to have jumped.
    #[builder(default = DEFAULT_JUMP_THRESHOLD)]
    pub jump_threshold: u32,
    /// Bytes per read. Defaults to the family's frame size.
    #[builder(default, setter(strip_option))]
    pub chunk_size: Option<usize>,
    /// Drop GNSS and air data samples while the session is not live.
    #[builder(default = true)]
    pub gate_aux: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DecodeConfig {
    /// Load a config from a JSON file. Missing fields take their default value.
    ///
    /// # Errors
    /// [Error::Io] if the file cannot be read, [Error::InvalidConfig] if it cannot be
    /// parsed or does not validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let dat = std::fs::read(path)?;
        let config: Self =
            serde_json::from_slice(&dat).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// [Error::InvalidConfig] for a zero jump threshold, or a chunk size that is zero
    /// or larger than [MAX_CHUNK_SIZE].
    pub fn validate(&self) -> Result<()> {
        match self.chunk_size {
            Some(0) => {
                return Err(Error::InvalidConfig("chunk_size must be > 0".to_string()));
            }
            Some(n) if n > MAX_CHUNK_SIZE => {
                return Err(Error::InvalidConfig(format!(
                    "chunk_size must be <= {MAX_CHUNK_SIZE}, got {n}"
                )));
            }
            _ => {}
        }
        if self.jump_threshold == 0 {
            return Err(Error::InvalidConfig("jump_threshold must be > 0".to_string()));
        }
        Ok(())
    }
}

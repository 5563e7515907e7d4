//! Engine configuration.
//!
//! [`EngineConfig`] is plain serde data so a host can keep it in a JSON
//! file next to its content:
//!
//! ```
//! use sprig_engine::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "fixed_dt": 0.02, "headless": true }"#).unwrap();
//! assert_eq!(config.fixed_dt, 0.02);
//! assert_eq!(config.log_filter, "info");
//! ```

use serde::{Deserialize, Serialize};

/// Errors from reading or validating an [`EngineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings for an [`Engine`](crate::engine::Engine).
///
/// Missing fields in JSON fall back to [`Default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds per frame used by [`Engine::run_frames`](crate::engine::Engine::run_frames).
    pub fixed_dt: f32,
    /// Upper bound on the delta handed to a single update; longer deltas
    /// are clamped.
    pub max_frame_dt: f32,
    /// No renderer attached; frames are stepped as fast as possible.
    pub headless: bool,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Seed for the engine's random stream.
    pub rng_seed: u64,
}

impl Default for EngineConfig {
    /// 60 Hz, quarter-second frame cap, windowed, `info` logging.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_frame_dt: 0.25,
            headless: false,
            log_filter: "info".to_owned(),
            rng_seed: 0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fixed_dt > 0.0 && self.fixed_dt.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "fixed_dt",
                reason: format!("must be positive and finite, got {}", self.fixed_dt),
            });
        }
        if !(self.max_frame_dt >= self.fixed_dt && self.max_frame_dt.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "max_frame_dt",
                reason: format!(
                    "must be finite and at least fixed_dt ({}), got {}",
                    self.fixed_dt, self.max_frame_dt
                ),
            });
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "log_filter",
                reason: "must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}

//! Session configuration — the one tunable the protocol exposes before
//! a transfer starts (chunk size), plus the Sender's `Finalizing` grace
//! window.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::metadata::DEFAULT_CHUNK_SIZE;

/// Top-level configuration for a transfer session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Chunk size used when building metadata for a new Sender session.
    /// Frozen once the first envelope is sent (spec §4.2).
    pub chunk_size: u32,

    /// How long the Sender holds in `Finalizing` after displaying
    /// `completed`, giving the Receiver extra observation opportunities
    /// to catch the terminal envelope (spec §4.4).
    pub finalize_grace_ms: u64,

    /// Logging.
    pub logging: LoggingConfig,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"info"` or
    /// `"qrxfer_core=debug"`.
    pub level: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            finalize_grace_ms: 2000,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl SessionConfig {
    /// The `Finalizing` grace window as a [`Duration`].
    pub fn finalize_grace(&self) -> Duration {
        Duration::from_millis(self.finalize_grace_ms)
    }

    /// Load from a TOML file, falling back to defaults. Missing file or
    /// malformed contents never fail the caller — they log and use
    /// defaults instead (spec §9's "no hard failure" ambient pattern).
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the default configuration to a file.
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let cfg = Self::default();
        let text = toml::to_string_pretty(&cfg)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let cfg = SessionConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert!(text.contains("chunk_size"));
        assert!(text.contains("finalize_grace_ms"));
    }

    #[test]
    fn roundtrip_config() {
        let cfg = SessionConfig {
            chunk_size: 8192,
            ..SessionConfig::default()
        };
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: SessionConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.chunk_size, 8192);
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let cfg = SessionConfig::load(Path::new("/nonexistent/path/qrxfer.toml"));
        assert_eq!(cfg, SessionConfig::default());
    }

    #[test]
    fn load_malformed_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qrxfer.toml");
        std::fs::write(&path, "not valid toml {{{").unwrap();
        let cfg = SessionConfig::load(&path);
        assert_eq!(cfg, SessionConfig::default());
    }

    #[test]
    fn finalize_grace_converts_ms_to_duration() {
        let cfg = SessionConfig {
            finalize_grace_ms: 1500,
            ..SessionConfig::default()
        };
        assert_eq!(cfg.finalize_grace(), Duration::from_millis(1500));
    }
}

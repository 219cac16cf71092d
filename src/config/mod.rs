// SPDX-License-Identifier: MPL-2.0
//! Player configuration: demux/codec robustness options, pacing parameters
//! and logging, loadable from a `player.toml` file.
//!
//! The host points the player at its file through the
//! `FFMEDIA_PLAYER_CONFIG` environment variable (on Android, `Os.setenv`
//! before the first `native_Init`). Without it the defaults apply.
//!
//! # Examples
//!
//! ```no_run
//! use ffmedia_player::config;
//! use std::path::Path;
//!
//! // Load the host's configuration
//! let mut config = config::load().unwrap_or_default();
//!
//! // Modify and save it back
//! config.decoder.rtsp_transport = "udp".to_string();
//! config::save(&config).expect("Failed to save config");
//!
//! // Explicit paths work the same way
//! config::save_to_path(&config, Path::new("player.toml")).expect("Failed to save to path");
//! ```

pub mod defaults;

use crate::error::Result;
use defaults::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete player configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub decoder: DecoderOptions,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Robustness options handed to the demuxer and codec when a stream opens.
///
/// The backend treats them as opaque key/value pairs (see [`Self::to_pairs`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderOptions {
    /// Demux read buffer size in bytes.
    pub buffer_size: u32,
    /// I/O timeout in microseconds.
    pub stimeout: u64,
    /// Maximum interleave delay between muxed streams, in microseconds.
    pub max_delay: u64,
    /// Transport hint for protocols that support one (RTSP).
    pub rtsp_transport: String,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            stimeout: DEFAULT_STIMEOUT_US,
            max_delay: DEFAULT_MAX_DELAY_US,
            rtsp_transport: DEFAULT_RTSP_TRANSPORT.to_string(),
        }
    }
}

impl DecoderOptions {
    /// Returns the options as the key/value pairs understood by the demuxer.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("buffer_size", self.buffer_size.to_string()),
            ("stimeout", self.stimeout.to_string()),
            ("max_delay", self.max_delay.to_string()),
            ("rtsp_transport", self.rtsp_transport.clone()),
        ]
    }
}

/// Pacing parameters for the decode loops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Upper bound of a single pacing sleep.
    pub delay_threshold_ms: u64,
    /// Bounded wait used by a paused decode loop.
    pub pause_poll_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            delay_threshold_ms: DEFAULT_DELAY_THRESHOLD_MS,
            pause_poll_interval_ms: DEFAULT_PAUSE_POLL_INTERVAL_MS,
        }
    }
}

impl SyncConfig {
    pub fn delay_threshold(&self) -> Duration {
        Duration::from_millis(self.delay_threshold_ms)
    }

    /// Poll interval, clamped so a paused loop can neither spin nor go deaf.
    pub fn pause_poll_interval(&self) -> Duration {
        Duration::from_millis(
            self.pause_poll_interval_ms
                .clamp(MIN_PAUSE_POLL_INTERVAL_MS, MAX_PAUSE_POLL_INTERVAL_MS),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub tag: String,
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            tag: DEFAULT_LOG_TAG.to_string(),
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parses the configured level, falling back to `Info` on unknown names.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

/// Path of the host's configuration file, if one was given.
pub fn config_path() -> Option<PathBuf> {
    env::var_os(CONFIG_PATH_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Loads the host's configuration, or the defaults when no file exists.
pub fn load() -> Result<PlayerConfig> {
    if let Some(path) = config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(PlayerConfig::default())
}

/// Writes `config` to the host's configuration file. No-op without one.
pub fn save(config: &PlayerConfig) -> Result<()> {
    if let Some(path) = config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

pub fn load_from_path(path: &Path) -> Result<PlayerConfig> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

pub fn save_to_path(config: &PlayerConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip_preserves_options() {
        let mut config = PlayerConfig::default();
        config.decoder.rtsp_transport = "udp".to_string();
        config.sync.delay_threshold_ms = 40;
        config.logging.level = "debug".to_string();

        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("player.toml");

        save_to_path(&config, &config_path).expect("failed to save config");
        let loaded = load_from_path(&config_path).expect("failed to load config");

        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("player.toml");
        fs::write(&config_path, "[sync]\ndelay_threshold_ms = 50\n").expect("write failed");

        let loaded = load_from_path(&config_path).expect("load failed");
        assert_eq!(loaded.sync.delay_threshold_ms, 50);
        assert_eq!(loaded.sync.pause_poll_interval_ms, DEFAULT_PAUSE_POLL_INTERVAL_MS);
        assert_eq!(loaded.decoder, DecoderOptions::default());
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("player.toml");
        fs::write(&config_path, "not = valid = toml").expect("write failed");

        let result = load_from_path(&config_path);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn host_config_file_follows_the_environment() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("host").join("player.toml");

        env::remove_var(CONFIG_PATH_ENV);
        assert_eq!(load().expect("defaults"), PlayerConfig::default());
        save(&PlayerConfig::default()).expect("save without a path is a no-op");

        env::set_var(CONFIG_PATH_ENV, &config_path);
        assert_eq!(load().expect("missing file means defaults"), PlayerConfig::default());

        let mut config = PlayerConfig::default();
        config.sync.delay_threshold_ms = 60;
        save(&config).expect("save to host path");
        assert!(config_path.exists());
        assert_eq!(load().expect("load host file"), config);

        env::remove_var(CONFIG_PATH_ENV);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let result = load_from_path(&temp_dir.path().join("absent.toml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn decoder_options_map_to_demux_keys() {
        let pairs = DecoderOptions::default().to_pairs();
        assert_eq!(
            pairs,
            vec![
                ("buffer_size", "1024000".to_string()),
                ("stimeout", "20000000".to_string()),
                ("max_delay", "30000000".to_string()),
                ("rtsp_transport", "tcp".to_string()),
            ]
        );
    }

    #[test]
    fn pause_poll_interval_is_clamped() {
        let sync = SyncConfig {
            delay_threshold_ms: 100,
            pause_poll_interval_ms: 0,
        };
        assert_eq!(sync.pause_poll_interval(), Duration::from_millis(1));

        let sync = SyncConfig {
            delay_threshold_ms: 100,
            pause_poll_interval_ms: 60_000,
        };
        assert_eq!(sync.pause_poll_interval(), Duration::from_millis(1_000));
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let logging = LoggingConfig {
            tag: "t".into(),
            level: "loud".into(),
        };
        assert_eq!(logging.level_filter(), log::LevelFilter::Info);

        let logging = LoggingConfig {
            tag: "t".into(),
            level: "trace".into(),
        };
        assert_eq!(logging.level_filter(), log::LevelFilter::Trace);
    }
}

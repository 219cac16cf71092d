// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! # Categories
//!
//! - **Demux/codec options**: robustness options passed when a stream is opened
//! - **Sync**: pacing threshold and paused-loop poll interval
//! - **Logging**: log tag and level

/// Environment variable naming the host's `player.toml`.
pub const CONFIG_PATH_ENV: &str = "FFMEDIA_PLAYER_CONFIG";

// ==========================================================================
// Demux/Codec Option Defaults
// ==========================================================================

/// Demux read buffer size in bytes (`buffer_size`).
pub const DEFAULT_BUFFER_SIZE: u32 = 1_024_000;

/// Socket I/O timeout in microseconds (`stimeout`).
pub const DEFAULT_STIMEOUT_US: u64 = 20_000_000;

/// Maximum muxed-stream interleave delay in microseconds (`max_delay`).
pub const DEFAULT_MAX_DELAY_US: u64 = 30_000_000;

/// Transport hint for RTSP sources (`rtsp_transport`).
pub const DEFAULT_RTSP_TRANSPORT: &str = "tcp";

// ==========================================================================
// Sync Defaults
// ==========================================================================

/// Upper bound on a single pacing sleep, in milliseconds.
pub const DEFAULT_DELAY_THRESHOLD_MS: u64 = 100;

/// Interval at which a paused decode loop re-checks its state, in milliseconds.
pub const DEFAULT_PAUSE_POLL_INTERVAL_MS: u64 = 10;

/// Minimum accepted pause poll interval.
pub const MIN_PAUSE_POLL_INTERVAL_MS: u64 = 1;

/// Maximum accepted pause poll interval.
pub const MAX_PAUSE_POLL_INTERVAL_MS: u64 = 1_000;

// ==========================================================================
// Logging Defaults
// ==========================================================================

/// Tag used for Android logcat output.
pub const DEFAULT_LOG_TAG: &str = "FFMediaPlayer";

/// Default maximum log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

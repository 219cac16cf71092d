// SPDX-License-Identifier: MPL-2.0
//! Time unit conversion utilities for playback.
//!
//! Provides conversions between the units the player exposes (seconds as
//! `f32`, milliseconds as `i64`) and the container's `AV_TIME_BASE`
//! microseconds.

/// Microseconds per second as f64 for calculations.
pub const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Converts a position in seconds to `AV_TIME_BASE` microseconds.
///
/// # Examples
///
/// ```
/// use ffmedia_player::decoder::time_units::secs_to_micros;
///
/// assert_eq!(secs_to_micros(1.0), 1_000_000);
/// assert_eq!(secs_to_micros(0.5), 500_000);
/// ```
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn secs_to_micros(secs: f32) -> i64 {
    (f64::from(secs) * MICROS_PER_SECOND) as i64
}

/// Converts milliseconds to seconds, as reported in decoding-time messages.
///
/// # Examples
///
/// ```
/// use ffmedia_player::decoder::time_units::millis_to_secs;
///
/// assert_eq!(millis_to_secs(1500), 1.5);
/// ```
#[inline]
#[allow(clippy::cast_precision_loss)]
pub fn millis_to_secs(millis: i64) -> f32 {
    millis as f32 / 1000.0
}

/// Converts container microseconds to whole milliseconds.
#[inline]
pub fn micros_to_millis(micros: i64) -> i64 {
    micros / 1000
}

// SPDX-License-Identifier: MPL-2.0
//! Playback clock: turns decoded-frame timestamps into pacing decisions.
//!
//! Each decoder paces itself against the wall clock. The decode loop keeps a
//! start reference (the clock reading that corresponds to presentation time
//! zero); a frame whose timestamp is ahead of the elapsed time is held back,
//! a frame that is late is delivered at once. There is no frame dropping and
//! no cross-track correction.
//!
//! ```text
//! elapsed = now - start_ref
//! pts > elapsed   →  sleep(min(pts - elapsed, threshold))
//! pts <= elapsed  →  deliver immediately
//! ```

use super::engine::Worker;
use super::message::DecoderMessage;
use super::time_units::millis_to_secs;
use crate::application::port::MediaSession;
use crate::decoder::handler::FrameHandler;
use crate::media::{DecodedFrame, MediaKind, TimeBase};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Reference instant all clock readings are measured from.
static REFERENCE_INSTANT: OnceLock<Instant> = OnceLock::new();

/// Monotonic clock reading in milliseconds.
#[allow(clippy::cast_possible_truncation)]
pub fn now_ms() -> i64 {
    let reference = REFERENCE_INSTANT.get_or_init(Instant::now);
    reference.elapsed().as_millis() as i64
}

/// Picks the timestamp that drives the clock: the packet decode timestamp if
/// the frame has one, else its presentation timestamp, else zero. The result
/// is converted from `time_base` ticks to milliseconds.
pub fn frame_timestamp_ms(pkt_dts: Option<i64>, pts: Option<i64>, time_base: TimeBase) -> i64 {
    let ticks = pkt_dts.or(pts).unwrap_or(0);
    time_base.ticks_to_millis(ticks)
}

/// How long to hold a frame back, bounded by `threshold`.
///
/// Returns `None` when the frame is on time or late.
#[allow(clippy::cast_sign_loss)]
pub fn pacing_sleep(timestamp_ms: i64, elapsed_ms: i64, threshold: Duration) -> Option<Duration> {
    if timestamp_ms <= elapsed_ms {
        return None;
    }
    let ahead = Duration::from_millis((timestamp_ms - elapsed_ms) as u64);
    Some(ahead.min(threshold))
}

impl<S: MediaSession, H: FrameHandler> Worker<S, H> {
    /// Records the frame's timestamp as the current position. The first
    /// update after a successful seek re-anchors the start reference so
    /// pacing neither stalls nor races ahead.
    pub(super) fn update_timestamp(&self, frame: &DecodedFrame) -> i64 {
        let timestamp_ms = frame_timestamp_ms(frame.pkt_dts, frame.pts, self.time_base);

        let mut transport = self.shared.lock();
        transport.current_ts_ms = timestamp_ms;
        if transport.seek_succeeded {
            transport.start_ref_ms = Some(now_ms() - timestamp_ms);
            transport.seek_succeeded = false;
        }
        timestamp_ms
    }

    /// Paces delivery of a frame stamped `timestamp_ms`.
    ///
    /// Returns the signed delay `elapsed - timestamp` (positive when late).
    pub(super) fn av_sync(&self, timestamp_ms: i64) -> i64 {
        let now = now_ms();
        let start_ref = self.shared.lock().start_ref_ms.unwrap_or(now);
        let elapsed_ms = now - start_ref;

        if self.kind == MediaKind::Audio {
            self.messages
                .send(DecoderMessage::DecodingTime(millis_to_secs(timestamp_ms)));
        }

        if let Some(sleep) = pacing_sleep(timestamp_ms, elapsed_ms, self.sync.delay_threshold()) {
            std::thread::sleep(sleep);
        }

        elapsed_ms - timestamp_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: Duration = Duration::from_millis(100);

    #[test]
    fn decode_timestamp_wins() {
        let tb = TimeBase::new(1, 1000);
        assert_eq!(frame_timestamp_ms(Some(40), Some(80), tb), 40);
    }

    #[test]
    fn falls_back_to_presentation_timestamp() {
        let tb = TimeBase::new(1, 90_000);
        assert_eq!(frame_timestamp_ms(None, Some(180_000), tb), 2000);
    }

    #[test]
    fn missing_timestamps_mean_zero() {
        let tb = TimeBase::new(1, 90_000);
        assert_eq!(frame_timestamp_ms(None, None, tb), 0);
    }

    #[test]
    fn early_frame_sleeps_for_the_gap() {
        assert_eq!(
            pacing_sleep(1040, 1000, THRESHOLD),
            Some(Duration::from_millis(40))
        );
    }

    #[test]
    fn sleep_is_clamped_to_threshold() {
        assert_eq!(pacing_sleep(5000, 0, THRESHOLD), Some(THRESHOLD));
        assert_eq!(pacing_sleep(101, 0, THRESHOLD), Some(THRESHOLD));
        assert_eq!(pacing_sleep(i64::MAX / 2, 0, THRESHOLD), Some(THRESHOLD));
    }

    #[test]
    fn late_or_on_time_frames_do_not_sleep() {
        assert_eq!(pacing_sleep(1000, 1000, THRESHOLD), None);
        assert_eq!(pacing_sleep(900, 1000, THRESHOLD), None);
    }

    #[test]
    fn clock_is_monotonic() {
        let first = now_ms();
        std::thread::sleep(Duration::from_millis(2));
        assert!(now_ms() >= first);
    }
}

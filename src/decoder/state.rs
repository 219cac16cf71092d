// SPDX-License-Identifier: MPL-2.0
//! Decoder state machine and the transport state shared between the control
//! thread and the decode thread.
//!
//! ```text
//! Unstarted ──▶ Decoding ◀──▶ Paused
//!     │             │            │
//!     └─────────────┴────────────┴──▶ Stopped (terminal)
//! ```
//!
//! All transitions go through [`Transport`], which is only ever touched with
//! the instance mutex held. The rules live here so both threads agree on them.

use crate::media::StreamInfo;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Lifecycle state of a decoder instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderState {
    /// Created, decode thread not running yet (or still opening the stream).
    #[default]
    Unstarted,
    /// Consuming packets and delivering frames.
    Decoding,
    /// Idle; the loop waits for a resume, seek or stop.
    Paused,
    /// Terminal. The loop has exited or is about to.
    Stopped,
}

impl DecoderState {
    #[must_use]
    pub fn is_decoding(self) -> bool {
        matches!(self, Self::Decoding)
    }

    #[must_use]
    pub fn is_paused(self) -> bool {
        matches!(self, Self::Paused)
    }

    #[must_use]
    pub fn is_stopped(self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// Mutable state shared between the control side and the decode loop.
#[derive(Debug, Default)]
pub(crate) struct Transport {
    pub state: DecoderState,
    /// Requested seek position in seconds, consumed by the next read cycle.
    pub pending_seek: Option<f32>,
    /// Set by a successful seek, cleared by the next timestamp update.
    pub seek_succeeded: bool,
    /// Presentation time of the last delivered frame, in milliseconds.
    pub current_ts_ms: i64,
    /// Clock reading (ms) that corresponds to presentation time zero.
    pub start_ref_ms: Option<i64>,
    pub duration_ms: i64,
    pub stream: Option<StreamInfo>,
}

impl Transport {
    /// Prepares a fresh launch of the decode thread.
    ///
    /// A pause issued before the first start is superseded by the start.
    /// Returns false if the instance is already stopped.
    pub fn prepare_launch(&mut self) -> bool {
        match self.state {
            DecoderState::Stopped => false,
            DecoderState::Paused => {
                self.state = DecoderState::Unstarted;
                true
            }
            _ => true,
        }
    }

    /// Resumes a paused loop. Returns true if the state changed.
    pub fn resume(&mut self) -> bool {
        if self.state == DecoderState::Paused {
            self.state = DecoderState::Decoding;
            return true;
        }
        false
    }

    pub fn pause(&mut self) {
        if matches!(self.state, DecoderState::Decoding | DecoderState::Unstarted) {
            self.state = DecoderState::Paused;
        }
    }

    pub fn stop(&mut self) {
        self.state = DecoderState::Stopped;
    }

    /// Records a seek request. Seeking always implies playback, so a paused
    /// instance resumes. Returns false (and records nothing) once stopped.
    pub fn request_seek(&mut self, position_secs: f32) -> bool {
        if self.state == DecoderState::Stopped {
            return false;
        }
        self.pending_seek = Some(position_secs);
        if self.state == DecoderState::Paused {
            self.state = DecoderState::Decoding;
        }
        true
    }

    /// Called by the loop once the stream is open.
    pub fn enter_decoding(&mut self) {
        if self.state == DecoderState::Unstarted {
            self.state = DecoderState::Decoding;
        }
    }

    /// Called by the loop when the pump hits end of stream or a read error.
    pub fn idle_at_end(&mut self) {
        if self.state.is_decoding() {
            self.state = DecoderState::Paused;
        }
    }
}

/// One mutex and one condition variable per decoder instance.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    transport: Mutex<Transport>,
    wakeup: Condvar,
}

impl Shared {
    pub fn lock(&self) -> MutexGuard<'_, Transport> {
        self.transport.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn notify(&self) {
        self.wakeup.notify_all();
    }

    /// Waits for a notification or `timeout`, whichever comes first.
    pub fn wait_timeout<'a>(
        &self,
        guard: MutexGuard<'a, Transport>,
        timeout: Duration,
    ) -> MutexGuard<'a, Transport> {
        match self.wakeup.wait_timeout(guard, timeout) {
            Ok((guard, _)) => guard,
            Err(poisoned) => poisoned.into_inner().0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport_in(state: DecoderState) -> Transport {
        Transport {
            state,
            ..Transport::default()
        }
    }

    #[test]
    fn default_is_unstarted() {
        assert_eq!(DecoderState::default(), DecoderState::Unstarted);
    }

    #[test]
    fn stopped_is_terminal() {
        let mut t = transport_in(DecoderState::Stopped);
        assert!(!t.prepare_launch());
        assert!(!t.resume());
        t.pause();
        t.enter_decoding();
        t.idle_at_end();
        assert!(!t.request_seek(3.0));
        assert_eq!(t.state, DecoderState::Stopped);
        assert_eq!(t.pending_seek, None);
    }

    #[test]
    fn seek_while_paused_resumes() {
        let mut t = transport_in(DecoderState::Paused);
        assert!(t.request_seek(5.0));
        assert_eq!(t.state, DecoderState::Decoding);
        assert_eq!(t.pending_seek, Some(5.0));
    }

    #[test]
    fn newer_seek_supersedes_pending_one() {
        let mut t = transport_in(DecoderState::Decoding);
        t.request_seek(2.0);
        t.request_seek(7.5);
        assert_eq!(t.pending_seek.take(), Some(7.5));
        assert_eq!(t.pending_seek, None);
    }

    #[test]
    fn resume_only_changes_paused() {
        let mut t = transport_in(DecoderState::Decoding);
        assert!(!t.resume());
        let mut t = transport_in(DecoderState::Paused);
        assert!(t.resume());
        assert_eq!(t.state, DecoderState::Decoding);
    }

    #[test]
    fn launch_supersedes_early_pause() {
        let mut t = transport_in(DecoderState::Unstarted);
        t.pause();
        assert_eq!(t.state, DecoderState::Paused);
        assert!(t.prepare_launch());
        assert_eq!(t.state, DecoderState::Unstarted);
    }

    #[test]
    fn enter_decoding_respects_pause_during_open() {
        let mut t = transport_in(DecoderState::Paused);
        t.enter_decoding();
        assert_eq!(t.state, DecoderState::Paused);

        let mut t = transport_in(DecoderState::Unstarted);
        t.enter_decoding();
        assert_eq!(t.state, DecoderState::Decoding);
    }

    #[test]
    fn end_of_stream_idles_only_when_decoding() {
        let mut t = transport_in(DecoderState::Decoding);
        t.idle_at_end();
        assert_eq!(t.state, DecoderState::Paused);
    }

    #[test]
    fn state_checks() {
        assert!(DecoderState::Decoding.is_decoding());
        assert!(DecoderState::Paused.is_paused());
        assert!(DecoderState::Stopped.is_stopped());
        assert!(!DecoderState::Unstarted.is_decoding());
    }

    #[test]
    fn wait_timeout_returns_after_timeout() {
        let shared = Shared::default();
        let guard = shared.lock();
        let guard = shared.wait_timeout(guard, Duration::from_millis(5));
        assert_eq!(guard.state, DecoderState::Unstarted);
    }
}

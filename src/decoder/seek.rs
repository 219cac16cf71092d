// SPDX-License-Identifier: MPL-2.0
//! Seek controller.
//!
//! A seek request is only recorded by the control thread; the decode thread
//! performs it at the start of its next read cycle. Seek precision is left to
//! the demuxer: the container is positioned anywhere it allows around the
//! target and decoding continues forward from there.

use super::engine::Worker;
use super::handler::FrameHandler;
use super::time_units::secs_to_micros;
use crate::application::port::MediaSession;
use log::{info, warn};

impl<S: MediaSession, H: FrameHandler> Worker<S, H> {
    /// Performs the pending seek, if there is one.
    ///
    /// The pending request is cleared whatever the outcome, so a bad target
    /// is not retried on every cycle. On success the codec is flushed, local
    /// caches are dropped and the clock is told to re-anchor on the next
    /// frame. On failure playback continues from where it was.
    pub(super) fn apply_pending_seek(&mut self) {
        let Some(target_secs) = self.shared.lock().pending_seek.take() else {
            return;
        };
        let target_us = secs_to_micros(target_secs);

        match self.session.seek(target_us) {
            Ok(()) => {
                self.session.flush();
                self.handler.clear_cache();
                self.shared.lock().seek_succeeded = true;
                info!("{} decoder seeked to {:.3}s", self.kind, target_secs);
            }
            Err(e) => {
                self.shared.lock().seek_succeeded = false;
                warn!("{} decoder seek to {:.3}s failed: {}", self.kind, target_secs, e);
            }
        }
    }
}

// SPDX-License-Identifier: MPL-2.0
//! Packet/frame pump: advances playback by one packet of the instance's
//! stream.

use super::engine::Worker;
use super::handler::FrameHandler;
use crate::application::port::{MediaSession, StreamPacket};
use crate::error::DecoderError;
use log::{trace, warn};

impl<S: MediaSession, H: FrameHandler> Worker<S, H> {
    /// Reads packets until one of this stream yields at least one frame.
    ///
    /// Packets of other streams are skipped, and so are packets the codec
    /// buffers without output (reordering delay). Every frame produced is
    /// timestamped, paced and handed to the frame handler before returning.
    ///
    /// Returns the number of frames delivered.
    ///
    /// # Errors
    ///
    /// [`DecoderError::EndOfStream`] at end of input or when the codec has
    /// been flushed; [`DecoderError::Read`] when demuxing fails.
    pub(super) fn decode_one_packet(&mut self) -> Result<usize, DecoderError> {
        self.apply_pending_seek();

        loop {
            // Dropped at the end of each iteration, on every path.
            let packet = self.session.read_packet()?;
            if packet.stream_index() != self.stream_index {
                continue;
            }

            match self.session.send_packet(&packet) {
                Ok(()) => {}
                Err(DecoderError::EndOfStream) => return Err(DecoderError::EndOfStream),
                Err(e) => warn!("{} decoder rejected packet: {}", self.kind, e),
            }

            let frame_count = self.drain_frames();
            trace!("{} decoder packet produced {} frames", self.kind, frame_count);
            if frame_count > 0 {
                return Ok(frame_count);
            }
        }
    }

    fn drain_frames(&mut self) -> usize {
        let mut frame_count = 0;
        while let Some(mut frame) = self.session.receive_frame() {
            frame.timestamp_ms = self.update_timestamp(&frame);
            let delay_ms = self.av_sync(frame.timestamp_ms);
            trace!(
                "{} frame ts={}ms delay={}ms",
                self.kind,
                frame.timestamp_ms,
                delay_ms
            );
            self.handler.on_frame_available(&frame, &self.messages);
            frame_count += 1;
        }
        frame_count
    }
}

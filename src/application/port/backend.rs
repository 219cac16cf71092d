// SPDX-License-Identifier: MPL-2.0
//! Demux/decode port definition.
//!
//! A [`MediaBackend`] opens one [`MediaSession`] per decoder instance. The
//! session is a "packet in, frame out" view over a single elementary stream:
//! the decoding state machine reads packets, hands the ones belonging to its
//! stream to the codec and drains the frames that come out.
//!
//! # Design Notes
//!
//! - The backend is `Clone + Send + Sync` so the audio and video decoders of
//!   one player can each hold a copy and open their session on their own
//!   thread.
//! - Sessions are **not** required to be `Send`: demux/codec handles are opened
//!   and closed on the decode thread that uses them.
//! - Dropping a session releases all of its resources (frame buffer, packet
//!   buffer, codec context, format context, in that order).

use crate::config::DecoderOptions;
use crate::error::DecoderError;
use crate::media::{DecodedFrame, MediaInfo, MediaKind, StreamInfo};

/// A compressed packet tagged with the container stream it belongs to.
pub trait StreamPacket {
    fn stream_index(&self) -> usize;
}

/// Factory for demux/decode sessions.
pub trait MediaBackend: Clone + Send + Sync + 'static {
    type Session: MediaSession;

    /// Reads container metadata (duration, dimensions, track presence)
    /// without opening a decoder.
    ///
    /// # Errors
    ///
    /// Returns a setup [`DecoderError`] if the source cannot be opened.
    fn probe(&self, locator: &str) -> Result<MediaInfo, DecoderError>;

    /// Opens `locator`, locates its first stream of `kind` and opens a
    /// decoder for it, passing `options` through as key/value configuration.
    ///
    /// # Errors
    ///
    /// Returns a setup [`DecoderError`] (`OpenInput`, `StreamInfo`,
    /// `NoStream`, `CodecNotFound`, `CodecOpen`).
    fn open(
        &self,
        locator: &str,
        kind: MediaKind,
        options: &DecoderOptions,
    ) -> Result<Self::Session, DecoderError>;
}

/// An open demux/decode session over one elementary stream.
pub trait MediaSession {
    type Packet: StreamPacket;

    fn stream_info(&self) -> &StreamInfo;

    /// Demuxes the next packet of any stream.
    ///
    /// # Errors
    ///
    /// [`DecoderError::EndOfStream`] at the end of the input,
    /// [`DecoderError::Read`] on demux failure.
    fn read_packet(&mut self) -> Result<Self::Packet, DecoderError>;

    /// Submits a packet of this session's stream to the codec.
    ///
    /// # Errors
    ///
    /// [`DecoderError::EndOfStream`] once the codec has been flushed and
    /// accepts no more input; [`DecoderError::Decode`] when the packet is
    /// rejected.
    fn send_packet(&mut self, packet: &Self::Packet) -> Result<(), DecoderError>;

    /// Returns the next frame the codec has ready, if any.
    fn receive_frame(&mut self) -> Option<DecodedFrame>;

    /// Seeks the container to `target_us` (microseconds), allowing any
    /// position the format supports.
    ///
    /// # Errors
    ///
    /// [`DecoderError::Seek`] when the demuxer rejects the seek.
    fn seek(&mut self, target_us: i64) -> Result<(), DecoderError>;

    /// Drops any frames buffered inside the codec.
    fn flush(&mut self);
}

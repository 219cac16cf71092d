// SPDX-License-Identifier: MPL-2.0
//! Renderer implementations usable as-is by a host.
//!
//! Actual drawing (OpenGL ES) and playback (OpenSL ES) stay on the host side;
//! these types only do the thread hand-off the decoders need.

pub mod audio;
pub mod video;

pub use audio::{Overflow, QueuedAudioRender};
pub use video::{SurfaceVideoRender, Viewport};

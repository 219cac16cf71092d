// SPDX-License-Identifier: MPL-2.0
//! Latest-frame hand-off between the video decoder and a GL render thread.
//!
//! The decode thread stores each picture and emits a render request; the
//! render thread calls [`SurfaceVideoRender::on_draw_frame`] and uploads
//! whatever is newest. Pictures the render thread did not get to are simply
//! replaced.

use crate::application::port::VideoRender;
use crate::media::VideoFrame;
use log::debug;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Region of the surface a picture is drawn into, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Largest region of a `surface` that shows `video` without distortion,
    /// centred on the free axis.
    pub fn fit(video: (u32, u32), surface: (u32, u32)) -> Option<Self> {
        let (video_w, video_h) = (u64::from(video.0), u64::from(video.1));
        let (surface_w, surface_h) = (u64::from(surface.0), u64::from(surface.1));
        if video_w == 0 || video_h == 0 || surface_w == 0 || surface_h == 0 {
            return None;
        }

        let (width, height) = if video_w * surface_h > surface_w * video_h {
            (surface_w, video_h * surface_w / video_w)
        } else {
            (video_w * surface_h / video_h, surface_h)
        };
        let width = u32::try_from(width).ok()?;
        let height = u32::try_from(height).ok()?;
        Some(Self {
            x: (surface.0 - width) / 2,
            y: (surface.1 - height) / 2,
            width,
            height,
        })
    }
}

#[derive(Debug, Default)]
struct SurfaceState {
    latest: Option<VideoFrame>,
    video_size: (u32, u32),
    surface_size: (u32, u32),
    surface_ready: bool,
    frames_received: u64,
    frames_drawn: u64,
}

/// [`VideoRender`] that keeps only the newest decoded picture.
#[derive(Debug, Default)]
pub struct SurfaceVideoRender {
    state: Mutex<SurfaceState>,
}

impl SurfaceVideoRender {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn on_surface_created(&self) {
        self.lock().surface_ready = true;
        debug!("render surface created");
    }

    pub fn on_surface_changed(&self, width: u32, height: u32) {
        let mut state = self.lock();
        state.surface_ready = true;
        state.surface_size = (width, height);
        debug!("render surface resized to {}x{}", width, height);
    }

    pub fn on_surface_destroyed(&self) {
        self.lock().surface_ready = false;
    }

    /// Takes the newest undrawn picture, if the surface exists and one has
    /// arrived since the last draw.
    pub fn on_draw_frame(&self) -> Option<VideoFrame> {
        let mut state = self.lock();
        if !state.surface_ready {
            return None;
        }
        let frame = state.latest.take()?;
        state.frames_drawn += 1;
        Some(frame)
    }

    /// Where the current video should be drawn on the current surface.
    pub fn viewport(&self) -> Option<Viewport> {
        let state = self.lock();
        Viewport::fit(state.video_size, state.surface_size)
    }

    pub fn video_size(&self) -> (u32, u32) {
        self.lock().video_size
    }

    pub fn has_pending_frame(&self) -> bool {
        self.lock().latest.is_some()
    }

    pub fn frames_received(&self) -> u64 {
        self.lock().frames_received
    }

    pub fn frames_drawn(&self) -> u64 {
        self.lock().frames_drawn
    }
}

impl VideoRender for SurfaceVideoRender {
    fn init(&self, width: u32, height: u32) {
        let mut state = self.lock();
        state.video_size = (width, height);
        state.latest = None;
    }

    fn on_frame_available(&self, frame: &VideoFrame) {
        let mut state = self.lock();
        state.latest = Some(frame.clone());
        state.frames_received += 1;
    }

    fn uninit(&self) {
        self.lock().latest = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{PixelFormat, Plane};

    fn picture(level: u8) -> VideoFrame {
        VideoFrame {
            width: 2,
            height: 2,
            format: PixelFormat::Rgba,
            planes: vec![Plane {
                data: vec![level; 16],
                stride: 8,
            }],
        }
    }

    #[test]
    fn draw_needs_a_surface() {
        let render = SurfaceVideoRender::new();
        render.init(2, 2);
        render.on_frame_available(&picture(1));
        assert_eq!(render.on_draw_frame(), None);

        render.on_surface_created();
        assert_eq!(render.on_draw_frame(), Some(picture(1)));
        assert_eq!(render.frames_drawn(), 1);
    }

    #[test]
    fn only_the_newest_frame_is_drawn() {
        let render = SurfaceVideoRender::new();
        render.on_surface_created();
        render.init(2, 2);
        render.on_frame_available(&picture(1));
        render.on_frame_available(&picture(2));

        assert_eq!(render.on_draw_frame(), Some(picture(2)));
        assert_eq!(render.on_draw_frame(), None);
        assert_eq!(render.frames_received(), 2);
    }

    #[test]
    fn uninit_drops_the_pending_frame() {
        let render = SurfaceVideoRender::new();
        render.on_frame_available(&picture(1));
        render.uninit();
        assert!(!render.has_pending_frame());
    }

    #[test]
    fn viewport_letterboxes_wide_video() {
        assert_eq!(
            Viewport::fit((1920, 1080), (1080, 1920)),
            Some(Viewport {
                x: 0,
                y: 656,
                width: 1080,
                height: 607,
            })
        );
    }

    #[test]
    fn viewport_pillarboxes_tall_video() {
        assert_eq!(
            Viewport::fit((720, 1280), (1920, 1080)),
            Some(Viewport {
                x: 656,
                y: 0,
                width: 607,
                height: 1080,
            })
        );
    }

    #[test]
    fn viewport_needs_known_sizes() {
        assert_eq!(Viewport::fit((0, 0), (100, 100)), None);
        let render = SurfaceVideoRender::new();
        render.init(640, 480);
        assert_eq!(render.viewport(), None);
        render.on_surface_changed(640, 480);
        assert_eq!(
            render.viewport(),
            Some(Viewport {
                x: 0,
                y: 0,
                width: 640,
                height: 480,
            })
        );
    }
}

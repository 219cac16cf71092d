// SPDX-License-Identifier: MPL-2.0
//! Integer-handle control surface used by the platform bridge.
//!
//! Players live in a process-wide registry keyed by non-zero `i64` handles.
//! Handle `0` is the null handle; it and any handle that is unknown or
//! already torn down turn every operation into a no-op (queries return 0).
//!
//! The registry lock is only held to look a player up. Each player has its
//! own lock, so a slow call on one player never blocks another.
//!
//! The host's GL surface is process-wide, as in the Java API: surface
//! callbacks go to the most recently created live player, and a player
//! created after the surface exists is brought up to date on registration.

use crate::application::port::MediaBackend;
use crate::config::PlayerConfig;
use crate::decoder::MessageSink;
use crate::media::VideoFrame;
use crate::player::{MediaParam, MediaPlayer, PlayerControl, RenderMode, Renderers};
use crate::render::audio::DEFAULT_QUEUE_CAPACITY;
use crate::render::{Overflow, QueuedAudioRender, SurfaceVideoRender};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

pub type PlayerHandle = i64;

pub const NULL_HANDLE: PlayerHandle = 0;

type SharedPlayer = Arc<Mutex<Box<dyn PlayerControl>>>;

struct Entry {
    player: SharedPlayer,
    surface: Option<Arc<SurfaceVideoRender>>,
    audio: Option<Arc<QueuedAudioRender>>,
}

/// Last known state of the host's drawing surface.
#[derive(Debug, Default, Clone, Copy)]
struct HostSurface {
    created: bool,
    size: Option<(u32, u32)>,
}

static NEXT_HANDLE: AtomicI64 = AtomicI64::new(1);

fn registry() -> MutexGuard<'static, HashMap<PlayerHandle, Entry>> {
    static REGISTRY: OnceLock<Mutex<HashMap<PlayerHandle, Entry>>> = OnceLock::new();
    REGISTRY
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn host_surface() -> MutexGuard<'static, HostSurface> {
    static HOST_SURFACE: OnceLock<Mutex<HostSurface>> = OnceLock::new();
    HOST_SURFACE
        .get_or_init(|| Mutex::new(HostSurface::default()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn lookup(handle: PlayerHandle) -> Option<SharedPlayer> {
    if handle == NULL_HANDLE {
        return None;
    }
    let player = registry().get(&handle).map(|entry| Arc::clone(&entry.player));
    if player.is_none() {
        debug!("ignoring call on unknown player handle {}", handle);
    }
    player
}

fn with_player<R>(handle: PlayerHandle, f: impl FnOnce(&mut dyn PlayerControl) -> R) -> Option<R> {
    let player = lookup(handle)?;
    let mut guard = player.lock().unwrap_or_else(PoisonError::into_inner);
    Some(f(guard.as_mut()))
}

/// Adds `player` to the registry and returns its handle.
///
/// `surface` is the latest-frame renderer the host's render thread draws
/// from and `audio` the PCM queue its audio output drains, when the player
/// was built with them.
pub fn register(
    player: Box<dyn PlayerControl>,
    surface: Option<Arc<SurfaceVideoRender>>,
    audio: Option<Arc<QueuedAudioRender>>,
) -> PlayerHandle {
    if let Some(surface) = &surface {
        let host = *host_surface();
        if host.created {
            surface.on_surface_created();
        }
        if let Some((width, height)) = host.size {
            surface.on_surface_changed(width, height);
        }
    }

    let handle = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
    registry().insert(
        handle,
        Entry {
            player: Arc::new(Mutex::new(player)),
            surface,
            audio,
        },
    );
    handle
}

/// Creates a player over `backend` with the default renderers: a
/// [`SurfaceVideoRender`] reachable through [`surface`] and a PCM queue
/// reachable through [`audio`] that drops its oldest frame when nobody
/// drains it.
///
/// Unknown render mode codes fall back to OpenGL.
pub fn create_with_backend<B: MediaBackend>(
    backend: B,
    locator: &str,
    render_mode: i32,
    config: &PlayerConfig,
    messages: MessageSink,
) -> PlayerHandle {
    let mode = RenderMode::from_code(render_mode).unwrap_or_else(|| {
        warn!("unknown render mode {}, using OpenGL", render_mode);
        RenderMode::OpenGl
    });
    let surface = Arc::new(SurfaceVideoRender::new());
    let audio = Arc::new(QueuedAudioRender::new(
        DEFAULT_QUEUE_CAPACITY,
        Overflow::DropOldest,
    ));
    let player = MediaPlayer::new(
        backend,
        locator,
        mode,
        Renderers::new(surface.clone(), audio.clone()),
        config,
        messages,
    );
    register(Box::new(player), Some(surface), Some(audio))
}

/// Creates a player decoding `locator` through FFmpeg.
#[cfg(feature = "ffmpeg")]
pub fn create(
    locator: &str,
    render_mode: i32,
    config: &PlayerConfig,
    messages: MessageSink,
) -> PlayerHandle {
    create_with_backend(
        crate::infrastructure::ffmpeg::FfmpegBackend::with_options(config.decoder.clone()),
        locator,
        render_mode,
        config,
        messages,
    )
}

/// Starts or resumes both decoders.
pub fn play(handle: PlayerHandle) {
    with_player(handle, |player| player.play());
}

pub fn pause(handle: PlayerHandle) {
    with_player(handle, |player| player.pause());
}

pub fn stop(handle: PlayerHandle) {
    with_player(handle, |player| player.stop());
}

/// Requests a seek to `position_secs` on both decoders.
pub fn seek(handle: PlayerHandle, position_secs: f32) {
    with_player(handle, |player| player.seek_to_position(position_secs));
}

/// Reads a [`MediaParam`] by its numeric code. Unknown codes yield 0.
pub fn get_media_params(handle: PlayerHandle, code: i32) -> i64 {
    let Some(param) = MediaParam::from_code(code) else {
        debug!("unknown media param code {}", code);
        return 0;
    };
    with_player(handle, |player| player.get_media_params(param)).unwrap_or(0)
}

/// Retires `handle`: the player is removed from the registry, stopped and
/// its decode threads joined before this returns.
pub fn teardown(handle: PlayerHandle) {
    if handle == NULL_HANDLE {
        return;
    }
    let Some(entry) = registry().remove(&handle) else {
        debug!("teardown of unknown player handle {}", handle);
        return;
    };
    entry
        .player
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .teardown();
}

/// Latest-frame renderer of the player, for the host's render thread.
pub fn surface(handle: PlayerHandle) -> Option<Arc<SurfaceVideoRender>> {
    if handle == NULL_HANDLE {
        return None;
    }
    registry()
        .get(&handle)
        .and_then(|entry| entry.surface.clone())
}

/// PCM queue of the player, for the host's audio output.
pub fn audio(handle: PlayerHandle) -> Option<Arc<QueuedAudioRender>> {
    if handle == NULL_HANDLE {
        return None;
    }
    registry().get(&handle).and_then(|entry| entry.audio.clone())
}

/// Surface of the most recently created live player that has one.
pub fn current_surface() -> Option<Arc<SurfaceVideoRender>> {
    registry()
        .iter()
        .filter_map(|(handle, entry)| entry.surface.as_ref().map(|surface| (*handle, surface)))
        .max_by_key(|(handle, _)| *handle)
        .map(|(_, surface)| Arc::clone(surface))
}

/// The host's drawing surface was (re)created.
pub fn surface_created() {
    host_surface().created = true;
    if let Some(surface) = current_surface() {
        surface.on_surface_created();
    }
}

/// The host's drawing surface now measures `width` x `height`.
pub fn surface_changed(width: u32, height: u32) {
    host_surface().size = Some((width, height));
    if let Some(surface) = current_surface() {
        surface.on_surface_changed(width, height);
    }
}

/// Takes the frame the host's render thread should draw next, if any.
pub fn draw_frame() -> Option<VideoFrame> {
    current_surface().and_then(|surface| surface.on_draw_frame())
}

pub fn is_registered(handle: PlayerHandle) -> bool {
    handle != NULL_HANDLE && registry().contains_key(&handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::synthetic::{SyntheticBackend, SyntheticMedia};

    fn create_clip() -> PlayerHandle {
        create_with_backend(
            SyntheticBackend::new().with_source(
                "clip",
                SyntheticMedia::new(2000).with_video(320, 240, 25),
            ),
            "clip",
            0,
            &PlayerConfig::default(),
            MessageSink::none(),
        )
    }

    #[test]
    fn handles_are_unique_and_non_zero() {
        let first = create_clip();
        let second = create_clip();
        assert_ne!(first, NULL_HANDLE);
        assert_ne!(first, second);
        teardown(first);
        teardown(second);
    }

    #[test]
    fn null_handle_is_a_no_op() {
        play(NULL_HANDLE);
        pause(NULL_HANDLE);
        stop(NULL_HANDLE);
        seek(NULL_HANDLE, 1.0);
        teardown(NULL_HANDLE);
        assert_eq!(get_media_params(NULL_HANDLE, 3), 0);
        assert!(surface(NULL_HANDLE).is_none());
        assert!(audio(NULL_HANDLE).is_none());
        assert!(!is_registered(NULL_HANDLE));
    }

    #[test]
    fn retired_handle_is_a_no_op() {
        let handle = create_clip();
        assert!(is_registered(handle));
        assert_eq!(get_media_params(handle, 1), 320);
        teardown(handle);

        assert!(!is_registered(handle));
        play(handle);
        teardown(handle);
        assert_eq!(get_media_params(handle, 1), 0);
    }

    #[test]
    fn unknown_param_code_reads_zero() {
        let handle = create_clip();
        assert_eq!(get_media_params(handle, 42), 0);
        assert_eq!(get_media_params(handle, 3), 2000);
        teardown(handle);
    }

    #[test]
    fn default_players_expose_their_renderers() {
        let handle = create_clip();
        assert!(surface(handle).is_some());
        assert!(audio(handle).is_some());
        teardown(handle);
        assert!(audio(handle).is_none());
    }
}

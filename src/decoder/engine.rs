// SPDX-License-Identifier: MPL-2.0
//! Generic decoder engine: one decode thread per elementary stream.
//!
//! The control side ([`DecoderEngine`]) only flips shared state and wakes the
//! loop; the decode thread owns the backend session and the frame handler for
//! its whole life. Opening happens on the decode thread, so `start` never
//! blocks on I/O.

use super::handler::FrameHandler;
use super::message::{DecoderMessage, MessageSink};
use super::state::{DecoderState, Shared};
use super::sync::now_ms;
use super::time_units::millis_to_secs;
use crate::application::port::{MediaBackend, MediaSession};
use crate::config::{DecoderOptions, PlayerConfig, SyncConfig};
use crate::error::DecoderError;
use crate::media::{MediaKind, StreamInfo, TimeBase};
use log::{debug, error, info, trace, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Everything the decode thread takes ownership of when it launches.
struct Launch<B, H> {
    backend: B,
    handler: H,
    options: DecoderOptions,
}

/// State owned by a running decode thread.
pub(super) struct Worker<S: MediaSession, H: FrameHandler> {
    pub(super) kind: MediaKind,
    pub(super) stream_index: usize,
    pub(super) time_base: TimeBase,
    pub(super) session: S,
    pub(super) handler: H,
    pub(super) shared: Arc<Shared>,
    pub(super) messages: MessageSink,
    pub(super) sync: SyncConfig,
}

impl<S: MediaSession, H: FrameHandler> Worker<S, H> {
    fn decoding_loop(&mut self) {
        self.shared.lock().enter_decoding();

        loop {
            {
                let mut transport = self.shared.lock();
                while transport.state.is_paused() {
                    transport = self
                        .shared
                        .wait_timeout(transport, self.sync.pause_poll_interval());
                    // Time spent paused must not count as elapsed playback.
                    transport.start_ref_ms = Some(now_ms() - transport.current_ts_ms);
                }
                if transport.state.is_stopped() {
                    break;
                }
                if transport.start_ref_ms.is_none() {
                    transport.start_ref_ms = Some(now_ms());
                }
            }

            match self.decode_one_packet() {
                Ok(frames) => trace!("{} decoder delivered {} frames", self.kind, frames),
                Err(DecoderError::EndOfStream) => {
                    info!("{} decoder reached end of stream", self.kind);
                    self.shared.lock().idle_at_end();
                }
                Err(e) => {
                    warn!("{} decoder stopped reading: {}", self.kind, e);
                    self.shared.lock().idle_at_end();
                }
            }
        }
    }

    /// Closes the session and gives the handler back for the done callback.
    fn finish(self) -> H {
        let Worker {
            session, handler, ..
        } = self;
        drop(session);
        handler
    }
}

fn run<B: MediaBackend, H: FrameHandler>(
    launch: Launch<B, H>,
    kind: MediaKind,
    locator: String,
    shared: Arc<Shared>,
    messages: MessageSink,
    sync: SyncConfig,
) {
    let Launch {
        backend,
        mut handler,
        options,
    } = launch;

    debug!("{} decoder opening {}", kind, locator);
    handler = match backend.open(&locator, kind, &options) {
        Ok(session) => {
            let stream = session.stream_info().clone();
            {
                let mut transport = shared.lock();
                transport.duration_ms = stream.duration_ms;
                transport.stream = Some(stream.clone());
            }
            handler.on_ready(&stream, &messages);
            messages.send(DecoderMessage::Ready);
            info!(
                "{} decoder ready: stream #{} duration {}ms",
                kind, stream.index, stream.duration_ms
            );

            let mut worker = Worker {
                kind,
                stream_index: stream.index,
                time_base: stream.time_base,
                session,
                handler,
                shared: Arc::clone(&shared),
                messages: messages.clone(),
                sync,
            };
            worker.decoding_loop();
            worker.finish()
        }
        Err(e) => {
            error!("{} decoder failed to open {}: {}", kind, locator, e);
            messages.send(DecoderMessage::InitError);
            handler
        }
    };

    shared.lock().stop();
    handler.on_done(&messages);
    messages.send(DecoderMessage::Done);
    debug!("{} decoder thread exiting", kind);
}

/// Control handle of one decoder instance.
///
/// All methods are non-blocking except [`Self::teardown`], which joins the
/// decode thread. Dropping the engine tears it down.
pub struct DecoderEngine<B: MediaBackend, H: FrameHandler> {
    kind: MediaKind,
    locator: String,
    shared: Arc<Shared>,
    messages: MessageSink,
    sync: SyncConfig,
    launch: Option<Launch<B, H>>,
    thread: Option<JoinHandle<()>>,
}

impl<B: MediaBackend, H: FrameHandler> DecoderEngine<B, H> {
    pub fn new(
        backend: B,
        locator: impl Into<String>,
        kind: MediaKind,
        handler: H,
        config: &PlayerConfig,
        messages: MessageSink,
    ) -> Self {
        Self {
            kind,
            locator: locator.into(),
            shared: Arc::new(Shared::default()),
            messages,
            sync: config.sync,
            launch: Some(Launch {
                backend,
                handler,
                options: config.decoder.clone(),
            }),
            thread: None,
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Launches the decode thread on first call; resumes a paused instance
    /// afterwards. No-op once stopped.
    pub fn start(&mut self) {
        if self.thread.is_some() {
            if self.shared.lock().resume() {
                debug!("{} decoder resumed", self.kind);
            }
            self.shared.notify();
            return;
        }

        if self.launch.is_none() || !self.shared.lock().prepare_launch() {
            debug!("{} decoder cannot start: already stopped", self.kind);
            return;
        }
        let Some(launch) = self.launch.take() else {
            return;
        };

        let kind = self.kind;
        let locator = self.locator.clone();
        let shared = Arc::clone(&self.shared);
        let messages = self.messages.clone();
        let sync = self.sync;
        let spawned = thread::Builder::new()
            .name(format!("{}-decoder", kind))
            .spawn(move || run(launch, kind, locator, shared, messages, sync));

        match spawned {
            Ok(handle) => self.thread = Some(handle),
            Err(e) => {
                error!("failed to spawn {} decode thread: {}", kind, e);
                self.abandon_launch();
            }
        }
    }

    /// Ends an instance whose decode thread never ran, with the same
    /// messages a failed open produces.
    fn abandon_launch(&mut self) {
        self.launch = None;
        self.shared.lock().stop();
        self.messages.send(DecoderMessage::InitError);
        self.messages.send(DecoderMessage::Done);
    }

    /// Idles the decode loop. The current frame is not interrupted.
    pub fn pause(&self) {
        self.shared.lock().pause();
    }

    /// Requests termination. The loop notices at its next check; use
    /// [`Self::teardown`] to wait for it.
    pub fn stop(&self) {
        self.shared.lock().stop();
        self.shared.notify();
    }

    /// Records a seek to `position_secs`, performed by the decode thread at
    /// its next read cycle. A newer request replaces a pending one. Negative
    /// positions are clamped to zero; non-finite ones are ignored.
    pub fn seek_to_position(&self, position_secs: f32) {
        if !position_secs.is_finite() {
            warn!("{} decoder ignoring seek to {}", self.kind, position_secs);
            return;
        }
        if self.shared.lock().request_seek(position_secs.max(0.0)) {
            debug!("{} decoder seek requested: {:.3}s", self.kind, position_secs);
            self.shared.notify();
        }
    }

    /// Stops the instance and joins its decode thread. Idempotent.
    pub fn teardown(&mut self) {
        self.stop();
        self.launch = None;
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                error!("{} decode thread panicked", self.kind);
            }
        }
    }

    pub fn state(&self) -> DecoderState {
        self.shared.lock().state
    }

    /// Timestamp of the most recently delivered frame.
    pub fn current_position_ms(&self) -> i64 {
        self.shared.lock().current_ts_ms
    }

    /// Stream duration; 0 until the stream has been opened.
    pub fn duration_ms(&self) -> i64 {
        self.shared.lock().duration_ms
    }

    pub fn duration_secs(&self) -> f32 {
        millis_to_secs(self.duration_ms())
    }

    pub fn stream_info(&self) -> Option<StreamInfo> {
        self.shared.lock().stream.clone()
    }
}

impl<B: MediaBackend, H: FrameHandler> Drop for DecoderEngine<B, H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::synthetic::{SyntheticBackend, SyntheticMedia};
    use crate::media::DecodedFrame;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    #[derive(Clone, Default)]
    struct Recorder {
        timestamps: Arc<Mutex<Vec<i64>>>,
        arrivals: Arc<Mutex<Vec<Instant>>>,
        events: Arc<Mutex<Vec<&'static str>>>,
    }

    impl FrameHandler for Recorder {
        fn on_ready(&mut self, _stream: &StreamInfo, _messages: &MessageSink) {
            self.events.lock().unwrap().push("ready");
        }
        fn on_frame_available(&mut self, frame: &DecodedFrame, _messages: &MessageSink) {
            self.timestamps.lock().unwrap().push(frame.timestamp_ms);
            self.arrivals.lock().unwrap().push(Instant::now());
        }
        fn on_done(&mut self, _messages: &MessageSink) {
            self.events.lock().unwrap().push("done");
        }
        fn clear_cache(&mut self) {
            self.events.lock().unwrap().push("clear");
        }
    }

    fn collecting_sink() -> (MessageSink, Arc<Mutex<Vec<DecoderMessage>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&received);
        let sink = MessageSink::new(move |m| captured.lock().unwrap().push(m));
        (sink, received)
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    fn backend() -> SyntheticBackend {
        SyntheticBackend::new().with_source(
            "clip",
            SyntheticMedia::new(300).with_video(64, 48, 25),
        )
    }

    #[test]
    fn open_failure_reports_init_error_then_done() {
        let (sink, received) = collecting_sink();
        let recorder = Recorder::default();
        let mut engine = DecoderEngine::new(
            backend(),
            "missing",
            MediaKind::Video,
            recorder.clone(),
            &PlayerConfig::default(),
            sink,
        );

        engine.start();
        engine.teardown();

        assert_eq!(
            *received.lock().unwrap(),
            vec![DecoderMessage::InitError, DecoderMessage::Done]
        );
        assert_eq!(*recorder.events.lock().unwrap(), vec!["done"]);
        assert_eq!(engine.state(), DecoderState::Stopped);
    }

    #[test]
    fn plays_to_end_then_idles() {
        let (sink, received) = collecting_sink();
        let recorder = Recorder::default();
        let mut engine = DecoderEngine::new(
            backend(),
            "clip",
            MediaKind::Video,
            recorder.clone(),
            &PlayerConfig::default(),
            sink,
        );

        engine.start();
        assert!(wait_until(|| engine.state() == DecoderState::Paused));
        assert_eq!(engine.duration_ms(), 300);
        assert!((engine.duration_secs() - 0.3).abs() < 1e-6);

        let timestamps = recorder.timestamps.lock().unwrap().clone();
        assert!(!timestamps.is_empty());
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(engine.current_position_ms(), *timestamps.last().unwrap());

        engine.teardown();
        let received = received.lock().unwrap();
        assert_eq!(received.first(), Some(&DecoderMessage::Ready));
        assert_eq!(received.last(), Some(&DecoderMessage::Done));
    }

    #[test]
    fn frames_far_in_the_future_wait_at_most_the_threshold() {
        let recorder = Recorder::default();
        let config = PlayerConfig::default();
        let threshold = config.sync.delay_threshold();
        let mut engine = DecoderEngine::new(
            SyntheticBackend::new().with_source(
                "spliced",
                SyntheticMedia::new(600)
                    .with_video(16, 16, 25)
                    .with_timestamp_jump(200, 60_000),
            ),
            "spliced",
            MediaKind::Video,
            recorder.clone(),
            &config,
            MessageSink::none(),
        );

        engine.start();
        assert!(wait_until(|| engine.state() == DecoderState::Paused));
        engine.teardown();

        let timestamps = recorder.timestamps.lock().unwrap().clone();
        assert_eq!(timestamps.len(), 15);
        assert_eq!(timestamps[5], 60_200);

        let arrivals = recorder.arrivals.lock().unwrap().clone();
        let slack = Duration::from_millis(150);
        for pair in arrivals[4..].windows(2) {
            assert!(pair[1] - pair[0] <= threshold + slack);
        }
    }

    #[test]
    fn abandoned_launch_reports_init_error_then_done() {
        let (sink, received) = collecting_sink();
        let mut engine = DecoderEngine::new(
            backend(),
            "clip",
            MediaKind::Video,
            Recorder::default(),
            &PlayerConfig::default(),
            sink,
        );

        engine.abandon_launch();
        engine.start();

        assert_eq!(engine.state(), DecoderState::Stopped);
        assert_eq!(
            *received.lock().unwrap(),
            vec![DecoderMessage::InitError, DecoderMessage::Done]
        );
    }

    #[test]
    fn stop_before_start_is_terminal() {
        let recorder = Recorder::default();
        let mut engine = DecoderEngine::new(
            backend(),
            "clip",
            MediaKind::Video,
            recorder.clone(),
            &PlayerConfig::default(),
            MessageSink::none(),
        );

        engine.stop();
        engine.start();
        engine.seek_to_position(1.0);

        assert_eq!(engine.state(), DecoderState::Stopped);
        engine.teardown();
        assert!(recorder.events.lock().unwrap().is_empty());
    }

    #[test]
    fn seek_after_end_replays_from_target() {
        let recorder = Recorder::default();
        let mut engine = DecoderEngine::new(
            backend(),
            "clip",
            MediaKind::Video,
            recorder.clone(),
            &PlayerConfig::default(),
            MessageSink::none(),
        );

        engine.start();
        assert!(wait_until(|| engine.state() == DecoderState::Paused));
        let delivered = recorder.timestamps.lock().unwrap().len();

        engine.seek_to_position(0.0);
        assert!(wait_until(|| {
            engine.state() == DecoderState::Paused
                && recorder.timestamps.lock().unwrap().len() >= delivered * 2
        }));
        assert!(recorder.events.lock().unwrap().contains(&"clear"));
        engine.teardown();
    }

    #[test]
    fn non_finite_seek_is_ignored() {
        let engine = DecoderEngine::new(
            backend(),
            "clip",
            MediaKind::Video,
            Recorder::default(),
            &PlayerConfig::default(),
            MessageSink::none(),
        );

        engine.seek_to_position(f32::NAN);
        assert_eq!(engine.shared.lock().pending_seek, None);
        engine.seek_to_position(-3.0);
        assert_eq!(engine.shared.lock().pending_seek, Some(0.0));
    }
}

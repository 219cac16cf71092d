// SPDX-License-Identifier: MPL-2.0
//! Bounded PCM queue between the audio decoder and an output device.
//!
//! The decode thread pushes S16 frames through [`AudioRender`]; the output
//! side (an OpenSL buffer-queue callback on Android) pulls them with
//! [`QueuedAudioRender::pop`] or [`QueuedAudioRender::pop_timeout`].

use crate::application::port::AudioRender;
use log::{debug, trace};
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Buffers the device keeps in flight.
pub const DEFAULT_QUEUE_CAPACITY: usize = 3;

/// Longest a producer waits for room before giving up on the oldest frame.
pub const DEFAULT_MAX_BLOCK: Duration = Duration::from_secs(1);

/// What the producer does when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Wait for the consumer (bounded by the queue's max block time).
    Block,
    /// Discard the oldest queued frame immediately.
    DropOldest,
}

#[derive(Debug, Default)]
struct Queue {
    frames: VecDeque<Vec<u8>>,
    open: bool,
    dropped: u64,
}

/// Bounded, thread-safe PCM frame queue implementing [`AudioRender`].
#[derive(Debug)]
pub struct QueuedAudioRender {
    queue: Mutex<Queue>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
    overflow: Overflow,
    max_block: Duration,
}

impl Default for QueuedAudioRender {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY, Overflow::Block)
    }
}

impl QueuedAudioRender {
    pub fn new(capacity: usize, overflow: Overflow) -> Self {
        Self {
            queue: Mutex::new(Queue::default()),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity: capacity.max(1),
            overflow,
            max_block: DEFAULT_MAX_BLOCK,
        }
    }

    #[must_use]
    pub fn with_max_block(mut self, max_block: Duration) -> Self {
        self.max_block = max_block;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().frames.is_empty()
    }

    /// True between `init` and `uninit`.
    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    /// Frames discarded because the queue was full.
    pub fn dropped_frames(&self) -> u64 {
        self.lock().dropped
    }

    /// Takes the oldest frame without waiting.
    pub fn pop(&self) -> Option<Vec<u8>> {
        let frame = self.lock().frames.pop_front();
        if frame.is_some() {
            self.not_full.notify_one();
        }
        frame
    }

    /// Takes the oldest frame, waiting up to `timeout` for one to arrive.
    /// Returns `None` on timeout or once the queue is closed and empty.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<Vec<u8>> {
        let deadline = Instant::now() + timeout;
        let mut queue = self.lock();
        loop {
            if let Some(frame) = queue.frames.pop_front() {
                drop(queue);
                self.not_full.notify_one();
                return Some(frame);
            }
            let now = Instant::now();
            if !queue.open || now >= deadline {
                return None;
            }
            queue = match self.not_empty.wait_timeout(queue, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    /// Closes the queue: pending frames are dropped and blocked producers
    /// and consumers are released.
    pub fn close(&self) {
        {
            let mut queue = self.lock();
            queue.open = false;
            queue.frames.clear();
        }
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }
}

impl AudioRender for QueuedAudioRender {
    fn init(&self) {
        let mut queue = self.lock();
        queue.open = true;
        queue.frames.clear();
        debug!("audio queue opened (capacity {})", self.capacity);
    }

    fn render_audio_frame(&self, data: &[u8]) {
        let deadline = Instant::now() + self.max_block;
        let mut queue = self.lock();

        while queue.open && queue.frames.len() >= self.capacity {
            let now = Instant::now();
            if self.overflow == Overflow::DropOldest || now >= deadline {
                queue.frames.pop_front();
                queue.dropped += 1;
                trace!("audio queue full, dropped oldest frame");
                break;
            }
            queue = match self.not_full.wait_timeout(queue, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }

        if !queue.open {
            return;
        }
        queue.frames.push_back(data.to_vec());
        drop(queue);
        self.not_empty.notify_one();
    }

    fn clear_audio_cache(&self) {
        self.lock().frames.clear();
        self.not_full.notify_all();
    }

    fn uninit(&self) {
        self.close();
        debug!("audio queue closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn frames_before_init_are_discarded() {
        let render = QueuedAudioRender::default();
        render.render_audio_frame(&[1, 2]);
        assert!(render.is_empty());
        assert!(!render.is_open());
    }

    #[test]
    fn frames_come_out_in_order() {
        let render = QueuedAudioRender::default();
        render.init();
        render.render_audio_frame(&[1]);
        render.render_audio_frame(&[2]);
        assert_eq!(render.pop(), Some(vec![1]));
        assert_eq!(render.pop(), Some(vec![2]));
        assert_eq!(render.pop(), None);
    }

    #[test]
    fn drop_oldest_keeps_capacity() {
        let render = QueuedAudioRender::new(2, Overflow::DropOldest);
        render.init();
        for byte in 0..5u8 {
            render.render_audio_frame(&[byte]);
        }
        assert_eq!(render.len(), 2);
        assert_eq!(render.dropped_frames(), 3);
        assert_eq!(render.pop(), Some(vec![3]));
    }

    #[test]
    fn blocked_producer_resumes_when_consumer_pops() {
        let render = Arc::new(QueuedAudioRender::new(1, Overflow::Block));
        render.init();
        render.render_audio_frame(&[1]);

        let producer = {
            let render = Arc::clone(&render);
            thread::spawn(move || render.render_audio_frame(&[2]))
        };
        assert_eq!(render.pop_timeout(Duration::from_secs(1)), Some(vec![1]));
        producer.join().unwrap();
        assert_eq!(render.pop_timeout(Duration::from_secs(1)), Some(vec![2]));
        assert_eq!(render.dropped_frames(), 0);
    }

    #[test]
    fn blocked_producer_is_released_by_uninit() {
        let render = Arc::new(QueuedAudioRender::new(1, Overflow::Block));
        render.init();
        render.render_audio_frame(&[1]);

        let producer = {
            let render = Arc::clone(&render);
            thread::spawn(move || render.render_audio_frame(&[2]))
        };
        thread::sleep(Duration::from_millis(20));
        render.uninit();
        producer.join().unwrap();
        assert!(render.is_empty());
    }

    #[test]
    fn block_gives_up_after_max_block() {
        let render =
            QueuedAudioRender::new(1, Overflow::Block).with_max_block(Duration::from_millis(10));
        render.init();
        render.render_audio_frame(&[1]);
        render.render_audio_frame(&[2]);
        assert_eq!(render.dropped_frames(), 1);
        assert_eq!(render.pop(), Some(vec![2]));
    }

    #[test]
    fn clear_empties_the_queue() {
        let render = QueuedAudioRender::default();
        render.init();
        render.render_audio_frame(&[1]);
        render.clear_audio_cache();
        assert!(render.is_empty());
        assert!(render.is_open());
    }

    #[test]
    fn pop_timeout_returns_none_when_closed() {
        let render = QueuedAudioRender::default();
        assert_eq!(render.pop_timeout(Duration::from_secs(5)), None);
    }
}

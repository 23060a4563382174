// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bounded producer/consumer queue of command batches.

use super::circular_buffer::CircularBuffer;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// How many released batch allocations are kept for reuse.
const MAX_RECYCLED_BUFFERS: usize = 4;

/// One flushed batch of serialized commands.
///
/// A `CommandBuffer` is immutable once published. It belongs to the queue until
/// the consumer hands it back through [`CommandBufferQueue::release_buffer`].
#[derive(Debug)]
pub struct CommandBuffer {
    sequence: u64,
    data: Vec<u8>,
}

impl CommandBuffer {
    /// Position of this batch in flush order, starting at zero.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Size of the batch in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the batch holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The serialized commands.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[derive(Debug)]
struct QueueState {
    pending: VecDeque<CommandBuffer>,
    free_space: usize,
    exit_requested: bool,
    high_watermark: usize,
    next_sequence: u64,
    recycled: Vec<Vec<u8>>,
}

/// A bounded channel of [`CommandBuffer`]s with byte-budget backpressure.
///
/// The queue tracks how many bytes are in flight between the producer and the
/// consumer. A flush waits for room for its batch, and when it leaves less
/// than `required_size` bytes free the producer blocks until the consumer has
/// released enough buffers. A single flush larger than the whole budget is a
/// fatal overflow.
#[derive(Debug)]
pub struct CommandBufferQueue {
    required_size: usize,
    capacity: usize,
    threaded: bool,
    state: Mutex<QueueState>,
    condition: Condvar,
}

impl CommandBufferQueue {
    /// Creates a queue consumed by a dedicated thread.
    ///
    /// ## Arguments
    /// * `required_size` - Minimum free space the producer needs to keep working.
    /// * `capacity` - Total number of bytes that may be in flight at once.
    pub fn new(required_size: usize, capacity: usize) -> Self {
        Self::with_threading(required_size, capacity, true)
    }

    /// Creates a queue that is produced and consumed on the same thread.
    ///
    /// Neither [`flush`](Self::flush) nor [`wait_for_commands`](Self::wait_for_commands)
    /// block on such a queue, since no other thread could wake them.
    pub fn single_threaded(required_size: usize, capacity: usize) -> Self {
        Self::with_threading(required_size, capacity, false)
    }

    fn with_threading(required_size: usize, capacity: usize, threaded: bool) -> Self {
        debug_assert!(required_size <= capacity);
        Self {
            required_size,
            capacity,
            threaded,
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                free_space: capacity,
                exit_requested: false,
                high_watermark: 0,
                next_sequence: 0,
                recycled: Vec::new(),
            }),
            condition: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a producer staging buffer sized for this queue.
    pub fn circular_buffer(&self) -> CircularBuffer {
        CircularBuffer::new(self.capacity)
    }

    /// Minimum free space the producer keeps before blocking.
    pub fn required_size(&self) -> usize {
        self.required_size
    }

    /// Total byte budget of the queue.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if the consumer runs on its own thread.
    pub fn is_threaded(&self) -> bool {
        self.threaded
    }

    /// Publishes everything written to `circular` as a new [`CommandBuffer`].
    ///
    /// Does nothing if `circular` is empty. On a threaded queue this first
    /// blocks until the consumer released enough space for the batch, then
    /// keeps blocking while the free space is below the required size. Once
    /// exit has been requested it never blocks; a batch that still does not
    /// fit is dropped.
    ///
    /// # Panics
    ///
    /// Panics if the batch is larger than the whole queue, or, on a
    /// single-threaded queue, larger than the space currently free.
    pub fn flush(&self, circular: &mut CircularBuffer) {
        if circular.is_empty() {
            return;
        }

        let mut state = self.lock();
        let replacement = state.recycled.pop().unwrap_or_default();
        let data = circular.take(replacement);
        let used = data.len();

        if used > self.capacity {
            drop(state);
            self.overflow(used, self.capacity);
        }
        if self.threaded {
            while used > state.free_space && !state.exit_requested {
                state = self
                    .condition
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
        if used > state.free_space {
            let free = state.free_space;
            if !self.threaded {
                drop(state);
                self.overflow(used, free);
            }
            log::error!(
                "Dropping {} command bytes: the consumer stopped with {} bytes free.",
                used,
                free
            );
            return;
        }

        state.free_space -= used;
        let in_flight = self.capacity - state.free_space;
        state.high_watermark = state.high_watermark.max(in_flight);

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.pending.push_back(CommandBuffer { sequence, data });
        self.condition.notify_all();

        if !self.threaded {
            return;
        }
        while state.free_space < self.required_size && !state.exit_requested {
            state = self
                .condition
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn overflow(&self, used: usize, free: usize) -> ! {
        log::error!(
            "Command buffer overflow: flushed {} bytes with only {} of {} bytes free.",
            used,
            free,
            self.capacity
        );
        panic!(
            "command buffer overflow ({} bytes flushed, {} bytes free)",
            used, free
        );
    }

    /// Waits until at least one buffer is pending or exit has been requested.
    ///
    /// Returns every pending buffer in flush order. An empty result means
    /// exit was requested and nothing is left to drain. On a single-threaded
    /// queue this never blocks and an empty result only means "nothing pending".
    pub fn wait_for_commands(&self) -> Vec<CommandBuffer> {
        let mut state = self.lock();
        if self.threaded {
            while state.pending.is_empty() && !state.exit_requested {
                state = self
                    .condition
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
        state.pending.drain(..).collect()
    }

    /// Returns the space of a consumed buffer to the free budget.
    pub fn release_buffer(&self, buffer: CommandBuffer) {
        let mut state = self.lock();
        state.free_space += buffer.data.len();
        if state.recycled.len() < MAX_RECYCLED_BUFFERS {
            state.recycled.push(buffer.data);
        }
        self.condition.notify_all();
    }

    /// Asks the consumer to stop once the pending buffers are drained.
    pub fn request_exit(&self) {
        let mut state = self.lock();
        state.exit_requested = true;
        self.condition.notify_all();
    }

    /// Returns `true` once [`request_exit`](Self::request_exit) has been called.
    pub fn is_exit_requested(&self) -> bool {
        self.lock().exit_requested
    }

    /// Bytes not currently held by flushed buffers.
    pub fn free_space(&self) -> usize {
        self.lock().free_space
    }

    /// Number of flushed buffers the consumer has not taken yet.
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// The largest number of bytes ever in flight at once.
    pub fn high_watermark(&self) -> usize {
        self.lock().high_watermark
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn flush_bytes(queue: &CommandBufferQueue, circular: &mut CircularBuffer, size: usize, fill: u8) {
        circular.allocate(size).fill(fill);
        queue.flush(circular);
    }

    #[test]
    fn test_buffers_drain_in_order_before_exit() {
        let queue = CommandBufferQueue::new(16, 1024);
        let mut circular = queue.circular_buffer();

        flush_bytes(&queue, &mut circular, 64, 1);
        flush_bytes(&queue, &mut circular, 128, 2);
        flush_bytes(&queue, &mut circular, 32, 3);
        queue.request_exit();

        let buffers = queue.wait_for_commands();
        let sizes: Vec<usize> = buffers.iter().map(CommandBuffer::len).collect();
        let sequences: Vec<u64> = buffers.iter().map(CommandBuffer::sequence).collect();
        assert_eq!(sizes, vec![64, 128, 32]);
        assert_eq!(sequences, vec![0, 1, 2]);
        assert!(buffers[1].as_bytes().iter().all(|&b| b == 2));

        for buffer in buffers {
            queue.release_buffer(buffer);
        }
        assert!(queue.wait_for_commands().is_empty());
        assert_eq!(queue.free_space(), 1024);
    }

    #[test]
    fn test_empty_flush_publishes_nothing() {
        let queue = CommandBufferQueue::single_threaded(16, 1024);
        let mut circular = queue.circular_buffer();
        queue.flush(&mut circular);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_request_exit_is_idempotent() {
        let queue = CommandBufferQueue::new(16, 1024);
        queue.request_exit();
        queue.request_exit();
        assert!(queue.is_exit_requested());
        assert!(queue.wait_for_commands().is_empty());
    }

    #[test]
    fn test_high_watermark_tracks_bytes_in_flight() {
        let queue = CommandBufferQueue::single_threaded(16, 1024);
        let mut circular = queue.circular_buffer();
        flush_bytes(&queue, &mut circular, 100, 0);
        flush_bytes(&queue, &mut circular, 200, 0);
        for buffer in queue.wait_for_commands() {
            queue.release_buffer(buffer);
        }
        flush_bytes(&queue, &mut circular, 50, 0);
        assert_eq!(queue.high_watermark(), 300);
        assert_eq!(queue.free_space(), 974);
    }

    #[test]
    #[should_panic(expected = "command buffer overflow")]
    fn test_overflow_is_fatal() {
        let queue = CommandBufferQueue::single_threaded(16, 128);
        let mut circular = queue.circular_buffer();
        flush_bytes(&queue, &mut circular, 100, 0);
        flush_bytes(&queue, &mut circular, 100, 0);
    }

    #[test]
    fn test_backpressure_preserves_fifo_order() {
        const BATCHES: u64 = 200;
        let queue = Arc::new(CommandBufferQueue::new(256, 512));

        let consumer_queue = Arc::clone(&queue);
        let consumer = thread::spawn(move || {
            let mut seen = Vec::new();
            loop {
                let buffers = consumer_queue.wait_for_commands();
                if buffers.is_empty() {
                    break;
                }
                for buffer in buffers {
                    seen.push((buffer.sequence(), buffer.as_bytes()[0]));
                    consumer_queue.release_buffer(buffer);
                }
            }
            seen
        });

        let mut circular = queue.circular_buffer();
        for i in 0..BATCHES {
            // Each batch leaves less than the required size free, so most
            // flushes block until the consumer releases something.
            flush_bytes(&queue, &mut circular, 200, (i % 251) as u8);
        }
        queue.request_exit();

        let seen = consumer.join().expect("consumer thread panicked");
        assert_eq!(seen.len() as u64, BATCHES);
        for (i, (sequence, marker)) in seen.into_iter().enumerate() {
            assert_eq!(sequence, i as u64);
            assert_eq!(marker, (i % 251) as u8);
        }
        assert!(queue.high_watermark() <= 512);
    }

    #[test]
    fn test_flush_waits_for_a_slow_consumer() {
        // ARRANGE
        let queue = Arc::new(CommandBufferQueue::new(256, 1024));
        let consumer_queue = Arc::clone(&queue);
        let consumer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            let mut sizes = Vec::new();
            loop {
                let buffers = consumer_queue.wait_for_commands();
                if buffers.is_empty() {
                    break;
                }
                for buffer in buffers {
                    sizes.push(buffer.len());
                    consumer_queue.release_buffer(buffer);
                }
            }
            sizes
        });
        let mut circular = queue.circular_buffer();

        // ACT
        flush_bytes(&queue, &mut circular, 300, 1);
        // Only 724 bytes are free until the consumer wakes up.
        flush_bytes(&queue, &mut circular, 800, 2);
        queue.request_exit();

        // ASSERT
        let sizes = consumer.join().expect("consumer thread panicked");
        assert_eq!(sizes, vec![300, 800]);
        assert_eq!(queue.free_space(), 1024);
    }

    #[test]
    #[should_panic(expected = "command buffer overflow")]
    fn test_batch_larger_than_the_queue_is_fatal() {
        let queue = CommandBufferQueue::new(16, 128);
        let mut circular = CircularBuffer::new(256);
        flush_bytes(&queue, &mut circular, 200, 0);
    }

    #[test]
    fn test_flush_after_exit_never_blocks() {
        // ARRANGE
        let queue = CommandBufferQueue::new(16, 128);
        let mut circular = queue.circular_buffer();
        flush_bytes(&queue, &mut circular, 100, 0);

        // ACT
        queue.request_exit();
        flush_bytes(&queue, &mut circular, 100, 0);

        // ASSERT
        assert_eq!(queue.pending_count(), 1);
        assert_eq!(queue.free_space(), 28);
    }
}

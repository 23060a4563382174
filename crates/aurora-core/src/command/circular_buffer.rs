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

//! Producer-side staging area for serialized commands.

/// The bytes written by the producer since the last flush.
///
/// The buffer never grows past `capacity`. Space is reclaimed in bulk when the
/// queue takes the written bytes at flush time; the queue then accounts for
/// them against its own free budget until the consumer releases them.
#[derive(Debug)]
pub struct CircularBuffer {
    data: Vec<u8>,
    capacity: usize,
}

impl CircularBuffer {
    /// Creates an empty buffer able to hold `capacity` bytes per batch.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Vec::new(),
            capacity,
        }
    }

    /// The maximum number of bytes one batch may hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes written since the last flush.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing was written since the last flush.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes still available in the current batch.
    pub fn remaining(&self) -> usize {
        self.capacity - self.data.len()
    }

    /// Reserves `size` zeroed bytes at the end of the batch.
    ///
    /// # Panics
    ///
    /// Panics if the batch would exceed the buffer capacity. Running out of
    /// command space is an unrecoverable misuse of the engine.
    pub fn allocate(&mut self, size: usize) -> &mut [u8] {
        if size > self.remaining() {
            log::error!(
                "Command buffer exhausted: {} bytes requested, {} of {} bytes left.",
                size,
                self.remaining(),
                self.capacity
            );
            panic!(
                "command buffer exhausted ({} bytes requested, capacity {})",
                size, self.capacity
            );
        }
        let start = self.data.len();
        self.data.resize(start + size, 0);
        &mut self.data[start..]
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to bytes written so far.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Takes the written bytes, leaving `replacement` (cleared) in their place.
    pub(crate) fn take(&mut self, mut replacement: Vec<u8>) -> Vec<u8> {
        replacement.clear();
        std::mem::replace(&mut self.data, replacement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_appends_zeroed_bytes() {
        let mut buffer = CircularBuffer::new(16);
        buffer.allocate(4).copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(buffer.allocate(2), &[0, 0]);
        assert_eq!(buffer.len(), 6);
        assert_eq!(buffer.remaining(), 10);
        assert_eq!(&buffer.as_bytes()[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_take_resets_the_batch() {
        let mut buffer = CircularBuffer::new(8);
        buffer.allocate(8);
        let taken = buffer.take(vec![9, 9, 9]);
        assert_eq!(taken.len(), 8);
        assert!(buffer.is_empty());
        assert_eq!(buffer.remaining(), 8);
    }

    #[test]
    #[should_panic(expected = "command buffer exhausted")]
    fn test_exhaustion_is_fatal() {
        let mut buffer = CircularBuffer::new(8);
        buffer.allocate(6);
        buffer.allocate(3);
    }
}

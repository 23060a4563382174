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

//! A tracking allocator for engine objects.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// A snapshot of the counters of a [`HeapAllocator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Objects constructed and not yet destroyed.
    pub live_objects: usize,
    /// Bytes held by live objects.
    pub live_bytes: usize,
    /// Objects ever constructed.
    pub total_allocations: u64,
    /// Objects ever destroyed.
    pub total_deallocations: u64,
}

/// Constructs and destroys the objects owned by an engine.
///
/// Objects live in their own heap allocation so their address never changes
/// while they sit in a resource list. The allocator keeps counters so a leak
/// shows up as a non-zero `live_objects` after shutdown.
#[derive(Debug, Default)]
pub struct HeapAllocator {
    live_objects: AtomicUsize,
    live_bytes: AtomicUsize,
    total_allocations: AtomicU64,
    total_deallocations: AtomicU64,
}

impl HeapAllocator {
    /// Creates an allocator with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `value` into a new heap allocation.
    pub fn make<T>(&self, value: T) -> Box<T> {
        self.live_objects.fetch_add(1, Ordering::Relaxed);
        self.live_bytes
            .fetch_add(std::mem::size_of::<T>(), Ordering::Relaxed);
        self.total_allocations.fetch_add(1, Ordering::Relaxed);
        Box::new(value)
    }

    /// Drops an object created by [`make`](Self::make).
    pub fn destroy<T>(&self, object: Box<T>) {
        drop(object);
        self.live_objects.fetch_sub(1, Ordering::Relaxed);
        self.live_bytes
            .fetch_sub(std::mem::size_of::<T>(), Ordering::Relaxed);
        self.total_deallocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads the current counters.
    pub fn stats(&self) -> HeapStats {
        HeapStats {
            live_objects: self.live_objects.load(Ordering::Relaxed),
            live_bytes: self.live_bytes.load(Ordering::Relaxed),
            total_allocations: self.total_allocations.load(Ordering::Relaxed),
            total_deallocations: self.total_deallocations.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_follow_make_and_destroy() {
        let heap = HeapAllocator::new();
        let a = heap.make([0u64; 4]);
        let b = heap.make(7u32);
        assert_eq!(
            heap.stats(),
            HeapStats {
                live_objects: 2,
                live_bytes: 36,
                total_allocations: 2,
                total_deallocations: 0,
            }
        );

        heap.destroy(a);
        heap.destroy(b);
        let stats = heap.stats();
        assert_eq!(stats.live_objects, 0);
        assert_eq!(stats.live_bytes, 0);
        assert_eq!(stats.total_deallocations, 2);
    }
}

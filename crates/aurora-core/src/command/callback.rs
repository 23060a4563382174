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

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

type Callback = Box<dyn FnOnce() + Send>;

/// Closures waiting for their `Callback` command to be executed.
///
/// Closures cannot be serialized, so the stream only records an id and the
/// closure itself travels through this table, shared by both threads.
#[derive(Default)]
pub struct CallbackTable {
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, Callback>>,
}

impl CallbackTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `callback` and returns the id to record in the stream.
    pub fn register(&self, callback: impl FnOnce() + Send + 'static) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Box::new(callback));
        id
    }

    /// Runs and forgets the callback registered under `id`.
    ///
    /// Returns `false` if no such callback exists.
    pub fn invoke(&self, id: u64) -> bool {
        let callback = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Number of callbacks not yet invoked.
    pub fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if every registered callback has run.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for CallbackTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackTable")
            .field("pending", &self.len())
            .finish()
    }
}

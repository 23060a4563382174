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

//! Bookkeeping of the live engine instances.

use crate::ThreadingMode;
use aurora_core::driver::Backend;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Instant;

/// Identifies an engine within its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EngineId(u64);

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Engine#{}", self.0)
    }
}

/// What the registry knows about a live engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineRecord {
    /// The backend the driver was created for.
    pub backend: Backend,
    /// Whether the engine runs a driver thread.
    pub threading: ThreadingMode,
    /// When the engine was registered.
    pub registered_at: Instant,
}

/// The set of engines that are created and not yet destroyed.
///
/// Engines register only once their driver is ready and unregister before
/// shutting down, so membership is the authority on whether an engine may
/// still be used. Engine creation and destruction may happen from any thread.
#[derive(Debug, Default)]
pub struct EngineRegistry {
    engines: Mutex<HashMap<EngineId, EngineRecord>>,
    next_id: AtomicU64,
}

impl EngineRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by engines created without an explicit one.
    pub fn global() -> Arc<EngineRegistry> {
        static GLOBAL: OnceLock<Arc<EngineRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(EngineRegistry::new())))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<EngineId, EngineRecord>> {
        self.engines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserves a fresh identifier.
    pub(crate) fn next_id(&self) -> EngineId {
        EngineId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub(crate) fn register(&self, id: EngineId, record: EngineRecord) {
        self.lock().insert(id, record);
    }

    /// Removes an engine and returns its record, or `None` if it was not registered.
    ///
    /// Any later use of that engine is fatal.
    pub fn unregister(&self, id: EngineId) -> Option<EngineRecord> {
        self.lock().remove(&id)
    }

    /// Panics unless `id` is registered.
    pub fn assert_valid(&self, id: EngineId) {
        if !self.is_registered(id) {
            log::error!("{} is not registered: it was destroyed or never created.", id);
            panic!("Using an Engine instance after it's been destroyed ({})", id);
        }
    }

    /// Returns `true` if `id` is registered.
    pub fn is_registered(&self, id: EngineId) -> bool {
        self.lock().contains_key(&id)
    }

    /// The record of a registered engine.
    pub fn record(&self, id: EngineId) -> Option<EngineRecord> {
        self.lock().get(&id).copied()
    }

    /// Number of registered engines.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no engine is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> EngineRecord {
        EngineRecord {
            backend: Backend::Noop,
            threading: ThreadingMode::Threaded,
            registered_at: Instant::now(),
        }
    }

    #[test]
    fn test_unregister_transfers_the_record_once() {
        let registry = EngineRegistry::new();
        let id = registry.next_id();
        registry.register(id, record());

        assert!(registry.is_registered(id));
        assert!(registry.unregister(id).is_some());
        assert!(registry.unregister(id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    #[should_panic(expected = "after it's been destroyed")]
    fn test_assert_valid_panics_for_unknown_engine() {
        let registry = EngineRegistry::new();
        let id = registry.next_id();
        registry.assert_valid(id);
    }
}

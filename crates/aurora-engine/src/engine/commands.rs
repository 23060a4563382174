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

use super::{execute_inline, Engine, ExecutionContext};
use crate::driver_thread::DriverThreadState;
use aurora_core::command::{DriverApi, StreamRange};
use aurora_data::resources::{FenceSignal, FenceStatus};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long a blocked client sleeps between driver liveness checks.
const WAIT_SLICE: Duration = Duration::from_millis(10);

impl Engine {
    /// Publishes the commands recorded so far to the driver.
    ///
    /// Blocks while the command queue is too full to accept another batch.
    pub fn flush(&mut self) {
        self.assert_valid();
        self.driver_api.flush();
    }

    /// Flushes and blocks until every command recorded so far was executed.
    ///
    /// In single-threaded mode the commands are executed before returning.
    pub fn flush_and_wait(&mut self) {
        self.assert_valid();
        let signal = Arc::new(FenceSignal::default());
        let reached = Arc::clone(&signal);
        self.driver_api.queue_callback(move || reached.signal());
        self.driver_api.flush();
        execute_inline(&mut self.context, self.driver_api.queue());
        if self.wait_signal(&signal, None) == FenceStatus::Error {
            log::error!("{} flush_and_wait() gave up: the driver is gone.", self.id);
        }
    }

    /// Blocks on `signal` for at most `timeout`, `None` meaning forever.
    ///
    /// Inline execution never blocks. A driver thread that terminated
    /// without reaching the signal yields [`FenceStatus::Error`].
    pub(super) fn wait_signal(
        &self,
        signal: &FenceSignal,
        timeout: Option<Duration>,
    ) -> FenceStatus {
        let ExecutionContext::Threaded(thread) = &self.context else {
            return signal.wait(Some(Duration::ZERO));
        };
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        loop {
            let slice = deadline.map_or(WAIT_SLICE, |deadline| {
                deadline.saturating_duration_since(Instant::now()).min(WAIT_SLICE)
            });
            if signal.wait(Some(slice)) == FenceStatus::ConditionSatisfied {
                return FenceStatus::ConditionSatisfied;
            }
            if thread.state() == DriverThreadState::Terminated {
                // The guard may have run between the callback and our check.
                return if signal.is_signaled() {
                    FenceStatus::ConditionSatisfied
                } else {
                    FenceStatus::Error
                };
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return FenceStatus::TimeoutExpired;
            }
        }
    }

    /// Flushes and executes the pending commands on the calling thread.
    ///
    /// # Panics
    ///
    /// Panics if the engine runs a driver thread.
    pub fn execute(&mut self) {
        self.assert_valid();
        if matches!(self.context, ExecutionContext::Threaded(_)) {
            log::error!("Engine::execute() called on a threaded engine.");
            panic!("Engine::execute() is only available in single-threaded mode");
        }
        self.driver_api.flush();
        execute_inline(&mut self.context, self.driver_api.queue());
    }

    /// Uploads the parameters of every modified material instance, the
    /// default instance of each material included.
    ///
    /// ## Returns
    /// The number of instances committed.
    pub fn prepare(&mut self) -> usize {
        self.assert_valid();
        let driver = &mut self.driver_api;
        let defaults = self
            .lists
            .materials_mut()
            .map(|(_, material)| material.default_instance_mut().commit(driver))
            .filter(|committed| *committed)
            .count();
        let instances = self
            .lists
            .material_instances_mut()
            .map(|(_, instance)| instance.commit(driver))
            .filter(|committed| *committed)
            .count();
        defaults + instances
    }

    /// Reserves scratch space inside the current command batch.
    ///
    /// The space lives until the next flush and can be handed to commands
    /// such as [`IndexBuffer::set_buffer_range`](aurora_data::resources::IndexBuffer::set_buffer_range).
    /// Returns `None` if `size` is above the configured limit, `alignment` is
    /// not a power of two, or the batch is full.
    pub fn stream_alloc(&mut self, size: usize, alignment: usize) -> Option<StreamRange> {
        self.assert_valid();
        if size > self.config.stream_alloc_limit {
            log::debug!(
                "stream_alloc of {} bytes is above the {} byte limit",
                size,
                self.config.stream_alloc_limit
            );
            return None;
        }
        self.driver_api.allocate(size, alignment)
    }

    /// Writable view of space returned by [`stream_alloc`](Self::stream_alloc).
    pub fn stream_data_mut(&mut self, range: StreamRange) -> &mut [u8] {
        self.assert_valid();
        self.driver_api.range_mut(range)
    }

    /// The command stream, for recording driver calls directly.
    pub fn driver_api(&mut self) -> &mut DriverApi {
        self.assert_valid();
        &mut self.driver_api
    }
}

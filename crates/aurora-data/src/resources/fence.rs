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

//! Client-visible synchronization points in the command stream.

use super::{BuildContext, Resource, ResourceBuilder, ResourceError, ResourceType};
use aurora_core::command::DriverApi;
use aurora_core::driver::FenceHandle;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Result of waiting on a fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceStatus {
    /// Every command recorded before the fence has executed.
    ConditionSatisfied,
    /// The timeout elapsed first.
    TimeoutExpired,
    /// The driver stopped before reaching the fence.
    Error,
}

/// Set once by the driver thread, waited on by the client thread.
#[derive(Debug, Default)]
pub struct FenceSignal {
    signaled: Mutex<bool>,
    condition: Condvar,
}

impl FenceSignal {
    /// Marks the fence as reached and wakes up waiters.
    pub fn signal(&self) {
        *self.signaled.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.condition.notify_all();
    }

    /// Returns `true` once [`signal`](Self::signal) was called.
    pub fn is_signaled(&self) -> bool {
        *self.signaled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until the fence is signaled or `timeout` elapses.
    ///
    /// `None` waits forever.
    pub fn wait(&self, timeout: Option<Duration>) -> FenceStatus {
        let signaled = self.signaled.lock().unwrap_or_else(PoisonError::into_inner);
        let signaled = match timeout {
            None => self
                .condition
                .wait_while(signaled, |signaled| !*signaled)
                .unwrap_or_else(PoisonError::into_inner),
            Some(timeout) => {
                self.condition
                    .wait_timeout_while(signaled, timeout, |signaled| !*signaled)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
        };
        if *signaled {
            FenceStatus::ConditionSatisfied
        } else {
            FenceStatus::TimeoutExpired
        }
    }
}

/// Builds a [`Fence`].
#[derive(Debug, Clone, Default)]
pub struct FenceBuilder;

impl ResourceBuilder for FenceBuilder {
    type Output = Fence;

    fn build(self, ctx: &mut BuildContext<'_>) -> Result<Fence, ResourceError> {
        let hw = ctx.driver.create_fence();
        let signal = Arc::new(FenceSignal::default());
        let on_reached = Arc::clone(&signal);
        ctx.driver.queue_callback(move || on_reached.signal());
        Ok(Fence { hw, signal })
    }
}

/// A marker in the command stream the client can wait on.
#[derive(Debug)]
pub struct Fence {
    hw: FenceHandle,
    signal: Arc<FenceSignal>,
}

impl Fence {
    /// Starts building a fence.
    pub fn builder() -> FenceBuilder {
        FenceBuilder
    }

    /// The shared signal, usable after the fence itself is destroyed.
    pub fn signal(&self) -> Arc<FenceSignal> {
        Arc::clone(&self.signal)
    }

    /// Current state, without waiting.
    pub fn status(&self) -> FenceStatus {
        if self.signal.is_signaled() {
            FenceStatus::ConditionSatisfied
        } else {
            FenceStatus::TimeoutExpired
        }
    }
}

impl Resource for Fence {
    const TYPE: ResourceType = ResourceType::Fence;

    fn terminate(&mut self, driver: &mut DriverApi) {
        driver.destroy_fence(self.hw);
    }
}

impl_managed!(Fence, fences);

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_wait_times_out_without_signal() {
        let signal = FenceSignal::default();
        assert_eq!(
            signal.wait(Some(Duration::from_millis(5))),
            FenceStatus::TimeoutExpired
        );
    }

    #[test]
    fn test_wait_returns_once_signaled_from_another_thread() {
        let signal = Arc::new(FenceSignal::default());
        let remote = Arc::clone(&signal);
        let signaler = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            remote.signal();
        });
        assert_eq!(signal.wait(None), FenceStatus::ConditionSatisfied);
        signaler.join().unwrap();
        assert!(signal.is_signaled());
    }
}

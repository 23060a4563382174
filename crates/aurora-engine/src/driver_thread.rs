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

//! The thread that owns the driver and replays command buffers.

use crate::EngineError;
use aurora_core::command::{CallbackTable, CommandBufferQueue, CommandExecutor};
use aurora_core::driver::{Backend, DriverError, Platform, SharedContext};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Lifecycle of the driver thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DriverThreadState {
    /// The thread was launched.
    Created,
    /// The thread is creating the driver.
    AwaitingDriver,
    /// The driver is up and command buffers are replayed as they come.
    Running,
    /// Exit was requested; the remaining buffers are being replayed.
    Draining,
    /// The driver was terminated and the thread is done.
    Terminated,
}

impl DriverThreadState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::AwaitingDriver,
            2 => Self::Running,
            3 => Self::Draining,
            _ => Self::Terminated,
        }
    }
}

#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new() -> Self {
        Self(AtomicU8::new(DriverThreadState::Created as u8))
    }

    fn set(&self, state: DriverThreadState) {
        self.0.store(state as u8, Ordering::Release);
    }

    fn get(&self) -> DriverThreadState {
        DriverThreadState::from_u8(self.0.load(Ordering::Acquire))
    }
}

/// Replays every pending command buffer.
///
/// ## Returns
/// `false` once the queue returned no buffer, which on a threaded queue
/// means exit was requested and everything flushed before has run.
pub(crate) fn execute(queue: &CommandBufferQueue, executor: &mut CommandExecutor) -> bool {
    let buffers = queue.wait_for_commands();
    if buffers.is_empty() {
        return false;
    }
    for buffer in buffers {
        executor.execute(&buffer);
        queue.release_buffer(buffer);
    }
    true
}

/// A running driver thread.
#[derive(Debug)]
pub(crate) struct DriverThread {
    handle: Option<JoinHandle<()>>,
    state: Arc<StateCell>,
    queue: Arc<CommandBufferQueue>,
}

impl DriverThread {
    /// Launches the thread and blocks until the driver is created or failed.
    ///
    /// ## Returns
    /// The thread and the backend of its driver. On failure the thread has
    /// already been joined.
    pub(crate) fn spawn(
        platform: Box<dyn Platform>,
        shared_context: Option<SharedContext>,
        queue: Arc<CommandBufferQueue>,
        callbacks: Arc<CallbackTable>,
    ) -> Result<(Self, Backend), EngineError> {
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);
        let state = Arc::new(StateCell::new());

        let handle = {
            let state = Arc::clone(&state);
            let queue = Arc::clone(&queue);
            thread::Builder::new()
                .name("aurora-driver".to_owned())
                .spawn(move || run(platform, shared_context, queue, callbacks, ready_tx, state))
                .map_err(EngineError::ThreadSpawn)?
        };

        let ready = ready_rx.recv().unwrap_or_else(|_| {
            Err(DriverError::CreationFailed(
                "driver thread exited before reporting readiness".to_owned(),
            ))
        });

        match ready {
            Ok(backend) => Ok((
                Self {
                    handle: Some(handle),
                    state,
                    queue,
                },
                backend,
            )),
            Err(err) => {
                if handle.join().is_err() {
                    log::error!("Driver thread panicked during startup.");
                }
                Err(err.into())
            }
        }
    }

    pub(crate) fn state(&self) -> DriverThreadState {
        self.state.get()
    }

    /// Requests exit and joins. Buffers flushed before are still replayed.
    pub(crate) fn stop(&mut self) {
        self.queue.request_exit();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Driver thread panicked.");
            }
        }
    }
}

/// Stops the queue and publishes `Terminated` however the thread exits,
/// so a panicking driver cannot leave the client blocked on it.
struct ExitGuard {
    queue: Arc<CommandBufferQueue>,
    state: Arc<StateCell>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            log::error!("Driver thread panicked, no further commands will run.");
        }
        self.queue.request_exit();
        self.state.set(DriverThreadState::Terminated);
    }
}

fn run(
    mut platform: Box<dyn Platform>,
    shared_context: Option<SharedContext>,
    queue: Arc<CommandBufferQueue>,
    callbacks: Arc<CallbackTable>,
    ready: Sender<Result<Backend, DriverError>>,
    state: Arc<StateCell>,
) {
    let _guard = ExitGuard {
        queue: Arc::clone(&queue),
        state: Arc::clone(&state),
    };
    state.set(DriverThreadState::AwaitingDriver);
    log::debug!("Driver thread creating a {} driver.", platform.name());

    let driver = match platform.create_driver(shared_context) {
        Ok(driver) => driver,
        Err(err) => {
            log::error!("Failed to create the {} driver: {}", platform.name(), err);
            let _ = ready.send(Err(err));
            return;
        }
    };

    let mut executor = CommandExecutor::new(driver, callbacks);
    state.set(DriverThreadState::Running);
    let _ = ready.send(Ok(executor.backend()));

    while execute(&queue, &mut executor) {
        if queue.is_exit_requested() {
            state.set(DriverThreadState::Draining);
        }
    }

    executor.terminate();
    log::debug!(
        "Driver thread exiting after {} commands.",
        executor.commands_executed()
    );
}

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

//! The asynchronous command pipeline between the client thread and the driver thread.
//!
//! The producing side is the [`CommandStream`]: it serializes driver calls into a
//! [`CircularBuffer`] owned by the client thread. [`CommandStream::flush`] hands the
//! bytes over to the [`CommandBufferQueue`] as one immutable [`CommandBuffer`].
//! The driver thread waits on the queue, replays each buffer through a
//! [`CommandExecutor`] and releases it, which returns its bytes to the free budget
//! of the queue and unblocks a producer waiting on backpressure.
//!
//! A batch is a sequence of records laid out as `[tag: u8][len: u32 LE][payload]`.
//! Command records carry a `bincode` encoded [`DriverCommand`]; inline records
//! carry raw bytes that commands reference through a [`StreamRange`].

mod callback;
mod circular_buffer;
mod commands;
mod executor;
mod queue;
mod stream;

pub use callback::CallbackTable;
pub use circular_buffer::CircularBuffer;
pub use commands::{DriverCommand, StreamRange};
pub use executor::CommandExecutor;
pub use queue::{CommandBuffer, CommandBufferQueue};
pub use stream::{CommandStream, DriverApi};

/// Default size below which the producer blocks until the driver catches up.
pub const DEFAULT_MIN_COMMAND_BUFFER_SIZE: usize = 1024 * 1024;

/// Default total capacity of the command buffer queue.
pub const DEFAULT_COMMAND_BUFFER_SIZE: usize = 3 * DEFAULT_MIN_COMMAND_BUFFER_SIZE;

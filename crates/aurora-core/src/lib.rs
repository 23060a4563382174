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

//! # Aurora Core
//!
//! Foundational crate containing the driver contracts, the command pipeline
//! shared between the client thread and the driver thread, and the fork/join
//! job system used by the engine.

#![warn(missing_docs)]

pub mod command;
pub mod driver;
pub mod ecs;
pub mod jobs;
pub mod math;

pub use command::{CommandBufferQueue, CommandExecutor, CommandStream, DriverApi};
pub use driver::{Backend, Driver, DriverError, Platform, SharedContext};
pub use ecs::Entity;
pub use jobs::{JobSystem, RunFlags};

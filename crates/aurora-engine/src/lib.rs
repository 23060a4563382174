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

//! # Aurora Engine
//!
//! The engine façade. An [`Engine`] owns every resource created through it,
//! serializes driver calls into a bounded command queue and replays them on a
//! dedicated driver thread, or inline when threading is disabled.
//!
//! ```no_run
//! use aurora_engine::{Engine, EngineConfig};
//! use aurora_engine::resources::Texture;
//!
//! let mut engine = Engine::with_config(EngineConfig::default())?;
//! let texture = engine.create(Texture::builder().width(64).height(64))?;
//! engine.destroy(texture)?;
//! engine.flush_and_wait();
//! engine.terminate();
//! # Ok::<(), aurora_engine::EngineError>(())
//! ```

#![warn(missing_docs)]

mod config;
mod driver_thread;
mod engine;
mod error;
mod registry;
mod subsystems;

pub use config::{EngineConfig, ThreadingMode};
pub use driver_thread::DriverThreadState;
pub use engine::{Engine, EngineBuilder, FenceMode};
pub use error::EngineError;
pub use registry::{EngineId, EngineRecord, EngineRegistry};
pub use subsystems::{Dfg, PostProcessManager};

pub use aurora_core::command::StreamRange;
pub use aurora_core::driver::{
    Backend, IndexType, PrimitiveType, SamplerType, SharedContext, TextureFormat,
};
pub use aurora_core::math::Mat4;
pub use aurora_core::Entity;
pub use aurora_data::ecs;
pub use aurora_data::resources;
pub use aurora_data::resources::{FenceStatus, Handle};

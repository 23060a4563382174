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

use aurora_core::driver::DriverError;
use aurora_core::jobs::JobSystemError;
use aurora_data::ResourceError;

/// Errors reported by the engine façade.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The driver could not be brought up.
    #[error("driver initialization failed: {0}")]
    DriverInitialization(#[from] DriverError),
    /// The configuration is inconsistent.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
    /// The configuration could not be parsed.
    #[error("failed to parse engine configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
    /// The job system could not be started.
    #[error(transparent)]
    JobSystem(#[from] JobSystemError),
    /// A resource could not be created, updated or destroyed.
    #[error(transparent)]
    Resource(#[from] ResourceError),
    /// The driver thread could not be spawned.
    #[error("failed to spawn the driver thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),
}

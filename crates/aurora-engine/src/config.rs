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

//! Engine configuration.

use crate::EngineError;
use aurora_core::command::{DEFAULT_COMMAND_BUFFER_SIZE, DEFAULT_MIN_COMMAND_BUFFER_SIZE};
use aurora_core::driver::Backend;
use serde::{Deserialize, Serialize};

/// Where driver commands are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadingMode {
    /// On a dedicated driver thread.
    #[default]
    Threaded,
    /// On the client thread, when [`crate::Engine::execute`] is called.
    SingleThreaded,
}

/// Settings fixed at engine creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Requested backend. `Default` lets the platform choose.
    pub backend: Backend,
    /// Whether a driver thread is started.
    pub threading: ThreadingMode,
    /// Largest batch between two flushes, in bytes.
    ///
    /// The client blocks on flush until at least this much space is free.
    pub min_command_buffer_size: usize,
    /// Total bytes the command queue may hold in flight.
    pub command_buffer_size: usize,
    /// Number of job workers, or one per core when `None`.
    pub job_threads: Option<usize>,
    /// Largest [`crate::Engine::stream_alloc`] request, in bytes.
    pub stream_alloc_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Default,
            threading: ThreadingMode::Threaded,
            min_command_buffer_size: DEFAULT_MIN_COMMAND_BUFFER_SIZE,
            command_buffer_size: DEFAULT_COMMAND_BUFFER_SIZE,
            job_threads: None,
            stream_alloc_limit: 1024,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the settings are consistent with each other.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.min_command_buffer_size == 0 {
            return Err(EngineError::InvalidConfig(
                "min_command_buffer_size must not be zero".to_owned(),
            ));
        }
        if self.command_buffer_size < self.min_command_buffer_size {
            return Err(EngineError::InvalidConfig(format!(
                "command_buffer_size ({}) is smaller than min_command_buffer_size ({})",
                self.command_buffer_size, self.min_command_buffer_size
            )));
        }
        if self.job_threads == Some(0) {
            return Err(EngineError::InvalidConfig(
                "job_threads must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

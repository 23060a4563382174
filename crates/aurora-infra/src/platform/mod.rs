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

//! Platform selection.

pub mod noop;

pub use noop::{DriverStats, NoopDriver, NoopPlatform};

use aurora_core::driver::{Backend, DriverError, Platform};

/// Picks the platform for `backend`.
///
/// `Backend::Default` is resolved in place to the backend actually chosen, so
/// the caller can report it.
///
/// ## Errors
/// [`DriverError::UnsupportedBackend`] if no driver for `backend` is built in.
pub fn default_platform(backend: &mut Backend) -> Result<Box<dyn Platform>, DriverError> {
    if *backend == Backend::Default {
        *backend = Backend::Noop;
    }
    match *backend {
        Backend::Noop => Ok(Box::new(NoopPlatform::new())),
        other => {
            log::error!("no platform available for backend {}", other);
            Err(DriverError::UnsupportedBackend(other))
        }
    }
}

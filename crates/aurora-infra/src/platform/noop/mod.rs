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

//! A driver that renders nothing but checks everything it is told.
//!
//! Every object created is tracked until destroyed, so tests can assert that
//! an engine shut down without leaking driver-side objects.

mod driver;
mod stats;

pub use driver::NoopDriver;
pub use stats::DriverStats;

use aurora_core::driver::{Driver, DriverError, Platform, SharedContext};
use std::sync::Arc;

/// Produces [`NoopDriver`]s sharing one [`DriverStats`].
#[derive(Debug, Default)]
pub struct NoopPlatform {
    stats: Arc<DriverStats>,
}

impl NoopPlatform {
    /// Creates a platform with fresh statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a platform reporting into `stats`.
    pub fn with_stats(stats: Arc<DriverStats>) -> Self {
        Self { stats }
    }

    /// The statistics of the drivers this platform creates.
    pub fn stats(&self) -> Arc<DriverStats> {
        Arc::clone(&self.stats)
    }
}

impl Platform for NoopPlatform {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn create_driver(
        &mut self,
        shared_context: Option<SharedContext>,
    ) -> Result<Box<dyn Driver>, DriverError> {
        if let Some(context) = shared_context {
            log::debug!("noop driver ignores shared context {:#x}", context.0);
        }
        Ok(Box::new(NoopDriver::new(Arc::clone(&self.stats))))
    }
}

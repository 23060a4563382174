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

//! Helpers shared by the engine integration tests.

#![allow(dead_code)]

use aurora_core::driver::{Driver, DriverError, Platform, SharedContext};
use aurora_engine::{Backend, Engine, EngineConfig, EngineRegistry, ThreadingMode};
use aurora_infra::{DriverStats, NoopPlatform};
use std::sync::Arc;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn test_config(threading: ThreadingMode) -> EngineConfig {
    EngineConfig {
        backend: Backend::Noop,
        threading,
        job_threads: Some(2),
        ..Default::default()
    }
}

/// An engine on a noop driver, registered in its own registry.
pub fn noop_engine(threading: ThreadingMode) -> (Engine, Arc<DriverStats>, Arc<EngineRegistry>) {
    init_logger();
    let stats = Arc::new(DriverStats::default());
    let registry = Arc::new(EngineRegistry::new());
    let engine = Engine::builder()
        .config(test_config(threading))
        .platform(NoopPlatform::with_stats(Arc::clone(&stats)))
        .registry(Arc::clone(&registry))
        .build()
        .expect("noop engine should start");
    (engine, stats, registry)
}

/// A platform whose driver can never be created.
pub struct FailingPlatform;

impl Platform for FailingPlatform {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn create_driver(
        &mut self,
        _shared_context: Option<SharedContext>,
    ) -> Result<Box<dyn Driver>, DriverError> {
        Err(DriverError::CreationFailed("no device".to_owned()))
    }
}

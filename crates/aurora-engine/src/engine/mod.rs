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

//! The engine façade and its lifecycle.

mod builtins;
mod commands;
mod components;
mod resources;
mod shutdown;

use self::builtins::BuiltIns;
use crate::driver_thread::{self, DriverThread, DriverThreadState};
use crate::registry::{EngineId, EngineRecord, EngineRegistry};
use crate::subsystems::{Dfg, PostProcessManager};
use crate::{EngineConfig, EngineError, ThreadingMode};
use aurora_core::command::{CallbackTable, CommandBufferQueue, CommandExecutor, DriverApi};
use aurora_core::driver::{Backend, Platform, SharedContext};
use aurora_core::jobs::JobSystem;
use aurora_data::ecs::{CameraManager, EntityManager, LightManager, RenderableManager, TransformManager};
use aurora_data::{HeapAllocator, ResourceLists};
use std::sync::Arc;
use std::time::Instant;

/// Whether waiting on a fence first flushes the pending commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FenceMode {
    /// Flush, so the fence is guaranteed to be reached eventually.
    #[default]
    Flush,
    /// Wait without flushing.
    DontFlush,
}

/// Where command buffers are replayed.
#[derive(Debug)]
enum ExecutionContext {
    Threaded(DriverThread),
    /// `None` once the driver was terminated.
    Inline(Option<CommandExecutor>),
}

/// Configures and creates an [`Engine`].
pub struct EngineBuilder {
    config: EngineConfig,
    platform: Option<Box<dyn Platform>>,
    shared_context: Option<SharedContext>,
    registry: Option<Arc<EngineRegistry>>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("config", &self.config)
            .field("platform", &self.platform.as_ref().map(|p| p.name()))
            .field("shared_context", &self.shared_context)
            .finish()
    }
}

impl EngineBuilder {
    /// Starts from the default configuration.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            platform: None,
            shared_context: None,
            registry: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Requests a backend.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Chooses where commands run.
    pub fn threading(mut self, threading: ThreadingMode) -> Self {
        self.config.threading = threading;
        self
    }

    /// Uses `platform` instead of the one matching the backend.
    pub fn platform(mut self, platform: impl Platform + 'static) -> Self {
        self.platform = Some(Box::new(platform));
        self
    }

    /// A native context the driver shares resources with.
    pub fn shared_context(mut self, context: SharedContext) -> Self {
        self.shared_context = Some(context);
        self
    }

    /// Registers the engine in `registry` instead of the process-wide one.
    pub fn registry(mut self, registry: Arc<EngineRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Starts the driver and creates the engine.
    ///
    /// Blocks until the driver is created. The engine is registered only
    /// once it is fully initialized.
    ///
    /// ## Errors
    /// Fails if the configuration is invalid, no platform supports the
    /// backend, or the driver cannot be created.
    pub fn build(self) -> Result<Engine, EngineError> {
        let config = self.config;
        config.validate()?;

        let mut backend = config.backend;
        let platform = match self.platform {
            Some(platform) => platform,
            None => aurora_infra::default_platform(&mut backend)?,
        };
        let registry = self.registry.unwrap_or_else(EngineRegistry::global);
        let jobs = JobSystem::new(config.job_threads)?;
        let callbacks = Arc::new(CallbackTable::new());

        let (queue, context, backend) = match config.threading {
            ThreadingMode::Threaded => {
                let queue = Arc::new(CommandBufferQueue::new(
                    config.min_command_buffer_size,
                    config.command_buffer_size,
                ));
                let (thread, backend) = DriverThread::spawn(
                    platform,
                    self.shared_context,
                    Arc::clone(&queue),
                    Arc::clone(&callbacks),
                )?;
                (queue, ExecutionContext::Threaded(thread), backend)
            }
            ThreadingMode::SingleThreaded => {
                let mut platform = platform;
                let driver = platform.create_driver(self.shared_context).inspect_err(|err| {
                    log::error!("Failed to create the {} driver: {}", platform.name(), err);
                })?;
                let executor = CommandExecutor::new(driver, Arc::clone(&callbacks));
                let backend = executor.backend();
                let queue = Arc::new(CommandBufferQueue::single_threaded(
                    config.min_command_buffer_size,
                    config.command_buffer_size,
                ));
                (queue, ExecutionContext::Inline(Some(executor)), backend)
            }
        };

        jobs.adopt();
        let mut engine = Engine {
            id: registry.next_id(),
            registry,
            threading: config.threading,
            config,
            backend,
            driver_api: DriverApi::new(queue, callbacks),
            context,
            jobs,
            heap: HeapAllocator::new(),
            lists: ResourceLists::new(),
            entities: EntityManager::new(),
            renderables: RenderableManager::new(),
            lights: LightManager::new(),
            transforms: TransformManager::new(),
            cameras: CameraManager::new(),
            post_process: PostProcessManager::default(),
            dfg: Dfg::default(),
            builtins: None,
            epoch: Instant::now(),
            terminated: false,
        };
        // Dropping a half-initialized engine shuts its driver down.
        engine.init()?;

        engine.registry.register(
            engine.id,
            EngineRecord {
                backend,
                threading: engine.threading,
                registered_at: Instant::now(),
            },
        );
        log::info!(
            "{} created: {} backend, {:?} threading.",
            engine.id,
            backend,
            engine.threading
        );
        Ok(engine)
    }
}

/// Owns every engine resource and the pipeline to the driver.
///
/// Resources are created with [`Engine::create`] and must be released with
/// [`Engine::destroy`]; whatever is still alive when the engine terminates is
/// reclaimed then. All methods except the ones consuming the engine must be
/// called from the thread that owns it.
pub struct Engine {
    id: EngineId,
    registry: Arc<EngineRegistry>,
    config: EngineConfig,
    backend: Backend,
    threading: ThreadingMode,
    driver_api: DriverApi,
    context: ExecutionContext,
    jobs: JobSystem,
    heap: HeapAllocator,
    lists: ResourceLists,
    entities: EntityManager,
    renderables: RenderableManager,
    lights: LightManager,
    transforms: TransformManager,
    cameras: CameraManager,
    post_process: PostProcessManager,
    dfg: Dfg,
    builtins: Option<BuiltIns>,
    epoch: Instant,
    terminated: bool,
}

impl Engine {
    /// Creates an engine with the default platform for `config.backend`.
    pub fn with_config(config: EngineConfig) -> Result<Engine, EngineError> {
        EngineBuilder::new().config(config).build()
    }

    /// Starts configuring an engine.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    fn init(&mut self) -> Result<(), EngineError> {
        self.post_process.init(&mut self.driver_api);
        self.dfg.init(&mut self.driver_api);
        self.builtins = Some(BuiltIns::create(
            &mut self.driver_api,
            &mut self.lists,
            &self.heap,
        )?);
        self.driver_api.flush();
        Ok(())
    }

    /// Unregisters the engine and shuts it down.
    ///
    /// Every resource still alive is destroyed, the pending commands are
    /// executed and the driver thread is joined before this returns.
    ///
    /// # Panics
    ///
    /// Panics if the engine was already unregistered from its registry.
    pub fn terminate(mut self) {
        if self.registry.unregister(self.id).is_none() {
            log::error!("{} terminated twice.", self.id);
            panic!("Using an Engine instance after it's been destroyed ({})", self.id);
        }
        self.shutdown();
    }

    fn assert_valid(&self) {
        self.registry.assert_valid(self.id);
    }

    /// Identifier of the engine in its registry.
    pub fn id(&self) -> EngineId {
        self.id
    }

    /// The backend of the driver.
    pub fn backend(&self) -> Backend {
        self.assert_valid();
        self.backend
    }

    /// Where commands are replayed.
    pub fn threading(&self) -> ThreadingMode {
        self.assert_valid();
        self.threading
    }

    /// The configuration the engine was created with.
    pub fn config(&self) -> &EngineConfig {
        self.assert_valid();
        &self.config
    }

    /// When the engine was created.
    pub fn epoch(&self) -> Instant {
        self.assert_valid();
        self.epoch
    }

    /// Time elapsed since creation.
    pub fn uptime(&self) -> std::time::Duration {
        self.assert_valid();
        self.epoch.elapsed()
    }

    /// The job system used for parallel work.
    pub fn job_system(&self) -> &JobSystem {
        self.assert_valid();
        &self.jobs
    }

    /// State of the driver thread. Inline execution reports `Running` until
    /// the engine terminates.
    pub fn driver_state(&self) -> DriverThreadState {
        self.assert_valid();
        match &self.context {
            ExecutionContext::Threaded(thread) => thread.state(),
            ExecutionContext::Inline(Some(_)) => DriverThreadState::Running,
            ExecutionContext::Inline(None) => DriverThreadState::Terminated,
        }
    }

    /// Statistics of the engine allocator.
    pub fn heap_stats(&self) -> aurora_data::HeapStats {
        self.assert_valid();
        self.heap.stats()
    }

    /// Largest number of command bytes ever in flight.
    pub fn queue_high_watermark(&self) -> usize {
        self.assert_valid();
        self.driver_api.queue().high_watermark()
    }

    /// The post-processing subsystem.
    pub fn post_process(&self) -> &PostProcessManager {
        self.assert_valid();
        &self.post_process
    }

    /// The DFG lookup table.
    pub fn dfg(&self) -> &Dfg {
        self.assert_valid();
        &self.dfg
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.terminated {
            return;
        }
        // A failed init never registered the engine and shuts down quietly.
        let leaked = self.registry.unregister(self.id).is_some();
        if leaked {
            log::error!("{} dropped without terminate(), shutting down.", self.id);
        }
        self.shutdown();
        if leaked && cfg!(debug_assertions) && !std::thread::panicking() {
            panic!("{} dropped without terminate()", self.id);
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("id", &self.id)
            .field("backend", &self.backend)
            .field("threading", &self.threading)
            .field("resources", &self.lists.total_len())
            .field("entities", &self.entities.len())
            .field("terminated", &self.terminated)
            .finish()
    }
}

fn execute_inline(context: &mut ExecutionContext, queue: &CommandBufferQueue) {
    if let ExecutionContext::Inline(Some(executor)) = context {
        while driver_thread::execute(queue, executor) {}
    }
}

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

mod common;

use aurora_core::driver::{
    Backend, BufferHandle, BufferUsage, Driver, DriverError, FenceHandle, Platform, ProgramHandle,
    RenderPrimitiveHandle, RenderPrimitiveInfo, RenderTargetHandle, RenderTargetInfo,
    SharedContext, StreamHandle, SwapChainHandle, TextureHandle, TextureInfo,
};
use aurora_engine::{
    DriverThreadState, Engine, EngineRegistry, FenceMode, FenceStatus, ThreadingMode,
};
use common::test_config;
use std::sync::{Arc, Mutex};

/// First byte of an upload that makes the recording driver panic.
const DEVICE_LOST: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Created(BufferHandle),
    Updated(BufferHandle, u8),
    Destroyed(BufferHandle),
    Terminated,
}

/// Records buffer traffic in execution order, ignores everything else.
struct RecordingDriver {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingDriver {
    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Driver for RecordingDriver {
    fn backend(&self) -> Backend {
        Backend::Noop
    }

    fn create_buffer(&mut self, handle: BufferHandle, _usage: BufferUsage, _size: u32) {
        self.push(Event::Created(handle));
    }
    fn update_buffer(&mut self, handle: BufferHandle, _offset: u32, data: &[u8]) {
        if data.first() == Some(&DEVICE_LOST) {
            panic!("device lost while updating {:?}", handle);
        }
        self.push(Event::Updated(handle, data.first().copied().unwrap_or_default()));
    }
    fn destroy_buffer(&mut self, handle: BufferHandle) {
        self.push(Event::Destroyed(handle));
    }

    fn create_texture(&mut self, _handle: TextureHandle, _info: &TextureInfo) {}
    fn update_texture(&mut self, _handle: TextureHandle, _level: u8, _data: &[u8]) {}
    fn destroy_texture(&mut self, _handle: TextureHandle) {}
    fn create_program(&mut self, _handle: ProgramHandle, _name: &str) {}
    fn destroy_program(&mut self, _handle: ProgramHandle) {}
    fn create_render_primitive(&mut self, _handle: RenderPrimitiveHandle, _info: &RenderPrimitiveInfo) {}
    fn destroy_render_primitive(&mut self, _handle: RenderPrimitiveHandle) {}
    fn create_render_target(&mut self, _handle: RenderTargetHandle, _info: &RenderTargetInfo) {}
    fn destroy_render_target(&mut self, _handle: RenderTargetHandle) {}
    fn create_swap_chain(&mut self, _handle: SwapChainHandle, _native_window: u64, _flags: u64) {}
    fn destroy_swap_chain(&mut self, _handle: SwapChainHandle) {}
    fn create_stream(&mut self, _handle: StreamHandle, _width: u32, _height: u32) {}
    fn destroy_stream(&mut self, _handle: StreamHandle) {}
    fn create_fence(&mut self, _handle: FenceHandle) {}
    fn destroy_fence(&mut self, _handle: FenceHandle) {}
    fn purge(&mut self) {}

    fn terminate(&mut self) {
        self.push(Event::Terminated);
    }
}

struct RecordingPlatform {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Platform for RecordingPlatform {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn create_driver(
        &mut self,
        _shared_context: Option<SharedContext>,
    ) -> Result<Box<dyn Driver>, DriverError> {
        Ok(Box::new(RecordingDriver {
            events: Arc::clone(&self.events),
        }))
    }
}

fn recording_engine(threading: ThreadingMode) -> (Engine, Arc<Mutex<Vec<Event>>>) {
    common::init_logger();
    let events = Arc::new(Mutex::new(Vec::new()));
    let engine = Engine::builder()
        .config(test_config(threading))
        .platform(RecordingPlatform {
            events: Arc::clone(&events),
        })
        .registry(Arc::new(EngineRegistry::new()))
        .build()
        .unwrap();
    (engine, events)
}

fn created(events: &[Event]) -> Vec<BufferHandle> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Created(handle) => Some(*handle),
            _ => None,
        })
        .collect()
}

#[test]
fn test_commands_execute_in_recording_order_across_flushes() {
    for threading in [ThreadingMode::Threaded, ThreadingMode::SingleThreaded] {
        // --- 1. ARRANGE ---
        let (mut engine, events) = recording_engine(threading);

        // --- 2. ACT ---
        let mut recorded = Vec::with_capacity(200);
        for i in 0..200 {
            recorded.push(engine.driver_api().create_buffer(BufferUsage::Vertex, 64));
            if i % 10 == 9 {
                engine.flush();
            }
        }
        engine.flush_and_wait();

        // --- 3. ASSERT ---
        let executed = created(&events.lock().unwrap());
        assert!(
            executed.windows(2).all(|pair| pair[0] < pair[1]),
            "{:?}: handles must be created in increasing order",
            threading
        );
        assert_eq!(&executed[executed.len() - 200..], recorded.as_slice());
        engine.terminate();
    }
}

#[test]
fn test_update_follows_create_and_precedes_destroy() {
    let (mut engine, events) = recording_engine(ThreadingMode::Threaded);

    let driver = engine.driver_api();
    let buffer = driver.create_buffer(BufferUsage::Uniform, 4);
    driver.update_buffer(buffer, 0, &[7, 0, 0, 0]);
    driver.destroy_buffer(buffer);
    engine.flush_and_wait();

    let events = events.lock().unwrap().clone();
    let ours: Vec<Event> = events
        .into_iter()
        .filter(|event| match event {
            Event::Created(h) | Event::Updated(h, _) | Event::Destroyed(h) => *h == buffer,
            Event::Terminated => false,
        })
        .collect();
    assert_eq!(
        ours,
        vec![
            Event::Created(buffer),
            Event::Updated(buffer, 7),
            Event::Destroyed(buffer),
        ]
    );
    engine.terminate();
}

#[test]
fn test_driver_terminates_after_the_last_command() {
    let (mut engine, events) = recording_engine(ThreadingMode::Threaded);
    let buffer = engine.driver_api().create_buffer(BufferUsage::Index, 12);
    engine.driver_api().destroy_buffer(buffer);

    engine.terminate();

    let events = events.lock().unwrap();
    assert_eq!(events.last(), Some(&Event::Terminated));
    assert_eq!(
        events.iter().filter(|e| **e == Event::Terminated).count(),
        1
    );
    assert!(events.contains(&Event::Destroyed(buffer)));
}

#[test]
fn test_driver_panic_does_not_hang_the_client() {
    // --- 1. ARRANGE ---
    let (mut engine, events) = recording_engine(ThreadingMode::Threaded);
    let driver = engine.driver_api();
    let buffer = driver.create_buffer(BufferUsage::Uniform, 4);
    driver.update_buffer(buffer, 0, &[DEVICE_LOST, 0, 0, 0]);

    // --- 2. ACT ---
    engine.flush_and_wait();
    let fence = engine.create_fence().unwrap();
    let status = engine.wait_fence(fence, FenceMode::Flush, None).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(engine.driver_state(), DriverThreadState::Terminated);
    assert_eq!(status, FenceStatus::Error);
    engine.terminate();
    let events = events.lock().unwrap();
    assert!(events.contains(&Event::Created(buffer)));
    assert!(!events.contains(&Event::Terminated), "the driver never shut down cleanly");
}

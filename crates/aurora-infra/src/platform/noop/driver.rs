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

use super::DriverStats;
use aurora_core::driver::{
    Backend, BufferHandle, BufferUsage, Driver, FenceHandle, ProgramHandle, RenderPrimitiveHandle,
    RenderPrimitiveInfo, RenderTargetHandle, RenderTargetInfo, StreamHandle, SwapChainHandle,
    TextureHandle, TextureInfo,
};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// The set of live objects of one kind, mirrored into a counter.
#[derive(Debug)]
struct Live<H> {
    kind: &'static str,
    handles: HashSet<H>,
}

impl<H: Copy + Eq + Hash + Display> Live<H> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            handles: HashSet::new(),
        }
    }

    fn create(&mut self, handle: H, counter: &AtomicUsize, stats: &DriverStats) {
        if self.handles.insert(handle) {
            counter.fetch_add(1, Ordering::AcqRel);
        } else {
            log::warn!("noop driver: {} {} created twice", self.kind, handle);
            stats.invalid_uses.fetch_add(1, Ordering::AcqRel);
        }
    }

    fn check(&self, handle: H, stats: &DriverStats) -> bool {
        let known = self.handles.contains(&handle);
        if !known {
            log::warn!("noop driver: unknown {} {}", self.kind, handle);
            stats.invalid_uses.fetch_add(1, Ordering::AcqRel);
        }
        known
    }

    fn destroy(&mut self, handle: H, counter: &AtomicUsize, stats: &DriverStats) {
        if self.check(handle, stats) {
            self.handles.remove(&handle);
            counter.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// A driver that executes nothing on a GPU.
///
/// It validates every handle it receives against the objects it created and
/// reports through [`DriverStats`].
#[derive(Debug)]
pub struct NoopDriver {
    stats: Arc<DriverStats>,
    buffers: Live<BufferHandle>,
    buffer_sizes: HashMap<BufferHandle, u32>,
    textures: Live<TextureHandle>,
    programs: Live<ProgramHandle>,
    render_primitives: Live<RenderPrimitiveHandle>,
    render_targets: Live<RenderTargetHandle>,
    swap_chains: Live<SwapChainHandle>,
    streams: Live<StreamHandle>,
    fences: Live<FenceHandle>,
}

impl NoopDriver {
    /// Creates a driver reporting into `stats`.
    pub fn new(stats: Arc<DriverStats>) -> Self {
        Self {
            stats,
            buffers: Live::new("buffer"),
            buffer_sizes: HashMap::new(),
            textures: Live::new("texture"),
            programs: Live::new("program"),
            render_primitives: Live::new("render primitive"),
            render_targets: Live::new("render target"),
            swap_chains: Live::new("swap chain"),
            streams: Live::new("stream"),
            fences: Live::new("fence"),
        }
    }

    fn count(&self) {
        self.stats.commands.fetch_add(1, Ordering::AcqRel);
    }
}

impl Driver for NoopDriver {
    fn backend(&self) -> Backend {
        Backend::Noop
    }

    fn create_buffer(&mut self, handle: BufferHandle, _usage: BufferUsage, size: u32) {
        self.count();
        self.buffers.create(handle, &self.stats.buffers, &self.stats);
        self.buffer_sizes.insert(handle, size);
    }

    fn update_buffer(&mut self, handle: BufferHandle, offset: u32, data: &[u8]) {
        self.count();
        if !self.buffers.check(handle, &self.stats) {
            return;
        }
        let size = self.buffer_sizes.get(&handle).copied().unwrap_or(0) as usize;
        if offset as usize + data.len() > size {
            log::warn!(
                "noop driver: {} bytes at {} overflow {} of {} bytes",
                data.len(),
                offset,
                handle,
                size
            );
            self.stats.invalid_uses.fetch_add(1, Ordering::AcqRel);
        }
    }

    fn destroy_buffer(&mut self, handle: BufferHandle) {
        self.count();
        self.buffers.destroy(handle, &self.stats.buffers, &self.stats);
        self.buffer_sizes.remove(&handle);
    }

    fn create_texture(&mut self, handle: TextureHandle, _info: &TextureInfo) {
        self.count();
        self.textures.create(handle, &self.stats.textures, &self.stats);
    }

    fn update_texture(&mut self, handle: TextureHandle, _level: u8, _data: &[u8]) {
        self.count();
        self.textures.check(handle, &self.stats);
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        self.count();
        self.textures.destroy(handle, &self.stats.textures, &self.stats);
    }

    fn create_program(&mut self, handle: ProgramHandle, name: &str) {
        self.count();
        log::trace!("noop driver: program {} ({})", handle, name);
        self.programs.create(handle, &self.stats.programs, &self.stats);
    }

    fn destroy_program(&mut self, handle: ProgramHandle) {
        self.count();
        self.programs.destroy(handle, &self.stats.programs, &self.stats);
    }

    fn create_render_primitive(&mut self, handle: RenderPrimitiveHandle, info: &RenderPrimitiveInfo) {
        self.count();
        for buffer in info.vertex_buffers.iter().chain([&info.index_buffer]) {
            self.buffers.check(*buffer, &self.stats);
        }
        self.render_primitives
            .create(handle, &self.stats.render_primitives, &self.stats);
    }

    fn destroy_render_primitive(&mut self, handle: RenderPrimitiveHandle) {
        self.count();
        self.render_primitives
            .destroy(handle, &self.stats.render_primitives, &self.stats);
    }

    fn create_render_target(&mut self, handle: RenderTargetHandle, info: &RenderTargetInfo) {
        self.count();
        for texture in info.color.iter().chain(info.depth.iter()) {
            self.textures.check(*texture, &self.stats);
        }
        self.render_targets
            .create(handle, &self.stats.render_targets, &self.stats);
    }

    fn destroy_render_target(&mut self, handle: RenderTargetHandle) {
        self.count();
        self.render_targets
            .destroy(handle, &self.stats.render_targets, &self.stats);
    }

    fn create_swap_chain(&mut self, handle: SwapChainHandle, _native_window: u64, _flags: u64) {
        self.count();
        self.swap_chains
            .create(handle, &self.stats.swap_chains, &self.stats);
    }

    fn destroy_swap_chain(&mut self, handle: SwapChainHandle) {
        self.count();
        self.swap_chains
            .destroy(handle, &self.stats.swap_chains, &self.stats);
    }

    fn create_stream(&mut self, handle: StreamHandle, _width: u32, _height: u32) {
        self.count();
        self.streams.create(handle, &self.stats.streams, &self.stats);
    }

    fn destroy_stream(&mut self, handle: StreamHandle) {
        self.count();
        self.streams.destroy(handle, &self.stats.streams, &self.stats);
    }

    fn create_fence(&mut self, handle: FenceHandle) {
        self.count();
        self.fences.create(handle, &self.stats.fences, &self.stats);
    }

    fn destroy_fence(&mut self, handle: FenceHandle) {
        self.count();
        self.fences.destroy(handle, &self.stats.fences, &self.stats);
    }

    fn purge(&mut self) {
        self.count();
        self.stats.purges.fetch_add(1, Ordering::AcqRel);
    }

    fn terminate(&mut self) {
        let leaked = self.stats.live_objects();
        if leaked > 0 {
            log::warn!("noop driver terminated with {} live objects", leaked);
        }
        self.stats.terminated.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_live_objects_and_invalid_uses() {
        let stats = Arc::new(DriverStats::default());
        let mut driver = NoopDriver::new(Arc::clone(&stats));

        driver.create_buffer(BufferHandle(1), BufferUsage::Vertex, 16);
        driver.update_buffer(BufferHandle(1), 8, &[0; 8]);
        assert_eq!(stats.live_buffers(), 1);
        assert_eq!(stats.invalid_uses(), 0);

        driver.update_buffer(BufferHandle(1), 12, &[0; 8]);
        driver.destroy_buffer(BufferHandle(1));
        driver.destroy_buffer(BufferHandle(1));
        assert_eq!(stats.live_buffers(), 0);
        assert_eq!(stats.invalid_uses(), 2);

        driver.terminate();
        assert!(stats.is_terminated());
        assert_eq!(stats.commands(), 5);
    }
}

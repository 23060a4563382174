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

//! The producing half of the command pipeline.

use super::callback::CallbackTable;
use super::circular_buffer::CircularBuffer;
use super::commands::{DriverCommand, StreamRange, RECORD_HEADER_SIZE, TAG_COMMAND, TAG_INLINE};
use super::queue::CommandBufferQueue;
use crate::driver::{
    BufferHandle, BufferUsage, FenceHandle, ProgramHandle, RenderPrimitiveHandle,
    RenderPrimitiveInfo, RenderTargetHandle, RenderTargetInfo, StreamHandle, SwapChainHandle,
    TextureHandle, TextureInfo,
};
use std::sync::Arc;

/// The API the engine uses to talk to the driver.
pub type DriverApi = CommandStream;

/// Serializes driver calls into the current batch.
///
/// Hardware handles are allocated here, on the client thread, so a resource
/// can refer to its driver-side object before the driver has even seen the
/// creation command.
#[derive(Debug)]
pub struct CommandStream {
    queue: Arc<CommandBufferQueue>,
    buffer: CircularBuffer,
    callbacks: Arc<CallbackTable>,
    next_handle: u32,
}

impl CommandStream {
    /// Creates a stream producing into `queue`.
    pub fn new(queue: Arc<CommandBufferQueue>, callbacks: Arc<CallbackTable>) -> Self {
        let buffer = queue.circular_buffer();
        Self {
            queue,
            buffer,
            callbacks,
            next_handle: 1,
        }
    }

    /// The queue this stream flushes into.
    pub fn queue(&self) -> &Arc<CommandBufferQueue> {
        &self.queue
    }

    /// The callback table shared with the executor.
    pub fn callbacks(&self) -> &Arc<CallbackTable> {
        &self.callbacks
    }

    /// Bytes recorded since the last flush.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Publishes the current batch to the driver thread.
    ///
    /// A non-empty batch is terminated by a purge so the driver can free the
    /// objects destroyed in it. Blocks on backpressure.
    pub fn flush(&mut self) {
        if !self.buffer.is_empty() {
            self.record(&DriverCommand::Purge);
        }
        self.queue.flush(&mut self.buffer);
    }

    /// Reserves `size` bytes of scratch space inside the current batch.
    ///
    /// The range is aligned to `alignment` relative to the start of the batch
    /// and stays valid until the next flush. Returns `None` if `alignment` is
    /// not a power of two or the batch has no room left.
    pub fn allocate(&mut self, size: usize, alignment: usize) -> Option<StreamRange> {
        if !alignment.is_power_of_two() {
            return None;
        }
        let header_end = self.buffer.len() + RECORD_HEADER_SIZE;
        let padding = header_end.next_multiple_of(alignment) - header_end;
        let total = padding + size;
        if total > u32::MAX as usize || RECORD_HEADER_SIZE + total > self.buffer.remaining() {
            return None;
        }

        let record = self.buffer.allocate(RECORD_HEADER_SIZE + total);
        record[0] = TAG_INLINE;
        record[1..RECORD_HEADER_SIZE].copy_from_slice(&(total as u32).to_le_bytes());
        Some(StreamRange {
            offset: (header_end + padding) as u32,
            len: size as u32,
        })
    }

    /// Mutable access to scratch space returned by [`allocate`](Self::allocate).
    ///
    /// # Panics
    ///
    /// Panics if `range` does not lie inside the current batch.
    pub fn range_mut(&mut self, range: StreamRange) -> &mut [u8] {
        &mut self.buffer.as_bytes_mut()[range.bounds()]
    }

    fn write_inline(&mut self, data: &[u8]) -> StreamRange {
        let size = data.len();
        let range = match self.allocate(size, 1) {
            Some(range) => range,
            None => {
                log::error!(
                    "Cannot inline {} bytes: only {} bytes left in the command batch.",
                    size,
                    self.buffer.remaining()
                );
                panic!("command buffer exhausted ({} bytes of inline data)", size);
            }
        };
        self.range_mut(range).copy_from_slice(data);
        range
    }

    fn record(&mut self, command: &DriverCommand) {
        let payload = match bincode::serde::encode_to_vec(command, bincode::config::standard()) {
            Ok(payload) => payload,
            Err(err) => {
                log::error!("Failed to encode driver command {:?}: {}", command, err);
                panic!("failed to encode driver command: {}", err);
            }
        };
        let record = self.buffer.allocate(RECORD_HEADER_SIZE + payload.len());
        record[0] = TAG_COMMAND;
        record[1..RECORD_HEADER_SIZE].copy_from_slice(&(payload.len() as u32).to_le_bytes());
        record[RECORD_HEADER_SIZE..].copy_from_slice(&payload);
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    /// Records the creation of a GPU buffer.
    pub fn create_buffer(&mut self, usage: BufferUsage, size: u32) -> BufferHandle {
        let handle = BufferHandle(self.next_id());
        self.record(&DriverCommand::CreateBuffer {
            handle,
            usage,
            size,
        });
        handle
    }

    /// Copies `data` into the batch and records an upload at `offset`.
    pub fn update_buffer(&mut self, handle: BufferHandle, offset: u32, data: &[u8]) {
        let range = self.write_inline(data);
        self.update_buffer_range(handle, offset, range);
    }

    /// Records an upload of bytes already placed in the batch with [`allocate`](Self::allocate).
    pub fn update_buffer_range(&mut self, handle: BufferHandle, offset: u32, data: StreamRange) {
        self.record(&DriverCommand::UpdateBuffer {
            handle,
            offset,
            data,
        });
    }

    /// Records the destruction of a GPU buffer.
    pub fn destroy_buffer(&mut self, handle: BufferHandle) {
        self.record(&DriverCommand::DestroyBuffer { handle });
    }

    /// Records the creation of a texture.
    pub fn create_texture(&mut self, info: TextureInfo) -> TextureHandle {
        let handle = TextureHandle(self.next_id());
        self.record(&DriverCommand::CreateTexture { handle, info });
        handle
    }

    /// Copies `data` into the batch and records an upload of mip `level`.
    pub fn update_texture(&mut self, handle: TextureHandle, level: u8, data: &[u8]) {
        let data = self.write_inline(data);
        self.record(&DriverCommand::UpdateTexture {
            handle,
            level,
            data,
        });
    }

    /// Records the destruction of a texture.
    pub fn destroy_texture(&mut self, handle: TextureHandle) {
        self.record(&DriverCommand::DestroyTexture { handle });
    }

    /// Records the creation of a shader program.
    pub fn create_program(&mut self, name: &str) -> ProgramHandle {
        let handle = ProgramHandle(self.next_id());
        self.record(&DriverCommand::CreateProgram {
            handle,
            name: name.to_owned(),
        });
        handle
    }

    /// Records the destruction of a shader program.
    pub fn destroy_program(&mut self, handle: ProgramHandle) {
        self.record(&DriverCommand::DestroyProgram { handle });
    }

    /// Records the creation of a render primitive.
    pub fn create_render_primitive(&mut self, info: RenderPrimitiveInfo) -> RenderPrimitiveHandle {
        let handle = RenderPrimitiveHandle(self.next_id());
        self.record(&DriverCommand::CreateRenderPrimitive { handle, info });
        handle
    }

    /// Records the destruction of a render primitive.
    pub fn destroy_render_primitive(&mut self, handle: RenderPrimitiveHandle) {
        self.record(&DriverCommand::DestroyRenderPrimitive { handle });
    }

    /// Records the creation of a render target.
    pub fn create_render_target(&mut self, info: RenderTargetInfo) -> RenderTargetHandle {
        let handle = RenderTargetHandle(self.next_id());
        self.record(&DriverCommand::CreateRenderTarget { handle, info });
        handle
    }

    /// Records the destruction of a render target.
    pub fn destroy_render_target(&mut self, handle: RenderTargetHandle) {
        self.record(&DriverCommand::DestroyRenderTarget { handle });
    }

    /// Records the creation of a swap chain.
    pub fn create_swap_chain(&mut self, native_window: u64, flags: u64) -> SwapChainHandle {
        let handle = SwapChainHandle(self.next_id());
        self.record(&DriverCommand::CreateSwapChain {
            handle,
            native_window,
            flags,
        });
        handle
    }

    /// Records the destruction of a swap chain.
    pub fn destroy_swap_chain(&mut self, handle: SwapChainHandle) {
        self.record(&DriverCommand::DestroySwapChain { handle });
    }

    /// Records the creation of an external stream.
    pub fn create_stream(&mut self, width: u32, height: u32) -> StreamHandle {
        let handle = StreamHandle(self.next_id());
        self.record(&DriverCommand::CreateStream {
            handle,
            width,
            height,
        });
        handle
    }

    /// Records the destruction of an external stream.
    pub fn destroy_stream(&mut self, handle: StreamHandle) {
        self.record(&DriverCommand::DestroyStream { handle });
    }

    /// Records the creation of a fence.
    pub fn create_fence(&mut self) -> FenceHandle {
        let handle = FenceHandle(self.next_id());
        self.record(&DriverCommand::CreateFence { handle });
        handle
    }

    /// Records the destruction of a fence.
    pub fn destroy_fence(&mut self, handle: FenceHandle) {
        self.record(&DriverCommand::DestroyFence { handle });
    }

    /// Records a closure that runs on the driver thread once every command
    /// recorded before it has executed.
    pub fn queue_callback(&mut self, callback: impl FnOnce() + Send + 'static) {
        let id = self.callbacks.register(callback);
        self.record(&DriverCommand::Callback { id });
    }
}

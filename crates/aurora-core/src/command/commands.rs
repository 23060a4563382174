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

//! The serialized form of driver calls.

use crate::driver::{
    BufferHandle, BufferUsage, FenceHandle, ProgramHandle, RenderPrimitiveHandle,
    RenderPrimitiveInfo, RenderTargetHandle, RenderTargetInfo, StreamHandle, SwapChainHandle,
    TextureHandle, TextureInfo,
};
use serde::{Deserialize, Serialize};

/// Record holding a `bincode` encoded [`DriverCommand`].
pub(crate) const TAG_COMMAND: u8 = 1;
/// Record holding raw bytes referenced by later commands.
pub(crate) const TAG_INLINE: u8 = 2;
/// `[tag: u8][len: u32 LE]`
pub(crate) const RECORD_HEADER_SIZE: usize = 5;

/// A byte range inside the batch that is currently being recorded.
///
/// Offsets are relative to the start of the batch, so a range is only valid
/// until the next flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamRange {
    /// Offset from the start of the batch.
    pub offset: u32,
    /// Length in bytes.
    pub len: u32,
}

impl StreamRange {
    /// The range as `usize` bounds.
    pub fn bounds(&self) -> std::ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.len as usize
    }
}

/// A driver call recorded on the client thread.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DriverCommand {
    Purge,
    CreateBuffer {
        handle: BufferHandle,
        usage: BufferUsage,
        size: u32,
    },
    UpdateBuffer {
        handle: BufferHandle,
        offset: u32,
        data: StreamRange,
    },
    DestroyBuffer {
        handle: BufferHandle,
    },
    CreateTexture {
        handle: TextureHandle,
        info: TextureInfo,
    },
    UpdateTexture {
        handle: TextureHandle,
        level: u8,
        data: StreamRange,
    },
    DestroyTexture {
        handle: TextureHandle,
    },
    CreateProgram {
        handle: ProgramHandle,
        name: String,
    },
    DestroyProgram {
        handle: ProgramHandle,
    },
    CreateRenderPrimitive {
        handle: RenderPrimitiveHandle,
        info: RenderPrimitiveInfo,
    },
    DestroyRenderPrimitive {
        handle: RenderPrimitiveHandle,
    },
    CreateRenderTarget {
        handle: RenderTargetHandle,
        info: RenderTargetInfo,
    },
    DestroyRenderTarget {
        handle: RenderTargetHandle,
    },
    CreateSwapChain {
        handle: SwapChainHandle,
        native_window: u64,
        flags: u64,
    },
    DestroySwapChain {
        handle: SwapChainHandle,
    },
    CreateStream {
        handle: StreamHandle,
        width: u32,
        height: u32,
    },
    DestroyStream {
        handle: StreamHandle,
    },
    CreateFence {
        handle: FenceHandle,
    },
    DestroyFence {
        handle: FenceHandle,
    },
    /// Runs a closure registered in the [`super::CallbackTable`].
    Callback {
        id: u64,
    },
}

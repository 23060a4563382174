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

//! Contracts between the engine and a graphics backend.
//!
//! The engine never talks to a [`Driver`] directly from the client thread.
//! Every call is serialized by the [`crate::command::CommandStream`] and
//! replayed on the driver thread by the [`crate::command::CommandExecutor`].
//! A [`Platform`] is the factory that produces the driver once the driver
//! thread is up.

pub mod handles;
pub mod types;

pub use handles::{
    BufferHandle, FenceHandle, ProgramHandle, RenderPrimitiveHandle, RenderTargetHandle,
    StreamHandle, SwapChainHandle, TextureHandle,
};
pub use types::{
    BufferUsage, IndexType, PrimitiveType, RenderPrimitiveInfo, RenderTargetInfo, SamplerType,
    TextureFormat, TextureInfo,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The graphics backend a driver talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Backend {
    /// Let the platform layer pick the best backend available.
    #[default]
    Default,
    /// A driver that validates and counts commands but renders nothing.
    Noop,
    /// OpenGL / OpenGL ES.
    OpenGl,
    /// Vulkan.
    Vulkan,
    /// Metal.
    Metal,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Default => "Default",
            Backend::Noop => "Noop",
            Backend::OpenGl => "OpenGL",
            Backend::Vulkan => "Vulkan",
            Backend::Metal => "Metal",
        };
        f.write_str(name)
    }
}

/// An opaque native context the driver may share resources with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SharedContext(pub usize);

/// Errors that can occur while bringing up a driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// No driver for this backend is compiled in.
    #[error("backend {0} is not supported on this platform")]
    UnsupportedBackend(Backend),
    /// The platform could not create a driver.
    #[error("driver creation failed: {0}")]
    CreationFailed(String),
}

/// A factory for drivers, invoked once on the driver thread.
pub trait Platform: Send {
    /// A short name used in logs.
    fn name(&self) -> &'static str;

    /// Creates the driver instance.
    ///
    /// ## Arguments
    /// * `shared_context` - An optional native context to share resources with.
    ///
    /// ## Returns
    /// The driver, or a [`DriverError`] if the backend cannot be brought up.
    fn create_driver(
        &mut self,
        shared_context: Option<SharedContext>,
    ) -> Result<Box<dyn Driver>, DriverError>;
}

/// The backend-specific executor of driver commands.
///
/// All methods are called from the driver thread only. Handles are allocated
/// on the client thread before the corresponding `create_*` call is replayed,
/// which is why every creation method receives the handle instead of
/// returning it.
pub trait Driver: Send {
    /// The backend this driver implements.
    fn backend(&self) -> Backend;

    /// Allocates a GPU buffer of `size` bytes.
    fn create_buffer(&mut self, handle: BufferHandle, usage: BufferUsage, size: u32);
    /// Uploads `data` into a buffer at byte `offset`.
    fn update_buffer(&mut self, handle: BufferHandle, offset: u32, data: &[u8]);
    /// Releases a buffer.
    fn destroy_buffer(&mut self, handle: BufferHandle);

    /// Allocates a texture.
    fn create_texture(&mut self, handle: TextureHandle, info: &TextureInfo);
    /// Uploads one mip level of a texture.
    fn update_texture(&mut self, handle: TextureHandle, level: u8, data: &[u8]);
    /// Releases a texture.
    fn destroy_texture(&mut self, handle: TextureHandle);

    /// Creates a shader program.
    fn create_program(&mut self, handle: ProgramHandle, name: &str);
    /// Releases a shader program.
    fn destroy_program(&mut self, handle: ProgramHandle);

    /// Binds vertex and index buffers into a drawable primitive.
    fn create_render_primitive(&mut self, handle: RenderPrimitiveHandle, info: &RenderPrimitiveInfo);
    /// Releases a render primitive.
    fn destroy_render_primitive(&mut self, handle: RenderPrimitiveHandle);

    /// Creates an offscreen render target.
    fn create_render_target(&mut self, handle: RenderTargetHandle, info: &RenderTargetInfo);
    /// Releases a render target.
    fn destroy_render_target(&mut self, handle: RenderTargetHandle);

    /// Creates a swap chain for a native window.
    fn create_swap_chain(&mut self, handle: SwapChainHandle, native_window: u64, flags: u64);
    /// Releases a swap chain.
    fn destroy_swap_chain(&mut self, handle: SwapChainHandle);

    /// Creates an external image stream.
    fn create_stream(&mut self, handle: StreamHandle, width: u32, height: u32);
    /// Releases an external image stream.
    fn destroy_stream(&mut self, handle: StreamHandle);

    /// Creates a GPU fence.
    fn create_fence(&mut self, handle: FenceHandle);
    /// Releases a GPU fence.
    fn destroy_fence(&mut self, handle: FenceHandle);

    /// Frees driver-side objects whose destruction was deferred.
    fn purge(&mut self);

    /// Shuts the driver down. Called once, on the driver thread, after the
    /// last command has been executed.
    fn terminate(&mut self);
}

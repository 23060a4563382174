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

//! Things the engine renders into or samples from outside of itself.

use super::{BuildContext, Handle, Resource, ResourceBuilder, ResourceError, ResourceType, Texture};
use aurora_core::command::DriverApi;
use aurora_core::driver::{RenderTargetHandle, RenderTargetInfo, StreamHandle, SwapChainHandle};

/// Builds a [`RenderTarget`].
#[derive(Debug, Clone, Default)]
pub struct RenderTargetBuilder {
    color: Option<Handle<Texture>>,
    depth: Option<Handle<Texture>>,
}

impl RenderTargetBuilder {
    /// Texture receiving color.
    pub fn color(mut self, texture: Handle<Texture>) -> Self {
        self.color = Some(texture);
        self
    }

    /// Texture receiving depth.
    pub fn depth(mut self, texture: Handle<Texture>) -> Self {
        self.depth = Some(texture);
        self
    }
}

impl ResourceBuilder for RenderTargetBuilder {
    type Output = RenderTarget;

    fn build(self, ctx: &mut BuildContext<'_>) -> Result<RenderTarget, ResourceError> {
        let mut extent = None;
        let mut hw = [None, None];
        for (slot, attachment) in [self.color, self.depth].into_iter().enumerate() {
            let Some(handle) = attachment else {
                continue;
            };
            let texture = ctx.lists.require(handle)?;
            let size = (texture.width(), texture.height());
            if extent.is_some_and(|e| e != size) {
                return Err(ResourceError::invalid(
                    ResourceType::RenderTarget,
                    "attachments have different sizes",
                ));
            }
            extent = Some(size);
            hw[slot] = Some(texture.hw());
        }
        let Some((width, height)) = extent else {
            return Err(ResourceError::invalid(
                ResourceType::RenderTarget,
                "a render target needs at least one attachment",
            ));
        };

        let info = RenderTargetInfo {
            color: hw[0],
            depth: hw[1],
            width,
            height,
        };
        Ok(RenderTarget {
            color: self.color,
            depth: self.depth,
            width,
            height,
            hw: ctx.driver.create_render_target(info),
        })
    }
}

/// An offscreen target made of borrowed textures.
#[derive(Debug)]
pub struct RenderTarget {
    color: Option<Handle<Texture>>,
    depth: Option<Handle<Texture>>,
    width: u32,
    height: u32,
    hw: RenderTargetHandle,
}

impl RenderTarget {
    /// Starts building a render target.
    pub fn builder() -> RenderTargetBuilder {
        RenderTargetBuilder::default()
    }

    /// The color attachment.
    pub fn color(&self) -> Option<Handle<Texture>> {
        self.color
    }

    /// The depth attachment.
    pub fn depth(&self) -> Option<Handle<Texture>> {
        self.depth
    }

    /// Size in pixels.
    pub fn extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Resource for RenderTarget {
    const TYPE: ResourceType = ResourceType::RenderTarget;

    fn terminate(&mut self, driver: &mut DriverApi) {
        driver.destroy_render_target(self.hw);
    }
}

impl_managed!(RenderTarget, render_targets);

/// Builds a [`SwapChain`].
#[derive(Debug, Clone, Default)]
pub struct SwapChainBuilder {
    native_window: u64,
    flags: u64,
}

impl SwapChainBuilder {
    /// The native window to present to.
    pub fn native_window(mut self, window: u64) -> Self {
        self.native_window = window;
        self
    }

    /// A combination of the `SwapChain::CONFIG_*` flags.
    pub fn flags(mut self, flags: u64) -> Self {
        self.flags = flags;
        self
    }
}

impl ResourceBuilder for SwapChainBuilder {
    type Output = SwapChain;

    fn build(self, ctx: &mut BuildContext<'_>) -> Result<SwapChain, ResourceError> {
        Ok(SwapChain {
            native_window: self.native_window,
            flags: self.flags,
            hw: ctx
                .driver
                .create_swap_chain(self.native_window, self.flags),
        })
    }
}

/// The presentation surface of a native window.
#[derive(Debug)]
pub struct SwapChain {
    native_window: u64,
    flags: u64,
    hw: SwapChainHandle,
}

impl SwapChain {
    /// The swap chain has an alpha channel.
    pub const CONFIG_TRANSPARENT: u64 = 0x1;
    /// The swap chain content can be read back.
    pub const CONFIG_READABLE: u64 = 0x2;

    /// Starts building a swap chain.
    pub fn builder() -> SwapChainBuilder {
        SwapChainBuilder::default()
    }

    /// The native window.
    pub fn native_window(&self) -> u64 {
        self.native_window
    }

    /// Configuration flags.
    pub fn flags(&self) -> u64 {
        self.flags
    }
}

impl Resource for SwapChain {
    const TYPE: ResourceType = ResourceType::SwapChain;

    fn terminate(&mut self, driver: &mut DriverApi) {
        driver.destroy_swap_chain(self.hw);
    }
}

impl_managed!(SwapChain, swap_chains);

/// Builds a [`Stream`].
#[derive(Debug, Clone, Default)]
pub struct StreamBuilder {
    width: u32,
    height: u32,
}

impl StreamBuilder {
    /// Width of the incoming images.
    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Height of the incoming images.
    pub fn height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }
}

impl ResourceBuilder for StreamBuilder {
    type Output = Stream;

    fn build(self, ctx: &mut BuildContext<'_>) -> Result<Stream, ResourceError> {
        if self.width == 0 || self.height == 0 {
            return Err(ResourceError::invalid(
                ResourceType::Stream,
                format!("empty extent {}x{}", self.width, self.height),
            ));
        }
        Ok(Stream {
            width: self.width,
            height: self.height,
            hw: ctx.driver.create_stream(self.width, self.height),
        })
    }
}

/// Images produced outside of the engine, such as a camera feed.
#[derive(Debug)]
pub struct Stream {
    width: u32,
    height: u32,
    hw: StreamHandle,
}

impl Stream {
    /// Starts building a stream.
    pub fn builder() -> StreamBuilder {
        StreamBuilder::default()
    }

    /// Size of the incoming images.
    pub fn extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Resource for Stream {
    const TYPE: ResourceType = ResourceType::Stream;

    fn terminate(&mut self, driver: &mut DriverApi) {
        driver.destroy_stream(self.hw);
    }
}

impl_managed!(Stream, streams);

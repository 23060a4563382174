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

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Live object counters of a [`super::NoopDriver`], readable from any thread.
#[derive(Debug, Default)]
pub struct DriverStats {
    pub(crate) buffers: AtomicUsize,
    pub(crate) textures: AtomicUsize,
    pub(crate) programs: AtomicUsize,
    pub(crate) render_primitives: AtomicUsize,
    pub(crate) render_targets: AtomicUsize,
    pub(crate) swap_chains: AtomicUsize,
    pub(crate) streams: AtomicUsize,
    pub(crate) fences: AtomicUsize,
    pub(crate) commands: AtomicUsize,
    pub(crate) purges: AtomicUsize,
    pub(crate) invalid_uses: AtomicUsize,
    pub(crate) terminated: AtomicBool,
}

impl DriverStats {
    /// Live buffers.
    pub fn live_buffers(&self) -> usize {
        self.buffers.load(Ordering::Acquire)
    }

    /// Live textures.
    pub fn live_textures(&self) -> usize {
        self.textures.load(Ordering::Acquire)
    }

    /// Live programs.
    pub fn live_programs(&self) -> usize {
        self.programs.load(Ordering::Acquire)
    }

    /// Live render primitives.
    pub fn live_render_primitives(&self) -> usize {
        self.render_primitives.load(Ordering::Acquire)
    }

    /// Live render targets.
    pub fn live_render_targets(&self) -> usize {
        self.render_targets.load(Ordering::Acquire)
    }

    /// Live swap chains.
    pub fn live_swap_chains(&self) -> usize {
        self.swap_chains.load(Ordering::Acquire)
    }

    /// Live streams.
    pub fn live_streams(&self) -> usize {
        self.streams.load(Ordering::Acquire)
    }

    /// Live fences.
    pub fn live_fences(&self) -> usize {
        self.fences.load(Ordering::Acquire)
    }

    /// Sum of every live object count.
    pub fn live_objects(&self) -> usize {
        self.live_buffers()
            + self.live_textures()
            + self.live_programs()
            + self.live_render_primitives()
            + self.live_render_targets()
            + self.live_swap_chains()
            + self.live_streams()
            + self.live_fences()
    }

    /// Driver calls executed, purges included.
    pub fn commands(&self) -> usize {
        self.commands.load(Ordering::Acquire)
    }

    /// Number of purges.
    pub fn purges(&self) -> usize {
        self.purges.load(Ordering::Acquire)
    }

    /// Calls that referenced an unknown object or re-created a live one.
    pub fn invalid_uses(&self) -> usize {
        self.invalid_uses.load(Ordering::Acquire)
    }

    /// Returns `true` once the driver was terminated.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }
}

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

//! Opaque identifiers for driver-side objects.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

define_handle!(
    /// A GPU buffer (vertex, index or uniform data).
    BufferHandle
);
define_handle!(
    /// A GPU texture.
    TextureHandle
);
define_handle!(
    /// A compiled shader program.
    ProgramHandle
);
define_handle!(
    /// A drawable primitive binding vertex and index buffers.
    RenderPrimitiveHandle
);
define_handle!(
    /// An offscreen render target.
    RenderTargetHandle
);
define_handle!(
    /// A swap chain bound to a native window.
    SwapChainHandle
);
define_handle!(
    /// An external image stream.
    StreamHandle
);
define_handle!(
    /// A GPU fence.
    FenceHandle
);

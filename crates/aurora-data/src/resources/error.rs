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

use super::ResourceType;

/// Recoverable failures of resource creation, update and destruction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResourceError {
    /// A builder or setter was given parameters it cannot accept.
    #[error("invalid {kind} parameters: {reason}")]
    InvalidArgument {
        /// The kind of resource being built or modified.
        kind: ResourceType,
        /// What was wrong.
        reason: String,
    },
    /// A handle passed in does not refer to a live resource.
    #[error("referenced {kind} does not exist")]
    UnknownResource {
        /// The kind of resource the handle points to.
        kind: ResourceType,
    },
    /// A material cannot be destroyed while it still has instances.
    #[error("material \"{name}\" still has {instances} live instance(s)")]
    MaterialInUse {
        /// Name of the material.
        name: String,
        /// Number of instances still registered.
        instances: usize,
    },
    /// The skybox material cannot be destroyed while skyboxes still use it.
    #[error("material \"{name}\" is still used by {skyboxes} skybox(es)")]
    SkyboxMaterialInUse {
        /// Name of the material.
        name: String,
        /// Number of skyboxes still referencing it.
        skyboxes: usize,
    },
}

impl ResourceError {
    pub(crate) fn invalid(kind: ResourceType, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            kind,
            reason: reason.into(),
        }
    }
}

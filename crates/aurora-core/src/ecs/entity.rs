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

//! Defines the entity identifier used by every component manager.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A lightweight identifier for an entity.
///
/// An entity is only an index paired with a generation. When an entity is
/// destroyed its index can be recycled, but the generation is incremented so
/// that stale `Entity` values no longer compare equal to the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    /// The slot of the entity in the entity manager.
    pub index: u32,
    /// Incremented each time the slot is recycled.
    pub generation: u32,
}

impl Entity {
    /// Creates an entity identifier from its raw parts.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

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

use super::EntityManager;
use aurora_core::Entity;

/// The contract every component manager exposes to the engine.
///
/// `gc` is run from a worker thread during a parallel sweep, hence `Send`.
/// The entity manager is shared read-only between all sweeps.
pub trait ComponentManager: Send {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Returns `true` if `entity` has a component in this manager.
    fn has_component(&self, entity: Entity) -> bool;

    /// Number of components currently stored.
    fn component_count(&self) -> usize;

    /// Removes the component of `entity`. Returns `false` if there was none.
    fn destroy(&mut self, entity: Entity) -> bool;

    /// Removes every component whose entity is no longer alive.
    ///
    /// ## Returns
    /// The number of components removed.
    fn gc(&mut self, entities: &EntityManager) -> usize;

    /// Releases every component. The manager is empty afterwards.
    fn terminate(&mut self);
}

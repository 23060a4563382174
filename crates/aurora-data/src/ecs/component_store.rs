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
use std::collections::HashMap;

/// Dense per-entity storage of one component type.
///
/// Components are packed in a `Vec` for iteration; removal swaps the last
/// element into the hole and patches the lookup table.
#[derive(Debug, Clone)]
pub struct ComponentStore<T> {
    entities: Vec<Entity>,
    components: Vec<T>,
    lookup: HashMap<Entity, usize>,
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            components: Vec::new(),
            lookup: HashMap::new(),
        }
    }
}

impl<T> ComponentStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `component` to `entity`, returning the one it replaces.
    pub fn insert(&mut self, entity: Entity, component: T) -> Option<T> {
        if let Some(&index) = self.lookup.get(&entity) {
            return Some(std::mem::replace(&mut self.components[index], component));
        }
        self.lookup.insert(entity, self.components.len());
        self.entities.push(entity);
        self.components.push(component);
        None
    }

    /// Detaches and returns the component of `entity`.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let index = self.lookup.remove(&entity)?;
        self.entities.swap_remove(index);
        let component = self.components.swap_remove(index);
        if let Some(moved) = self.entities.get(index) {
            self.lookup.insert(*moved, index);
        }
        Some(component)
    }

    /// Borrows the component of `entity`, attaching `make()` first if it has none.
    pub fn get_or_insert_with(&mut self, entity: Entity, make: impl FnOnce() -> T) -> &mut T {
        let index = match self.lookup.get(&entity) {
            Some(&index) => index,
            None => {
                self.lookup.insert(entity, self.components.len());
                self.entities.push(entity);
                self.components.push(make());
                self.components.len() - 1
            }
        };
        &mut self.components[index]
    }

    /// Borrows the component of `entity`.
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.lookup.get(&entity).map(|&i| &self.components[i])
    }

    /// Mutably borrows the component of `entity`.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.lookup.get(&entity).map(|&i| &mut self.components[i])
    }

    /// Returns `true` if `entity` has a component here.
    pub fn contains(&self, entity: Entity) -> bool {
        self.lookup.contains_key(&entity)
    }

    /// Number of stored components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Iterates over `(entity, component)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.components.iter())
    }

    /// Removes the components of dead entities and returns them.
    pub fn retain_alive(&mut self, entities: &EntityManager) -> Vec<(Entity, T)> {
        let dead: Vec<Entity> = self
            .entities
            .iter()
            .copied()
            .filter(|e| !entities.is_alive(*e))
            .collect();
        dead.into_iter()
            .filter_map(|e| self.remove(e).map(|c| (e, c)))
            .collect()
    }

    /// Empties the store.
    pub fn drain(&mut self) -> Vec<(Entity, T)> {
        self.lookup.clear();
        self.entities
            .drain(..)
            .zip(self.components.drain(..))
            .collect()
    }
}

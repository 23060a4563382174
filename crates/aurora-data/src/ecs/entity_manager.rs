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

//! Allocation and recycling of entity identifiers.

use aurora_core::Entity;

/// Allocates entities and answers liveness queries.
///
/// Slots are never shrunk. A destroyed slot goes to the free list and comes
/// back with its generation incremented, so stale [`Entity`] values stay dead.
#[derive(Debug, Clone, Default)]
pub struct EntityManager {
    /// Every slot ever allocated with its current id and liveness.
    slots: Vec<(Entity, bool)>,
    /// Indices available for reuse.
    freed: Vec<u32>,
    alive: usize,
}

impl EntityManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new or recycled entity.
    pub fn create(&mut self) -> Entity {
        self.alive += 1;
        if let Some(index) = self.freed.pop() {
            let (id, alive) = &mut self.slots[index as usize];
            id.generation = id.generation.wrapping_add(1);
            *alive = true;
            *id
        } else {
            let id = Entity::new(self.slots.len() as u32, 0);
            self.slots.push((id, true));
            id
        }
    }

    /// Allocates `count` entities at once.
    pub fn create_many(&mut self, count: usize) -> Vec<Entity> {
        (0..count).map(|_| self.create()).collect()
    }

    /// Destroys an entity. Returns `false` if it was already dead.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        match self.slots.get_mut(entity.index as usize) {
            Some((id, alive)) if *alive && id.generation == entity.generation => {
                *alive = false;
                self.freed.push(entity.index);
                self.alive -= 1;
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if `entity` was created and not destroyed since.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.slots
            .get(entity.index as usize)
            .is_some_and(|(id, alive)| *alive && id.generation == entity.generation)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.alive
    }

    /// Returns `true` if no entity is alive.
    pub fn is_empty(&self) -> bool {
        self.alive == 0
    }
}

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

use crate::ecs::{ComponentManager, ComponentStore, EntityManager};
use aurora_core::math::Mat4;
use aurora_core::Entity;

/// Local and world placement of an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Relative to the parent, or to the world without one.
    pub local: Mat4,
    /// `parent.world * local`, kept up to date by the manager.
    pub world: Mat4,
    /// The entity this one is attached to.
    pub parent: Option<Entity>,
}

/// Owns the transform hierarchy.
#[derive(Debug, Default)]
pub struct TransformManager {
    store: ComponentStore<Transform>,
}

impl TransformManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives `entity` a transform, replacing any previous one.
    pub fn create(&mut self, entity: Entity, parent: Option<Entity>, local: Mat4) {
        let parent = parent.filter(|p| self.store.contains(*p));
        self.store.insert(
            entity,
            Transform {
                local,
                world: local,
                parent,
            },
        );
        self.update_world(entity);
    }

    /// Borrows the transform of `entity`.
    pub fn get(&self, entity: Entity) -> Option<&Transform> {
        self.store.get(entity)
    }

    /// Changes the local transform and refreshes the subtree below `entity`.
    ///
    /// ## Returns
    /// `false` if `entity` has no transform.
    pub fn set_transform(&mut self, entity: Entity, local: Mat4) -> bool {
        match self.store.get_mut(entity) {
            Some(transform) => transform.local = local,
            None => return false,
        }
        self.update_world(entity);
        true
    }

    /// The world transform of `entity`.
    pub fn world_transform(&self, entity: Entity) -> Option<Mat4> {
        self.store.get(entity).map(|t| t.world)
    }

    /// The parent of `entity`, if any.
    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.store.get(entity).and_then(|t| t.parent)
    }

    fn update_world(&mut self, root: Entity) {
        let mut pending = vec![root];
        while let Some(entity) = pending.pop() {
            let Some(transform) = self.store.get(entity) else {
                continue;
            };
            let parent_world = transform
                .parent
                .and_then(|p| self.store.get(p))
                .map(|p| p.world)
                .unwrap_or(Mat4::IDENTITY);
            if let Some(transform) = self.store.get_mut(entity) {
                transform.world = parent_world * transform.local;
            }
            pending.extend(
                self.store
                    .iter()
                    .filter(|(_, t)| t.parent == Some(entity))
                    .map(|(child, _)| child),
            );
        }
    }

    fn detach_children(&mut self, parent: Entity) {
        let children: Vec<Entity> = self
            .store
            .iter()
            .filter(|(_, t)| t.parent == Some(parent))
            .map(|(child, _)| child)
            .collect();
        for child in children {
            if let Some(transform) = self.store.get_mut(child) {
                transform.parent = None;
            }
            self.update_world(child);
        }
    }
}

impl ComponentManager for TransformManager {
    fn name(&self) -> &'static str {
        "transform"
    }

    fn has_component(&self, entity: Entity) -> bool {
        self.store.contains(entity)
    }

    fn component_count(&self) -> usize {
        self.store.len()
    }

    fn destroy(&mut self, entity: Entity) -> bool {
        if self.store.remove(entity).is_none() {
            return false;
        }
        self.detach_children(entity);
        true
    }

    fn gc(&mut self, entities: &EntityManager) -> usize {
        let removed = self.store.retain_alive(entities);
        for (entity, _) in &removed {
            self.detach_children(*entity);
        }
        removed.len()
    }

    fn terminate(&mut self) {
        self.store.drain();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_transform_follows_parent() {
        let mut entities = EntityManager::new();
        let (root, child) = (entities.create(), entities.create());
        let mut transforms = TransformManager::new();
        transforms.create(root, None, Mat4::from_translation(1.0, 0.0, 0.0));
        transforms.create(child, Some(root), Mat4::from_translation(0.0, 2.0, 0.0));

        transforms.set_transform(root, Mat4::from_translation(5.0, 0.0, 0.0));

        let world = transforms.world_transform(child).unwrap();
        assert_eq!(world.translation(), [5.0, 2.0, 0.0]);
    }

    #[test]
    fn test_gc_detaches_orphans() {
        let mut entities = EntityManager::new();
        let (root, child) = (entities.create(), entities.create());
        let mut transforms = TransformManager::new();
        transforms.create(root, None, Mat4::from_translation(1.0, 0.0, 0.0));
        transforms.create(child, Some(root), Mat4::IDENTITY);
        entities.destroy(root);

        assert_eq!(transforms.gc(&entities), 1);
        assert_eq!(transforms.parent(child), None);
        assert_eq!(transforms.world_transform(child), Some(Mat4::IDENTITY));
    }
}

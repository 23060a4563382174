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

//! The ownership set of one resource kind.

use super::handle::Handle;

struct Slot<T> {
    generation: u32,
    value: Option<Box<T>>,
}

/// Owns every live resource of one kind.
///
/// Resources are stored in a slab of generational slots. Removing a resource
/// frees its slot for reuse and bumps the slot generation, so a handle to a
/// removed resource never resolves again, even after the slot is recycled.
pub struct ResourceList<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> ResourceList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Takes ownership of `value` and returns its handle.
    pub fn insert(&mut self, value: Box<T>) -> Handle<T> {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            Handle::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            Handle::new(index, 0)
        }
    }

    fn slot(&self, handle: Handle<T>) -> Option<&Slot<T>> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
    }

    /// Removes the resource behind `handle` and gives its ownership back.
    ///
    /// Returns `None` if the handle is stale or was never issued by this list.
    pub fn remove(&mut self, handle: Handle<T>) -> Option<Box<T>> {
        let slot = self.slots.get_mut(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index());
        self.len -= 1;
        Some(value)
    }

    /// Returns `true` if `handle` refers to a live resource of this list.
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Borrows a live resource.
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slot(handle).and_then(|slot| slot.value.as_deref())
    }

    /// Mutably borrows a live resource.
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_deref_mut())
    }

    /// Number of live resources.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no resource is live.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Empties the list and returns everything it owned.
    ///
    /// Every handle issued so far is stale once this returns, so a destroy
    /// issued while the caller walks the snapshot finds nothing to free.
    pub fn take_all(&mut self) -> Vec<(Handle<T>, Box<T>)> {
        let mut taken = Vec::with_capacity(self.len);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.take() {
                taken.push((Handle::new(index as u32, slot.generation), value));
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.len = 0;
        taken
    }

    /// Iterates over live resources in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_deref()
                .map(|value| (Handle::new(index as u32, slot.generation), value))
        })
    }

    /// Mutably iterates over live resources in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle<T>, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.value
                .as_deref_mut()
                .map(|value| (Handle::new(index as u32, generation), value))
        })
    }

    /// Handles of every live resource.
    pub fn handles(&self) -> Vec<Handle<T>> {
        self.iter().map(|(handle, _)| handle).collect()
    }
}

impl<T> Default for ResourceList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ResourceList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceList")
            .field("len", &self.len)
            .field("slots", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_membership_follows_inserts_and_removes() {
        let mut list = ResourceList::new();
        let mut expected = BTreeSet::new();
        let mut handles = Vec::new();

        for value in 0..10u32 {
            handles.push(list.insert(Box::new(value)));
            expected.insert(value);
        }
        for &handle in handles.iter().step_by(3) {
            let removed = list.remove(handle).map(|value| *value);
            assert!(removed.is_some());
            expected.remove(&removed.unwrap());
        }
        for value in 10..13u32 {
            list.insert(Box::new(value));
            expected.insert(value);
        }

        let actual: BTreeSet<u32> = list.iter().map(|(_, value)| *value).collect();
        assert_eq!(actual, expected);
        assert_eq!(list.len(), expected.len());
    }

    #[test]
    fn test_remove_twice_reports_absent() {
        let mut list = ResourceList::new();
        let handle = list.insert(Box::new("texture"));
        assert_eq!(list.remove(handle).as_deref(), Some(&"texture"));
        assert!(list.remove(handle).is_none());
        assert!(list.is_empty());
    }

    #[test]
    fn test_recycled_slot_rejects_stale_handle() {
        let mut list = ResourceList::new();
        let old = list.insert(Box::new(1));
        list.remove(old);
        let new = list.insert(Box::new(2));

        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert!(!list.contains(old));
        assert!(list.remove(old).is_none());
        assert_eq!(list.get(new), Some(&2));
    }

    #[test]
    fn test_take_all_snapshots_and_empties() {
        let mut list = ResourceList::new();
        let a = list.insert(Box::new('a'));
        let b = list.insert(Box::new('b'));
        let c = list.insert(Box::new('c'));
        list.remove(b);

        let taken = list.take_all();
        let handles: Vec<_> = taken.iter().map(|(handle, _)| *handle).collect();
        let values: Vec<_> = taken.iter().map(|(_, value)| **value).collect();
        assert_eq!(handles, vec![a, c]);
        assert_eq!(values, vec!['a', 'c']);

        assert!(list.is_empty());
        assert_eq!(list.iter().count(), 0);
        assert!(list.remove(a).is_none());
        assert!(!list.contains(c));
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut list = ResourceList::new();
        let handle = list.insert(Box::new(vec![1]));
        list.get_mut(handle).unwrap().push(2);
        assert_eq!(list.get(handle), Some(&vec![1, 2]));
    }
}

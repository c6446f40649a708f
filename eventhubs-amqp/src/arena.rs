//! A slab keyed by generational indices
//!
//! Watchdogs and late events only hold a [`Key`]. A slot that has been freed and reused
//! carries a different generation, so a stale key never resolves to the new occupant.

use std::fmt::Display;

use slab::Slab;

/// A generational index into an [`Arena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    slot: usize,
    generation: u64,
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.slot, self.generation)
    }
}

#[derive(Debug)]
struct Entry<T> {
    generation: u64,
    value: T,
}

#[derive(Debug)]
pub(crate) struct Arena<T> {
    entries: Slab<Entry<T>>,
    next_generation: u64,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            entries: Slab::new(),
            next_generation: 0,
        }
    }
}

impl<T> Arena<T> {
    /// Inserts a value built from the key it will be stored under
    pub fn insert_with(&mut self, f: impl FnOnce(Key) -> T) -> Key {
        let entry = self.entries.vacant_entry();
        let key = Key {
            slot: entry.key(),
            generation: self.next_generation,
        };
        self.next_generation += 1;
        entry.insert(Entry {
            generation: key.generation,
            value: f(key),
        });
        key
    }

    pub fn get(&self, key: Key) -> Option<&T> {
        self.entries
            .get(key.slot)
            .filter(|entry| entry.generation == key.generation)
            .map(|entry| &entry.value)
    }

    pub fn get_mut(&mut self, key: Key) -> Option<&mut T> {
        self.entries
            .get_mut(key.slot)
            .filter(|entry| entry.generation == key.generation)
            .map(|entry| &mut entry.value)
    }

    pub fn remove(&mut self, key: Key) -> Option<T> {
        match self.entries.get(key.slot) {
            Some(entry) if entry.generation == key.generation => {
                Some(self.entries.remove(key.slot).value)
            }
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Key, &T)> + '_ {
        self.entries.iter().map(|(slot, entry)| {
            let key = Key {
                slot,
                generation: entry.generation,
            };
            (key, &entry.value)
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

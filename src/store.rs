//! Local, non-authoritative mirrors of the collaborator's collections.
//!
//! Stores are only ever written by the sync and auth services in response to
//! completed requests; views read them.
use std::sync::atomic::{AtomicU64, Ordering};
use crate::models::{Id, PublicUser, Task, TimesheetEntry};

/// Write counters for each collection. Every successful write made through
/// this server bumps the matching counter; a store loaded at an older value
/// is stale.
#[derive(Debug, Default)]
pub struct CollectionVersions {
    tasks: AtomicU64,
    timesheets: AtomicU64,
    users: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Tasks,
    Timesheets,
    Users,
}

impl CollectionVersions {
    fn counter(&self, collection: Collection) -> &AtomicU64 {
        match collection {
            Collection::Tasks => &self.tasks,
            Collection::Timesheets => &self.timesheets,
            Collection::Users => &self.users,
        }
    }

    pub fn current(&self, collection: Collection) -> u64 {
        self.counter(collection).load(Ordering::SeqCst)
    }

    /// Records a write; returns the (previous, new) versions.
    pub fn bump(&self, collection: Collection) -> (u64, u64) {
        let previous = self.counter(collection).fetch_add(1, Ordering::SeqCst);
        (previous, previous + 1)
    }
}

pub trait Entity: Clone {
    fn id(&self) -> &Id;
}

impl Entity for Task {
    fn id(&self) -> &Id {
        &self.id
    }
}

impl Entity for TimesheetEntry {
    fn id(&self) -> &Id {
        &self.id
    }
}

impl Entity for PublicUser {
    fn id(&self) -> &Id {
        &self.id
    }
}

#[derive(Debug, Clone)]
pub struct EntityStore<T> {
    items: Vec<T>,
    loaded_version: Option<u64>,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loaded_version: None,
        }
    }
}

impl<T: Entity> EntityStore<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True once a fetch or snapshot has populated the store, even if the
    /// collection turned out to be empty.
    pub fn is_loaded(&self) -> bool {
        self.loaded_version.is_some()
    }

    /// Loaded, and no write has happened since.
    pub fn is_current(&self, version: u64) -> bool {
        self.loaded_version == Some(version)
    }

    /// Wholesale replacement after a successful fetch taken at `version`.
    pub fn replace_all(&mut self, items: Vec<T>, version: u64) {
        self.items = items;
        self.loaded_version = Some(version);
    }

    /// Seeds an empty store from a pre-fetched snapshot. A store that already
    /// holds items keeps them. Returns whether the snapshot was taken.
    pub fn initialize(&mut self, snapshot: Vec<T>, version: u64) -> bool {
        if !self.items.is_empty() {
            return false;
        }
        self.items = snapshot;
        self.loaded_version = Some(version);
        true
    }

    /// After merging our own write, a store that was current before it is
    /// still current.
    pub fn advance(&mut self, (previous, new): (u64, u64)) {
        if self.loaded_version == Some(previous) {
            self.loaded_version = Some(new);
        }
    }

    pub fn append(&mut self, item: T) {
        self.items.push(item);
    }

    /// Replaces the item with the same id, or appends it.
    pub fn merge(&mut self, item: T) {
        match self.items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    /// Replaces the item with the same id; unknown ids are ignored.
    pub fn merge_existing(&mut self, item: T) -> bool {
        match self.items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => {
                *existing = item;
                true
            }
            None => false,
        }
    }

    pub fn find(&self, id: &Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.loaded_version = None;
    }
}

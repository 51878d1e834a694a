use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// How an entity is recognised: by its surrogate key once persisted,
/// by its handle before that
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    Persisted(i64),
    Transient(Uuid),
}

/// Common identity contract for every persistable record
pub trait Entity {
    /// Name used in errors and logs
    const NAME: &'static str;

    /// Surrogate key, `None` until the store assigns one
    fn id(&self) -> Option<i64>;

    /// Stable token created with the instance and stored with its row
    fn handle(&self) -> Uuid;

    fn identity(&self) -> Identity {
        match self.id() {
            Some(id) => Identity::Persisted(id),
            None => Identity::Transient(self.handle()),
        }
    }

    fn is_transient(&self) -> bool {
        self.id().is_none()
    }

    /// Persisted entities match on id, everything else on handle
    fn same_entity<O: Entity>(&self, other: &O) -> bool {
        match (self.id(), other.id()) {
            (Some(a), Some(b)) => a == b,
            _ => self.handle() == other.handle(),
        }
    }
}

/// A shareable, mutable handle to an entity.
///
/// Every clone points at the same instance, so a write made through one
/// holder (a set updating a back-reference, the store assigning an id)
/// is seen by all of them.
pub struct Shared<T>(Arc<RwLock<T>>);

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write()
    }

    /// True when both handles point at the same allocation
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Entity> Shared<T> {
    pub fn id(&self) -> Option<i64> {
        self.read().id()
    }

    pub fn identity(&self) -> Identity {
        self.read().identity()
    }

    pub fn same_entity(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let other = other.read();
        self.read().same_entity(&*other)
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read().fmt(f)
    }
}

impl<T: Serialize> Serialize for Shared<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.read().serialize(serializer)
    }
}

/// Unordered collection with set semantics over entity identity
#[derive(Debug)]
pub struct EntitySet<T> {
    items: Vec<Shared<T>>,
}

impl<T> Default for EntitySet<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Clone for EntitySet<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<T: Entity> EntitySet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless an entity with the same identity is already present.
    /// Returns whether the set changed.
    pub fn insert(&mut self, item: &Shared<T>) -> bool {
        if self.contains(item) {
            return false;
        }
        self.items.push(item.clone());
        true
    }

    pub fn contains(&self, item: &Shared<T>) -> bool {
        self.items.iter().any(|existing| existing.same_entity(item))
    }

    /// Returns whether an entity was removed
    pub fn remove(&mut self, item: &Shared<T>) -> bool {
        let before = self.items.len();
        self.items.retain(|existing| !existing.same_entity(item));
        self.items.len() != before
    }

    pub fn find_by_id(&self, id: i64) -> Option<&Shared<T>> {
        self.items.iter().find(|item| item.id() == Some(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shared<T>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Serialize> Serialize for EntitySet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.iter())
    }
}

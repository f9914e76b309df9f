use crate::domain::value_objects::EntityId;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// A record that can be held in a [`Collection`] and mutated optimistically.
pub trait Entity: Clone + Debug + PartialEq + Send + Sync + 'static {
    /// Partial update accepted by the remote store's `update`.
    type Patch: Clone + Debug + Send + Sync + 'static;

    /// Human-readable kind used in logs and notifications ("ticket", "draft", ...).
    const KIND: &'static str;

    fn id(&self) -> &EntityId;

    fn set_id(&mut self, id: EntityId);

    fn created_at(&self) -> DateTime<Utc>;

    fn updated_at(&self) -> DateTime<Utc>;

    fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>);

    fn apply_patch(&mut self, patch: &Self::Patch, now: DateTime<Utc>);
}

/// Ordered in-memory mirror of a remote collection.
///
/// Ids are unique: every insertion path either rejects or replaces a
/// duplicate, so at most one entity carries any given id.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection, keeping the first occurrence of any duplicated id.
    pub fn from_vec(items: Vec<T>) -> Self {
        let mut collection = Self::new();
        for item in items {
            if !collection.contains(item.id()) {
                collection.items.push(item);
            }
        }
        collection
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.items.iter().map(|item| item.id().clone()).collect()
    }

    pub fn position(&self, id: &EntityId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &EntityId) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Inserts at `index` (clamped to the length). Returns `false` and leaves the
    /// collection untouched when the id is already present.
    pub fn insert_at(&mut self, index: usize, entity: T) -> bool {
        if self.contains(entity.id()) {
            return false;
        }
        let index = index.min(self.items.len());
        self.items.insert(index, entity);
        true
    }

    pub fn push_front(&mut self, entity: T) -> bool {
        self.insert_at(0, entity)
    }

    pub fn push_back(&mut self, entity: T) -> bool {
        let len = self.items.len();
        self.insert_at(len, entity)
    }

    /// Replaces the entity with the same id in place, or inserts it at `index`.
    pub fn upsert_at(&mut self, index: usize, entity: T) {
        match self.position(entity.id()) {
            Some(existing) => self.items[existing] = entity,
            None => {
                let index = index.min(self.items.len());
                self.items.insert(index, entity);
            }
        }
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<(usize, T)> {
        let index = self.position(id)?;
        Some((index, self.items.remove(index)))
    }

    pub fn replace(&mut self, entity: T) -> Option<T> {
        let index = self.position(entity.id())?;
        Some(std::mem::replace(&mut self.items[index], entity))
    }

    pub fn update_with<F>(&mut self, id: &EntityId, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        match self.items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    /// Rewrites only the id of the entity currently known as `from`.
    ///
    /// If an entity with id `to` is already present (for example delivered by a
    /// listener before the create call returned) the placeholder entry is
    /// dropped instead, keeping ids unique.
    pub fn rewrite_id(&mut self, from: &EntityId, to: EntityId) -> bool {
        let Some(index) = self.position(from) else {
            return false;
        };
        if from == &to {
            return true;
        }
        if self.contains(&to) {
            self.items.remove(index);
            return true;
        }
        self.items[index].set_id(to);
        true
    }

    pub fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.items.retain(f);
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub struct Note {
        pub id: EntityId,
        pub body: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Clone)]
    pub struct NotePatch {
        pub body: String,
    }

    impl Note {
        pub fn new(id: &str, body: &str) -> Self {
            let now = Utc::now();
            Self {
                id: EntityId::new(id.to_string()).unwrap(),
                body: body.to_string(),
                created_at: now,
                updated_at: now,
            }
        }
    }

    impl Entity for Note {
        type Patch = NotePatch;
        const KIND: &'static str = "note";

        fn id(&self) -> &EntityId {
            &self.id
        }

        fn set_id(&mut self, id: EntityId) {
            self.id = id;
        }

        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }

        fn updated_at(&self) -> DateTime<Utc> {
            self.updated_at
        }

        fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
            self.created_at = created_at;
            self.updated_at = updated_at;
        }

        fn apply_patch(&mut self, patch: &Self::Patch, now: DateTime<Utc>) {
            self.body = patch.body.clone();
            self.updated_at = now;
        }
    }

    pub fn eid(value: &str) -> EntityId {
        EntityId::new(value.to_string()).unwrap()
    }
}

use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::driver::Driver;
use crate::models::order::Order;

/// Keyed entity store. Mutation goes through [`Store::get_mut`], whose guard
/// serializes concurrent writers of the same entity while leaving other keys
/// untouched (sharded locking, no store-wide lock).
///
/// Lock order: code that needs an order and a driver at the same time must
/// acquire the order guard first, then the driver guard.
pub struct Store<T> {
    inner: DashMap<Uuid, T>,
}

pub type OrderStore = Store<Order>;
pub type DriverStore = Store<Driver>;

impl<T: Clone> Store<T> {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    pub fn insert(&self, id: Uuid, entity: T) {
        self.inner.insert(id, entity);
    }

    /// Point-in-time copy of one entity.
    pub fn get(&self, id: Uuid) -> Option<T> {
        self.inner.get(&id).map(|entry| entry.value().clone())
    }

    /// Exclusive guard over one entity. Blocks only writers of the same
    /// shard, briefly; nothing held across await points.
    pub fn get_mut(&self, id: Uuid) -> Option<RefMut<'_, Uuid, T>> {
        self.inner.get_mut(&id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.inner.contains_key(&id)
    }

    /// Point-in-time copy of all entities, in unspecified order.
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T: Clone> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A row that belongs to exactly one user.
pub trait Record {
    const NAME: &'static str;

    fn id(&self) -> Uuid;
    fn owner(&self) -> Uuid;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// Rows keyed by id. Every accessor takes the caller's user id; rows owned
/// by someone else behave as if they did not exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table<T> {
    rows: BTreeMap<Uuid, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<T: Record + Clone> Table<T> {
    pub fn select<K, F>(&self, owner: Uuid, key: F, order: Order, limit: Option<usize>) -> Vec<T>
    where
        K: Ord,
        F: Fn(&T) -> K,
    {
        let mut rows: Vec<&T> = self.owned_by(owner).collect();
        rows.sort_by(|a, b| match order {
            Order::Asc => key(a).cmp(&key(b)),
            Order::Desc => key(b).cmp(&key(a)),
        });
        rows.into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub fn owned_by(&self, owner: Uuid) -> impl Iterator<Item = &T> {
        self.rows.values().filter(move |row| row.owner() == owner)
    }

    pub fn insert(&mut self, row: T) -> T {
        self.rows.insert(row.id(), row.clone());
        row
    }

    pub fn get(&self, owner: Uuid, id: Uuid) -> Result<&T> {
        self.rows
            .get(&id)
            .filter(|row| row.owner() == owner)
            .ok_or(AppError::NotFound(T::NAME))
    }

    pub fn get_mut(&mut self, owner: Uuid, id: Uuid) -> Result<&mut T> {
        self.rows
            .get_mut(&id)
            .filter(|row| row.owner() == owner)
            .ok_or(AppError::NotFound(T::NAME))
    }

    pub fn delete(&mut self, owner: Uuid, id: Uuid) -> Result<T> {
        self.get(owner, id)?;
        self.rows.remove(&id).ok_or(AppError::NotFound(T::NAME))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

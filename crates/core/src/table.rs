//! Insertion-ordered, keyed record table.

use std::collections::HashMap;

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};

/// In-memory table of entities.
///
/// - Iteration follows insertion order.
/// - Lookups go through a key index, so an id maps to exactly one record.
/// - Records are never removed individually; the whole table can be replaced.
#[derive(Debug, Clone)]
pub struct KeyedTable<E: Entity> {
    rows: Vec<E>,
    index: HashMap<E::Id, usize>,
}

impl<E: Entity> KeyedTable<E> {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a table from records, rejecting duplicate ids.
    pub fn from_records(records: impl IntoIterator<Item = E>) -> DomainResult<Self> {
        let mut table = Self::new();
        for record in records {
            table.insert(record)?;
        }
        Ok(table)
    }

    pub fn get(&self, id: &E::Id) -> Option<&E> {
        self.index.get(id).map(|&pos| &self.rows[pos])
    }

    pub fn get_mut(&mut self, id: &E::Id) -> Option<&mut E> {
        match self.index.get(id) {
            Some(&pos) => self.rows.get_mut(pos),
            None => None,
        }
    }

    pub fn contains(&self, id: &E::Id) -> bool {
        self.index.contains_key(id)
    }

    /// Append a record at the end of the table.
    pub fn insert(&mut self, record: E) -> DomainResult<()> {
        let id = record.id().clone();
        if self.index.contains_key(&id) {
            return Err(DomainError::conflict(format!("duplicate key {id}")));
        }
        self.index.insert(id, self.rows.len());
        self.rows.push(record);
        Ok(())
    }

    /// Swap in a new set of records. On error the current contents are kept.
    pub fn replace_all(&mut self, records: impl IntoIterator<Item = E>) -> DomainResult<()> {
        *self = Self::from_records(records)?;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.rows.iter()
    }

    pub fn as_slice(&self) -> &[E] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<E: Entity> Default for KeyedTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity + PartialEq> PartialEq for KeyedTable<E> {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
    }
}

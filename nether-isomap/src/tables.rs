//! First-seen dedup tables used by the partition encoders

use hashbrown::HashMap;
use std::hash::Hash;

use crate::error::{MapError, Result};

/// Table holding each distinct key once, indexed in first-seen order
#[derive(Debug)]
pub(crate) struct DedupTable<K, V> {
    entries: Vec<V>,
    index: HashMap<K, usize>,
}

impl<K: Hash + Eq, V> DedupTable<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add `value` under `key` unless the key is already present; returns its index
    pub fn insert(&mut self, key: K, value: V) -> usize {
        let next = self.entries.len();
        let index = *self.index.entry(key).or_insert(next);
        if index == next {
            self.entries.push(value);
        }
        index
    }

    pub fn index_of(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn entries(&self) -> &[V] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K: Hash + Eq, V: Copy + Default> DedupTable<K, V> {
    /// Entries as a fixed-size table, padded with defaults
    pub fn to_array<const N: usize>(&self, field: &'static str) -> Result<[V; N]> {
        if self.entries.len() > N {
            return Err(MapError::out_of_range(field, self.entries.len() as i64));
        }
        let mut table = [V::default(); N];
        table[..self.entries.len()].copy_from_slice(&self.entries);
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_order() {
        let mut table = DedupTable::new();
        assert_eq!(table.insert("b", 2), 0);
        assert_eq!(table.insert("a", 1), 1);
        assert_eq!(table.insert("b", 99), 0);
        assert_eq!(table.entries(), &[2, 1]);
        assert_eq!(table.index_of(&"a"), Some(1));
        assert_eq!(table.index_of(&"c"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_to_array_pads_and_limits() {
        let mut table = DedupTable::new();
        table.insert(5i16, 5i16);
        table.insert(-3, -3);
        assert_eq!(table.to_array::<4>("levels").unwrap(), [5, -3, 0, 0]);
        assert!(table.to_array::<1>("levels").is_err());
    }
}

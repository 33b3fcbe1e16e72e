//! Element asset records, looked up by id during decoding

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Shared asset record of an element (image size and anchor)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementData {
    pub id: i32,
    /// Anchor of the image relative to the cell's screen position
    #[serde(default)]
    pub origin_x: i16,
    #[serde(default)]
    pub origin_y: i16,
    #[serde(default)]
    pub img_width: u16,
    #[serde(default)]
    pub img_height: u16,
    #[serde(default)]
    pub gfx_id: i32,
    #[serde(default)]
    pub visual_height: u8,
    #[serde(default)]
    pub flags: u8,
}

impl ElementData {
    /// Zero-sized stand-in for an id the registry does not know
    pub fn placeholder(id: i32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

/// Registry of element asset records.
///
/// Passed explicitly into decoding. Safe to share between threads decoding
/// different partitions; placeholder insertion is the only write.
#[derive(Debug, Default)]
pub struct ElementRegistry {
    entries: RwLock<HashMap<i32, Arc<ElementData>>>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of records (later duplicates win)
    pub fn from_entries(entries: impl IntoIterator<Item = ElementData>) -> Self {
        let map = entries
            .into_iter()
            .map(|data| (data.id, Arc::new(data)))
            .collect();
        Self {
            entries: RwLock::new(map),
        }
    }

    /// Insert or replace a record
    pub fn insert(&self, data: ElementData) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(data.id, Arc::new(data));
    }

    pub fn get(&self, id: i32) -> Option<Arc<ElementData>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&id).cloned()
    }

    /// Look up a record, registering a placeholder if the id is unknown
    pub fn get_or_placeholder(&self, id: i32) -> Arc<ElementData> {
        if let Some(data) = self.get(id) {
            return data;
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(id)
            .or_insert_with(|| {
                tracing::warn!(element_id = id, "unknown element data, using placeholder");
                Arc::new(ElementData::placeholder(id))
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

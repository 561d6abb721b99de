use chrono::{DateTime, Utc};

use crate::types::PageIndex;

/// One page of the logical array held in memory. Pure value object: all
/// I/O happens in the paged file, all replacement decisions in the
/// storage manager.
pub struct Page {
    pub page_index: PageIndex,
    /// One flag per slot, true iff the slot was ever explicitly written.
    /// Authoritative for write-back: absent slots serialize as zero bytes.
    pub presence: Vec<bool>,
    /// Decoded values, one per slot. Unwritten slots read as 0 since the
    /// file is zero-filled at creation.
    pub elements: Vec<i64>,
    pub is_dirty: bool,
    /// Captured when the page was loaded, never updated on access.
    pub loaded_at: DateTime<Utc>,
}

impl Page {
    pub fn create(page_index: PageIndex, presence: Vec<bool>, elements: Vec<i64>) -> Self {
        Self {
            page_index,
            presence,
            elements,
            is_dirty: false,
            loaded_at: Utc::now(),
        }
    }

    /// Caller guarantees `local_index < elements.len()`.
    pub fn read_element(&self, local_index: usize) -> i64 {
        self.elements[local_index]
    }

    pub fn write_element(&mut self, local_index: usize, value: i64) {
        self.elements[local_index] = value;
        self.presence[local_index] = true;
        self.is_dirty = true;
    }
}

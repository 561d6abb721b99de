use std::path::Path;

use chrono::{DateTime, Utc};

use crate::{
    storage::paged_file::PagedFile,
    types::{
        PageIndex,
        element::ElementKind,
        error::{Result, StorageError},
        page::Page,
    },
};

/// The public face of the engine: a fixed-size array of fixed-width
/// integers addressed by element index, with a bounded set of resident
/// pages and write-back on replacement.
///
/// The cache is a fixed array of nullable slots, scanned in order. The
/// victim policy is: first free slot, else first clean page, else the
/// page with the earliest load time (ties fall to the lowest slot).
/// Note the last step orders by load time, not last access, so this is
/// not an LRU: a page loaded long ago but read every cycle still loses
/// to one loaded recently and never touched since.
pub struct StorageManager {
    element_count: u64,
    cache_capacity: usize,
    file: Option<PagedFile>,
    slots: Vec<Option<Page>>,
}

impl StorageManager {
    pub fn open<P: AsRef<Path>>(
        path: P,
        element_kind: ElementKind,
        element_count: u64,
        cache_capacity: usize,
        page_byte_capacity: usize,
    ) -> Result<Self> {
        if element_count == 0 {
            return Err(StorageError::InvalidConfig {
                reason: "element count must be greater than zero".to_string(),
            });
        }
        if cache_capacity == 0 {
            return Err(StorageError::InvalidConfig {
                reason: "cache capacity must be greater than zero".to_string(),
            });
        }
        if page_byte_capacity < element_kind.width() {
            return Err(StorageError::InvalidConfig {
                reason: format!(
                    "page byte capacity {} is smaller than the element width {}",
                    page_byte_capacity,
                    element_kind.width()
                ),
            });
        }

        let file = PagedFile::open_or_create(path, element_kind, element_count, page_byte_capacity)?;
        let mut slots = Vec::with_capacity(cache_capacity);
        slots.resize_with(cache_capacity, || None);
        Ok(Self {
            element_count,
            cache_capacity,
            file: Some(file),
            slots,
        })
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn element_count(&self) -> u64 {
        self.element_count
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    pub fn read_element(&mut self, index: i64) -> Result<i64> {
        let (page_index, local_index) = self.locate(index)?;
        let slot = self.resolve_page(page_index)?;
        match &self.slots[slot] {
            Some(page) => Ok(page.read_element(local_index)),
            None => Err(StorageError::Internal {
                details: format!("resolved slot {} holds no page", slot),
            }),
        }
    }

    /// Writes go through the same residency path as reads: the element is
    /// read first to force its page into the cache (evicting if needed),
    /// then the now-resident page is mutated in memory. The disk write is
    /// deferred until eviction, flush, or close.
    pub fn write_element(&mut self, index: i64, value: i64) -> Result<()> {
        let (page_index, local_index) = self.locate(index)?;
        self.read_element(index)?;

        let mut resident_slot = None;
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(page) = slot {
                if page.page_index == page_index {
                    resident_slot = Some(i);
                }
            }
        }
        match resident_slot {
            Some(i) => {
                if let Some(page) = self.slots[i].as_mut() {
                    page.write_element(local_index, value);
                }
                Ok(())
            }
            None => Err(StorageError::Internal {
                details: format!("page {} not resident after forced read", page_index),
            }),
        }
    }

    /// Write every resident page to disk, dirty or not, without evicting
    /// anything. Pages are clean afterwards.
    pub fn flush(&mut self) -> Result<()> {
        let file = self.file.as_mut().ok_or(StorageError::AlreadyClosed)?;
        for slot in self.slots.iter_mut() {
            if let Some(page) = slot {
                file.write_page(page)?;
                page.is_dirty = false;
            }
        }
        Ok(())
    }

    /// Flush all resident pages and release the file handle. Every later
    /// operation on this instance fails with `AlreadyClosed`.
    pub fn close(&mut self) -> Result<()> {
        self.flush()?;
        self.file = None; // dropping the handle closes it
        Ok(())
    }

    fn locate(&self, index: i64) -> Result<(PageIndex, usize)> {
        let file = self.file.as_ref().ok_or(StorageError::AlreadyClosed)?;
        if index < 0 || index as u64 >= self.element_count {
            return Err(StorageError::IndexOutOfRange {
                index,
                size: self.element_count,
            });
        }
        let elements_per_page = file.elements_per_page() as u64;
        let page_index = index as u64 / elements_per_page;
        let local_index = (index as u64 - page_index * elements_per_page) as usize;
        Ok((page_index, local_index))
    }

    // Returns the cache slot holding the target page, loading it from
    // disk (and evicting a victim, writing it back first if dirty) on a
    // miss.
    fn resolve_page(&mut self, page_index: PageIndex) -> Result<usize> {
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(page) = slot {
                if page.page_index == page_index {
                    return Ok(i);
                }
            }
        }

        let victim = self.choose_victim();
        let file = self.file.as_mut().ok_or(StorageError::AlreadyClosed)?;
        if let Some(page) = &self.slots[victim] {
            if page.is_dirty {
                file.write_page(page)?;
            }
        }
        let page = file.read_page(page_index)?;
        self.slots[victim] = Some(page);
        Ok(victim)
    }

    fn choose_victim(&self) -> usize {
        if let Some(i) = self.slots.iter().position(|slot| slot.is_none()) {
            return i;
        }
        if let Some(i) = self
            .slots
            .iter()
            .position(|slot| matches!(slot, Some(page) if !page.is_dirty))
        {
            return i;
        }
        self.earliest_loaded_slot()
    }

    // All slots are occupied here. Strict less-than while scanning in
    // ascending order breaks loaded_at ties toward the lowest slot.
    fn earliest_loaded_slot(&self) -> usize {
        let mut victim = 0;
        let mut earliest: Option<DateTime<Utc>> = None;
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(page) = slot {
                if earliest.is_none_or(|t| page.loaded_at < t) {
                    victim = i;
                    earliest = Some(page.loaded_at);
                }
            }
        }
        victim
    }
}

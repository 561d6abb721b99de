use std::{
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use tempfile::env::temp_dir;

use crate::{storage::storage_manager::StorageManager, types::element::ElementKind};

pub fn get_unix_timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis()
}

pub fn create_temp_storage_path() -> PathBuf {
    let mut temp_path = temp_dir();
    temp_path.push(format!("lembar_test_{}.dat", get_unix_timestamp_millis()));
    temp_path
}

pub fn create_temp_storage_path_with_prefix(prefix: &str) -> PathBuf {
    let mut temp_path = temp_dir();
    temp_path.push(format!("{}_{}.dat", prefix, get_unix_timestamp_millis()));
    temp_path
}

pub struct TempStorage {
    pub path: PathBuf,
    pub storage: Option<StorageManager>,
}

impl TempStorage {
    pub fn new() -> Self {
        Self {
            path: create_temp_storage_path(),
            storage: None,
        }
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            path: create_temp_storage_path_with_prefix(prefix),
            storage: None,
        }
    }

    pub fn open_storage(
        &mut self,
        element_kind: ElementKind,
        element_count: u64,
        cache_capacity: usize,
        page_byte_capacity: usize,
    ) -> Result<&mut StorageManager, Box<dyn std::error::Error>> {
        let storage = StorageManager::open(
            &self.path,
            element_kind,
            element_count,
            cache_capacity,
            page_byte_capacity,
        )?;
        self.storage = Some(storage);
        Ok(self.storage.as_mut().unwrap())
    }

    pub fn get_storage(&mut self) -> Option<&mut StorageManager> {
        self.storage.as_mut()
    }
}

impl Default for TempStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempStorage {
    fn drop(&mut self) {
        if let Some(mut storage) = self.storage.take() {
            if storage.is_open() {
                let _ = storage.close();
            }
        }
        if self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

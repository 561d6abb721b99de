use thiserror::Error;

use crate::types::PageIndex;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error while {operation} page {page_index}: {source}")]
    PageIo {
        operation: &'static str,
        page_index: PageIndex,
        source: std::io::Error,
    },

    #[error("Invalid paging file: {reason}")]
    InvalidFormat { reason: String },

    #[error("Invalid storage configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Element index {index} out of range (size: {size})")]
    IndexOutOfRange { index: i64, size: u64 },

    #[error("Storage is already closed")]
    AlreadyClosed,

    #[error("Unsupported element width: {width} bytes")]
    UnsupportedWidth { width: usize },

    #[error("Internal consistency error: {details}")]
    Internal { details: String },
}

pub type Result<T> = std::result::Result<T, StorageError>;

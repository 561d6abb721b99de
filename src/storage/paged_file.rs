use std::{
    fs::{File, OpenOptions},
    io::{ErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use crate::{
    storage::{VM_SIGNATURE, VM_SIGNATURE_LEN},
    types::{
        BITS_PER_BYTE, PageIndex,
        element::ElementKind,
        error::{Result, StorageError},
        page::Page,
    },
};

/*
 * Paging File Layout on Disk
 * ┌─────────────────────────────────────────────────────────────────┐
 * │ signature "VM" (2 bytes)                                        │
 * ├─────────────────────────────────────────────────────────────────┤
 * │ page record 0 (R = bitmap_bytes + elements_per_page * width)    │
 * │   bitmap_bytes bytes: presence bitmap,                          │
 * │                       bit p of byte i = presence[i*8 + p]       │
 * │   elements_per_page * width bytes: elements in slot order,      │
 * │                       little-endian; absent slots are all zero  │
 * ├─────────────────────────────────────────────────────────────────┤
 * │ page record 1 ...                                               │
 * └─────────────────────────────────────────────────────────────────┘
 * Total length is exactly 2 + page_count * R; anything else is a
 * format error on open.
 */

pub struct PagedFile {
    pub path: PathBuf,
    file: File,
    element_kind: ElementKind,
    element_count: u64,
    page_byte_capacity: usize,
}

impl PagedFile {
    /// Open an existing paging file after validating its signature and
    /// length against the configured geometry, or create and zero-fill a
    /// new one.
    pub fn open_or_create<P: AsRef<Path>>(
        path: P,
        element_kind: ElementKind,
        element_count: u64,
        page_byte_capacity: usize,
    ) -> Result<Self> {
        let path = path.as_ref();
        let already_exists = path.exists();
        let mut paged_file = Self {
            path: path.to_path_buf(),
            file: OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .open(path)?,
            element_kind,
            element_count,
            page_byte_capacity,
        };

        if already_exists {
            let file_len = paged_file.file.metadata()?.len();
            paged_file.check_signature()?;
            paged_file.check_length(file_len)?;
            paged_file.file.seek(SeekFrom::Start(0))?;
        } else {
            paged_file.init_new_file()?;
        }
        Ok(paged_file)
    }

    pub fn elements_per_page(&self) -> usize {
        self.page_byte_capacity / self.element_kind.width()
    }

    pub fn page_count(&self) -> u64 {
        self.element_count.div_ceil(self.elements_per_page() as u64)
    }

    pub fn bitmap_bytes(&self) -> usize {
        self.elements_per_page().div_ceil(BITS_PER_BYTE)
    }

    pub fn page_record_bytes(&self) -> usize {
        self.bitmap_bytes() + self.elements_per_page() * self.element_kind.width()
    }

    pub fn expected_file_len(&self) -> u64 {
        VM_SIGNATURE_LEN as u64 + self.page_count() * self.page_record_bytes() as u64
    }

    // The one place page geometry turns into a byte offset.
    fn page_offset(&self, page_index: PageIndex) -> u64 {
        VM_SIGNATURE_LEN as u64 + page_index * self.page_record_bytes() as u64
    }

    fn init_new_file(&mut self) -> Result<()> {
        self.file.write_all(VM_SIGNATURE)?;
        let empty_record = vec![0u8; self.page_record_bytes()];
        for _ in 0..self.page_count() {
            self.file.write_all(&empty_record)?;
        }
        self.file.flush()?;
        self.file.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    fn check_signature(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut signature = [0u8; VM_SIGNATURE_LEN];
        match self.file.read_exact(&mut signature) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                return Err(StorageError::InvalidFormat {
                    reason: "file too short to contain the \"VM\" signature".to_string(),
                });
            }
            Err(e) => return Err(StorageError::Io(e)),
        }
        if &signature != VM_SIGNATURE {
            return Err(StorageError::InvalidFormat {
                reason: format!(
                    "expected signature \"VM\", found bytes {:?}",
                    signature
                ),
            });
        }
        Ok(())
    }

    fn check_length(&self, actual_len: u64) -> Result<()> {
        let expected_len = self.expected_file_len();
        if actual_len != expected_len {
            return Err(StorageError::InvalidFormat {
                reason: format!(
                    "file length {} bytes does not match expected length {} bytes",
                    actual_len, expected_len
                ),
            });
        }
        Ok(())
    }

    /// Read one page record into a fresh in-memory `Page`. Failures are
    /// surfaced with the page index attached and are not retried here.
    pub fn read_page(&mut self, page_index: PageIndex) -> Result<Page> {
        let offset = self.page_offset(page_index);
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|source| StorageError::PageIo {
                operation: "seeking to",
                page_index,
                source,
            })?;

        let mut bitmap_buffer = vec![0u8; self.bitmap_bytes()];
        self.file
            .read_exact(&mut bitmap_buffer)
            .map_err(|source| StorageError::PageIo {
                operation: "reading bitmap of",
                page_index,
                source,
            })?;
        let presence = self.unpack_bitmap(&bitmap_buffer);

        let width = self.element_kind.width();
        let mut element_buffer = vec![0u8; self.elements_per_page() * width];
        self.file
            .read_exact(&mut element_buffer)
            .map_err(|source| StorageError::PageIo {
                operation: "reading elements of",
                page_index,
                source,
            })?;
        let elements = element_buffer
            .chunks_exact(width)
            .map(|chunk| self.element_kind.decode(chunk))
            .collect();

        Ok(Page::create(page_index, presence, elements))
    }

    /// Write a page record back to its slot in the file. Slots whose
    /// presence bit is false are written as zero bytes regardless of the
    /// in-memory element value, so disk never holds stale data for an
    /// unwritten slot.
    pub fn write_page(&mut self, page: &Page) -> Result<()> {
        let page_index = page.page_index;
        let offset = self.page_offset(page_index);
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|source| StorageError::PageIo {
                operation: "seeking to",
                page_index,
                source,
            })?;

        let mut record = Vec::with_capacity(self.page_record_bytes());
        record.extend_from_slice(&self.pack_bitmap(&page.presence));

        let zeroes = vec![0u8; self.element_kind.width()];
        for i in 0..self.elements_per_page() {
            if page.presence.get(i).copied().unwrap_or(false) {
                record.extend_from_slice(&self.element_kind.encode(page.elements[i]));
            } else {
                record.extend_from_slice(&zeroes);
            }
        }

        self.file
            .write_all(&record)
            .map_err(|source| StorageError::PageIo {
                operation: "writing",
                page_index,
                source,
            })?;
        self.file.flush().map_err(|source| StorageError::PageIo {
            operation: "flushing",
            page_index,
            source,
        })?;
        Ok(())
    }

    // Bit p of byte i maps to presence slot i*8 + p.
    fn unpack_bitmap(&self, bytes: &[u8]) -> Vec<bool> {
        let mut presence = vec![false; self.elements_per_page()];
        for (i, byte) in bytes.iter().enumerate() {
            for p in 0..BITS_PER_BYTE {
                let slot = i * BITS_PER_BYTE + p;
                if slot >= presence.len() {
                    break;
                }
                presence[slot] = (byte >> p) & 1 == 1;
            }
        }
        presence
    }

    fn pack_bitmap(&self, presence: &[bool]) -> Vec<u8> {
        let mut bytes = vec![0u8; self.bitmap_bytes()];
        for (slot, set) in presence.iter().enumerate() {
            if *set {
                bytes[slot / BITS_PER_BYTE] |= 1 << (slot % BITS_PER_BYTE);
            }
        }
        bytes
    }
}

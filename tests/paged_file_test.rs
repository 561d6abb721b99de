use std::fs;

use lembar::{
    storage::paged_file::PagedFile,
    types::{element::ElementKind, error::StorageError, page::Page},
    utils::mock::create_temp_storage_path_with_prefix,
};

// The worked scenario: 4-byte elements, 16-byte pages -> 4 elements per
// page with a 1-byte bitmap; 10 elements -> 3 pages; total length
// 2 + 3 * (1 + 16) = 53 bytes.
#[test]
fn test_new_file_geometry_and_length() {
    let path = create_temp_storage_path_with_prefix("geometry_test");
    let file = PagedFile::open_or_create(&path, ElementKind::Int32, 10, 16).unwrap();

    assert_eq!(file.elements_per_page(), 4);
    assert_eq!(file.bitmap_bytes(), 1);
    assert_eq!(file.page_count(), 3);
    assert_eq!(file.page_record_bytes(), 17);
    assert_eq!(file.expected_file_len(), 53);

    let metadata = fs::metadata(&path).unwrap();
    assert_eq!(metadata.len(), 53);

    drop(file);
    let _ = fs::remove_file(&path);
}

#[test]
fn test_new_file_starts_with_signature_and_zeroes() {
    let path = create_temp_storage_path_with_prefix("signature_test");
    let file = PagedFile::open_or_create(&path, ElementKind::Int32, 10, 16).unwrap();
    drop(file);

    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[0..2], b"VM");
    assert!(bytes[2..].iter().all(|b| *b == 0));

    let _ = fs::remove_file(&path);
}

#[test]
fn test_reopen_existing_file_validates() {
    let path = create_temp_storage_path_with_prefix("reopen_test");
    {
        let _ = PagedFile::open_or_create(&path, ElementKind::Int16, 100, 64).unwrap();
    }
    let file = PagedFile::open_or_create(&path, ElementKind::Int16, 100, 64).unwrap();
    assert_eq!(file.elements_per_page(), 32);
    drop(file);
    let _ = fs::remove_file(&path);
}

#[test]
fn test_bad_signature_rejected() {
    let path = create_temp_storage_path_with_prefix("bad_signature_test");
    {
        let _ = PagedFile::open_or_create(&path, ElementKind::Int32, 10, 16).unwrap();
    }
    let mut bytes = fs::read(&path).unwrap();
    bytes[0] = b'X';
    fs::write(&path, &bytes).unwrap();

    let result = PagedFile::open_or_create(&path, ElementKind::Int32, 10, 16);
    assert!(matches!(result, Err(StorageError::InvalidFormat { .. })));

    let _ = fs::remove_file(&path);
}

#[test]
fn test_file_shorter_than_signature_rejected() {
    let path = create_temp_storage_path_with_prefix("short_file_test");
    fs::write(&path, b"V").unwrap();

    let result = PagedFile::open_or_create(&path, ElementKind::Int32, 10, 16);
    assert!(matches!(result, Err(StorageError::InvalidFormat { .. })));

    let _ = fs::remove_file(&path);
}

#[test]
fn test_truncated_file_rejected() {
    let path = create_temp_storage_path_with_prefix("truncated_test");
    {
        let _ = PagedFile::open_or_create(&path, ElementKind::Int32, 10, 16).unwrap();
    }
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 1]).unwrap();

    let result = PagedFile::open_or_create(&path, ElementKind::Int32, 10, 16);
    assert!(matches!(result, Err(StorageError::InvalidFormat { .. })));

    let _ = fs::remove_file(&path);
}

#[test]
fn test_length_mismatch_on_different_configuration() {
    let path = create_temp_storage_path_with_prefix("config_mismatch_test");
    {
        let _ = PagedFile::open_or_create(&path, ElementKind::Int32, 10, 16).unwrap();
    }
    // Same file, larger array: the derived length no longer matches.
    let result = PagedFile::open_or_create(&path, ElementKind::Int32, 1000, 16);
    assert!(matches!(result, Err(StorageError::InvalidFormat { .. })));

    let _ = fs::remove_file(&path);
}

#[test]
fn test_page_write_read_round_trip() {
    let path = create_temp_storage_path_with_prefix("page_round_trip_test");
    let mut file = PagedFile::open_or_create(&path, ElementKind::Int32, 10, 16).unwrap();

    let mut page = file.read_page(1).unwrap();
    page.write_element(0, -5);
    page.write_element(3, 123456);
    file.write_page(&page).unwrap();

    let reloaded = file.read_page(1).unwrap();
    assert_eq!(reloaded.page_index, 1);
    assert_eq!(reloaded.elements, vec![-5, 0, 0, 123456]);
    assert_eq!(reloaded.presence, vec![true, false, false, true]);
    assert!(!reloaded.is_dirty);

    // Neighbouring pages are untouched.
    let other = file.read_page(0).unwrap();
    assert_eq!(other.elements, vec![0; 4]);
    assert_eq!(other.presence, vec![false; 4]);

    drop(file);
    let _ = fs::remove_file(&path);
}

#[test]
fn test_bitmap_bit_layout_is_lsb_first() {
    let path = create_temp_storage_path_with_prefix("bitmap_layout_test");
    let mut file = PagedFile::open_or_create(&path, ElementKind::Int32, 10, 16).unwrap();

    let mut page = file.read_page(0).unwrap();
    page.write_element(0, 1);
    page.write_element(2, 1);
    file.write_page(&page).unwrap();
    drop(file);

    let bytes = fs::read(&path).unwrap();
    // Page record 0 starts right after the signature; slots 0 and 2 set
    // bits 0 and 2 of the first bitmap byte.
    assert_eq!(bytes[2], 0b0000_0101);

    let _ = fs::remove_file(&path);
}

#[test]
fn test_absent_slots_serialize_as_zero_even_with_stale_values() {
    let path = create_temp_storage_path_with_prefix("presence_gating_test");
    let mut file = PagedFile::open_or_create(&path, ElementKind::Int32, 10, 16).unwrap();

    // A page whose elements hold non-zero values that were never marked
    // present must hit the disk as zero bytes.
    let page = Page::create(2, vec![false, true, false, false], vec![77, 88, 99, 11]);
    file.write_page(&page).unwrap();

    let reloaded = file.read_page(2).unwrap();
    assert_eq!(reloaded.elements, vec![0, 88, 0, 0]);
    assert_eq!(reloaded.presence, vec![false, true, false, false]);

    drop(file);
    let _ = fs::remove_file(&path);
}

#[test]
fn test_int8_geometry_uses_full_page() {
    let path = create_temp_storage_path_with_prefix("int8_geometry_test");
    let file = PagedFile::open_or_create(&path, ElementKind::Int8, 100, 16).unwrap();

    assert_eq!(file.elements_per_page(), 16);
    assert_eq!(file.bitmap_bytes(), 2);
    assert_eq!(file.page_count(), 7);
    assert_eq!(file.expected_file_len(), 2 + 7 * (2 + 16));

    drop(file);
    let _ = fs::remove_file(&path);
}

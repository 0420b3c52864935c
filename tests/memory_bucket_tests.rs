//! Tests for MemoryBucket and the Listing iterator
//!
//! These tests verify:
//! - Reader/writer/delete semantics of the capability interface
//! - Listing by prefix and half-open range
//! - Page tokens and page sizes
//! - Listing iterator error handling

mod common;

use std::io::{Read, Write};

use bucketkv::backend::{
    BackendError, ListQuery, Listing, MemoryBucket, ObjectBackend, ObjectInfo,
};
use common::FlakyBucket;

// =============================================================================
// Helper Functions
// =============================================================================

fn bucket_with(names: &[&str]) -> MemoryBucket {
    let bucket = MemoryBucket::new();
    for name in names {
        put(&bucket, name, name.as_bytes());
    }
    bucket
}

fn put(bucket: &MemoryBucket, name: &str, data: &[u8]) {
    let mut writer = bucket.open_writer(name).unwrap();
    writer.write_all(data).unwrap();
    writer.commit().unwrap();
}

fn names(objects: &[ObjectInfo]) -> Vec<&str> {
    objects.iter().map(|o| o.name.as_str()).collect()
}

// =============================================================================
// Object Tests
// =============================================================================

#[test]
fn test_reader_declares_size() {
    let bucket = bucket_with(&[]);
    put(&bucket, "obj", b"12345");

    let mut reader = bucket.open_reader("obj").unwrap();
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();

    assert_eq!(reader.declared_size(), 5);
    assert_eq!(out, b"12345");
}

#[test]
fn test_open_reader_missing() {
    let bucket = MemoryBucket::new();

    assert!(matches!(
        bucket.open_reader("nope"),
        Err(BackendError::NotFound(_))
    ));
}

#[test]
fn test_uncommitted_writer_is_invisible() {
    let bucket = MemoryBucket::new();

    {
        let mut writer = bucket.open_writer("obj").unwrap();
        writer.write_all(b"data").unwrap();
        assert!(!bucket.contains("obj"));
    }

    assert!(!bucket.contains("obj"));
}

#[test]
fn test_commit_replaces_object() {
    let bucket = MemoryBucket::new();
    put(&bucket, "obj", b"old");

    let mut reader = bucket.open_reader("obj").unwrap();
    put(&bucket, "obj", b"newer");

    // Reader opened before the replace keeps the old content
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    assert_eq!(out, b"old");

    let mut out = Vec::new();
    bucket.open_reader("obj").unwrap().read_to_end(&mut out).unwrap();
    assert_eq!(out, b"newer");
}

#[test]
fn test_delete_missing_is_not_found() {
    let bucket = bucket_with(&["a"]);

    bucket.delete_object("a").unwrap();

    assert!(matches!(
        bucket.delete_object("a"),
        Err(BackendError::NotFound(_))
    ));
    assert!(bucket.is_empty());
}

// =============================================================================
// Listing Tests
// =============================================================================

#[test]
fn test_list_by_prefix() {
    let bucket = bucket_with(&["a/1", "a/2", "ab", "b/1", "a"]);

    let page = bucket
        .list_objects(&ListQuery::with_prefix("a/"), None, 100)
        .unwrap();

    assert_eq!(names(&page.objects), vec!["a/1", "a/2"]);
    assert!(page.next_page_token.is_none());
}

#[test]
fn test_list_range_is_half_open() {
    let bucket = bucket_with(&["k/10", "k/11", "k/15", "k/19", "k/20", "k/21"]);
    let query = ListQuery {
        prefix: Some("k/".to_string()),
        start_offset: Some("k/11".to_string()),
        end_offset: Some("k/20".to_string()),
        names_only: false,
    };

    let page = bucket.list_objects(&query, None, 100).unwrap();

    assert_eq!(names(&page.objects), vec!["k/11", "k/15", "k/19"]);
    assert_eq!(page.objects[0].size, 4);
}

#[test]
fn test_list_names_only_reports_zero_size() {
    let bucket = bucket_with(&["x"]);
    let query = ListQuery {
        names_only: true,
        ..ListQuery::default()
    };

    let page = bucket.list_objects(&query, None, 10).unwrap();

    assert_eq!(page.objects, vec![ObjectInfo { name: "x".to_string(), size: 0 }]);
}

#[test]
fn test_list_pages_with_tokens() {
    let bucket = bucket_with(&["a", "b", "c", "d", "e"]);
    let query = ListQuery::default();

    let first = bucket.list_objects(&query, None, 2).unwrap();
    assert_eq!(names(&first.objects), vec!["a", "b"]);
    assert_eq!(first.next_page_token.as_deref(), Some("b"));

    let second = bucket
        .list_objects(&query, first.next_page_token.as_deref(), 2)
        .unwrap();
    assert_eq!(names(&second.objects), vec!["c", "d"]);

    let third = bucket
        .list_objects(&query, second.next_page_token.as_deref(), 2)
        .unwrap();
    assert_eq!(names(&third.objects), vec!["e"]);
    assert!(third.next_page_token.is_none());
}

#[test]
fn test_exact_page_fit_has_no_trailing_token() {
    let bucket = bucket_with(&["a", "b"]);

    let page = bucket.list_objects(&ListQuery::default(), None, 2).unwrap();

    assert_eq!(page.objects.len(), 2);
    assert!(page.next_page_token.is_none());
}

#[test]
fn test_start_offset_before_prefix() {
    let bucket = bucket_with(&["a/1", "b/1", "b/2"]);
    let query = ListQuery {
        prefix: Some("b/".to_string()),
        start_offset: Some("a".to_string()),
        ..ListQuery::default()
    };

    let page = bucket.list_objects(&query, None, 10).unwrap();

    assert_eq!(names(&page.objects), vec!["b/1", "b/2"]);
}

// =============================================================================
// Listing Iterator Tests
// =============================================================================

#[test]
fn test_listing_walks_all_pages() {
    let bucket = bucket_with(&["p/1", "p/2", "p/3", "p/4", "p/5", "q/1"]);

    let mut listing = Listing::new(&bucket, ListQuery::with_prefix("p/"), 2);
    let collected: Vec<String> = listing.by_ref().map(|o| o.unwrap().name).collect();

    assert_eq!(collected, vec!["p/1", "p/2", "p/3", "p/4", "p/5"]);
    assert_eq!(listing.pages_fetched(), 3);
}

#[test]
fn test_listing_empty() {
    let bucket = MemoryBucket::new();

    let mut listing = Listing::new(&bucket, ListQuery::default(), 10);

    assert!(listing.next().is_none());
    assert_eq!(listing.pages_fetched(), 1);
}

#[test]
fn test_listing_stops_after_error() {
    let flaky = FlakyBucket {
        fail_list_on_call: Some(2),
        ..FlakyBucket::new(bucket_with(&["a", "b", "c"]))
    };

    let results: Vec<_> = Listing::new(&flaky, ListQuery::default(), 1).collect();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap().name, "a");
    assert!(matches!(results[1], Err(BackendError::Unavailable(_))));
}

//! Test data factories for truetrace types
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use truetrace::types::{Draft, ImagePayload, Location, Submission};

/// Smallest byte string accepted as a JPEG
pub const JPEG_BYTES: [u8; 8] = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];

/// A minimal JPEG payload
pub fn make_image() -> ImagePayload {
    ImagePayload::from_bytes(JPEG_BYTES.to_vec()).unwrap()
}

/// A complete draft for `engineer`
pub fn make_draft(engineer: &str) -> Draft {
    Draft::new(engineer, Some(make_image()))
}

/// A complete draft with a GPS fix
pub fn make_draft_with_location(engineer: &str) -> Draft {
    make_draft(engineer).with_location(Location::new(37.7749, -122.4194).unwrap())
}

/// A submission already parked in the pending queue
pub fn make_queued(engineer: &str) -> Submission {
    let mut submission = make_draft(engineer).into_submission().unwrap();
    submission.mark_queued().unwrap();
    submission
}

/// Engineer ids of a queue, in order
pub fn engineers(queue: &[Submission]) -> Vec<String> {
    queue.iter().map(|s| s.engineer_id().to_string()).collect()
}

/// Write a minimal JPEG to `path`
pub fn write_photo(path: &std::path::Path) {
    std::fs::write(path, JPEG_BYTES).unwrap();
}

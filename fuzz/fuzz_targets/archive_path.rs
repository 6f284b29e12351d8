//! Fuzz target for ArchivePath::new with arbitrary string input.
//!
//! Entry names come straight from archive central directories, so the
//! normalization must hold for any input.
//!
//! Run with: cargo +nightly fuzz run archive_path
//!
//! Checked for every accepted path:
//! - no `.`, `..` or empty segments
//! - not rooted, `/`-separated
//! - the filesystem mapping stays below its root

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::{Component, Path};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(path) = persistence_patcher::ArchivePath::new(raw) else {
        return;
    };
    let normalized = path.as_str();

    assert!(!normalized.starts_with('/'), "rooted path accepted: {:?}", normalized);
    assert!(!normalized.contains('\\'), "backslash kept: {:?}", normalized);
    assert!(!normalized.contains('\0'), "NUL byte kept: {:?}", normalized);
    for segment in normalized.split('/') {
        assert!(
            !matches!(segment, "" | "." | ".."),
            "bad segment {:?} in {:?}",
            segment,
            normalized
        );
    }

    let root = Path::new("/fuzz-root");
    let mapped = path.to_fs_path(root);
    assert!(mapped.starts_with(root), "{:?} escapes the root", mapped);
    assert!(
        mapped
            .strip_prefix(root)
            .map(|rest| rest.components().all(|c| matches!(c, Component::Normal(_))))
            .unwrap_or(false),
        "{:?} has non-normal components",
        mapped
    );
});

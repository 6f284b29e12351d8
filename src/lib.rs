//! # persistence-patcher
//!
//! Rewrites the properties of JPA `persistence.xml` descriptors inside
//! packaged `jar`, `war` and `ear` archives.
//!
//! Given a deployment artifact and a set of property overrides, the crate
//! locates every descriptor in the artifact (including inside the jars and
//! wars of an ear), detects its schema version, merges the overrides into
//! each persistence unit and writes a patched copy of the artifact. Every
//! other archive entry is carried over byte for byte.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use persistence_patcher::{OverrideSet, RebuildRequest, Result, rebuild};
//!
//! fn main() -> Result<()> {
//!     let overrides = OverrideSet::from_properties_file("prod.properties")?;
//!     let request = RebuildRequest::new(
//!         "target/shop.ear",     // artifact
//!         "ear",                 // packaging
//!         "target",              // work directory
//!         "shop-prod.ear",       // output name
//!     );
//!
//!     let outcome = rebuild(&request, &overrides)?;
//!     println!("{}", outcome.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Override Semantics
//!
//! For each persistence unit that has a `<properties>` element:
//!
//! | Override | Property exists | Property absent |
//! |----------|-----------------|-----------------|
//! | `key=value` | value replaced | appended |
//! | `key=` (empty) | removed | nothing |
//!
//! Units without `<properties>` are never touched.
//!
//! ## Supported Descriptors
//!
//! | Version | Namespace |
//! |---------|-----------|
//! | 1.0 | `http://java.sun.com/xml/ns/persistence` |
//! | 2.0 | `http://java.sun.com/xml/ns/persistence` |
//! | 2.1 | `http://xmlns.jcp.org/xml/ns/persistence` |
//!
//! Any other declared version fails with
//! [`Error::UnsupportedSchemaVersion`].
//!
//! ## Modules
//!
//! - [`fs`]: archive access (open, extract one entry, reinsert, explode, pack)
//! - [`locate`]: pattern-based discovery of leaf archives
//! - [`descriptor`]: version detection, typed models and the merge
//! - [`rebuild`]: the run itself
//! - [`project`]: release and update flows for build projects
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli` | No | Command-line interface tool |
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod archive_path;
pub mod descriptor;
pub mod error;
pub mod fs;
pub mod locate;
pub mod overrides;
pub mod progress;
pub mod project;
pub mod rebuild;

pub use archive_path::ArchivePath;
pub use error::{Error, Result};
pub use overrides::OverrideSet;

// Re-export the descriptor API at crate root for convenience
pub use descriptor::{
    Descriptor, MergeStats, PatchedDescriptor, SchemaVersion, detect_version, patch_descriptor,
};

// Re-export the rebuild API
pub use rebuild::{
    BackupPolicy, ChangedDescriptor, Packaging, RebuildOutcome, RebuildReport, RebuildRequest,
    Rebuilder, Stage, rebuild,
};

// Re-export progress API
pub use progress::{NoProgress, RebuildProgress, StatisticsProgress};

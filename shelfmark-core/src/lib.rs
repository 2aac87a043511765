//! Embeddable core library for shelfmark.
//!
//! Provides a clap-free entry point that any front end (the `shelfmark` CLI, a TUI, a test
//! harness) can drive.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`LibraryStore`](ports::LibraryStore): load and save book and borrow records
//! - [`Clock`](ports::Clock): the current time
//!
//! The [`adapters`] module provides flat-file, in-memory, system-clock and fixed-clock
//! implementations.
//!
//! # Entry point
//!
//! [`Library`](library::Library) owns the catalog and ledger and runs every mutating
//! operation as validate → mutate catalog → mutate ledger → persist.

pub mod adapters;
pub mod library;
pub mod ports;
pub mod settings;

pub use library::{Library, ServiceError, ServiceResult};

// Re-export the domain surface so callers don't need shelfmark-domain directly.
pub use shelfmark_domain::{
    AddOutcome, Catalog, DeleteOutcome, Ledger, LendingPolicy, LibraryError, LibraryResult,
};

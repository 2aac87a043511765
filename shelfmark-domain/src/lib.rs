//! Domain logic: the book catalog and the lending ledger.
//!
//! This crate owns *what* the inventory looks like and which loans are legal. It does not own
//! *where* records live; persistence and clocks are ports in `shelfmark-core`. Every operation
//! takes the current time as an argument so the rules stay deterministic under test.

mod catalog;
mod error;
mod ledger;
pub mod validation;

pub use catalog::{AddOutcome, Catalog, DeleteOutcome, MAX_COPIES, MAX_YEAR, MIN_YEAR};
pub use error::{LibraryError, LibraryResult};
pub use ledger::{Ledger, LendingPolicy, MAX_BATCH_BORROW, MAX_LOAN_DAYS, MIN_BATCH_BORROW};

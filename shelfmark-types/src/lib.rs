//! Shared records for the shelfmark workspace.
//!
//! # Design constraints
//! - Book and borrow records are written to disk by `shelfmark-store`; field order there is fixed.
//! - Lookups are weak keys (title + category), never owning references.
//! - Text comparisons are case-insensitive everywhere; use [`text::eq_fold`].

pub mod book;
pub mod loan;
pub mod text;
pub mod time;

pub use book::{BookPatch, BookRecord, BookRef};
pub use loan::{BorrowRecord, Borrower, ReturnReceipt};
pub use time::{Timestamp, TimestampParseError};

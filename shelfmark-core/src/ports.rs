//! Port traits abstracting all I/O away from the library service.

use shelfmark_store::StoreError;
use shelfmark_types::{BookRecord, BorrowRecord, Timestamp};
use thiserror::Error;

/// Failure to read or write persisted records.
///
/// In-memory state is never rolled back because of one of these; the caller may retry the save.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("storage unavailable: {message}")]
    Unavailable { message: String },
}

/// Source and sink of book and borrow records.
pub trait LibraryStore {
    fn load_books(&self) -> Result<Vec<BookRecord>, PersistenceError>;
    fn save_books(&self, books: &[BookRecord]) -> Result<(), PersistenceError>;
    fn load_borrow_records(&self) -> Result<Vec<BorrowRecord>, PersistenceError>;
    fn save_borrow_records(&self, records: &[BorrowRecord]) -> Result<(), PersistenceError>;

    /// Save both collections as one unit: afterwards either both are stored or neither changed.
    ///
    /// The default saves books, then borrow records, and is only all-or-nothing when the
    /// second save cannot fail after the first succeeded. Stores that can fail in between
    /// override it.
    fn save_all(
        &self,
        books: &[BookRecord],
        records: &[BorrowRecord],
    ) -> Result<(), PersistenceError> {
        self.save_books(books)?;
        self.save_borrow_records(records)
    }
}

/// Wall clock.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

impl<T: Clock + ?Sized> Clock for Box<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

//! Default port implementations.

use crate::ports::{Clock, LibraryStore, PersistenceError};
use crate::settings::LibrarySettings;
use camino::Utf8PathBuf;
use shelfmark_types::{BookRecord, BorrowRecord, Timestamp};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Flat files on disk via `shelfmark_store`.
#[derive(Debug, Clone)]
pub struct FsLibraryStore {
    pub books_path: Utf8PathBuf,
    pub loans_path: Utf8PathBuf,
}

impl FsLibraryStore {
    pub fn new(books_path: Utf8PathBuf, loans_path: Utf8PathBuf) -> Self {
        Self {
            books_path,
            loans_path,
        }
    }

    pub fn from_settings(settings: &LibrarySettings) -> Self {
        Self::new(settings.books_path(), settings.loans_path())
    }
}

impl LibraryStore for FsLibraryStore {
    fn load_books(&self) -> Result<Vec<BookRecord>, PersistenceError> {
        Ok(shelfmark_store::read_books(&self.books_path)?)
    }

    fn save_books(&self, books: &[BookRecord]) -> Result<(), PersistenceError> {
        Ok(shelfmark_store::write_books(&self.books_path, books)?)
    }

    fn load_borrow_records(&self) -> Result<Vec<BorrowRecord>, PersistenceError> {
        Ok(shelfmark_store::read_borrow_records(&self.loans_path)?)
    }

    fn save_borrow_records(&self, records: &[BorrowRecord]) -> Result<(), PersistenceError> {
        Ok(shelfmark_store::write_borrow_records(&self.loans_path, records)?)
    }

    fn save_all(
        &self,
        books: &[BookRecord],
        records: &[BorrowRecord],
    ) -> Result<(), PersistenceError> {
        Ok(shelfmark_store::write_library(
            &self.books_path,
            books,
            &self.loans_path,
            records,
        )?)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    books: Vec<BookRecord>,
    records: Vec<BorrowRecord>,
    fail_saves: bool,
    saves: usize,
}

/// In-memory store for embedding and testing.
///
/// Clones share the same contents, so a test can keep a handle while the library owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLibraryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryLibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(books: Vec<BookRecord>, records: Vec<BorrowRecord>) -> Self {
        let store = Self::default();
        {
            let mut state = store.lock();
            state.books = books;
            state.records = records;
        }
        store
    }

    pub fn books(&self) -> Vec<BookRecord> {
        self.lock().books.clone()
    }

    pub fn borrow_records(&self) -> Vec<BorrowRecord> {
        self.lock().records.clone()
    }

    /// Make every subsequent save fail with [`PersistenceError::Unavailable`].
    pub fn set_fail_saves(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save_with(&self, apply: impl FnOnce(&mut MemoryState)) -> Result<(), PersistenceError> {
        let mut state = self.lock();
        if state.fail_saves {
            return Err(PersistenceError::Unavailable {
                message: "in-memory store is failing saves".to_string(),
            });
        }
        apply(&mut state);
        state.saves += 1;
        Ok(())
    }
}

impl LibraryStore for InMemoryLibraryStore {
    fn load_books(&self) -> Result<Vec<BookRecord>, PersistenceError> {
        Ok(self.books())
    }

    fn save_books(&self, books: &[BookRecord]) -> Result<(), PersistenceError> {
        self.save_with(|s| s.books = books.to_vec())
    }

    fn load_borrow_records(&self) -> Result<Vec<BorrowRecord>, PersistenceError> {
        Ok(self.borrow_records())
    }

    fn save_borrow_records(&self, records: &[BorrowRecord]) -> Result<(), PersistenceError> {
        self.save_with(|s| s.records = records.to_vec())
    }

    fn save_all(
        &self,
        books: &[BookRecord],
        records: &[BorrowRecord],
    ) -> Result<(), PersistenceError> {
        self.save_with(|s| {
            s.books = books.to_vec();
            s.records = records.to_vec();
        })
    }
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_naive(chrono::Local::now().naive_local())
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<Timestamp>>,
}

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: Timestamp) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance_days(&self, days: i64) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = now.add_days(days);
        debug!(now = %*now, "advanced fixed clock");
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

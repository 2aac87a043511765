//! The library service: catalog and ledger plus the ports that persist them.

use crate::ports::{Clock, LibraryStore, PersistenceError};
use shelfmark_domain::{
    AddOutcome, Catalog, DeleteOutcome, Ledger, LendingPolicy, LibraryError, LibraryResult,
};
use shelfmark_types::{
    BookPatch, BookRecord, BookRef, BorrowRecord, Borrower, ReturnReceipt, Timestamp,
};
use tracing::{debug, info, warn};

/// Error type for service calls. Exit code 2 = library error, 1 = persistence error.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Library(#[from] LibraryError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl ServiceError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ServiceError::Library(_) => 2,
            ServiceError::Persistence(_) => 1,
        }
    }

    pub fn is_library_error(&self) -> bool {
        matches!(self, ServiceError::Library(_))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, Copy)]
enum Touched {
    Books,
    Both,
}

/// An open library.
///
/// Every mutating call validates, mutates the catalog, mutates the ledger and then saves
/// whichever collections changed, both together through [`LibraryStore::save_all`] when a
/// loan moved stock. When a save fails the in-memory state keeps the change;
/// [`Library::save`] can be retried later.
#[derive(Debug)]
pub struct Library<S, C> {
    catalog: Catalog,
    ledger: Ledger,
    store: S,
    clock: C,
}

impl<S: LibraryStore, C: Clock> Library<S, C> {
    /// Load both collections from `store`.
    pub fn open(store: S, clock: C, policy: LendingPolicy) -> Result<Self, PersistenceError> {
        let books = store.load_books()?;
        let records = store.load_borrow_records()?;
        debug!(
            books = books.len(),
            borrow_records = records.len(),
            "opened library"
        );
        Ok(Self {
            catalog: Catalog::from_records(books),
            ledger: Ledger::from_records(records, policy),
            store,
            clock,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Write both collections.
    pub fn save(&self) -> Result<(), PersistenceError> {
        self.persist(Touched::Both)
    }

    pub fn add_copies(
        &mut self,
        title: &str,
        author: &str,
        year: i32,
        category: &str,
        copies: u32,
    ) -> ServiceResult<AddOutcome> {
        let now = self.clock.now();
        let outcome = self
            .catalog
            .add_copies(title, author, year, category, copies, now)?;
        info!(title, author, category, copies, ?outcome, "added copies");
        self.persist(Touched::Books)?;
        Ok(outcome)
    }

    pub fn find(&self, category: &str, title: &str) -> LibraryResult<&BookRecord> {
        self.catalog.find(category, title)
    }

    /// Apply `patch` to one record. Existing borrow records keep their old title and category.
    pub fn update(
        &mut self,
        category: &str,
        title: &str,
        patch: &BookPatch,
    ) -> ServiceResult<BookRecord> {
        if patch.is_empty() {
            return Err(LibraryError::validation("nothing to update").into());
        }
        let updated = self.catalog.update(category, title, patch)?.clone();
        info!(
            category,
            title,
            new_title = %updated.title,
            new_category = %updated.category,
            "updated book"
        );
        self.persist(Touched::Books)?;
        Ok(updated)
    }

    pub fn delete_copies(
        &mut self,
        category: &str,
        title: &str,
        n: u32,
    ) -> ServiceResult<DeleteOutcome> {
        let outcome = self.catalog.delete_copies(category, title, n)?;
        info!(category, title, copies = n, ?outcome, "deleted copies");
        self.persist(Touched::Books)?;
        Ok(outcome)
    }

    /// True when deleting `n` copies would reach into copies that are on loan.
    pub fn exceeds_available(&self, category: &str, title: &str, n: u32) -> LibraryResult<bool> {
        self.catalog.exceeds_available(category, title, n)
    }

    pub fn delete_by_category(&mut self, category: &str) -> ServiceResult<usize> {
        let removed = self.catalog.delete_by_category(category);
        if removed == 0 {
            debug!(category, "no books in category; nothing to save");
            return Ok(0);
        }
        info!(category, removed, "deleted category");
        self.persist(Touched::Books)?;
        Ok(removed)
    }

    pub fn delete_all(&mut self) -> ServiceResult<usize> {
        let removed = self.catalog.delete_all();
        info!(removed, "deleted all books");
        self.persist(Touched::Books)?;
        Ok(removed)
    }

    pub fn list_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a BookRecord> + Clone + 'a {
        self.catalog.list_by_category(category)
    }

    pub fn distinct_categories(&self) -> Vec<String> {
        self.catalog.distinct_categories()
    }

    /// Sort one category by title, in place. The new order is persisted.
    pub fn sort_by_title(&mut self, category: &str) -> ServiceResult<usize> {
        let sorted = self.catalog.sort_by_title(category);
        if sorted == 0 {
            debug!(category, "no books in category; nothing to sort");
            return Ok(0);
        }
        info!(category, sorted, "sorted category by title");
        self.persist(Touched::Books)?;
        Ok(sorted)
    }

    pub fn borrow(
        &mut self,
        title: &str,
        category: &str,
        borrower: &Borrower,
    ) -> ServiceResult<BorrowRecord> {
        let now = self.clock.now();
        let record = self
            .ledger
            .borrow(&mut self.catalog, title, category, borrower, now)?
            .clone();
        info!(
            title = %record.book_title,
            borrower_id = %record.borrower_id,
            due = %record.return_date,
            "borrowed book"
        );
        self.persist(Touched::Both)?;
        Ok(record)
    }

    pub fn borrow_many(
        &mut self,
        borrower: &Borrower,
        requests: &[BookRef],
    ) -> ServiceResult<Vec<BorrowRecord>> {
        let now = self.clock.now();
        let records = self
            .ledger
            .borrow_many(&mut self.catalog, borrower, requests, now)?
            .to_vec();
        info!(
            borrower_id = %borrower.id,
            count = records.len(),
            "borrowed batch"
        );
        self.persist(Touched::Both)?;
        Ok(records)
    }

    pub fn return_book(
        &mut self,
        title: &str,
        category: &str,
        borrower: &Borrower,
    ) -> ServiceResult<ReturnReceipt> {
        let now = self.clock.now();
        let receipt = self
            .ledger
            .return_book(&mut self.catalog, title, category, borrower, now)?;
        info!(
            title = %receipt.book_title,
            borrower_id = %receipt.borrower_id,
            days_late = receipt.days_late,
            fine = receipt.fine,
            "returned book"
        );
        self.persist(Touched::Both)?;
        Ok(receipt)
    }

    pub fn has_active_borrow(&self, borrower_id: &str, title: &str, category: &str) -> bool {
        self.ledger.has_active_borrow(borrower_id, title, category)
    }

    /// Active loans past their due date as of the clock's current time.
    pub fn overdue(&self) -> Vec<&BorrowRecord> {
        self.ledger.overdue(self.clock.now()).collect()
    }

    fn persist(&self, touched: Touched) -> Result<(), PersistenceError> {
        let result = match touched {
            Touched::Books => self.store.save_books(self.catalog.records()),
            Touched::Both => self
                .store
                .save_all(self.catalog.records(), self.ledger.records()),
        };
        match &result {
            Ok(()) => debug!(?touched, "saved"),
            Err(err) => warn!(?touched, error = %err, "save failed; in-memory state kept"),
        }
        result
    }
}

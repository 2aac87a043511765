use crate::catalog::Catalog;
use crate::error::{LibraryError, LibraryResult};
use serde::{Deserialize, Serialize};
use shelfmark_types::text::eq_fold;
use shelfmark_types::{BookRecord, BookRef, BorrowRecord, Borrower, ReturnReceipt, Timestamp};
use tracing::debug;

pub const MIN_BATCH_BORROW: usize = 2;
pub const MAX_BATCH_BORROW: usize = 5;

/// Longest configurable loan period, in days.
pub const MAX_LOAN_DAYS: u32 = 3650;

/// Loan period and late fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingPolicy {
    pub loan_days: u32,
    /// Currency units charged per whole day late.
    pub fine_per_day: u64,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            loan_days: 14,
            fine_per_day: 5,
        }
    }
}

impl LendingPolicy {
    /// Loan period must be between 1 and [`MAX_LOAN_DAYS`] days.
    pub fn validate(&self) -> LibraryResult<()> {
        if (1..=MAX_LOAN_DAYS).contains(&self.loan_days) {
            Ok(())
        } else {
            Err(LibraryError::validation(format!(
                "loan_days must be between 1 and {}, got {}",
                MAX_LOAN_DAYS, self.loan_days
            )))
        }
    }

    pub fn due_date(&self, borrowed_at: Timestamp) -> LibraryResult<Timestamp> {
        self.validate()?;
        borrowed_at
            .checked_add_days(i64::from(self.loan_days))
            .ok_or_else(|| {
                LibraryError::validation(format!(
                    "a {}-day loan from {} is out of range",
                    self.loan_days, borrowed_at
                ))
            })
    }

    pub fn fine_for(&self, days_late: u32) -> u64 {
        u64::from(days_late).saturating_mul(self.fine_per_day)
    }
}

/// Append-only record of every loan.
///
/// The ledger never owns catalog records. Borrow and return take the catalog by `&mut` and
/// adjust `available_copies` on the matching record, looked up by (category, title).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    records: Vec<BorrowRecord>,
    policy: LendingPolicy,
}

impl Ledger {
    pub fn new(policy: LendingPolicy) -> Self {
        Self {
            records: Vec::new(),
            policy,
        }
    }

    pub fn from_records(records: Vec<BorrowRecord>, policy: LendingPolicy) -> Self {
        Self { records, policy }
    }

    pub fn records(&self) -> &[BorrowRecord] {
        &self.records
    }

    pub fn policy(&self) -> LendingPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<BorrowRecord> {
        self.records
    }

    pub fn has_active_borrow(&self, borrower_id: &str, title: &str, category: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.is_active() && r.is_loan_of(borrower_id, title, category))
    }

    pub fn active(&self) -> impl Iterator<Item = &BorrowRecord> + Clone + '_ {
        self.records.iter().filter(|r| r.is_active())
    }

    /// Active loans whose due date passed at least one whole day before `now`.
    pub fn overdue(&self, now: Timestamp) -> impl Iterator<Item = &BorrowRecord> + Clone + '_ {
        self.records.iter().filter(move |r| r.is_overdue(now))
    }

    /// Every loan (active or returned) recorded for one borrower id.
    pub fn history_for<'a>(
        &'a self,
        borrower_id: &'a str,
    ) -> impl Iterator<Item = &'a BorrowRecord> + Clone + 'a {
        self.records
            .iter()
            .filter(move |r| eq_fold(&r.borrower_id, borrower_id))
    }

    /// Lend one copy of a title.
    pub fn borrow(
        &mut self,
        catalog: &mut Catalog,
        title: &str,
        category: &str,
        borrower: &Borrower,
        now: Timestamp,
    ) -> LibraryResult<&BorrowRecord> {
        let idx = catalog.locate(category, title)?;
        self.check_lendable(catalog.get(idx), &borrower.id)?;

        let due = self.policy.due_date(now)?;
        self.commit_loan(catalog, idx, borrower, now, due);
        Ok(&self.records[self.records.len() - 1])
    }

    /// Lend one copy of each requested title, or nothing at all.
    ///
    /// Every leg is checked (existence, stock, no active loan, no repeat within the batch)
    /// before any copy changes hands. All new records share one borrow date and due date.
    pub fn borrow_many(
        &mut self,
        catalog: &mut Catalog,
        borrower: &Borrower,
        requests: &[BookRef],
        now: Timestamp,
    ) -> LibraryResult<&[BorrowRecord]> {
        if !(MIN_BATCH_BORROW..=MAX_BATCH_BORROW).contains(&requests.len()) {
            return Err(LibraryError::validation(format!(
                "a batch borrow takes between {} and {} books, got {}",
                MIN_BATCH_BORROW,
                MAX_BATCH_BORROW,
                requests.len()
            )));
        }

        let mut slots = Vec::with_capacity(requests.len());
        for (i, request) in requests.iter().enumerate() {
            if requests[..i].iter().any(|earlier| earlier.same_as(request)) {
                return Err(LibraryError::validation(format!(
                    "'{}' is requested more than once",
                    request.title
                )));
            }
            let idx = catalog.locate(&request.category, &request.title)?;
            self.check_lendable(catalog.get(idx), &borrower.id)?;
            slots.push(idx);
        }

        let due = self.policy.due_date(now)?;
        let start = self.records.len();
        for idx in slots {
            self.commit_loan(catalog, idx, borrower, now, due);
        }
        debug!(
            borrower_id = %borrower.id,
            count = requests.len(),
            "committed batch borrow"
        );
        Ok(&self.records[start..])
    }

    /// Take back a copy and work out any late fine.
    pub fn return_book(
        &mut self,
        catalog: &mut Catalog,
        title: &str,
        category: &str,
        borrower: &Borrower,
        now: Timestamp,
    ) -> LibraryResult<ReturnReceipt> {
        let idx = catalog.locate(category, title)?;
        let book = catalog.get(idx);
        let pos = self
            .records
            .iter()
            .position(|r| r.is_active() && r.is_held_by(borrower, &book.title, &book.category))
            .ok_or_else(|| LibraryError::NoActiveBorrow {
                borrower_id: borrower.id.clone(),
                title: book.title.clone(),
            })?;

        let book = catalog.get_mut(idx);
        book.available_copies = (book.available_copies + 1).min(book.total_copies);

        let record = &mut self.records[pos];
        record.returned = true;

        let days_late = Timestamp::days_between(record.due_date(), now).max(0);
        let days_late = u32::try_from(days_late).unwrap_or(u32::MAX);
        let fine = self.policy.fine_for(days_late);

        debug!(
            borrower_id = %record.borrower_id,
            title = %record.book_title,
            days_late,
            "recorded return"
        );

        Ok(ReturnReceipt {
            book_title: record.book_title.clone(),
            book_category: record.book_category.clone(),
            borrower_name: record.borrower_name.clone(),
            borrower_id: record.borrower_id.clone(),
            borrow_date: record.borrow_date,
            due_date: record.due_date(),
            returned_at: now,
            days_late,
            fine,
        })
    }

    fn check_lendable(&self, book: &BookRecord, borrower_id: &str) -> LibraryResult<()> {
        if book.available_copies == 0 {
            return Err(LibraryError::OutOfStock {
                title: book.title.clone(),
            });
        }
        if self.has_active_borrow(borrower_id, &book.title, &book.category) {
            return Err(LibraryError::AlreadyBorrowed {
                borrower_id: borrower_id.to_string(),
                title: book.title.clone(),
            });
        }
        Ok(())
    }

    fn commit_loan(
        &mut self,
        catalog: &mut Catalog,
        idx: usize,
        borrower: &Borrower,
        now: Timestamp,
        due: Timestamp,
    ) {
        let book = catalog.get_mut(idx);
        book.available_copies -= 1;
        self.records.push(BorrowRecord {
            book_title: book.title.clone(),
            book_category: book.category.clone(),
            borrower_name: borrower.name.clone(),
            borrower_id: borrower.id.clone(),
            borrowed_copies: 1,
            borrow_date: now,
            return_date: due,
            returned: false,
        });
    }
}

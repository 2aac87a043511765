use crate::text::eq_fold;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// A patron as recorded on a loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrower {
    pub name: String,
    pub id: String,
}

impl Borrower {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// One ledger line. Records are append-only; returning a copy flips `returned`.
///
/// `return_date` holds the due date computed at borrow time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowRecord {
    pub book_title: String,
    pub book_category: String,
    pub borrower_name: String,
    pub borrower_id: String,
    pub borrowed_copies: u32,
    pub borrow_date: Timestamp,
    pub return_date: Timestamp,
    pub returned: bool,
}

impl BorrowRecord {
    pub fn is_active(&self) -> bool {
        !self.returned
    }

    pub fn due_date(&self) -> Timestamp {
        self.return_date
    }

    /// Same (borrower id, title, category) triple, ignoring case.
    pub fn is_loan_of(&self, borrower_id: &str, title: &str, category: &str) -> bool {
        eq_fold(&self.borrower_id, borrower_id)
            && eq_fold(&self.book_title, title)
            && eq_fold(&self.book_category, category)
    }

    /// Full four-field match used when a copy comes back.
    pub fn is_held_by(&self, borrower: &Borrower, title: &str, category: &str) -> bool {
        eq_fold(&self.borrower_name, &borrower.name) && self.is_loan_of(&borrower.id, title, category)
    }

    /// Active and past due at `now`.
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        self.is_active() && Timestamp::days_between(self.return_date, now) > 0
    }
}

/// What a caller learns when a copy is returned. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnReceipt {
    pub book_title: String,
    pub book_category: String,
    pub borrower_name: String,
    pub borrower_id: String,
    pub borrow_date: Timestamp,
    pub due_date: Timestamp,
    pub returned_at: Timestamp,
    pub days_late: u32,
    pub fine: u64,
}

impl ReturnReceipt {
    pub fn is_late(&self) -> bool {
        self.days_late > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> BorrowRecord {
        let borrowed = Timestamp::from_ymd_hms(2025, 3, 4, 13, 5, 2).unwrap();
        BorrowRecord {
            book_title: "Dune".to_string(),
            book_category: "Fiction".to_string(),
            borrower_name: "Alice".to_string(),
            borrower_id: "A1".to_string(),
            borrowed_copies: 1,
            borrow_date: borrowed,
            return_date: borrowed.add_days(14),
            returned: false,
        }
    }

    #[test]
    fn loan_match_ignores_case() {
        let r = record();
        assert!(r.is_loan_of("a1", "DUNE", "fiction"));
        assert!(!r.is_loan_of("A2", "Dune", "Fiction"));
        assert!(r.is_held_by(&Borrower::new("alice", "A1"), "Dune", "Fiction"));
        assert!(!r.is_held_by(&Borrower::new("Bob", "A1"), "Dune", "Fiction"));
    }

    #[test]
    fn overdue_only_after_a_full_day() {
        let r = record();
        let due = r.due_date();
        assert!(!r.is_overdue(due));
        assert!(!r.is_overdue(due.add_seconds(3_600)));
        assert!(r.is_overdue(due.add_days(1)));
    }

    #[test]
    fn returned_record_is_never_overdue() {
        let mut r = record();
        r.returned = true;
        assert!(!r.is_overdue(r.due_date().add_days(30)));
    }
}

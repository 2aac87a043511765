use crate::text::eq_fold;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// One catalogued title with its copy counts.
///
/// Identity is (title, author), compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    pub year: i32,
    pub category: String,
    pub total_copies: u32,
    pub available_copies: u32,
    pub added_date: Timestamp,
}

impl BookRecord {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        year: i32,
        category: impl Into<String>,
        copies: u32,
        added_date: Timestamp,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            year,
            category: category.into(),
            total_copies: copies,
            available_copies: copies,
            added_date,
        }
    }

    /// Copies currently out on loan.
    pub fn borrowed_copies(&self) -> u32 {
        self.total_copies.saturating_sub(self.available_copies)
    }

    pub fn is_same_book(&self, title: &str, author: &str) -> bool {
        eq_fold(&self.title, title) && eq_fold(&self.author, author)
    }

    /// Weak-key match used by lookups and the ledger.
    pub fn matches(&self, category: &str, title: &str) -> bool {
        eq_fold(&self.category, category) && eq_fold(&self.title, title)
    }

    pub fn in_category(&self, category: &str) -> bool {
        eq_fold(&self.category, category)
    }
}

/// Weak lookup key for a book: (category, title).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRef {
    pub category: String,
    pub title: String,
}

impl BookRef {
    pub fn new(category: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            title: title.into(),
        }
    }

    pub fn same_as(&self, other: &BookRef) -> bool {
        eq_fold(&self.category, &other.category) && eq_fold(&self.title, &other.title)
    }
}

/// Partial update for a [`BookRecord`]. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_copies: Option<u32>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.category.is_none()
            && self.year.is_none()
            && self.total_copies.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn added() -> Timestamp {
        Timestamp::from_ymd_hms(2025, 3, 4, 13, 5, 2).unwrap()
    }

    #[test]
    fn new_record_has_all_copies_available() {
        let b = BookRecord::new("Dune", "Herbert", 1965, "Fiction", 3, added());
        assert_eq!(b.total_copies, 3);
        assert_eq!(b.available_copies, 3);
        assert_eq!(b.borrowed_copies(), 0);
    }

    #[test]
    fn identity_is_case_insensitive() {
        let b = BookRecord::new("Dune", "Herbert", 1965, "Fiction", 1, added());
        assert!(b.is_same_book("DUNE", "herbert"));
        assert!(!b.is_same_book("Dune", "Asimov"));
        assert!(b.matches("fiction", "dune"));
    }

    #[test]
    fn empty_patch() {
        assert!(BookPatch::default().is_empty());
        let p = BookPatch {
            year: Some(1966),
            ..Default::default()
        };
        assert!(!p.is_empty());
    }
}

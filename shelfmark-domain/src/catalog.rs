use crate::error::{LibraryError, LibraryResult};
use serde::Serialize;
use shelfmark_types::text::fold;
use shelfmark_types::{BookPatch, BookRecord, Timestamp};
use std::collections::HashSet;
use tracing::debug;

pub const MIN_YEAR: i32 = 1800;
pub const MAX_YEAR: i32 = 2025;
pub const MAX_COPIES: u32 = 1000;

/// Result of [`Catalog::add_copies`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AddOutcome {
    /// A new record was appended.
    Created,
    /// Copies were merged into an existing (title, author) record.
    Merged { total_copies: u32 },
}

/// Result of [`Catalog::delete_copies`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    Removed,
    Reduced {
        total_copies: u32,
        available_copies: u32,
    },
}

/// The book inventory, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    books: Vec<BookRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap records loaded from storage, keeping their order.
    pub fn from_records(books: Vec<BookRecord>) -> Self {
        Self { books }
    }

    pub fn records(&self) -> &[BookRecord] {
        &self.books
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BookRecord> {
        self.books.iter()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn into_records(self) -> Vec<BookRecord> {
        self.books
    }

    /// Add `copies` of a title. Merges into an existing (title, author) record when one exists.
    pub fn add_copies(
        &mut self,
        title: &str,
        author: &str,
        year: i32,
        category: &str,
        copies: u32,
        now: Timestamp,
    ) -> LibraryResult<AddOutcome> {
        check_copies(copies)?;
        check_year(year)?;
        check_text("title", title)?;
        check_text("author", author)?;
        check_text("category", category)?;

        if let Some(book) = self.books.iter_mut().find(|b| b.is_same_book(title, author)) {
            let total = book.total_copies.saturating_add(copies);
            if total > MAX_COPIES {
                return Err(LibraryError::validation(format!(
                    "'{}' would have {} copies; at most {} are allowed",
                    book.title, total, MAX_COPIES
                )));
            }
            book.total_copies = total;
            book.available_copies += copies;
            debug!(title = %book.title, total, "merged copies into existing record");
            return Ok(AddOutcome::Merged {
                total_copies: total,
            });
        }

        self.books.push(BookRecord::new(
            title.trim(),
            author.trim(),
            year,
            category.trim(),
            copies,
            now,
        ));
        debug!(title = title.trim(), copies, "created book record");
        Ok(AddOutcome::Created)
    }

    /// The record matching both `category` and `title`, ignoring case.
    pub fn find(&self, category: &str, title: &str) -> LibraryResult<&BookRecord> {
        let idx = self.locate(category, title)?;
        Ok(&self.books[idx])
    }

    pub fn contains(&self, category: &str, title: &str) -> bool {
        self.books.iter().any(|b| b.matches(category, title))
    }

    /// Apply a partial patch. A change of total copies by Δ moves available copies by Δ,
    /// clamped to `[0, new_total]`.
    pub fn update(
        &mut self,
        category: &str,
        title: &str,
        patch: &BookPatch,
    ) -> LibraryResult<&BookRecord> {
        let idx = self.locate(category, title)?;

        if let Some(year) = patch.year {
            check_year(year)?;
        }
        if let Some(total) = patch.total_copies
            && total > MAX_COPIES
        {
            return Err(LibraryError::validation(format!(
                "total copies must be at most {}",
                MAX_COPIES
            )));
        }
        for (field, value) in [
            ("title", &patch.title),
            ("author", &patch.author),
            ("category", &patch.category),
        ] {
            if let Some(v) = value {
                check_text(field, v)?;
            }
        }

        let mut updated = self.books[idx].clone();
        if let Some(t) = &patch.title {
            updated.title = t.trim().to_string();
        }
        if let Some(a) = &patch.author {
            updated.author = a.trim().to_string();
        }
        if let Some(c) = &patch.category {
            updated.category = c.trim().to_string();
        }
        if let Some(y) = patch.year {
            updated.year = y;
        }
        if let Some(total) = patch.total_copies {
            let delta = i64::from(total) - i64::from(updated.total_copies);
            let available = (i64::from(updated.available_copies) + delta).clamp(0, i64::from(total));
            updated.total_copies = total;
            updated.available_copies = u32::try_from(available).unwrap_or(0);
        }

        if patch.title.is_some() || patch.author.is_some() {
            let collides = self
                .books
                .iter()
                .enumerate()
                .any(|(i, b)| i != idx && b.is_same_book(&updated.title, &updated.author));
            if collides {
                return Err(LibraryError::Duplicate {
                    title: updated.title,
                    author: updated.author,
                });
            }
        }

        debug!(title = %updated.title, "updated book record");
        self.books[idx] = updated;
        Ok(&self.books[idx])
    }

    /// Remove `n` copies. Removing every copy removes the record.
    ///
    /// Copies currently on loan may be deleted; available copies then bottom out at zero.
    /// Use [`Catalog::exceeds_available`] to decide whether to ask the user first.
    pub fn delete_copies(
        &mut self,
        category: &str,
        title: &str,
        n: u32,
    ) -> LibraryResult<DeleteOutcome> {
        let idx = self.locate(category, title)?;
        let book = &mut self.books[idx];

        if n == 0 {
            return Err(LibraryError::validation("number of copies to delete must be at least 1"));
        }
        if n > book.total_copies {
            return Err(LibraryError::validation(format!(
                "cannot delete {} copies of '{}': only {} exist",
                n, book.title, book.total_copies
            )));
        }

        if n == book.total_copies {
            let removed = self.books.remove(idx);
            debug!(title = %removed.title, "removed book record");
            return Ok(DeleteOutcome::Removed);
        }

        book.total_copies -= n;
        book.available_copies -= n.min(book.available_copies);
        Ok(DeleteOutcome::Reduced {
            total_copies: book.total_copies,
            available_copies: book.available_copies,
        })
    }

    /// True when deleting `n` copies would also remove copies that are on loan.
    pub fn exceeds_available(&self, category: &str, title: &str, n: u32) -> LibraryResult<bool> {
        Ok(n > self.find(category, title)?.available_copies)
    }

    pub fn delete_by_category(&mut self, category: &str) -> usize {
        let before = self.books.len();
        self.books.retain(|b| !b.in_category(category));
        before - self.books.len()
    }

    pub fn delete_all(&mut self) -> usize {
        let removed = self.books.len();
        self.books.clear();
        removed
    }

    /// Records in `category`, in insertion order. Clone the iterator to walk it again.
    pub fn list_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a BookRecord> + Clone + 'a {
        self.books.iter().filter(move |b| b.in_category(category))
    }

    /// Category labels in order of first appearance; the first-seen casing wins.
    pub fn distinct_categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for book in &self.books {
            if seen.insert(fold(&book.category)) {
                out.push(book.category.clone());
            }
        }
        out
    }

    /// Stable sort of one category's records by title, ignoring case.
    ///
    /// Records outside `category` keep their positions. Returns how many records were sorted.
    pub fn sort_by_title(&mut self, category: &str) -> usize {
        let slots: Vec<usize> = self
            .books
            .iter()
            .enumerate()
            .filter(|(_, b)| b.in_category(category))
            .map(|(i, _)| i)
            .collect();

        let mut group: Vec<BookRecord> = slots.iter().map(|&i| self.books[i].clone()).collect();
        group.sort_by_cached_key(|b| fold(&b.title));

        for (slot, book) in slots.iter().zip(group) {
            self.books[*slot] = book;
        }
        slots.len()
    }

    pub(crate) fn locate(&self, category: &str, title: &str) -> LibraryResult<usize> {
        self.books
            .iter()
            .position(|b| b.matches(category, title))
            .ok_or_else(|| LibraryError::book_not_found(category, title))
    }

    pub(crate) fn get(&self, idx: usize) -> &BookRecord {
        &self.books[idx]
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> &mut BookRecord {
        &mut self.books[idx]
    }
}

fn check_copies(copies: u32) -> LibraryResult<()> {
    if (1..=MAX_COPIES).contains(&copies) {
        Ok(())
    } else {
        Err(LibraryError::validation(format!(
            "copies must be between 1 and {}, got {}",
            MAX_COPIES, copies
        )))
    }
}

fn check_year(year: i32) -> LibraryResult<()> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(LibraryError::validation(format!(
            "year must be between {} and {}, got {}",
            MIN_YEAR, MAX_YEAR, year
        )))
    }
}

fn check_text(field: &str, value: &str) -> LibraryResult<()> {
    if value.trim().is_empty() {
        Err(LibraryError::validation(format!("{} must not be empty", field)))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn now() -> Timestamp {
        Timestamp::from_ymd_hms(2025, 3, 4, 13, 5, 2).unwrap()
    }

    fn catalog(books: &[(&str, &str, &str, u32)]) -> Catalog {
        let mut c = Catalog::new();
        for (title, author, category, copies) in books {
            c.add_copies(title, author, 2000, category, *copies, now())
                .unwrap();
        }
        c
    }

    fn titles(c: &Catalog) -> Vec<&str> {
        c.iter().map(|b| b.title.as_str()).collect()
    }

    #[test]
    fn add_creates_then_merges() {
        let mut c = Catalog::new();
        assert_eq!(
            c.add_copies("Dune", "Herbert", 1965, "Fiction", 3, now()),
            Ok(AddOutcome::Created)
        );
        assert_eq!(
            c.add_copies("dune", "HERBERT", 1965, "Fiction", 2, now()),
            Ok(AddOutcome::Merged { total_copies: 5 })
        );
        assert_eq!(c.len(), 1);
        let book = c.find("fiction", "DUNE").unwrap();
        assert_eq!(book.total_copies, 5);
        assert_eq!(book.available_copies, 5);
        assert_eq!(book.added_date, now());
    }

    #[test]
    fn same_title_other_author_is_a_new_record() {
        let c = catalog(&[("Dune", "Herbert", "Fiction", 1), ("Dune", "Someone", "Fiction", 1)]);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn add_rejects_out_of_range_input() {
        let mut c = Catalog::new();
        for (year, copies) in [(1965, 0), (1965, 1001), (1799, 1), (2026, 1)] {
            let err = c
                .add_copies("Dune", "Herbert", year, "Fiction", copies, now())
                .unwrap_err();
            assert_eq!(err.kind(), "validation");
        }
        assert!(c.is_empty());
    }

    #[test]
    fn merge_may_not_exceed_copy_limit() {
        let mut c = catalog(&[("Dune", "Herbert", "Fiction", 600)]);
        let err = c
            .add_copies("Dune", "Herbert", 1965, "Fiction", 401, now())
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert_eq!(c.find("Fiction", "Dune").unwrap().total_copies, 600);

        assert_eq!(
            c.add_copies("Dune", "Herbert", 1965, "Fiction", 400, now()),
            Ok(AddOutcome::Merged {
                total_copies: MAX_COPIES
            })
        );
    }

    #[test]
    fn find_reports_not_found() {
        let c = catalog(&[("Dune", "Herbert", "Fiction", 1)]);
        assert_eq!(c.find("Science", "Dune").unwrap_err().kind(), "not_found");
    }

    #[test]
    fn update_adjusts_available_by_delta() {
        let mut c = catalog(&[("Dune", "Herbert", "Fiction", 5)]);
        c.get_mut(0).available_copies = 2;

        let patch = BookPatch {
            total_copies: Some(7),
            ..Default::default()
        };
        let book = c.update("Fiction", "Dune", &patch).unwrap();
        assert_eq!((book.total_copies, book.available_copies), (7, 4));

        let patch = BookPatch {
            total_copies: Some(1),
            ..Default::default()
        };
        let book = c.update("Fiction", "Dune", &patch).unwrap();
        assert_eq!((book.total_copies, book.available_copies), (1, 0));
    }

    #[test]
    fn update_rejects_identity_collision() {
        let mut c = catalog(&[("Dune", "Herbert", "Fiction", 1), ("Emma", "Austen", "Classics", 1)]);
        let patch = BookPatch {
            title: Some("dune".to_string()),
            author: Some("herbert".to_string()),
            ..Default::default()
        };
        let before = c.clone();
        let err = c.update("Classics", "Emma", &patch).unwrap_err();
        assert_eq!(err.kind(), "duplicate");
        assert_eq!(c, before);
    }

    #[test]
    fn update_may_keep_own_identity() {
        let mut c = catalog(&[("Dune", "Herbert", "Fiction", 1)]);
        let patch = BookPatch {
            title: Some("DUNE".to_string()),
            category: Some("Science Fiction".to_string()),
            ..Default::default()
        };
        let book = c.update("Fiction", "Dune", &patch).unwrap();
        assert_eq!(book.title, "DUNE");
        assert_eq!(book.category, "Science Fiction");
    }

    #[test]
    fn update_rejects_bad_year_without_side_effects() {
        let mut c = catalog(&[("Dune", "Herbert", "Fiction", 1)]);
        let patch = BookPatch {
            title: Some("Dune Messiah".to_string()),
            year: Some(1700),
            ..Default::default()
        };
        assert_eq!(c.update("Fiction", "Dune", &patch).unwrap_err().kind(), "validation");
        assert!(c.find("Fiction", "Dune").is_ok());
    }

    #[test]
    fn delete_all_copies_removes_record() {
        let mut c = catalog(&[("Dune", "Herbert", "Fiction", 3)]);
        assert_eq!(c.delete_copies("Fiction", "Dune", 3), Ok(DeleteOutcome::Removed));
        assert_eq!(c.find("Fiction", "Dune").unwrap_err().kind(), "not_found");
    }

    #[test]
    fn delete_beyond_available_clamps_to_zero() {
        let mut c = catalog(&[("Dune", "Herbert", "Fiction", 5)]);
        c.get_mut(0).available_copies = 1;
        assert_eq!(c.exceeds_available("Fiction", "Dune", 3), Ok(true));
        assert_eq!(
            c.delete_copies("Fiction", "Dune", 3),
            Ok(DeleteOutcome::Reduced {
                total_copies: 2,
                available_copies: 0
            })
        );
    }

    #[test]
    fn delete_rejects_zero_and_too_many() {
        let mut c = catalog(&[("Dune", "Herbert", "Fiction", 2)]);
        assert_eq!(c.delete_copies("Fiction", "Dune", 0).unwrap_err().kind(), "validation");
        assert_eq!(c.delete_copies("Fiction", "Dune", 3).unwrap_err().kind(), "validation");
        assert_eq!(c.delete_copies("Fiction", "Emma", 1).unwrap_err().kind(), "not_found");
    }

    #[test]
    fn bulk_deletes_report_counts() {
        let mut c = catalog(&[
            ("Dune", "Herbert", "Fiction", 1),
            ("Emma", "Austen", "Classics", 1),
            ("Solaris", "Lem", "fiction", 1),
        ]);
        assert_eq!(c.delete_by_category("FICTION"), 2);
        assert_eq!(titles(&c), vec!["Emma"]);
        assert_eq!(c.delete_all(), 1);
        assert!(c.is_empty());
    }

    #[test]
    fn list_by_category_is_restartable() {
        let c = catalog(&[
            ("Dune", "Herbert", "Fiction", 1),
            ("Emma", "Austen", "Classics", 1),
            ("Solaris", "Lem", "fiction", 1),
        ]);
        let listing = c.list_by_category("Fiction");
        let first: Vec<&str> = listing.clone().map(|b| b.title.as_str()).collect();
        let second: Vec<&str> = listing.map(|b| b.title.as_str()).collect();
        assert_eq!(first, vec!["Dune", "Solaris"]);
        assert_eq!(first, second);
    }

    #[test]
    fn distinct_categories_keep_first_casing() {
        let c = catalog(&[
            ("Dune", "Herbert", "Fiction", 1),
            ("Emma", "Austen", "Classics", 1),
            ("Solaris", "Lem", "FICTION", 1),
            ("Cosmos", "Sagan", "Science", 1),
        ]);
        assert_eq!(c.distinct_categories(), vec!["Fiction", "Classics", "Science"]);
    }

    #[test]
    fn sort_only_touches_one_category() {
        let mut c = catalog(&[
            ("Solaris", "Lem", "Fiction", 1),
            ("Emma", "Austen", "Classics", 1),
            ("dune", "Herbert", "Fiction", 1),
            ("Beloved", "Morrison", "Classics", 1),
            ("Anathem", "Stephenson", "fiction", 1),
        ]);
        assert_eq!(c.sort_by_title("Fiction"), 3);
        assert_eq!(titles(&c), vec!["Anathem", "Emma", "dune", "Beloved", "Solaris"]);
    }
}

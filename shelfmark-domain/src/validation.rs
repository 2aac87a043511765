//! Input checks run by front ends before they call into the catalog or ledger.
//!
//! Names and titles are letters and spaces only. That also keeps the `|` field delimiter
//! of the on-disk format out of stored text.

use crate::catalog::{MAX_COPIES, MAX_YEAR, MIN_YEAR};
use crate::error::{LibraryError, LibraryResult};
use regex::Regex;
use std::sync::LazyLock;

/// Minimum trimmed length for titles, authors, categories and borrower names.
pub const MIN_TEXT_LEN: usize = 2;

static TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z ]+$").expect("static regex"));

static BORROWER_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("static regex"));

/// Check a title, author, category or borrower name.
pub fn validate_text(field: &str, value: &str) -> LibraryResult<()> {
    let trimmed = value.trim();
    if trimmed.len() < MIN_TEXT_LEN {
        return Err(LibraryError::validation(format!(
            "{} must be at least {} characters",
            field, MIN_TEXT_LEN
        )));
    }
    if !TEXT_RE.is_match(value) {
        return Err(LibraryError::validation(format!(
            "{} may only contain letters and spaces",
            field
        )));
    }
    Ok(())
}

pub fn validate_borrower_id(value: &str) -> LibraryResult<()> {
    if BORROWER_ID_RE.is_match(value) {
        Ok(())
    } else {
        Err(LibraryError::validation(
            "borrower id may only contain letters and digits",
        ))
    }
}

pub fn validate_year(year: i32) -> LibraryResult<()> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(LibraryError::validation(format!(
            "year must be between {} and {}",
            MIN_YEAR, MAX_YEAR
        )))
    }
}

pub fn validate_copies(copies: u32) -> LibraryResult<()> {
    if (1..=MAX_COPIES).contains(&copies) {
        Ok(())
    } else {
        Err(LibraryError::validation(format!(
            "copies must be between 1 and {}",
            MAX_COPIES
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_accepts_letters_and_spaces() {
        assert!(validate_text("title", "The Left Hand of Darkness").is_ok());
        assert!(validate_text("title", "Dune").is_ok());
    }

    #[test]
    fn text_rejects_digits_punctuation_and_delimiter() {
        for bad in ["Catch 22", "Dune: Messiah", "A|B", "Émile"] {
            assert!(validate_text("title", bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn text_enforces_minimum_length() {
        assert!(validate_text("author", "A").is_err());
        assert!(validate_text("author", "   ").is_err());
        assert!(validate_text("author", "Al").is_ok());
    }

    #[test]
    fn borrower_id_is_alphanumeric() {
        assert!(validate_borrower_id("A1").is_ok());
        assert!(validate_borrower_id("").is_err());
        assert!(validate_borrower_id("A 1").is_err());
    }

    #[test]
    fn numeric_ranges() {
        assert!(validate_year(1800).is_ok());
        assert!(validate_year(2025).is_ok());
        assert!(validate_year(2026).is_err());
        assert!(validate_copies(1000).is_ok());
        assert!(validate_copies(0).is_err());
    }
}

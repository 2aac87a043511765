//! Error taxonomy for catalog and ledger operations.
//!
//! Every variant is a local, recoverable condition returned to the caller. None of them leave
//! partial state behind: an operation that returns an error has not mutated anything.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LibraryError {
    /// Out-of-range or malformed input.
    #[error("invalid input: {message}")]
    Validation { message: String },

    /// No matching book or loan.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// A title/author change would collide with another record.
    #[error("duplicate book: '{title}' by {author} already exists")]
    Duplicate { title: String, author: String },

    #[error("no copies of '{title}' are available")]
    OutOfStock { title: String },

    #[error("borrower {borrower_id} already has '{title}' on loan")]
    AlreadyBorrowed { borrower_id: String, title: String },

    #[error("borrower {borrower_id} has no active loan of '{title}'")]
    NoActiveBorrow { borrower_id: String, title: String },
}

impl LibraryError {
    pub fn validation(message: impl Into<String>) -> Self {
        LibraryError::Validation {
            message: message.into(),
        }
    }

    pub fn book_not_found(category: &str, title: &str) -> Self {
        LibraryError::NotFound {
            what: format!("book '{}' in category '{}'", title, category),
        }
    }

    /// Short machine-readable token for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LibraryError::Validation { .. } => "validation",
            LibraryError::NotFound { .. } => "not_found",
            LibraryError::Duplicate { .. } => "duplicate",
            LibraryError::OutOfStock { .. } => "out_of_stock",
            LibraryError::AlreadyBorrowed { .. } => "already_borrowed",
            LibraryError::NoActiveBorrow { .. } => "no_active_borrow",
        }
    }
}

pub type LibraryResult<T> = Result<T, LibraryError>;

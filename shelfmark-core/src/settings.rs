//! Clap-free settings for opening a library.

use camino::Utf8PathBuf;
use shelfmark_domain::LendingPolicy;

pub const DEFAULT_BOOKS_FILE: &str = "books.txt";
pub const DEFAULT_LOANS_FILE: &str = "borrow_records.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySettings {
    pub data_dir: Utf8PathBuf,

    // File names, relative to data_dir unless absolute.
    pub books_file: Utf8PathBuf,
    pub loans_file: Utf8PathBuf,

    pub policy: LendingPolicy,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            data_dir: Utf8PathBuf::from("."),
            books_file: Utf8PathBuf::from(DEFAULT_BOOKS_FILE),
            loans_file: Utf8PathBuf::from(DEFAULT_LOANS_FILE),
            policy: LendingPolicy::default(),
        }
    }
}

impl LibrarySettings {
    pub fn books_path(&self) -> Utf8PathBuf {
        self.data_dir.join(&self.books_file)
    }

    pub fn loans_path(&self) -> Utf8PathBuf {
        self.data_dir.join(&self.loans_file)
    }
}

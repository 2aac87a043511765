use crate::codec::{RecordError, decode_book, decode_borrow, encode_book, encode_borrow};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use shelfmark_types::{BookRecord, BorrowRecord};
use std::io::ErrorKind;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("io error: {message}")]
    Io { path: Utf8PathBuf, message: String },

    #[error("{path}:{line}: {source}")]
    Parse {
        path: Utf8PathBuf,
        line: usize,
        #[source]
        source: RecordError,
    },

    #[error("cannot encode record {index} for {path}: {source}")]
    Encode {
        path: Utf8PathBuf,
        index: usize,
        #[source]
        source: RecordError,
    },
}

/// Read every book record. A missing file is an empty catalog.
pub fn read_books(path: &Utf8Path) -> Result<Vec<BookRecord>, StoreError> {
    read_lines(path, decode_book)
}

pub fn write_books(path: &Utf8Path, books: &[BookRecord]) -> Result<(), StoreError> {
    write_lines(path, books, encode_book)
}

/// Read every borrow record. A missing file is an empty ledger.
pub fn read_borrow_records(path: &Utf8Path) -> Result<Vec<BorrowRecord>, StoreError> {
    read_lines(path, decode_borrow)
}

pub fn write_borrow_records(path: &Utf8Path, records: &[BorrowRecord]) -> Result<(), StoreError> {
    write_lines(path, records, encode_borrow)
}

fn read_lines<T>(
    path: &Utf8Path,
    decode: fn(&str) -> Result<T, RecordError>,
) -> Result<Vec<T>, StoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path, "no data file yet");
            return Ok(Vec::new());
        }
        Err(e) => return Err(io_error(path, e)),
    };

    let mut out = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = decode(line).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            line: i + 1,
            source,
        })?;
        out.push(record);
    }

    debug!(path = %path, records = out.len(), "loaded records");
    Ok(out)
}

/// Encode everything first so a bad record never leaves a half-written file, then swap the
/// new contents in through a sibling temp file.
fn write_lines<T>(
    path: &Utf8Path,
    items: &[T],
    encode: fn(&T) -> Result<String, RecordError>,
) -> Result<(), StoreError> {
    let contents = encode_lines(path, items, encode)?;
    let tmp = stage(path, &contents)?;
    commit(&tmp, path)?;

    debug!(path = %path, records = items.len(), "saved records");
    Ok(())
}

/// Write both files as one unit.
///
/// Both temp files are staged before either is renamed into place. If the borrow records
/// cannot be committed, the books file is put back the way it was, so a reload never sees
/// stock that was lent without the loan that took it.
pub fn write_library(
    books_path: &Utf8Path,
    books: &[BookRecord],
    loans_path: &Utf8Path,
    records: &[BorrowRecord],
) -> Result<(), StoreError> {
    let books_contents = encode_lines(books_path, books, encode_book)?;
    let loans_contents = encode_lines(loans_path, records, encode_borrow)?;

    let previous_books = read_existing(books_path)?;
    let books_tmp = stage(books_path, &books_contents)?;
    let loans_tmp = match stage(loans_path, &loans_contents) {
        Ok(tmp) => tmp,
        Err(err) => {
            discard(&books_tmp);
            return Err(err);
        }
    };

    if let Err(err) = commit(&books_tmp, books_path) {
        discard(&loans_tmp);
        return Err(err);
    }
    if let Err(err) = commit(&loans_tmp, loans_path) {
        discard(&loans_tmp);
        restore(books_path, previous_books.as_deref());
        return Err(err);
    }

    debug!(
        books = %books_path,
        loans = %loans_path,
        book_records = books.len(),
        borrow_records = records.len(),
        "saved library"
    );
    Ok(())
}

fn encode_lines<T>(
    path: &Utf8Path,
    items: &[T],
    encode: fn(&T) -> Result<String, RecordError>,
) -> Result<String, StoreError> {
    let mut contents = String::new();
    for (index, item) in items.iter().enumerate() {
        let line = encode(item).map_err(|source| StoreError::Encode {
            path: path.to_path_buf(),
            index,
            source,
        })?;
        contents.push_str(&line);
        contents.push('\n');
    }
    Ok(contents)
}

/// Write `contents` next to `path` and return the temp file.
fn stage(path: &Utf8Path, contents: &str) -> Result<Utf8PathBuf, StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }

    let tmp = temp_path(path);
    fs::write(&tmp, contents).map_err(|e| io_error(&tmp, e))?;
    Ok(tmp)
}

fn commit(tmp: &Utf8Path, path: &Utf8Path) -> Result<(), StoreError> {
    fs::rename(tmp, path).map_err(|e| io_error(path, e))
}

fn read_existing(path: &Utf8Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path, e)),
    }
}

fn discard(tmp: &Utf8Path) {
    if let Err(e) = fs::remove_file(tmp) {
        warn!(path = %tmp, error = %e, "could not remove temp file");
    }
}

/// Put `path` back to `previous`; `None` means the file did not exist.
fn restore(path: &Utf8Path, previous: Option<&str>) {
    let result = match previous {
        Some(contents) => stage(path, contents).and_then(|tmp| commit(&tmp, path)),
        None => fs::remove_file(path).map_err(|e| io_error(path, e)),
    };
    match result {
        Ok(()) => debug!(path = %path, "rolled back after failed save"),
        Err(err) => warn!(path = %path, error = %err, "rollback failed; file may be ahead of the ledger"),
    }
}

fn temp_path(path: &Utf8Path) -> Utf8PathBuf {
    let name = path.file_name().unwrap_or("records");
    path.with_file_name(format!(".{}.tmp", name))
}

fn io_error(path: &Utf8Path, e: std::io::Error) -> StoreError {
    // fs-err messages already name the path.
    StoreError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_is_hidden_sibling() {
        let p = Utf8Path::new("data/books.txt");
        assert_eq!(temp_path(p), Utf8PathBuf::from("data/.books.txt.tmp"));
    }
}

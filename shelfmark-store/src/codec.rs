use shelfmark_domain::{MAX_COPIES, MAX_YEAR, MIN_YEAR};
use shelfmark_types::{BookRecord, BorrowRecord, Timestamp, TimestampParseError};
use std::str::FromStr;
use thiserror::Error;

pub const FIELD_DELIMITER: char = '|';

/// title|author|year|totalCopies|availableCopies|category|addedDate
pub const BOOK_FIELDS: usize = 7;

/// title|category|borrowerName|borrowerId|copies|borrowDate|returnDate|returned
pub const BORROW_FIELDS: usize = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("field '{field}' is not a valid number: '{value}'")]
    Number { field: &'static str, value: String },

    #[error("returned flag must be \"0\" or \"1\", got '{value}'")]
    ReturnedFlag { value: String },

    #[error(transparent)]
    Timestamp(#[from] TimestampParseError),

    #[error("field '{field}' contains the '|' delimiter or a line break")]
    DelimiterInField { field: &'static str },

    #[error("available copies ({available}) exceed total copies ({total})")]
    CopyCounts { available: u32, total: u32 },

    #[error("total copies {total} exceed {max}", max = MAX_COPIES)]
    TotalCopies { total: u32 },

    #[error("year {year} is outside {min}..={max}", min = MIN_YEAR, max = MAX_YEAR)]
    Year { year: i32 },

    #[error("a borrow record holds exactly 1 copy, found {copies}")]
    BorrowedCopies { copies: u32 },
}

pub fn encode_book(book: &BookRecord) -> Result<String, RecordError> {
    check_field("title", &book.title)?;
    check_field("author", &book.author)?;
    check_field("category", &book.category)?;

    Ok([
        book.title.clone(),
        book.author.clone(),
        book.year.to_string(),
        book.total_copies.to_string(),
        book.available_copies.to_string(),
        book.category.clone(),
        book.added_date.to_string(),
    ]
    .join("|"))
}

pub fn decode_book(line: &str) -> Result<BookRecord, RecordError> {
    let fields = split(line, BOOK_FIELDS)?;

    let year = number("year", fields[2])?;
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(RecordError::Year { year });
    }

    let total_copies = number("totalCopies", fields[3])?;
    if total_copies > MAX_COPIES {
        return Err(RecordError::TotalCopies {
            total: total_copies,
        });
    }
    let available_copies = number("availableCopies", fields[4])?;
    if available_copies > total_copies {
        return Err(RecordError::CopyCounts {
            available: available_copies,
            total: total_copies,
        });
    }

    Ok(BookRecord {
        title: fields[0].to_string(),
        author: fields[1].to_string(),
        year,
        total_copies,
        available_copies,
        category: fields[5].to_string(),
        added_date: fields[6].parse()?,
    })
}

pub fn encode_borrow(record: &BorrowRecord) -> Result<String, RecordError> {
    check_field("bookTitle", &record.book_title)?;
    check_field("bookCategory", &record.book_category)?;
    check_field("borrowerName", &record.borrower_name)?;
    check_field("borrowerId", &record.borrower_id)?;

    Ok([
        record.book_title.clone(),
        record.book_category.clone(),
        record.borrower_name.clone(),
        record.borrower_id.clone(),
        record.borrowed_copies.to_string(),
        record.borrow_date.to_string(),
        record.return_date.to_string(),
        if record.returned { "1" } else { "0" }.to_string(),
    ]
    .join("|"))
}

pub fn decode_borrow(line: &str) -> Result<BorrowRecord, RecordError> {
    let fields = split(line, BORROW_FIELDS)?;

    let borrowed_copies = number("copies", fields[4])?;
    if borrowed_copies != 1 {
        return Err(RecordError::BorrowedCopies {
            copies: borrowed_copies,
        });
    }

    let returned = match fields[7].trim() {
        "0" => false,
        "1" => true,
        other => {
            return Err(RecordError::ReturnedFlag {
                value: other.to_string(),
            });
        }
    };

    Ok(BorrowRecord {
        book_title: fields[0].to_string(),
        book_category: fields[1].to_string(),
        borrower_name: fields[2].to_string(),
        borrower_id: fields[3].to_string(),
        borrowed_copies,
        borrow_date: fields[5].parse::<Timestamp>()?,
        return_date: fields[6].parse::<Timestamp>()?,
        returned,
    })
}

fn split(line: &str, expected: usize) -> Result<Vec<&str>, RecordError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if fields.len() != expected {
        return Err(RecordError::FieldCount {
            expected,
            found: fields.len(),
        });
    }
    Ok(fields)
}

fn number<T: FromStr>(field: &'static str, raw: &str) -> Result<T, RecordError> {
    raw.trim().parse().map_err(|_| RecordError::Number {
        field,
        value: raw.to_string(),
    })
}

fn check_field(field: &'static str, value: &str) -> Result<(), RecordError> {
    if value.contains([FIELD_DELIMITER, '\n', '\r']) {
        Err(RecordError::DelimiterInField { field })
    } else {
        Ok(())
    }
}

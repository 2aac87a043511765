//! Flat-file persistence for shelfmark.
//!
//! One record per line, fields separated by `|`. There is no escaping: a field that contains the
//! delimiter or a line break cannot be stored and is refused when encoding. Front ends keep such
//! characters out through `shelfmark_domain::validation`.

mod codec;
mod load;

pub use codec::{
    BOOK_FIELDS, BORROW_FIELDS, FIELD_DELIMITER, RecordError, decode_book, decode_borrow,
    encode_book, encode_borrow,
};
pub use load::{
    StoreError, read_books, read_borrow_records, write_books, write_borrow_records, write_library,
};

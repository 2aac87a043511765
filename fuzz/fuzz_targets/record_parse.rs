#![no_main]

use libfuzzer_sys::fuzz_target;
use shelfmark_store::{decode_book, decode_borrow, encode_book, encode_borrow};

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else { return };

    // Whatever decodes must encode back to something that decodes to the same record.
    if let Ok(book) = decode_book(line) {
        assert!(book.available_copies <= book.total_copies);
        if let Ok(encoded) = encode_book(&book) {
            assert_eq!(decode_book(&encoded).ok(), Some(book));
        }
    }

    if let Ok(record) = decode_borrow(line) {
        if let Ok(encoded) = encode_borrow(&record) {
            assert_eq!(decode_borrow(&encoded).ok(), Some(record));
        }
    }
});

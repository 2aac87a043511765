use pretty_assertions::assert_eq;
use shelfmark_types::{BookPatch, BookRecord, BorrowRecord, ReturnReceipt, Timestamp};

fn at(day: u32) -> Timestamp {
    Timestamp::from_ymd_hms(2025, 3, day, 10, 0, 0).unwrap()
}

#[test]
fn book_record_serializes_with_text_timestamp() {
    let book = BookRecord::new("Dune", "Herbert", 1965, "Fiction", 3, at(4));
    let value = serde_json::to_value(&book).expect("serialize");

    assert_eq!(
        value,
        serde_json::json!({
            "title": "Dune",
            "author": "Herbert",
            "year": 1965,
            "category": "Fiction",
            "total_copies": 3,
            "available_copies": 3,
            "added_date": "Tue Mar 04 10:00:00 2025"
        })
    );
}

#[test]
fn empty_patch_serializes_to_empty_object() {
    let value = serde_json::to_value(BookPatch::default()).expect("serialize");
    assert_eq!(value, serde_json::json!({}));
}

#[test]
fn patch_deserializes_from_partial_object() {
    let patch: BookPatch =
        serde_json::from_value(serde_json::json!({ "year": 1966 })).expect("deserialize");
    assert_eq!(patch.year, Some(1966));
    assert!(patch.title.is_none());
    assert!(patch.total_copies.is_none());
}

#[test]
fn borrow_record_deserializes() {
    let record: BorrowRecord = serde_json::from_value(serde_json::json!({
        "book_title": "Dune",
        "book_category": "Fiction",
        "borrower_name": "Alice",
        "borrower_id": "A1",
        "borrowed_copies": 1,
        "borrow_date": "Tue Mar 04 10:00:00 2025",
        "return_date": "Tue Mar 18 10:00:00 2025",
        "returned": false
    }))
    .expect("deserialize");

    assert!(record.is_active());
    assert_eq!(record.due_date(), at(18));
}

#[test]
fn receipt_reports_lateness() {
    let receipt = ReturnReceipt {
        book_title: "Dune".to_string(),
        book_category: "Fiction".to_string(),
        borrower_name: "Alice".to_string(),
        borrower_id: "A1".to_string(),
        borrow_date: at(4),
        due_date: at(18),
        returned_at: at(21),
        days_late: 3,
        fine: 15,
    };
    assert!(receipt.is_late());

    let value = serde_json::to_value(&receipt).expect("serialize");
    assert_eq!(value["fine"], serde_json::json!(15));
    assert_eq!(value["returned_at"], serde_json::json!("Fri Mar 21 10:00:00 2025"));
}

//! End-to-end lending scenarios against the public domain API.

use pretty_assertions::assert_eq;
use shelfmark_domain::{Catalog, DeleteOutcome, Ledger, LibraryError};
use shelfmark_types::{Borrower, Timestamp};

fn t0() -> Timestamp {
    "Tue Mar 04 13:05:02 2025".parse().unwrap()
}

#[test]
fn dune_lifecycle_with_late_return() {
    let mut catalog = Catalog::new();
    let mut ledger = Ledger::default();
    let alice = Borrower::new("Alice", "A1");

    catalog
        .add_copies("Dune", "Herbert", 1965, "Fiction", 3, t0())
        .unwrap();
    assert_eq!(catalog.len(), 1);
    let book = catalog.find("Fiction", "Dune").unwrap();
    assert_eq!((book.total_copies, book.available_copies), (3, 3));

    let due = ledger
        .borrow(&mut catalog, "Dune", "Fiction", &alice, t0())
        .unwrap()
        .return_date;
    assert_eq!(due.to_string(), "Tue Mar 18 13:05:02 2025");
    assert_eq!(catalog.find("Fiction", "Dune").unwrap().available_copies, 2);
    assert_eq!(ledger.active().count(), 1);

    let err = ledger
        .borrow(&mut catalog, "Dune", "Fiction", &alice, t0())
        .unwrap_err();
    assert!(matches!(err, LibraryError::AlreadyBorrowed { .. }));

    let receipt = ledger
        .return_book(&mut catalog, "Dune", "Fiction", &alice, due.add_days(3))
        .unwrap();
    assert_eq!(catalog.find("Fiction", "Dune").unwrap().available_copies, 3);
    assert!(ledger.records()[0].returned);
    assert_eq!(receipt.days_late, 3);
    assert_eq!(receipt.fine, 15);
}

#[test]
fn deleting_every_copy_removes_the_book() {
    let mut catalog = Catalog::new();
    catalog
        .add_copies("Emma", "Austen", 1815, "Classics", 2, t0())
        .unwrap();

    assert_eq!(
        catalog.delete_copies("classics", "emma", 2),
        Ok(DeleteOutcome::Removed)
    );
    assert!(matches!(
        catalog.find("Classics", "Emma"),
        Err(LibraryError::NotFound { .. })
    ));
}

#[test]
fn ledger_survives_catalog_title_change() {
    let mut catalog = Catalog::new();
    let mut ledger = Ledger::default();
    let bob = Borrower::new("Bob", "B2");

    catalog
        .add_copies("Solaris", "Lem", 1961, "Fiction", 1, t0())
        .unwrap();
    ledger
        .borrow(&mut catalog, "Solaris", "Fiction", &bob, t0())
        .unwrap();

    catalog
        .update(
            "Fiction",
            "Solaris",
            &shelfmark_types::BookPatch {
                category: Some("Science Fiction".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    // The weak key no longer resolves under the new category.
    let err = ledger
        .return_book(&mut catalog, "Solaris", "Science Fiction", &bob, t0())
        .unwrap_err();
    assert!(matches!(err, LibraryError::NoActiveBorrow { .. }));
    assert_eq!(ledger.active().count(), 1);
}

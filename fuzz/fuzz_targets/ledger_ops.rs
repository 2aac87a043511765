#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shelfmark_domain::{Catalog, Ledger, LendingPolicy};
use shelfmark_types::{BookRef, Borrower, Timestamp};

const TITLES: [&str; 3] = ["Dune", "Emma", "Ulysses"];
const CATEGORIES: [&str; 2] = ["Fiction", "Classics"];
const BORROWERS: [&str; 3] = ["A1", "B2", "C3"];

#[derive(Debug, Arbitrary)]
enum Op {
    Add { title: u8, category: u8, copies: u8 },
    Delete { title: u8, category: u8, copies: u8 },
    Borrow { title: u8, category: u8, borrower: u8 },
    BorrowMany { titles: Vec<(u8, u8)>, borrower: u8 },
    Return { title: u8, category: u8, borrower: u8 },
    Sort { category: u8 },
    Wait { days: u8 },
}

fn pick<'a>(options: &[&'a str], i: u8) -> &'a str {
    options[usize::from(i) % options.len()]
}

fuzz_target!(|ops: Vec<Op>| {
    let Some(mut now) = Timestamp::from_ymd_hms(2025, 1, 1, 9, 0, 0) else { return };
    let mut catalog = Catalog::new();
    let mut ledger = Ledger::new(LendingPolicy::default());

    for op in ops {
        match op {
            Op::Add { title, category, copies } => {
                let title = pick(&TITLES, title);
                let _ = catalog.add_copies(title, "Some Author", 1950, pick(&CATEGORIES, category), u32::from(copies), now);
            }
            Op::Delete { title, category, copies } => {
                let _ = catalog.delete_copies(pick(&CATEGORIES, category), pick(&TITLES, title), u32::from(copies));
            }
            Op::Borrow { title, category, borrower } => {
                let who = Borrower::new("Reader", pick(&BORROWERS, borrower));
                let _ = ledger.borrow(&mut catalog, pick(&TITLES, title), pick(&CATEGORIES, category), &who, now);
            }
            Op::BorrowMany { titles, borrower } => {
                let who = Borrower::new("Reader", pick(&BORROWERS, borrower));
                let requests: Vec<BookRef> = titles
                    .into_iter()
                    .take(6)
                    .map(|(t, c)| BookRef::new(pick(&CATEGORIES, c), pick(&TITLES, t)))
                    .collect();
                let books_before = catalog.records().to_vec();
                let loans_before = ledger.len();
                if ledger.borrow_many(&mut catalog, &who, &requests, now).is_err() {
                    assert_eq!(catalog.records(), &books_before[..]);
                    assert_eq!(ledger.len(), loans_before);
                }
            }
            Op::Return { title, category, borrower } => {
                let who = Borrower::new("Reader", pick(&BORROWERS, borrower));
                let _ = ledger.return_book(&mut catalog, pick(&TITLES, title), pick(&CATEGORIES, category), &who, now);
            }
            Op::Sort { category } => {
                catalog.sort_by_title(pick(&CATEGORIES, category));
            }
            Op::Wait { days } => {
                now = now.add_days(i64::from(days));
            }
        }

        for book in catalog.records() {
            assert!(book.available_copies <= book.total_copies);
        }
        for (i, a) in ledger.active().enumerate() {
            for b in ledger.active().skip(i + 1) {
                assert!(!b.is_loan_of(&a.borrower_id, &a.book_title, &a.book_category));
            }
        }
    }
});

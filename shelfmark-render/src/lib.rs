//! Rendering helpers (markdown) for human-readable command output.

use shelfmark_domain::{AddOutcome, DeleteOutcome};
use shelfmark_types::{BookRecord, BorrowRecord, ReturnReceipt, Timestamp};

pub fn render_books_md<'a>(heading: &str, books: impl IntoIterator<Item = &'a BookRecord>) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", heading));

    let mut rows = books.into_iter().peekable();
    if rows.peek().is_none() {
        out.push_str("_No books._\n");
        return out;
    }

    out.push_str("| Title | Author | Year | Category | Available | Total | Added |\n");
    out.push_str("|---|---|---|---|---|---|---|\n");
    for b in rows {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            b.title, b.author, b.year, b.category, b.available_copies, b.total_copies, b.added_date
        ));
    }
    out
}

pub fn render_book_md(book: &BookRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", book.title));
    out.push_str(&format!("- Author: {}\n", book.author));
    out.push_str(&format!("- Year: {}\n", book.year));
    out.push_str(&format!("- Category: {}\n", book.category));
    out.push_str(&format!(
        "- Copies: {} available of {} ({} on loan)\n",
        book.available_copies,
        book.total_copies,
        book.borrowed_copies()
    ));
    out.push_str(&format!("- Added: {}\n", book.added_date));
    out
}

pub fn render_categories_md(categories: &[String]) -> String {
    let mut out = String::from("# Categories\n\n");
    if categories.is_empty() {
        out.push_str("_No categories._\n");
        return out;
    }
    for c in categories {
        out.push_str(&format!("- {}\n", c));
    }
    out
}

/// Loan table. Active loans due before `now` are flagged.
pub fn render_loans_md<'a>(
    heading: &str,
    records: impl IntoIterator<Item = &'a BorrowRecord>,
    now: Timestamp,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", heading));

    let mut rows = records.into_iter().peekable();
    if rows.peek().is_none() {
        out.push_str("_No loans._\n");
        return out;
    }

    out.push_str("| Title | Category | Borrower | ID | Borrowed | Due | Status |\n");
    out.push_str("|---|---|---|---|---|---|---|\n");
    for r in rows {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            r.book_title,
            r.book_category,
            r.borrower_name,
            r.borrower_id,
            r.borrow_date,
            r.return_date,
            loan_status(r, now)
        ));
    }
    out
}

pub fn render_borrow_md(records: &[BorrowRecord]) -> String {
    let mut out = String::new();
    match records {
        [] => out.push_str("_Nothing borrowed._\n"),
        [first, ..] => {
            out.push_str(&format!(
                "Borrowed by {} ({}) on {}\n\n",
                first.borrower_name, first.borrower_id, first.borrow_date
            ));
            for r in records {
                out.push_str(&format!(
                    "- {} ({}) due {}\n",
                    r.book_title, r.book_category, r.return_date
                ));
            }
        }
    }
    out
}

pub fn render_return_md(receipt: &ReturnReceipt) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Returned '{}' ({}) from {} ({})\n\n",
        receipt.book_title, receipt.book_category, receipt.borrower_name, receipt.borrower_id
    ));
    out.push_str(&format!("- Borrowed: {}\n", receipt.borrow_date));
    out.push_str(&format!("- Due: {}\n", receipt.due_date));
    out.push_str(&format!("- Returned: {}\n", receipt.returned_at));
    if receipt.is_late() {
        out.push_str(&format!(
            "- Late by {} day(s), fine {}\n",
            receipt.days_late, receipt.fine
        ));
    } else {
        out.push_str("- On time, no fine\n");
    }
    out
}

pub fn render_add_md(title: &str, outcome: &AddOutcome) -> String {
    match outcome {
        AddOutcome::Created => format!("Added '{}' as a new book\n", title),
        AddOutcome::Merged { total_copies } => format!(
            "Added copies to existing '{}' (now {} total)\n",
            title, total_copies
        ),
    }
}

pub fn render_delete_md(title: &str, outcome: &DeleteOutcome) -> String {
    match outcome {
        DeleteOutcome::Removed => format!("Removed '{}' from the catalog\n", title),
        DeleteOutcome::Reduced {
            total_copies,
            available_copies,
        } => format!(
            "Deleted copies of '{}' ({} available of {} left)\n",
            title, available_copies, total_copies
        ),
    }
}

fn loan_status(r: &BorrowRecord, now: Timestamp) -> &'static str {
    if r.returned {
        "returned"
    } else if r.is_overdue(now) {
        "overdue"
    } else {
        "on loan"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(day: u32) -> Timestamp {
        Timestamp::from_ymd_hms(2025, 3, day, 13, 5, 2).unwrap()
    }

    fn loan(title: &str, returned: bool) -> BorrowRecord {
        BorrowRecord {
            book_title: title.to_string(),
            book_category: "Fiction".to_string(),
            borrower_name: "Alice".to_string(),
            borrower_id: "A1".to_string(),
            borrowed_copies: 1,
            borrow_date: at(4),
            return_date: at(18),
            returned,
        }
    }

    #[test]
    fn books_table() {
        let dune = BookRecord::new("Dune", "Frank Herbert", 1965, "Fiction", 3, at(4));
        let out = render_books_md("Fiction", [&dune]);
        assert_eq!(
            out,
            "# Fiction\n\n\
             | Title | Author | Year | Category | Available | Total | Added |\n\
             |---|---|---|---|---|---|---|\n\
             | Dune | Frank Herbert | 1965 | Fiction | 3 | 3 | Tue Mar 04 13:05:02 2025 |\n"
        );
    }

    #[test]
    fn empty_lists_say_so() {
        assert_eq!(render_books_md("Poetry", []), "# Poetry\n\n_No books._\n");
        assert_eq!(render_categories_md(&[]), "# Categories\n\n_No categories._\n");
        assert!(render_loans_md("Loans", [], at(4)).ends_with("_No loans._\n"));
    }

    #[test]
    fn loan_statuses() {
        let records = [loan("Dune", false), loan("Emma", true)];
        let out = render_loans_md("Loans", &records, at(20));
        assert!(out.contains("| Dune | Fiction | Alice | A1 |"));
        assert!(out.contains("| overdue |"));
        assert!(out.contains("| returned |"));

        let out = render_loans_md("Loans", &records[..1], at(10));
        assert!(out.contains("| on loan |"));
    }

    #[test]
    fn late_return_shows_fine() {
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
        let out = render_return_md(&receipt);
        assert!(out.starts_with("Returned 'Dune' (Fiction) from Alice (A1)\n"));
        assert!(out.contains("- Late by 3 day(s), fine 15\n"));
    }

    #[test]
    fn outcomes() {
        assert_eq!(
            render_add_md("Dune", &AddOutcome::Merged { total_copies: 5 }),
            "Added copies to existing 'Dune' (now 5 total)\n"
        );
        assert_eq!(
            render_delete_md("Dune", &DeleteOutcome::Removed),
            "Removed 'Dune' from the catalog\n"
        );
    }

    #[test]
    fn batch_borrow_lists_each_title() {
        let out = render_borrow_md(&[loan("Dune", false), loan("Emma", false)]);
        assert_eq!(
            out,
            "Borrowed by Alice (A1) on Tue Mar 04 13:05:02 2025\n\n\
             - Dune (Fiction) due Tue Mar 18 13:05:02 2025\n\
             - Emma (Fiction) due Tue Mar 18 13:05:02 2025\n"
        );
    }
}

//! Case-insensitive text keys.

/// Normalized comparison key for titles, authors, categories and borrower ids.
pub fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

/// True when `a` and `b` are equal ignoring case and surrounding whitespace.
pub fn eq_fold(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

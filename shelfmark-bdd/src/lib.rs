//! BDD harness (cucumber-rs).
//!
//! Scenarios drive `shelfmark-core` over the in-memory store and a fixed clock.

pub fn noop() {}

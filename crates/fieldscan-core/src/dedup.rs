//! # Deduplication Set
//!
//! Insertion-ordered set of barcode strings seen during one scan session.
//!
//! ## Why Not Just a HashSet?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Detections:   880…890   880…890   490…891   880…890                    │
//! │                   │         │         │         │                       │
//! │                   ▼         ▼         ▼         ▼                       │
//! │  insert():      true      false     true      false                     │
//! │                                                                         │
//! │  into_vec():   [880…890, 490…891]   ← first-seen order, each once       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The recognition engine reports codes in whatever order the camera sweeps
//! past them. The persisted batch must preserve first-seen order, so the
//! set keeps a `Vec` for order and a `HashSet` for membership.
//!
//! The set is a plain value: a session owns one, moves it out on completion,
//! and nothing else can observe it in between.

use std::collections::HashSet;

/// Insertion-ordered unique collection of barcodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl DedupSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `code` if absent. Returns true when the set grew.
    pub fn insert(&mut self, code: impl Into<String>) -> bool {
        let code = code.into();
        if self.seen.contains(&code) {
            return false;
        }

        self.seen.insert(code.clone());
        self.order.push(code);
        true
    }

    /// Returns true if `code` has been inserted.
    pub fn contains(&self, code: &str) -> bool {
        self.seen.contains(code)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates codes in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Consumes the set, returning codes in first-seen order.
    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

impl<S: Into<String>> FromIterator<S> for DedupSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = DedupSet::new();
        for code in iter {
            set.insert(code);
        }
        set
    }
}

impl<S: Into<String>> Extend<S> for DedupSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for code in iter {
            self.insert(code);
        }
    }
}

//! Shared, ordered record of every side effect of a test run.

use std::sync::{Arc, Mutex};

/// Ordered log of host, VM shell and browser interactions.
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().expect("journal lock").push(entry.into());
    }

    /// Snapshot of all entries in order.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().expect("journal lock").clone()
    }

    /// Number of entries equal to `entry`.
    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }

    /// Number of entries starting with `prefix`.
    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.entries()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    /// Index of the first entry equal to `entry`.
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    /// Whether any entry equals `entry`.
    pub fn contains(&self, entry: &str) -> bool {
        self.position(entry).is_some()
    }

    /// Assert that `expected` appear in this relative order (other entries
    /// may be interleaved).
    pub fn assert_in_order(&self, expected: &[&str]) {
        let entries = self.entries();
        let mut cursor = 0;
        for want in expected {
            match entries[cursor..].iter().position(|e| e == want) {
                Some(offset) => cursor += offset + 1,
                None => panic!(
                    "expected {want:?} after position {cursor} in journal:\n{}",
                    entries.join("\n")
                ),
            }
        }
    }
}

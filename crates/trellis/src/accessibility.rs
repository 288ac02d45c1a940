//! Accessibility identifiers.
//!
//! A label and the input it describes are paired through a shared id, the
//! label's `for` target. Ids come from an [`AriaIdAllocator`] that must
//! never hand out the same id twice within a session.

use std::sync::atomic::{AtomicU64, Ordering};

/// Allocates identifiers that are unique for the lifetime of the allocator.
pub trait AriaIdAllocator: Send + Sync {
    /// Return a fresh id starting with `prefix`.
    fn next_id(&self, prefix: &str) -> String;
}

/// Counter-based allocator producing `{prefix}-{n}`.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    /// Create an allocator starting at 1.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AriaIdAllocator for SequentialIds {
    fn next_id(&self, prefix: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}-{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::new();
        assert_eq!(ids.next_id("ctrl"), "ctrl-1");
        assert_eq!(ids.next_id("ctrl"), "ctrl-2");
        assert_eq!(ids.next_id("label"), "label-3");
    }

    #[test]
    fn test_ids_unique_across_threads() {
        let ids = Arc::new(SequentialIds::new());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = ids.clone();
                std::thread::spawn(move || (0..100).map(|_| ids.next_id("ctrl")).collect::<Vec<_>>())
            })
            .collect();

        let mut all = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(all.insert(id));
            }
        }
        assert_eq!(all.len(), 400);
    }
}

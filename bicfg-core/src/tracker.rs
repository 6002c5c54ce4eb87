//! Change tracking for `onChange` conditions.

use std::collections::BTreeSet;

/// Records which variables were mutated since the last evaluation pass began.
///
/// A mark is consumed by exactly one pass, which gives `onChange` its
/// edge-triggered behaviour: re-evaluating without a new mutation sees
/// nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeTracker {
    changed: BTreeSet<String>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a variable as changed.
    pub fn mark(&mut self, id: impl Into<String>) {
        self.changed.insert(id.into());
    }

    /// Returns true if the variable was marked since the last clear.
    pub fn was_changed(&self, id: &str) -> bool {
        self.changed.contains(id)
    }

    /// Clears the mark for one variable.
    pub fn clear(&mut self, id: &str) {
        self.changed.remove(id);
    }

    /// Clears every mark.
    pub fn clear_all(&mut self) {
        self.changed.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changed.len()
    }

    /// Changed ids in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.changed.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_clear() {
        let mut tracker = ChangeTracker::new();
        assert!(!tracker.was_changed("a"));

        tracker.mark("a");
        tracker.mark("b");
        assert!(tracker.was_changed("a"));
        assert_eq!(tracker.len(), 2);

        tracker.clear("a");
        assert!(!tracker.was_changed("a"));
        assert!(tracker.was_changed("b"));

        tracker.clear_all();
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_mark_is_idempotent() {
        let mut tracker = ChangeTracker::new();
        tracker.mark("a");
        tracker.mark("a");
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.iter().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_clear_unknown_is_noop() {
        let mut tracker = ChangeTracker::new();
        tracker.mark("a");
        tracker.clear("missing");
        assert!(tracker.was_changed("a"));
    }
}

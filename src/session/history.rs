use std::collections::VecDeque;

/// Bounded linear undo history of committed documents
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    index: usize,
    depth: usize,
}

impl History {
    pub fn new(initial: String, depth: usize) -> Self {
        Self {
            entries: VecDeque::from([initial]),
            index: 0,
            depth: depth.max(1),
        }
    }

    pub fn current(&self) -> &str {
        &self.entries[self.index]
    }

    /// Record `document` after the current entry, discarding any redo branch.
    /// Returns false when it equals the current entry.
    pub fn commit(&mut self, document: &str) -> bool {
        if self.current() == document {
            return false;
        }
        self.entries.truncate(self.index + 1);
        self.entries.push_back(document.to_string());
        while self.entries.len() > self.depth {
            self.entries.pop_front();
        }
        self.index = self.entries.len() - 1;
        true
    }

    pub fn undo(&mut self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    pub fn redo(&mut self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo() {
        let mut history = History::new("a".into(), 10);
        assert!(history.commit("b"));
        assert!(history.commit("c"));

        assert_eq!(history.undo(), Some("b"));
        assert_eq!(history.undo(), Some("a"));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), Some("b"));
        assert_eq!(history.redo(), Some("c"));
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn test_commit_truncates_redo_branch() {
        let mut history = History::new("a".into(), 10);
        history.commit("b");
        history.commit("c");
        history.undo();
        history.commit("d");

        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        assert_eq!(history.undo(), Some("b"));
    }

    #[test]
    fn test_identical_commit_is_ignored() {
        let mut history = History::new("a".into(), 10);
        assert!(!history.commit("a"));
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_depth_drops_oldest() {
        let mut history = History::new("0".into(), 3);
        for i in 1..=5 {
            history.commit(&i.to_string());
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.undo(), Some("4"));
        assert_eq!(history.undo(), Some("3"));
        assert_eq!(history.undo(), None);
    }
}

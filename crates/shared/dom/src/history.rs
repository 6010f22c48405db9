use url::Url;

/// Who created a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    /// The entry the document was loaded with.
    Initial,
    /// Pushed by a programmatic navigation.
    Navigation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub url: Url,
    pub state: HistoryState,
}

/// Session history: a list of entries and a cursor.
#[derive(Debug, Clone)]
pub(crate) struct History {
    entries: Vec<HistoryEntry>,
    index: usize,
}

impl History {
    pub(crate) fn new(url: Url) -> Self {
        Self { entries: vec![HistoryEntry { url, state: HistoryState::Initial }], index: 0 }
    }

    pub(crate) fn current(&self) -> &HistoryEntry {
        &self.entries[self.index]
    }

    /// Drops forward entries, appends `entry` and makes it current.
    pub(crate) fn push(&mut self, entry: HistoryEntry) {
        self.entries.truncate(self.index + 1);
        self.entries.push(entry);
        self.index = self.entries.len() - 1;
    }

    /// Moves the cursor by `delta`. Out-of-range moves and `0` leave it untouched.
    pub(crate) fn traverse(&mut self, delta: isize) -> Option<&HistoryEntry> {
        if delta == 0 {
            return None;
        }
        let target = self.index.checked_add_signed(delta).filter(|i| *i < self.entries.len())?;
        self.index = target;
        Some(&self.entries[target])
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) const fn index(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse("https://example.test").unwrap().join(path).unwrap()
    }

    #[test]
    fn test_push_truncates_forward_entries() {
        let mut history = History::new(url("/"));
        history.push(HistoryEntry { url: url("/a"), state: HistoryState::Navigation });
        history.push(HistoryEntry { url: url("/b"), state: HistoryState::Navigation });
        assert_eq!(history.traverse(-2).map(|e| e.url.path()), Some("/"));

        history.push(HistoryEntry { url: url("/c"), state: HistoryState::Navigation });
        assert_eq!(history.len(), 2);
        assert_eq!(history.current().url.path(), "/c");
        assert!(history.traverse(1).is_none());
    }

    #[test]
    fn test_traverse_bounds() {
        let mut history = History::new(url("/"));
        assert!(history.traverse(-1).is_none());
        assert!(history.traverse(0).is_none());
        history.push(HistoryEntry { url: url("/a"), state: HistoryState::Navigation });
        assert!(history.traverse(5).is_none());
        assert_eq!(history.index(), 1);
        assert_eq!(history.traverse(-1).map(|e| e.state), Some(HistoryState::Initial));
    }
}

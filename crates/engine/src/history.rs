use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::debug;

pub const DEFAULT_HISTORY_CAP: usize = 50;
pub const DEFAULT_SNAPSHOT_DEBOUNCE: Duration = Duration::from_millis(50);

/// Linear undo/redo stack of full-state snapshots.
///
/// Once the first snapshot is committed the cursor always points at a valid
/// entry. Committing while the cursor is behind the tail drops the redo
/// entries first; exceeding the cap evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<T>,
    cursor: usize,
    cap: usize,
}

impl<T: Clone> History<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            cap: cap.max(1),
        }
    }

    pub fn with_initial(cap: usize, initial: T) -> Self {
        let mut history = Self::new(cap);
        history.commit(initial);
        history
    }

    pub fn commit(&mut self, snapshot: T) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(snapshot);
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
        debug!(
            depth = self.entries.len(),
            cursor = self.cursor,
            "history_committed"
        );
    }

    /// Steps back one entry and returns the state to restore.
    pub fn undo(&mut self) -> Option<&T> {
        if self.cursor == 0 || self.entries.is_empty() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    pub fn redo(&mut self) -> Option<&T> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn current(&self) -> Option<&T> {
        self.entries.get(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Drops everything and starts over from `initial`.
    pub fn reset(&mut self, initial: T) {
        self.entries.clear();
        self.cursor = 0;
        self.commit(initial);
    }
}

/// Trailing-edge debounce timer. Each `schedule` pushes the deadline out by
/// the full window, so a burst of edits fires once after the burst ends.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consumes the pending deadline if it has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Consumes the pending deadline regardless of time. Returns whether
    /// anything was pending.
    pub fn take(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixty_commits_keep_the_latest_fifty() {
        let mut history = History::new(DEFAULT_HISTORY_CAP);
        for state in 1..=60 {
            history.commit(state);
        }
        assert_eq!(history.len(), 50);
        assert_eq!(history.current(), Some(&60));
        assert!(!history.can_redo());

        let mut oldest = 0;
        while let Some(state) = history.undo() {
            oldest = *state;
        }
        assert_eq!(oldest, 11);
    }

    #[test]
    fn commit_after_undo_truncates_redo_entries() {
        let mut history = History::with_initial(DEFAULT_HISTORY_CAP, 0);
        history.commit(1);
        history.commit(2);
        assert_eq!(history.undo(), Some(&1));
        assert!(history.can_redo());

        history.commit(3);
        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        assert_eq!(history.redo(), None);
        assert_eq!(history.undo(), Some(&1));
        assert_eq!(history.undo(), Some(&0));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), Some(&1));
        assert_eq!(history.redo(), Some(&3));
    }

    #[test]
    fn cursor_stays_valid_at_cap_after_undo() {
        let mut history = History::new(3);
        for state in 0..3 {
            history.commit(state);
        }
        history.undo();
        history.commit(10);
        history.commit(11);
        assert_eq!(history.len(), 3);
        assert_eq!(history.current(), Some(&11));
        assert_eq!(history.undo(), Some(&10));
        assert_eq!(history.undo(), Some(&1));
        assert_eq!(history.undo(), None);
    }

    #[test]
    fn empty_history_has_nothing_to_undo() {
        let mut history: History<u32> = History::new(5);
        assert!(history.is_empty());
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), None);
        assert_eq!(history.current(), None);
    }

    #[test]
    fn reset_starts_over() {
        let mut history = History::with_initial(5, 'a');
        history.commit('b');
        history.reset('z');
        assert_eq!(history.len(), 1);
        assert_eq!(history.current(), Some(&'z'));
        assert!(!history.can_undo());
    }

    #[test]
    fn debouncer_fires_once_after_trailing_window() {
        let base = Instant::now();
        let mut debouncer = Debouncer::new(DEFAULT_SNAPSHOT_DEBOUNCE);
        debouncer.schedule(base);
        debouncer.schedule(base + Duration::from_millis(30));
        assert!(!debouncer.poll(base + Duration::from_millis(60)));
        assert!(debouncer.poll(base + Duration::from_millis(80)));
        assert!(!debouncer.poll(base + Duration::from_millis(200)));
    }

    #[test]
    fn debouncer_cancel_and_take() {
        let base = Instant::now();
        let mut debouncer = Debouncer::new(DEFAULT_SNAPSHOT_DEBOUNCE);
        debouncer.schedule(base);
        debouncer.cancel();
        assert!(!debouncer.is_pending());
        assert!(!debouncer.poll(base + Duration::from_secs(1)));

        debouncer.schedule(base);
        assert!(debouncer.take());
        assert!(!debouncer.take());
    }
}

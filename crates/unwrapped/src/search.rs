//! Search panel state: debounced dispatch, stale-result filtering and the
//! inactivity auto-close timer.
//!
//! An in-flight search cannot be aborted; its result is simply ignored
//! when a newer dispatch has superseded it.

use std::time::Instant;

use crate::config::{AUTO_CLOSE_DELAY, SEARCH_DEBOUNCE};
use crate::youtube::SearchResult;

/// A search the panel wants dispatched, tagged with its sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub seq: u64,
    pub query: String,
}

#[derive(Debug, Default)]
pub struct SearchPanel {
    open: bool,
    pub query: String,
    results: Vec<SearchResult>,
    searched: bool,
    searching: bool,
    seq: u64,
    pending: Option<(String, Instant)>,
    auto_close_at: Option<Instant>,
    hovered: bool,
}

impl SearchPanel {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    /// True once a search completed, so an empty result list means "no
    /// results" rather than "not searched yet".
    pub fn has_searched(&self) -> bool {
        self.searched
    }

    /// Toggle the panel. Opening clears any stale auto-close deadline.
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.auto_close_at = None;
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
        self.pending = None;
        self.auto_close_at = None;
        self.hovered = false;
    }

    /// A keystroke landed: re-arm the debounce timer. The newest text wins;
    /// any previously pending query is superseded.
    pub fn input_changed(&mut self, now: Instant) {
        if self.query.trim().is_empty() {
            self.pending = None;
            return;
        }
        self.pending = Some((self.query.clone(), now + SEARCH_DEBOUNCE));
    }

    /// Explicit submit (Enter or the search button): dispatch immediately,
    /// dropping the debounce.
    pub fn submit(&mut self) -> Option<Dispatch> {
        self.pending = None;
        let query = self.query.trim().to_owned();
        if query.is_empty() {
            return None;
        }
        Some(self.dispatch(query))
    }

    /// Promote an expired debounce into a dispatch.
    pub fn poll(&mut self, now: Instant) -> Option<Dispatch> {
        let (_, deadline) = self.pending.as_ref()?;
        if now < *deadline {
            return None;
        }
        let (query, _) = self.pending.take()?;
        Some(self.dispatch(query))
    }

    fn dispatch(&mut self, query: String) -> Dispatch {
        self.seq += 1;
        self.searching = true;
        Dispatch {
            seq: self.seq,
            query,
        }
    }

    /// Deliver a finished search. Results from superseded dispatches are
    /// ignored. Fresh results restart the auto-close countdown.
    pub fn finish(&mut self, seq: u64, results: Vec<SearchResult>, now: Instant) -> bool {
        if seq != self.seq {
            log::debug!("dropping stale search result (seq {seq} != {})", self.seq);
            return false;
        }
        self.searching = false;
        self.searched = true;
        self.results = results;
        self.start_auto_close(now);
        true
    }

    /// Hovering the panel pauses the auto-close; leaving restarts it.
    pub fn set_hovered(&mut self, hovered: bool, now: Instant) {
        if hovered == self.hovered {
            return;
        }
        self.hovered = hovered;
        if hovered {
            self.auto_close_at = None;
        } else if self.open {
            self.start_auto_close(now);
        }
    }

    fn start_auto_close(&mut self, now: Instant) {
        if !self.open || self.hovered {
            return;
        }
        self.auto_close_at = Some(now + AUTO_CLOSE_DELAY);
    }

    /// Advance the timers; returns true when the panel just auto-closed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.open {
            return false;
        }
        if let Some(deadline) = self.auto_close_at {
            if now >= deadline {
                self.close();
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn result(id: &str) -> SearchResult {
        SearchResult {
            id: id.to_owned(),
            title: format!("Title {id}"),
            thumbnail: String::new(),
            channel_title: "Chan".to_owned(),
        }
    }

    #[test]
    fn debounce_dispatches_only_after_the_quiet_period() {
        let now = Instant::now();
        let mut panel = SearchPanel::default();
        panel.toggle();
        panel.query = "lofi".to_owned();
        panel.input_changed(now);

        assert_eq!(panel.poll(now), None);
        assert_eq!(panel.poll(now + SEARCH_DEBOUNCE - Duration::from_millis(1)), None);
        let dispatch = panel.poll(now + SEARCH_DEBOUNCE).unwrap();
        assert_eq!(dispatch.query, "lofi");
        // Consumed: nothing left to poll.
        assert_eq!(panel.poll(now + SEARCH_DEBOUNCE * 2), None);
    }

    #[test]
    fn newer_keystrokes_supersede_the_pending_query() {
        let now = Instant::now();
        let mut panel = SearchPanel::default();
        panel.toggle();
        panel.query = "lo".to_owned();
        panel.input_changed(now);
        panel.query = "lofi beats".to_owned();
        panel.input_changed(now + Duration::from_millis(100));

        let dispatch = panel
            .poll(now + Duration::from_millis(100) + SEARCH_DEBOUNCE)
            .unwrap();
        assert_eq!(dispatch.query, "lofi beats");
    }

    #[test]
    fn stale_results_are_ignored() {
        let now = Instant::now();
        let mut panel = SearchPanel::default();
        panel.toggle();
        panel.query = "first".to_owned();
        let first = panel.submit().unwrap();
        panel.query = "second".to_owned();
        let second = panel.submit().unwrap();

        assert!(!panel.finish(first.seq, vec![result("old")], now));
        assert!(panel.results().is_empty());
        assert!(panel.finish(second.seq, vec![result("new")], now));
        assert_eq!(panel.results()[0].id, "new");
        assert!(!panel.is_searching());
    }

    #[test]
    fn panel_auto_closes_after_inactivity() {
        let now = Instant::now();
        let mut panel = SearchPanel::default();
        panel.toggle();
        panel.query = "q".to_owned();
        let dispatch = panel.submit().unwrap();
        panel.finish(dispatch.seq, vec![result("a")], now);

        assert!(!panel.tick(now + AUTO_CLOSE_DELAY - Duration::from_millis(1)));
        assert!(panel.tick(now + AUTO_CLOSE_DELAY));
        assert!(!panel.is_open());
    }

    #[test]
    fn hovering_pauses_the_auto_close() {
        let now = Instant::now();
        let mut panel = SearchPanel::default();
        panel.toggle();
        panel.query = "q".to_owned();
        let dispatch = panel.submit().unwrap();
        panel.finish(dispatch.seq, vec![result("a")], now);

        panel.set_hovered(true, now);
        assert!(!panel.tick(now + AUTO_CLOSE_DELAY * 3));

        // Leaving restarts the full countdown.
        let later = now + AUTO_CLOSE_DELAY * 3;
        panel.set_hovered(false, later);
        assert!(!panel.tick(later + AUTO_CLOSE_DELAY - Duration::from_millis(1)));
        assert!(panel.tick(later + AUTO_CLOSE_DELAY));
    }

    #[test]
    fn blank_queries_never_dispatch() {
        let now = Instant::now();
        let mut panel = SearchPanel::default();
        panel.toggle();
        panel.query = "   ".to_owned();
        panel.input_changed(now);
        assert_eq!(panel.submit(), None);
        assert_eq!(panel.poll(now + SEARCH_DEBOUNCE), None);
    }
}

//! Application model types: `App` and `Focus`.
//!
//! The `App` struct holds the search query, the current results and the
//! cursor state the UI and runtime share.

use tracing::debug;

use crate::audio::BAND_COUNT;
use crate::catalog::{SearchOutcome, TrackDescriptor};

/// Which pane receives key presses.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Search,
    Results,
    Equalizer,
}

/// The main application model.
pub struct App {
    pub query: String,
    pub focus: Focus,
    pub results: Vec<TrackDescriptor>,
    pub selected: usize,
    /// A search is in flight.
    pub searching: bool,
    /// Query the current `results` answer.
    pub results_query: String,
    /// Band under the equalizer cursor.
    pub eq_band: usize,
    pub status: Option<String>,
    pub should_quit: bool,

    search_seq: u64,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            query: String::new(),
            focus: Focus::Search,
            results: Vec::new(),
            selected: 0,
            searching: false,
            results_query: String::new(),
            eq_band: 0,
            status: None,
            should_quit: false,
            search_seq: 0,
        }
    }

    /// Append a character to the query.
    pub fn push_query_char(&mut self, c: char) {
        self.query.push(c);
    }

    /// Remove the last character from the query.
    pub fn pop_query_char(&mut self) {
        self.query.pop();
    }

    /// Start a new search for the current query.
    ///
    /// Returns the request sequence number and the trimmed query, or `None`
    /// when the query is blank. Any answer to an earlier request becomes stale.
    pub fn begin_search(&mut self) -> Option<(u64, String)> {
        let query = self.query.trim();
        if query.is_empty() {
            return None;
        }
        self.search_seq += 1;
        self.searching = true;
        self.status = Some(format!("Searching for \"{query}\"..."));
        Some((self.search_seq, query.to_string()))
    }

    /// Apply a search answer. Returns false when it answers an older request.
    ///
    /// A failed search clears the result list.
    pub fn finish_search(&mut self, outcome: SearchOutcome) -> bool {
        if outcome.seq != self.search_seq {
            debug!(seq = outcome.seq, latest = self.search_seq, "dropping stale search result");
            return false;
        }
        self.searching = false;
        self.selected = 0;
        self.results_query = outcome.query;
        match outcome.result {
            Ok(results) => {
                self.status = Some(if results.is_empty() {
                    "No results".to_string()
                } else {
                    format!("{} results", results.len())
                });
                self.results = results;
                if !self.results.is_empty() {
                    self.focus = Focus::Results;
                }
            }
            Err(e) => {
                self.results.clear();
                self.status = Some(format!("Search failed: {e}"));
            }
        }
        true
    }

    pub fn selected_track(&self) -> Option<&TrackDescriptor> {
        self.results.get(self.selected)
    }

    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }

    /// Move selection to the next result. Wraps around to the first.
    pub fn next(&mut self) {
        if self.results.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.results.len();
    }

    /// Move selection to the previous result. Wraps around to the last.
    pub fn prev(&mut self) {
        if self.results.is_empty() {
            return;
        }
        self.selected = match self.selected {
            0 => self.results.len() - 1,
            n => n - 1,
        };
    }

    pub fn focus_search(&mut self) {
        self.focus = Focus::Search;
    }

    pub fn focus_results(&mut self) {
        self.focus = Focus::Results;
    }

    /// Toggle between the equalizer panel and the result list.
    pub fn toggle_equalizer(&mut self) {
        self.focus = match self.focus {
            Focus::Equalizer => Focus::Results,
            _ => Focus::Equalizer,
        };
    }

    pub fn next_band(&mut self) {
        self.eq_band = (self.eq_band + 1).min(BAND_COUNT - 1);
    }

    pub fn prev_band(&mut self) {
        self.eq_band = self.eq_band.saturating_sub(1);
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    /// Fuzzy/subsequence match: return the character positions in `title`
    /// that match `query`, or `None` if not matched.
    ///
    /// Used to highlight the query inside result rows.
    pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
        if query.is_empty() {
            return Some(Vec::new());
        }

        let mut positions: Vec<usize> = Vec::new();
        let mut title_iter = title.chars().enumerate();

        for qc in query.chars().filter(|c| !c.is_whitespace()) {
            let qc_low = qc.to_ascii_lowercase();
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc.to_ascii_lowercase() == qc_low => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }

        Some(positions)
    }
}

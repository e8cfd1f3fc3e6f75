//! Incremental text filter over a row buffer.
//!
//! Two modes:
//!
//! ```text
//! Exclusive   rows not containing the needle are removed from view
//! Contextual  every row stays, matches are highlighted and cycled with n/N
//! ```
//!
//! Editing state machine: `Unfocused -> Focused` on the start-filter key,
//! `Focused -> Unfocused` on confirm (keep text) or cancel (restore the text
//! that was active when editing began).

use crate::structs::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Exclusive,
    Contextual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Focus {
    Unfocused,
    Focused { previous: String },
}

#[derive(Debug, Clone)]
pub struct Filter {
    mode: FilterMode,
    text: String,
    focus: Focus,
    /// Indices into the full row buffer, contextual mode only.
    match_indices: Vec<usize>,
    /// Position inside `match_indices`.
    current_match: Option<usize>,
}

/// Keep rows whose text contains `needle`, preserving order.
pub fn filter_rows(rows: &[Row], needle: &str) -> Vec<Row> {
    if needle.is_empty() {
        return rows.to_vec();
    }
    rows.iter()
        .filter(|row| row.text.contains(needle))
        .cloned()
        .collect()
}

/// Indices of rows whose text contains `needle`.
pub fn match_indices(rows: &[Row], needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.text.contains(needle))
        .map(|(i, _)| i)
        .collect()
}

impl Filter {
    pub fn new(mode: FilterMode) -> Self {
        Self {
            mode,
            text: String::new(),
            focus: Focus::Unfocused,
            match_indices: Vec::new(),
            current_match: None,
        }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_focused(&self) -> bool {
        matches!(self.focus, Focus::Focused { .. })
    }

    pub fn is_active(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn match_indices(&self) -> &[usize] {
        &self.match_indices
    }

    /// Row index (into the full buffer) of the current contextual match.
    pub fn current_match(&self) -> Option<usize> {
        self.current_match
            .and_then(|pos| self.match_indices.get(pos).copied())
    }

    pub fn focus(&mut self) {
        if !self.is_focused() {
            self.focus = Focus::Focused {
                previous: self.text.clone(),
            };
        }
    }

    /// Leaves editing keeping the typed text.
    pub fn confirm(&mut self) {
        self.focus = Focus::Unfocused;
    }

    /// Leaves editing restoring the text active before editing began.
    pub fn cancel(&mut self) {
        if let Focus::Focused { previous } = std::mem::replace(&mut self.focus, Focus::Unfocused) {
            self.text = previous;
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.text.push(c);
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.match_indices.clear();
        self.current_match = None;
    }

    /// Exclusive mode: the rows to display. Contextual mode: all rows.
    ///
    /// Contextual mode also recomputes the match indices; the current match
    /// is kept when it still matches, otherwise reset to the first match.
    pub fn apply(&mut self, all: &[Row]) -> Vec<Row> {
        match self.mode {
            FilterMode::Exclusive => filter_rows(all, &self.text),
            FilterMode::Contextual => {
                self.rematch(all);
                all.to_vec()
            }
        }
    }

    /// Recomputes contextual matches without copying rows.
    pub fn rematch(&mut self, all: &[Row]) {
        let previous_row = self.current_match();
        self.match_indices = match_indices(all, &self.text);
        self.current_match = if self.match_indices.is_empty() {
            None
        } else {
            let kept = previous_row.and_then(|row| self.match_indices.iter().position(|&i| i == row));
            Some(kept.unwrap_or(0))
        };
    }

    /// Advances to the next match with wraparound. Returns the row index.
    pub fn cycle_next(&mut self) -> Option<usize> {
        let len = self.match_indices.len();
        if len == 0 {
            return None;
        }
        let next = self.current_match.map(|pos| (pos + 1) % len).unwrap_or(0);
        self.current_match = Some(next);
        self.current_match()
    }

    /// Moves to the previous match with wraparound. Returns the row index.
    pub fn cycle_prev(&mut self) -> Option<usize> {
        let len = self.match_indices.len();
        if len == 0 {
            return None;
        }
        let prev = self
            .current_match
            .map(|pos| (pos + len - 1) % len)
            .unwrap_or(len - 1);
        self.current_match = Some(prev);
        self.current_match()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(texts: &[&str]) -> Vec<Row> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Row::new(i.to_string(), *t))
            .collect()
    }

    fn texts(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn test_exclusive_filter_scenario() {
        let all = rows(&["running", "pending", "run-away", "done"]);
        let mut filter = Filter::new(FilterMode::Exclusive);
        filter.focus();
        for c in "run".chars() {
            filter.push_char(c);
        }
        assert_eq!(texts(&filter.apply(&all)), vec!["running", "run-away"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let all = rows(&["alpha", "beta", "alphabet"]);
        let mut filter = Filter::new(FilterMode::Exclusive);
        filter.push_char('a');
        filter.push_char('l');
        let once = filter.apply(&all);
        let twice = filter.apply(&all);
        assert_eq!(once, twice);

        let mut ctx = Filter::new(FilterMode::Contextual);
        ctx.push_char('b');
        ctx.apply(&all);
        let first = ctx.match_indices().to_vec();
        ctx.apply(&all);
        assert_eq!(first, ctx.match_indices());
        assert_eq!(first, vec![1, 2]);
    }

    #[test]
    fn test_clear_restores_everything() {
        let all = rows(&["a", "b", "ab"]);
        let mut filter = Filter::new(FilterMode::Exclusive);
        filter.push_char('a');
        assert_eq!(filter.apply(&all).len(), 2);
        filter.clear();
        assert_eq!(filter.apply(&all), all);

        let mut ctx = Filter::new(FilterMode::Contextual);
        ctx.push_char('a');
        assert_eq!(ctx.apply(&all), all);
        assert_eq!(ctx.match_indices(), &[0, 2]);
        ctx.clear();
        ctx.apply(&all);
        assert!(ctx.match_indices().is_empty());
        assert_eq!(ctx.current_match(), None);
    }

    #[test]
    fn test_cycle_next_wraps_to_start() {
        let all = rows(&["x1", "y", "x2", "z", "x3"]);
        let mut filter = Filter::new(FilterMode::Contextual);
        filter.push_char('x');
        filter.apply(&all);
        let start = filter.current_match();
        assert_eq!(start, Some(0));
        let n = filter.match_indices().len();
        let mut seen = Vec::new();
        for _ in 0..n {
            seen.push(filter.cycle_next());
        }
        assert_eq!(seen, vec![Some(2), Some(4), Some(0)]);
        assert_eq!(filter.current_match(), start);
    }

    #[test]
    fn test_cycle_prev_wraps_to_end() {
        let all = rows(&["x1", "y", "x2"]);
        let mut filter = Filter::new(FilterMode::Contextual);
        filter.push_char('x');
        filter.apply(&all);
        assert_eq!(filter.cycle_prev(), Some(2));
        assert_eq!(filter.cycle_prev(), Some(0));
    }

    #[test]
    fn test_cycle_without_matches() {
        let mut filter = Filter::new(FilterMode::Contextual);
        filter.push_char('q');
        filter.apply(&rows(&["a"]));
        assert_eq!(filter.cycle_next(), None);
        assert_eq!(filter.cycle_prev(), None);
    }

    #[test]
    fn test_cancel_restores_previous_text() {
        let mut filter = Filter::new(FilterMode::Exclusive);
        filter.focus();
        filter.push_char('a');
        filter.confirm();
        assert_eq!(filter.text(), "a");

        filter.focus();
        filter.push_char('b');
        assert!(filter.is_focused());
        filter.cancel();
        assert!(!filter.is_focused());
        assert_eq!(filter.text(), "a");
    }

    #[test]
    fn test_rematch_keeps_current_match_when_rows_grow() {
        let mut all = rows(&["err 1", "ok", "err 2"]);
        let mut filter = Filter::new(FilterMode::Contextual);
        filter.push_char('e');
        filter.rematch(&all);
        filter.cycle_next();
        assert_eq!(filter.current_match(), Some(2));

        all.push(Row::new("3", "err 3"));
        filter.rematch(&all);
        assert_eq!(filter.current_match(), Some(2));
        assert_eq!(filter.match_indices(), &[0, 2, 3]);
    }
}

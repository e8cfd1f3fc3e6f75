//! A page: one row buffer with its filter, viewport and input state.

use crate::filter::{Filter, FilterMode};
use crate::structs::{PageData, Row};
use crate::ui::input::TextInput;
use crate::ui::viewport::Viewport;
use crate::utils::{pad_key, sanitize_line};

#[derive(Debug)]
pub struct Page {
    header: Vec<String>,
    all: Vec<Row>,
    filter: Filter,
    viewport: Viewport,
    selectable: bool,
    compact: bool,
    loading: bool,
    banner: Option<String>,
    input: Option<TextInput>,
    /// Last appended text chunk did not end on a line boundary.
    partial_line: bool,
    next_key: usize,
}

impl Page {
    pub fn new(mode: FilterMode, selectable: bool, wrap: bool, compact: bool) -> Self {
        Self {
            header: Vec::new(),
            all: Vec::new(),
            filter: Filter::new(mode),
            viewport: Viewport::new(selectable, wrap),
            selectable,
            compact,
            loading: false,
            banner: None,
            input: None,
            partial_line: false,
            next_key: 0,
        }
    }

    // --- content -------------------------------------------------------

    /// Replaces the buffer with a fetch result.
    pub fn set_data(&mut self, data: PageData) {
        self.header = data.header;
        self.next_key = data.rows.len();
        self.all = data.rows;
        self.partial_line = data.partial_last;
        self.loading = false;
        self.banner = None;
        if self.viewport.selection_enabled() != self.selectable {
            self.viewport.set_selection_enabled(self.selectable);
        }
        self.sync_header();
        self.refresh(false);
    }

    /// Empties the buffer, keeping filter and wrap state.
    pub fn clear(&mut self) {
        self.set_data(PageData::default());
    }

    /// Replaces the buffer with a single unselectable message row.
    pub fn set_message(&mut self, text: impl Into<String>) {
        self.set_data(PageData::new(Vec::new(), vec![Row::new(pad_key(0), text)]));
        self.viewport.set_selection_enabled(false);
    }

    pub fn set_error(&mut self, banner: impl Into<String>) {
        self.loading = false;
        self.banner = Some(banner.into());
    }

    pub fn clear_banner(&mut self) {
        self.banner = None;
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Appends rows with sticky scroll.
    pub fn append_rows(&mut self, rows: Vec<Row>) {
        if rows.is_empty() {
            return;
        }
        self.next_key += rows.len();
        self.all.extend(rows);
        self.partial_line = false;
        self.refresh(true);
    }

    /// Appends raw stream text, stitching a line split across chunks onto the last row.
    pub fn append_text(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        let ends_on_boundary = chunk.ends_with('\n');
        let body = chunk.strip_suffix('\n').unwrap_or(chunk);
        let mut pieces = body.split('\n');

        if self.partial_line {
            if let (Some(first), Some(last)) = (pieces.next(), self.all.last_mut()) {
                let mut text = std::mem::take(&mut last.text);
                text.push_str(&sanitize_line(first));
                *last = Row::new(last.key.clone(), text);
            }
        }

        for piece in pieces {
            self.all.push(Row::new(pad_key(self.next_key), sanitize_line(piece)));
            self.next_key += 1;
        }
        self.partial_line = !ends_on_boundary;
        self.refresh(true);
    }

    pub fn all_rows(&self) -> &[Row] {
        &self.all
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.viewport.selected_row()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn set_compact(&mut self, compact: bool) {
        self.compact = compact;
        self.sync_header();
    }

    /// Plain text of the header and every row, ignoring the filter.
    pub fn snapshot(&self) -> String {
        let mut out = String::new();
        for line in self.header.iter().map(String::as_str).chain(self.all.iter().map(|r| r.text.as_str())) {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    // --- filter --------------------------------------------------------

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn start_filter(&mut self) {
        self.filter.focus();
    }

    pub fn filter_push(&mut self, c: char) {
        self.filter.push_char(c);
        self.on_filter_edit();
    }

    pub fn filter_backspace(&mut self) {
        self.filter.backspace();
        self.on_filter_edit();
    }

    pub fn confirm_filter(&mut self) {
        self.filter.confirm();
    }

    pub fn cancel_filter(&mut self) {
        self.filter.cancel();
        self.on_filter_edit();
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
        self.on_filter_edit();
    }

    pub fn cycle_next(&mut self) {
        if let Some(row) = self.filter.cycle_next() {
            self.show_match(row);
        }
    }

    pub fn cycle_prev(&mut self) {
        if let Some(row) = self.filter.cycle_prev() {
            self.show_match(row);
        }
    }

    fn show_match(&mut self, row: usize) {
        self.viewport.set_special(Some(row));
        self.viewport.reveal(row);
    }

    fn on_filter_edit(&mut self) {
        match self.filter.mode() {
            FilterMode::Exclusive => {
                self.refresh(false);
                self.viewport.to_top();
            }
            FilterMode::Contextual => {
                self.refresh(false);
                if let Some(row) = self.filter.current_match() {
                    self.viewport.reveal(row);
                }
            }
        }
    }

    // --- modal input ---------------------------------------------------

    pub fn open_input(&mut self, initial: &str) {
        self.input = Some(TextInput::with_value(initial));
    }

    pub fn input(&self) -> Option<&TextInput> {
        self.input.as_ref()
    }

    pub fn input_mut(&mut self) -> Option<&mut TextInput> {
        self.input.as_mut()
    }

    pub fn take_input(&mut self) -> Option<String> {
        self.input.take().map(|i| i.value().to_string())
    }

    // --- internals -----------------------------------------------------

    fn sync_header(&mut self) {
        let header = if self.compact { Vec::new() } else { self.header.clone() };
        self.viewport.set_header(header);
    }

    fn refresh(&mut self, sticky: bool) {
        let rows = self.filter.apply(&self.all);
        if sticky {
            self.viewport.set_content_sticky(rows);
        } else {
            self.viewport.set_content(rows);
        }
        self.viewport.set_highlight(self.filter.text());
        let special = match self.filter.mode() {
            FilterMode::Contextual => self.filter.current_match(),
            FilterMode::Exclusive => None,
        };
        self.viewport.set_special(special);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_page(mode: FilterMode, compact: bool) -> Page {
        let mut page = Page::new(mode, true, false, compact);
        page.viewport_mut().resize(40, 6);
        page.set_data(PageData::new(
            vec!["NAME      STATUS".into()],
            ["running web", "pending api", "run-away batch", "done cron"]
                .iter()
                .enumerate()
                .map(|(i, t)| Row::new(pad_key(i), *t))
                .collect(),
        ));
        page
    }

    fn texts(page: &Page) -> Vec<String> {
        page.viewport().rows().iter().map(|r| r.text.clone()).collect()
    }

    #[test]
    fn test_exclusive_filter_resets_to_first_row() {
        let mut page = table_page(FilterMode::Exclusive, false);
        page.viewport_mut().move_selection(3);
        page.start_filter();
        for c in "run".chars() {
            page.filter_push(c);
        }
        assert_eq!(texts(&page), vec!["running web", "run-away batch"]);
        assert_eq!(page.viewport().selected_index(), Some(0));

        page.cancel_filter();
        assert_eq!(page.viewport().rows().len(), 4);
    }

    #[test]
    fn test_contextual_cycle_moves_selection() {
        let mut page = table_page(FilterMode::Contextual, false);
        page.start_filter();
        page.filter_push('r');
        page.filter_push('u');
        page.confirm_filter();
        assert_eq!(page.viewport().rows().len(), 4);
        assert_eq!(page.filter().match_indices(), &[0, 2]);
        page.cycle_next();
        assert_eq!(page.viewport().selected_index(), Some(2));
        assert_eq!(page.viewport().special(), Some(2));
        page.cycle_next();
        assert_eq!(page.viewport().selected_index(), Some(0));
    }

    #[test]
    fn test_contextual_filter_in_compact_mode_ignores_header() {
        let mut page = table_page(FilterMode::Contextual, true);
        assert!(page.viewport().header().is_empty());
        assert_eq!(page.header().len(), 1);
        page.filter_push('S');
        assert!(page.filter().match_indices().is_empty());

        page.clear_filter();
        page.filter_push('c');
        page.filter_push('r');
        // index into all rows, header excluded
        assert_eq!(page.filter().match_indices(), &[3]);
        page.set_compact(false);
        assert_eq!(page.filter().match_indices(), &[3]);
        assert_eq!(page.viewport().header().len(), 1);
    }

    #[test]
    fn test_append_text_stitches_partial_lines() {
        let mut page = Page::new(FilterMode::Contextual, true, false, false);
        page.viewport_mut().resize(40, 10);
        page.append_text("first line\nsecond ha");
        page.append_text("lf\nthird\n");
        page.append_text("fourth");
        let lines: Vec<&str> = page.all_rows().iter().map(|r| r.text.as_str()).collect();
        assert_eq!(lines, vec!["first line", "second half", "third", "fourth"]);

        let keys: Vec<&str> = page.all_rows().iter().map(|r| r.key.as_str()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), keys.len());
    }

    #[test]
    fn test_tail_continues_snapshot_last_line() {
        let mut page = Page::new(FilterMode::Contextual, true, false, false);
        page.viewport_mut().resize(40, 10);
        page.set_data(PageData::from_text("boot\nlisten"));
        page.append_text("ing on :8080\n");
        let lines: Vec<&str> = page.all_rows().iter().map(|r| r.text.as_str()).collect();
        assert_eq!(lines, vec!["boot", "listening on :8080"]);
    }

    #[test]
    fn test_append_text_line_boundary_not_stitched() {
        let mut page = Page::new(FilterMode::Contextual, true, false, false);
        page.viewport_mut().resize(40, 10);
        page.append_text("a\n");
        page.append_text("b\n");
        let lines: Vec<&str> = page.all_rows().iter().map(|r| r.text.as_str()).collect();
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn test_append_follows_bottom() {
        let mut page = Page::new(FilterMode::Contextual, true, false, false);
        page.viewport_mut().resize(40, 3);
        for i in 0..5 {
            page.append_text(&format!("line {i}\n"));
        }
        assert_eq!(page.viewport().selected_index(), Some(4));
        assert_eq!(page.viewport().y_offset(), 2);
    }

    #[test]
    fn test_snapshot_ignores_filter() {
        let mut page = table_page(FilterMode::Exclusive, true);
        page.filter_push('x');
        assert!(page.viewport().rows().is_empty());
        let snapshot = page.snapshot();
        assert!(snapshot.starts_with("NAME"));
        assert_eq!(snapshot.lines().count(), 5);
    }

    #[test]
    fn test_message_row_disables_selection() {
        let mut page = table_page(FilterMode::Exclusive, false);
        page.set_message("nothing here");
        assert!(page.selected_row().is_none());
        assert_eq!(page.viewport().rows().len(), 1);
    }
}

//! Virtualized scrolling window over a row buffer.
//!
//! Rows are expanded into virtual lines ("chunks"). Without wrapping every row
//! is exactly one chunk; with wrapping a row wider than the viewport is split
//! into chunks of at most `width` display columns, continuation chunks
//! prefixed with [`CONTINUATION`].
//!
//! ```text
//! rows            chunks (wrap, width 6)
//! 0 "abcdefgh" -> 0 "abcdef"      chunk_row[0] = 0
//!                 1 "↳gh"         chunk_row[1] = 0
//! 1 "xy"       -> 2 "xy"          chunk_row[2] = 1
//!
//! row_first_chunk = [0, 2], row_chunks = [2, 1]
//! ```
//!
//! The index maps are derived data, recomputed wholesale whenever content,
//! width or the wrap flag change.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::structs::Row;
use crate::ui::events::Scrollable;
use crate::ui::input::TextInput;

pub const CONTINUATION: &str = "↳";
pub const TRUNCATION: char = '…';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleLine {
    pub row: usize,
    pub text: String,
    pub selected: bool,
}

#[derive(Debug, Default)]
pub struct Viewport {
    header: Vec<String>,
    rows: Vec<Row>,

    chunks: Vec<String>,
    chunk_row: Vec<usize>,
    row_first_chunk: Vec<usize>,
    row_chunks: Vec<usize>,
    max_line_width: usize,

    width: usize,
    height: usize,
    y_offset: usize,
    x_offset: usize,

    selection_enabled: bool,
    selected: Option<usize>,
    wrap: bool,

    highlight: String,
    special: Option<usize>,

    save_prompt: Option<TextInput>,
}

/// Splits `text` into chunks no wider than `width` display columns.
///
/// Lines that fit yield exactly one chunk. Continuation chunks start with
/// [`CONTINUATION`], which counts against the width. A glyph that does not fit
/// the remaining columns moves to the next chunk. Viewports too narrow for the
/// indicator plus a glyph get bare chunks. A single glyph wider than the
/// viewport still takes a chunk of its own.
pub fn wrap_line(text: &str, width: usize) -> Vec<String> {
    if width == 0 || text.width() <= width {
        return vec![text.to_string()];
    }
    let indicator = if width > CONTINUATION.width() { CONTINUATION } else { "" };
    let indicator_width = indicator.width();

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    let mut has_content = false;

    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if has_content && current_width + w > width {
            chunks.push(std::mem::take(&mut current));
            current.push_str(indicator);
            current_width = indicator_width;
        }
        current.push(c);
        current_width += w;
        has_content = true;
    }
    chunks.push(current);
    chunks
}

/// Cuts the display columns `[x, x + width)` out of `text`, marking truncated
/// edges with [`TRUNCATION`].
pub fn pan_line(text: &str, x: usize, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let total = text.width();
    let cut_left = x > 0 && total > x;
    let cut_right = total > x + width;

    let mut out = String::new();
    let mut col = 0;
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if col < x {
            col += w;
            continue;
        }
        if used + w > width {
            break;
        }
        out.push(c);
        used += w;
        col += w;
    }

    if cut_left && !out.is_empty() {
        let mut chars = out.chars();
        chars.next();
        out = std::iter::once(TRUNCATION).chain(chars).collect();
    }
    if cut_right && !out.is_empty() {
        out.pop();
        out.push(TRUNCATION);
    }
    out
}

impl Viewport {
    pub fn new(selection_enabled: bool, wrap: bool) -> Self {
        Self {
            selection_enabled,
            wrap,
            ..Default::default()
        }
    }

    // --- content -------------------------------------------------------

    pub fn set_header(&mut self, header: Vec<String>) {
        self.header = header;
        self.rebuild();
        self.clamp();
        self.ensure_selected_visible();
    }

    /// Replaces all rows, keeping the selected index when still in range.
    pub fn set_content(&mut self, rows: Vec<Row>) {
        self.rows = rows;
        self.rebuild();
        self.selected = match self.selected {
            _ if !self.selection_enabled || self.rows.is_empty() => None,
            Some(i) => Some(i.min(self.rows.len() - 1)),
            None => Some(0),
        };
        self.clamp();
        self.ensure_selected_visible();
    }

    /// Replaces rows and follows the bottom if the view was at the bottom before.
    pub fn set_content_sticky(&mut self, rows: Vec<Row>) {
        let follow = self.at_bottom();
        self.set_content(rows);
        if follow {
            self.to_bottom();
        }
    }

    /// Appends rows with sticky-scroll semantics.
    pub fn append(&mut self, new_rows: Vec<Row>) {
        if new_rows.is_empty() {
            return;
        }
        let follow = self.at_bottom();
        let mut rows = std::mem::take(&mut self.rows);
        rows.extend(new_rows);
        self.set_content(rows);
        if follow {
            self.to_bottom();
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.selected.and_then(|i| self.rows.get(i))
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selection_enabled(&self) -> bool {
        self.selection_enabled
    }

    pub fn set_selection_enabled(&mut self, enabled: bool) {
        self.selection_enabled = enabled;
        self.selected = (enabled && !self.rows.is_empty()).then_some(0);
        self.clamp();
        self.ensure_selected_visible();
    }

    pub fn wrap(&self) -> bool {
        self.wrap
    }

    pub fn set_wrap(&mut self, wrap: bool) {
        if self.wrap == wrap {
            return;
        }
        self.wrap = wrap;
        if wrap {
            self.x_offset = 0;
        }
        self.rebuild();
        self.clamp();
        self.ensure_selected_visible();
    }

    /// `height` covers header and content lines.
    pub fn resize(&mut self, width: u16, height: u16) {
        let (width, height) = (width as usize, height as usize);
        if width == self.width && height == self.height {
            return;
        }
        let rewrap = width != self.width && self.wrap;
        self.width = width;
        self.height = height;
        if rewrap {
            self.rebuild();
        }
        if let Some(i) = self.selected {
            if i >= self.rows.len() {
                self.selected = (!self.rows.is_empty()).then_some(0);
            }
        }
        self.clamp();
        self.ensure_selected_visible();
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn set_highlight(&mut self, needle: &str) {
        needle.clone_into(&mut self.highlight);
    }

    pub fn highlight(&self) -> &str {
        &self.highlight
    }

    pub fn set_special(&mut self, row: Option<usize>) {
        self.special = row;
    }

    pub fn special(&self) -> Option<usize> {
        self.special
    }

    // --- geometry ------------------------------------------------------

    pub fn content_height(&self) -> usize {
        self.height.saturating_sub(self.header.len())
    }

    pub fn total_lines(&self) -> usize {
        self.chunks.len()
    }

    pub fn max_y_offset(&self) -> usize {
        self.total_lines().saturating_sub(self.content_height())
    }

    pub fn y_offset(&self) -> usize {
        self.y_offset
    }

    pub fn x_offset(&self) -> usize {
        self.x_offset
    }

    fn max_x_offset(&self) -> usize {
        self.max_line_width.saturating_sub(self.width)
    }

    /// Chunk span `[first, first + count)` of a row.
    pub fn row_span(&self, row: usize) -> Option<(usize, usize)> {
        Some((*self.row_first_chunk.get(row)?, *self.row_chunks.get(row)?))
    }

    pub fn chunk_owner(&self, chunk: usize) -> Option<usize> {
        self.chunk_row.get(chunk).copied()
    }

    /// At the bottom: selection on the last row, or scrolled to the end without selection.
    pub fn at_bottom(&self) -> bool {
        if self.rows.is_empty() {
            return true;
        }
        match self.selected {
            Some(i) => i + 1 == self.rows.len(),
            None => self.y_offset >= self.max_y_offset(),
        }
    }

    // --- movement ------------------------------------------------------

    pub fn move_selection(&mut self, delta: isize) {
        let Some(current) = self.selected else {
            self.scroll(delta);
            return;
        };
        let last = self.rows.len().saturating_sub(1);
        let next = current.saturating_add_signed(delta).min(last);
        self.selected = Some(next);
        self.ensure_selected_visible();
    }

    pub fn scroll(&mut self, delta: isize) {
        self.y_offset = self
            .y_offset
            .saturating_add_signed(delta)
            .min(self.max_y_offset());
    }

    pub fn pan(&mut self, delta: isize) {
        if self.wrap {
            return;
        }
        self.x_offset = self
            .x_offset
            .saturating_add_signed(delta)
            .min(self.max_x_offset());
    }

    /// Moves selection or scroll by `delta` lines depending on the mode.
    pub fn line(&mut self, delta: isize) {
        if self.selected.is_some() {
            self.move_selection(delta);
        } else {
            self.scroll(delta);
        }
    }

    pub fn page(&mut self, pages: isize) {
        let amount = self.content_height().max(1) as isize;
        self.line(amount * pages);
    }

    pub fn half_page(&mut self, halves: isize) {
        let amount = (self.content_height() / 2).max(1) as isize;
        self.line(amount * halves);
    }

    pub fn to_top(&mut self) {
        if self.selected.is_some() {
            self.selected = Some(0);
        }
        self.y_offset = 0;
    }

    pub fn to_bottom(&mut self) {
        if self.selected.is_some() {
            self.selected = Some(self.rows.len().saturating_sub(1));
        }
        self.y_offset = self.max_y_offset();
    }

    /// Selects `row` (or scrolls it into view when selection is off).
    pub fn reveal(&mut self, row: usize) {
        if row >= self.rows.len() {
            return;
        }
        if self.selected.is_some() {
            self.selected = Some(row);
            self.ensure_selected_visible();
        } else if let Some((first, count)) = self.row_span(row) {
            self.keep_span_visible(first, count);
        }
    }

    // --- save prompt ---------------------------------------------------

    pub fn open_save_prompt(&mut self) {
        self.save_prompt = Some(TextInput::default());
    }

    pub fn save_prompt(&self) -> Option<&TextInput> {
        self.save_prompt.as_ref()
    }

    pub fn save_prompt_mut(&mut self) -> Option<&mut TextInput> {
        self.save_prompt.as_mut()
    }

    /// Closes the prompt, returning the entered path.
    pub fn take_save_prompt(&mut self) -> Option<String> {
        self.save_prompt.take().map(|input| input.value().to_string())
    }

    // --- rendering -----------------------------------------------------

    /// Header lines after horizontal panning.
    pub fn visible_header(&self) -> Vec<String> {
        self.header
            .iter()
            .map(|h| pan_line(h, self.x_offset, self.width))
            .collect()
    }

    /// The lines inside the content window.
    pub fn visible_lines(&self) -> Vec<VisibleLine> {
        let end = (self.y_offset + self.content_height()).min(self.total_lines());
        (self.y_offset..end)
            .map(|chunk| {
                let row = self.chunk_row[chunk];
                let text = if self.wrap {
                    self.chunks[chunk].clone()
                } else {
                    pan_line(&self.chunks[chunk], self.x_offset, self.width)
                };
                VisibleLine {
                    row,
                    text,
                    selected: self.selected == Some(row),
                }
            })
            .collect()
    }

    /// `selected/total (pct%)` once content exceeds the window, `None` otherwise.
    pub fn footer_text(&self) -> Option<String> {
        let total_lines = self.total_lines();
        if total_lines <= self.content_height() {
            return None;
        }
        match self.selected {
            Some(i) => {
                let total = self.rows.len();
                let pct = (i + 1) * 100 / total;
                Some(format!("{}/{} ({}%)", i + 1, total, pct))
            }
            None => {
                let seen = (self.y_offset + self.content_height()).min(total_lines);
                let pct = seen * 100 / total_lines;
                Some(format!("{}/{} ({}%)", seen, total_lines, pct))
            }
        }
    }

    // --- internals -----------------------------------------------------

    fn rebuild(&mut self) {
        self.chunks.clear();
        self.chunk_row.clear();
        self.row_first_chunk.clear();
        self.row_chunks.clear();

        for (i, row) in self.rows.iter().enumerate() {
            let pieces = if self.wrap {
                wrap_line(&row.text, self.width)
            } else {
                vec![row.text.clone()]
            };
            self.row_first_chunk.push(self.chunks.len());
            self.row_chunks.push(pieces.len());
            for piece in pieces {
                self.chunk_row.push(i);
                self.chunks.push(piece);
            }
        }

        self.max_line_width = self
            .rows
            .iter()
            .map(|r| r.text.width())
            .chain(self.header.iter().map(|h| h.width()))
            .max()
            .unwrap_or(0);
    }

    fn clamp(&mut self) {
        self.y_offset = self.y_offset.min(self.max_y_offset());
        self.x_offset = if self.wrap {
            0
        } else {
            self.x_offset.min(self.max_x_offset())
        };
    }

    fn ensure_selected_visible(&mut self) {
        let Some((first, count)) = self.selected.and_then(|i| self.row_span(i)) else {
            return;
        };
        self.keep_span_visible(first, count);
    }

    fn keep_span_visible(&mut self, first: usize, count: usize) {
        let height = self.content_height();
        if height == 0 {
            return;
        }
        let last = first + count.max(1) - 1;
        if first < self.y_offset {
            self.y_offset = first;
        } else if last >= self.y_offset + height {
            // rows taller than the window align their first chunk to the top
            self.y_offset = if count > height { first } else { last + 1 - height };
        }
        self.y_offset = self.y_offset.min(self.max_y_offset());
    }
}

impl Scrollable for Viewport {
    fn scroll_down(&mut self) {
        self.line(1);
    }

    fn scroll_up(&mut self) {
        self.line(-1);
    }

    fn scroll_page_down(&mut self) {
        self.page(1);
    }

    fn scroll_page_up(&mut self) {
        self.page(-1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<Row> {
        (0..n).map(|i| Row::new(i.to_string(), format!("line {i}"))).collect()
    }

    fn viewport(n: usize, width: u16, height: u16) -> Viewport {
        let mut vp = Viewport::new(true, false);
        vp.resize(width, height);
        vp.set_content(rows(n));
        vp
    }

    #[test]
    fn test_max_y_offset_and_to_bottom() {
        for len in [0usize, 1, 4, 5, 6, 12, 40] {
            for height in [1u16, 3, 5, 10] {
                let mut vp = viewport(len, 20, height);
                assert_eq!(vp.max_y_offset(), len.saturating_sub(height as usize));
                vp.to_bottom();
                assert_eq!(vp.y_offset(), vp.max_y_offset());
            }
        }
    }

    #[test]
    fn test_empty_buffer_has_no_selection() {
        let vp = viewport(0, 20, 5);
        assert_eq!(vp.max_y_offset(), 0);
        assert_eq!(vp.selected_index(), None);
        assert!(vp.selected_row().is_none());
    }

    #[test]
    fn test_sticky_scroll_scenario() {
        let mut vp = viewport(12, 20, 5);
        vp.to_bottom();
        assert_eq!(vp.y_offset(), 7);
        assert_eq!(vp.selected_index(), Some(11));

        vp.append((12..15).map(|i| Row::new(i.to_string(), "new")).collect());
        assert_eq!(vp.y_offset(), 10);
        assert_eq!(vp.selected_index(), Some(14));
    }

    #[test]
    fn test_append_away_from_bottom_keeps_selection() {
        let mut vp = viewport(12, 20, 5);
        vp.move_selection(3);
        let key = vp.selected_row().unwrap().key.clone();
        vp.append(rows(2).into_iter().map(|r| Row::new(format!("n{}", r.key), r.text)).collect());
        assert_eq!(vp.selected_row().unwrap().key, key);
        assert_eq!(vp.y_offset(), 0);
    }

    #[test]
    fn test_sticky_scroll_without_selection() {
        let mut vp = Viewport::new(false, false);
        vp.resize(20, 5);
        vp.set_content(rows(12));
        vp.to_bottom();
        vp.append(rows(3));
        assert_eq!(vp.y_offset(), 10);

        vp.scroll(-4);
        vp.append(rows(3));
        assert_eq!(vp.y_offset(), 6);
    }

    #[test]
    fn test_selection_stays_visible_with_wrapping() {
        let mut vp = Viewport::new(true, true);
        vp.resize(10, 4);
        let content: Vec<Row> = (0..8)
            .map(|i| {
                let text = if i % 3 == 0 { "x".repeat(25) } else { format!("r{i}") };
                Row::new(i.to_string(), text)
            })
            .collect();
        vp.set_content(content);

        for delta in [1isize, 1, 1, 2, 1, 1, -3, -2, 5, -7, 4] {
            vp.move_selection(delta);
            let (first, count) = vp.row_span(vp.selected_index().unwrap()).unwrap();
            assert!(first >= vp.y_offset(), "delta {delta}");
            assert!(first + count <= vp.y_offset() + vp.content_height(), "delta {delta}");
            assert!(vp.y_offset() <= vp.max_y_offset());
        }
    }

    #[test]
    fn test_wrap_round_trip() {
        let text = "The quick brown fox jumps over the lazy dog";
        for width in [5usize, 8, 13, 20] {
            let chunks = wrap_line(text, width);
            assert!(chunks.len() > 1);
            let joined: String = chunks
                .iter()
                .enumerate()
                .map(|(i, c)| if i == 0 { c.as_str() } else { c.strip_prefix(CONTINUATION).unwrap() })
                .collect();
            assert_eq!(joined, text);
            assert!(chunks.iter().all(|c| c.width() <= width));
        }
        assert_eq!(wrap_line("short", 10), vec!["short".to_string()]);
        assert_eq!(wrap_line("", 10), vec![String::new()]);
    }

    #[test]
    fn test_wrap_one_column_viewport() {
        let chunks = wrap_line("abc", 1);
        assert_eq!(chunks, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        assert!(wrap_line("hello world", 2).iter().all(|c| c.width() <= 2));
    }

    #[test]
    fn test_wrap_uses_display_width() {
        // each glyph is two columns wide
        let chunks = wrap_line("日本語テキスト", 6);
        assert_eq!(chunks[0], "日本語");
        assert!(chunks.iter().all(|c| c.width() <= 6));
        // a wide glyph never splits across chunks
        let chunks = wrap_line("a日本", 4);
        assert_eq!(chunks, vec!["a日".to_string(), "↳本".to_string()]);
    }

    #[test]
    fn test_index_maps() {
        let mut vp = Viewport::new(true, true);
        vp.resize(6, 10);
        vp.set_content(vec![Row::new("a", "abcdefgh"), Row::new("b", "xy")]);
        assert_eq!(vp.total_lines(), 3);
        assert_eq!(vp.row_span(0), Some((0, 2)));
        assert_eq!(vp.row_span(1), Some((2, 1)));
        assert_eq!(vp.chunk_owner(1), Some(0));
        assert_eq!(vp.chunk_owner(2), Some(1));

        vp.set_wrap(false);
        assert_eq!(vp.total_lines(), 2);
        assert_eq!(vp.row_span(1), Some((1, 1)));
    }

    #[test]
    fn test_pan_clamps_and_marks_truncation() {
        let mut vp = Viewport::new(false, false);
        vp.resize(5, 3);
        vp.set_content(vec![Row::new("0", "0123456789")]);
        assert_eq!(vp.visible_lines()[0].text, "0123…");
        vp.pan(3);
        assert_eq!(vp.visible_lines()[0].text, "…456…");
        vp.pan(100);
        assert_eq!(vp.x_offset(), 5);
        assert_eq!(vp.visible_lines()[0].text, "…6789");
        vp.pan(-100);
        assert_eq!(vp.x_offset(), 0);

        vp.set_wrap(true);
        vp.pan(2);
        assert_eq!(vp.x_offset(), 0);
    }

    #[test]
    fn test_resize_keeps_selection_index() {
        let mut vp = viewport(30, 20, 10);
        vp.move_selection(20);
        vp.resize(20, 4);
        assert_eq!(vp.selected_index(), Some(20));
        let (first, _) = vp.row_span(20).unwrap();
        assert!(first >= vp.y_offset() && first < vp.y_offset() + 4);
    }

    #[test]
    fn test_set_content_clamps_selection() {
        let mut vp = viewport(10, 20, 5);
        vp.to_bottom();
        vp.set_content(rows(4));
        assert_eq!(vp.selected_index(), Some(3));
        assert!(vp.y_offset() <= vp.max_y_offset());
    }

    #[test]
    fn test_header_reduces_content_height() {
        let mut vp = viewport(12, 20, 5);
        vp.set_header(vec!["NAME".into()]);
        assert_eq!(vp.content_height(), 4);
        assert_eq!(vp.max_y_offset(), 8);
    }

    #[test]
    fn test_footer_percentages() {
        let mut vp = viewport(3, 20, 5);
        assert_eq!(vp.footer_text(), None);

        let mut vp2 = viewport(20, 20, 5);
        vp2.move_selection(9);
        assert_eq!(vp2.footer_text().as_deref(), Some("10/20 (50%)"));

        vp = Viewport::new(false, false);
        vp.resize(20, 5);
        vp.set_content(rows(20));
        assert_eq!(vp.footer_text().as_deref(), Some("5/20 (25%)"));
        vp.to_bottom();
        assert_eq!(vp.footer_text().as_deref(), Some("20/20 (100%)"));
    }

    #[test]
    fn test_reveal_without_selection_scrolls() {
        let mut vp = Viewport::new(false, false);
        vp.resize(20, 5);
        vp.set_content(rows(30));
        vp.reveal(17);
        assert!(vp.y_offset() <= 17 && 17 < vp.y_offset() + 5);
    }

    #[test]
    fn test_save_prompt_lifecycle() {
        let mut vp = viewport(3, 20, 5);
        assert!(vp.save_prompt().is_none());
        vp.open_save_prompt();
        vp.save_prompt_mut().unwrap().insert_str("~/out.txt");
        assert_eq!(vp.take_save_prompt().as_deref(), Some("~/out.txt"));
        assert!(vp.save_prompt().is_none());
    }
}

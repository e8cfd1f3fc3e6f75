//! Renders the navigator state into a frame.

use ratatui::{
    layout::{Alignment, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::filter::FilterMode;
use crate::nav::Navigator;
use crate::ui::colors;
use crate::ui::components::{draw_help_bar, page_hints};
use crate::ui::input::TextInput;
use crate::ui::layout::{prompt_area, split};
use crate::ui::page::Page;

pub fn draw(f: &mut Frame, nav: &Navigator) {
    let areas = split(f.area(), nav.compact());
    draw_title(f, areas.title, nav);
    if let Some(help) = areas.help {
        draw_help_bar(f, help, &page_hints(nav.current(), nav.exec_live()));
    }
    let Some(page) = nav.current_page() else {
        return;
    };
    draw_body(f, areas.body, page);
    draw_status(f, areas.status, page);

    if let Some(input) = page.input() {
        draw_prompt(f, areas.body, " command ", input);
    } else if let Some(prompt) = page.viewport().save_prompt() {
        draw_prompt(f, areas.body, " save to (empty for default name) ", prompt);
    }
}

fn draw_title(f: &mut Frame, area: Rect, nav: &Navigator) {
    let mut spans = vec![Span::styled(
        format!(" {} ", nav.current().title()),
        Style::default()
            .fg(colors::HEADER)
            .add_modifier(Modifier::BOLD),
    )];
    let crumbs = nav.context().breadcrumbs(nav.current());
    if !crumbs.is_empty() {
        spans.push(Span::styled(crumbs, Style::default().fg(colors::GRAY)));
    }
    if nav.current_page().is_some_and(Page::is_loading) {
        spans.push(Span::styled("  loading…", Style::default().fg(colors::PENDING)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);

    if let Some(toast) = nav.toast() {
        let color = if toast.error { colors::ERROR } else { colors::INFO };
        let text = Span::styled(
            format!("{} ", toast.text),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        );
        f.render_widget(Paragraph::new(text).alignment(Alignment::Right), area);
    }
}

fn draw_body(f: &mut Frame, area: Rect, page: &Page) {
    let viewport = page.viewport();
    let header_style = Style::default()
        .fg(colors::HEADER)
        .add_modifier(Modifier::BOLD);
    let mut lines: Vec<Line> = viewport
        .visible_header()
        .into_iter()
        .map(|h| Line::styled(h, header_style))
        .collect();

    let needle = viewport.highlight();
    let special = viewport.special();
    for line in viewport.visible_lines() {
        let spans = highlight_spans(&line.text, needle, special == Some(line.row));
        let style = if line.selected {
            Style::default().bg(colors::GRAY_BG).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(spans).style(style));
    }
    f.render_widget(Paragraph::new(lines), area);
}

/// Splits `text` around occurrences of `needle`; `current` marks the match being cycled to.
fn highlight_spans(text: &str, needle: &str, current: bool) -> Vec<Span<'static>> {
    if needle.is_empty() {
        return vec![Span::raw(text.to_string())];
    }
    let style = if current {
        Style::default().fg(Color::Black).bg(colors::MATCH)
    } else {
        Style::default()
            .fg(colors::MATCH)
            .add_modifier(Modifier::UNDERLINED)
    };
    let mut spans = Vec::new();
    let mut rest = text;
    while let Some(at) = rest.find(needle) {
        if at > 0 {
            spans.push(Span::raw(rest[..at].to_string()));
        }
        let end = at + needle.len();
        spans.push(Span::styled(rest[at..end].to_string(), style));
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }
    spans
}

fn draw_status(f: &mut Frame, area: Rect, page: &Page) {
    let filter = page.filter();
    let mut spans = Vec::new();
    if filter.is_focused() || filter.is_active() {
        let cursor = if filter.is_focused() { "▏" } else { "" };
        spans.push(Span::styled(
            format!("/{}{}", filter.text(), cursor),
            Style::default().fg(colors::MATCH),
        ));
        if filter.mode() == FilterMode::Contextual && filter.is_active() {
            spans.push(Span::styled(
                format!("  {} matches", filter.match_indices().len()),
                Style::default().fg(colors::GRAY),
            ));
        }
        spans.push(Span::raw("  "));
    }
    if let Some(banner) = page.banner() {
        spans.push(Span::styled(
            banner.to_string(),
            Style::default().fg(colors::ERROR),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);

    let mut right = Vec::new();
    if page.viewport().wrap() {
        right.push(Span::styled("wrap ", Style::default().fg(colors::WARNING)));
    }
    if let Some(footer) = page.viewport().footer_text() {
        right.push(Span::styled(footer, Style::default().fg(colors::GRAY)));
    }
    if !right.is_empty() {
        f.render_widget(
            Paragraph::new(Line::from(right)).alignment(Alignment::Right),
            area,
        );
    }
}

fn draw_prompt(f: &mut Frame, body: Rect, title: &str, input: &TextInput) {
    let area = prompt_area(body, 3);
    let block = Block::bordered()
        .title(title.to_string())
        .border_style(Style::default().fg(colors::HEADER));
    let inner = block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(input.value().to_string()).block(block), area);

    let before: String = input.value().chars().take(input.cursor()).collect();
    let offset = (before.width() as u16).min(inner.width.saturating_sub(1));
    f.set_cursor_position(Position::new(inner.x + offset, inner.y));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Args, Config, FileConfig};
    use crate::nav::{Msg, PageKind};
    use crate::structs::{JobKey, PageData, Row};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn loaded_navigator(compact: bool) -> Navigator {
        let args = Args {
            address: Some("http://127.0.0.1:4646".into()),
            compact,
            ..Args::default()
        };
        let config = Config::merge(args, FileConfig::default()).unwrap();
        let mut nav = Navigator::new(Arc::new(config));
        nav.update(Msg::Resize(60, 8));
        nav.start();
        let key = JobKey {
            namespace: "default".into(),
            job_id: "web".into(),
        };
        let gen = nav.context().update_id;
        nav.update(Msg::Loaded {
            page: PageKind::Jobs,
            gen,
            silent: false,
            result: Ok(PageData::new(
                vec!["ID   Status".into()],
                vec![Row::new(key.encode(), "web  running")],
            )),
        });
        nav
    }

    #[test]
    fn test_draw_jobs_page() {
        let nav = loaded_navigator(false);
        let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
        terminal.draw(|f| draw(f, &nav)).unwrap();
        let screen = screen(&terminal);
        assert!(screen.lines().next().unwrap().contains("jobs"));
        assert!(screen.contains("ID   Status"));
        assert!(screen.contains("web  running"));
        assert!(screen.lines().last().unwrap().contains("enter:"));
    }

    #[test]
    fn test_compact_hides_header_and_help() {
        let nav = loaded_navigator(true);
        let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
        terminal.draw(|f| draw(f, &nav)).unwrap();
        let screen = screen(&terminal);
        assert!(!screen.contains("ID   Status"));
        assert!(!screen.contains("enter:"));
        assert!(screen.contains("web  running"));
    }

    #[test]
    fn test_highlight_spans() {
        let spans = highlight_spans("a-err-b-err", "err", false);
        let texts: Vec<&str> = spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(texts, vec!["a-", "err", "-b-", "err"]);
        assert_eq!(highlight_spans("plain", "", false).len(), 1);
    }
}

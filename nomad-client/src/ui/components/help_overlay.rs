//! Inline context-aware help bar component.

use ratatui::{
    prelude::*,
    style::{palette::tailwind, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::nav::page_kind::{PageKind, Shortcut};

/// Draws a context-aware inline help bar at the given area.
///
/// Takes a slice of (key, description) tuples and renders them as:
/// `key:desc │ key:desc │ ...`
pub fn draw_help_bar(f: &mut Frame, area: Rect, hints: &[(&str, &str)]) {
    let mut spans = Vec::new();
    let separator = Span::styled(" │ ", Style::default().fg(tailwind::GRAY.c600));

    for (i, (key, desc)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(separator.clone());
        }
        spans.push(Span::styled(
            *key,
            Style::default()
                .fg(tailwind::YELLOW.c400)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(":{}", desc),
            Style::default().fg(tailwind::GRAY.c400),
        ));
    }

    f.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Left),
        area,
    );
}

/// Help hints for the page on screen.
///
/// Only keys that do something on `kind` are listed.
pub fn page_hints(kind: PageKind, exec_live: bool) -> Vec<(&'static str, &'static str)> {
    if kind == PageKind::Exec {
        return if exec_live {
            vec![("ctrl+]", "detach")]
        } else {
            vec![("enter", "run"), ("esc", "cancel")]
        };
    }

    let caps = kind.capabilities();
    let mut hints = Vec::new();
    if let Some(target) = caps.forward {
        hints.push(("enter", target.title()));
    }
    if matches!(kind, PageKind::JobAdminConfirm | PageKind::TaskAdminConfirm) {
        hints.push(("enter", "confirm"));
    }
    let shortcuts = [
        (Shortcut::Spec, "v", "spec"),
        (Shortcut::Meta, "m", "meta"),
        (Shortcut::Events, "e", "events"),
        (Shortcut::Exec, "x", "exec"),
        (Shortcut::Admin, "X", "admin"),
        (Shortcut::Stats, "S", "stats"),
        (Shortcut::AllTasks, "T", "all tasks"),
        (Shortcut::AllEvents, "E", "all events"),
    ];
    for (shortcut, key, desc) in shortcuts {
        if kind.shortcut(shortcut).is_some() {
            hints.push((key, desc));
        }
    }
    if kind == PageKind::Logs {
        hints.push(("t", "stdout/stderr"));
    }
    if caps.reloadable {
        hints.push(("r", "reload"));
    }
    hints.push(("/", "filter"));
    hints.push(("w", "wrap"));
    hints.push(("ctrl+s", "save"));
    if !caps.head {
        hints.push(("esc", "back"));
    }
    hints.push(("q", "quit"));
    hints
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(kind: PageKind) -> Vec<&'static str> {
        page_hints(kind, false).into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn test_jobs_hints() {
        let keys = keys(PageKind::Jobs);
        assert!(keys.contains(&"enter"));
        assert!(keys.contains(&"X"));
        assert!(keys.contains(&"T"));
        assert!(!keys.contains(&"esc"));
        assert!(!keys.contains(&"x"));
    }

    #[test]
    fn test_logs_hints() {
        let keys = keys(PageKind::Logs);
        assert!(keys.contains(&"t"));
        assert!(keys.contains(&"x"));
        assert!(keys.contains(&"esc"));
    }

    #[test]
    fn test_live_exec_only_detach() {
        assert_eq!(page_hints(PageKind::Exec, true), vec![("ctrl+]", "detach")]);
    }
}

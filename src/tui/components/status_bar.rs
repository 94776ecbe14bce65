//! Status bar component.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::tui::app::{App, ViewMode};

/// Renders the status bar.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let (label, status_color) = if app.switching {
        ("Switching", Color::Yellow)
    } else if app.snapshot.error.is_some() {
        ("Disconnected", Color::Red)
    } else if app.snapshot.connected {
        ("Connected", Color::Green)
    } else {
        ("Connecting", Color::Yellow)
    };

    let mode_label = match app.mode {
        ViewMode::Dashboard => "Dashboard",
        ViewMode::CoinSelect => "Select coin",
        ViewMode::History => "History",
    };

    let symbol_span = if app.snapshot.symbol.is_empty() {
        Span::raw("")
    } else {
        Span::styled(
            format!(" {} ", app.snapshot.symbol.to_uppercase()),
            Style::default().fg(Color::Cyan),
        )
    };

    let error_span = if let Some(ref error) = app.error_message {
        Span::styled(
            format!(" {} ", error.message),
            Style::default().fg(Color::Red),
        )
    } else {
        Span::raw("")
    };

    let line = Line::from(vec![
        Span::styled(format!(" {label} "), Style::default().fg(status_color)),
        Span::raw("│"),
        symbol_span,
        Span::raw("│"),
        Span::styled(format!(" {mode_label} "), Style::default().fg(Color::White)),
        Span::raw("│"),
        error_span,
    ]);

    let para = Paragraph::new(line).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(para, area);
}

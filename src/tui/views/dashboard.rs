//! Live price view.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use rust_decimal::Decimal;

use crate::tui::app::{App, DashboardSnapshot};
use crate::tui::components::{sparkline, status_bar};

/// Renders the dashboard view.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Status bar
            Constraint::Length(3), // Header
            Constraint::Min(8),    // Body
            Constraint::Length(1), // Keybindings help
        ])
        .split(area);

    status_bar::render(frame, main_layout[0], app);
    render_header(frame, main_layout[1], app);

    let snap = &app.snapshot;
    if app.switching {
        render_placeholder(frame, main_layout[2], "Switching coin...", Color::Yellow);
    } else if let Some(ref error) = snap.error {
        render_placeholder(frame, main_layout[2], error, Color::Red);
    } else if !snap.connected {
        render_placeholder(
            frame,
            main_layout[2],
            "Connecting to server...",
            Color::Yellow,
        );
    } else {
        render_body(frame, main_layout[2], app);
    }

    render_keybindings(frame, main_layout[3]);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let title = if app.snapshot.display_name.is_empty() {
        "Live Price".to_string()
    } else {
        app.snapshot.display_name.clone()
    };

    let para = Paragraph::new(Line::from(Span::styled(
        title,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(para, area);
}

fn render_placeholder(frame: &mut Frame, area: Rect, text: &str, color: Color) {
    let para = Paragraph::new(text)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(para, area);
}

fn render_body(frame: &mut Frame, area: Rect, app: &App) {
    let snap = &app.snapshot;
    let label = Style::default().fg(Color::DarkGray);

    let lines = vec![
        Line::from(Span::styled(
            format!("${}", format_price(snap.price)),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            change_text(snap),
            Style::default().fg(change_color(snap.change)),
        )),
        Line::raw(""),
        Line::from(vec![
            Span::styled("Moving avg (20)  ", label),
            Span::raw(format!("${}", format_price(snap.moving_average))),
        ]),
        Line::from(vec![
            Span::styled("Session high     ", label),
            Span::styled(
                format!("${}", format_price(snap.high)),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(vec![
            Span::styled("Session low      ", label),
            Span::styled(
                format!("${}", format_price(snap.low)),
                Style::default().fg(Color::Red),
            ),
        ]),
        Line::from(vec![
            Span::styled("Spread           ", label),
            Span::raw(format!("${}", format_price(snap.high - snap.low))),
        ]),
        Line::raw(""),
        sparkline::line(&app.history.values()),
    ];

    let para = Paragraph::new(lines).block(
        Block::default()
            .title(" Price ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(para, area);
}

fn render_keybindings(frame: &mut Frame, area: Rect) {
    let help = "[c]oin select [h]istory [q]uit";

    let para = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(para, area);
}

/// Two decimals, or six for sub-unit prices.
pub fn format_price(price: Decimal) -> String {
    if price.abs() < Decimal::ONE && !price.is_zero() {
        format!("{:.6}", price.round_dp(6))
    } else {
        format!("{:.2}", price.round_dp(2))
    }
}

/// Arrow, absolute change and percent change.
pub fn change_text(snap: &DashboardSnapshot) -> String {
    if snap.change > Decimal::ZERO {
        format!(
            "▲ {:+.2} ({:+.2}%)",
            snap.change.round_dp(2),
            snap.change_percent.round_dp(2)
        )
    } else if snap.change < Decimal::ZERO {
        format!(
            "▼ {:.2} ({:.2}%)",
            snap.change.round_dp(2),
            snap.change_percent.round_dp(2)
        )
    } else {
        "━ 0.00 (0.00%)".to_string()
    }
}

fn change_color(change: Decimal) -> Color {
    if change > Decimal::ZERO {
        Color::Green
    } else if change < Decimal::ZERO {
        Color::Red
    } else {
        Color::White
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn small_prices_get_six_decimals() {
        assert_eq!(format_price(dec!(0.123456789)), "0.123457");
        assert_eq!(format_price(dec!(105.5)), "105.50");
        assert_eq!(format_price(Decimal::ZERO), "0.00");
    }

    #[test]
    fn change_line_shows_direction() {
        let mut snap = DashboardSnapshot {
            change: dec!(5),
            change_percent: dec!(5),
            ..DashboardSnapshot::default()
        };
        assert_eq!(change_text(&snap), "▲ +5.00 (+5.00%)");

        snap.change = dec!(-2.5);
        snap.change_percent = dec!(-1.25);
        assert_eq!(change_text(&snap), "▼ -2.50 (-1.25%)");

        snap.change = Decimal::ZERO;
        assert_eq!(change_text(&snap), "━ 0.00 (0.00%)");
    }
}

//! Persisted trade history view.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::dashboard::format_price;
use crate::tui::app::{App, HISTORY_PAGE_SIZE};
use crate::tui::components::status_bar;

/// Renders one page of recent trades.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Status bar
            Constraint::Min(5),    // Trades
            Constraint::Length(1), // Keybindings help
        ])
        .split(area);

    status_bar::render(frame, main_layout[0], app);

    let title = if app.snapshot.display_name.is_empty() {
        " Trade History ".to_string()
    } else {
        format!(" Trade History: {} ", app.snapshot.display_name)
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let lines = if !app.trades_loaded {
        vec![Line::from(Span::styled(
            "Loading history...",
            Style::default().fg(Color::DarkGray),
        ))]
    } else if app.trades.is_empty() {
        vec![Line::from(Span::styled(
            "No trades recorded yet",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        let mut lines = vec![Line::from(Span::styled(
            format!("{:<12} {:>16}", "Time", "Price"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ))];
        lines.extend(
            app.trades
                .iter()
                .skip(app.history_scroll)
                .take(HISTORY_PAGE_SIZE)
                .map(|trade| {
                    Line::from(vec![
                        Span::raw(format!("{:<12} ", trade.timestamp.format("%H:%M:%S"))),
                        Span::styled(
                            format!("{:>16}", format!("${}", format_price(trade.price))),
                            Style::default().fg(Color::White),
                        ),
                    ])
                }),
        );
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            page_footer(app.history_scroll, app.trades.len()),
            Style::default().fg(Color::DarkGray),
        )));
        lines
    };

    frame.render_widget(Paragraph::new(lines).block(block), main_layout[1]);

    let help = "[↑/k] up [↓/j] down [r]efresh [Esc] back";
    let para = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(para, main_layout[2]);
}

/// "Showing a-b of n trades" for a page starting at `scroll`.
pub fn page_footer(scroll: usize, total: usize) -> String {
    let end = (scroll + HISTORY_PAGE_SIZE).min(total);
    format!("Showing {}-{} of {} trades", scroll + 1, end, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footer_counts_visible_rows() {
        assert_eq!(page_footer(0, 40), "Showing 1-15 of 40 trades");
        assert_eq!(page_footer(25, 40), "Showing 26-40 of 40 trades");
        assert_eq!(page_footer(0, 3), "Showing 1-3 of 3 trades");
    }
}

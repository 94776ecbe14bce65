//! Coin selector view.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::tui::app::App;
use crate::tui::components::status_bar;

/// Renders the coin list.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Status bar
            Constraint::Min(5),    // Coin list
            Constraint::Length(1), // Keybindings help
        ])
        .split(area);

    status_bar::render(frame, main_layout[0], app);

    let block = Block::default()
        .title(" Select Coin ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if app.switching {
        let para = Paragraph::new("Switching coin...")
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(para, main_layout[1]);
    } else if app.coins.is_empty() {
        let para = Paragraph::new("Loading coins...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(para, main_layout[1]);
    } else {
        let current = app.current_coin_index();
        let lines: Vec<Line> = app
            .coins
            .iter()
            .enumerate()
            .map(|(i, coin)| {
                let selected = i == app.coin_cursor;
                let cursor = if selected { "▸ " } else { "  " };
                let style = if selected {
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                let mut spans = vec![
                    Span::styled(cursor, style),
                    Span::styled(format!("{:<20}", coin.name), style),
                    Span::styled(
                        coin.symbol.to_uppercase(),
                        Style::default().fg(Color::DarkGray),
                    ),
                ];
                if current == Some(i) {
                    spans.push(Span::styled(
                        " (current)",
                        Style::default().fg(Color::Green),
                    ));
                }
                Line::from(spans)
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), main_layout[1]);
    }

    let help = "[↑/k] up [↓/j] down [Enter] select [Esc] back";
    let para = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(para, main_layout[2]);
}

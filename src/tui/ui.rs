//! Main UI rendering coordinator.

use ratatui::Frame;

use super::app::{App, ViewMode};
use super::views::{coin_select, dashboard, history};

/// Renders the entire application UI.
pub fn render(frame: &mut Frame, app: &App) {
    match app.mode {
        ViewMode::Dashboard => dashboard::render(frame, app),
        ViewMode::CoinSelect => coin_select::render(frame, app),
        ViewMode::History => history::render(frame, app),
    }
}

//! One module per [`ViewMode`](crate::tui::app::ViewMode).

pub mod coin_select;
pub mod dashboard;
pub mod history;

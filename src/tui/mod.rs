//! Terminal dashboard for a running `tickerpipe serve`.
//!
//! Polls the local API, renders price, statistics and history with Ratatui,
//! and lets the user switch the tracked coin.

pub mod api;
pub mod app;
pub mod components;
pub mod event;
pub mod runner;
pub mod terminal;
pub mod ui;
pub mod views;

pub use api::ApiClient;
pub use app::{App, StartMode, ViewMode};
pub use event::{Action, Event, Message, init, update};
pub use runner::run_dashboard;
pub use terminal::{Tui, restore_terminal, setup_terminal};
pub use ui::render;

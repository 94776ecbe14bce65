//! The dashboard's message loop.

use tokio::sync::mpsc;
use tracing::{error, info};

use super::api::ApiClient;
use super::app::{App, POLL_INTERVAL, StartMode};
use super::event::{self, Action, Message};
use super::terminal::{restore_terminal, setup_terminal, Tui};
use super::ui;
use crate::Result;
use crate::config::AppConfig;

/// Runs the dashboard against `config.server.base_url` until the user quits.
///
/// # Errors
///
/// Returns an error if the terminal cannot be set up, drawn to, or restored.
pub async fn run_dashboard(config: &AppConfig, start: StartMode) -> Result<()> {
    let api = ApiClient::new(config.server.base_url.clone())?;
    let mut terminal = setup_terminal()?;

    info!(server = %config.server.base_url, ?start, "Dashboard started");
    let result = run_loop(&mut terminal, api, start).await;

    if let Err(e) = restore_terminal(&mut terminal) {
        error!(error = %e, "Failed to restore terminal");
    }
    info!("Dashboard stopped");
    result
}

async fn run_loop(terminal: &mut Tui, api: ApiClient, start: StartMode) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    event::spawn_event_reader(tx.clone());
    event::spawn_tick_timer(tx.clone(), POLL_INTERVAL);

    let mut app = App::new(start);
    let actions = event::init(&mut app);
    dispatch(&api, &tx, actions);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(frame, &app))?;

        let Some(message) = rx.recv().await else {
            break;
        };
        let actions = event::update(&mut app, message);
        dispatch(&api, &tx, actions);
    }

    Ok(())
}

/// Runs each action on its own task; results re-enter the loop as messages.
fn dispatch(api: &ApiClient, tx: &mpsc::UnboundedSender<Message>, actions: Vec<Action>) {
    for action in actions {
        let api = api.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(api.execute(action).await);
        });
    }
}

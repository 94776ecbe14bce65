//! HTTP and WebSocket handlers using axum.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::PipelineError;
use crate::catalog::{ActiveSymbol, COINS};
use crate::hub::PriceHub;
use crate::models::PriceUpdate;
use crate::models::api::{
    CoinInfo, ErrorResponse, HistoryTrade, PriceResponse, StatsResponse, SymbolRequest,
    SymbolResponse,
};
use crate::stats::StatsEngine;
use crate::store::{HISTORY_QUERY_LIMIT, TradeStore};
use crate::swap::SwapCoordinator;

/// Pushes buffered per WebSocket client before the hub drops it.
const WS_PUSH_BUFFER: usize = 64;

/// Longest a single push may block on a client that is not reading.
const WS_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub active: Arc<ActiveSymbol>,
    pub stats: Arc<dyn StatsEngine>,
    pub hub: Arc<PriceHub>,
    pub store: Arc<dyn TradeStore>,
    pub swap: Arc<SwapCoordinator>,
}

/// A rejected request, answered as 400 with an `error` body.
#[derive(Debug)]
pub struct ApiError(String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: self.0 })).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError(err.to_string())
    }
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/price", get(get_price))
        .route("/api/stats", get(get_stats))
        .route("/api/symbol", get(get_symbol).post(post_symbol))
        .route("/api/coins", get(get_coins))
        .route("/api/history", get(get_history))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn get_price(State(state): State<AppState>) -> Json<PriceResponse> {
    Json(PriceResponse {
        price: state.hub.current_price().unwrap_or(Decimal::ZERO),
    })
}

async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.stats.snapshot())
}

async fn get_symbol(State(state): State<AppState>) -> Json<SymbolResponse> {
    Json(state.active.get().into())
}

/// Swaps the active symbol.
async fn post_symbol(
    State(state): State<AppState>,
    body: Result<Json<SymbolRequest>, JsonRejection>,
) -> Result<Json<SymbolResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        debug!(error = %rejection, "Rejected symbol request body");
        ApiError("Invalid request".to_string())
    })?;

    let context = state.swap.swap_to(&request.symbol).inspect_err(|e| {
        warn!(error = %e, "Symbol change rejected");
    })?;

    Ok(Json(context.into()))
}

async fn get_coins() -> Json<Vec<CoinInfo>> {
    Json(COINS.iter().map(CoinInfo::from).collect())
}

async fn get_history(State(state): State<AppState>) -> Json<Vec<HistoryTrade>> {
    let symbol = state.active.symbol();
    Json(state.store.recent(&symbol, HISTORY_QUERY_LIMIT))
}

/// WebSocket upgrade handler.
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Streams every hub update to one WebSocket client until either side fails.
///
/// A client that falls [`WS_PUSH_BUFFER`] updates behind is dropped by the
/// hub, which closes `rx` and ends this loop.
async fn handle_ws_connection(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<PriceUpdate>(WS_PUSH_BUFFER);
    let id = state.hub.subscribe(tx);

    loop {
        tokio::select! {
            update = rx.recv() => {
                let Some(update) = update else {
                    debug!("Hub dropped this client");
                    break;
                };
                let body = match serde_json::to_string(&PriceResponse { price: update.price }) {
                    Ok(body) => body,
                    Err(e) => {
                        warn!(error = %e, "Failed to serialize price push");
                        continue;
                    }
                };
                let push = sender.send(Message::Text(body.into()));
                match tokio::time::timeout(WS_SEND_TIMEOUT, push).await {
                    Ok(Ok(())) => {}
                    Ok(Err(_)) => {
                        debug!("Failed to send price, client disconnected");
                        break;
                    }
                    Err(_) => {
                        warn!("Price push timed out, dropping stalled client");
                        break;
                    }
                }
            }

            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => {
                    debug!("Client closed WebSocket");
                    break;
                }
                Some(Err(e)) => {
                    debug!(error = %e, "WebSocket receive error");
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    state.hub.unsubscribe(id);
    info!(
        clients = state.hub.subscriber_count(),
        "WebSocket connection closed"
    );
}

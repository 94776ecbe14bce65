//! Dialing the upstream stream.

use std::future::Future;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio_tungstenite::connect_async;
use tracing::{debug, info};
use tungstenite::Message;

use crate::Result;

/// Text frames from one upstream connection. The stream ends when the
/// connection closes; an `Err` item means the connection failed.
pub type FeedStream = BoxStream<'static, Result<String>>;

/// Opens upstream connections for the feed client.
pub trait Connector: Send + Sync + 'static {
    /// Connects to `url` and returns its text frames.
    fn connect(&self, url: &str) -> impl Future<Output = Result<FeedStream>> + Send;
}

/// Connects over WebSocket (TLS via webpki roots).
#[derive(Clone, Copy, Debug, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<FeedStream> {
        let (ws_stream, _) = connect_async(url).await?;
        info!(url, "WebSocket handshake completed");

        // Ping/pong is answered by tungstenite while the stream is polled.
        let frames = ws_stream.filter_map(|msg| async move {
            match msg {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "Upstream sent close frame");
                    None
                }
                Ok(_) => None,
                Err(e) => Some(Err(e.into())),
            }
        });

        Ok(frames.boxed())
    }
}

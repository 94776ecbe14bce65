//! Shared test utilities: a scripted upstream connector and trade fixtures.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream;
use parking_lot::Mutex;
use tickerpipe::feed::{Connector, FeedStream};
use tickerpipe::{PipelineError, Result};
use tokio::sync::{Notify, mpsc};
use tokio::time::Instant;

/// Base URL handed to feed clients under test.
pub const UPSTREAM_URL: &str = "ws://upstream.test/ws";

/// A raw trade frame as the exchange sends it.
pub fn trade_frame(price: &str, trade_time_ms: i64) -> String {
    format!(r#"{{"e":"trade","s":"BTCUSDT","p":"{price}","q":"0.010","T":{trade_time_ms}}}"#)
}

/// What the next dial does.
pub enum Dial {
    /// The dial fails.
    Fail,
    /// The dial succeeds and yields `frames`; the stream then stays open if
    /// `hold`, otherwise it ends.
    Open {
        frames: Vec<Result<String>>,
        hold: bool,
    },
    /// Like `Open`, but the dial only completes once `gate` is notified.
    Gated {
        gate: Arc<Notify>,
        frames: Vec<Result<String>>,
    },
    /// The dial succeeds and the stream yields whatever is sent on the
    /// paired sender until it is dropped.
    Channel(mpsc::UnboundedReceiver<Result<String>>),
}

impl Dial {
    pub fn open(frames: impl IntoIterator<Item = String>, hold: bool) -> Self {
        Dial::Open {
            frames: frames.into_iter().map(Ok).collect(),
            hold,
        }
    }
}

/// One recorded connection attempt.
#[derive(Clone, Debug)]
pub struct DialRecord {
    pub url: String,
    pub at: Instant,
}

/// Connector that plays back a script of dials. Once the script is used up
/// every dial succeeds with a silent stream that never ends.
#[derive(Clone)]
pub struct ScriptedConnector {
    script: Arc<Mutex<VecDeque<Dial>>>,
    dials: mpsc::UnboundedSender<DialRecord>,
}

impl ScriptedConnector {
    pub fn new(script: Vec<Dial>) -> (Self, mpsc::UnboundedReceiver<DialRecord>) {
        let (dials, rx) = mpsc::unbounded_channel();
        let connector = Self {
            script: Arc::new(Mutex::new(script.into())),
            dials,
        };
        (connector, rx)
    }
}

fn frames_stream(frames: Vec<Result<String>>, hold: bool) -> FeedStream {
    let frames = stream::iter(frames);
    if hold {
        frames.chain(stream::pending()).boxed()
    } else {
        frames.boxed()
    }
}

impl Connector for ScriptedConnector {
    async fn connect(&self, url: &str) -> Result<FeedStream> {
        let _ = self.dials.send(DialRecord {
            url: url.to_string(),
            at: Instant::now(),
        });

        let next = self.script.lock().pop_front();
        match next {
            Some(Dial::Fail) => Err(PipelineError::Io("connection refused".to_string())),
            Some(Dial::Open { frames, hold }) => Ok(frames_stream(frames, hold)),
            Some(Dial::Gated { gate, frames }) => {
                gate.notified().await;
                Ok(frames_stream(frames, true))
            }
            Some(Dial::Channel(rx)) => Ok(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            })
            .boxed()),
            None => Ok(stream::pending().boxed()),
        }
    }
}

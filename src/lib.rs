//! Live exchange price pipeline.
//!
//! A feed client streams trades for one symbol from the upstream exchange,
//! a price hub fans each update out to local subscribers and a statistics
//! engine, and a swap coordinator switches the tracked symbol at runtime.
//! The [`server`] module exposes all of it over HTTP and WebSocket; the
//! [`tui`] module is a terminal dashboard that polls that API.

pub mod catalog;
pub mod config;
pub mod error;
pub mod feed;
pub mod hub;
pub mod models;
pub mod server;
pub mod stats;
pub mod store;
pub mod swap;
pub mod tui;

pub use error::{PipelineError, Result};

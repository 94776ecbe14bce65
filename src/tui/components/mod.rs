//! Reusable UI components.

pub mod sparkline;
pub mod status_bar;

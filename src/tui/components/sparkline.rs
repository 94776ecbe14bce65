//! One-line price sparkline.
//!
//! [`spark_points`] is a pure function of its input; rendering only maps
//! each point to a glyph and a color.

use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

/// Number of distinct bar heights.
pub const SPARK_LEVELS: usize = 8;

const GLYPHS: [char; SPARK_LEVELS] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Smallest range used for normalization, so a flat series does not divide
/// by zero.
const MIN_RANGE: f64 = 1e-9;

/// Direction of a sample relative to the one before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn color(self) -> Color {
        match self {
            Trend::Up => Color::Green,
            Trend::Down => Color::Red,
            Trend::Flat => Color::White,
        }
    }
}

/// A normalized sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SparkPoint {
    /// Bar height in `0..SPARK_LEVELS`.
    pub level: usize,
    pub trend: Trend,
}

impl SparkPoint {
    pub fn glyph(self) -> char {
        GLYPHS[self.level.min(SPARK_LEVELS - 1)]
    }
}

/// Normalizes `values` into bar levels and trends.
///
/// Returns `None` for fewer than two samples. The first sample is always
/// [`Trend::Flat`].
pub fn spark_points(values: &[f64]) -> Option<Vec<SparkPoint>> {
    if values.len() < 2 {
        return None;
    }

    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = (max - min).max(MIN_RANGE);
    let top = (SPARK_LEVELS - 1) as f64;

    let points = values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let scaled = ((value - min) * top / range).floor();
            let level = if scaled.is_finite() && scaled > 0.0 {
                (scaled as usize).min(SPARK_LEVELS - 1)
            } else {
                0
            };
            let trend = match i.checked_sub(1).map(|prev| values[prev]) {
                Some(prev) if value > prev => Trend::Up,
                Some(prev) if value < prev => Trend::Down,
                _ => Trend::Flat,
            };
            SparkPoint { level, trend }
        })
        .collect();

    Some(points)
}

/// Builds the styled sparkline, or a dim placeholder while data is short.
pub fn line(values: &[f64]) -> Line<'static> {
    match spark_points(values) {
        Some(points) => Line::from(
            points
                .into_iter()
                .map(|p| {
                    Span::styled(p.glyph().to_string(), Style::default().fg(p.trend.color()))
                })
                .collect::<Vec<_>>(),
        ),
        None => Line::from(Span::styled(
            "Collecting data...",
            Style::default().fg(Color::DarkGray),
        )),
    }
}

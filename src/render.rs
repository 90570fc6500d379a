//! Render requests handed to the external plotting layer.
//!
//! The engine decides what to draw; drawing itself belongs to whatever
//! implements [`RenderSink`]. Every view in this crate produces a list of
//! [`RenderRequest`] values that can be replayed into a sink in order.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Colour map for matrix views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    #[default]
    Viridis,
    Plasma,
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Colormap::Viridis => write!(f, "viridis"),
            Colormap::Plasma => write!(f, "plasma"),
        }
    }
}

/// One drawing call for the external renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderRequest {
    /// Line plot of `values` against `time_axis`.
    Line {
        time_axis: Vec<usize>,
        values: Vec<f64>,
        label: String,
    },
    /// Colour-mapped matrix.
    Matrix {
        values: Array2<f64>,
        colormap: Colormap,
    },
    /// Bar chart, one bar per value, left to right.
    Bars { values: Vec<f64> },
    /// Shaded half-open interval `[start, end)` on the time axis.
    HighlightSpan { start: usize, end: usize },
    /// Text placed at a data position.
    Annotation { position: (f64, f64), text: String },
    /// Panel title.
    Title(String),
}

/// Receiver of render requests.
pub trait RenderSink {
    fn draw_line(&mut self, time_axis: &[usize], values: &[f64], label: &str);
    fn draw_matrix(&mut self, values: &Array2<f64>, colormap: Colormap);
    fn draw_bars(&mut self, values: &[f64]);
    fn highlight_span(&mut self, start: usize, end: usize);
    fn draw_annotation(&mut self, position: (f64, f64), text: &str);

    /// Titles are optional for sinks that have nowhere to put them.
    fn set_title(&mut self, _title: &str) {}
}

impl RenderRequest {
    /// Replay this request into a sink.
    pub fn apply<S: RenderSink + ?Sized>(&self, sink: &mut S) {
        match self {
            RenderRequest::Line {
                time_axis,
                values,
                label,
            } => sink.draw_line(time_axis, values, label),
            RenderRequest::Matrix { values, colormap } => sink.draw_matrix(values, *colormap),
            RenderRequest::Bars { values } => sink.draw_bars(values),
            RenderRequest::HighlightSpan { start, end } => sink.highlight_span(*start, *end),
            RenderRequest::Annotation { position, text } => sink.draw_annotation(*position, text),
            RenderRequest::Title(title) => sink.set_title(title),
        }
    }
}

/// Replay a batch of requests in order.
pub fn replay<S: RenderSink + ?Sized>(requests: &[RenderRequest], sink: &mut S) {
    for request in requests {
        request.apply(sink);
    }
}

/// Sink that records calls as text, for tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub calls: Vec<String>,
}

impl RenderSink for RecordingSink {
    fn draw_line(&mut self, time_axis: &[usize], values: &[f64], label: &str) {
        self.calls
            .push(format!("line[{label}] {} points", time_axis.len().min(values.len())));
    }

    fn draw_matrix(&mut self, values: &Array2<f64>, colormap: Colormap) {
        let (r, c) = values.dim();
        self.calls.push(format!("matrix {r}x{c} {colormap}"));
    }

    fn draw_bars(&mut self, values: &[f64]) {
        self.calls.push(format!("bars {}", values.len()));
    }

    fn highlight_span(&mut self, start: usize, end: usize) {
        self.calls.push(format!("span {start}..{end}"));
    }

    fn draw_annotation(&mut self, _position: (f64, f64), text: &str) {
        self.calls.push(format!("annotation {text}"));
    }

    fn set_title(&mut self, title: &str) {
        self.calls.push(format!("title {title}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_preserves_order() {
        let requests = vec![
            RenderRequest::Title("t".into()),
            RenderRequest::Line {
                time_axis: vec![0, 1, 2],
                values: vec![1.0, 2.0, 3.0],
                label: "Seq 1".into(),
            },
            RenderRequest::HighlightSpan { start: 1, end: 2 },
            RenderRequest::Matrix {
                values: Array2::zeros((2, 2)),
                colormap: Colormap::Viridis,
            },
        ];
        let mut sink = RecordingSink::default();
        replay(&requests, &mut sink);
        assert_eq!(
            sink.calls,
            vec![
                "title t",
                "line[Seq 1] 3 points",
                "span 1..2",
                "matrix 2x2 viridis"
            ]
        );
    }

    #[test]
    fn test_colormap_serde_lowercase() {
        let json = serde_json::to_string(&Colormap::Plasma).unwrap();
        assert_eq!(json, "\"plasma\"");
    }
}

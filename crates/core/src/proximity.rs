//! Frame-scoped edges between nearby dots.
//!
//! Distances are compared squared so the common rejection case never takes a
//! square root. Edges are rebuilt from scratch every frame and dropped after
//! rendering.

use crate::color::Color;
use crate::dot::Dot;

/// Two-stop stroke gradient, `from` at the upper end of the edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeGradient {
    pub from: Color,
    pub to: Color,
}

/// A line between two dots for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub gradient: EdgeGradient,
    pub width: f64,
}

/// Rebuilds the edge list between dots closer than `max_len`.
#[derive(Debug, Clone)]
pub struct ProximityGraph {
    max_len_sq: f64,
    max_width: f64,
    edges: Vec<Edge>,
}

impl ProximityGraph {
    pub fn new(max_len: f64, max_width: f64) -> Self {
        Self {
            max_len_sq: max_len * max_len,
            max_width,
            edges: Vec::new(),
        }
    }

    /// Recomputes edges for every unordered pair of `dots`.
    ///
    /// Pairs farther apart than the threshold are skipped. The gradient runs
    /// from the first dot's color when the second lies to its left, from the
    /// second dot's color otherwise. Width falls linearly with squared
    /// distance, from `max_width` for touching dots to zero at the threshold.
    pub fn update(&mut self, dots: &[Dot]) -> &[Edge] {
        self.edges.clear();
        for (i, d0) in dots.iter().enumerate() {
            for d1 in &dots[i + 1..] {
                let dx = d1.x - d0.x;
                let dy = d1.y - d0.y;
                let dist_sq = dx * dx + dy * dy;
                if dist_sq > self.max_len_sq {
                    continue;
                }
                let (upper, lower) = if dx < 0.0 { (d0, d1) } else { (d1, d0) };
                self.edges.push(Edge {
                    x0: d0.x,
                    y0: d0.y,
                    x1: d1.x,
                    y1: d1.y,
                    gradient: EdgeGradient {
                        from: upper.color,
                        to: lower.color,
                    },
                    width: (1.0 - dist_sq / self.max_len_sq) * self.max_width,
                });
            }
        }
        &self.edges
    }

    /// Edges from the last [`update`](Self::update).
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn max_width(&self) -> f64 {
        self.max_width
    }
}

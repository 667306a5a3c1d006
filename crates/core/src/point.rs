//! Sampled grid points and the targets dots ease toward.

/// An immutable canvas coordinate produced by shape sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Where a dot should go and how visible it should become there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotTarget {
    pub x: f64,
    pub y: f64,
    pub a: f64,
}

impl DotTarget {
    pub const fn new(x: f64, y: f64, a: f64) -> Self {
        Self { x, y, a }
    }

    /// Target at `point` with alpha `a`.
    pub fn at(point: Point, a: f64) -> Self {
        Self::new(point.x, point.y, a)
    }
}

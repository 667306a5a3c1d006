//! Dot colors and the vertical color gradient.
//!
//! [`Color`] channels are plain `f64`s: r, g, b on a 0-255 scale and alpha on
//! a 0-1 scale. The model never clamps; values outside the display range are
//! legal and only get clamped by [`Color::to_rgba8`] at render time.

use std::ops::{Add, Mul, Sub};

use crate::error::AnimationError;

/// RGBA color with unclamped `f64` channels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

/// Component-wise difference between two reference colors.
///
/// Derived once per animation configuration; see [`diff`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorDelta(pub Color);

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgba(255.0, 255.0, 255.0, 1.0);

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Returns this color with its alpha replaced.
    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// Parses an opaque color from `"#rrggbb"` or `"rrggbb"` (case insensitive).
    pub fn from_hex(hex: &str) -> Result<Color, AnimationError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(AnimationError::InvalidColor(format!(
                "expected 6 hex digits in '{hex}'"
            )));
        }
        let channel = |range: std::ops::Range<usize>, name: &str| {
            u8::from_str_radix(&digits[range], 16)
                .map(f64::from)
                .map_err(|e| AnimationError::InvalidColor(format!("invalid {name} component: {e}")))
        };
        Ok(Color {
            r: channel(0..2, "red")?,
            g: channel(2..4, "green")?,
            b: channel(4..6, "blue")?,
            a: 1.0,
        })
    }

    /// Formats r, g, b as `"#rrggbb"`, clamped and rounded to 8 bits.
    pub fn to_hex(self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Clamps into display range and quantizes to RGBA8.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f64| if v.is_nan() { 0 } else { v.round().clamp(0.0, 255.0) as u8 };
        [q(self.r), q(self.g), q(self.b), q(self.a * 255.0)]
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, rhs: Color) -> Color {
        Color::rgba(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b, self.a + rhs.a)
    }
}

impl Sub for Color {
    type Output = Color;

    fn sub(self, rhs: Color) -> Color {
        Color::rgba(self.r - rhs.r, self.g - rhs.g, self.b - rhs.b, self.a - rhs.a)
    }
}

impl Mul<f64> for Color {
    type Output = Color;

    fn mul(self, k: f64) -> Color {
        Color::rgba(self.r * k, self.g * k, self.b * k, self.a * k)
    }
}

/// `c2 - c1`, per channel.
pub fn diff(c1: Color, c2: Color) -> ColorDelta {
    ColorDelta(c2 - c1)
}

/// `c1 + delta * (y / height)`, per channel, without clamping.
pub fn lerp_by_vertical(c1: Color, delta: ColorDelta, y: f64, height: f64) -> Color {
    c1 + delta.0 * (y / height)
}

/// Linear interpolation between two colors at `t` in [0, 1].
pub fn mix(from: Color, to: Color, t: f64) -> Color {
    from + (to - from) * t
}

/// Top-to-bottom color gradient evaluated by vertical position.
///
/// Caches the [`ColorDelta`] between the two reference colors so per-frame
/// lookups are a multiply-add.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalGradient {
    top: Color,
    delta: ColorDelta,
    height: f64,
}

impl VerticalGradient {
    pub fn new(top: Color, bottom: Color, height: f64) -> Self {
        Self {
            top,
            delta: diff(top, bottom),
            height,
        }
    }

    pub fn top(&self) -> Color {
        self.top
    }

    pub fn bottom(&self) -> Color {
        self.top + self.delta.0
    }

    /// Color at vertical position `y`.
    pub fn at(&self, y: f64) -> Color {
        lerp_by_vertical(self.top, self.delta, y, self.height)
    }
}

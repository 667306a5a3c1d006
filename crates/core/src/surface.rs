//! Fixed-size RGBA8 software drawing surface.
//!
//! Animations render into a [`Surface`] with source-over blending of
//! straight (non-premultiplied) colors. Model colors are clamped to the
//! display range here and nowhere else.

use crate::color::{mix, Color};
use crate::error::AnimationError;

/// Row-major RGBA8 pixel buffer plus a visibility flag for the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    visible: bool,
}

impl Surface {
    /// Allocates a transparent surface.
    ///
    /// Returns `InitializationFailure` if either dimension is zero or the
    /// buffer size overflows.
    pub fn new(width: usize, height: usize) -> Result<Self, AnimationError> {
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                AnimationError::InitializationFailure(format!(
                    "cannot allocate a {width}x{height} drawing surface"
                ))
            })?;
        Ok(Self {
            width,
            height,
            pixels: vec![0; len],
            visible: true,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// RGBA8 value at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Resets every pixel to fully transparent.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Blends `color` over the whole surface. A translucent fill leaves
    /// fading trails of the previous frame.
    pub fn fill(&mut self, color: Color) {
        for y in 0..self.height {
            for x in 0..self.width {
                self.blend(x, y, color, 1.0);
            }
        }
    }

    /// Draws an anti-aliased filled circle.
    pub fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Color) {
        if radius <= 0.0 || !cx.is_finite() || !cy.is_finite() {
            return;
        }
        let Some((x_range, y_range)) = self.clip(cx - radius, cy - radius, cx + radius, cy + radius)
        else {
            return;
        };
        for y in y_range {
            for x in x_range.clone() {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                let coverage = (radius + 0.5 - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
                self.blend(x, y, color, coverage);
            }
        }
    }

    /// Strokes a line segment of the given width, shading from `from` at
    /// `(x0, y0)` to `to` at `(x1, y1)`.
    ///
    /// Widths below one pixel are drawn as hairlines with proportionally
    /// reduced coverage.
    pub fn stroke_line(
        &mut self,
        (x0, y0): (f64, f64),
        (x1, y1): (f64, f64),
        width: f64,
        from: Color,
        to: Color,
    ) {
        if width <= 0.0 || ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
            return;
        }
        let half = width.max(1.0) / 2.0;
        let thinness = width.min(1.0);
        let Some((x_range, y_range)) = self.clip(
            x0.min(x1) - half,
            y0.min(y1) - half,
            x0.max(x1) + half,
            y0.max(y1) + half,
        ) else {
            return;
        };
        let (sx, sy) = (x1 - x0, y1 - y0);
        let len_sq = sx * sx + sy * sy;
        for y in y_range {
            for x in x_range.clone() {
                let px = x as f64 + 0.5;
                let py = y as f64 + 0.5;
                let t = if len_sq > 0.0 {
                    (((px - x0) * sx + (py - y0) * sy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let dx = px - (x0 + sx * t);
                let dy = py - (y0 + sy * t);
                let dist = (dx * dx + dy * dy).sqrt();
                let coverage = (half + 0.5 - dist).clamp(0.0, 1.0) * thinness;
                if coverage > 0.0 {
                    self.blend(x, y, mix(from, to, t), coverage);
                }
            }
        }
    }

    /// Pixel index ranges covering the box, or `None` if it misses the surface.
    fn clip(
        &self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> Option<(std::ops::Range<usize>, std::ops::Range<usize>)> {
        let (w, h) = (self.width as f64, self.height as f64);
        if max_x < 0.0 || max_y < 0.0 || min_x >= w || min_y >= h {
            return None;
        }
        let x0 = min_x.floor().max(0.0) as usize;
        let y0 = min_y.floor().max(0.0) as usize;
        let x1 = (max_x.ceil() + 1.0).min(w) as usize;
        let y1 = (max_y.ceil() + 1.0).min(h) as usize;
        Some((x0..x1, y0..y1))
    }

    /// Source-over blend of `color`, scaled by `coverage`, onto one pixel.
    fn blend(&mut self, x: usize, y: usize, color: Color, coverage: f64) {
        let [r, g, b, a] = color.to_rgba8();
        let sa = a as f64 / 255.0 * coverage;
        if sa <= 0.0 {
            return;
        }
        let i = (y * self.width + x) * 4;
        let da = self.pixels[i + 3] as f64 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        for (offset, src) in [r, g, b].into_iter().enumerate() {
            let dst = self.pixels[i + offset] as f64;
            let value = (src as f64 * sa + dst * da * (1.0 - sa)) / out_a;
            self.pixels[i + offset] = value.round().clamp(0.0, 255.0) as u8;
        }
        self.pixels[i + 3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

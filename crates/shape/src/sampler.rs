//! Fits an image onto a fixed canvas and samples its opaque pixels on a grid.

use dotfield_core::{AnimationError, Point};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::debug;

use crate::cache::ImageCache;

/// Converts cached images into row-major lists of opaque grid points.
///
/// Every call rasterizes onto its own scratch canvas, so one sampler can be
/// cloned into concurrent loader threads without the outputs interfering.
#[derive(Debug, Clone)]
pub struct ShapeSampler {
    cache: ImageCache,
    width: u32,
    height: u32,
    gap: u32,
}

impl ShapeSampler {
    /// Creates a sampler for a `width` x `height` canvas with grid stride `gap`.
    ///
    /// Returns `InitializationFailure` if any of them is zero.
    pub fn new(cache: ImageCache, width: u32, height: u32, gap: u32) -> Result<Self, AnimationError> {
        if width == 0 || height == 0 {
            return Err(AnimationError::InitializationFailure(format!(
                "cannot create a {width}x{height} sampling surface"
            )));
        }
        if gap == 0 {
            return Err(AnimationError::InitializationFailure(
                "sampling gap must be at least one pixel".into(),
            ));
        }
        Ok(Self {
            cache,
            width,
            height,
            gap,
        })
    }

    /// Loads `source` through the cache, fits it onto the canvas and samples it.
    pub fn sample(&self, source: &str) -> Result<Vec<Point>, AnimationError> {
        let image = self.cache.load(source)?;
        let canvas = self.rasterize(&image);
        let points = sample_grid(&canvas, self.gap);
        debug!(source, points = points.len(), gap = self.gap, "sampled shape");
        Ok(points)
    }

    /// Draws `image` onto a transparent canvas, scaled uniformly to fit and
    /// centered on both axes.
    pub fn rasterize(&self, image: &RgbaImage) -> RgbaImage {
        let mut canvas = RgbaImage::new(self.width, self.height);
        let (iw, ih) = image.dimensions();
        if iw == 0 || ih == 0 {
            return canvas;
        }
        let ratio = (self.width as f64 / iw as f64).min(self.height as f64 / ih as f64);
        let sw = ((iw as f64 * ratio).round() as u32).clamp(1, self.width);
        let sh = ((ih as f64 * ratio).round() as u32).clamp(1, self.height);
        let shift_x = i64::from((self.width - sw) / 2);
        let shift_y = i64::from((self.height - sh) / 2);

        if (sw, sh) == (iw, ih) {
            imageops::overlay(&mut canvas, image, shift_x, shift_y);
        } else {
            let scaled = imageops::resize(image, sw, sh, FilterType::Triangle);
            imageops::overlay(&mut canvas, &scaled, shift_x, shift_y);
        }
        canvas
    }
}

/// Row-major points at every `gap`-th column of every `gap`-th row whose
/// pixel alpha is non-zero.
pub fn sample_grid(canvas: &RgbaImage, gap: u32) -> Vec<Point> {
    let step = gap.max(1) as usize;
    let (w, h) = canvas.dimensions();
    (0..h)
        .step_by(step)
        .flat_map(|y| (0..w).step_by(step).map(move |x| (x, y)))
        .filter(|&(x, y)| canvas.get_pixel(x, y)[3] != 0)
        .map(|(x, y)| Point::new(f64::from(x), f64::from(y)))
        .collect()
}

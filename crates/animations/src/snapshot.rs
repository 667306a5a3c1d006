//! PNG export of a [`Surface`].
//!
//! Feature-gated behind `png` (default on) so the registry can be used
//! without pulling in the `image` crate's encoder.

use dotfield_core::{AnimationError, Color, Surface};
use std::path::Path;
use tracing::debug;

use crate::pixel::flatten;

/// Writes the surface as a PNG.
///
/// With a `background`, the surface is composited onto it and the image is
/// opaque; without one, the surface's own alpha is kept.
///
/// Returns `AnimationError::InvalidDimensions` if the surface dimensions
/// overflow `u32`, or `AnimationError::Io` on write failure.
pub fn write_png(
    surface: &Surface,
    background: Option<Color>,
    path: &Path,
) -> Result<(), AnimationError> {
    let rgba = match background {
        Some(bg) => flatten(surface, bg),
        None => surface.data().to_vec(),
    };
    let w = u32::try_from(surface.width()).map_err(|_| AnimationError::InvalidDimensions)?;
    let h = u32::try_from(surface.height()).map_err(|_| AnimationError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, rgba)
        .ok_or_else(|| AnimationError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path)
        .map_err(|e| AnimationError::Io(format!("{}: {e}", path.display())))?;
    debug!(path = %path.display(), width = w, height = h, "wrote snapshot");
    Ok(())
}

//! Pure-computation pixel buffer conversion from a [`Surface`].
//!
//! Always available (no feature gate) so hosts without the `png` feature can
//! still get display-ready bytes.

use dotfield_core::{Color, Surface};

/// Composites the surface over an opaque `background` and returns RGBA8
/// bytes with alpha 255 everywhere. The buffer length is `width * height * 4`.
///
/// A hidden surface yields a plain background.
pub fn flatten(surface: &Surface, background: Color) -> Vec<u8> {
    let [br, bg, bb, _] = background.with_alpha(1.0).to_rgba8();
    if !surface.is_visible() {
        return [br, bg, bb, 255]
            .into_iter()
            .cycle()
            .take(surface.data().len())
            .collect();
    }
    surface
        .data()
        .chunks_exact(4)
        .flat_map(|px| {
            let a = f64::from(px[3]) / 255.0;
            let over = |src: u8, dst: u8| {
                (f64::from(src) * a + f64::from(dst) * (1.0 - a)).round() as u8
            };
            [over(px[0], br), over(px[1], bg), over(px[2], bb), 255]
        })
        .collect()
}

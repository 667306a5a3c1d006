#![deny(unsafe_code)]
//! Shape sampling: turns a raster image into the grid points a dot
//! population animates toward.
//!
//! [`ImageCache`] decodes each source once and shares the result across
//! clones. [`ShapeSampler`] fits a cached image onto a fixed-size scratch
//! canvas and reports every grid cell whose pixel is not fully transparent.

pub mod cache;
pub mod sampler;

pub use cache::ImageCache;
pub use sampler::{sample_grid, ShapeSampler};

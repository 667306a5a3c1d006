#![deny(unsafe_code)]
//! Animation registry: maps animation names to implementations, navigates
//! between them by path, and exports surfaces as PNG.
//!
//! This crate sits between `dotfield-core` (which defines the `Animation`
//! trait) and the individual animation crates. The CLI depends on it to
//! avoid duplicating dispatch logic.

pub mod pixel;
pub mod router;

#[cfg(feature = "png")]
pub mod snapshot;

use dotfield_connected_dots::ConnectedDots;
use dotfield_core::{Animation, AnimationError, Seed, Surface};
use dotfield_dot_shape::DotShape;
use serde_json::Value;
use tracing::warn;

pub use dotfield_shape::ImageCache;
pub use router::{Navigation, RouteConfig, RouteTable, Router};

/// All available animation names.
const ANIMATION_NAMES: &[&str] = &["connected-dots", "dot-shape"];

/// Enumeration of all available animations.
///
/// Wraps each implementation and delegates `Animation` trait methods.
/// Use [`AnimationKind::from_name`] for string-based construction.
pub enum AnimationKind {
    ConnectedDots(ConnectedDots),
    DotShape(DotShape),
}

impl AnimationKind {
    /// Constructs a stopped animation by name.
    ///
    /// Returns `AnimationError::UnknownAnimation` if the name is not recognized.
    pub fn from_name(
        name: &str,
        seed: u64,
        params: &Value,
        cache: &ImageCache,
    ) -> Result<Self, AnimationError> {
        match name {
            "connected-dots" => Ok(AnimationKind::ConnectedDots(ConnectedDots::from_json(
                seed, params,
            )?)),
            "dot-shape" => Ok(AnimationKind::DotShape(DotShape::from_json(
                seed,
                params,
                cache.clone(),
            )?)),
            _ => Err(AnimationError::UnknownAnimation(name.to_string())),
        }
    }

    /// Constructs and starts the animation a [`Seed`] describes, loading its
    /// image if it names one. Ticks are left to the caller.
    pub fn mount(seed: &Seed, cache: &ImageCache) -> Result<Self, AnimationError> {
        seed.validate()?;
        let mut animation = Self::from_name(&seed.animation, seed.seed, &seed.params, cache)?;
        animation.start();
        if let Some(image) = &seed.image {
            animation.set_image_blocking(image)?;
        }
        Ok(animation)
    }

    /// Returns a slice of all recognized animation names.
    pub fn list_animations() -> &'static [&'static str] {
        ANIMATION_NAMES
    }

    /// Whether the animation samples shapes from images.
    pub fn takes_image(&self) -> bool {
        matches!(self, AnimationKind::DotShape(_))
    }

    /// Requests a new shape in the background.
    ///
    /// Returns `InvalidParams` for animations that do not take images.
    pub fn set_image(&mut self, source: &str) -> Result<(), AnimationError> {
        match self {
            AnimationKind::DotShape(a) => {
                a.set_image(source);
                Ok(())
            }
            other => Err(no_images(other.name())),
        }
    }

    /// Loads a new shape and retargets before returning.
    pub fn set_image_blocking(&mut self, source: &str) -> Result<(), AnimationError> {
        match self {
            AnimationKind::DotShape(a) => a.set_image_blocking(source).map(|_| ()),
            other => Err(no_images(other.name())),
        }
    }

    /// Number of dots currently alive.
    pub fn dot_count(&self) -> usize {
        match self {
            AnimationKind::ConnectedDots(a) => a.field().len(),
            AnimationKind::DotShape(a) => a.field().len(),
        }
    }

    /// The last failed background image load, if any.
    pub fn last_load_error(&self) -> Option<&AnimationError> {
        match self {
            AnimationKind::DotShape(a) => a.last_load_error(),
            AnimationKind::ConnectedDots(_) => None,
        }
    }
}

fn no_images(name: &str) -> AnimationError {
    warn!(animation = name, "image requested for an animation without shapes");
    AnimationError::InvalidParams(format!("{name} does not take an image"))
}

impl Animation for AnimationKind {
    fn name(&self) -> &'static str {
        match self {
            AnimationKind::ConnectedDots(a) => a.name(),
            AnimationKind::DotShape(a) => a.name(),
        }
    }

    fn start(&mut self) {
        match self {
            AnimationKind::ConnectedDots(a) => a.start(),
            AnimationKind::DotShape(a) => a.start(),
        }
    }

    fn destroy(&mut self) {
        match self {
            AnimationKind::ConnectedDots(a) => a.destroy(),
            AnimationKind::DotShape(a) => a.destroy(),
        }
    }

    fn is_running(&self) -> bool {
        match self {
            AnimationKind::ConnectedDots(a) => a.is_running(),
            AnimationKind::DotShape(a) => a.is_running(),
        }
    }

    fn update(&mut self) -> Result<bool, AnimationError> {
        match self {
            AnimationKind::ConnectedDots(a) => a.update(),
            AnimationKind::DotShape(a) => a.update(),
        }
    }

    fn render(&mut self) {
        match self {
            AnimationKind::ConnectedDots(a) => a.render(),
            AnimationKind::DotShape(a) => a.render(),
        }
    }

    fn surface(&self) -> &Surface {
        match self {
            AnimationKind::ConnectedDots(a) => a.surface(),
            AnimationKind::DotShape(a) => a.surface(),
        }
    }

    fn surface_mut(&mut self) -> &mut Surface {
        match self {
            AnimationKind::ConnectedDots(a) => a.surface_mut(),
            AnimationKind::DotShape(a) => a.surface_mut(),
        }
    }

    fn params(&self) -> Value {
        match self {
            AnimationKind::ConnectedDots(a) => a.params(),
            AnimationKind::DotShape(a) => a.params(),
        }
    }

    fn param_schema(&self) -> Value {
        match self {
            AnimationKind::ConnectedDots(a) => a.param_schema(),
            AnimationKind::DotShape(a) => a.param_schema(),
        }
    }
}

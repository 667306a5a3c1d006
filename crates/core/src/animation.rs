//! The lifecycle trait every animation implements.
//!
//! The trait is object-safe so a host can hold `Box<dyn Animation>` and swap
//! animations at runtime.

use crate::error::AnimationError;
use crate::surface::Surface;
use serde_json::Value;

/// A self-contained animation rendering into its own [`Surface`].
///
/// A host calls [`start`](Animation::start) once mounted, then drives
/// [`update`](Animation::update) and [`render`](Animation::render) from an
/// [`AnimationLoop`](crate::AnimationLoop), and finally
/// [`destroy`](Animation::destroy) when navigating away.
pub trait Animation {
    /// Registry name, e.g. `"dot-shape"`.
    fn name(&self) -> &'static str;

    /// (Re)initializes the dot population. Calling it twice starts over.
    fn start(&mut self);

    /// Stops the animation and releases per-instance state.
    fn destroy(&mut self);

    /// Whether the animation has been started and not destroyed since.
    fn is_running(&self) -> bool;

    /// Advances the simulation one tick and returns whether anything
    /// changed that needs redrawing.
    fn update(&mut self) -> Result<bool, AnimationError>;

    /// Draws the current state onto the surface.
    fn render(&mut self);

    fn surface(&self) -> &Surface;

    fn surface_mut(&mut self) -> &mut Surface;

    /// Current parameter values as a JSON object.
    fn params(&self) -> Value;

    /// Parameter names, types, ranges and defaults.
    fn param_schema(&self) -> Value;
}

#![deny(unsafe_code)]
//! Dot-shape animation.
//!
//! Dots form the opaque silhouette of an image. Each new image scatters the
//! population across the canvas, then the dots reconverge onto the grid
//! points of the new shape, tinted by a vertical gradient. Dots the new
//! shape does not need fade to a faint resting spot near the edges.
//!
//! Images load on a background thread. The finished point list is applied
//! between ticks, so a tick never sees a half-updated shape.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use dotfield_core::{
    Animation, AnimationError, Color, Easing, FieldConfig, FieldMode, Params, ParticleField,
    Point, RetargetSummary, Surface,
};
use dotfield_shape::{ImageCache, ShapeSampler};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

const DEFAULT_SIZE: usize = 600;
const DEFAULT_DOT_RADIUS: f64 = 4.0;
const DEFAULT_DOT_GAP: usize = 14;
const DEFAULT_REST_ALPHA: f64 = 0.2;
const DEFAULT_LOAD_TIMEOUT_MS: u64 = 5000;
/// Longer timeouts are cut to an hour.
const MAX_LOAD_TIMEOUT_MS: u64 = 3_600_000;
/// Alpha of the white wash laid over the previous frame.
const DEFAULT_BACKGROUND_ALPHA: f64 = 0.9;
const DEFAULT_TOP: Color = Color::rgba(206.0, 254.0, 66.0, 1.0);
const DEFAULT_BOTTOM: Color = Color::rgba(0.0, 194.0, 255.0, 1.0);

/// Tunable constants of the dot-shape animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotShapeParams {
    pub width: usize,
    pub height: usize,
    pub dot_radius: f64,
    /// Grid stride, in pixels, used when sampling shapes.
    pub dot_gap: usize,
    pub easing: Easing,
    pub rest_alpha: f64,
    pub top_color: Color,
    pub bottom_color: Color,
    pub background_alpha: f64,
    pub load_timeout_ms: u64,
}

impl Default for DotShapeParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
            dot_radius: DEFAULT_DOT_RADIUS,
            dot_gap: DEFAULT_DOT_GAP,
            easing: Easing::default(),
            rest_alpha: DEFAULT_REST_ALPHA,
            top_color: DEFAULT_TOP,
            bottom_color: DEFAULT_BOTTOM,
            background_alpha: DEFAULT_BACKGROUND_ALPHA,
            load_timeout_ms: DEFAULT_LOAD_TIMEOUT_MS,
        }
    }
}

impl DotShapeParams {
    /// Extracts parameters from a JSON object, falling back to defaults.
    ///
    /// Fails only on malformed color strings.
    pub fn from_json(params: &Value) -> Result<Self, AnimationError> {
        let p = Params::new(params);
        let easing = Easing::default();
        Ok(Self {
            width: p.usize("width", DEFAULT_SIZE),
            height: p.usize("height", DEFAULT_SIZE),
            dot_radius: p.f64("dot_radius", DEFAULT_DOT_RADIUS),
            dot_gap: p.usize("dot_gap", DEFAULT_DOT_GAP),
            easing: Easing {
                ease: p.f64("ease", easing.ease),
                alpha_rate: p.f64("alpha_rate", easing.alpha_rate),
                arrive_threshold: p.f64("arrive_threshold", easing.arrive_threshold),
                alpha_epsilon: p.f64("alpha_epsilon", easing.alpha_epsilon),
            },
            rest_alpha: p.f64("rest_alpha", DEFAULT_REST_ALPHA),
            top_color: p.color("top_color", DEFAULT_TOP)?,
            bottom_color: p.color("bottom_color", DEFAULT_BOTTOM)?,
            background_alpha: p.f64("background_alpha", DEFAULT_BACKGROUND_ALPHA),
            load_timeout_ms: p.u64("load_timeout_ms", DEFAULT_LOAD_TIMEOUT_MS),
        })
    }

    fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms.min(MAX_LOAD_TIMEOUT_MS))
    }
}

type LoadResult = Result<Vec<Point>, AnimationError>;

/// An image being sampled on a loader thread.
struct PendingShape {
    source: String,
    receiver: Receiver<LoadResult>,
    deadline: Instant,
}

/// Dots easing into the shape of an image.
pub struct DotShape {
    params: DotShapeParams,
    field: ParticleField,
    sampler: ShapeSampler,
    surface: Surface,
    pending: Option<PendingShape>,
    shape_source: Option<String>,
    last_load_error: Option<AnimationError>,
    running: bool,
}

impl DotShape {
    /// Creates a stopped animation sampling through `cache`.
    ///
    /// Returns `InitializationFailure` when the drawing or sampling surface
    /// cannot be created.
    pub fn new(params: DotShapeParams, seed: u64, cache: ImageCache) -> Result<Self, AnimationError> {
        let surface = Surface::new(params.width, params.height)?;
        let to_u32 = |v: usize| {
            u32::try_from(v).map_err(|_| {
                AnimationError::InitializationFailure(format!("{v} does not fit a sampling surface"))
            })
        };
        let sampler = ShapeSampler::new(
            cache,
            to_u32(params.width)?,
            to_u32(params.height)?,
            to_u32(params.dot_gap)?,
        )?;
        let field = ParticleField::new(
            FieldMode::Targets,
            FieldConfig {
                width: params.width as f64,
                height: params.height as f64,
                top: params.top_color,
                bottom: params.bottom_color,
                easing: params.easing,
                dot_radius: params.dot_radius,
                rest_alpha: params.rest_alpha,
            },
            seed,
        )?;
        Ok(Self {
            params,
            field,
            sampler,
            surface,
            pending: None,
            shape_source: None,
            last_load_error: None,
            running: false,
        })
    }

    pub fn from_json(seed: u64, params: &Value, cache: ImageCache) -> Result<Self, AnimationError> {
        Self::new(DotShapeParams::from_json(params)?, seed, cache)
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    /// Source of the last shape applied to the dots.
    pub fn shape_source(&self) -> Option<&str> {
        self.shape_source.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// The most recent failed or timed-out load, cleared by the next success.
    pub fn last_load_error(&self) -> Option<&AnimationError> {
        self.last_load_error.as_ref()
    }

    /// Starts sampling `source` in the background. The dots are retargeted
    /// during the first update after sampling finishes.
    ///
    /// A newer call supersedes a load still in flight.
    pub fn set_image(&mut self, source: &str) {
        let (tx, rx) = mpsc::channel();
        let sampler = self.sampler.clone();
        let owned = source.to_string();
        let spawned = thread::Builder::new()
            .name("shape-loader".into())
            .spawn(move || {
                // The receiver is gone if this load was superseded.
                let _ = tx.send(sampler.sample(&owned));
            });
        match spawned {
            Ok(_) => {
                if let Some(old) = self.pending.take() {
                    debug!(superseded = %old.source, source, "shape load superseded");
                }
                self.pending = Some(PendingShape {
                    source: source.to_string(),
                    receiver: rx,
                    deadline: Instant::now() + self.params.load_timeout(),
                });
            }
            Err(e) => self.record_load_error(AnimationError::asset(source, e)),
        }
    }

    /// Samples `source` and retargets the dots before returning.
    ///
    /// Waits at most `load_timeout_ms`; a late or failed load is an
    /// `AssetLoadFailure` and leaves the dots untouched.
    pub fn set_image_blocking(&mut self, source: &str) -> Result<RetargetSummary, AnimationError> {
        self.set_image(source);
        let Some(pending) = self.pending.take() else {
            return Err(self
                .last_load_error
                .take()
                .unwrap_or_else(|| AnimationError::asset(source, "loader did not start")));
        };
        let wait = pending.deadline.saturating_duration_since(Instant::now());
        let outcome = match pending.receiver.recv_timeout(wait) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(timed_out(&pending.source, self.params.load_timeout_ms)),
            Err(RecvTimeoutError::Disconnected) => Err(loader_exited(&pending.source)),
        };
        match outcome {
            Ok(points) => self.apply_shape(pending.source, &points),
            Err(e) => {
                warn!(source, error = %e, "shape load failed");
                Err(e)
            }
        }
    }

    /// Applies a finished background load, or expires one past its deadline.
    fn poll_pending(&mut self) -> Result<(), AnimationError> {
        let Some(pending) = &self.pending else {
            return Ok(());
        };
        let outcome = match pending.receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) if Instant::now() < pending.deadline => return Ok(()),
            Err(TryRecvError::Empty) => Err(timed_out(&pending.source, self.params.load_timeout_ms)),
            Err(TryRecvError::Disconnected) => Err(loader_exited(&pending.source)),
        };
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        match outcome {
            Ok(points) => self.apply_shape(pending.source, &points).map(|_| ()),
            Err(e) => {
                self.record_load_error(e);
                Ok(())
            }
        }
    }

    fn apply_shape(&mut self, source: String, points: &[Point]) -> Result<RetargetSummary, AnimationError> {
        let summary = self.field.retarget(points)?;
        info!(
            source = %source,
            points = points.len(),
            population = self.field.len(),
            "shape applied"
        );
        self.shape_source = Some(source);
        self.last_load_error = None;
        Ok(summary)
    }

    fn record_load_error(&mut self, e: AnimationError) {
        warn!(error = %e, "shape load failed");
        self.last_load_error = Some(e);
    }
}

fn timed_out(source: &str, ms: u64) -> AnimationError {
    AnimationError::asset(source, format!("timed out after {ms} ms"))
}

fn loader_exited(source: &str) -> AnimationError {
    AnimationError::asset(source, "loader exited without a result")
}

impl Animation for DotShape {
    fn name(&self) -> &'static str {
        "dot-shape"
    }

    fn start(&mut self) {
        self.field.clear();
        self.surface.clear();
        self.running = true;
        info!(
            width = self.params.width,
            height = self.params.height,
            "dot-shape started"
        );
    }

    fn destroy(&mut self) {
        self.running = false;
        self.pending = None;
        self.field.clear();
        self.surface.clear();
        info!("dot-shape destroyed");
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn update(&mut self) -> Result<bool, AnimationError> {
        self.poll_pending()?;
        self.field.update()
    }

    fn render(&mut self) {
        self.surface
            .fill(Color::WHITE.with_alpha(self.params.background_alpha));
        for dot in self.field.dots() {
            self.surface.fill_circle(dot.x, dot.y, dot.radius, dot.color);
        }
    }

    fn surface(&self) -> &Surface {
        &self.surface
    }

    fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    fn params(&self) -> Value {
        let p = &self.params;
        json!({
            "width": p.width,
            "height": p.height,
            "dot_radius": p.dot_radius,
            "dot_gap": p.dot_gap,
            "ease": p.easing.ease,
            "alpha_rate": p.easing.alpha_rate,
            "arrive_threshold": p.easing.arrive_threshold,
            "alpha_epsilon": p.easing.alpha_epsilon,
            "rest_alpha": p.rest_alpha,
            "top_color": p.top_color.to_hex(),
            "bottom_color": p.bottom_color.to_hex(),
            "background_alpha": p.background_alpha,
            "load_timeout_ms": p.load_timeout_ms,
        })
    }

    fn param_schema(&self) -> Value {
        let easing = Easing::default();
        json!({
            "width": {"type": "integer", "default": DEFAULT_SIZE, "min": 1, "description": "Canvas width in pixels"},
            "height": {"type": "integer", "default": DEFAULT_SIZE, "min": 1, "description": "Canvas height in pixels"},
            "dot_radius": {"type": "number", "default": DEFAULT_DOT_RADIUS, "min": 0.0, "max": 20.0, "description": "Dot radius in pixels"},
            "dot_gap": {"type": "integer", "default": DEFAULT_DOT_GAP, "min": 1, "max": 100, "description": "Sampling grid stride; smaller means more dots"},
            "ease": {"type": "number", "default": easing.ease, "min": 0.0, "max": 1.0, "description": "Fraction of the remaining distance covered per tick"},
            "alpha_rate": {"type": "number", "default": easing.alpha_rate, "min": 0.0, "max": 10.0, "description": "Alpha easing speed relative to ease"},
            "arrive_threshold": {"type": "number", "default": easing.arrive_threshold, "min": 0.0, "max": 20.0, "description": "Distance at which a dot counts as arrived"},
            "alpha_epsilon": {"type": "number", "default": easing.alpha_epsilon, "min": 0.0, "max": 1.0, "description": "Alpha difference at which alpha snaps to its target"},
            "rest_alpha": {"type": "number", "default": DEFAULT_REST_ALPHA, "min": 0.0, "max": 1.0, "description": "Alpha of dots the current shape does not use"},
            "top_color": {"type": "string", "default": DEFAULT_TOP.to_hex(), "description": "Dot color at the top edge"},
            "bottom_color": {"type": "string", "default": DEFAULT_BOTTOM.to_hex(), "description": "Dot color at the bottom edge"},
            "background_alpha": {"type": "number", "default": DEFAULT_BACKGROUND_ALPHA, "min": 0.0, "max": 1.0, "description": "Opacity of the white wash drawn before each frame"},
            "load_timeout_ms": {"type": "integer", "default": DEFAULT_LOAD_TIMEOUT_MS, "min": 0, "description": "How long an image load may take before it is abandoned"}
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotfield_core::{AnimationLoop, DotTarget, FrameBudget, TargetState};
    use image::{DynamicImage, Rgba, RgbaImage};

    fn cache_with_shapes() -> ImageCache {
        let cache = ImageCache::new();
        // 600x600 with a 100x100 opaque square in the middle.
        let mut square = RgbaImage::new(600, 600);
        for y in 250..350 {
            for x in 250..350 {
                square.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        cache.insert("square", DynamicImage::ImageRgba8(square));
        // Single opaque grid cell at (14, 14).
        let mut dot = RgbaImage::new(600, 600);
        dot.put_pixel(14, 14, Rgba([0, 0, 0, 255]));
        cache.insert("dot", DynamicImage::ImageRgba8(dot));
        cache
    }

    fn shape() -> DotShape {
        DotShape::new(DotShapeParams::default(), 42, cache_with_shapes()).unwrap()
    }

    fn wait_for_load(anim: &mut DotShape) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while anim.is_loading() {
            anim.update().unwrap();
            assert!(Instant::now() < deadline, "load never finished");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn defaults_match_reference_configuration() {
        let anim = shape();
        assert_eq!(anim.surface().width(), 600);
        assert_eq!(anim.surface().height(), 600);
        assert!(anim.field().is_empty());
        assert!(!anim.is_running());
        assert_eq!(anim.params()["dot_gap"], 14);
        assert_eq!(anim.params()["top_color"], "#cefe42");
    }

    #[test]
    fn from_json_overrides_and_validates() {
        let params = DotShapeParams::from_json(&json!({"dot_gap": 10, "ease": 0.2})).unwrap();
        assert_eq!(params.dot_gap, 10);
        assert_eq!(params.easing.ease, 0.2);
        assert_eq!(params.easing.arrive_threshold, 1.2);
        assert!(DotShapeParams::from_json(&json!({"top_color": "red"})).is_err());
    }

    #[test]
    fn zero_gap_is_initialization_failure() {
        let params = DotShapeParams {
            dot_gap: 0,
            ..DotShapeParams::default()
        };
        assert!(matches!(
            DotShape::new(params, 1, ImageCache::new()),
            Err(AnimationError::InitializationFailure(_))
        ));
    }

    #[test]
    fn blocking_set_image_retargets_one_dot_per_point() {
        let mut anim = shape();
        anim.start();
        let summary = anim.set_image_blocking("square").unwrap();
        // Grid columns/rows 252..=336 step 14 inside 250..350: 7 x 7.
        assert_eq!(summary.assigned, 49);
        assert_eq!(anim.field().len(), 49);
        assert_eq!(anim.shape_source(), Some("square"));
        let first = anim.field().dots()[0].queued().nth(1).copied();
        assert_eq!(first, Some(DotTarget::new(252.0, 252.0, 1.0)));
    }

    #[test]
    fn background_load_is_applied_by_update() {
        let mut anim = shape();
        anim.start();
        anim.set_image("square");
        assert!(anim.is_loading());
        wait_for_load(&mut anim);
        assert_eq!(anim.field().len(), 49);
        assert!(anim.last_load_error().is_none());
    }

    #[test]
    fn newer_request_supersedes_older() {
        let mut anim = shape();
        anim.start();
        anim.set_image("square");
        anim.set_image("dot");
        wait_for_load(&mut anim);
        assert_eq!(anim.shape_source(), Some("dot"));
        assert_eq!(anim.field().len(), 1);
    }

    #[test]
    fn failed_background_load_is_recorded_not_fatal() {
        let mut anim = shape();
        anim.start();
        anim.set_image("no/such/shape.png");
        wait_for_load(&mut anim);
        assert!(matches!(
            anim.last_load_error(),
            Some(AnimationError::AssetLoadFailure { .. })
        ));
        assert!(anim.update().is_ok());
        assert!(anim.field().is_empty());
    }

    #[test]
    fn zero_timeout_never_hangs() {
        let params = DotShapeParams {
            load_timeout_ms: 0,
            ..DotShapeParams::default()
        };
        let mut anim = DotShape::new(params, 1, ImageCache::new()).unwrap();
        let err = anim.set_image_blocking("no/such/shape.png").unwrap_err();
        assert!(matches!(err, AnimationError::AssetLoadFailure { .. }));
    }

    #[test]
    fn smaller_shape_keeps_population() {
        let mut anim = shape();
        anim.start();
        anim.set_image_blocking("square").unwrap();
        let summary = anim.set_image_blocking("dot").unwrap();
        assert_eq!(anim.field().len(), 49);
        assert_eq!(summary.resting, 48);
    }

    #[test]
    fn loop_settles_on_shape_and_stops_rendering() {
        let mut anim = shape();
        anim.start();
        anim.set_image_blocking("dot").unwrap();
        let mut lp = AnimationLoop::new(FrameBudget::new(1000));
        lp.start();
        let stats = lp.run(&mut anim).unwrap();
        assert_eq!(stats.ticks, 1000);
        assert!(stats.skipped > 800, "settled shape should skip renders: {stats:?}");
        let dot = &anim.field().dots()[0];
        assert!(dot.distance_to(14.0, 14.0).2 <= 1.2);
        assert_eq!(dot.color.a, 1.0);
        assert_eq!(dot.target_state(), Some(TargetState::Idle));
    }

    #[test]
    fn render_draws_dots() {
        let mut anim = shape();
        anim.start();
        anim.set_image_blocking("dot").unwrap();
        for _ in 0..300 {
            anim.update().unwrap();
        }
        anim.render();
        let [r, g, b, a] = anim.surface().pixel(14, 14).unwrap();
        assert_eq!(a, 255);
        // Gradient near the top is yellow-green, not the white wash.
        assert!(r < 250 || g < 250 || b < 250, "pixel is white: {r},{g},{b}");
    }

    #[test]
    fn destroy_cancels_load_and_stops() {
        let mut anim = shape();
        anim.start();
        anim.set_image("square");
        anim.destroy();
        assert!(!anim.is_running());
        assert!(!anim.is_loading());
        let mut lp = AnimationLoop::new(FrameBudget::new(5));
        lp.start();
        assert_eq!(lp.run(&mut anim).unwrap().ticks, 0);
    }

    #[test]
    fn start_reinitializes_population() {
        let mut anim = shape();
        anim.start();
        anim.set_image_blocking("square").unwrap();
        anim.start();
        assert!(anim.field().is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        /// A 60x60 shape with an opaque `side` x `side` block at the origin.
        fn block_cache(sides: &[u32]) -> ImageCache {
            let cache = ImageCache::new();
            for &side in sides {
                let mut img = RgbaImage::new(60, 60);
                for y in 0..side {
                    for x in 0..side {
                        img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
                    }
                }
                cache.insert(format!("block-{side}"), DynamicImage::ImageRgba8(img));
            }
            cache
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn population_is_high_water_mark(
                sides in prop::collection::vec(1_u32..=60, 1..5),
                seed: u64,
            ) {
                let params = DotShapeParams {
                    width: 60,
                    height: 60,
                    dot_gap: 6,
                    ..DotShapeParams::default()
                };
                let mut anim = DotShape::new(params, seed, block_cache(&sides)).unwrap();
                anim.start();
                let mut high = 0;
                for side in &sides {
                    anim.set_image_blocking(&format!("block-{side}")).unwrap();
                    for _ in 0..5 {
                        anim.update().unwrap();
                    }
                    // Grid cells 0, 6, 12.. inside 0..side.
                    let per_axis = (side + 5) / 6;
                    high = high.max((per_axis * per_axis) as usize);
                    prop_assert_eq!(anim.field().len(), high);
                }
            }
        }
    }
}

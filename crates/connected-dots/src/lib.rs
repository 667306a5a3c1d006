#![deny(unsafe_code)]
//! Connected-dots animation.
//!
//! A fixed population of dots drifts at constant speed, bouncing off the
//! canvas edges. Every frame, dots closer than a threshold are joined by a
//! line whose width shrinks with distance and whose color blends between
//! the two endpoints. Dot colors follow a vertical gradient.

use dotfield_core::{
    Animation, AnimationError, Color, FieldConfig, FieldMode, Params, ParticleField,
    ProximityGraph, Surface,
};
use serde_json::{json, Value};
use tracing::{error, info};

const DEFAULT_SIZE: usize = 400;
const DEFAULT_N_DOTS: usize = 100;
/// Maximum speed per axis, in pixels per tick.
const DEFAULT_V_MAX: f64 = 0.4;
const DEFAULT_RADIUS_MIN: f64 = 2.5;
const DEFAULT_RADIUS_MAX: f64 = 5.0;
/// Pairs farther apart than this are not connected.
const DEFAULT_EDGE_MAX_LEN: f64 = 64.0;
const DEFAULT_EDGE_MAX_WIDTH: f64 = 1.2;
const DEFAULT_BACKGROUND_ALPHA: f64 = 0.9;
const DEFAULT_TOP: Color = Color::rgba(206.0, 254.0, 66.0, 1.0);
const DEFAULT_BOTTOM: Color = Color::rgba(0.0, 194.0, 255.0, 1.0);

/// Tunable constants of the connected-dots animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectedDotsParams {
    pub width: usize,
    pub height: usize,
    pub n_dots: usize,
    pub v_max: f64,
    pub radius_min: f64,
    pub radius_max: f64,
    pub edge_max_len: f64,
    pub edge_max_width: f64,
    pub top_color: Color,
    pub bottom_color: Color,
    /// Opacity of the white wash laid over the previous frame.
    pub background_alpha: f64,
}

impl Default for ConnectedDotsParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
            n_dots: DEFAULT_N_DOTS,
            v_max: DEFAULT_V_MAX,
            radius_min: DEFAULT_RADIUS_MIN,
            radius_max: DEFAULT_RADIUS_MAX,
            edge_max_len: DEFAULT_EDGE_MAX_LEN,
            edge_max_width: DEFAULT_EDGE_MAX_WIDTH,
            top_color: DEFAULT_TOP,
            bottom_color: DEFAULT_BOTTOM,
            background_alpha: DEFAULT_BACKGROUND_ALPHA,
        }
    }
}

impl ConnectedDotsParams {
    /// Extracts parameters from a JSON object, falling back to defaults.
    pub fn from_json(params: &Value) -> Result<Self, AnimationError> {
        let p = Params::new(params);
        Ok(Self {
            width: p.usize("width", DEFAULT_SIZE),
            height: p.usize("height", DEFAULT_SIZE),
            n_dots: p.usize("n_dots", DEFAULT_N_DOTS),
            v_max: p.f64("v_max", DEFAULT_V_MAX),
            radius_min: p.f64("radius_min", DEFAULT_RADIUS_MIN),
            radius_max: p.f64("radius_max", DEFAULT_RADIUS_MAX),
            edge_max_len: p.f64("edge_max_len", DEFAULT_EDGE_MAX_LEN),
            edge_max_width: p.f64("edge_max_width", DEFAULT_EDGE_MAX_WIDTH),
            top_color: p.color("top_color", DEFAULT_TOP)?,
            bottom_color: p.color("bottom_color", DEFAULT_BOTTOM)?,
            background_alpha: p.f64("background_alpha", DEFAULT_BACKGROUND_ALPHA),
        })
    }
}

/// Bouncing dots joined by proximity edges.
pub struct ConnectedDots {
    params: ConnectedDotsParams,
    field: ParticleField,
    graph: ProximityGraph,
    surface: Surface,
    running: bool,
}

impl ConnectedDots {
    /// Creates a stopped animation with no dots. `start` populates it.
    ///
    /// Returns `InitializationFailure` for a zero-sized surface.
    pub fn new(params: ConnectedDotsParams, seed: u64) -> Result<Self, AnimationError> {
        let surface = Surface::new(params.width, params.height)?;
        let field = ParticleField::new(
            FieldMode::Velocity,
            FieldConfig {
                width: params.width as f64,
                height: params.height as f64,
                top: params.top_color,
                bottom: params.bottom_color,
                ..FieldConfig::default()
            },
            seed,
        )?;
        Ok(Self {
            graph: ProximityGraph::new(params.edge_max_len, params.edge_max_width),
            params,
            field,
            surface,
            running: false,
        })
    }

    pub fn from_json(seed: u64, params: &Value) -> Result<Self, AnimationError> {
        Self::new(ConnectedDotsParams::from_json(params)?, seed)
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn graph(&self) -> &ProximityGraph {
        &self.graph
    }
}

impl Animation for ConnectedDots {
    fn name(&self) -> &'static str {
        "connected-dots"
    }

    fn start(&mut self) {
        let p = self.params;
        let populated = self
            .field
            .populate(p.n_dots, p.v_max, (p.radius_min, p.radius_max));
        // `new` only builds velocity-mode fields, the one mode populate accepts.
        debug_assert!(populated.is_ok(), "connected-dots field is not velocity-mode");
        if let Err(e) = populated {
            error!(error = %e, "connected-dots failed to populate");
            return;
        }
        self.surface.clear();
        self.running = true;
        info!(dots = p.n_dots, width = p.width, height = p.height, "connected-dots started");
    }

    fn destroy(&mut self) {
        self.running = false;
        self.field.clear();
        self.graph.update(&[]);
        self.surface.clear();
        info!("connected-dots destroyed");
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn update(&mut self) -> Result<bool, AnimationError> {
        let dirty = self.field.update()?;
        self.graph.update(self.field.dots());
        Ok(dirty)
    }

    fn render(&mut self) {
        self.surface
            .fill(Color::WHITE.with_alpha(self.params.background_alpha));
        for dot in self.field.dots() {
            self.surface.fill_circle(dot.x, dot.y, dot.radius, dot.color);
        }
        for edge in self.graph.edges() {
            self.surface.stroke_line(
                (edge.x0, edge.y0),
                (edge.x1, edge.y1),
                edge.width,
                edge.gradient.from,
                edge.gradient.to,
            );
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
            "n_dots": p.n_dots,
            "v_max": p.v_max,
            "radius_min": p.radius_min,
            "radius_max": p.radius_max,
            "edge_max_len": p.edge_max_len,
            "edge_max_width": p.edge_max_width,
            "top_color": p.top_color.to_hex(),
            "bottom_color": p.bottom_color.to_hex(),
            "background_alpha": p.background_alpha,
        })
    }

    fn param_schema(&self) -> Value {
        json!({
            "width": {"type": "integer", "default": DEFAULT_SIZE, "min": 1, "description": "Canvas width in pixels"},
            "height": {"type": "integer", "default": DEFAULT_SIZE, "min": 1, "description": "Canvas height in pixels"},
            "n_dots": {"type": "integer", "default": DEFAULT_N_DOTS, "min": 0, "max": 2000, "description": "Number of dots"},
            "v_max": {"type": "number", "default": DEFAULT_V_MAX, "min": 0.0, "max": 10.0, "description": "Maximum speed per axis in pixels per tick"},
            "radius_min": {"type": "number", "default": DEFAULT_RADIUS_MIN, "min": 0.0, "max": 50.0, "description": "Smallest dot radius"},
            "radius_max": {"type": "number", "default": DEFAULT_RADIUS_MAX, "min": 0.0, "max": 50.0, "description": "Largest dot radius"},
            "edge_max_len": {"type": "number", "default": DEFAULT_EDGE_MAX_LEN, "min": 0.0, "max": 1000.0, "description": "Distance beyond which dots are not connected"},
            "edge_max_width": {"type": "number", "default": DEFAULT_EDGE_MAX_WIDTH, "min": 0.0, "max": 10.0, "description": "Width of an edge between touching dots"},
            "top_color": {"type": "string", "default": DEFAULT_TOP.to_hex(), "description": "Dot color at the top edge"},
            "bottom_color": {"type": "string", "default": DEFAULT_BOTTOM.to_hex(), "description": "Dot color at the bottom edge"},
            "background_alpha": {"type": "number", "default": DEFAULT_BACKGROUND_ALPHA, "min": 0.0, "max": 1.0, "description": "Opacity of the white wash drawn before each frame"}
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotfield_core::{AnimationLoop, FrameBudget};

    fn started(params: ConnectedDotsParams, seed: u64) -> ConnectedDots {
        let mut anim = ConnectedDots::new(params, seed).unwrap();
        anim.start();
        anim
    }

    #[test]
    fn defaults_match_reference_configuration() {
        let anim = started(ConnectedDotsParams::default(), 7);
        assert_eq!(anim.surface().width(), 400);
        assert_eq!(anim.surface().height(), 400);
        assert_eq!(anim.field().len(), 100);
        assert_eq!(anim.graph().max_width(), 1.2);
        for dot in anim.field().dots() {
            assert!((2.5..5.0).contains(&dot.radius), "radius {}", dot.radius);
            let (vx, vy) = dot.velocity().unwrap();
            assert!(vx.abs() <= 0.4 && vy.abs() <= 0.4);
        }
    }

    #[test]
    fn zero_size_is_initialization_failure() {
        let params = ConnectedDotsParams {
            width: 0,
            ..ConnectedDotsParams::default()
        };
        assert!(matches!(
            ConnectedDots::new(params, 1),
            Err(AnimationError::InitializationFailure(_))
        ));
    }

    #[test]
    fn from_json_reads_overrides() {
        let anim =
            ConnectedDots::from_json(3, &json!({"n_dots": 12, "edge_max_len": 30.0})).unwrap();
        assert_eq!(anim.params()["n_dots"], 12);
        assert_eq!(anim.params()["edge_max_len"], 30.0);
        assert_eq!(anim.params()["v_max"], 0.4);
        assert!(ConnectedDots::from_json(3, &json!({"bottom_color": "#zzzzzz"})).is_err());
    }

    #[test]
    fn every_tick_is_dirty() {
        let mut anim = started(ConnectedDotsParams::default(), 11);
        let mut lp = AnimationLoop::new(FrameBudget::new(30));
        lp.start();
        let stats = lp.run(&mut anim).unwrap();
        assert_eq!(stats.ticks, 30);
        assert_eq!(stats.rendered, 30);
    }

    #[test]
    fn update_builds_edges_within_threshold() {
        let mut anim = started(ConnectedDotsParams::default(), 5);
        anim.update().unwrap();
        let max_sq = 64.0 * 64.0;
        for edge in anim.graph().edges() {
            let (dx, dy) = (edge.x1 - edge.x0, edge.y1 - edge.y0);
            assert!(dx * dx + dy * dy <= max_sq);
            assert!((0.0..=1.2).contains(&edge.width));
        }
        // 100 dots on a 400x400 canvas are never all isolated.
        assert!(!anim.graph().edges().is_empty());
    }

    #[test]
    fn same_seed_same_frame() {
        let mut a = started(ConnectedDotsParams::default(), 99);
        let mut b = started(ConnectedDotsParams::default(), 99);
        for _ in 0..20 {
            a.update().unwrap();
            b.update().unwrap();
        }
        a.render();
        b.render();
        assert_eq!(a.surface().data(), b.surface().data());
    }

    #[test]
    fn render_draws_a_dot_in_gradient_color() {
        let params = ConnectedDotsParams {
            n_dots: 1,
            v_max: 0.0,
            ..ConnectedDotsParams::default()
        };
        let mut anim = started(params, 1);
        anim.update().unwrap();
        anim.render();
        let dot = &anim.field().dots()[0];
        let px = anim
            .surface()
            .pixel(dot.x as usize, dot.y as usize)
            .unwrap();
        assert_eq!(px, anim.field().gradient().at(dot.y).with_alpha(1.0).to_rgba8());
    }

    #[test]
    fn start_populates_a_velocity_field() {
        let mut anim = ConnectedDots::new(ConnectedDotsParams::default(), 5).unwrap();
        assert_eq!(anim.field().mode(), FieldMode::Velocity);
        assert!(anim.field().is_empty());
        anim.start();
        assert!(anim.is_running());
        assert_eq!(anim.field().len(), 100);
        assert!(anim.field().dots().iter().all(|d| d.velocity().is_some()));
    }

    #[test]
    fn restart_repopulates_and_destroy_stops() {
        let mut anim = started(ConnectedDotsParams::default(), 2);
        let first: Vec<_> = anim.field().dots().iter().map(|d| d.id()).collect();
        anim.start();
        let second: Vec<_> = anim.field().dots().iter().map(|d| d.id()).collect();
        assert_eq!(second.len(), 100);
        assert!(first.iter().all(|id| !second.contains(id)));

        anim.destroy();
        assert!(!anim.is_running());
        assert!(anim.field().is_empty());
        let mut lp = AnimationLoop::new(FrameBudget::new(3));
        lp.start();
        assert_eq!(lp.run(&mut anim).unwrap().ticks, 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn dots_stay_near_canvas(seed: u64, ticks in 1_usize..300) {
                let mut anim = started(ConnectedDotsParams::default(), seed);
                for _ in 0..ticks {
                    anim.update().unwrap();
                }
                for dot in anim.field().dots() {
                    prop_assert!(dot.x >= -0.4 && dot.x <= 400.4, "x = {}", dot.x);
                    prop_assert!(dot.y >= -0.4 && dot.y <= 400.4, "y = {}", dot.y);
                }
            }
        }
    }
}

//! The dot population and its per-tick update.
//!
//! A [`ParticleField`] runs in one of two [`FieldMode`]s:
//!
//! - `Velocity`: a fixed population created by [`ParticleField::populate`]
//!   that bounces around the canvas. Every tick is dirty.
//! - `Targets`: a population that grows on demand as
//!   [`ParticleField::retarget`] hands it shape points. A tick is dirty only
//!   if some dot moved or faded, so a settled shape stops redrawing.
//!
//! The population never shrinks. When a new shape needs fewer dots, the
//! surplus ones fade out to a resting spot near the canvas edges.

use tracing::debug;

use crate::color::{Color, VerticalGradient};
use crate::dot::{Dot, Easing};
use crate::error::AnimationError;
use crate::point::{DotTarget, Point};
use crate::random::{RandomSampler, DEFAULT_SAMPLES};

/// Draws averaged for the edge-biased resting spots of surplus dots.
const REST_SAMPLES: u32 = 2;

/// How dots in a field move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMode {
    Velocity,
    Targets,
}

/// Canvas geometry, colors and easing shared by every dot in a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldConfig {
    pub width: f64,
    pub height: f64,
    /// Dot color at `y = 0`.
    pub top: Color,
    /// Dot color at `y = height`.
    pub bottom: Color,
    pub easing: Easing,
    /// Radius given to dots created by `retarget`.
    pub dot_radius: f64,
    /// Alpha surplus dots fade to when a shape shrinks.
    pub rest_alpha: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 600.0,
            top: Color::rgba(206.0, 254.0, 66.0, 1.0),
            bottom: Color::rgba(0.0, 194.0, 255.0, 1.0),
            easing: Easing::default(),
            dot_radius: 4.0,
            rest_alpha: 0.2,
        }
    }
}

/// Counts reported by [`ParticleField::retarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetargetSummary {
    /// Dots that received a scatter target and a shape point.
    pub assigned: usize,
    /// Dots created because the population was smaller than the point list.
    pub created: usize,
    /// Surplus dots sent to a faded resting spot.
    pub resting: usize,
}

/// Owns the dots of one animation.
#[derive(Debug, Clone)]
pub struct ParticleField {
    mode: FieldMode,
    config: FieldConfig,
    gradient: VerticalGradient,
    sampler: RandomSampler,
    dots: Vec<Dot>,
    next_id: u64,
}

impl ParticleField {
    /// Creates an empty field.
    ///
    /// Returns `InvalidDimensions` unless width and height are positive and finite.
    pub fn new(mode: FieldMode, config: FieldConfig, seed: u64) -> Result<Self, AnimationError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(config.width) || !valid(config.height) {
            return Err(AnimationError::InvalidDimensions);
        }
        Ok(Self {
            mode,
            gradient: VerticalGradient::new(config.top, config.bottom, config.height),
            config,
            sampler: RandomSampler::new(seed),
            dots: Vec::new(),
            next_id: 1,
        })
    }

    pub fn mode(&self) -> FieldMode {
        self.mode
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn gradient(&self) -> &VerticalGradient {
        &self.gradient
    }

    pub fn dots(&self) -> &[Dot] {
        &self.dots
    }

    pub fn len(&self) -> usize {
        self.dots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dots.is_empty()
    }

    /// Removes every dot. Ids keep counting up, so they are never reused.
    pub fn clear(&mut self) {
        self.dots.clear();
    }

    /// Replaces the population with `count` velocity dots at uniform random
    /// positions, with speeds in `[-v_max, v_max)` per axis and radii in
    /// `radius_range`.
    pub fn populate(
        &mut self,
        count: usize,
        v_max: f64,
        radius_range: (f64, f64),
    ) -> Result<(), AnimationError> {
        if self.mode != FieldMode::Velocity {
            return Err(AnimationError::InvalidState(
                "populate needs a velocity-mode field".into(),
            ));
        }
        self.dots.clear();
        self.dots.reserve(count);
        for _ in 0..count {
            let x = self.sampler.uniform(0.0, self.config.width);
            let y = self.sampler.uniform(0.0, self.config.height);
            let vx = self.sampler.uniform(-v_max, v_max);
            let vy = self.sampler.uniform(-v_max, v_max);
            let radius = self.sampler.uniform(radius_range.0, radius_range.1);
            let id = self.allocate_id();
            let mut dot = Dot::with_velocity(id, x, y, vx, vy, radius);
            dot.color = self.gradient.at(y).with_alpha(1.0);
            self.dots.push(dot);
        }
        debug!(count, "populated velocity field");
        Ok(())
    }

    /// Queues a new shape for the population.
    ///
    /// Dot `i` gets a scatter target somewhere on the canvas followed by
    /// `points[i]`, both fully opaque, so the shape disperses before it
    /// reforms. Missing dots are spawned transparent at the canvas center.
    /// Dots beyond `points.len()` get a single faded target near the edges.
    pub fn retarget(&mut self, points: &[Point]) -> Result<RetargetSummary, AnimationError> {
        if self.mode != FieldMode::Targets {
            return Err(AnimationError::InvalidState(
                "retarget needs a target-mode field".into(),
            ));
        }
        let (w, h) = (self.config.width, self.config.height);
        let mut created = 0;
        for (i, &point) in points.iter().enumerate() {
            if i == self.dots.len() {
                let id = self.allocate_id();
                self.dots
                    .push(Dot::targeted(id, w / 2.0, h / 2.0, self.config.dot_radius));
                created += 1;
            }
            let scatter = DotTarget::new(
                self.sampler.averaged_uniform(0.0, w, DEFAULT_SAMPLES),
                self.sampler.averaged_uniform(0.0, h, DEFAULT_SAMPLES),
                1.0,
            );
            let dot = &mut self.dots[i];
            dot.enqueue(scatter)?;
            dot.enqueue(DotTarget::at(point, 1.0))?;
        }

        let resting = self.dots.len().saturating_sub(points.len());
        for i in points.len()..self.dots.len() {
            let rest = DotTarget::new(
                self.sampler.inverted_averaged_uniform(0.0, w, REST_SAMPLES),
                self.sampler.inverted_averaged_uniform(0.0, h, REST_SAMPLES),
                self.config.rest_alpha,
            );
            self.dots[i].enqueue(rest)?;
        }

        let summary = RetargetSummary {
            assigned: points.len(),
            created,
            resting,
        };
        debug!(
            assigned = summary.assigned,
            created = summary.created,
            resting = summary.resting,
            population = self.dots.len(),
            "retargeted field"
        );
        Ok(summary)
    }

    /// Advances every dot one tick and returns the dirty flag.
    ///
    /// Velocity fields are always dirty. A dot whose position becomes
    /// non-finite is reported as `InvalidState`.
    pub fn update(&mut self) -> Result<bool, AnimationError> {
        let bounds = (self.config.width, self.config.height);
        let mut dirty = false;
        for dot in &mut self.dots {
            if dot.update(bounds, &self.gradient, &self.config.easing) {
                dirty = true;
            }
            if !dot.x.is_finite() || !dot.y.is_finite() {
                return Err(AnimationError::InvalidState(format!(
                    "dot {} left finite space at ({}, {})",
                    dot.id(),
                    dot.x,
                    dot.y
                )));
            }
        }
        Ok(dirty || self.mode == FieldMode::Velocity)
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

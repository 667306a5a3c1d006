//! A single animated particle.
//!
//! Dots move in one of two mutually exclusive ways:
//!
//! - **Velocity**: constant speed, bouncing off the canvas edges.
//! - **Targeted**: easing toward one active [`DotTarget`] at a time, pulling
//!   the next one from a FIFO queue once the current one is reached.

use std::collections::VecDeque;

use crate::color::{Color, VerticalGradient};
use crate::error::AnimationError;
use crate::point::DotTarget;

/// Easing constants for targeted dots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Easing {
    /// Fraction of the remaining distance covered per tick.
    pub ease: f64,
    /// Alpha easing speed relative to `ease`.
    pub alpha_rate: f64,
    /// Distance at or below which the dot counts as arrived.
    pub arrive_threshold: f64,
    /// Alpha difference at or below which alpha snaps to the target.
    pub alpha_epsilon: f64,
}

impl Default for Easing {
    fn default() -> Self {
        Self {
            ease: 0.09,
            alpha_rate: 1.5,
            arrive_threshold: 1.2,
            alpha_epsilon: 0.01,
        }
    }
}

/// Whether a targeted dot is currently heading somewhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetState {
    Idle,
    Active(DotTarget),
}

#[derive(Debug, Clone, PartialEq)]
enum Motion {
    Velocity {
        vx: f64,
        vy: f64,
    },
    Targeted {
        state: TargetState,
        queue: VecDeque<DotTarget>,
    },
}

/// A particle with position, color and motion state.
#[derive(Debug, Clone, PartialEq)]
pub struct Dot {
    id: u64,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: Color,
    motion: Motion,
}

impl Dot {
    /// Creates a velocity-mode dot.
    pub fn with_velocity(id: u64, x: f64, y: f64, vx: f64, vy: f64, radius: f64) -> Self {
        Self {
            id,
            x,
            y,
            radius,
            color: Color::TRANSPARENT,
            motion: Motion::Velocity { vx, vy },
        }
    }

    /// Creates an idle target-mode dot with an empty queue, fully transparent.
    pub fn targeted(id: u64, x: f64, y: f64, radius: f64) -> Self {
        Self {
            id,
            x,
            y,
            radius,
            color: Color::TRANSPARENT,
            motion: Motion::Targeted {
                state: TargetState::Idle,
                queue: VecDeque::new(),
            },
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// `(vx, vy)` for velocity-mode dots.
    pub fn velocity(&self) -> Option<(f64, f64)> {
        match self.motion {
            Motion::Velocity { vx, vy } => Some((vx, vy)),
            Motion::Targeted { .. } => None,
        }
    }

    /// Target state for target-mode dots.
    pub fn target_state(&self) -> Option<TargetState> {
        match &self.motion {
            Motion::Targeted { state, .. } => Some(*state),
            Motion::Velocity { .. } => None,
        }
    }

    /// The target being eased toward, if any.
    pub fn active_target(&self) -> Option<DotTarget> {
        match self.target_state() {
            Some(TargetState::Active(t)) => Some(t),
            _ => None,
        }
    }

    /// Pending targets, oldest first. Empty for velocity-mode dots.
    pub fn queued(&self) -> impl Iterator<Item = &DotTarget> {
        let queue = match &self.motion {
            Motion::Targeted { queue, .. } => Some(queue),
            Motion::Velocity { .. } => None,
        };
        queue.into_iter().flatten()
    }

    /// Appends a target to the back of the queue.
    ///
    /// Returns `InvalidState` for velocity-mode dots.
    pub fn enqueue(&mut self, target: DotTarget) -> Result<(), AnimationError> {
        match &mut self.motion {
            Motion::Targeted { queue, .. } => {
                queue.push_back(target);
                Ok(())
            }
            Motion::Velocity { .. } => Err(AnimationError::InvalidState(format!(
                "dot {} moves by velocity and cannot take targets",
                self.id
            ))),
        }
    }

    /// Displacement `(dx, dy)` and Euclidean distance from this dot to `(x, y)`.
    pub fn distance_to(&self, x: f64, y: f64) -> (f64, f64, f64) {
        let dx = x - self.x;
        let dy = y - self.y;
        (dx, dy, (dx * dx + dy * dy).sqrt())
    }

    /// Advances one tick. Returns whether the dot changed.
    ///
    /// Velocity dots always change; targeted dots report `false` once idle.
    pub fn update(
        &mut self,
        bounds: (f64, f64),
        gradient: &VerticalGradient,
        easing: &Easing,
    ) -> bool {
        match self.motion {
            Motion::Velocity { .. } => {
                self.step_velocity(bounds);
                self.color = gradient.at(self.y).with_alpha(1.0);
                true
            }
            Motion::Targeted { .. } => self.step_targeted(gradient, easing),
        }
    }

    /// Moves by velocity, then reflects any component that carried the dot
    /// outside `[0, width]` x `[0, height]`.
    ///
    /// A component is only flipped while it still points outward, so a dot
    /// that overshot by more than one step does not jitter at the edge.
    fn step_velocity(&mut self, (width, height): (f64, f64)) {
        let Motion::Velocity { vx, vy } = &mut self.motion else {
            return;
        };
        self.x += *vx;
        self.y += *vy;
        if (self.x < 0.0 && *vx < 0.0) || (self.x > width && *vx > 0.0) {
            *vx = -*vx;
        }
        if (self.y < 0.0 && *vy < 0.0) || (self.y > height && *vy > 0.0) {
            *vy = -*vy;
        }
    }

    fn step_targeted(&mut self, gradient: &VerticalGradient, easing: &Easing) -> bool {
        let target = match &mut self.motion {
            Motion::Targeted { state, queue } => match *state {
                TargetState::Active(t) => t,
                TargetState::Idle => match queue.pop_front() {
                    Some(t) => {
                        *state = TargetState::Active(t);
                        t
                    }
                    None => return false,
                },
            },
            Motion::Velocity { .. } => return false,
        };

        let moved = self.move_towards(target, easing);
        if moved {
            let c = gradient.at(self.y);
            self.color.r = c.r;
            self.color.g = c.g;
            self.color.b = c.b;
        }
        let faded = self.fade_towards(target, easing);

        let updated = moved || faded;
        if !updated {
            if let Motion::Targeted { state, .. } = &mut self.motion {
                *state = TargetState::Idle;
            }
        }
        updated
    }

    fn move_towards(&mut self, target: DotTarget, easing: &Easing) -> bool {
        let (dx, dy, d) = self.distance_to(target.x, target.y);
        if d <= easing.arrive_threshold {
            return false;
        }
        // Covering `ease * d` along the unit direction is `ease` of each component.
        self.x += dx * easing.ease;
        self.y += dy * easing.ease;
        true
    }

    fn fade_towards(&mut self, target: DotTarget, easing: &Easing) -> bool {
        let da = target.a - self.color.a;
        if da.abs() <= easing.alpha_epsilon {
            self.color.a = target.a;
            return false;
        }
        self.color.a += da * easing.ease * easing.alpha_rate;
        true
    }
}

#![deny(unsafe_code)]
//! Core types for the dotfield particle animations.
//!
//! Provides the `Animation` trait and `AnimationLoop`, the `Dot` entity and
//! the `ParticleField` that owns a dot population, the per-frame
//! `ProximityGraph`, the RGBA8 `Surface` animations draw on, `Color` with its
//! vertical gradient, the seedable `RandomSampler`, params helpers and `Seed`.

pub mod animation;
pub mod animation_loop;
pub mod color;
pub mod dot;
pub mod error;
pub mod params;
pub mod particle_field;
pub mod point;
pub mod proximity;
pub mod random;
pub mod seed;
pub mod surface;

pub use animation::Animation;
pub use animation_loop::{
    AnimationLoop, FixedInterval, FrameBudget, FrameScheduler, LoopState, LoopStats, StopHandle,
};
pub use color::{Color, ColorDelta, VerticalGradient};
pub use dot::{Dot, Easing, TargetState};
pub use error::AnimationError;
pub use params::Params;
pub use particle_field::{FieldConfig, FieldMode, ParticleField, RetargetSummary};
pub use point::{DotTarget, Point};
pub use proximity::{Edge, EdgeGradient, ProximityGraph};
pub use random::{RandomSampler, Xorshift64};
pub use seed::Seed;
pub use surface::Surface;

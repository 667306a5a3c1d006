//! Reproducible description of an animation run.
//!
//! A [`Seed`] names an animation, its params, the PRNG seed, how many ticks
//! to run and, for shape animations, which image to sample. Two identical
//! seeds fed to the same binary render bit-identical frames.

use crate::error::AnimationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Seed {
    pub animation: String,
    #[serde(default = "empty_object")]
    pub params: Value,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub ticks: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl Seed {
    /// A seed with empty params, zero ticks and no image.
    pub fn new(animation: &str, seed: u64) -> Self {
        Self {
            animation: animation.to_string(),
            params: empty_object(),
            seed,
            ticks: 0,
            image: None,
        }
    }

    /// Checks the animation name is present and params is a JSON object.
    pub fn validate(&self) -> Result<(), AnimationError> {
        if self.animation.trim().is_empty() {
            return Err(AnimationError::UnknownAnimation(self.animation.clone()));
        }
        if !self.params.is_object() {
            return Err(AnimationError::InvalidParams(format!(
                "params for '{}' must be a JSON object",
                self.animation
            )));
        }
        Ok(())
    }
}

//! Typed reads from a JSON parameter object.
//!
//! Missing keys and values of the wrong JSON type fall back to the caller's
//! default, so a partially filled params object always yields a usable
//! configuration. Colors are the exception: a present but malformed color
//! string is reported instead of silently replaced.

use serde_json::Value;

use crate::color::Color;
use crate::error::AnimationError;

/// Read-only view over an animation's JSON params.
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    value: &'a Value,
}

impl<'a> Params<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    /// Any JSON number, integers included.
    pub fn f64(&self, name: &str, default: f64) -> f64 {
        self.value
            .get(name)
            .and_then(Value::as_f64)
            .unwrap_or(default)
    }

    /// A non-negative JSON integer.
    pub fn usize(&self, name: &str, default: usize) -> usize {
        self.value
            .get(name)
            .and_then(Value::as_u64)
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(default)
    }

    pub fn u64(&self, name: &str, default: u64) -> u64 {
        self.value
            .get(name)
            .and_then(Value::as_u64)
            .unwrap_or(default)
    }

    pub fn string(&self, name: &str) -> Option<&'a str> {
        self.value.get(name).and_then(Value::as_str)
    }

    /// A `"#rrggbb"` string. Non-string values fall back to `default`.
    pub fn color(&self, name: &str, default: Color) -> Result<Color, AnimationError> {
        match self.string(name) {
            Some(hex) => Color::from_hex(hex),
            None => Ok(default),
        }
    }
}

//! Core value types shared by the engines.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Magnitude beyond which an orbit is considered to have escaped.
pub const DIVERGENCE_THRESHOLD: f64 = 1e10;

/// A point of a planar map's state space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct State2 {
    pub x: f64,
    pub y: f64,
}

impl State2 {
    pub const ORIGIN: State2 = State2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True once either coordinate exceeds the divergence threshold or stops
    /// being a number. Escape is terminal for the orbit that produced it.
    pub fn is_escaped(&self) -> bool {
        !(self.x.abs() <= DIVERGENCE_THRESHOLD && self.y.abs() <= DIVERGENCE_THRESHOLD)
    }

    /// Coordinate-wise absolute comparison.
    pub fn within(&self, other: &State2, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

impl From<(f64, f64)> for State2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Named map parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSet(BTreeMap<String, f64>);

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Lookup for step functions. A missing parameter reads as NaN, which
    /// surfaces as an escaped orbit rather than a panic.
    pub fn value(&self, name: &str) -> f64 {
        self.get(name).unwrap_or(f64::NAN)
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.0.insert(name.to_string(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Copies every entry of `overrides` over this set.
    pub fn merge(&mut self, overrides: &ParamSet) {
        for (name, value) in &overrides.0 {
            self.0.insert(name.clone(), *value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

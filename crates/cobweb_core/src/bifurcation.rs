//! Parameter sweeps for bifurcation diagrams.
//!
//! For every swept parameter value the map is iterated a fixed number of times
//! from one initial condition. Escaped trajectories are dropped whole. The
//! rest contribute their tail (one detected cycle, or a bounded window) to the
//! plot, and the first parameter value at which each power-of-two period is
//! seen is recorded as that period's onset.

use crate::error::ConfigError;
use crate::periodicity::{
    power_of_two_period, DEFAULT_SEARCH_DEPTH, MAX_SEARCH_DEPTH, SWEEP_PERIOD_TOLERANCE,
};
use crate::registry::MapDefinition;
use crate::traits::PlanarMap;
use crate::types::{ParamSet, State2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Points emitted for a parameter value with no detected period.
pub const PLOT_TAIL_CAP: usize = 256;
/// Upper bound on `samples * iterations` for a single sweep.
pub const MAX_SWEEP_WORK: usize = 50_000_000;

// Absorbs rounding in (max - min) / step so that max itself is swept.
const RANGE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BifurcationSettings {
    pub sweep_param: String,
    pub param_min: f64,
    pub param_max: f64,
    pub d_param: f64,
    /// Trajectory length `N` per parameter value.
    pub iterations: usize,
    pub initial_condition: State2,
    pub period_search_depth: u32,
    pub plot_y_min: f64,
    pub plot_y_max: f64,
}

impl Default for BifurcationSettings {
    fn default() -> Self {
        Self {
            sweep_param: "a".to_string(),
            param_min: 0.0,
            param_max: 1.4,
            d_param: 0.002,
            iterations: 1000,
            initial_condition: State2::ORIGIN,
            period_search_depth: DEFAULT_SEARCH_DEPTH,
            plot_y_min: -1.5,
            plot_y_max: 1.5,
        }
    }
}

impl BifurcationSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("param_min", self.param_min),
            ("param_max", self.param_max),
            ("d_param", self.d_param),
            ("initial_condition.x", self.initial_condition.x),
            ("initial_condition.y", self.initial_condition.y),
            ("plot_y_min", self.plot_y_min),
            ("plot_y_max", self.plot_y_max),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteSetting(name));
            }
        }
        if self.d_param <= 0.0 {
            return Err(ConfigError::NonPositiveStep(self.d_param));
        }
        if self.param_min > self.param_max {
            return Err(ConfigError::InvertedRange {
                min: self.param_min,
                max: self.param_max,
            });
        }
        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if self.period_search_depth > MAX_SEARCH_DEPTH {
            return Err(ConfigError::SearchDepthTooLarge {
                depth: self.period_search_depth,
                max: MAX_SEARCH_DEPTH,
            });
        }
        let samples = self.sample_count();
        if samples.saturating_mul(self.iterations) > MAX_SWEEP_WORK {
            return Err(ConfigError::SweepTooLarge {
                samples,
                iterations: self.iterations,
                limit: MAX_SWEEP_WORK,
            });
        }
        Ok(())
    }

    /// Number of swept values, `param_min` and `param_max` inclusive.
    pub fn sample_count(&self) -> usize {
        let spans = ((self.param_max - self.param_min) / self.d_param + RANGE_EPSILON).floor();
        if spans.is_finite() && spans >= 0.0 {
            (spans as usize).saturating_add(1)
        } else {
            usize::MAX
        }
    }

    /// The `k`-th swept value. Computed from the index so that long sweeps do
    /// not accumulate rounding.
    pub fn param_value(&self, k: usize) -> f64 {
        (self.param_min + k as f64 * self.d_param).min(self.param_max)
    }
}

/// Partial settings for [`BifurcationSweep::update`]. Absent fields keep
/// their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BifurcationUpdate {
    pub sweep_param: Option<String>,
    pub param_min: Option<f64>,
    pub param_max: Option<f64>,
    pub d_param: Option<f64>,
    pub iterations: Option<usize>,
    pub initial_condition: Option<State2>,
    pub period_search_depth: Option<u32>,
    pub plot_y_min: Option<f64>,
    pub plot_y_max: Option<f64>,
    /// Overrides merged into the fixed map parameters.
    pub params: Option<ParamSet>,
}

impl BifurcationUpdate {
    /// Writes the present fields over `settings` and merges `params`.
    pub fn apply_to(&self, settings: &mut BifurcationSettings, params: &mut ParamSet) {
        if let Some(name) = &self.sweep_param {
            settings.sweep_param = name.clone();
        }
        macro_rules! take {
            ($($field:ident),*) => {
                $(if let Some(value) = self.$field {
                    settings.$field = value;
                })*
            };
        }
        take!(
            param_min,
            param_max,
            d_param,
            iterations,
            initial_condition,
            period_search_depth,
            plot_y_min,
            plot_y_max
        );
        if let Some(overrides) = &self.params {
            params.merge(overrides);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BifurcationPoint {
    pub param: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BifurcationDiagram {
    pub points: Vec<BifurcationPoint>,
    /// Detected period -> first swept value at which it appeared.
    pub period_doublings: BTreeMap<usize, f64>,
    /// Swept values whose trajectory escaped and was dropped.
    pub diverged: usize,
    pub samples: usize,
}

impl BifurcationDiagram {
    /// Points as `[a0, x0, y0, a1, x1, y1, ...]`.
    pub fn flat_points(&self) -> Vec<f64> {
        let mut flat = Vec::with_capacity(self.points.len() * 3);
        for point in &self.points {
            flat.extend_from_slice(&[point.param, point.x, point.y]);
        }
        flat
    }
}

/// Runs one sweep from scratch.
pub fn run_bifurcation_sweep<M: PlanarMap + ?Sized>(
    map: &M,
    params: &ParamSet,
    settings: &BifurcationSettings,
) -> Result<BifurcationDiagram, ConfigError> {
    settings.validate()?;

    let samples = settings.sample_count();
    let n = settings.iterations;
    let mut swept = params.clone();
    let mut trajectory = Vec::with_capacity(n + 1);
    let mut diagram = BifurcationDiagram {
        samples,
        ..BifurcationDiagram::default()
    };

    for k in 0..samples {
        let a = settings.param_value(k);
        swept.set(&settings.sweep_param, a);

        if !fill_trajectory(map, &swept, settings.initial_condition, n, &mut trajectory) {
            diagram.diverged += 1;
            continue;
        }

        let period = power_of_two_period(
            &trajectory,
            settings.period_search_depth,
            SWEEP_PERIOD_TOLERANCE,
        );
        if let Some(p) = period {
            diagram.period_doublings.entry(p).or_insert(a);
        }

        let tail = period.unwrap_or_else(|| PLOT_TAIL_CAP.min(n));
        let start = trajectory.len() - tail;
        diagram
            .points
            .extend(trajectory[start..].iter().map(|s| BifurcationPoint {
                param: a,
                x: s.x,
                y: s.y,
            }));
    }

    debug!(
        sweep_param = %settings.sweep_param,
        samples,
        diverged = diagram.diverged,
        points = diagram.points.len(),
        periods = ?diagram.period_doublings.keys().collect::<Vec<_>>(),
        "bifurcation sweep complete"
    );

    Ok(diagram)
}

/// Iterates `n` times into `out` (length `n + 1` on success). Returns false as
/// soon as the orbit escapes.
fn fill_trajectory<M: PlanarMap + ?Sized>(
    map: &M,
    params: &ParamSet,
    initial: State2,
    n: usize,
    out: &mut Vec<State2>,
) -> bool {
    out.clear();
    if initial.is_escaped() {
        return false;
    }
    out.push(initial);
    let mut state = initial;
    for _ in 0..n {
        state = map.step(state, params);
        if state.is_escaped() {
            return false;
        }
        out.push(state);
    }
    true
}

/// A sweep that owns its configuration and last result, recomputed in place
/// by [`update`](Self::update).
#[derive(Debug)]
pub struct BifurcationSweep<M: PlanarMap> {
    map: M,
    params: ParamSet,
    settings: BifurcationSettings,
    diagram: BifurcationDiagram,
}

impl<M: PlanarMap> BifurcationSweep<M> {
    pub fn new(
        map: M,
        params: ParamSet,
        settings: BifurcationSettings,
    ) -> Result<Self, ConfigError> {
        let diagram = run_bifurcation_sweep(&map, &params, &settings)?;
        Ok(Self {
            map,
            params,
            settings,
            diagram,
        })
    }

    /// Merges `update`, validates, and recomputes. A rejected update leaves
    /// the previous configuration and diagram untouched.
    pub fn update(&mut self, update: &BifurcationUpdate) -> Result<&BifurcationDiagram, ConfigError> {
        let mut settings = self.settings.clone();
        let mut params = self.params.clone();
        update.apply_to(&mut settings, &mut params);

        match run_bifurcation_sweep(&self.map, &params, &settings) {
            Ok(diagram) => {
                self.settings = settings;
                self.params = params;
                self.diagram = diagram;
                Ok(&self.diagram)
            }
            Err(err) => {
                warn!(error = %err, "rejected bifurcation update");
                Err(err)
            }
        }
    }

    pub fn diagram(&self) -> &BifurcationDiagram {
        &self.diagram
    }

    pub fn settings(&self) -> &BifurcationSettings {
        &self.settings
    }

    pub fn params(&self) -> &ParamSet {
        &self.params
    }

    pub fn map(&self) -> &M {
        &self.map
    }
}

impl<'a> BifurcationSweep<&'a MapDefinition> {
    /// A sweep over a registered map using its parameter and sweep defaults.
    pub fn with_defaults(definition: &'a MapDefinition) -> Result<Self, ConfigError> {
        Self::new(
            definition,
            definition.default_params.clone(),
            definition.bifurcation_settings(),
        )
    }
}

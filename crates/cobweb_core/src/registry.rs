//! Built-in map definitions.
//!
//! Definitions are created once, on first access, and stay read-only for the
//! life of the process, so any number of views may share them.

use crate::bifurcation::BifurcationSettings;
use crate::error::ConfigError;
use crate::iteration::IterationSettings;
use crate::periodicity::DEFAULT_SEARCH_DEPTH;
use crate::traits::PlanarMap;
use crate::types::{ParamSet, State2};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub type StepFn = fn(State2, &ParamSet) -> State2;

/// Display rectangle for a map's state space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BifurcationDefaults {
    pub param_min: f64,
    pub param_max: f64,
    pub d_param: f64,
    pub iterations: usize,
    pub initial_condition: State2,
    pub plot_y_min: f64,
    pub plot_y_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationDefaults {
    pub iterates: usize,
    pub lag: usize,
    pub speed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapDefinition {
    pub name: String,
    pub label: String,
    #[serde(skip)]
    pub step: StepFn,
    pub default_params: ParamSet,
    pub bifurcation_param: String,
    pub bounds: Bounds,
    pub bifurcation_defaults: BifurcationDefaults,
    pub iteration_defaults: IterationDefaults,
}

impl MapDefinition {
    pub fn bifurcation_settings(&self) -> BifurcationSettings {
        let d = &self.bifurcation_defaults;
        BifurcationSettings {
            sweep_param: self.bifurcation_param.clone(),
            param_min: d.param_min,
            param_max: d.param_max,
            d_param: d.d_param,
            iterations: d.iterations,
            initial_condition: d.initial_condition,
            period_search_depth: DEFAULT_SEARCH_DEPTH,
            plot_y_min: d.plot_y_min,
            plot_y_max: d.plot_y_max,
        }
    }

    pub fn iteration_settings(&self) -> IterationSettings {
        let d = &self.iteration_defaults;
        IterationSettings {
            iterates: d.iterates,
            lag: d.lag,
            speed: d.speed,
            ..IterationSettings::default()
        }
    }

    /// Fails with [`ConfigError::UnknownParameter`] unless the map declares `name`.
    pub fn check_param(&self, name: &str) -> Result<(), ConfigError> {
        if self.default_params.contains(name) {
            Ok(())
        } else {
            Err(ConfigError::UnknownParameter {
                map: self.name.clone(),
                parameter: name.to_string(),
            })
        }
    }

    /// `base` with `overrides` applied. Names the map does not declare are
    /// rejected and `base` is left as it was.
    pub fn merge_params(&self, base: &ParamSet, overrides: &ParamSet) -> Result<ParamSet, ConfigError> {
        for (name, _) in overrides.iter() {
            self.check_param(name)?;
        }
        let mut params = base.clone();
        params.merge(overrides);
        Ok(params)
    }

    /// Default parameters with `overrides` applied.
    pub fn resolve_params(&self, overrides: &ParamSet) -> Result<ParamSet, ConfigError> {
        self.merge_params(&self.default_params, overrides)
    }
}

impl PlanarMap for MapDefinition {
    fn step(&self, state: State2, params: &ParamSet) -> State2 {
        (self.step)(state, params)
    }
}

fn henon_step(s: State2, p: &ParamSet) -> State2 {
    let a = p.value("a");
    let b = p.value("b");
    State2::new(1.0 - a * s.x * s.x + s.y, b * s.x)
}

fn lozi_step(s: State2, p: &ParamSet) -> State2 {
    let a = p.value("a");
    let b = p.value("b");
    State2::new(1.0 - a * s.x.abs() + s.y, b * s.x)
}

// Delay embedding: y carries the previous x.
fn logistic_step(s: State2, p: &ParamSet) -> State2 {
    let r = p.value("r");
    State2::new(r * s.x * (1.0 - s.x), s.x)
}

fn build_registry() -> Vec<MapDefinition> {
    vec![
        MapDefinition {
            name: "henon".to_string(),
            label: "Hénon map".to_string(),
            step: henon_step,
            default_params: ParamSet::from_pairs(&[("a", 1.4), ("b", 0.3)]),
            bifurcation_param: "a".to_string(),
            bounds: Bounds {
                x_min: -1.5,
                x_max: 1.5,
                y_min: -0.5,
                y_max: 0.5,
            },
            bifurcation_defaults: BifurcationDefaults {
                param_min: 0.0,
                param_max: 1.4,
                d_param: 0.002,
                iterations: 1000,
                initial_condition: State2::ORIGIN,
                plot_y_min: -1.5,
                plot_y_max: 1.5,
            },
            iteration_defaults: IterationDefaults {
                iterates: 10_000,
                lag: 50,
                speed: 10,
            },
        },
        MapDefinition {
            name: "lozi".to_string(),
            label: "Lozi map".to_string(),
            step: lozi_step,
            default_params: ParamSet::from_pairs(&[("a", 1.7), ("b", 0.5)]),
            bifurcation_param: "a".to_string(),
            bounds: Bounds {
                x_min: -1.5,
                x_max: 1.5,
                y_min: -0.75,
                y_max: 0.75,
            },
            bifurcation_defaults: BifurcationDefaults {
                param_min: 1.0,
                param_max: 1.8,
                d_param: 0.002,
                iterations: 1000,
                initial_condition: State2::ORIGIN,
                plot_y_min: -1.5,
                plot_y_max: 1.5,
            },
            iteration_defaults: IterationDefaults {
                iterates: 10_000,
                lag: 50,
                speed: 10,
            },
        },
        MapDefinition {
            name: "logistic".to_string(),
            label: "Logistic map (delay embedding)".to_string(),
            step: logistic_step,
            default_params: ParamSet::from_pairs(&[("r", 3.7)]),
            bifurcation_param: "r".to_string(),
            bounds: Bounds {
                x_min: 0.0,
                x_max: 1.0,
                y_min: 0.0,
                y_max: 1.0,
            },
            bifurcation_defaults: BifurcationDefaults {
                param_min: 2.5,
                param_max: 4.0,
                d_param: 0.002,
                iterations: 1000,
                initial_condition: State2::new(0.5, 0.5),
                plot_y_min: 0.0,
                plot_y_max: 1.0,
            },
            iteration_defaults: IterationDefaults {
                iterates: 5_000,
                lag: 30,
                speed: 5,
            },
        },
    ]
}

/// All built-in maps, in display order.
pub fn builtin_maps() -> &'static [MapDefinition] {
    static REGISTRY: OnceLock<Vec<MapDefinition>> = OnceLock::new();
    REGISTRY.get_or_init(build_registry)
}

pub fn find_map(name: &str) -> Result<&'static MapDefinition, ConfigError> {
    builtin_maps()
        .iter()
        .find(|definition| definition.name == name)
        .ok_or_else(|| ConfigError::UnknownMap(name.to_string()))
}

pub fn map_names() -> Vec<&'static str> {
    builtin_maps().iter().map(|d| d.name.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_builtin_maps() {
        assert_eq!(map_names(), vec!["henon", "lozi", "logistic"]);
    }

    #[test]
    fn registry_is_created_once() {
        let first = builtin_maps().as_ptr();
        let second = builtin_maps().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn find_map_rejects_unknown_names() {
        assert!(matches!(find_map("tent"), Err(ConfigError::UnknownMap(name)) if name == "tent"));
    }

    #[test]
    fn henon_step_matches_definition() {
        let henon = find_map("henon").expect("henon registered");
        let next = henon.step(State2::new(0.5, 0.1), &henon.default_params);
        assert!((next.x - (1.0 - 1.4 * 0.25 + 0.1)).abs() < 1e-15);
        assert!((next.y - 0.15).abs() < 1e-15);
    }

    #[test]
    fn every_default_configuration_is_valid() {
        for definition in builtin_maps() {
            definition
                .bifurcation_settings()
                .validate()
                .unwrap_or_else(|e| panic!("{}: {e}", definition.name));
            definition
                .iteration_settings()
                .validate()
                .unwrap_or_else(|e| panic!("{}: {e}", definition.name));
            assert!(definition.default_params.contains(&definition.bifurcation_param));
        }
    }

    #[test]
    fn resolve_params_merges_known_and_rejects_unknown() {
        let henon = find_map("henon").expect("henon registered");
        let params = henon
            .resolve_params(&ParamSet::from_pairs(&[("b", -0.4)]))
            .expect("known parameter");
        assert_eq!(params.get("a"), Some(1.4));
        assert_eq!(params.get("b"), Some(-0.4));

        let err = henon
            .resolve_params(&ParamSet::from_pairs(&[("r", 3.0)]))
            .expect_err("unknown parameter");
        assert_eq!(err.to_string(), "unknown parameter `r` for map `henon`");
    }

    #[test]
    fn check_param_accepts_declared_names_only() {
        let logistic = find_map("logistic").expect("logistic registered");
        assert!(logistic.check_param("r").is_ok());
        assert!(matches!(
            logistic.check_param("a"),
            Err(ConfigError::UnknownParameter { parameter, .. }) if parameter == "a"
        ));
    }

    #[test]
    fn merge_params_layers_over_the_given_base() {
        let henon = find_map("henon").expect("henon registered");
        let base = ParamSet::from_pairs(&[("a", 1.0), ("b", 0.2)]);
        let merged = henon
            .merge_params(&base, &ParamSet::from_pairs(&[("b", 0.3)]))
            .expect("known parameter");
        assert_eq!(merged.get("a"), Some(1.0));
        assert_eq!(merged.get("b"), Some(0.3));
        assert!(henon
            .merge_params(&base, &ParamSet::from_pairs(&[("c", 0.0)]))
            .is_err());
    }
}

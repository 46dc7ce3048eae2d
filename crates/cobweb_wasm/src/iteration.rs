use anyhow::{Context, Result};
use cobweb_core::iteration::{AdvanceOutcome, IterationEngine, IterationSettings};
use cobweb_core::registry::{find_map, MapDefinition};
use cobweb_core::ParamSet;
use js_sys::Function;
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use tracing::warn;
use wasm_bindgen::prelude::*;

use crate::js_error;

/// Partial live-iteration settings from the UI.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct IterationOverrides {
    iterates: Option<usize>,
    lag: Option<usize>,
    speed: Option<usize>,
    transient: Option<usize>,
    period_cap: Option<usize>,
    period_tolerance: Option<f64>,
    params: Option<ParamSet>,
}

impl IterationOverrides {
    fn apply_to(&self, settings: &mut IterationSettings) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if let Some(value) = self.$field {
                    settings.$field = value;
                })*
            };
        }
        take!(iterates, lag, speed, transient, period_cap, period_tolerance);
    }
}

#[wasm_bindgen]
pub struct WasmIterationRunner {
    engine: IterationEngine<&'static MapDefinition>,
}

#[wasm_bindgen]
impl WasmIterationRunner {
    #[wasm_bindgen(constructor)]
    pub fn new(map_name: &str, overrides: JsValue) -> Result<WasmIterationRunner, JsValue> {
        console_error_panic_hook::set_once();

        let overrides = parse_overrides(overrides)?;
        let engine = build_engine(map_name, &overrides).map_err(js_error)?;
        Ok(WasmIterationRunner { engine })
    }

    /// Starts a run from a clicked point.
    pub fn seed(&mut self, x0: f64, y0: f64) {
        self.engine.seed(x0, y0);
    }

    /// One animation tick. Returns `idle`, `advanced`, `diverged` or `completed`.
    pub fn advance(&mut self) -> String {
        outcome_label(self.engine.advance()).to_string()
    }

    pub fn pause(&mut self) {
        self.engine.pause();
    }

    pub fn resume(&mut self, run_immediately: bool) -> String {
        outcome_label(self.engine.resume(run_immediately)).to_string()
    }

    pub fn reset(&mut self) {
        self.engine.reset();
    }

    /// Scrubs to `step`; `undefined` returns to the live state.
    pub fn set_playback_step(&mut self, step: Option<u32>) {
        self.engine.set_playback_step(step.map(|s| s as usize));
    }

    pub fn set_params(&mut self, params: JsValue) -> Result<(), JsValue> {
        let overrides: ParamSet = from_value(params)
            .map_err(|e| JsValue::from_str(&format!("Invalid parameters: {}", e)))?;
        apply_params(&mut self.engine, &overrides).map_err(js_error)
    }

    pub fn set_settings(&mut self, settings: JsValue) -> Result<(), JsValue> {
        let overrides = parse_overrides(settings)?;
        apply_overrides(&mut self.engine, &overrides).map_err(js_error)
    }

    pub fn get_state(&self) -> Result<JsValue, JsValue> {
        to_value(&self.engine.snapshot())
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize state: {}", e)))
    }

    /// Registers `callback(snapshot)`; returns an id for `remove_listener`.
    ///
    /// Listeners run while the runner is borrowed, so they must read the
    /// snapshot argument and must not call back into the runner. A failing
    /// listener is logged and does not interrupt the run.
    pub fn on_state_change(&mut self, callback: Function) -> usize {
        self.engine.on_state_change(move |snapshot| {
            let value = match to_value(snapshot) {
                Ok(value) => value,
                Err(err) => {
                    warn!(error = %err, "failed to serialize state for listener");
                    return;
                }
            };
            if let Err(err) = callback.call1(&JsValue::NULL, &value) {
                warn!(error = ?err, step = snapshot.step, "state listener threw");
            }
        })
    }

    pub fn remove_listener(&mut self, id: usize) -> bool {
        self.engine.remove_listener(id)
    }
}

fn parse_overrides(value: JsValue) -> Result<IterationOverrides, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(IterationOverrides::default());
    }
    from_value(value).map_err(|e| JsValue::from_str(&format!("Invalid iteration settings: {}", e)))
}

fn outcome_label(outcome: AdvanceOutcome) -> &'static str {
    match outcome {
        AdvanceOutcome::Idle => "idle",
        AdvanceOutcome::Advanced(_) => "advanced",
        AdvanceOutcome::Diverged => "diverged",
        AdvanceOutcome::Completed => "completed",
    }
}

fn build_engine(
    map_name: &str,
    overrides: &IterationOverrides,
) -> Result<IterationEngine<&'static MapDefinition>> {
    let definition = find_map(map_name).context("Failed to create iteration runner")?;
    let params = match &overrides.params {
        Some(params) => definition.resolve_params(params)?,
        None => definition.default_params.clone(),
    };
    let mut settings = definition.iteration_settings();
    overrides.apply_to(&mut settings);

    IterationEngine::new(definition, params, settings)
        .with_context(|| format!("Failed to configure live iteration for `{}`", definition.name))
}

fn apply_params(
    engine: &mut IterationEngine<&'static MapDefinition>,
    overrides: &ParamSet,
) -> Result<()> {
    let params = engine.map().merge_params(engine.params(), overrides)?;
    engine.set_params(params);
    Ok(())
}

fn apply_overrides(
    engine: &mut IterationEngine<&'static MapDefinition>,
    overrides: &IterationOverrides,
) -> Result<()> {
    let mut settings = engine.settings().clone();
    overrides.apply_to(&mut settings);
    settings
        .validate()
        .context("Failed to update iteration settings")?;
    if let Some(params) = &overrides.params {
        apply_params(engine, params)?;
    }
    engine.set_settings(settings)?;
    Ok(())
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn runner_ticks_and_reports_state() {
        let mut runner = WasmIterationRunner::new("henon", JsValue::UNDEFINED).unwrap();
        assert_eq!(runner.advance(), "idle");
        runner.seed(0.0, 0.0);
        assert_eq!(runner.advance(), "advanced");
        assert!(runner.get_state().is_ok());
    }

    #[wasm_bindgen_test]
    fn listener_receives_snapshots() {
        let mut runner = WasmIterationRunner::new("logistic", JsValue::UNDEFINED).unwrap();
        let seen = js_sys::Array::new();
        let callback = Function::new_with_args("s", "this.push(s);").bind(&seen);
        let id = runner.on_state_change(callback);
        runner.seed(0.5, 0.5);
        assert_eq!(seen.length(), 1);
        assert!(runner.remove_listener(id));
    }

    #[wasm_bindgen_test]
    fn throwing_listener_does_not_interrupt_the_run() {
        let mut runner = WasmIterationRunner::new("henon", JsValue::UNDEFINED).unwrap();
        runner.on_state_change(Function::new_with_args("s", "throw new Error('listener');"));
        runner.seed(0.0, 0.0);
        assert_eq!(runner.advance(), "advanced");
        assert!(runner.get_state().is_ok());
    }
}

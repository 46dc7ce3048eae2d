use anyhow::{Context, Result};
use cobweb_core::bifurcation::{BifurcationSweep, BifurcationUpdate};
use cobweb_core::registry::{find_map, MapDefinition};
use js_sys::Float64Array;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

use crate::js_error;

#[wasm_bindgen]
pub struct WasmBifurcationSweep {
    sweep: BifurcationSweep<&'static MapDefinition>,
}

#[wasm_bindgen]
impl WasmBifurcationSweep {
    /// `overrides` is a partial settings object (with an optional `params`
    /// field); omit it to sweep with the map's defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(map_name: &str, overrides: JsValue) -> Result<WasmBifurcationSweep, JsValue> {
        console_error_panic_hook::set_once();

        let update = parse_update(overrides)?;
        let sweep = build_sweep(map_name, &update).map_err(js_error)?;
        Ok(WasmBifurcationSweep { sweep })
    }

    /// Merges a partial update and recomputes. On error the previous
    /// diagram is kept.
    pub fn update(&mut self, partial: JsValue) -> Result<(), JsValue> {
        let update = parse_update(partial)?;
        apply_update(&mut self.sweep, &update).map_err(js_error)
    }

    /// Flat `[param, x, y, ...]` triples.
    pub fn points(&self) -> Float64Array {
        Float64Array::from(self.sweep.diagram().flat_points().as_slice())
    }

    /// `Map<period, onset parameter>` for periods 1, 2, 4, ...
    pub fn period_doublings(&self) -> Result<JsValue, JsValue> {
        to_value(&self.sweep.diagram().period_doublings)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize onsets: {}", e)))
    }

    pub fn diagram(&self) -> Result<JsValue, JsValue> {
        to_value(self.sweep.diagram())
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize diagram: {}", e)))
    }

    pub fn settings(&self) -> Result<JsValue, JsValue> {
        to_value(self.sweep.settings())
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize settings: {}", e)))
    }

    pub fn diverged_count(&self) -> usize {
        self.sweep.diagram().diverged
    }
}

fn parse_update(value: JsValue) -> Result<BifurcationUpdate, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(BifurcationUpdate::default());
    }
    from_value(value).map_err(|e| JsValue::from_str(&format!("Invalid bifurcation settings: {}", e)))
}

fn build_sweep(
    map_name: &str,
    update: &BifurcationUpdate,
) -> Result<BifurcationSweep<&'static MapDefinition>> {
    let definition = find_map(map_name).context("Failed to create bifurcation sweep")?;
    check_names(definition, update, &definition.bifurcation_param)?;

    let mut params = definition.default_params.clone();
    let mut settings = definition.bifurcation_settings();
    update.apply_to(&mut settings, &mut params);

    BifurcationSweep::new(definition, params, settings)
        .with_context(|| format!("Failed to sweep `{}`", definition.name))
}

fn apply_update(
    sweep: &mut BifurcationSweep<&'static MapDefinition>,
    update: &BifurcationUpdate,
) -> Result<()> {
    let current = sweep.settings().sweep_param.clone();
    check_names(sweep.map(), update, &current)?;
    sweep
        .update(update)
        .context("Failed to update bifurcation sweep")?;
    Ok(())
}

/// Rejects parameter overrides and a swept parameter the map does not declare.
fn check_names(
    definition: &MapDefinition,
    update: &BifurcationUpdate,
    current_sweep_param: &str,
) -> Result<()> {
    if let Some(overrides) = &update.params {
        for (name, _) in overrides.iter() {
            definition.check_param(name)?;
        }
    }
    let sweep_param = update.sweep_param.as_deref().unwrap_or(current_sweep_param);
    definition
        .check_param(sweep_param)
        .context("Invalid swept parameter")?;
    Ok(())
}

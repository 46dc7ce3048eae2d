use anyhow::Context;
use cobweb_core::registry::{builtin_maps, find_map};
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

use crate::js_error;

/// Every registered map with its defaults, for populating the map picker.
#[wasm_bindgen]
pub fn list_maps() -> Result<JsValue, JsValue> {
    to_value(builtin_maps()).map_err(|e| JsValue::from_str(&format!("Failed to serialize maps: {}", e)))
}

#[wasm_bindgen]
pub fn map_definition(name: &str) -> Result<JsValue, JsValue> {
    let definition = find_map(name)
        .context("Failed to look up map")
        .map_err(js_error)?;
    to_value(definition).map_err(|e| JsValue::from_str(&format!("Failed to serialize map: {}", e)))
}

//! WASM bindings for the cobweb core library.
//!
//! Exposes the path builders, the bifurcation sweep, and the live iteration
//! runner to the browser UI. Numeric failures come back as data; only
//! configuration problems are thrown.

use wasm_bindgen::prelude::*;

mod bifurcation;
mod function;
mod iteration;
mod path;
mod registry;

pub use bifurcation::WasmBifurcationSweep;
pub use iteration::WasmIterationRunner;
pub use path::{
    compute_cobweb_path, compute_curve_sample, compute_orbit, conjugate_curve,
    invert_numerically, transport_orbit,
};
pub use registry::{list_maps, map_definition};

/// Installs the panic hook. Safe to call any number of times.
#[wasm_bindgen]
pub fn init() {
    console_error_panic_hook::set_once();
}

pub(crate) fn js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}

#[cfg(test)]
mod tests {
    use super::{WasmBifurcationSweep, WasmIterationRunner};

    #[test]
    fn bridge_reexports_are_wired() {
        assert!(std::any::type_name::<WasmBifurcationSweep>().ends_with("WasmBifurcationSweep"));
        assert!(std::any::type_name::<WasmIterationRunner>().ends_with("WasmIterationRunner"));
    }
}

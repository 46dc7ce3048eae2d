use crate::function::JsScalarFunction;
use cobweb_core::conjugacy::{
    conjugate_curve as core_conjugate_curve, transport_orbit as core_transport_orbit,
};
use cobweb_core::path::{
    cobweb_path, invert_numerically as core_invert, orbit, sample_curve, DEFAULT_CURVE_SAMPLES,
};
use js_sys::{Float64Array, Function};
use wasm_bindgen::prelude::*;

/// Forward orbit of `f` from `x0`. Shorter than `steps + 1` when it escapes.
#[wasm_bindgen]
pub fn compute_orbit(f: Option<Function>, x0: f64, steps: u32) -> Float64Array {
    let f = JsScalarFunction::new(f);
    Float64Array::from(orbit(&f, x0, steps as usize).as_slice())
}

/// Flat `[x, y, x, y, ...]` stair-step vertices.
#[wasm_bindgen]
pub fn compute_cobweb_path(f: Option<Function>, x0: f64, n: u32) -> Float64Array {
    let f = JsScalarFunction::new(f);
    Float64Array::from(cobweb_path(&f, x0, n as usize).as_slice())
}

/// Flat `[x, f(x), ...]` samples; failed samples come back as NaN.
#[wasm_bindgen]
pub fn compute_curve_sample(
    f: Option<Function>,
    x_min: f64,
    x_max: f64,
    n: Option<u32>,
) -> Float64Array {
    let f = JsScalarFunction::new(f);
    let n = curve_samples(n);
    Float64Array::from(sample_curve(&f, x_min, x_max, n).as_slice())
}

/// `undefined` when the target is not bracketed on `[x_min, x_max]`.
#[wasm_bindgen]
pub fn invert_numerically(f: Option<Function>, y: f64, x_min: f64, x_max: f64) -> Option<f64> {
    let f = JsScalarFunction::new(f);
    core_invert(&f, y, x_min, x_max)
}

/// Samples `h ∘ f ∘ h⁻¹` over the image of `[domain_min, domain_max]` under `h`.
#[wasm_bindgen]
pub fn conjugate_curve(
    f: Option<Function>,
    h: Option<Function>,
    domain_min: f64,
    domain_max: f64,
    n: Option<u32>,
) -> Float64Array {
    let f = JsScalarFunction::new(f);
    let h = JsScalarFunction::new(h);
    let n = curve_samples(n);
    Float64Array::from(core_conjugate_curve(&f, &h, domain_min, domain_max, n).as_slice())
}

#[wasm_bindgen]
pub fn transport_orbit(h: Option<Function>, orbit: Vec<f64>) -> Float64Array {
    let h = JsScalarFunction::new(h);
    Float64Array::from(core_transport_orbit(&h, &orbit).as_slice())
}

fn curve_samples(n: Option<u32>) -> usize {
    n.map_or(DEFAULT_CURVE_SAMPLES, |n| n as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_samples_default_when_absent() {
        assert_eq!(curve_samples(None), DEFAULT_CURVE_SAMPLES);
        assert_eq!(curve_samples(Some(17)), 17);
        assert_eq!(curve_samples(Some(0)), 0);
    }

    #[test]
    fn absent_conjugacy_is_empty() {
        let f = JsScalarFunction::new(None);
        let h = JsScalarFunction::new(None);
        assert!(core_conjugate_curve(&f, &h, 0.0, 1.0, 10).is_empty());
        assert!(core_transport_orbit(&h, &[0.1, 0.2]).is_empty());
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    fn js_fn(body: &str) -> Option<Function> {
        Some(Function::new_with_args("x", body))
    }

    #[wasm_bindgen_test]
    fn logistic_orbit_from_js_callable() {
        let values = compute_orbit(js_fn("return 3.2 * x * (1 - x);"), 0.5, 3).to_vec();
        assert_eq!(values.len(), 4);
        assert!((values[1] - 0.8).abs() < 1e-12);
    }

    #[wasm_bindgen_test]
    fn throwing_callable_truncates_path() {
        let path = compute_cobweb_path(js_fn("throw new Error('boom');"), 0.5, 5).to_vec();
        assert_eq!(path, vec![0.5, 0.0]);
    }

    #[wasm_bindgen_test]
    fn non_numeric_result_is_a_failed_sample() {
        let samples = compute_curve_sample(js_fn("return 'nope';"), 0.0, 1.0, Some(3)).to_vec();
        assert_eq!(samples.len(), 6);
        assert!(samples[1].is_nan());
    }

    #[wasm_bindgen_test]
    fn inversion_through_js() {
        let x = invert_numerically(js_fn("return x * x;"), 0.25, 0.0, 1.0);
        assert!(x.is_some_and(|x| (x - 0.5).abs() < 1e-6));
        assert_eq!(invert_numerically(js_fn("return x * x;"), 4.0, 0.0, 1.0), None);
    }
}

//! JS callables as core scalar functions.

use cobweb_core::traits::ScalarFunction;
use js_sys::Function;
use wasm_bindgen::JsValue;

/// A user-supplied `(x) => number`. An absent callable, a throw, or a
/// non-number result all read as a failed evaluation.
pub(crate) struct JsScalarFunction {
    callback: Option<Function>,
}

impl JsScalarFunction {
    pub(crate) fn new(callback: Option<Function>) -> Self {
        Self { callback }
    }

    pub(crate) fn is_absent(&self) -> bool {
        self.callback.is_none()
    }
}

impl ScalarFunction<f64> for JsScalarFunction {
    fn eval(&self, x: f64) -> Option<f64> {
        let callback = self.callback.as_ref()?;
        callback
            .call1(&JsValue::NULL, &JsValue::from_f64(x))
            .ok()?
            .as_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobweb_core::path::{cobweb_path, invert_numerically, orbit, sample_curve};

    #[test]
    fn absent_callable_fails_every_evaluation() {
        let f = JsScalarFunction::new(None);
        assert!(f.is_absent());
        assert_eq!(f.eval(0.5), None);
    }

    #[test]
    fn absent_callable_yields_empty_paths() {
        let f = JsScalarFunction::new(None);
        assert_eq!(orbit(&f, 0.5, 10), vec![0.5]);
        assert_eq!(cobweb_path(&f, 0.5, 10), vec![0.5, 0.0]);
        assert_eq!(invert_numerically(&f, 0.5, 0.0, 1.0), None);
        let samples = sample_curve(&f, 0.0, 1.0, 3);
        assert!(samples.iter().skip(1).step_by(2).all(|v| v.is_nan()));
    }
}

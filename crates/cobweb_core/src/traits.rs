use crate::types::{ParamSet, State2};
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// A trait for types that can be used as scalars along 1D orbits and paths.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// A user-supplied scalar function `x -> f(x)`.
///
/// Evaluation is fallible: `None` means the callable failed at `x` (it threw,
/// panicked, returned something that is not a number, or is absent). A
/// non-finite `Some` is a legitimate result that callers must detect.
pub trait ScalarFunction<T: Scalar> {
    fn eval(&self, x: T) -> Option<T>;
}

impl<T: Scalar, F: Fn(T) -> T> ScalarFunction<T> for F {
    fn eval(&self, x: T) -> Option<T> {
        Some(self(x))
    }
}

/// Wraps a closure that may panic so that a panic reads as a failed evaluation.
pub struct Guarded<F>(pub F);

impl<T: Scalar, F: Fn(T) -> T> ScalarFunction<T> for Guarded<F> {
    fn eval(&self, x: T) -> Option<T> {
        catch_unwind(AssertUnwindSafe(|| (self.0)(x))).ok()
    }
}

/// Evaluates `f` and folds failures and non-finite values into `None`.
pub(crate) fn eval_finite<T: Scalar, F: ScalarFunction<T> + ?Sized>(f: &F, x: T) -> Option<T> {
    f.eval(x).filter(|v| v.is_finite())
}

/// One step of a planar discrete dynamical system.
///
/// Implementations must be pure. They may return non-finite coordinates; the
/// engines treat those (and anything beyond the divergence threshold) as an
/// escaped orbit.
pub trait PlanarMap {
    fn step(&self, state: State2, params: &ParamSet) -> State2;
}

impl<M: PlanarMap + ?Sized> PlanarMap for &M {
    fn step(&self, state: State2, params: &ParamSet) -> State2 {
        (**self).step(state, params)
    }
}

/// Adapts a closure into a `PlanarMap`.
pub struct MapFn<F>(F);

impl<F: Fn(State2, &ParamSet) -> State2> MapFn<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F: Fn(State2, &ParamSet) -> State2> PlanarMap for MapFn<F> {
    fn step(&self, state: State2, params: &ParamSet) -> State2 {
        (self.0)(state, params)
    }
}

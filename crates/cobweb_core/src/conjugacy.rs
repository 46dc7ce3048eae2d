//! Topological conjugacy between 1D maps.
//!
//! A homeomorphism `h` carries a map `f` to `g = h ∘ f ∘ h⁻¹`. The inverse is
//! taken numerically on a domain where `h` is monotone, so every result here
//! is partial: a failed inversion or evaluation yields `None` (or NaN in
//! sampled curves) rather than an error.

use crate::path::{invert_numerically, sample_curve};
use crate::traits::{eval_finite, Scalar, ScalarFunction};

/// `g = h ∘ f ∘ h⁻¹`, with `h` inverted on `[domain_min, domain_max]`.
pub struct Conjugate<'a, F: ?Sized, H: ?Sized, T> {
    f: &'a F,
    h: &'a H,
    domain_min: T,
    domain_max: T,
}

impl<'a, T, F, H> Conjugate<'a, F, H, T>
where
    T: Scalar,
    F: ScalarFunction<T> + ?Sized,
    H: ScalarFunction<T> + ?Sized,
{
    pub fn new(f: &'a F, h: &'a H, domain_min: T, domain_max: T) -> Self {
        Self {
            f,
            h,
            domain_min,
            domain_max,
        }
    }
}

impl<T, F, H> ScalarFunction<T> for Conjugate<'_, F, H, T>
where
    T: Scalar,
    F: ScalarFunction<T> + ?Sized,
    H: ScalarFunction<T> + ?Sized,
{
    fn eval(&self, y: T) -> Option<T> {
        conjugate_value(self.f, self.h, y, self.domain_min, self.domain_max)
    }
}

pub fn conjugate_value<T, F, H>(f: &F, h: &H, y: T, domain_min: T, domain_max: T) -> Option<T>
where
    T: Scalar,
    F: ScalarFunction<T> + ?Sized,
    H: ScalarFunction<T> + ?Sized,
{
    let x = invert_numerically(h, y, domain_min, domain_max)?;
    let fx = eval_finite(f, x)?;
    eval_finite(h, fx)
}

/// Samples the conjugate map over the image `h([domain_min, domain_max])`.
/// Empty if `h` fails at either end of the domain.
pub fn conjugate_curve<T, F, H>(f: &F, h: &H, domain_min: T, domain_max: T, n: usize) -> Vec<T>
where
    T: Scalar,
    F: ScalarFunction<T> + ?Sized,
    H: ScalarFunction<T> + ?Sized,
{
    let (Some(a), Some(b)) = (eval_finite(h, domain_min), eval_finite(h, domain_max)) else {
        return Vec::new();
    };
    let g = Conjugate::new(f, h, domain_min, domain_max);
    sample_curve(&g, a.min(b), a.max(b), n)
}

/// Carries an orbit of `f` over to the matching orbit of the conjugate map.
/// Stops at the first value `h` cannot map.
pub fn transport_orbit<T, H>(h: &H, orbit: &[T]) -> Vec<T>
where
    T: Scalar,
    H: ScalarFunction<T> + ?Sized,
{
    orbit
        .iter()
        .map_while(|&x| eval_finite(h, x))
        .collect()
}

/// Largest `|h(f(x)) - g(h(x))|` over `n` uniform samples of the domain.
/// Zero (up to rounding) exactly when `h` conjugates `f` to `g` there.
pub fn conjugacy_defect<T, F, G, H>(
    f: &F,
    g: &G,
    h: &H,
    domain_min: T,
    domain_max: T,
    n: usize,
) -> Option<T>
where
    T: Scalar,
    F: ScalarFunction<T> + ?Sized,
    G: ScalarFunction<T> + ?Sized,
    H: ScalarFunction<T> + ?Sized,
{
    let grid = sample_curve(&|x: T| x, domain_min, domain_max, n);
    let mut worst = T::zero();
    for x in grid.iter().step_by(2).copied() {
        let lhs = eval_finite(h, eval_finite(f, x)?)?;
        let rhs = eval_finite(g, eval_finite(h, x)?)?;
        worst = worst.max((lhs - rhs).abs());
    }
    Some(worst)
}

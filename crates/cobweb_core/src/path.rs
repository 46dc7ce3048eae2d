//! Orbit and cobweb path construction for 1D maps.
//!
//! Every routine here treats a failed or non-finite evaluation as the end of
//! the path, never as an error. Output is flat `[x0, y0, x1, y1, ...]` where a
//! renderer expects coordinate pairs.

use crate::traits::{eval_finite, Scalar, ScalarFunction};

pub const DEFAULT_CURVE_SAMPLES: usize = 200;
pub const INVERSION_TOLERANCE: f64 = 1e-10;
pub const BISECTION_ROUNDS: usize = 64;

// Upper bound on speculative preallocation for caller-controlled lengths.
const PREALLOC_LIMIT: usize = 1 << 16;

pub(crate) fn lit<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}

pub(crate) fn index_to_scalar<T: Scalar>(index: usize) -> T {
    T::from_usize(index).unwrap_or_else(T::nan)
}

/// Forward orbit `x0, f(x0), f(f(x0)), ...` with at most `steps + 1` values.
///
/// A shorter result means the orbit escaped: the first failed or non-finite
/// iterate is dropped along with everything after it.
pub fn orbit<T, F>(f: &F, x0: T, steps: usize) -> Vec<T>
where
    T: Scalar,
    F: ScalarFunction<T> + ?Sized,
{
    if !x0.is_finite() {
        return Vec::new();
    }
    let mut values = Vec::with_capacity(steps.min(PREALLOC_LIMIT) + 1);
    values.push(x0);
    let mut x = x0;
    for _ in 0..steps {
        match eval_finite(f, x) {
            Some(next) => {
                values.push(next);
                x = next;
            }
            None => break,
        }
    }
    values
}

/// Stair-step path `(x0,0), (x0,x1), (x1,x1), (x1,x2), (x2,x2), ...`.
///
/// Each iterate contributes a vertical move to the curve followed by a
/// horizontal move to the diagonal.
pub fn cobweb_path<T, F>(f: &F, x0: T, n: usize) -> Vec<T>
where
    T: Scalar,
    F: ScalarFunction<T> + ?Sized,
{
    let mut path = Vec::with_capacity(4 * n.min(PREALLOC_LIMIT) + 2);
    if !x0.is_finite() {
        return path;
    }
    path.push(x0);
    path.push(T::zero());

    let mut x = x0;
    for _ in 0..n {
        let Some(next) = eval_finite(f, x) else {
            break;
        };
        path.extend_from_slice(&[x, next, next, next]);
        x = next;
    }
    path
}

/// Uniform samples of `f` over `[x_min, x_max]`, endpoints included.
///
/// Failed or non-finite samples are kept (failures as NaN) so the renderer can
/// break the polyline there.
pub fn sample_curve<T, F>(f: &F, x_min: T, x_max: T, n: usize) -> Vec<T>
where
    T: Scalar,
    F: ScalarFunction<T> + ?Sized,
{
    let mut samples = Vec::with_capacity(2 * n.min(PREALLOC_LIMIT));
    if n == 0 {
        return samples;
    }
    let span = x_max - x_min;
    let last = index_to_scalar::<T>(n.saturating_sub(1).max(1));
    for i in 0..n {
        let x = if n == 1 {
            x_min
        } else {
            x_min + span * index_to_scalar::<T>(i) / last
        };
        samples.push(x);
        samples.push(f.eval(x).unwrap_or_else(T::nan));
    }
    samples
}

/// Solves `f(x) = y` on `[x_min, x_max]` by bisection with the default tolerance.
pub fn invert_numerically<T, F>(f: &F, y: T, x_min: T, x_max: T) -> Option<T>
where
    T: Scalar,
    F: ScalarFunction<T> + ?Sized,
{
    invert_numerically_with_tolerance(f, y, x_min, x_max, lit(INVERSION_TOLERANCE))
}

/// Bisection inversion assuming `f` is monotone on the interval.
///
/// Returns `None` when `f(x_min) - y` and `f(x_max) - y` share a sign (target
/// out of range or `f` not monotone there), when any evaluation fails, or when
/// the bracket collapses onto a jump without reaching `tolerance`.
pub fn invert_numerically_with_tolerance<T, F>(
    f: &F,
    y: T,
    x_min: T,
    x_max: T,
    tolerance: T,
) -> Option<T>
where
    T: Scalar,
    F: ScalarFunction<T> + ?Sized,
{
    if !y.is_finite() || !x_min.is_finite() || !x_max.is_finite() {
        return None;
    }
    let (mut lo, mut hi) = if x_min <= x_max {
        (x_min, x_max)
    } else {
        (x_max, x_min)
    };

    let g_lo = eval_finite(f, lo)? - y;
    let g_hi = eval_finite(f, hi)? - y;
    if g_lo.abs() <= tolerance {
        return Some(lo);
    }
    if g_hi.abs() <= tolerance {
        return Some(hi);
    }
    if (g_lo < T::zero()) == (g_hi < T::zero()) {
        return None;
    }

    let lo_negative = g_lo < T::zero();
    let half = lit::<T>(0.5);
    let mut mid = lo;
    let mut residual = g_lo;
    for _ in 0..BISECTION_ROUNDS {
        mid = lo + (hi - lo) * half;
        residual = eval_finite(f, mid)? - y;
        if residual.abs() <= tolerance {
            return Some(mid);
        }
        if (residual < T::zero()) == lo_negative {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    (residual.abs() <= tolerance).then_some(mid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Guarded;

    fn logistic(r: f64) -> impl Fn(f64) -> f64 {
        move |x| r * x * (1.0 - x)
    }

    #[test]
    fn orbit_has_requested_length_when_bounded() {
        let values = orbit(&logistic(3.2), 0.5, 50);
        assert_eq!(values.len(), 51);
        assert_eq!(values[0], 0.5);
    }

    #[test]
    fn orbit_settles_into_two_cycle_for_period_two_regime() {
        let values = orbit(&logistic(3.2), 0.5, 50);
        let tail = &values[values.len() - 10..];
        let mut distinct: Vec<f64> = Vec::new();
        for &v in tail {
            if !distinct.iter().any(|d| (d - v).abs() < 1e-4) {
                distinct.push(v);
            }
        }
        assert_eq!(distinct.len(), 2, "tail should alternate: {tail:?}");
        for pair in tail.windows(2) {
            assert!((pair[0] - pair[1]).abs() > 1e-2, "consecutive values should differ");
        }
    }

    #[test]
    fn orbit_truncates_at_first_non_finite_value() {
        let f = |x: f64| if x > 2.0 { f64::NAN } else { x + 1.0 };
        let values = orbit(&f, 0.0, 10);
        assert_eq!(values, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn orbit_truncates_when_callable_fails() {
        let f = Guarded(|x: f64| {
            if x >= 1.0 {
                panic!("domain error");
            }
            x + 0.5
        });
        let values = orbit(&f, 0.0, 10);
        assert_eq!(values, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn orbit_of_non_finite_seed_is_empty() {
        assert!(orbit(&logistic(3.2), f64::NAN, 5).is_empty());
    }

    #[test]
    fn cobweb_path_starts_on_axis_and_alternates_moves() {
        let path = cobweb_path(&logistic(3.7), 0.2, 12);
        assert_eq!(&path[..2], &[0.2, 0.0]);
        assert_eq!(path.len(), 2 + 4 * 12);

        let points = path.len() / 2;
        for i in 1..points {
            let vertical = path[2 * i] == path[2 * i - 2];
            let horizontal = path[2 * i + 1] == path[2 * i - 1];
            if i % 2 == 1 {
                assert!(vertical, "move {i} should be vertical");
            } else {
                assert!(horizontal, "move {i} should be horizontal");
                assert_eq!(path[2 * i], path[2 * i + 1], "horizontal moves land on the diagonal");
            }
        }
    }

    #[test]
    fn cobweb_path_with_zero_iterates_is_the_start_pair() {
        assert_eq!(cobweb_path(&logistic(3.0), 0.3, 0), vec![0.3, 0.0]);
    }

    #[test]
    fn cobweb_path_stops_at_escape() {
        let f = |x: f64| if x > 1.5 { f64::INFINITY } else { 2.0 * x };
        let path = cobweb_path(&f, 0.5, 10);
        // 0.5 -> 1.0 -> 2.0 -> inf
        assert_eq!(path, vec![0.5, 0.0, 0.5, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn sample_curve_includes_endpoints() {
        let samples = sample_curve(&|x: f64| x * x, -1.0, 1.0, 5);
        assert_eq!(samples.len(), 10);
        assert_eq!(samples[0], -1.0);
        assert_eq!(samples[8], 1.0);
        assert_eq!(samples[4], 0.0);
        assert_eq!(samples[9], 1.0);
    }

    #[test]
    fn sample_curve_keeps_non_finite_samples() {
        let samples = sample_curve(&|x: f64| 1.0 / x, -1.0, 1.0, 3);
        assert_eq!(samples.len(), 6);
        assert!(samples[3].is_infinite());

        let failing = Guarded(|x: f64| {
            if x == 0.0 {
                panic!("pole");
            }
            x
        });
        let samples = sample_curve(&failing, -1.0, 1.0, 3);
        assert!(samples[3].is_nan());
        assert_eq!(samples[5], 1.0);
    }

    #[test]
    fn sample_curve_handles_degenerate_counts() {
        assert!(sample_curve(&|x: f64| x, 0.0, 1.0, 0).is_empty());
        assert_eq!(sample_curve(&|x: f64| x + 1.0, 0.25, 1.0, 1), vec![0.25, 1.25]);
    }

    #[test]
    fn invert_numerically_finds_preimage_within_tolerance() {
        let cube = |x: f64| x * x * x;
        let v = invert_numerically(&cube, 1.5, -2.0, 2.0).expect("root should exist");
        assert!((cube(v) - 1.5).abs() <= INVERSION_TOLERANCE);

        let reversed = invert_numerically(&cube, -0.25, 2.0, -2.0).expect("root should exist");
        assert!((cube(reversed) + 0.25).abs() <= INVERSION_TOLERANCE);
    }

    #[test]
    fn invert_numerically_handles_decreasing_functions() {
        let f = |x: f64| 1.0 - x;
        let v = invert_numerically(&f, 0.3, 0.0, 1.0).expect("root should exist");
        assert!((v - 0.7).abs() < 1e-9);
    }

    #[test]
    fn invert_numerically_reports_no_solution_for_same_sign_bracket() {
        let cube = |x: f64| x * x * x;
        assert_eq!(invert_numerically(&cube, 10.0, -2.0, 2.0), None);
        let square = |x: f64| x * x;
        assert_eq!(invert_numerically(&square, 0.5, -1.0, 1.0), None);
    }

    #[test]
    fn invert_numerically_accepts_endpoint_roots() {
        let f = |x: f64| 2.0 * x;
        assert_eq!(invert_numerically(&f, 0.0, 0.0, 1.0), Some(0.0));
        assert_eq!(invert_numerically(&f, 2.0, 0.0, 1.0), Some(1.0));
    }

    #[test]
    fn invert_numerically_rejects_jumps() {
        let step = |x: f64| if x < 0.5 { 0.0 } else { 1.0 };
        assert_eq!(invert_numerically(&step, 0.5, 0.0, 1.0), None);
    }

    #[test]
    fn path_builders_work_in_single_precision() {
        let f = |x: f32| 0.5 * x;
        let values = orbit(&f, 1.0f32, 3);
        assert_eq!(values, vec![1.0, 0.5, 0.25, 0.125]);
    }
}

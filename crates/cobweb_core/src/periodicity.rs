//! Period detection on recorded orbits.
//!
//! Two detectors live here and are kept independent: the sweep engine only
//! asks whether the final state recurs after a power-of-two number of steps,
//! while the live engine searches every period up to a cap over the trailing
//! history. They use different tolerances.

use crate::types::State2;

/// Tolerance used by the bifurcation sweep's power-of-two search.
pub const SWEEP_PERIOD_TOLERANCE: f64 = 1e-5;
/// Default power-of-two search depth: periods 1, 2, 4, ..., 4096.
pub const DEFAULT_SEARCH_DEPTH: u32 = 12;
/// Largest accepted search depth.
pub const MAX_SEARCH_DEPTH: u32 = 24;

/// Tolerance used by the live engine's general search.
pub const LIVE_PERIOD_TOLERANCE: f64 = 1e-8;
/// Largest period the live engine looks for.
pub const LIVE_PERIOD_CAP: usize = 128;

/// Power-of-two period of a trajectory `states[0..=n]`.
///
/// Compares the last state against the one `2^j` steps earlier for
/// `j = 0..=depth`, stopping at the first match, so the smallest matching
/// period is the answer. Periods longer than the trajectory are not tried.
pub fn power_of_two_period(states: &[State2], depth: u32, tolerance: f64) -> Option<usize> {
    let n = states.len().checked_sub(1)?;
    let last = states[n];
    for j in 0..=depth.min(MAX_SEARCH_DEPTH) {
        let period = 1usize << j;
        if period > n {
            break;
        }
        if last.within(&states[n - period], tolerance) {
            return Some(period);
        }
    }
    None
}

/// Smallest period `p <= cap` for which the trailing history repeats.
///
/// For each candidate `p` the last `min(2p, len - p)` states must each match
/// the state `p` steps before it within `tolerance`. Returns `None` when
/// nothing matches; callers retry once more history has accumulated.
pub fn general_period(history: &[State2], cap: usize, tolerance: f64) -> Option<usize> {
    let len = history.len();
    let max_period = cap.min(len / 2);
    (1..=max_period).find(|&p| repeats_with_lag(history, p, tolerance))
}

fn repeats_with_lag(history: &[State2], p: usize, tolerance: f64) -> bool {
    let len = history.len();
    let checked = (2 * p).min(len - p);
    (len - checked..len).all(|i| history[i].within(&history[i - p], tolerance))
}

/// The last `period` states, in order: one representative cycle.
pub fn cycle_tail(history: &[State2], period: usize) -> Vec<State2> {
    let start = history.len().saturating_sub(period);
    history[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(values: &[(f64, f64)], repeats: usize) -> Vec<State2> {
        let mut out = Vec::new();
        for _ in 0..repeats {
            out.extend(values.iter().map(|&v| State2::from(v)));
        }
        out
    }

    #[test]
    fn power_of_two_finds_smallest_matching_period() {
        let states = cycle(&[(0.1, 0.0), (0.2, 0.0), (0.3, 0.0), (0.4, 0.0)], 5);
        let mut trajectory = vec![State2::new(9.0, 9.0)];
        trajectory.extend(states);
        assert_eq!(power_of_two_period(&trajectory, 12, 1e-5), Some(4));
    }

    #[test]
    fn power_of_two_reports_fixed_points_as_period_one() {
        let trajectory = vec![State2::new(0.5, 0.5); 10];
        assert_eq!(power_of_two_period(&trajectory, 12, 1e-5), Some(1));
    }

    #[test]
    fn power_of_two_ignores_non_power_periods() {
        let states = cycle(&[(0.1, 0.0), (0.2, 0.0), (0.3, 0.0)], 20);
        assert_eq!(power_of_two_period(&states, 12, 1e-5), None);
    }

    #[test]
    fn power_of_two_skips_periods_longer_than_trajectory() {
        let trajectory = vec![State2::new(0.0, 0.0), State2::new(1.0, 0.0)];
        assert_eq!(power_of_two_period(&trajectory, 12, 1e-5), None);
        assert_eq!(power_of_two_period(&[], 12, 1e-5), None);
    }

    #[test]
    fn power_of_two_respects_tolerance() {
        let trajectory = vec![State2::new(0.0, 0.0), State2::new(0.0, 5e-6)];
        assert_eq!(power_of_two_period(&trajectory, 12, 1e-5), Some(1));
        assert_eq!(power_of_two_period(&trajectory, 12, 1e-6), None);
    }

    #[test]
    fn general_period_finds_odd_periods() {
        let history = cycle(&[(0.1, 1.0), (0.2, 2.0), (0.3, 3.0)], 4);
        assert_eq!(general_period(&history, 128, 1e-8), Some(3));
        assert_eq!(cycle_tail(&history, 3), cycle(&[(0.1, 1.0), (0.2, 2.0), (0.3, 3.0)], 1));
    }

    #[test]
    fn general_period_only_inspects_the_trailing_window() {
        let mut history = vec![State2::new(5.0, 5.0), State2::new(-5.0, 2.0)];
        history.extend(cycle(&[(0.4, 0.0), (0.6, 0.0)], 3));
        assert_eq!(general_period(&history, 128, 1e-8), Some(2));
    }

    #[test]
    fn general_period_stays_pending_without_repetition() {
        let history: Vec<State2> = (0..300).map(|i| State2::new(i as f64, 0.0)).collect();
        assert_eq!(general_period(&history, 128, 1e-8), None);
        assert_eq!(general_period(&history[..1], 128, 1e-8), None);
    }

    #[test]
    fn general_period_respects_cap() {
        let values: Vec<(f64, f64)> = (0..5).map(|i| (i as f64, 0.0)).collect();
        let history = cycle(&values, 4);
        assert_eq!(general_period(&history, 4, 1e-8), None);
        assert_eq!(general_period(&history, 5, 1e-8), Some(5));
    }
}

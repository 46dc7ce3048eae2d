//! Interface to an external math kernel.
//!
//! A kernel runs a program and returns a flat list of numbers. The engine only
//! relies on this narrow contract; no concrete kernel ships with the crate.

use crate::types::State2;

pub trait MathKernel {
    /// Runs `code` and returns its numeric output; empty on any failure.
    fn run(&mut self, code: &str) -> Vec<f64>;
}

impl<F: FnMut(&str) -> Vec<f64>> MathKernel for F {
    fn run(&mut self, code: &str) -> Vec<f64> {
        self(code)
    }
}

/// Pairs kernel output into points, stopping at the first non-finite value.
/// A trailing unpaired coordinate is dropped.
pub fn kernel_points<K: MathKernel + ?Sized>(kernel: &mut K, code: &str) -> Vec<State2> {
    kernel
        .run(code)
        .chunks_exact(2)
        .map(|pair| State2::new(pair[0], pair[1]))
        .take_while(|point| point.x.is_finite() && point.y.is_finite())
        .collect()
}

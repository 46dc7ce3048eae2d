pub mod bifurcation;
pub mod conjugacy;
pub mod error;
pub mod iteration;
pub mod kernel;
pub mod path;
pub mod periodicity;
pub mod registry;
pub mod trail;
/// The `cobweb_core` crate is the computation engine behind the interactive
/// explorer for discrete dynamical systems.
/// It has no UI or JS dependency. The wasm bridge and native hosts drive it
/// through plain functions and explicit `update` calls.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `ScalarFunction` (fallible 1D callables), `PlanarMap` (2D steps).
/// - **Path**: Orbits, cobweb paths, curve sampling and bisection inversion for 1D maps.
/// - **Bifurcation**: Parameter sweeps with power-of-two period search and period-doubling onsets.
/// - **Iteration**: The pausable, scrubbable live engine with general period detection.
/// - **Registry**: Built-in map definitions and their UI defaults.
pub mod traits;
pub mod types;

pub use error::ConfigError;
pub use types::{ParamSet, State2, DIVERGENCE_THRESHOLD};

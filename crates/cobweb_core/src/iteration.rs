//! Live iteration engine.
//!
//! Advances a planar map a few steps per animation tick, keeps a bounded
//! trail for display and the full post-transient history for period
//! detection, and supports pause/resume, reset, and scrubbing back to any
//! earlier step. Scrubbing is read-only: it replays the run from the initial
//! condition and never touches the live simulation.

use crate::error::ConfigError;
use crate::periodicity::{cycle_tail, general_period, LIVE_PERIOD_CAP, LIVE_PERIOD_TOLERANCE};
use crate::registry::MapDefinition;
use crate::trail::TrailBuffer;
use crate::traits::PlanarMap;
use crate::types::{ParamSet, State2};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Steps discarded before history is recorded for period detection.
pub const DEFAULT_TRANSIENT: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IterationSettings {
    /// Iteration budget for one run.
    pub iterates: usize,
    /// Trail length kept for display.
    pub lag: usize,
    /// Map applications per tick.
    pub speed: usize,
    pub transient: usize,
    pub period_cap: usize,
    pub period_tolerance: f64,
}

impl Default for IterationSettings {
    fn default() -> Self {
        Self {
            iterates: 10_000,
            lag: 50,
            speed: 10,
            transient: DEFAULT_TRANSIENT,
            period_cap: LIVE_PERIOD_CAP,
            period_tolerance: LIVE_PERIOD_TOLERANCE,
        }
    }
}

impl IterationSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterates == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if self.speed == 0 {
            return Err(ConfigError::ZeroSpeed);
        }
        if !self.period_tolerance.is_finite() || self.period_tolerance <= 0.0 {
            return Err(ConfigError::InvalidTolerance(self.period_tolerance));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// No initial condition yet.
    Waiting,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodStatus {
    /// Not determined yet; detection is retried as history grows.
    Pending,
    /// The run finished without any period up to the cap.
    Aperiodic,
    Periodic(usize),
}

impl PeriodStatus {
    /// `None` while pending, `Some(0)` for aperiodic, `Some(p)` for period `p`.
    pub fn code(&self) -> Option<usize> {
        match self {
            PeriodStatus::Pending => None,
            PeriodStatus::Aperiodic => Some(0),
            PeriodStatus::Periodic(p) => Some(*p),
        }
    }
}

/// What a call to [`IterationEngine::advance`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Nothing to do: waiting, paused, diverged, or already complete.
    Idle,
    /// Applied the map this many times.
    Advanced(usize),
    /// The orbit escaped during this tick.
    Diverged,
    /// This tick exhausted the iteration budget.
    Completed,
}

/// Immutable view of the engine handed to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationSnapshot {
    pub phase: RunPhase,
    pub is_running: bool,
    pub initial_condition: Option<State2>,
    /// Displayed state: the scrubbed state when a playback step is set,
    /// otherwise the live state.
    pub state: Option<State2>,
    pub live_state: Option<State2>,
    /// Displayed step.
    pub step: usize,
    pub step_count: usize,
    pub max_step: usize,
    pub diverged: bool,
    pub completed: bool,
    pub detected_period: Option<usize>,
    pub cycle_points: Vec<State2>,
    pub playback_step: Option<usize>,
    /// Displayed trail, oldest first.
    pub trail: Vec<State2>,
}

pub type ListenerId = usize;
type Listener = Box<dyn FnMut(&IterationSnapshot)>;

#[derive(Debug, Clone)]
struct PlaybackView {
    step: usize,
    state: State2,
    trail: Vec<State2>,
}

pub struct IterationEngine<M: PlanarMap> {
    map: M,
    params: ParamSet,
    settings: IterationSettings,
    phase: RunPhase,
    initial: Option<State2>,
    current: Option<State2>,
    step: usize,
    diverged: bool,
    trail: TrailBuffer,
    history: Vec<State2>,
    period: PeriodStatus,
    cycle_points: Vec<State2>,
    playback: Option<PlaybackView>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: ListenerId,
}

impl<M: PlanarMap> IterationEngine<M> {
    pub fn new(map: M, params: ParamSet, settings: IterationSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            map,
            params,
            trail: TrailBuffer::new(settings.lag),
            settings,
            phase: RunPhase::Waiting,
            initial: None,
            current: None,
            step: 0,
            diverged: false,
            history: Vec::new(),
            period: PeriodStatus::Pending,
            cycle_points: Vec::new(),
            playback: None,
            listeners: Vec::new(),
            next_listener: 0,
        })
    }

    /// Starts a fresh run from `(x0, y0)`.
    pub fn seed(&mut self, x0: f64, y0: f64) {
        self.start_run(State2::new(x0, y0));
        self.notify();
    }

    fn start_run(&mut self, initial: State2) {
        self.clear_run();
        self.initial = Some(initial);
        self.current = Some(initial);
        self.trail.push(initial);
        self.diverged = initial.is_escaped();
        self.phase = RunPhase::Running;
        debug!(x0 = initial.x, y0 = initial.y, "seeded live iteration");
    }

    fn clear_run(&mut self) {
        self.initial = None;
        self.current = None;
        self.step = 0;
        self.diverged = false;
        self.trail.clear();
        self.history.clear();
        self.period = PeriodStatus::Pending;
        self.cycle_points.clear();
        self.playback = None;
    }

    /// One animation tick: up to `speed` map applications.
    pub fn advance(&mut self) -> AdvanceOutcome {
        if self.phase != RunPhase::Running || self.diverged || self.is_complete() {
            return AdvanceOutcome::Idle;
        }
        let Some(mut state) = self.current else {
            return AdvanceOutcome::Idle;
        };

        let recorded_before = self.history.len();
        let mut applied = 0usize;
        for _ in 0..self.settings.speed {
            if self.is_complete() {
                break;
            }
            let next = self.map.step(state, &self.params);
            if next.is_escaped() {
                self.diverged = true;
                debug!(step = self.step, x = next.x, y = next.y, "live orbit diverged");
                break;
            }
            state = next;
            self.step += 1;
            applied += 1;
            self.trail.push(next);
            if self.step > self.settings.transient {
                self.history.push(next);
            }
        }
        self.current = Some(state);

        if self.history.len() > recorded_before && self.period == PeriodStatus::Pending {
            self.detect_period();
        }

        let outcome = if self.diverged {
            self.finish_run(false);
            AdvanceOutcome::Diverged
        } else if self.is_complete() {
            self.finish_run(true);
            AdvanceOutcome::Completed
        } else {
            AdvanceOutcome::Advanced(applied)
        };
        trace!(step = self.step, ?outcome, "tick");
        self.notify();
        outcome
    }

    fn is_complete(&self) -> bool {
        self.step >= self.settings.iterates
    }

    fn detect_period(&mut self) {
        let found = general_period(
            &self.history,
            self.settings.period_cap,
            self.settings.period_tolerance,
        );
        if let Some(p) = found {
            self.period = PeriodStatus::Periodic(p);
            self.cycle_points = cycle_tail(&self.history, p);
            debug!(period = p, step = self.step, "detected live period");
        }
    }

    // Last-chance detection. A completed run that still has no period is
    // aperiodic; a diverged one stays undetermined.
    fn finish_run(&mut self, completed: bool) {
        if self.period == PeriodStatus::Pending {
            self.detect_period();
        }
        if completed && self.period == PeriodStatus::Pending {
            self.period = PeriodStatus::Aperiodic;
        }
        debug!(
            step = self.step,
            diverged = self.diverged,
            period = ?self.period.code(),
            "live run finished"
        );
    }

    pub fn pause(&mut self) {
        if self.phase == RunPhase::Running {
            self.phase = RunPhase::Paused;
            self.notify();
        }
    }

    /// Resumes a paused run; with `run_immediately` the next tick runs now.
    pub fn resume(&mut self, run_immediately: bool) -> AdvanceOutcome {
        if self.phase != RunPhase::Paused {
            return AdvanceOutcome::Idle;
        }
        self.phase = RunPhase::Running;
        if run_immediately {
            self.advance()
        } else {
            self.notify();
            AdvanceOutcome::Idle
        }
    }

    /// Freezes the displayed state at step `k` (clamped to the steps taken so
    /// far), or returns to the live view with `None`.
    pub fn set_playback_step(&mut self, step: Option<usize>) {
        match (step, self.initial) {
            (None, _) => self.playback = None,
            (Some(k), Some(initial)) => {
                self.playback = Some(self.replay(initial, k.min(self.step)));
            }
            (Some(_), None) => return,
        }
        self.notify();
    }

    fn replay(&self, initial: State2, steps: usize) -> PlaybackView {
        let mut trail = TrailBuffer::new(self.settings.lag);
        let mut state = initial;
        trail.push(state);
        for _ in 0..steps {
            state = self.map.step(state, &self.params);
            trail.push(state);
        }
        PlaybackView {
            step: steps,
            state,
            trail: trail.to_vec(),
        }
    }

    /// Back to waiting, discarding the run.
    pub fn reset(&mut self) {
        self.clear_run();
        self.phase = RunPhase::Waiting;
        self.notify();
    }

    /// Replaces the map parameters and restarts from the current initial
    /// condition, if any.
    pub fn set_params(&mut self, params: ParamSet) {
        self.params = params;
        self.restart();
    }

    pub fn set_settings(&mut self, settings: IterationSettings) -> Result<(), ConfigError> {
        settings.validate()?;
        self.trail = TrailBuffer::new(settings.lag);
        self.settings = settings;
        self.restart();
        Ok(())
    }

    fn restart(&mut self) {
        match self.initial {
            Some(initial) => self.start_run(initial),
            None => self.clear_run(),
        }
        self.notify();
    }

    pub fn snapshot(&self) -> IterationSnapshot {
        let (state, step, trail) = match &self.playback {
            Some(view) => (Some(view.state), view.step, view.trail.clone()),
            None => (self.current, self.step, self.trail.to_vec()),
        };
        IterationSnapshot {
            phase: self.phase,
            is_running: self.phase == RunPhase::Running,
            initial_condition: self.initial,
            state,
            live_state: self.current,
            step,
            step_count: self.step,
            max_step: self.settings.iterates,
            diverged: self.diverged,
            completed: self.is_complete(),
            detected_period: self.period.code(),
            cycle_points: self.cycle_points.clone(),
            playback_step: self.playback.as_ref().map(|view| view.step),
            trail,
        }
    }

    /// Registers a callback invoked with a fresh snapshot after every
    /// state-changing operation.
    pub fn on_state_change(&mut self, listener: impl FnMut(&IterationSnapshot) + 'static) -> ListenerId {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn notify(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for (_, listener) in &mut self.listeners {
            listener(&snapshot);
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn step_count(&self) -> usize {
        self.step
    }

    pub fn is_diverged(&self) -> bool {
        self.diverged
    }

    pub fn period_status(&self) -> PeriodStatus {
        self.period
    }

    pub fn cycle_points(&self) -> &[State2] {
        &self.cycle_points
    }

    /// Number of post-transient states recorded for period detection.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn settings(&self) -> &IterationSettings {
        &self.settings
    }

    pub fn params(&self) -> &ParamSet {
        &self.params
    }

    pub fn map(&self) -> &M {
        &self.map
    }
}

impl<'a> IterationEngine<&'a MapDefinition> {
    /// An engine over a registered map using its parameter and playback defaults.
    pub fn with_defaults(definition: &'a MapDefinition) -> Result<Self, ConfigError> {
        Self::new(
            definition,
            definition.default_params.clone(),
            definition.iteration_settings(),
        )
    }
}

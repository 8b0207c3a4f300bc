//! Cosmetic progress indicator.
//!
//! The percentage is not derived from the work being done. It advances by a
//! random step every tick and is finished off by whoever runs the real job.

use std::fmt;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

pub const DEFAULT_TICK: Duration = Duration::from_millis(200);
pub const DEFAULT_MAX_INCREMENT: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Analyzing,
    CompressingImages,
    Optimizing,
    Finalizing,
}

impl Phase {
    pub fn from_percent(percent: f64) -> Self {
        if percent < 30.0 {
            Phase::Analyzing
        } else if percent < 60.0 {
            Phase::CompressingImages
        } else if percent < 90.0 {
            Phase::Optimizing
        } else {
            Phase::Finalizing
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Analyzing => "analyzing",
            Phase::CompressingImages => "compressing images",
            Phase::Optimizing => "optimizing",
            Phase::Finalizing => "finalizing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressState {
    pub percent: f64,
    pub phase: Phase,
}

impl ProgressState {
    fn at(percent: f64) -> Self {
        Self {
            percent,
            phase: Phase::from_percent(percent),
        }
    }
}

impl fmt::Display for ProgressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:5.1}% {}", self.percent, self.phase.label())
    }
}

/// Yields progress states until it reaches 100.
///
/// With a ceiling below 100 the simulator parks at the ceiling and only
/// [`ProgressSimulator::complete`] takes it the rest of the way.
#[derive(Debug, Clone)]
pub struct ProgressSimulator {
    rng: fastrand::Rng,
    percent: f64,
    max_increment: f64,
    ceiling: f64,
    finished: bool,
}

impl ProgressSimulator {
    pub fn new(rng: fastrand::Rng) -> Self {
        Self {
            rng,
            percent: 0.0,
            max_increment: DEFAULT_MAX_INCREMENT,
            ceiling: 100.0,
            finished: false,
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(fastrand::Rng::with_seed(seed))
    }

    pub fn with_max_increment(mut self, max_increment: f64) -> Self {
        self.max_increment = max_increment.max(0.0);
        self
    }

    pub fn with_ceiling(mut self, ceiling: f64) -> Self {
        self.ceiling = ceiling.clamp(0.0, 100.0);
        self
    }

    pub fn state(&self) -> ProgressState {
        ProgressState::at(self.percent)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn tick(&mut self) -> Option<ProgressState> {
        if self.finished {
            return None;
        }
        let next = self.percent + self.rng.f64() * self.max_increment;
        if self.ceiling < 100.0 {
            self.percent = next.min(self.ceiling);
        } else if next >= 100.0 {
            self.percent = 100.0;
            self.finished = true;
        } else {
            self.percent = next;
        }
        Some(self.state())
    }

    /// Jumps to 100. Returns `None` when the run already ended.
    pub fn complete(&mut self) -> Option<ProgressState> {
        if self.finished {
            return None;
        }
        self.percent = 100.0;
        self.finished = true;
        Some(self.state())
    }
}

impl Iterator for ProgressSimulator {
    type Item = ProgressState;

    fn next(&mut self) -> Option<ProgressState> {
        self.tick()
    }
}

/// Drives a simulator on a fixed interval until the real job reports back.
pub struct ProgressTicker {
    simulator: ProgressSimulator,
    interval: Duration,
}

impl ProgressTicker {
    pub fn new(simulator: ProgressSimulator, interval: Duration) -> Self {
        Self {
            simulator,
            interval,
        }
    }

    /// Ticks until `done` receives a message or its sender goes away, then
    /// emits the final 100% and returns it.
    pub fn run<F>(mut self, done: Receiver<()>, mut on_tick: F) -> ProgressState
    where
        F: FnMut(ProgressState),
    {
        loop {
            match done.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => {
                    if let Some(state) = self.simulator.tick() {
                        on_tick(state);
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    if let Some(state) = self.simulator.complete() {
                        on_tick(state);
                    }
                    return self.simulator.state();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::mpsc;

    fn assert_well_formed(run: &[ProgressState]) {
        assert!(!run.is_empty());
        assert!(run[0].percent < 100.0 || run.len() == 1);
        for pair in run.windows(2) {
            assert!(pair[0].percent <= pair[1].percent);
        }
        assert_eq!(run.last().unwrap().percent, 100.0);
    }

    #[rstest]
    #[case(0)]
    #[case(7)]
    #[case(42)]
    #[case(0xdead_beef)]
    fn self_terminating_run_ends_at_exactly_100(#[case] seed: u64) {
        let run: Vec<_> = ProgressSimulator::seeded(seed).collect();
        assert_well_formed(&run);
        assert!(run[0].percent < 100.0);
    }

    #[test]
    fn phase_follows_percentage() {
        assert_eq!(Phase::from_percent(0.0), Phase::Analyzing);
        assert_eq!(Phase::from_percent(29.9), Phase::Analyzing);
        assert_eq!(Phase::from_percent(30.0), Phase::CompressingImages);
        assert_eq!(Phase::from_percent(60.0), Phase::Optimizing);
        assert_eq!(Phase::from_percent(89.99), Phase::Optimizing);
        assert_eq!(Phase::from_percent(90.0), Phase::Finalizing);
        assert_eq!(Phase::from_percent(100.0), Phase::Finalizing);
    }

    #[test]
    fn ceiling_holds_until_completed() {
        let mut sim = ProgressSimulator::seeded(3).with_ceiling(60.0);
        for _ in 0..200 {
            let state = sim.tick().unwrap();
            assert!(state.percent <= 60.0);
        }
        assert!(!sim.is_finished());
        assert_eq!(sim.complete().unwrap().percent, 100.0);
        assert!(sim.tick().is_none());
        assert!(sim.complete().is_none());
    }

    #[rstest]
    #[case(1)]
    #[case(9)]
    #[case(1234)]
    fn default_ceiling_never_reaches_100_on_its_own(#[case] seed: u64) {
        let config = crate::config::PipelineConfig::default();
        let mut sim = ProgressSimulator::seeded(seed)
            .with_max_increment(config.max_increment)
            .with_ceiling(config.progress_ceiling);
        for _ in 0..500 {
            let state = sim.tick().unwrap();
            assert!(state.percent <= config.progress_ceiling);
        }
        assert_eq!(sim.state().percent, config.progress_ceiling);
        assert!(!sim.is_finished());
        assert_eq!(sim.complete().unwrap().percent, 100.0);
        assert!(sim.is_finished());
    }

    #[test]
    fn ticker_completes_when_the_job_resolves() {
        let (tx, rx) = mpsc::channel();
        tx.send(()).unwrap();
        let mut seen = Vec::new();
        let sim = ProgressSimulator::seeded(11).with_ceiling(99.0);
        let last = ProgressTicker::new(sim, Duration::from_millis(1)).run(rx, |s| seen.push(s));
        assert_eq!(last.percent, 100.0);
        assert_eq!(seen, vec![last]);
    }

    #[test]
    fn ticker_stops_when_sender_is_dropped() {
        let (tx, rx) = mpsc::channel::<()>();
        let worker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            drop(tx);
        });
        let mut seen = Vec::new();
        let sim = ProgressSimulator::seeded(5).with_ceiling(99.0);
        ProgressTicker::new(sim, Duration::from_millis(2)).run(rx, |s| seen.push(s));
        worker.join().unwrap();
        assert_well_formed(&seen);
    }

    #[test]
    fn display_shows_percent_and_phase() {
        assert_eq!(ProgressState::at(42.0).to_string(), " 42.0% compressing images");
    }
}

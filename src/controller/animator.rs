use crate::constants::REVEAL_STEP;

/// Identifies one run of the reveal animation; ticks from older runs are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
enum AnimatorState {
    Idle,
    Running {
        run: RunId,
        initial_percent: f64,
        ticks_elapsed: u64,
        total_ticks: u64,
    },
}

/// Result of delivering one tick to the animator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The tick belonged to a cancelled or replaced run, or the animator is idle
    Ignored,
    /// The value decreased and the run continues
    Advanced(f64),
    /// The value reached zero; the animator is idle again
    Finished,
}

/// Linear reveal animation driving `hidden_percent` from a start value down to zero
///
/// The value after `k` ticks is `initial - k * step`, derived from the tick
/// count rather than by repeated subtraction so the run always finishes after
/// exactly `ceil(initial / step)` ticks (at least one).
#[derive(Debug, Clone)]
pub struct RevealAnimator {
    hidden_percent: f64,
    step: f64,
    state: AnimatorState,
    next_run: u64,
}

impl Default for RevealAnimator {
    fn default() -> Self {
        Self::new(REVEAL_STEP)
    }
}

impl RevealAnimator {
    /// Create an idle animator; a non-positive or non-finite step falls back to the default
    #[must_use]
    pub fn new(step: f64) -> Self {
        let step = if step.is_finite() && step > 0.0 { step } else { REVEAL_STEP };
        Self {
            hidden_percent: 0.0,
            step,
            state: AnimatorState::Idle,
            next_run: 0,
        }
    }

    /// Begin a new run at `initial_percent`, replacing any run in progress
    ///
    /// The value is taken as-is: callers pre-scale it, so it may exceed 100 or be negative.
    pub fn start(&mut self, initial_percent: f64) -> RunId {
        let run = RunId(self.next_run);
        self.next_run += 1;

        self.hidden_percent = initial_percent;
        self.state = AnimatorState::Running {
            run,
            initial_percent,
            ticks_elapsed: 0,
            total_ticks: ticks_to_zero(initial_percent, self.step),
        };
        run
    }

    pub fn tick(&mut self, run: RunId) -> TickOutcome {
        let AnimatorState::Running {
            run: current,
            initial_percent,
            ticks_elapsed,
            total_ticks,
        } = self.state
        else {
            return TickOutcome::Ignored;
        };

        if current != run {
            return TickOutcome::Ignored;
        }

        let ticks_elapsed = ticks_elapsed + 1;
        if ticks_elapsed >= total_ticks {
            self.hidden_percent = 0.0;
            self.state = AnimatorState::Idle;
            return TickOutcome::Finished;
        }

        #[allow(clippy::cast_precision_loss)]
        let decrease = self.step * ticks_elapsed as f64;
        self.hidden_percent = (initial_percent - decrease).max(0.0);
        self.state = AnimatorState::Running {
            run,
            initial_percent,
            ticks_elapsed,
            total_ticks,
        };
        TickOutcome::Advanced(self.hidden_percent)
    }

    /// Stop the current run, leaving `hidden_percent` where it is
    ///
    /// Returns whether a run was actually stopped; cancelling while idle is a no-op.
    pub fn cancel(&mut self) -> bool {
        let was_running = self.is_running();
        self.state = AnimatorState::Idle;
        was_running
    }

    /// Uncover the foreground completely without touching the run state
    pub fn reset(&mut self) {
        self.hidden_percent = 0.0;
    }

    #[must_use]
    pub fn hidden_percent(&self) -> f64 {
        self.hidden_percent
    }

    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, AnimatorState::Running { .. })
    }

    #[must_use]
    pub fn current_run(&self) -> Option<RunId> {
        match self.state {
            AnimatorState::Running { run, .. } => Some(run),
            AnimatorState::Idle => None,
        }
    }

    /// Ticks left until the current run finishes (0 when idle)
    #[must_use]
    pub fn remaining_ticks(&self) -> u64 {
        match self.state {
            AnimatorState::Running {
                ticks_elapsed,
                total_ticks,
                ..
            } => total_ticks - ticks_elapsed,
            AnimatorState::Idle => 0,
        }
    }
}

/// Number of ticks a run starting at `initial_percent` takes to reach zero
#[must_use]
pub fn ticks_to_zero(initial_percent: f64, step: f64) -> u64 {
    let ratio = initial_percent / step;
    if ratio.is_nan() || ratio <= 1.0 {
        return 1;
    }

    // Quotients like 74.4 / 0.05 land a hair off the integer they represent
    let nearest = ratio.round();
    let ticks = if (ratio - nearest).abs() < 1e-9 * nearest {
        nearest
    } else {
        ratio.ceil()
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let ticks = ticks as u64;
    ticks
}

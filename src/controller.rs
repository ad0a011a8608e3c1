mod animator;
mod selection;
mod timer;

pub use animator::{ticks_to_zero, RevealAnimator, RunId, TickOutcome};
pub use selection::SelectionState;
pub use timer::TimerHandle;

use crate::api::FetchError;
use crate::config::AppConfig;
use crate::dev_log;
use crate::models::TrainRecord;

/// Sequence number of one fetch; results of older fetches never overwrite newer ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// What applying a fetch result did to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// First successful fetch; the first train became selected
    Initialized { trains: usize },
    /// Train list replaced wholesale
    Replaced { trains: usize },
    /// A newer fetch was already applied; the result was discarded
    Stale,
    /// The fetch failed; previous state is kept
    Failed,
}

/// Read-only snapshot handed to the rendering layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub trains: Vec<TrainRecord>,
    pub selected: Option<TrainRecord>,
    pub hidden_percent: f64,
    pub is_animating: bool,
}

impl ViewState {
    /// CSS clip path hiding the right-hand `hidden_percent` of the foreground image
    #[must_use]
    pub fn foreground_clip_path(&self) -> String {
        clip_path(self.hidden_percent)
    }
}

#[must_use]
pub fn clip_path(hidden_percent: f64) -> String {
    format!("inset(0 {hidden_percent}% 0 0)")
}

/// Train selection and reveal animation state of the visualization
///
/// Owns at most one running animation timer. Every operation that starts a
/// timer or changes the selection releases the previous timer first.
pub struct VisualizationController<H: TimerHandle> {
    selection: SelectionState,
    animator: RevealAnimator,
    timer: Option<H>,
    presentation_scale: f64,
    initialized: bool,
    next_ticket: u64,
    last_applied: Option<FetchTicket>,
}

impl<H: TimerHandle> VisualizationController<H> {
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self {
            selection: SelectionState::new(),
            animator: RevealAnimator::new(config.step),
            timer: None,
            presentation_scale: config.presentation_scale,
            initialized: false,
            next_ticket: 0,
            last_applied: None,
        }
    }

    /// Hand out the ticket for a fetch that is about to be issued
    pub fn begin_fetch(&mut self) -> FetchTicket {
        let ticket = FetchTicket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    /// Apply the result of the fetch identified by `ticket`
    pub fn apply_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<TrainRecord>, FetchError>,
    ) -> FetchOutcome {
        let trains = match result {
            Ok(trains) => trains,
            Err(e) => {
                leptos::logging::error!("Error fetching train data: {e}");
                return FetchOutcome::Failed;
            }
        };

        if self.last_applied.is_some_and(|last| last >= ticket) {
            dev_log!("Discarding stale train list from fetch {}", ticket.0);
            return FetchOutcome::Stale;
        }
        self.last_applied = Some(ticket);

        let count = trains.len();
        if !self.initialized {
            self.selection.initialize(trains);
            self.initialized = true;
            dev_log!("Loaded {} trains", count);
            return FetchOutcome::Initialized { trains: count };
        }

        let previous_id = self.selection.selected().map(|train| train.id.clone());
        self.selection.replace(trains);
        let current_id = self.selection.selected().map(|train| train.id.as_str());
        if previous_id.as_deref() != current_id {
            // The displayed train changed under a running reveal
            self.cancel_animation();
            self.animator.reset();
        }

        FetchOutcome::Replaced { trains: count }
    }

    /// Show the train with this id, stopping any reveal in progress
    ///
    /// Unknown ids leave the selection unchanged and return `false`.
    pub fn select(&mut self, train_id: &str) -> bool {
        self.cancel_animation();

        if !self.selection.select(train_id) {
            dev_log!("Ignoring selection of unknown train {}", train_id);
            return false;
        }

        self.animator.reset();
        true
    }

    /// Start the reveal of the selected train
    ///
    /// `spawn` creates the periodic timer that will deliver [`Self::tick`] calls
    /// for the given run; returning `None` aborts the run. Does nothing when no
    /// train is selected.
    pub fn animate<F>(&mut self, spawn: F) -> Option<RunId>
    where
        F: FnOnce(RunId) -> Option<H>,
    {
        let start = self.selection.selected()?.scaled_start(self.presentation_scale);

        self.release_timer();
        let run = self.animator.start(start);

        if let Some(handle) = spawn(run) {
            self.timer = Some(handle);
            Some(run)
        } else {
            leptos::logging::error!("Failed to start reveal animation timer");
            self.animator.cancel();
            None
        }
    }

    /// Advance the reveal by one tick of `run`
    pub fn tick(&mut self, run: RunId) -> TickOutcome {
        let outcome = self.animator.tick(run);
        if outcome == TickOutcome::Finished {
            self.release_timer();
        }
        outcome
    }

    /// Stop the reveal in progress, keeping the partially revealed state
    pub fn cancel_animation(&mut self) {
        self.release_timer();
        self.animator.cancel();
    }

    fn release_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.cancel();
        }
    }

    #[must_use]
    pub fn trains(&self) -> &[TrainRecord] {
        self.selection.trains()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&TrainRecord> {
        self.selection.selected()
    }

    #[must_use]
    pub fn hidden_percent(&self) -> f64 {
        self.animator.hidden_percent()
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.timer.is_some() && self.animator.is_running()
    }

    #[must_use]
    pub fn presentation_scale(&self) -> f64 {
        self.presentation_scale
    }

    #[must_use]
    pub fn view_state(&self) -> ViewState {
        ViewState {
            trains: self.selection.trains().to_vec(),
            selected: self.selection.selected().cloned(),
            hidden_percent: self.animator.hidden_percent(),
            is_animating: self.is_animating(),
        }
    }
}

impl<H: TimerHandle> Drop for VisualizationController<H> {
    fn drop(&mut self) {
        self.release_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts live timers so tests can observe overlap
    #[derive(Default)]
    struct TimerLedger {
        live: Cell<usize>,
        max_live: Cell<usize>,
        created: Cell<usize>,
        cancelled: Cell<usize>,
    }

    struct FakeTimer {
        ledger: Rc<TimerLedger>,
    }

    impl FakeTimer {
        fn spawn(ledger: &Rc<TimerLedger>) -> Self {
            ledger.live.set(ledger.live.get() + 1);
            ledger.created.set(ledger.created.get() + 1);
            ledger.max_live.set(ledger.max_live.get().max(ledger.live.get()));
            Self {
                ledger: Rc::clone(ledger),
            }
        }
    }

    impl TimerHandle for FakeTimer {
        fn cancel(self) {
            self.ledger.live.set(self.ledger.live.get() - 1);
            self.ledger.cancelled.set(self.ledger.cancelled.get() + 1);
        }
    }

    fn train(id: &str, start: f64) -> TrainRecord {
        TrainRecord::new(id, start, format!("plots/{id}_bg.png"), format!("plots/{id}.png"))
    }

    fn two_trains() -> Vec<TrainRecord> {
        vec![train("A1", 80.0), train("B2", 80.0)]
    }

    fn loaded_controller() -> VisualizationController<FakeTimer> {
        let mut controller = VisualizationController::new(&AppConfig::default());
        let ticket = controller.begin_fetch();
        controller.apply_fetch(ticket, Ok(two_trains()));
        controller
    }

    fn animate(
        controller: &mut VisualizationController<FakeTimer>,
        ledger: &Rc<TimerLedger>,
    ) -> Option<RunId> {
        controller.animate(|_| Some(FakeTimer::spawn(ledger)))
    }

    #[test]
    fn test_initial_load_selects_first_train() {
        let controller = loaded_controller();
        assert_eq!(controller.selected().map(|t| t.id.as_str()), Some("A1"));
        assert_eq!(controller.trains().len(), 2);
        assert_eq!(controller.hidden_percent(), 0.0);
    }

    #[test]
    fn test_state_is_empty_before_first_fetch() {
        let controller: VisualizationController<FakeTimer> =
            VisualizationController::new(&AppConfig::default());
        assert!(controller.trains().is_empty());
        assert!(controller.selected().is_none());
        assert!(!controller.is_animating());
    }

    #[test]
    fn test_select_resets_reveal() {
        let ledger = Rc::new(TimerLedger::default());
        let mut controller = loaded_controller();
        let run = animate(&mut controller, &ledger).expect("animation starts");
        for _ in 0..10 {
            controller.tick(run);
        }
        assert!(controller.hidden_percent() > 0.0);

        assert!(controller.select("B2"));
        assert_eq!(controller.selected().map(|t| t.id.as_str()), Some("B2"));
        assert_eq!(controller.hidden_percent(), 0.0);
        assert!(!controller.is_animating());
        assert_eq!(ledger.live.get(), 0);
    }

    #[test]
    fn test_select_unknown_id_keeps_selection_but_stops_timer() {
        let ledger = Rc::new(TimerLedger::default());
        let mut controller = loaded_controller();
        let run = animate(&mut controller, &ledger).expect("animation starts");
        controller.tick(run);
        let partial = controller.hidden_percent();

        assert!(!controller.select("Z9"));
        assert_eq!(controller.selected().map(|t| t.id.as_str()), Some("A1"));
        assert_eq!(controller.hidden_percent(), partial);
        assert_eq!(ledger.live.get(), 0);
    }

    #[test]
    fn test_at_most_one_timer_for_any_command_sequence() {
        let ledger = Rc::new(TimerLedger::default());
        let mut controller = loaded_controller();

        let mut last_run = None;
        for step in 0..40 {
            match step % 5 {
                0 | 3 => last_run = animate(&mut controller, &ledger),
                1 => {
                    controller.select("B2");
                }
                2 => {
                    controller.select("A1");
                }
                _ => {
                    if let Some(run) = last_run {
                        controller.tick(run);
                    }
                }
            }
            assert!(ledger.live.get() <= 1, "overlapping timers at step {step}");
        }

        assert_eq!(ledger.max_live.get(), 1);
        assert_eq!(ledger.created.get(), ledger.cancelled.get() + ledger.live.get());
    }

    #[test]
    fn test_animate_replaces_running_timer() {
        let ledger = Rc::new(TimerLedger::default());
        let mut controller = loaded_controller();

        let first = animate(&mut controller, &ledger).expect("first run");
        let second = animate(&mut controller, &ledger).expect("second run");
        assert_ne!(first, second);
        assert_eq!(ledger.created.get(), 2);
        assert_eq!(ledger.cancelled.get(), 1);
        assert_eq!(ledger.live.get(), 1);

        // Late tick from the replaced run must not move the value
        let before = controller.hidden_percent();
        assert_eq!(controller.tick(first), TickOutcome::Ignored);
        assert_eq!(controller.hidden_percent(), before);
    }

    #[test]
    fn test_animate_uses_scaled_start() {
        let ledger = Rc::new(TimerLedger::default());
        let mut controller = loaded_controller();
        animate(&mut controller, &ledger).expect("animation starts");
        assert!((controller.hidden_percent() - 74.4).abs() < 1e-9);
        assert!(controller.is_animating());
    }

    #[test]
    fn test_animate_without_selection_is_noop() {
        let ledger = Rc::new(TimerLedger::default());
        let mut controller: VisualizationController<FakeTimer> =
            VisualizationController::new(&AppConfig::default());
        assert!(animate(&mut controller, &ledger).is_none());
        assert_eq!(ledger.created.get(), 0);
        assert!(!controller.is_animating());
    }

    #[test]
    fn test_animate_aborts_when_timer_cannot_start() {
        let mut controller = loaded_controller();
        assert!(controller.animate(|_| None).is_none());
        assert!(!controller.is_animating());
    }

    #[test]
    fn test_cancel_when_idle_is_noop() {
        let mut controller = loaded_controller();
        controller.cancel_animation();
        controller.cancel_animation();
        assert!(!controller.is_animating());
        assert_eq!(controller.hidden_percent(), 0.0);
    }

    #[test]
    fn test_cancel_mid_flight_keeps_partial_reveal() {
        let ledger = Rc::new(TimerLedger::default());
        let mut controller = loaded_controller();
        let run = animate(&mut controller, &ledger).expect("animation starts");
        for _ in 0..100 {
            controller.tick(run);
        }
        let partial = controller.hidden_percent();
        controller.cancel_animation();
        assert_eq!(controller.hidden_percent(), partial);
        assert_eq!(ledger.live.get(), 0);
    }

    #[test]
    fn test_select_then_animate_runs_to_zero() {
        let ledger = Rc::new(TimerLedger::default());
        let mut controller = loaded_controller();

        assert!(controller.select("B2"));
        assert_eq!(controller.selected().map(|t| t.id.as_str()), Some("B2"));
        assert_eq!(controller.hidden_percent(), 0.0);

        let run = animate(&mut controller, &ledger).expect("animation starts");
        assert!((controller.hidden_percent() - 74.4).abs() < 1e-9);

        let mut ticks = 0;
        while controller.tick(run) != TickOutcome::Finished {
            ticks += 1;
            assert!(ticks < 10_000, "animation never finished");
        }
        ticks += 1;

        assert_eq!(ticks, 1488);
        assert_eq!(controller.hidden_percent(), 0.0);
        assert!(!controller.is_animating());
        assert_eq!(ledger.live.get(), 0);
        assert_eq!(controller.tick(run), TickOutcome::Ignored);
    }

    #[test]
    fn test_failed_fetch_preserves_state() {
        let mut controller = loaded_controller();
        controller.select("B2");

        let ticket = controller.begin_fetch();
        let outcome =
            controller.apply_fetch(ticket, Err(FetchError::Network("offline".to_string())));
        assert_eq!(outcome, FetchOutcome::Failed);
        assert_eq!(controller.trains().len(), 2);
        assert_eq!(controller.selected().map(|t| t.id.as_str()), Some("B2"));
    }

    #[test]
    fn test_failed_first_fetch_leaves_selection_absent() {
        let mut controller: VisualizationController<FakeTimer> =
            VisualizationController::new(&AppConfig::default());
        let ticket = controller.begin_fetch();
        controller.apply_fetch(ticket, Err(FetchError::Decode("bad".to_string())));
        assert!(controller.selected().is_none());

        let ticket = controller.begin_fetch();
        let outcome = controller.apply_fetch(ticket, Ok(two_trains()));
        assert_eq!(outcome, FetchOutcome::Initialized { trains: 2 });
        assert_eq!(controller.selected().map(|t| t.id.as_str()), Some("A1"));
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut controller: VisualizationController<FakeTimer> =
            VisualizationController::new(&AppConfig::default());
        let older = controller.begin_fetch();
        let newer = controller.begin_fetch();

        let outcome = controller.apply_fetch(newer, Ok(two_trains()));
        assert_eq!(outcome, FetchOutcome::Initialized { trains: 2 });

        let outcome = controller.apply_fetch(older, Ok(vec![train("OLD", 10.0)]));
        assert_eq!(outcome, FetchOutcome::Stale);
        assert_eq!(controller.trains().len(), 2);
        assert_eq!(controller.selected().map(|t| t.id.as_str()), Some("A1"));
    }

    #[test]
    fn test_refresh_keeps_selection_and_animation() {
        let ledger = Rc::new(TimerLedger::default());
        let mut controller = loaded_controller();
        controller.select("B2");
        let run = animate(&mut controller, &ledger).expect("animation starts");
        controller.tick(run);

        let ticket = controller.begin_fetch();
        let outcome = controller.apply_fetch(ticket, Ok(vec![train("B2", 50.0), train("C3", 20.0)]));
        assert_eq!(outcome, FetchOutcome::Replaced { trains: 2 });
        assert_eq!(controller.selected().map(|t| t.animation_start), Some(50.0));
        assert!(controller.is_animating());
        assert!(matches!(controller.tick(run), TickOutcome::Advanced(_)));
    }

    #[test]
    fn test_refresh_without_selected_train_stops_animation() {
        let ledger = Rc::new(TimerLedger::default());
        let mut controller = loaded_controller();
        let run = animate(&mut controller, &ledger).expect("animation starts");
        controller.tick(run);

        let ticket = controller.begin_fetch();
        controller.apply_fetch(ticket, Ok(vec![train("C3", 20.0)]));
        assert_eq!(controller.selected().map(|t| t.id.as_str()), Some("C3"));
        assert!(!controller.is_animating());
        assert_eq!(controller.hidden_percent(), 0.0);
        assert_eq!(ledger.live.get(), 0);
        assert_eq!(controller.tick(run), TickOutcome::Ignored);
    }

    #[test]
    fn test_drop_releases_timer() {
        let ledger = Rc::new(TimerLedger::default());
        {
            let mut controller = loaded_controller();
            animate(&mut controller, &ledger).expect("animation starts");
            assert_eq!(ledger.live.get(), 1);
        }
        assert_eq!(ledger.live.get(), 0);
    }

    #[test]
    fn test_view_state_snapshot() {
        let ledger = Rc::new(TimerLedger::default());
        let mut controller = loaded_controller();
        animate(&mut controller, &ledger).expect("animation starts");

        let view = controller.view_state();
        assert_eq!(view.trains.len(), 2);
        assert_eq!(view.selected.map(|t| t.id), Some("A1".to_string()));
        assert!(view.is_animating);
        assert!((view.hidden_percent - 74.4).abs() < 1e-9);
    }

    #[test]
    fn test_clip_path_format() {
        assert_eq!(clip_path(0.0), "inset(0 0% 0 0)");
        assert_eq!(clip_path(12.5), "inset(0 12.5% 0 0)");
        let view = ViewState {
            hidden_percent: 40.0,
            ..ViewState::default()
        };
        assert_eq!(view.foreground_clip_path(), "inset(0 40% 0 0)");
    }
}

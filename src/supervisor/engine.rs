use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{AppConfig, Category};
use crate::errors::{KeeperError, KeeperResult};
use crate::executor::alert::{AlertLevel, Notifier};
use crate::executor::input::InputInjector;
use crate::executor::text_input::{announcement_line, speech_line};
use crate::perception::detector::PresenceDetector;
use crate::perception::types::Coordinate;
use crate::supervisor::loop_control::{is_exhausted, next_delay};
use crate::supervisor::selector;
use crate::supervisor::state::{ActionOutcome, CycleStats, RuntimeState, SupervisorState};

/// The landmark's matched point sits above the control that needs focus.
pub const CLICK_OFFSET: (i32, i32) = (0, 50);

const FOREGROUND_NOTICE: &str = "Make sure the game window is in the foreground!";

/// Cyclic liveness supervisor.
///
/// Each cycle checks the failure threshold, looks for the landmark, reacts to
/// the result and (from `run`) sleeps a jittered interval. All collaborators
/// are borrowed, so the loop is the only caller issuing input while it runs.
pub struct SupervisorLoop<'a, R: Rng> {
    config: &'a AppConfig,
    usable: Vec<Category>,
    detector: PresenceDetector<'a>,
    injector: &'a mut dyn InputInjector,
    notifier: &'a mut dyn Notifier,
    rng: R,
}

impl<'a, R: Rng> SupervisorLoop<'a, R> {
    /// Fails when no dispatchable category has any entry. Empty categories are
    /// left out of the per-cycle draw.
    pub fn new(
        config: &'a AppConfig,
        detector: PresenceDetector<'a>,
        injector: &'a mut dyn InputInjector,
        notifier: &'a mut dyn Notifier,
        rng: R,
    ) -> KeeperResult<Self> {
        let usable = config.actions.usable_categories();
        for category in Category::DISPATCHABLE {
            if !usable.contains(&category) {
                tracing::warn!(%category, "action category is empty; it will never be drawn");
            }
        }
        if usable.is_empty() {
            return Err(KeeperError::Config(format!(
                "no usable actions in {}: skill, move and speak are all empty",
                config.path.display()
            )));
        }
        Ok(Self {
            config,
            usable,
            detector,
            injector,
            notifier,
            rng,
        })
    }

    /// One state-machine traversal, without the trailing sleep.
    pub fn run_cycle(&mut self, state: RuntimeState) -> KeeperResult<(RuntimeState, ActionOutcome)> {
        let config: &'a AppConfig = self.config;
        let misc = &config.actions.misc;
        let threshold = misc.failure_threshold;

        if is_exhausted(&state, threshold) {
            let message = format!(
                "Checked {} times, landmark not found on the current screen! Giving up.",
                state.failures
            );
            self.notifier.alert(AlertLevel::Error, "Error", &message);
            tracing::error!(failures = state.failures, threshold, "{message}");
            return Ok((state, ActionOutcome::Exit));
        }

        match self.detector.locate(&config.template)? {
            None => {
                let next = state.record_miss();
                tracing::info!(
                    failures = next.failures,
                    threshold,
                    key = %misc.liveness_key,
                    "Searching → Searching: miss, re-opening landmark panel"
                );
                if let Err(e) = self.injector.press_key(&misc.liveness_key) {
                    tracing::warn!(error = %e, key = %misc.liveness_key, "liveness key press failed");
                }
                Ok((next, ActionOutcome::Retry))
            }
            Some(at) => {
                tracing::info!(
                    state = ?SupervisorState::ActingOnSuccess { at },
                    previous_failures = state.failures,
                    "Searching → ActingOnSuccess"
                );
                self.act_on_success(at);
                Ok((state.record_success(), ActionOutcome::Success(at)))
            }
        }
    }

    fn act_on_success(&mut self, at: Coordinate) {
        let target = at.offset(CLICK_OFFSET.0, CLICK_OFFSET.1);
        if let Err(e) = self.injector.double_click(target) {
            tracing::warn!(error = %e, %target, "settling click failed");
        }

        let config: &'a AppConfig = self.config;
        let actions = &config.actions;
        let Some(&category) = self.usable.choose(&mut self.rng) else {
            return;
        };
        let Some((key, value)) = actions
            .table(category)
            .and_then(|table| selector::choose(table, &mut self.rng))
        else {
            tracing::warn!(%category, "drew an empty action table; skipping this cycle's action");
            return;
        };

        tracing::info!(%category, key = %key, value = %value, "dispatching action");
        if let Err(e) = self.dispatch(category, key, value) {
            tracing::warn!(error = %e, %category, key = %key, "action dispatch failed");
        }
    }

    fn dispatch(&mut self, category: Category, key: &str, value: &str) -> KeeperResult<()> {
        let announce = self.config.announce;
        match category {
            Category::Speak => self.injector.paste_and_submit(&speech_line(value, announce)),
            _ => {
                if announce {
                    self.injector
                        .paste_and_submit(&announcement_line(category, value))?;
                }
                self.injector.press_key(key)
            }
        }
    }

    /// Cycles until the failure threshold is reached.
    pub async fn run(mut self) -> KeeperResult<CycleStats> {
        self.notifier.alert(AlertLevel::Notice, "Note", FOREGROUND_NOTICE);

        let mut state = RuntimeState::default();
        let mut stats = CycleStats::default();
        loop {
            let (next, outcome) = self.run_cycle(state)?;
            state = next;
            stats.record(outcome);

            if outcome.next_state() == SupervisorState::Exhausted {
                tracing::info!(
                    cycles = stats.cycles,
                    successes = stats.successes,
                    misses = stats.misses,
                    "supervision loop exhausted"
                );
                return Ok(stats);
            }

            let delay = next_delay(self.config.actions.misc.base_delay_secs, &mut self.rng);
            tracing::debug!(secs = delay.as_secs(), failures = state.failures, "action sleep");
            tokio::time::sleep(delay).await;
        }
    }
}

use crate::perception::types::Coordinate;

/// Where the supervision loop is within one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Searching,
    ActingOnSuccess { at: Coordinate },
    /// Terminal: the failure threshold was reached.
    Exhausted,
}

/// Result of one cycle's liveness evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Exit,
    Retry,
    Success(Coordinate),
}

impl ActionOutcome {
    /// State the loop is in once this outcome has been handled.
    pub fn next_state(&self) -> SupervisorState {
        match self {
            ActionOutcome::Exit => SupervisorState::Exhausted,
            ActionOutcome::Retry | ActionOutcome::Success(_) => SupervisorState::Searching,
        }
    }
}

/// Cycle-scoped record threaded through every `run_cycle` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeState {
    /// Consecutive liveness misses.
    pub failures: u32,
}

impl RuntimeState {
    pub fn record_miss(self) -> Self {
        Self {
            failures: self.failures.saturating_add(1),
        }
    }

    pub fn record_success(self) -> Self {
        Self { failures: 0 }
    }
}

/// Totals reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: u64,
    pub successes: u64,
    pub misses: u64,
}

impl CycleStats {
    pub fn record(&mut self, outcome: ActionOutcome) {
        self.cycles += 1;
        match outcome {
            ActionOutcome::Success(_) => self.successes += 1,
            ActionOutcome::Retry => self.misses += 1,
            ActionOutcome::Exit => {}
        }
    }
}

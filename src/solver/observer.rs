use crate::types::{ClassId, ClassroomId, PeriodId, SolveStatus, TeacherId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Poll-style cancellation flag shared between the solver and its caller.
/// Cloning hands out another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Cancellation and deadline state checked at the top of every recursion
pub struct SearchControl {
    cancel: CancelToken,
    deadline: Option<Instant>,
}

impl SearchControl {
    pub fn new(cancel: CancelToken, timeout: Option<Duration>) -> Self {
        Self {
            cancel,
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }

    /// The halt status to surface, if the run should stop now
    pub fn poll(&self) -> Option<SolveStatus> {
        if self.cancel.is_cancelled() {
            return Some(SolveStatus::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Some(SolveStatus::Timeout);
            }
        }
        None
    }
}

/// Injected progress interface; the solver never talks to a UI directly
pub trait SolverObserver {
    /// Called after each variable decision
    fn on_progress(&mut self, _assigned: usize, _total: usize, _backtracks: u64) {}

    /// Called when a class-period is placed
    fn on_decision(
        &mut self,
        _class: ClassId,
        _period: PeriodId,
        _teacher: TeacherId,
        _room: ClassroomId,
    ) {
    }
}

/// Observer that ignores everything
pub struct NullObserver;

impl SolverObserver for NullObserver {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let handle = token.clone();
        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn control_reports_timeout_after_deadline() {
        let control = SearchControl::new(CancelToken::new(), Some(Duration::ZERO));
        assert_eq!(control.poll(), Some(SolveStatus::Timeout));
    }

    #[test]
    fn cancel_wins_over_deadline() {
        let token = CancelToken::new();
        token.cancel();
        let control = SearchControl::new(token, Some(Duration::ZERO));
        assert_eq!(control.poll(), Some(SolveStatus::Cancelled));
    }
}

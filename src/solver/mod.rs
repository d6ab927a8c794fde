//! Timetable constraint-satisfaction solver.
//!
//! Specializes the backtracking search to the timetabling domain: one
//! variable per class-period, values drawn from three coupled domains
//! (period, teacher, room) with per-period resource availability. The
//! entity store is read-only during a solve; results are committed through
//! the sink only on a complete solution.

mod constraints;
mod observer;
mod timetable_csp;
mod variables;

pub use constraints::*;
pub use observer::*;
pub use timetable_csp::*;
pub use variables::*;

use crate::error::TimetableError;
use crate::sink;
use crate::store::EntityStore;
use crate::types::{ReportMetadata, SolveOutcome, SolveReport, SolveStatus, YearId};
use log::info;
use std::time::{Duration, Instant};

/// Knobs for one solver run
#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Most-Constrained-Variable selection heuristic
    pub mcv: bool,
    /// Forward checking plus a pre-search AC-3 pass over period domains
    pub fc: bool,
    pub seed: u64,
    pub timeout: Option<Duration>,
    /// Global contact-period cap per teacher; None means unlimited
    pub teacher_max_load: Option<u32>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            mcv: false,
            fc: false,
            seed: 0,
            timeout: None,
            teacher_max_load: None,
        }
    }
}

/// Solve one year's timetable. Existing placements for the year are removed
/// up front; a `Solved` run commits the new ones atomically through the
/// sink, any other terminal status leaves the store without placements for
/// the year. Exactly one status is returned per run.
pub fn solve_year(
    store: &mut EntityStore,
    year: YearId,
    options: &SolveOptions,
    cancel: &CancelToken,
    observer: &mut dyn SolverObserver,
) -> Result<SolveOutcome, TimetableError> {
    let start = Instant::now();
    store
        .year(year)
        .ok_or(TimetableError::UnknownReference {
            kind: "year",
            id: year.0,
            referrer: "solve".to_string(),
        })?;
    store.clear_placements(year);

    let problem = build_problem(store, year, options)?;
    let variables = problem.vars.len();
    info!(
        "solving year {year}: {variables} class-periods, {} constraints, mcv={} fc={}",
        problem.constraints.len(),
        options.mcv,
        options.fc
    );

    let mut csp = TimetableCsp::new(
        problem,
        store.period_ids(),
        store.teacher_ids(),
        store.classroom_ids(),
        options.seed,
    );
    let control = SearchControl::new(cancel.clone(), options.timeout);
    let outcome = csp.search(options.mcv, options.fc, &control, observer);

    let status = match outcome {
        SearchOutcome::Complete => SolveStatus::Solved,
        SearchOutcome::Exhausted => SolveStatus::Unsolvable,
        SearchOutcome::Halted(status) => status,
    };
    let placements = csp.placements();
    let report = SolveReport {
        status,
        variables,
        assigned: csp.assigned(),
        backtracks: csp.num_backtracks,
        assigns: csp.num_assigns,
        elapsed_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "year {year} {status}: {}/{} assigned, {} backtracks in {}ms",
        report.assigned, report.variables, report.backtracks, report.elapsed_ms
    );

    if status == SolveStatus::Solved {
        sink::commit(store, year, placements.clone())?;
    }

    Ok(SolveOutcome {
        report,
        placements,
        metadata: ReportMetadata::default(),
    })
}

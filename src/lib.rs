//! Timetable Solver - backtracking CSP school timetable generator
//!
//! This library builds a school timetable in two stages:
//! 1. **Curriculum construction**: decompose each year's cohort into
//!    subject blocks, sets and classes sized to teacher supply and ideal
//!    room capacity.
//! 2. **Constraint-satisfaction scheduling**: assign every class-period a
//!    (period, teacher, room) triple by staged backtracking search, with
//!    optional forward checking, AC-3 arc consistency and the
//!    Most-Constrained-Variable heuristic.
//!
//! The in-memory entity store is the single source of truth; solvers read a
//! snapshot and commit results atomically through the sink.
//!
//! # Example
//!
//! ```no_run
//! use timetable_solver::parser::{build_store, load_input_from_dir};
//! use timetable_solver::curriculum::build_curriculum;
//! use timetable_solver::solver::{solve_year, CancelToken, NullObserver, SolveOptions};
//! use timetable_solver::types::YearId;
//! use std::path::Path;
//!
//! let input = load_input_from_dir(Path::new("./data/demo")).unwrap();
//! let mut store = build_store(&input).unwrap();
//! build_curriculum(&mut store, YearId(1)).unwrap();
//! let outcome = solve_year(
//!     &mut store,
//!     YearId(1),
//!     &SolveOptions::default(),
//!     &CancelToken::new(),
//!     &mut NullObserver,
//! )
//! .unwrap();
//! println!("{}", outcome.report.status);
//! ```

pub mod csp;
pub mod curriculum;
pub mod error;
pub mod parser;
pub mod reporter;
pub mod sink;
pub mod solver;
pub mod store;
pub mod types;

pub use error::{Result, TimetableError};

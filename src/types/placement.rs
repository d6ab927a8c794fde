use serde::{Deserialize, Serialize};
use super::{ClassId, ClassroomId, PeriodId, SubjectId, TeacherId, YearId};

/// The solver's output unit: one class meeting in one period, under one
/// teacher, in one room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub period: PeriodId,
    pub class: ClassId,
    pub teacher: TeacherId,
    pub classroom: ClassroomId,
}

/// Terminal status of one solver run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Solved,
    Unsolvable,
    Cancelled,
    Timeout,
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SolveStatus::Solved => "solved",
            SolveStatus::Unsolvable => "unsolvable",
            SolveStatus::Cancelled => "cancelled",
            SolveStatus::Timeout => "timeout",
        };
        write!(f, "{name}")
    }
}

/// Metadata about a generated report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub algorithm_version: String,
}

impl Default for ReportMetadata {
    fn default() -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Counters and status for one solver run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveReport {
    pub status: SolveStatus,
    /// Class-period variables in the problem
    pub variables: usize,
    /// Variables holding a value when the run ended
    pub assigned: usize,
    pub backtracks: u64,
    pub assigns: u64,
    pub elapsed_ms: u64,
}

/// A solver run's full result: the report plus the (possibly partial)
/// assignment as placements. Placements are only committed to the store on
/// `Solved`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveOutcome {
    pub report: SolveReport,
    pub placements: Vec<Placement>,
    #[serde(default)]
    pub metadata: ReportMetadata,
}

impl SolveOutcome {
    pub fn is_solved(&self) -> bool {
        self.report.status == SolveStatus::Solved
    }
}

/// A subject the curriculum builder had to leave out of a year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedSubject {
    pub subject: SubjectId,
    pub reason: String,
}

/// What the curriculum builder materialized for one year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumSummary {
    pub year: YearId,
    pub blocks: usize,
    pub sets: usize,
    pub classes: usize,
    /// Subjects skipped for lack of teachers
    pub skipped: Vec<SkippedSubject>,
}

impl CurriculumSummary {
    pub fn empty(year: YearId) -> Self {
        Self {
            year,
            blocks: 0,
            sets: 0,
            classes: 0,
            skipped: Vec::new(),
        }
    }
}

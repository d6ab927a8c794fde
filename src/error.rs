use thiserror::Error;

/// Domain-specific errors for the timetable solver
#[derive(Error, Debug)]
pub enum TimetableError {
    // Input/Parse errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON in '{file}': {message}")]
    JsonParse { file: String, message: String },

    #[error("Failed to parse config in '{file}': {message}")]
    ConfigParse { file: String, message: String },

    // Store integrity errors
    #[error("Duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u32 },

    #[error("Duplicate subject {field} '{value}'")]
    DuplicateSubject { field: &'static str, value: String },

    #[error("{kind} {id} referenced by {referrer} does not exist")]
    UnknownReference {
        kind: &'static str,
        id: u32,
        referrer: String,
    },

    #[error("Placement conflict: {0}")]
    PlacementConflict(String),

    // Configuration errors (abort the year's build/solve)
    #[error("No classrooms defined, cannot derive an ideal class size")]
    NoClassrooms,

    #[error("Subject '{subject}' has no qualified teachers")]
    NoTeachers { subject: String },

    #[error("Subject '{subject}' has no supporting classrooms")]
    NoRooms { subject: String },

    // Post-solve assertion failures (solver bugs)
    #[error("Solved assignment violates {invariant}: {message}")]
    InvariantViolation {
        invariant: &'static str,
        message: String,
    },
}

impl TimetableError {
    /// Errors that mean the input data cannot support a build/solve at all,
    /// as opposed to integrity or internal failures.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            TimetableError::NoClassrooms
                | TimetableError::NoTeachers { .. }
                | TimetableError::NoRooms { .. }
        )
    }
}

/// Use anyhow::Result at application boundaries
pub type Result<T> = anyhow::Result<T>;

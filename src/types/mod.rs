mod year;
mod subject;
mod teacher;
mod classroom;
mod student;
mod period;
mod curriculum;
mod placement;

pub use year::*;
pub use subject::*;
pub use teacher::*;
pub use classroom::*;
pub use student::*;
pub use period::*;
pub use curriculum::*;
pub use placement::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a `u32` newtype identifier with the shared derive set and a
/// `Display` impl. Every entity is addressed by one of these rather than by
/// reference, so records can relate to each other without ownership cycles.
macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier for a year group
    YearId
);
entity_id!(
    /// Identifier for a subject
    SubjectId
);
entity_id!(
    /// Identifier for a teacher
    TeacherId
);
entity_id!(
    /// Identifier for a classroom
    ClassroomId
);
entity_id!(
    /// Identifier for a student
    StudentId
);
entity_id!(
    /// Identifier for a period in the cycle
    PeriodId
);
entity_id!(
    /// Identifier for a block of concurrently taught sets
    BlockId
);
entity_id!(
    /// Identifier for a set within a block
    SetId
);
entity_id!(
    /// Identifier for a class, the unit the solver places
    ClassId
);

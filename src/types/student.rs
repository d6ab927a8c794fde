use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use super::{StudentId, SubjectId, YearId};

/// A student, attached to a year and carrying their option choices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub year: YearId,
    /// Option subjects the student has elected
    #[serde(default)]
    pub option_subjects: BTreeSet<SubjectId>,
}

impl Student {
    /// Check if the student has chosen a particular option
    pub fn takes_option(&self, subject: SubjectId) -> bool {
        self.option_subjects.contains(&subject)
    }
}

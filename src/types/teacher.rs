use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use super::{SubjectId, TeacherId};

/// A teacher with their subject competencies and contact-time limit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    /// Short staff code (e.g. "JSM")
    pub code: String,
    pub name: String,
    /// Subjects this teacher is qualified to teach
    #[serde(default)]
    pub subjects: BTreeSet<SubjectId>,
    /// Maximum contact periods per cycle; None means unlimited
    #[serde(default)]
    pub max_periods: Option<u32>,
}

impl Teacher {
    /// Check if the teacher can teach a given subject
    pub fn can_teach(&self, subject: SubjectId) -> bool {
        self.subjects.contains(&subject)
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use super::{ClassroomId, SubjectId};

/// A physical classroom
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classroom {
    pub id: ClassroomId,
    pub name: String,
    pub capacity: u32,
    /// Subjects this room is equipped for
    #[serde(default)]
    pub subjects: BTreeSet<SubjectId>,
}

impl Classroom {
    /// Check if the room supports a given subject
    pub fn supports(&self, subject: SubjectId) -> bool {
        self.subjects.contains(&subject)
    }
}

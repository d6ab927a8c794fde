use serde::{Deserialize, Serialize};
use super::SubjectId;

/// A subject on the school's curriculum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    /// Short code used in class names (e.g. "Ma")
    pub code: String,
    pub name: String,
}

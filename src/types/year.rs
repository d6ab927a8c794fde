use serde::{Deserialize, Serialize};
use super::{SubjectId, YearId};

/// A subject taught to a year, with its weekly demand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offering {
    pub subject: SubjectId,
    /// Periods this subject needs per cycle; 0 means not actually taught
    pub periods_per_cycle: u32,
    /// Elective rather than core
    #[serde(default)]
    pub is_option: bool,
}

/// A year group (cohort) and the subjects it studies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Year {
    pub id: YearId,
    pub name: String,
    /// Numeric year value (e.g. 7 for Year 7)
    pub value: u32,
    /// Whether students in this year choose option subjects
    #[serde(default)]
    pub has_options: bool,
    /// Overrides the classroom-derived ideal class size when set
    #[serde(default)]
    pub ideal_class_size: Option<u32>,
    #[serde(default)]
    pub offerings: Vec<Offering>,
}

impl Year {
    /// The offering for a subject, if the year studies it
    pub fn offering(&self, subject: SubjectId) -> Option<&Offering> {
        self.offerings.iter().find(|o| o.subject == subject)
    }
}

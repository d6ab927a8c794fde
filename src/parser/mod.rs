mod json;
mod validation;

pub use json::*;
pub use validation::*;

use crate::types::{Classroom, CycleConfig, Student, Subject, Teacher, Year};

/// All input data bundled together, as read from a data directory
#[derive(Debug)]
pub struct TimetableInput {
    pub years: Vec<Year>,
    pub subjects: Vec<Subject>,
    pub teachers: Vec<Teacher>,
    pub classrooms: Vec<Classroom>,
    pub students: Vec<Student>,
    pub cycle: CycleConfig,
}

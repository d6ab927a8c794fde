use crate::error::Result;
use crate::parser::TimetableInput;
use crate::types::{SubjectId, YearId};
use std::collections::HashSet;

/// Validation result with collected errors and warnings
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
}

/// Validate all input data before it goes anywhere near the store. Errors
/// are structural (duplicates, dangling references); warnings flag supply
/// problems the builder and solver will classify properly later.
pub fn validate_input(input: &TimetableInput) -> Result<ValidationResult> {
    let mut result = ValidationResult::default();

    let subject_ids: HashSet<SubjectId> = input.subjects.iter().map(|s| s.id).collect();
    let year_ids: HashSet<YearId> = input.years.iter().map(|y| y.id).collect();

    check_duplicates(input.subjects.iter().map(|s| s.id.0), "subject", &mut result);
    check_duplicates(input.years.iter().map(|y| y.id.0), "year", &mut result);
    check_duplicates(input.teachers.iter().map(|t| t.id.0), "teacher", &mut result);
    check_duplicates(
        input.classrooms.iter().map(|r| r.id.0),
        "classroom",
        &mut result,
    );
    check_duplicates(input.students.iter().map(|s| s.id.0), "student", &mut result);

    for year in &input.years {
        for offering in &year.offerings {
            if !subject_ids.contains(&offering.subject) {
                result.add_error(format!(
                    "Year '{}' offers unknown subject {}",
                    year.name, offering.subject
                ));
            }
        }
    }

    for teacher in &input.teachers {
        for subject in &teacher.subjects {
            if !subject_ids.contains(subject) {
                result.add_warning(format!(
                    "Teacher '{}' lists unknown subject {subject}",
                    teacher.code
                ));
            }
        }
    }

    for student in &input.students {
        if !year_ids.contains(&student.year) {
            result.add_error(format!(
                "Student '{}' references unknown year {}",
                student.name, student.year
            ));
        }
        for subject in &student.option_subjects {
            if !subject_ids.contains(subject) {
                result.add_error(format!(
                    "Student '{}' chose unknown subject {subject}",
                    student.name
                ));
            }
        }
    }

    // supply warnings: each taught subject needs teachers and rooms
    for year in &input.years {
        for offering in year.offerings.iter().filter(|o| o.periods_per_cycle > 0) {
            let code = input
                .subjects
                .iter()
                .find(|s| s.id == offering.subject)
                .map(|s| s.code.as_str())
                .unwrap_or("?");
            if !input
                .teachers
                .iter()
                .any(|t| t.subjects.contains(&offering.subject))
            {
                result.add_warning(format!(
                    "Subject '{code}' taught in year '{}' has no qualified teachers",
                    year.name
                ));
            }
            if !input
                .classrooms
                .iter()
                .any(|r| r.subjects.contains(&offering.subject))
            {
                result.add_warning(format!(
                    "Subject '{code}' taught in year '{}' has no supporting classrooms",
                    year.name
                ));
            }
        }
    }

    if input.classrooms.is_empty() {
        result.add_warning("No classrooms defined".to_string());
    }

    if !result.is_valid() {
        return Err(anyhow::anyhow!(
            "Validation failed with {} errors:\n{}",
            result.errors.len(),
            result.errors.join("\n")
        ));
    }

    Ok(result)
}

fn check_duplicates(
    ids: impl Iterator<Item = u32>,
    kind: &str,
    result: &mut ValidationResult,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            result.add_error(format!("Duplicate {kind} id {id}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CycleConfig, Offering, Student, StudentId, Subject, Year};

    fn minimal_input() -> TimetableInput {
        TimetableInput {
            years: vec![Year {
                id: YearId(1),
                name: "7".to_string(),
                value: 7,
                has_options: false,
                ideal_class_size: None,
                offerings: vec![Offering {
                    subject: SubjectId(1),
                    periods_per_cycle: 2,
                    is_option: false,
                }],
            }],
            subjects: vec![Subject {
                id: SubjectId(1),
                code: "Ma".to_string(),
                name: "Maths".to_string(),
            }],
            teachers: Vec::new(),
            classrooms: Vec::new(),
            students: Vec::new(),
            cycle: CycleConfig::default(),
        }
    }

    #[test]
    fn missing_supply_is_a_warning_not_an_error() {
        let input = minimal_input();
        let result = validate_input(&input).unwrap();
        assert!(result.is_valid());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("no qualified teachers")));
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("no supporting classrooms")));
    }

    #[test]
    fn dangling_offering_is_an_error() {
        let mut input = minimal_input();
        input.years[0].offerings.push(Offering {
            subject: SubjectId(99),
            periods_per_cycle: 1,
            is_option: false,
        });
        assert!(validate_input(&input).is_err());
    }

    #[test]
    fn duplicate_student_ids_are_rejected() {
        let mut input = minimal_input();
        for _ in 0..2 {
            input.students.push(Student {
                id: StudentId(7),
                name: "Twin".to_string(),
                year: YearId(1),
                option_subjects: Default::default(),
            });
        }
        assert!(validate_input(&input).is_err());
    }
}

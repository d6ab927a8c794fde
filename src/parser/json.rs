use crate::error::{Result, TimetableError};
use crate::parser::TimetableInput;
use crate::store::EntityStore;
use crate::types::{Classroom, CycleConfig, Student, Subject, Teacher, Year};
use std::fs;
use std::path::Path;

/// Load all input data from a directory of per-kind JSON files plus an
/// optional `config.toml` with the cycle dimensions
pub fn load_input_from_dir(dir: &Path) -> Result<TimetableInput> {
    let subjects: Vec<Subject> = load_json_file(&dir.join("subjects.json"))?;
    let years: Vec<Year> = load_json_file(&dir.join("years.json"))?;
    let teachers: Vec<Teacher> = load_json_file(&dir.join("teachers.json"))?;
    let classrooms: Vec<Classroom> = load_json_file(&dir.join("classrooms.json"))?;
    let students: Vec<Student> = load_json_file(&dir.join("students.json"))?;
    let cycle = load_cycle_or_default(&dir.join("config.toml"))?;

    Ok(TimetableInput {
        years,
        subjects,
        teachers,
        classrooms,
        students,
        cycle,
    })
}

/// Load the cycle config from a TOML file, or fall back to the 5x5x2 default
pub fn load_cycle_or_default(path: &Path) -> Result<CycleConfig> {
    if !path.exists() {
        return Ok(CycleConfig::default());
    }
    let content = fs::read_to_string(path).map_err(|e| TimetableError::FileRead {
        path: path.display().to_string(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| {
        TimetableError::ConfigParse {
            file: path.display().to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Populate an entity store from parsed input. Referential order matters:
/// subjects first, then everything that points at them.
pub fn build_store(input: &TimetableInput) -> Result<EntityStore> {
    let mut store = EntityStore::new();
    for subject in &input.subjects {
        store.add_subject(subject.clone())?;
    }
    for year in &input.years {
        store.add_year(year.clone())?;
    }
    for teacher in &input.teachers {
        store.add_teacher(teacher.clone())?;
    }
    for classroom in &input.classrooms {
        store.add_classroom(classroom.clone())?;
    }
    for student in &input.students {
        store.add_student(student.clone())?;
    }
    store.init_periods(&input.cycle);
    Ok(store)
}

/// Generic JSON file loader
fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let path_str = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| TimetableError::FileRead {
        path: path_str.clone(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| {
        TimetableError::JsonParse {
            file: path_str,
            message: e.to_string(),
        }
        .into()
    })
}

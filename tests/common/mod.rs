//! Shared fixture builders for the end-to-end scenario tests

use std::collections::BTreeSet;
use timetable_solver::store::EntityStore;
use timetable_solver::types::{
    Classroom, ClassroomId, CycleConfig, Offering, Student, StudentId, Subject, SubjectId,
    Teacher, TeacherId, Year, YearId,
};

pub fn subject(id: u32, code: &str) -> Subject {
    Subject {
        id: SubjectId(id),
        code: code.to_string(),
        name: format!("Subject {code}"),
    }
}

pub fn offering(subject: u32, periods: u32) -> Offering {
    Offering {
        subject: SubjectId(subject),
        periods_per_cycle: periods,
        is_option: false,
    }
}

pub fn year(id: u32, name: &str, offerings: Vec<Offering>) -> Year {
    Year {
        id: YearId(id),
        name: name.to_string(),
        value: 7,
        has_options: false,
        ideal_class_size: None,
        offerings,
    }
}

pub fn teacher(id: u32, subjects: &[u32]) -> Teacher {
    Teacher {
        id: TeacherId(id),
        code: format!("T{id}"),
        name: format!("Teacher {id}"),
        subjects: subjects.iter().map(|&s| SubjectId(s)).collect(),
        max_periods: None,
    }
}

pub fn room(id: u32, capacity: u32, subjects: &[u32]) -> Classroom {
    Classroom {
        id: ClassroomId(id),
        name: format!("R{id}"),
        capacity,
        subjects: subjects.iter().map(|&s| SubjectId(s)).collect(),
    }
}

pub fn students(store: &mut EntityStore, year: u32, count: u32) {
    for id in 1..=count {
        store
            .add_student(Student {
                id: StudentId(id),
                name: format!("Student {id}"),
                year: YearId(year),
                option_subjects: BTreeSet::new(),
            })
            .unwrap();
    }
}

pub fn cycle(periods_per_day: u32, days_per_week: u32, weeks_per_cycle: u32) -> CycleConfig {
    CycleConfig {
        periods_per_day,
        days_per_week,
        weeks_per_cycle,
    }
}

/// Scenario fixture: one year, two subjects with two teachers and two
/// shared rooms, a cohort large enough for two parallel classes per
/// subject, four periods in the cycle
pub fn two_band_school() -> EntityStore {
    let mut store = EntityStore::new();
    store.add_subject(subject(1, "Ma")).unwrap();
    store.add_subject(subject(2, "En")).unwrap();
    store
        .add_year(year(1, "7", vec![offering(1, 1), offering(2, 1)]))
        .unwrap();
    store.add_teacher(teacher(1, &[1])).unwrap();
    store.add_teacher(teacher(2, &[1])).unwrap();
    store.add_teacher(teacher(3, &[2])).unwrap();
    store.add_teacher(teacher(4, &[2])).unwrap();
    store.add_classroom(room(1, 15, &[1, 2])).unwrap();
    store.add_classroom(room(2, 15, &[1, 2])).unwrap();
    students(&mut store, 1, 30);
    store.init_periods(&cycle(4, 1, 1));
    store
}

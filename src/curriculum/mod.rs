//! Curriculum builder: decomposes a year's cohort into blocks, sets and
//! classes sized to teacher supply and room capacity.
//!
//! Each taught subject becomes one block. Within a block the needed classes
//! are split across sets so that no set holds more classes than the subject
//! has teachers, since all classes of a set meet concurrently under distinct
//! teachers. Re-running for a year first cascade-deletes its previous
//! structure, so the build is idempotent.

use crate::error::TimetableError;
use crate::store::EntityStore;
use crate::types::{block_name, CurriculumSummary, SetKind, SkippedSubject, YearId};
use itertools::Itertools;
use log::{info, warn};
use std::cmp::Reverse;

/// Materialize the block/set/class structure for one year.
///
/// Subjects without any qualified teacher are skipped and logged in the
/// summary; a school without classrooms cannot be sized at all and aborts.
pub fn build_curriculum(
    store: &mut EntityStore,
    year: YearId,
) -> Result<CurriculumSummary, TimetableError> {
    let year_rec = store
        .year(year)
        .ok_or(TimetableError::UnknownReference {
            kind: "year",
            id: year.0,
            referrer: "curriculum build".to_string(),
        })?
        .clone();
    store.clear_curriculum(year);

    let capacities = store.classroom_capacities();
    if capacities.count == 0 {
        return Err(TimetableError::NoClassrooms);
    }
    let ideal_class_size = year_rec
        .ideal_class_size
        .unwrap_or_else(|| capacities.mean.round() as u32)
        .max(1);

    let num_students = store.students_in(year).len() as u32;
    if num_students == 0 {
        return Ok(CurriculumSummary::empty(year));
    }
    let num_classes = num_students.div_ceil(ideal_class_size);
    info!(
        "year '{}': {num_students} students, ideal size {ideal_class_size}, {num_classes} classes per subject",
        year_rec.name
    );

    // taught subjects annotated with teacher supply, best-supplied first
    let taught = year_rec
        .offerings
        .iter()
        .filter(|o| o.periods_per_cycle > 0)
        .map(|o| (o, store.teachers_of(o.subject).len() as u32))
        .sorted_by_key(|&(o, supply)| (Reverse(supply), o.subject))
        .collect::<Vec<_>>();

    let mut summary = CurriculumSummary::empty(year);
    let mut ordinal = 0;
    for (offering, supply) in taught {
        let subject_code = store
            .subject(offering.subject)
            .map(|s| s.code.clone())
            .unwrap_or_else(|| offering.subject.to_string());
        if supply == 0 {
            warn!(
                "year '{}': no teachers for '{subject_code}', subject skipped",
                year_rec.name
            );
            summary.skipped.push(SkippedSubject {
                subject: offering.subject,
                reason: format!("no qualified teachers for '{subject_code}'"),
            });
            continue;
        }

        ordinal += 1;
        let block = store.create_block(year, block_name(ordinal), ordinal)?;
        let kind = if offering.is_option {
            SetKind::Option
        } else {
            SetKind::Core
        };
        let num_sets = num_classes.div_ceil(supply);
        let mut class_counter = 0;
        for (index, set_classes) in split_evenly(num_classes, num_sets).into_iter().enumerate() {
            let set = store.create_set(block, offering.subject, index as u32 + 1, kind)?;
            for _ in 0..set_classes {
                class_counter += 1;
                let name = class_name(&year_rec.name, &subject_code, class_counter);
                store.create_class(set, name, class_counter, offering.periods_per_cycle)?;
            }
            summary.sets += 1;
            summary.classes += set_classes as usize;
        }
        summary.blocks += 1;
    }

    Ok(summary)
}

/// Build curricula for every year in the store. Configuration errors abort
/// only the year they concern.
pub fn build_all_curricula(
    store: &mut EntityStore,
) -> Vec<(YearId, Result<CurriculumSummary, TimetableError>)> {
    let years: Vec<YearId> = store.years().map(|y| y.id).collect();
    years
        .into_iter()
        .map(|year| (year, build_curriculum(store, year)))
        .collect()
}

/// "{year_name}/{subject_code}{NN}" with a 2-digit zero-padded counter
fn class_name(year_name: &str, subject_code: &str, counter: u32) -> String {
    format!("{year_name}/{subject_code}{counter:02}")
}

/// Split `num` into `parts` values as close to equal as possible, larger
/// values first
fn split_evenly(num: u32, parts: u32) -> Vec<u32> {
    let quotient = num / parts;
    let remainder = num % parts;
    (0..parts)
        .map(|i| if i < remainder { quotient + 1 } else { quotient })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Classroom, ClassroomId, Offering, SetKind, Student, StudentId, Subject, SubjectId,
        Teacher, TeacherId, Year,
    };

    fn base_store(offerings: Vec<Offering>) -> EntityStore {
        let mut store = EntityStore::new();
        store
            .add_subject(Subject {
                id: SubjectId(1),
                code: "Ma".to_string(),
                name: "Maths".to_string(),
            })
            .unwrap();
        store
            .add_subject(Subject {
                id: SubjectId(2),
                code: "En".to_string(),
                name: "English".to_string(),
            })
            .unwrap();
        store
            .add_year(Year {
                id: YearId(1),
                name: "7".to_string(),
                value: 7,
                has_options: false,
                ideal_class_size: None,
                offerings,
            })
            .unwrap();
        store
    }

    fn add_teachers(store: &mut EntityStore, subject: SubjectId, ids: &[u32]) {
        for &id in ids {
            store
                .add_teacher(Teacher {
                    id: TeacherId(id),
                    code: format!("T{id}"),
                    name: format!("Teacher {id}"),
                    subjects: [subject].into(),
                    max_periods: None,
                })
                .unwrap();
        }
    }

    fn add_rooms(store: &mut EntityStore, capacity: u32, count: u32) {
        for id in 1..=count {
            store
                .add_classroom(Classroom {
                    id: ClassroomId(id),
                    name: format!("R{id}"),
                    capacity,
                    subjects: [SubjectId(1), SubjectId(2)].into(),
                })
                .unwrap();
        }
    }

    fn add_students(store: &mut EntityStore, count: u32) {
        for id in 1..=count {
            store
                .add_student(Student {
                    id: StudentId(id),
                    name: format!("Student {id}"),
                    year: YearId(1),
                    option_subjects: Default::default(),
                })
                .unwrap();
        }
    }

    fn maths_offering() -> Offering {
        Offering {
            subject: SubjectId(1),
            periods_per_cycle: 4,
            is_option: false,
        }
    }

    #[test]
    fn teacher_scarcity_splits_classes_into_sets() {
        // 100 students at ideal size 25 -> 4 classes; 2 teachers -> 2 sets
        // of 2 concurrent classes
        let mut store = base_store(vec![maths_offering()]);
        add_teachers(&mut store, SubjectId(1), &[1, 2]);
        add_rooms(&mut store, 25, 4);
        add_students(&mut store, 100);

        let summary = build_curriculum(&mut store, YearId(1)).unwrap();
        assert_eq!(summary.blocks, 1);
        assert_eq!(summary.sets, 2);
        assert_eq!(summary.classes, 4);

        let block = store.blocks_in(YearId(1))[0].id;
        let sets = store.sets_in_block(block);
        assert_eq!(sets.len(), 2);
        for set in sets {
            assert_eq!(store.classes_in_set(set.id).len(), 2);
        }
    }

    #[test]
    fn classes_are_named_with_two_digit_counters() {
        let mut store = base_store(vec![maths_offering()]);
        add_teachers(&mut store, SubjectId(1), &[1]);
        add_rooms(&mut store, 10, 1);
        add_students(&mut store, 20);

        build_curriculum(&mut store, YearId(1)).unwrap();
        let mut names: Vec<String> = store
            .classes_in(YearId(1))
            .iter()
            .map(|c| c.name.clone())
            .collect();
        names.sort();
        assert_eq!(names, vec!["7/Ma01", "7/Ma02"]);
        for class in store.classes_in(YearId(1)) {
            assert_eq!(class.required_periods, 4);
            assert_eq!(class.kind, SetKind::Core);
        }
    }

    #[test]
    fn best_supplied_subject_gets_the_first_block() {
        let mut store = base_store(vec![
            maths_offering(),
            Offering {
                subject: SubjectId(2),
                periods_per_cycle: 3,
                is_option: false,
            },
        ]);
        add_teachers(&mut store, SubjectId(2), &[1]);
        add_teachers(&mut store, SubjectId(1), &[2, 3]);
        add_rooms(&mut store, 30, 2);
        add_students(&mut store, 30);

        build_curriculum(&mut store, YearId(1)).unwrap();
        let mut blocks = store.blocks_in(YearId(1));
        blocks.sort_by_key(|b| b.ordinal);
        assert_eq!(blocks[0].name, "A");
        assert_eq!(blocks[1].name, "B");
        // maths has two teachers, so it leads
        let first_block_sets = store.sets_in_block(blocks[0].id);
        assert_eq!(first_block_sets[0].subject, SubjectId(1));
    }

    #[test]
    fn subject_without_teachers_is_skipped_not_fatal() {
        let mut store = base_store(vec![
            maths_offering(),
            Offering {
                subject: SubjectId(2),
                periods_per_cycle: 3,
                is_option: false,
            },
        ]);
        add_teachers(&mut store, SubjectId(1), &[1]);
        add_rooms(&mut store, 30, 1);
        add_students(&mut store, 10);

        let summary = build_curriculum(&mut store, YearId(1)).unwrap();
        assert_eq!(summary.blocks, 1);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].subject, SubjectId(2));
        // the skipped subject did not consume a block letter
        assert_eq!(store.blocks_in(YearId(1))[0].name, "A");
    }

    #[test]
    fn no_classrooms_is_a_configuration_error() {
        let mut store = base_store(vec![maths_offering()]);
        add_teachers(&mut store, SubjectId(1), &[1]);
        add_students(&mut store, 10);

        let err = build_curriculum(&mut store, YearId(1)).unwrap_err();
        assert!(matches!(err, TimetableError::NoClassrooms));
        assert!(err.is_configuration());
    }

    #[test]
    fn empty_cohort_builds_nothing() {
        let mut store = base_store(vec![maths_offering()]);
        add_teachers(&mut store, SubjectId(1), &[1]);
        add_rooms(&mut store, 30, 1);

        let summary = build_curriculum(&mut store, YearId(1)).unwrap();
        assert_eq!(summary.classes, 0);
        assert!(store.classes_in(YearId(1)).is_empty());
    }

    #[test]
    fn rebuild_is_idempotent() {
        let mut store = base_store(vec![maths_offering()]);
        add_teachers(&mut store, SubjectId(1), &[1, 2]);
        add_rooms(&mut store, 25, 4);
        add_students(&mut store, 100);

        let shape = |store: &EntityStore| {
            let mut classes: Vec<(String, u32, u32)> = store
                .classes_in(YearId(1))
                .iter()
                .map(|c| (c.name.clone(), c.number, c.required_periods))
                .collect();
            classes.sort();
            classes
        };

        build_curriculum(&mut store, YearId(1)).unwrap();
        let first = shape(&store);
        build_curriculum(&mut store, YearId(1)).unwrap();
        let second = shape(&store);
        assert_eq!(first, second);
        assert_eq!(store.classes_in(YearId(1)).len(), 4);
    }

    #[test]
    fn split_evenly_distributes_the_remainder_first() {
        assert_eq!(split_evenly(7, 3), vec![3, 2, 2]);
        assert_eq!(split_evenly(4, 2), vec![2, 2]);
        assert_eq!(split_evenly(1, 1), vec![1]);
    }
}

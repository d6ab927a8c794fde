//! Result sink: turns a completed assignment into committed placements.
//!
//! Before anything is written, the whole batch is checked against the seven
//! committed-state invariants. A violation here means the solver produced a
//! broken assignment, so the write is aborted and the store left untouched.

use crate::error::TimetableError;
use crate::store::EntityStore;
use crate::types::{ClassId, Placement, YearId};
use log::info;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// One failed invariant check
#[derive(Debug, Clone)]
pub struct Violation {
    pub invariant: &'static str,
    pub message: String,
}

/// Check a placement batch against invariants 1-7 for one year. Returns all
/// violations found; an empty list means the batch is safe to commit.
pub fn verify_placements(
    store: &EntityStore,
    year: YearId,
    placements: &[Placement],
) -> Vec<Violation> {
    let mut violations = Vec::new();

    let mut teacher_busy = HashSet::new();
    let mut room_busy = HashSet::new();
    let mut class_busy = HashSet::new();
    let mut class_periods: BTreeMap<ClassId, BTreeSet<_>> = BTreeMap::new();

    for p in placements {
        if !teacher_busy.insert((p.period, p.teacher)) {
            violations.push(Violation {
                invariant: "teacher-uniqueness",
                message: format!("teacher {} booked twice in period {}", p.teacher, p.period),
            });
        }
        if !room_busy.insert((p.period, p.classroom)) {
            violations.push(Violation {
                invariant: "room-uniqueness",
                message: format!("room {} booked twice in period {}", p.classroom, p.period),
            });
        }
        if !class_busy.insert((p.period, p.class)) {
            violations.push(Violation {
                invariant: "class-uniqueness",
                message: format!("class {} meets twice in period {}", p.class, p.period),
            });
        }

        let Some(class) = store.class(p.class) else {
            violations.push(Violation {
                invariant: "class-exists",
                message: format!("placement references unknown class {}", p.class),
            });
            continue;
        };
        class_periods.entry(p.class).or_default().insert(p.period);

        match store.teacher(p.teacher) {
            Some(teacher) if !teacher.can_teach(class.subject) => violations.push(Violation {
                invariant: "teacher-competence",
                message: format!(
                    "teacher '{}' cannot teach '{}'",
                    teacher.code, class.name
                ),
            }),
            None => violations.push(Violation {
                invariant: "teacher-competence",
                message: format!("placement references unknown teacher {}", p.teacher),
            }),
            _ => {}
        }
        match store.classroom(p.classroom) {
            Some(room) if !room.supports(class.subject) => violations.push(Violation {
                invariant: "room-competence",
                message: format!("room '{}' does not support '{}'", room.name, class.name),
            }),
            None => violations.push(Violation {
                invariant: "room-competence",
                message: format!("placement references unknown room {}", p.classroom),
            }),
            _ => {}
        }
    }

    // every class of the year meets exactly as often as required
    for class in store.classes_in(year) {
        let actual = class_periods.get(&class.id).map(|s| s.len()).unwrap_or(0);
        if actual != class.required_periods as usize {
            violations.push(Violation {
                invariant: "required-periods",
                message: format!(
                    "class '{}' has {actual} placements, requires {}",
                    class.name, class.required_periods
                ),
            });
        }
    }

    // all classes of a block occupy one shared period set
    for block in store.blocks_in(year) {
        let mut expected: Option<(&str, &BTreeSet<_>)> = None;
        for set in store.sets_in_block(block.id) {
            for class in store.classes_in_set(set.id) {
                let Some(periods) = class_periods.get(&class.id) else {
                    continue;
                };
                match expected {
                    None => expected = Some((class.name.as_str(), periods)),
                    Some((first_name, first_periods)) => {
                        if periods != first_periods {
                            violations.push(Violation {
                                invariant: "block-concurrency",
                                message: format!(
                                    "block '{}': '{}' and '{}' occupy different periods",
                                    block.name, first_name, class.name
                                ),
                            });
                        }
                    }
                }
            }
        }
    }

    // band siblings (same class number, different blocks) never overlap
    let mut bands: BTreeMap<u32, Vec<&crate::types::Class>> = BTreeMap::new();
    for class in store.classes_in(year) {
        bands.entry(class.number).or_default().push(class);
    }
    for (number, classes) in bands {
        for (i, a) in classes.iter().enumerate() {
            for b in &classes[i + 1..] {
                let (Some(pa), Some(pb)) = (class_periods.get(&a.id), class_periods.get(&b.id))
                else {
                    continue;
                };
                if pa.intersection(pb).next().is_some() {
                    violations.push(Violation {
                        invariant: "band-disjointness",
                        message: format!(
                            "band {number}: '{}' and '{}' share a period",
                            a.name, b.name
                        ),
                    });
                }
            }
        }
    }

    violations
}

/// Verify and write a solved year's placements in one batch. Any invariant
/// violation aborts the write: that is a solver bug, not bad input.
pub fn commit(
    store: &mut EntityStore,
    year: YearId,
    placements: Vec<Placement>,
) -> Result<(), TimetableError> {
    let violations = verify_placements(store, year, &placements);
    if let Some(first) = violations.first() {
        return Err(TimetableError::InvariantViolation {
            invariant: first.invariant,
            message: format!("{} ({} violations total)", first.message, violations.len()),
        });
    }
    let count = placements.len();
    store.insert_placements(placements)?;
    info!("committed {count} placements for year {year}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Classroom, ClassroomId, CycleConfig, Offering, PeriodId, SetKind, Subject, SubjectId,
        Teacher, TeacherId, Year,
    };

    fn store_with_one_class() -> (EntityStore, ClassId) {
        let mut store = EntityStore::new();
        store
            .add_subject(Subject {
                id: SubjectId(1),
                code: "Ma".to_string(),
                name: "Maths".to_string(),
            })
            .unwrap();
        store
            .add_year(Year {
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
            })
            .unwrap();
        store
            .add_teacher(Teacher {
                id: TeacherId(1),
                code: "JSM".to_string(),
                name: "J Smith".to_string(),
                subjects: [SubjectId(1)].into(),
                max_periods: None,
            })
            .unwrap();
        store
            .add_classroom(Classroom {
                id: ClassroomId(1),
                name: "M1".to_string(),
                capacity: 30,
                subjects: [SubjectId(1)].into(),
            })
            .unwrap();
        store.init_periods(&CycleConfig::default());
        let block = store.create_block(YearId(1), "A".to_string(), 1).unwrap();
        let set = store
            .create_set(block, SubjectId(1), 1, SetKind::Core)
            .unwrap();
        let class = store.create_class(set, "7/Ma01".to_string(), 1, 2).unwrap();
        (store, class)
    }

    fn placement(period: u32, class: ClassId) -> Placement {
        Placement {
            period: PeriodId(period),
            class,
            teacher: TeacherId(1),
            classroom: ClassroomId(1),
        }
    }

    #[test]
    fn commits_a_valid_batch() {
        let (mut store, class) = store_with_one_class();
        let batch = vec![placement(1, class), placement(2, class)];
        commit(&mut store, YearId(1), batch).unwrap();
        assert_eq!(store.placements().len(), 2);
    }

    #[test]
    fn rejects_wrong_placement_count() {
        let (mut store, class) = store_with_one_class();
        // class requires 2 periods, only 1 placed
        let err = commit(&mut store, YearId(1), vec![placement(1, class)]).unwrap_err();
        assert!(matches!(
            err,
            TimetableError::InvariantViolation {
                invariant: "required-periods",
                ..
            }
        ));
        assert!(store.placements().is_empty());
    }

    #[test]
    fn flags_band_overlap() {
        let (mut store, class_a) = store_with_one_class();
        // a second block with a class sharing number 1
        let block_b = store.create_block(YearId(1), "B".to_string(), 2).unwrap();
        let set_b = store
            .create_set(block_b, SubjectId(1), 1, SetKind::Core)
            .unwrap();
        let class_b = store.create_class(set_b, "7/Ma02".to_string(), 1, 2).unwrap();

        let placements = vec![
            placement(1, class_a),
            placement(2, class_a),
            // class B overlaps class A in period 2
            Placement {
                period: PeriodId(2),
                class: class_b,
                teacher: TeacherId(1),
                classroom: ClassroomId(1),
            },
            Placement {
                period: PeriodId(3),
                class: class_b,
                teacher: TeacherId(1),
                classroom: ClassroomId(1),
            },
        ];
        let violations = verify_placements(&store, YearId(1), &placements);
        assert!(violations
            .iter()
            .any(|v| v.invariant == "band-disjointness"));
        // the period-2 teacher and room double-bookings are caught too
        assert!(violations.iter().any(|v| v.invariant == "teacher-uniqueness"));
    }

    #[test]
    fn flags_unqualified_teacher() {
        let (mut store, class) = store_with_one_class();
        store
            .add_subject(Subject {
                id: SubjectId(2),
                code: "En".to_string(),
                name: "English".to_string(),
            })
            .unwrap();
        store
            .add_teacher(Teacher {
                id: TeacherId(2),
                code: "ABC".to_string(),
                name: "A Body".to_string(),
                subjects: [SubjectId(2)].into(),
                max_periods: None,
            })
            .unwrap();
        let placements = vec![
            Placement {
                period: PeriodId(1),
                class,
                teacher: TeacherId(2),
                classroom: ClassroomId(1),
            },
            Placement {
                period: PeriodId(2),
                class,
                teacher: TeacherId(2),
                classroom: ClassroomId(1),
            },
        ];
        let violations = verify_placements(&store, YearId(1), &placements);
        assert!(violations
            .iter()
            .any(|v| v.invariant == "teacher-competence"));
    }
}

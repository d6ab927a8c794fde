//! In-memory relational catalog of all timetabling entities.
//!
//! The store is the single source of truth: the curriculum builder and the
//! solver read a snapshot through the lookup methods and write results back
//! through the mutation methods. Mutations that would break an integrity
//! invariant fail and leave the store unchanged. `BTreeMap` backing keeps
//! every iteration order deterministic, which the solver's reproducibility
//! guarantee depends on.

use crate::error::TimetableError;
use crate::types::{
    Block, BlockId, Class, ClassId, Classroom, ClassroomId, CycleConfig, Period, PeriodId,
    Placement, SetId, SetKind, Student, StudentId, Subject, SubjectId, Teacher, TeacherId,
    TeachingSet, Year, YearId,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Summary statistics over classroom capacities
#[derive(Debug, Clone, Copy)]
pub struct CapacityStats {
    pub count: usize,
    pub mean: f64,
    pub min: u32,
    pub max: u32,
}

/// One row of a per-resource placement query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementRow {
    pub period: PeriodId,
    pub class_name: String,
    pub subject_code: String,
    pub teacher_code: String,
    pub room_name: String,
}

#[derive(Debug, Default, Clone)]
pub struct EntityStore {
    years: BTreeMap<YearId, Year>,
    subjects: BTreeMap<SubjectId, Subject>,
    teachers: BTreeMap<TeacherId, Teacher>,
    classrooms: BTreeMap<ClassroomId, Classroom>,
    students: BTreeMap<StudentId, Student>,
    periods: BTreeMap<PeriodId, Period>,
    blocks: BTreeMap<BlockId, Block>,
    sets: BTreeMap<SetId, TeachingSet>,
    classes: BTreeMap<ClassId, Class>,
    placements: Vec<Placement>,
    next_block: u32,
    next_set: u32,
    next_class: u32,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- entity insertion -------------------------------------------------

    pub fn add_subject(&mut self, subject: Subject) -> Result<(), TimetableError> {
        if self.subjects.contains_key(&subject.id) {
            return Err(TimetableError::DuplicateId {
                kind: "subject",
                id: subject.id.0,
            });
        }
        if self.subjects.values().any(|s| s.code == subject.code) {
            return Err(TimetableError::DuplicateSubject {
                field: "code",
                value: subject.code,
            });
        }
        if self.subjects.values().any(|s| s.name == subject.name) {
            return Err(TimetableError::DuplicateSubject {
                field: "name",
                value: subject.name,
            });
        }
        self.subjects.insert(subject.id, subject);
        Ok(())
    }

    pub fn add_year(&mut self, year: Year) -> Result<(), TimetableError> {
        if self.years.contains_key(&year.id) {
            return Err(TimetableError::DuplicateId {
                kind: "year",
                id: year.id.0,
            });
        }
        for offering in &year.offerings {
            self.require_subject(offering.subject, || format!("year '{}'", year.name))?;
        }
        self.years.insert(year.id, year);
        Ok(())
    }

    pub fn add_teacher(&mut self, teacher: Teacher) -> Result<(), TimetableError> {
        if self.teachers.contains_key(&teacher.id) {
            return Err(TimetableError::DuplicateId {
                kind: "teacher",
                id: teacher.id.0,
            });
        }
        for &subject in &teacher.subjects {
            self.require_subject(subject, || format!("teacher '{}'", teacher.code))?;
        }
        self.teachers.insert(teacher.id, teacher);
        Ok(())
    }

    pub fn add_classroom(&mut self, classroom: Classroom) -> Result<(), TimetableError> {
        if self.classrooms.contains_key(&classroom.id) {
            return Err(TimetableError::DuplicateId {
                kind: "classroom",
                id: classroom.id.0,
            });
        }
        for &subject in &classroom.subjects {
            self.require_subject(subject, || format!("classroom '{}'", classroom.name))?;
        }
        self.classrooms.insert(classroom.id, classroom);
        Ok(())
    }

    pub fn add_student(&mut self, student: Student) -> Result<(), TimetableError> {
        if self.students.contains_key(&student.id) {
            return Err(TimetableError::DuplicateId {
                kind: "student",
                id: student.id.0,
            });
        }
        if !self.years.contains_key(&student.year) {
            return Err(TimetableError::UnknownReference {
                kind: "year",
                id: student.year.0,
                referrer: format!("student '{}'", student.name),
            });
        }
        for &subject in &student.option_subjects {
            self.require_subject(subject, || format!("student '{}'", student.name))?;
        }
        self.students.insert(student.id, student);
        Ok(())
    }

    /// Replace the period catalog with the linearized cycle
    pub fn init_periods(&mut self, config: &CycleConfig) {
        self.periods.clear();
        for id in 1..=config.total_periods() {
            let period = Period::from_id(PeriodId(id), config);
            self.periods.insert(period.id, period);
        }
    }

    // ---- entity update & removal ------------------------------------------

    /// Replace a teacher record in place. The id must already exist and the
    /// new subject set must not orphan any committed placement.
    pub fn update_teacher(&mut self, teacher: Teacher) -> Result<(), TimetableError> {
        if !self.teachers.contains_key(&teacher.id) {
            return Err(TimetableError::UnknownReference {
                kind: "teacher",
                id: teacher.id.0,
                referrer: "update".to_string(),
            });
        }
        for &subject in &teacher.subjects {
            self.require_subject(subject, || format!("teacher '{}'", teacher.code))?;
        }
        for p in self.placements.iter().filter(|p| p.teacher == teacher.id) {
            let class = &self.classes[&p.class];
            if !teacher.subjects.contains(&class.subject) {
                return Err(TimetableError::PlacementConflict(format!(
                    "teacher '{}' still placed for '{}'",
                    teacher.code, class.name
                )));
            }
        }
        self.teachers.insert(teacher.id, teacher);
        Ok(())
    }

    /// Update a year's offering of a subject, adding it if absent
    pub fn update_offering(
        &mut self,
        year: YearId,
        subject: SubjectId,
        periods_per_cycle: u32,
        is_option: bool,
    ) -> Result<(), TimetableError> {
        self.require_subject(subject, || format!("year {year}"))?;
        let year = self
            .years
            .get_mut(&year)
            .ok_or(TimetableError::UnknownReference {
                kind: "year",
                id: year.0,
                referrer: "offering update".to_string(),
            })?;
        match year.offerings.iter_mut().find(|o| o.subject == subject) {
            Some(offering) => {
                offering.periods_per_cycle = periods_per_cycle;
                offering.is_option = is_option;
            }
            None => year.offerings.push(crate::types::Offering {
                subject,
                periods_per_cycle,
                is_option,
            }),
        }
        Ok(())
    }

    pub fn remove_student(&mut self, id: StudentId) -> Result<(), TimetableError> {
        self.students
            .remove(&id)
            .map(|_| ())
            .ok_or(TimetableError::UnknownReference {
                kind: "student",
                id: id.0,
                referrer: "removal".to_string(),
            })
    }

    /// Remove a teacher; refused while placements still reference them
    pub fn remove_teacher(&mut self, id: TeacherId) -> Result<(), TimetableError> {
        if self.placements.iter().any(|p| p.teacher == id) {
            return Err(TimetableError::PlacementConflict(format!(
                "teacher {id} still has committed placements"
            )));
        }
        self.teachers
            .remove(&id)
            .map(|_| ())
            .ok_or(TimetableError::UnknownReference {
                kind: "teacher",
                id: id.0,
                referrer: "removal".to_string(),
            })
    }

    /// Remove a classroom; refused while placements still reference it
    pub fn remove_classroom(&mut self, id: ClassroomId) -> Result<(), TimetableError> {
        if self.placements.iter().any(|p| p.classroom == id) {
            return Err(TimetableError::PlacementConflict(format!(
                "classroom {id} still has committed placements"
            )));
        }
        self.classrooms
            .remove(&id)
            .map(|_| ())
            .ok_or(TimetableError::UnknownReference {
                kind: "classroom",
                id: id.0,
                referrer: "removal".to_string(),
            })
    }

    /// Remove a subject; refused while any other record references it
    pub fn remove_subject(&mut self, id: SubjectId) -> Result<(), TimetableError> {
        if !self.subjects.contains_key(&id) {
            return Err(TimetableError::UnknownReference {
                kind: "subject",
                id: id.0,
                referrer: "removal".to_string(),
            });
        }
        let referenced = self.years.values().any(|y| y.offering(id).is_some())
            || self.teachers.values().any(|t| t.subjects.contains(&id))
            || self.classrooms.values().any(|r| r.subjects.contains(&id))
            || self.students.values().any(|s| s.option_subjects.contains(&id))
            || self.classes.values().any(|c| c.subject == id);
        if referenced {
            return Err(TimetableError::PlacementConflict(format!(
                "subject {id} is still referenced"
            )));
        }
        self.subjects.remove(&id);
        Ok(())
    }

    fn require_subject(
        &self,
        id: SubjectId,
        referrer: impl FnOnce() -> String,
    ) -> Result<(), TimetableError> {
        if self.subjects.contains_key(&id) {
            Ok(())
        } else {
            Err(TimetableError::UnknownReference {
                kind: "subject",
                id: id.0,
                referrer: referrer(),
            })
        }
    }

    // ---- lookups ----------------------------------------------------------

    pub fn year(&self, id: YearId) -> Option<&Year> {
        self.years.get(&id)
    }

    pub fn subject(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.get(&id)
    }

    pub fn teacher(&self, id: TeacherId) -> Option<&Teacher> {
        self.teachers.get(&id)
    }

    pub fn classroom(&self, id: ClassroomId) -> Option<&Classroom> {
        self.classrooms.get(&id)
    }

    pub fn student(&self, id: StudentId) -> Option<&Student> {
        self.students.get(&id)
    }

    pub fn period(&self, id: PeriodId) -> Option<&Period> {
        self.periods.get(&id)
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub fn set(&self, id: SetId) -> Option<&TeachingSet> {
        self.sets.get(&id)
    }

    pub fn class(&self, id: ClassId) -> Option<&Class> {
        self.classes.get(&id)
    }

    pub fn years(&self) -> impl Iterator<Item = &Year> {
        self.years.values()
    }

    pub fn period_ids(&self) -> Vec<PeriodId> {
        self.periods.keys().copied().collect()
    }

    pub fn teacher_ids(&self) -> Vec<TeacherId> {
        self.teachers.keys().copied().collect()
    }

    pub fn classroom_ids(&self) -> Vec<ClassroomId> {
        self.classrooms.keys().copied().collect()
    }

    /// Subjects a teacher is qualified for
    pub fn subjects_of(&self, teacher: TeacherId) -> BTreeSet<SubjectId> {
        self.teachers
            .get(&teacher)
            .map(|t| t.subjects.clone())
            .unwrap_or_default()
    }

    /// Teachers qualified for a subject
    pub fn teachers_of(&self, subject: SubjectId) -> BTreeSet<TeacherId> {
        self.teachers
            .values()
            .filter(|t| t.can_teach(subject))
            .map(|t| t.id)
            .collect()
    }

    /// Rooms equipped for a subject
    pub fn rooms_of(&self, subject: SubjectId) -> BTreeSet<ClassroomId> {
        self.classrooms
            .values()
            .filter(|r| r.supports(subject))
            .map(|r| r.id)
            .collect()
    }

    pub fn students_in(&self, year: YearId) -> Vec<&Student> {
        self.students.values().filter(|s| s.year == year).collect()
    }

    /// Periods per cycle a year's offering of a subject requires
    pub fn required_periods(&self, year: YearId, subject: SubjectId) -> Option<u32> {
        self.years
            .get(&year)?
            .offering(subject)
            .map(|o| o.periods_per_cycle)
    }

    pub fn classroom_capacities(&self) -> CapacityStats {
        let caps: Vec<u32> = self.classrooms.values().map(|r| r.capacity).collect();
        if caps.is_empty() {
            return CapacityStats {
                count: 0,
                mean: 0.0,
                min: 0,
                max: 0,
            };
        }
        CapacityStats {
            count: caps.len(),
            mean: caps.iter().map(|&c| c as f64).sum::<f64>() / caps.len() as f64,
            min: *caps.iter().min().unwrap(),
            max: *caps.iter().max().unwrap(),
        }
    }

    pub fn blocks_in(&self, year: YearId) -> Vec<&Block> {
        self.blocks.values().filter(|b| b.year == year).collect()
    }

    pub fn sets_in_block(&self, block: BlockId) -> Vec<&TeachingSet> {
        self.sets.values().filter(|s| s.block == block).collect()
    }

    pub fn classes_in_set(&self, set: SetId) -> Vec<&Class> {
        self.classes.values().filter(|c| c.set == set).collect()
    }

    pub fn classes_in(&self, year: YearId) -> Vec<&Class> {
        self.classes.values().filter(|c| c.year == year).collect()
    }

    // ---- curriculum records -----------------------------------------------

    pub fn create_block(
        &mut self,
        year: YearId,
        name: String,
        ordinal: u32,
    ) -> Result<BlockId, TimetableError> {
        if !self.years.contains_key(&year) {
            return Err(TimetableError::UnknownReference {
                kind: "year",
                id: year.0,
                referrer: format!("block '{name}'"),
            });
        }
        self.next_block += 1;
        let id = BlockId(self.next_block);
        self.blocks.insert(
            id,
            Block {
                id,
                year,
                name,
                ordinal,
            },
        );
        Ok(id)
    }

    pub fn create_set(
        &mut self,
        block: BlockId,
        subject: SubjectId,
        number: u32,
        kind: SetKind,
    ) -> Result<SetId, TimetableError> {
        let year = self
            .blocks
            .get(&block)
            .ok_or(TimetableError::UnknownReference {
                kind: "block",
                id: block.0,
                referrer: format!("set {number}"),
            })?
            .year;
        self.require_subject(subject, || format!("set {number}"))?;
        self.next_set += 1;
        let id = SetId(self.next_set);
        self.sets.insert(
            id,
            TeachingSet {
                id,
                subject,
                year,
                number,
                kind,
                block,
            },
        );
        Ok(id)
    }

    pub fn create_class(
        &mut self,
        set: SetId,
        name: String,
        number: u32,
        required_periods: u32,
    ) -> Result<ClassId, TimetableError> {
        let parent = self
            .sets
            .get(&set)
            .ok_or(TimetableError::UnknownReference {
                kind: "set",
                id: set.0,
                referrer: format!("class '{name}'"),
            })?
            .clone();
        self.next_class += 1;
        let id = ClassId(self.next_class);
        self.classes.insert(
            id,
            Class {
                id,
                name,
                number,
                year: parent.year,
                subject: parent.subject,
                kind: parent.kind,
                required_periods,
                set,
            },
        );
        Ok(id)
    }

    /// Cascade-delete a year's blocks, sets, classes and their placements
    pub fn clear_curriculum(&mut self, year: YearId) {
        let doomed: HashSet<ClassId> = self
            .classes
            .values()
            .filter(|c| c.year == year)
            .map(|c| c.id)
            .collect();
        self.placements.retain(|p| !doomed.contains(&p.class));
        self.classes.retain(|_, c| c.year != year);
        self.sets.retain(|_, s| s.year != year);
        self.blocks.retain(|_, b| b.year != year);
    }

    /// Delete all placements of a year's classes
    pub fn clear_placements(&mut self, year: YearId) {
        let affected: HashSet<ClassId> = self
            .classes
            .values()
            .filter(|c| c.year == year)
            .map(|c| c.id)
            .collect();
        self.placements.retain(|p| !affected.contains(&p.class));
    }

    // ---- placements -------------------------------------------------------

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// All-or-nothing batch insert. The batch is validated against both the
    /// existing placements and itself before anything is written: resource
    /// existence, subject competence, and the (period, teacher) /
    /// (period, room) / (period, class) uniqueness invariants.
    pub fn insert_placements(&mut self, batch: Vec<Placement>) -> Result<(), TimetableError> {
        let mut teacher_busy: HashSet<(PeriodId, TeacherId)> = self
            .placements
            .iter()
            .map(|p| (p.period, p.teacher))
            .collect();
        let mut room_busy: HashSet<(PeriodId, ClassroomId)> = self
            .placements
            .iter()
            .map(|p| (p.period, p.classroom))
            .collect();
        let mut class_busy: HashSet<(PeriodId, ClassId)> = self
            .placements
            .iter()
            .map(|p| (p.period, p.class))
            .collect();

        for p in &batch {
            let class = self.classes.get(&p.class).ok_or(TimetableError::UnknownReference {
                kind: "class",
                id: p.class.0,
                referrer: "placement".to_string(),
            })?;
            let teacher = self.teachers.get(&p.teacher).ok_or(TimetableError::UnknownReference {
                kind: "teacher",
                id: p.teacher.0,
                referrer: format!("placement of '{}'", class.name),
            })?;
            let room = self.classrooms.get(&p.classroom).ok_or(TimetableError::UnknownReference {
                kind: "classroom",
                id: p.classroom.0,
                referrer: format!("placement of '{}'", class.name),
            })?;
            if !self.periods.contains_key(&p.period) {
                return Err(TimetableError::UnknownReference {
                    kind: "period",
                    id: p.period.0,
                    referrer: format!("placement of '{}'", class.name),
                });
            }
            if !teacher.can_teach(class.subject) {
                return Err(TimetableError::PlacementConflict(format!(
                    "teacher '{}' is not qualified for class '{}'",
                    teacher.code, class.name
                )));
            }
            if !room.supports(class.subject) {
                return Err(TimetableError::PlacementConflict(format!(
                    "room '{}' does not support class '{}'",
                    room.name, class.name
                )));
            }
            if !teacher_busy.insert((p.period, p.teacher)) {
                return Err(TimetableError::PlacementConflict(format!(
                    "teacher '{}' double-booked in period {}",
                    teacher.code, p.period
                )));
            }
            if !room_busy.insert((p.period, p.classroom)) {
                return Err(TimetableError::PlacementConflict(format!(
                    "room '{}' double-booked in period {}",
                    room.name, p.period
                )));
            }
            if !class_busy.insert((p.period, p.class)) {
                return Err(TimetableError::PlacementConflict(format!(
                    "class '{}' meets twice in period {}",
                    class.name, p.period
                )));
            }
        }

        self.placements.extend(batch);
        Ok(())
    }

    fn placement_row(&self, p: &Placement) -> PlacementRow {
        let class = &self.classes[&p.class];
        PlacementRow {
            period: p.period,
            class_name: class.name.clone(),
            subject_code: self
                .subjects
                .get(&class.subject)
                .map(|s| s.code.clone())
                .unwrap_or_default(),
            teacher_code: self
                .teachers
                .get(&p.teacher)
                .map(|t| t.code.clone())
                .unwrap_or_default(),
            room_name: self
                .classrooms
                .get(&p.classroom)
                .map(|r| r.name.clone())
                .unwrap_or_default(),
        }
    }

    /// A teacher's committed timetable, sorted by period
    pub fn placements_for_teacher(&self, teacher: TeacherId) -> Vec<PlacementRow> {
        let mut rows: Vec<PlacementRow> = self
            .placements
            .iter()
            .filter(|p| p.teacher == teacher)
            .map(|p| self.placement_row(p))
            .collect();
        rows.sort_by_key(|r| r.period);
        rows
    }

    /// A room's committed timetable, sorted by period
    pub fn placements_for_room(&self, room: ClassroomId) -> Vec<PlacementRow> {
        let mut rows: Vec<PlacementRow> = self
            .placements
            .iter()
            .filter(|p| p.classroom == room)
            .map(|p| self.placement_row(p))
            .collect();
        rows.sort_by_key(|r| r.period);
        rows
    }

    /// A student's committed timetable: core classes of their year plus the
    /// option classes they have elected, sorted by period. Students are not
    /// allocated to individual classes, so band siblings all appear.
    pub fn placements_for_student(&self, student: StudentId) -> Vec<PlacementRow> {
        let Some(student) = self.students.get(&student) else {
            return Vec::new();
        };
        let mut rows: Vec<PlacementRow> = self
            .placements
            .iter()
            .filter(|p| {
                let class = &self.classes[&p.class];
                class.year == student.year
                    && (class.kind == SetKind::Core || student.takes_option(class.subject))
            })
            .map(|p| self.placement_row(p))
            .collect();
        rows.sort_by_key(|r| r.period);
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Offering;

    fn subject(id: u32, code: &str) -> Subject {
        Subject {
            id: SubjectId(id),
            code: code.to_string(),
            name: format!("Subject {code}"),
        }
    }

    fn store_with_basics() -> EntityStore {
        let mut store = EntityStore::new();
        store.add_subject(subject(1, "Ma")).unwrap();
        store.add_subject(subject(2, "En")).unwrap();
        store
            .add_year(Year {
                id: YearId(1),
                name: "7".to_string(),
                value: 7,
                has_options: false,
                ideal_class_size: None,
                offerings: vec![Offering {
                    subject: SubjectId(1),
                    periods_per_cycle: 4,
                    is_option: false,
                }],
            })
            .unwrap();
        store
    }

    #[test]
    fn rejects_duplicate_subject_code() {
        let mut store = EntityStore::new();
        store.add_subject(subject(1, "Ma")).unwrap();
        let err = store
            .add_subject(Subject {
                id: SubjectId(2),
                code: "Ma".to_string(),
                name: "Other Maths".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, TimetableError::DuplicateSubject { field: "code", .. }));
    }

    #[test]
    fn rejects_teacher_with_unknown_subject() {
        let mut store = store_with_basics();
        let err = store
            .add_teacher(Teacher {
                id: TeacherId(1),
                code: "ABC".to_string(),
                name: "A Teacher".to_string(),
                subjects: [SubjectId(99)].into(),
                max_periods: None,
            })
            .unwrap_err();
        assert!(matches!(err, TimetableError::UnknownReference { kind: "subject", .. }));
        assert!(store.teacher(TeacherId(1)).is_none());
    }

    #[test]
    fn affinity_lookups_cross_reference() {
        let mut store = store_with_basics();
        store
            .add_teacher(Teacher {
                id: TeacherId(1),
                code: "JSM".to_string(),
                name: "J Smith".to_string(),
                subjects: [SubjectId(1), SubjectId(2)].into(),
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

        assert_eq!(store.teachers_of(SubjectId(1)), [TeacherId(1)].into());
        assert_eq!(store.rooms_of(SubjectId(1)), [ClassroomId(1)].into());
        assert!(store.rooms_of(SubjectId(2)).is_empty());
        assert_eq!(
            store.subjects_of(TeacherId(1)),
            [SubjectId(1), SubjectId(2)].into()
        );
        assert_eq!(store.required_periods(YearId(1), SubjectId(1)), Some(4));
        assert_eq!(store.required_periods(YearId(1), SubjectId(2)), None);
    }

    #[test]
    fn capacity_stats_over_rooms() {
        let mut store = store_with_basics();
        for (id, cap) in [(1, 20), (2, 30), (3, 28)] {
            store
                .add_classroom(Classroom {
                    id: ClassroomId(id),
                    name: format!("R{id}"),
                    capacity: cap,
                    subjects: BTreeSet::new(),
                })
                .unwrap();
        }
        let stats = store.classroom_capacities();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, 20);
        assert_eq!(stats.max, 30);
        assert!((stats.mean - 26.0).abs() < 1e-9);
    }

    #[test]
    fn curriculum_cascade_delete() {
        let mut store = store_with_basics();
        let block = store.create_block(YearId(1), "A".to_string(), 1).unwrap();
        let set = store.create_set(block, SubjectId(1), 1, SetKind::Core).unwrap();
        store.create_class(set, "7/Ma01".to_string(), 1, 4).unwrap();
        assert_eq!(store.classes_in(YearId(1)).len(), 1);

        store.clear_curriculum(YearId(1));
        assert!(store.classes_in(YearId(1)).is_empty());
        assert!(store.blocks_in(YearId(1)).is_empty());
        assert!(store.sets.is_empty());
    }

    #[test]
    fn placement_batch_is_all_or_nothing() {
        let mut store = store_with_basics();
        store.init_periods(&CycleConfig::default());
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
        let block = store.create_block(YearId(1), "A".to_string(), 1).unwrap();
        let set = store.create_set(block, SubjectId(1), 1, SetKind::Core).unwrap();
        let c1 = store.create_class(set, "7/Ma01".to_string(), 1, 2).unwrap();
        let c2 = store.create_class(set, "7/Ma02".to_string(), 2, 2).unwrap();

        // second placement double-books the teacher
        let batch = vec![
            Placement {
                period: PeriodId(1),
                class: c1,
                teacher: TeacherId(1),
                classroom: ClassroomId(1),
            },
            Placement {
                period: PeriodId(1),
                class: c2,
                teacher: TeacherId(1),
                classroom: ClassroomId(1),
            },
        ];
        let err = store.insert_placements(batch).unwrap_err();
        assert!(matches!(err, TimetableError::PlacementConflict(_)));
        assert!(store.placements().is_empty());
    }

    #[test]
    fn removal_refuses_referenced_records() {
        let mut store = store_with_basics();
        store.init_periods(&CycleConfig::default());
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
        let block = store.create_block(YearId(1), "A".to_string(), 1).unwrap();
        let set = store.create_set(block, SubjectId(1), 1, SetKind::Core).unwrap();
        let class = store.create_class(set, "7/Ma01".to_string(), 1, 1).unwrap();
        store
            .insert_placements(vec![Placement {
                period: PeriodId(1),
                class,
                teacher: TeacherId(1),
                classroom: ClassroomId(1),
            }])
            .unwrap();

        assert!(store.remove_teacher(TeacherId(1)).is_err());
        assert!(store.remove_classroom(ClassroomId(1)).is_err());
        assert!(store.remove_subject(SubjectId(1)).is_err());
        // an unreferenced subject goes quietly
        store.remove_subject(SubjectId(2)).unwrap();
        assert!(store.subject(SubjectId(2)).is_none());
    }

    #[test]
    fn offering_update_edits_in_place() {
        let mut store = store_with_basics();
        store
            .update_offering(YearId(1), SubjectId(1), 6, true)
            .unwrap();
        assert_eq!(store.required_periods(YearId(1), SubjectId(1)), Some(6));
        // adding a new offering appends
        store
            .update_offering(YearId(1), SubjectId(2), 2, false)
            .unwrap();
        assert_eq!(store.required_periods(YearId(1), SubjectId(2)), Some(2));
    }

    #[test]
    fn teacher_rows_sorted_by_period() {
        let mut store = store_with_basics();
        store.init_periods(&CycleConfig::default());
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
        let block = store.create_block(YearId(1), "A".to_string(), 1).unwrap();
        let set = store.create_set(block, SubjectId(1), 1, SetKind::Core).unwrap();
        let class = store.create_class(set, "7/Ma01".to_string(), 1, 2).unwrap();
        store
            .insert_placements(vec![
                Placement {
                    period: PeriodId(9),
                    class,
                    teacher: TeacherId(1),
                    classroom: ClassroomId(1),
                },
                Placement {
                    period: PeriodId(2),
                    class,
                    teacher: TeacherId(1),
                    classroom: ClassroomId(1),
                },
            ])
            .unwrap();

        let rows = store.placements_for_teacher(TeacherId(1));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].period, PeriodId(2));
        assert_eq!(rows[1].period, PeriodId(9));
        assert_eq!(rows[0].subject_code, "Ma");
        assert_eq!(rows[0].room_name, "M1");
    }
}

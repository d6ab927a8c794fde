use crate::error::TimetableError;
use crate::solver::constraints::TimetableConstraint;
use crate::solver::SolveOptions;
use crate::store::EntityStore;
use crate::types::{BlockId, ClassId, ClassroomId, PeriodId, SubjectId, TeacherId, YearId};
use std::collections::{BTreeMap, BTreeSet};

/// Index of a variable within the solver's variable list
pub type VarIdx = usize;

/// Label of one class-period decision variable. A class requiring `n`
/// periods contributes `n` of these, distinguished by `ordinal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClassPeriodVar {
    pub class: ClassId,
    pub subject: SubjectId,
    pub block: BlockId,
    pub set_number: u32,
    pub class_number: u32,
    /// 0-based occurrence of the class within the cycle
    pub ordinal: u32,
}

/// The fully materialized problem handed to the timetable CSP
pub struct TimetableProblem {
    pub vars: Vec<ClassPeriodVar>,
    pub period_domains: Vec<Vec<PeriodId>>,
    pub teacher_domains: Vec<Vec<TeacherId>>,
    pub room_domains: Vec<Vec<ClassroomId>>,
    pub constraints: Vec<TimetableConstraint>,
}

/// Decompose a year's classes into class-period variables, scope the triple
/// domains, and wire the built-in constraints. Empty teacher or room domains
/// are configuration errors caught here, before any search starts.
pub fn build_problem(
    store: &EntityStore,
    year: YearId,
    options: &SolveOptions,
) -> Result<TimetableProblem, TimetableError> {
    let all_periods = store.period_ids();

    let mut vars = Vec::new();
    let mut period_domains = Vec::new();
    let mut teacher_domains: Vec<Vec<TeacherId>> = Vec::new();
    let mut room_domains: Vec<Vec<ClassroomId>> = Vec::new();

    // memoized per subject: every class of a subject shares its domains
    let mut teachers_by_subject: BTreeMap<SubjectId, Vec<TeacherId>> = BTreeMap::new();
    let mut rooms_by_subject: BTreeMap<SubjectId, Vec<ClassroomId>> = BTreeMap::new();

    for class in store.classes_in(year) {
        let subject_code = store
            .subject(class.subject)
            .map(|s| s.code.clone())
            .unwrap_or_else(|| class.subject.to_string());

        let teachers = teachers_by_subject
            .entry(class.subject)
            .or_insert_with(|| store.teachers_of(class.subject).into_iter().collect());
        if teachers.is_empty() {
            return Err(TimetableError::NoTeachers {
                subject: subject_code,
            });
        }
        let teachers = teachers.clone();

        let rooms = rooms_by_subject
            .entry(class.subject)
            .or_insert_with(|| store.rooms_of(class.subject).into_iter().collect());
        if rooms.is_empty() {
            return Err(TimetableError::NoRooms {
                subject: subject_code,
            });
        }
        let rooms = rooms.clone();

        let set = store.set(class.set).expect("class belongs to a set");
        for ordinal in 0..class.required_periods {
            vars.push(ClassPeriodVar {
                class: class.id,
                subject: class.subject,
                block: set.block,
                set_number: set.number,
                class_number: class.number,
                ordinal,
            });
            period_domains.push(all_periods.clone());
            teacher_domains.push(teachers.clone());
            room_domains.push(rooms.clone());
        }
    }

    let constraints = build_constraints(store, &vars, options);

    Ok(TimetableProblem {
        vars,
        period_domains,
        teacher_domains,
        room_domains,
        constraints,
    })
}

fn build_constraints(
    store: &EntityStore,
    vars: &[ClassPeriodVar],
    options: &SolveOptions,
) -> Vec<TimetableConstraint> {
    let mut constraints = Vec::new();

    // one SameSet constraint per block: equal ordinals share a period,
    // distinct ordinals never do
    let mut by_block: BTreeMap<BlockId, Vec<VarIdx>> = BTreeMap::new();
    for (idx, var) in vars.iter().enumerate() {
        by_block.entry(var.block).or_default().push(idx);
    }
    for members in by_block.into_values() {
        if members.len() > 1 {
            constraints.push(TimetableConstraint::SameSet { members });
        }
    }

    // one BandDisjoint constraint per class number: band siblings across
    // blocks may never share a period
    let mut by_band: BTreeMap<u32, Vec<VarIdx>> = BTreeMap::new();
    for (idx, var) in vars.iter().enumerate() {
        by_band.entry(var.class_number).or_default().push(idx);
    }
    for members in by_band.into_values() {
        if members.len() > 1 {
            constraints.push(TimetableConstraint::BandDisjoint { members });
        }
    }

    // one SubjectTeacher guard per subject; redundant with the scoped
    // teacher domains but kept as a safety net
    let mut by_subject: BTreeMap<SubjectId, Vec<VarIdx>> = BTreeMap::new();
    for (idx, var) in vars.iter().enumerate() {
        by_subject.entry(var.subject).or_default().push(idx);
    }
    for (subject, members) in by_subject {
        constraints.push(TimetableConstraint::SubjectTeacher {
            members,
            allowed: store.teachers_of(subject),
        });
    }

    // load caps only when configured: the global option, tightened by any
    // per-teacher limit
    let caps: BTreeMap<TeacherId, u32> = teacher_caps(store, vars, options.teacher_max_load);
    if !caps.is_empty() {
        constraints.push(TimetableConstraint::TeacherLoadCap {
            members: (0..vars.len()).collect(),
            caps,
        });
    }

    constraints
}

fn teacher_caps(
    store: &EntityStore,
    vars: &[ClassPeriodVar],
    global: Option<u32>,
) -> BTreeMap<TeacherId, u32> {
    let subjects: BTreeSet<SubjectId> = vars.iter().map(|v| v.subject).collect();
    let mut caps = BTreeMap::new();
    for subject in subjects {
        for teacher_id in store.teachers_of(subject) {
            let personal = store.teacher(teacher_id).and_then(|t| t.max_periods);
            let cap = match (global, personal) {
                (Some(g), Some(p)) => Some(g.min(p)),
                (Some(g), None) => Some(g),
                (None, Some(p)) => Some(p),
                (None, None) => None,
            };
            if let Some(cap) = cap {
                caps.insert(teacher_id, cap);
            }
        }
    }
    caps
}

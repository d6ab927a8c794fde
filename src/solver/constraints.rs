use crate::solver::variables::{ClassPeriodVar, VarIdx};
use crate::types::{ClassroomId, PeriodId, TeacherId};
use std::collections::{BTreeMap, BTreeSet};

/// A value held by an assigned class-period variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assigned {
    pub period: PeriodId,
    pub teacher: TeacherId,
    pub room: ClassroomId,
}

/// The built-in timetable constraints as tagged variants sharing one
/// conflict-counting entry point. The search proposes values in stages, so a
/// proposal's teacher is absent while the period stage runs; each variant
/// only judges the parts it can see. Resource double-booking is not here:
/// the availability sets encode it.
#[derive(Debug, Clone)]
pub enum TimetableConstraint {
    /// All class-periods of one block: equal ordinals meet in the same
    /// period, distinct ordinals in distinct periods. Gives both block
    /// concurrency and a class never meeting twice in one period.
    SameSet { members: Vec<VarIdx> },
    /// Class-periods sharing a class number across blocks: pairwise
    /// distinct periods, so a band student has at most one class at a time
    BandDisjoint { members: Vec<VarIdx> },
    /// The proposed teacher must be qualified for the subject
    SubjectTeacher {
        members: Vec<VarIdx>,
        allowed: BTreeSet<TeacherId>,
    },
    /// A teacher's assignment count may not exceed their cap
    TeacherLoadCap {
        members: Vec<VarIdx>,
        caps: BTreeMap<TeacherId, u32>,
    },
}

impl TimetableConstraint {
    pub fn members(&self) -> &[VarIdx] {
        match self {
            TimetableConstraint::SameSet { members }
            | TimetableConstraint::BandDisjoint { members }
            | TimetableConstraint::SubjectTeacher { members, .. }
            | TimetableConstraint::TeacherLoadCap { members, .. } => members,
        }
    }

    /// Conflicts that assigning `var = (period, teacher?)` would create
    /// against the current assignment
    pub fn conflicts(
        &self,
        vars: &[ClassPeriodVar],
        var: VarIdx,
        period: PeriodId,
        teacher: Option<TeacherId>,
        assignment: &[Option<Assigned>],
        loads: &BTreeMap<TeacherId, u32>,
    ) -> u32 {
        match self {
            TimetableConstraint::SameSet { members } => {
                let mut conflicts = 0;
                for &other in members {
                    if other == var {
                        continue;
                    }
                    let Some(assigned) = assignment[other] else {
                        continue;
                    };
                    let concurrent = vars[other].ordinal == vars[var].ordinal;
                    if concurrent != (assigned.period == period) {
                        conflicts += 1;
                    }
                }
                conflicts
            }
            TimetableConstraint::BandDisjoint { members } => {
                let mut conflicts = 0;
                for &other in members {
                    if other == var {
                        continue;
                    }
                    if let Some(assigned) = assignment[other] {
                        if assigned.period == period {
                            conflicts += 1;
                        }
                    }
                }
                conflicts
            }
            TimetableConstraint::SubjectTeacher { allowed, .. } => match teacher {
                Some(t) if !allowed.contains(&t) => 1,
                _ => 0,
            },
            TimetableConstraint::TeacherLoadCap { caps, .. } => {
                let Some(t) = teacher else { return 0 };
                match caps.get(&t) {
                    Some(&cap) if loads.get(&t).copied().unwrap_or(0) + 1 > cap => 1,
                    _ => 0,
                }
            }
        }
    }

    /// Whether the constraint relates the periods of two variables; only
    /// these participate in forward checking and AC-3 over period domains
    pub fn is_period_binary(&self) -> bool {
        matches!(
            self,
            TimetableConstraint::SameSet { .. } | TimetableConstraint::BandDisjoint { .. }
        )
    }

    /// Whether `a = pa` and `b = pb` can coexist under this constraint,
    /// ignoring teachers and rooms
    pub fn period_consistent(
        &self,
        vars: &[ClassPeriodVar],
        a: VarIdx,
        pa: PeriodId,
        b: VarIdx,
        pb: PeriodId,
    ) -> bool {
        match self {
            TimetableConstraint::SameSet { .. } => {
                if vars[a].ordinal == vars[b].ordinal {
                    pa == pb
                } else {
                    pa != pb
                }
            }
            TimetableConstraint::BandDisjoint { .. } => pa != pb,
            _ => true,
        }
    }
}

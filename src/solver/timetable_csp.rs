//! The timetable-specific CSP engine.
//!
//! One variable per class-period, value = (period, teacher, room). A
//! monolithic domain would have |P|·|T|·|R| values per variable, so the
//! search runs three nested stages per variable instead: pick a period and
//! check the period-dependent constraints, pick an available qualified
//! teacher, pick an available supporting room. Resource availability and the
//! dense placement matrix are restored exactly on backtrack.

use crate::solver::constraints::{Assigned, TimetableConstraint};
use crate::solver::observer::{SearchControl, SolverObserver};
use crate::solver::variables::{ClassPeriodVar, TimetableProblem, VarIdx};
use crate::types::{ClassId, ClassroomId, PeriodId, Placement, SolveStatus, TeacherId};
use log::debug;
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// How one search run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Every variable holds a value
    Complete,
    /// The tree is exhausted; no solution exists
    Exhausted,
    /// Cancelled or timed out with a partial assignment in place
    Halted(SolveStatus),
}

pub struct TimetableCsp {
    vars: Vec<ClassPeriodVar>,
    period_domains: Vec<Vec<PeriodId>>,
    teacher_domains: Vec<Vec<TeacherId>>,
    room_domains: Vec<Vec<ClassroomId>>,
    constraints: Vec<TimetableConstraint>,
    /// Constraint indices registered per variable
    constraints_of: Vec<Vec<usize>>,
    /// Variables sharing a period-binary constraint, per variable
    neighbours: Vec<BTreeSet<VarIdx>>,

    assignment: Vec<Option<Assigned>>,
    assigned_count: usize,
    teacher_loads: BTreeMap<TeacherId, u32>,

    periods: Vec<PeriodId>,
    teachers: Vec<TeacherId>,
    rooms: Vec<ClassroomId>,
    period_index: BTreeMap<PeriodId, usize>,
    teacher_index: BTreeMap<TeacherId, usize>,
    room_index: BTreeMap<ClassroomId, usize>,
    /// Which teachers are still free in each period; indexed [period][teacher]
    teacher_free: Vec<bool>,
    /// Which rooms are still free in each period; indexed [period][room]
    room_free: Vec<bool>,
    /// Dense periods × teachers × rooms occupancy
    matrix: Vec<Option<ClassId>>,

    /// Working period domains pruned by forward checking (fc only)
    current_period_domains: Vec<Vec<PeriodId>>,
    /// Snapshots pushed on assign, popped on backtrack (fc only)
    domain_stack: Vec<Vec<Vec<PeriodId>>>,

    pub num_backtracks: u64,
    pub num_assigns: u64,
    mcv: bool,
    fc: bool,
    rng: ChaCha8Rng,
}

impl TimetableCsp {
    pub fn new(
        problem: TimetableProblem,
        periods: Vec<PeriodId>,
        teachers: Vec<TeacherId>,
        rooms: Vec<ClassroomId>,
        seed: u64,
    ) -> Self {
        let n = problem.vars.len();

        let mut constraints_of: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut neighbours: Vec<BTreeSet<VarIdx>> = vec![BTreeSet::new(); n];
        for (ci, constraint) in problem.constraints.iter().enumerate() {
            for &member in constraint.members() {
                constraints_of[member].push(ci);
            }
            if constraint.is_period_binary() {
                for &a in constraint.members() {
                    for &b in constraint.members() {
                        if a != b {
                            neighbours[a].insert(b);
                        }
                    }
                }
            }
        }

        let period_index = periods.iter().enumerate().map(|(i, &p)| (p, i)).collect();
        let teacher_index = teachers.iter().enumerate().map(|(i, &t)| (t, i)).collect();
        let room_index = rooms.iter().enumerate().map(|(i, &r)| (r, i)).collect();

        Self {
            assignment: vec![None; n],
            assigned_count: 0,
            teacher_loads: BTreeMap::new(),
            teacher_free: vec![true; periods.len() * teachers.len()],
            room_free: vec![true; periods.len() * rooms.len()],
            matrix: vec![None; periods.len() * teachers.len() * rooms.len()],
            current_period_domains: Vec::new(),
            domain_stack: Vec::new(),
            num_backtracks: 0,
            num_assigns: 0,
            mcv: false,
            fc: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
            vars: problem.vars,
            period_domains: problem.period_domains,
            teacher_domains: problem.teacher_domains,
            room_domains: problem.room_domains,
            constraints: problem.constraints,
            constraints_of,
            neighbours,
            periods,
            teachers,
            rooms,
            period_index,
            teacher_index,
            room_index,
        }
    }

    pub fn variables(&self) -> usize {
        self.vars.len()
    }

    pub fn assigned(&self) -> usize {
        self.assigned_count
    }

    /// Run the staged backtracking search. With `fc`, period domains get an
    /// AC-3 pass first; an emptied domain means the problem is unsolvable
    /// before any assignment is tried.
    pub fn search(
        &mut self,
        mcv: bool,
        fc: bool,
        control: &SearchControl,
        observer: &mut dyn SolverObserver,
    ) -> SearchOutcome {
        self.mcv = mcv;
        self.fc = fc;
        self.num_backtracks = 0;
        self.num_assigns = 0;
        if fc {
            self.current_period_domains = self.period_domains.clone();
            self.ac3();
            if self.current_period_domains.iter().any(|d| d.is_empty()) {
                debug!("AC-3 emptied a period domain before the search started");
                return SearchOutcome::Exhausted;
            }
        }
        self.period_stage(control, observer)
    }

    /// The committed (or partial) assignment as placement records, read out
    /// of the occupancy matrix in period-major order
    pub fn placements(&self) -> Vec<Placement> {
        let mut placements = Vec::with_capacity(self.assigned_count);
        for (pi, &period) in self.periods.iter().enumerate() {
            for (ti, &teacher) in self.teachers.iter().enumerate() {
                for (ri, &classroom) in self.rooms.iter().enumerate() {
                    if let Some(class) = self.matrix[self.cell(pi, ti, ri)] {
                        placements.push(Placement {
                            period,
                            class,
                            teacher,
                            classroom,
                        });
                    }
                }
            }
        }
        placements
    }

    // ---- staged search ----------------------------------------------------

    fn period_stage(
        &mut self,
        control: &SearchControl,
        observer: &mut dyn SolverObserver,
    ) -> SearchOutcome {
        if let Some(status) = control.poll() {
            return SearchOutcome::Halted(status);
        }
        if self.assigned_count == self.vars.len() {
            return SearchOutcome::Complete;
        }
        let var = self.select_unassigned_var();
        observer.on_progress(self.assigned_count, self.vars.len(), self.num_backtracks);
        for period in self.order_period_values(var) {
            if self.conflicts(var, period, None) > 0 {
                continue;
            }
            match self.teacher_stage(var, period, control, observer) {
                SearchOutcome::Exhausted => continue,
                outcome => return outcome,
            }
        }
        SearchOutcome::Exhausted
    }

    fn teacher_stage(
        &mut self,
        var: VarIdx,
        period: PeriodId,
        control: &SearchControl,
        observer: &mut dyn SolverObserver,
    ) -> SearchOutcome {
        for teacher in self.order_teacher_values(var, period) {
            if self.conflicts(var, period, Some(teacher)) > 0 {
                continue;
            }
            match self.room_stage(var, period, teacher, control, observer) {
                SearchOutcome::Exhausted => continue,
                outcome => return outcome,
            }
        }
        SearchOutcome::Exhausted
    }

    fn room_stage(
        &mut self,
        var: VarIdx,
        period: PeriodId,
        teacher: TeacherId,
        control: &SearchControl,
        observer: &mut dyn SolverObserver,
    ) -> SearchOutcome {
        for room in self.order_room_values(var, period) {
            self.assign(var, period, teacher, room, observer);
            match self.period_stage(control, observer) {
                SearchOutcome::Exhausted => {
                    self.backtrack_domains();
                    self.unassign(var);
                }
                outcome => return outcome,
            }
        }
        SearchOutcome::Exhausted
    }

    // ---- bookkeeping ------------------------------------------------------

    fn assign(
        &mut self,
        var: VarIdx,
        period: PeriodId,
        teacher: TeacherId,
        room: ClassroomId,
        observer: &mut dyn SolverObserver,
    ) {
        self.num_assigns += 1;
        let class = self.vars[var].class;
        let pi = self.period_index[&period];
        let ti = self.teacher_index[&teacher];
        let ri = self.room_index[&room];
        let cell = self.cell(pi, ti, ri);
        debug_assert!(self.matrix[cell].is_none(), "cell already occupied");
        self.matrix[cell] = Some(class);
        self.teacher_free[pi * self.teachers.len() + ti] = false;
        self.room_free[pi * self.rooms.len() + ri] = false;
        *self.teacher_loads.entry(teacher).or_insert(0) += 1;
        self.assignment[var] = Some(Assigned {
            period,
            teacher,
            room,
        });
        self.assigned_count += 1;
        debug!(
            "assign class {class} -> period {period} teacher {teacher} room {room} ({}/{})",
            self.assigned_count,
            self.vars.len()
        );
        observer.on_decision(class, period, teacher, room);
        if self.fc {
            self.domain_stack.push(self.current_period_domains.clone());
            self.forward_check(var, period);
        }
    }

    fn unassign(&mut self, var: VarIdx) {
        let assigned = self.assignment[var].take().expect("variable was assigned");
        let pi = self.period_index[&assigned.period];
        let ti = self.teacher_index[&assigned.teacher];
        let ri = self.room_index[&assigned.room];
        let cell = self.cell(pi, ti, ri);
        self.matrix[cell] = None;
        self.teacher_free[pi * self.teachers.len() + ti] = true;
        self.room_free[pi * self.rooms.len() + ri] = true;
        if let Some(load) = self.teacher_loads.get_mut(&assigned.teacher) {
            *load -= 1;
            if *load == 0 {
                self.teacher_loads.remove(&assigned.teacher);
            }
        }
        self.assigned_count -= 1;
    }

    fn backtrack_domains(&mut self) {
        self.num_backtracks += 1;
        if self.fc {
            if let Some(previous) = self.domain_stack.pop() {
                self.current_period_domains = previous;
            }
        }
    }

    fn cell(&self, pi: usize, ti: usize, ri: usize) -> usize {
        (pi * self.teachers.len() + ti) * self.rooms.len() + ri
    }

    // ---- conflicts & pruning ----------------------------------------------

    fn conflicts(&self, var: VarIdx, period: PeriodId, teacher: Option<TeacherId>) -> u32 {
        self.constraints_of[var]
            .iter()
            .map(|&ci| {
                self.constraints[ci].conflicts(
                    &self.vars,
                    var,
                    period,
                    teacher,
                    &self.assignment,
                    &self.teacher_loads,
                )
            })
            .sum()
    }

    /// Prune the working period domains of unassigned neighbours against
    /// `var = period`
    fn forward_check(&mut self, var: VarIdx, period: PeriodId) {
        let vars = &self.vars;
        let constraints = &self.constraints;
        let constraints_of = &self.constraints_of;
        let assignment = &self.assignment;
        for &other in &self.neighbours[var] {
            if assignment[other].is_some() {
                continue;
            }
            let shared: Vec<&TimetableConstraint> = constraints_of[var]
                .iter()
                .map(|&ci| &constraints[ci])
                .filter(|c| c.is_period_binary() && c.members().contains(&other))
                .collect();
            if shared.is_empty() {
                continue;
            }
            self.current_period_domains[other].retain(|&candidate| {
                shared
                    .iter()
                    .all(|c| c.period_consistent(vars, var, period, other, candidate))
            });
        }
    }

    /// Pre-search arc consistency over the period domains; FIFO worklist
    fn ac3(&mut self) {
        let mut queue: VecDeque<(VarIdx, VarIdx)> = (0..self.vars.len())
            .flat_map(|a| self.neighbours[a].iter().map(move |&b| (a, b)))
            .collect();
        while let Some((a, c)) = queue.pop_front() {
            if self.remove_inconsistent_values(a, c) {
                for &b in &self.neighbours[a] {
                    queue.push_back((b, a));
                }
            }
        }
    }

    /// Drop periods of `a` with no supporting period in `c`'s domain
    fn remove_inconsistent_values(&mut self, a: VarIdx, c: VarIdx) -> bool {
        let support = self.current_period_domains[c].clone();
        let vars = &self.vars;
        let constraints = &self.constraints;
        let shared: Vec<&TimetableConstraint> = self.constraints_of[a]
            .iter()
            .map(|&ci| &constraints[ci])
            .filter(|cst| cst.is_period_binary() && cst.members().contains(&c))
            .collect();
        if shared.is_empty() {
            return false;
        }
        let domain = &mut self.current_period_domains[a];
        let before = domain.len();
        domain.retain(|&pa| {
            support
                .iter()
                .any(|&pb| shared.iter().all(|cst| cst.period_consistent(vars, a, pa, c, pb)))
        });
        before != domain.len()
    }

    // ---- value & variable ordering ----------------------------------------

    fn order_period_values(&self, var: VarIdx) -> Vec<PeriodId> {
        if self.fc {
            self.current_period_domains[var].clone()
        } else {
            self.period_domains[var].clone()
        }
    }

    /// Qualified teachers still free in the period, in domain order
    fn order_teacher_values(&self, var: VarIdx, period: PeriodId) -> Vec<TeacherId> {
        let pi = self.period_index[&period];
        self.teacher_domains[var]
            .iter()
            .copied()
            .filter(|t| self.teacher_free[pi * self.teachers.len() + self.teacher_index[t]])
            .collect()
    }

    /// Supporting rooms still free in the period, in domain order
    fn order_room_values(&self, var: VarIdx, period: PeriodId) -> Vec<ClassroomId> {
        let pi = self.period_index[&period];
        self.room_domains[var]
            .iter()
            .copied()
            .filter(|r| self.room_free[pi * self.rooms.len() + self.room_index[r]])
            .collect()
    }

    /// MCV over the lexicographic (periods, teachers, rooms) domain sizes,
    /// ties broken by the seeded rng; uniform seeded choice otherwise
    fn select_unassigned_var(&mut self) -> VarIdx {
        let unassigned: Vec<VarIdx> = (0..self.vars.len())
            .filter(|&v| self.assignment[v].is_none())
            .collect();
        if self.mcv {
            let best = unassigned
                .iter()
                .map(|&v| self.domain_sizes(v))
                .min()
                .expect("at least one unassigned variable");
            let tied: Vec<VarIdx> = unassigned
                .into_iter()
                .filter(|&v| self.domain_sizes(v) == best)
                .collect();
            tied[self.rng.gen_range(0..tied.len())]
        } else {
            unassigned[self.rng.gen_range(0..unassigned.len())]
        }
    }

    fn domain_sizes(&self, var: VarIdx) -> (usize, usize, usize) {
        let periods = if self.fc {
            self.current_period_domains[var].len()
        } else {
            self.period_domains[var].len()
        };
        (
            periods,
            self.teacher_domains[var].len(),
            self.room_domains[var].len(),
        )
    }
}

//! Generic constraint-satisfaction framework.
//!
//! Backtracking search over variables `V` with domain lists of `D`,
//! supporting the Most-Constrained-Variable heuristic, forward checking and
//! AC-3 arc consistency. The timetable solver specializes the same search
//! shape over its triple domains; this engine covers everything with a
//! single value dimension.

use log::debug;
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::Debug;
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CspError {
    #[error("Variable {0} in constraint is not part of the CSP")]
    UnknownVariable(String),
    #[error("Every variable must have a domain assigned to it")]
    MissingDomain,
}

/// One constraint: a member list plus an n-ary predicate over a proposed
/// pair extension and the current partial assignment. Unary and binary
/// constraints are special cases of the same signature.
pub trait CspConstraint<V, D> {
    fn variables(&self) -> &[V];

    /// Whether `v1 = d1` is consistent with `v2 = d2` under `assignment`
    fn satisfied(&self, v1: V, d1: &D, v2: V, d2: &D, assignment: &BTreeMap<V, D>) -> bool;
}

type ConstraintRef<V, D> = Rc<dyn CspConstraint<V, D>>;

/// Evaluate the constraints of `v1` that also involve `v2`
fn pair_satisfied<V: Copy + Ord, D>(
    constraints: &[ConstraintRef<V, D>],
    v1: V,
    d1: &D,
    v2: V,
    d2: &D,
    assignment: &BTreeMap<V, D>,
) -> bool {
    constraints
        .iter()
        .filter(|c| c.variables().contains(&v2))
        .all(|c| c.satisfied(v1, d1, v2, d2, assignment))
}

/// Constraint-satisfaction problem: variables, domains, constraints and the
/// bookkeeping for backtracking over them
pub struct Csp<V, D> {
    pub num_backtracks: u64,
    pub num_assigns: u64,
    mcv: bool,
    fc: bool,
    variables: Vec<V>,
    domains: BTreeMap<V, Vec<D>>,
    constraints: BTreeMap<V, Vec<ConstraintRef<V, D>>>,
    neighbours: BTreeMap<V, BTreeSet<V>>,
    /// Working copies pruned by forward checking and AC-3
    current_domains: BTreeMap<V, Vec<D>>,
    /// Snapshots pushed on assign, popped on backtrack (fc only)
    domain_stack: Vec<BTreeMap<V, Vec<D>>>,
    rng: ChaCha8Rng,
}

impl<V, D> Csp<V, D>
where
    V: Copy + Ord + Debug,
    D: Clone + PartialEq,
{
    pub fn new(seed: u64) -> Self {
        Self {
            num_backtracks: 0,
            num_assigns: 0,
            mcv: false,
            fc: false,
            variables: Vec::new(),
            domains: BTreeMap::new(),
            constraints: BTreeMap::new(),
            neighbours: BTreeMap::new(),
            current_domains: BTreeMap::new(),
            domain_stack: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Set the variables and their domains. Every variable must come with a
    /// domain.
    pub fn set_domains(
        &mut self,
        variables: Vec<V>,
        domains: BTreeMap<V, Vec<D>>,
    ) -> Result<(), CspError> {
        for variable in &variables {
            if !domains.contains_key(variable) {
                return Err(CspError::MissingDomain);
            }
            self.constraints.insert(*variable, Vec::new());
            self.neighbours.insert(*variable, BTreeSet::new());
        }
        self.variables = variables;
        self.domains = domains;
        Ok(())
    }

    /// Register a constraint under each of its member variables
    pub fn add_constraint(&mut self, constraint: ConstraintRef<V, D>) -> Result<(), CspError> {
        for variable in constraint.variables() {
            if !self.domains.contains_key(variable) {
                return Err(CspError::UnknownVariable(format!("{variable:?}")));
            }
        }
        for variable in constraint.variables() {
            self.constraints
                .get_mut(variable)
                .expect("registered above")
                .push(Rc::clone(&constraint));
            let others = self
                .neighbours
                .get_mut(variable)
                .expect("registered above");
            others.extend(constraint.variables().iter().copied());
            others.remove(variable);
        }
        Ok(())
    }

    /// Entry point. With `fc`, working domains are initialized and one AC-3
    /// pass runs; a domain emptied pre-search means no solution exists.
    pub fn backtracking_search(&mut self, mcv: bool, fc: bool) -> Option<BTreeMap<V, D>> {
        self.num_backtracks = 0;
        self.num_assigns = 0;
        self.mcv = mcv;
        self.fc = fc;
        self.current_domains.clear();
        self.domain_stack.clear();
        if fc {
            self.current_domains = self.domains.clone();
            self.ac3(None);
            if self.current_domains.values().any(|d| d.is_empty()) {
                debug!("AC-3 emptied a domain before the search started");
                return None;
            }
        }
        let mut assignment = BTreeMap::new();
        if self.recursive_backtracking(&mut assignment) {
            Some(assignment)
        } else {
            None
        }
    }

    /// Depth-first search which backtracks to the last decision point and
    /// chooses a different path
    fn recursive_backtracking(&mut self, assignment: &mut BTreeMap<V, D>) -> bool {
        if assignment.len() == self.variables.len() {
            return true;
        }
        let variable = self.select_unassigned_variable(assignment);
        for value in self.order_domain_values(variable) {
            if self.num_conflicts(variable, &value, assignment) == 0 {
                self.assign(variable, value, assignment);
                if self.recursive_backtracking(assignment) {
                    return true;
                }
                self.backtrack_domains();
                assignment.remove(&variable);
            }
        }
        false
    }

    /// Record the assignment; with `fc`, snapshot the working domains, prune
    /// the neighbours' domains, and re-establish arc consistency on the arcs
    /// pointing at the assigned variable
    fn assign(&mut self, variable: V, value: D, assignment: &mut BTreeMap<V, D>) {
        self.num_assigns += 1;
        assignment.insert(variable, value.clone());
        if self.fc {
            self.domain_stack.push(self.current_domains.clone());
            self.forward_check(variable, &value, assignment);
            let incoming: Vec<(V, V)> = self.neighbours[&variable]
                .iter()
                .map(|&other| (other, variable))
                .collect();
            self.ac3(Some(incoming));
        }
    }

    fn backtrack_domains(&mut self) {
        self.num_backtracks += 1;
        if self.fc {
            if let Some(previous) = self.domain_stack.pop() {
                self.current_domains = previous;
            }
        }
    }

    /// Count assigned neighbours inconsistent with `variable = value`
    fn num_conflicts(&self, variable: V, value: &D, assignment: &BTreeMap<V, D>) -> u32 {
        let constraints = &self.constraints[&variable];
        let mut conflicts = 0;
        for other in &self.neighbours[&variable] {
            if let Some(assigned) = assignment.get(other) {
                if !pair_satisfied(constraints, variable, value, *other, assigned, assignment) {
                    conflicts += 1;
                }
            }
        }
        conflicts
    }

    /// Remove values inconsistent with `variable = value` from the working
    /// domains of unassigned neighbours
    fn forward_check(&mut self, variable: V, value: &D, assignment: &BTreeMap<V, D>) {
        let constraints = &self.constraints[&variable];
        for other in &self.neighbours[&variable] {
            if assignment.contains_key(other) {
                continue;
            }
            if let Some(domain) = self.current_domains.get_mut(other) {
                domain.retain(|candidate| {
                    pair_satisfied(constraints, variable, value, *other, candidate, assignment)
                });
            }
        }
    }

    /// Arc consistency over the working domains; FIFO worklist
    fn ac3(&mut self, queue: Option<Vec<(V, V)>>) {
        let mut queue: VecDeque<(V, V)> = match queue {
            Some(arcs) => arcs.into(),
            None => self
                .variables
                .iter()
                .flat_map(|&a| self.neighbours[&a].iter().map(move |&b| (a, b)))
                .collect(),
        };
        while let Some((a, c)) = queue.pop_front() {
            if self.remove_inconsistent_values(a, c) {
                for &b in &self.neighbours[&a] {
                    queue.push_back((b, a));
                }
            }
        }
    }

    /// Drop values of `a` that have no supporting value in `c`'s domain.
    /// Returns whether anything was removed.
    fn remove_inconsistent_values(&mut self, a: V, c: V) -> bool {
        let support = self.current_domains.get(&c).cloned().unwrap_or_default();
        let empty = BTreeMap::new();
        let constraints = &self.constraints[&a];
        let Some(domain) = self.current_domains.get_mut(&a) else {
            return false;
        };
        let before = domain.len();
        domain.retain(|value| {
            support
                .iter()
                .any(|candidate| pair_satisfied(constraints, a, value, c, candidate, &empty))
        });
        before != domain.len()
    }

    /// MCV picks the variable with the fewest current legal values, ties
    /// broken by the seeded rng; otherwise a uniform seeded-random choice
    fn select_unassigned_variable(&mut self, assignment: &BTreeMap<V, D>) -> V {
        let unassigned: Vec<V> = self
            .variables
            .iter()
            .copied()
            .filter(|v| !assignment.contains_key(v))
            .collect();
        if self.mcv {
            let best = unassigned
                .iter()
                .map(|v| self.num_legal_values(*v))
                .min()
                .expect("at least one unassigned variable");
            let tied: Vec<V> = unassigned
                .into_iter()
                .filter(|v| self.num_legal_values(*v) == best)
                .collect();
            tied[self.rng.gen_range(0..tied.len())]
        } else {
            unassigned[self.rng.gen_range(0..unassigned.len())]
        }
    }

    fn num_legal_values(&self, variable: V) -> usize {
        if self.fc {
            self.current_domains[&variable].len()
        } else {
            self.domains[&variable].len()
        }
    }

    /// Domain values in source-list order; the pruned copy when fc is on
    fn order_domain_values(&self, variable: V) -> Vec<D> {
        if self.fc {
            self.current_domains[&variable].clone()
        } else {
            self.domains[&variable].clone()
        }
    }

    /// Working domain of a variable, for inspection in tests and diagnostics
    pub fn current_domain(&self, variable: V) -> Option<&[D]> {
        self.current_domains.get(&variable).map(|d| d.as_slice())
    }
}

//! BDD-backed transition systems.
//!
//! State variables are encoded as present/next BDD variable pairs and
//! input variables as their own BDD variables, so the transition relation
//! is a single BDD `T(s, i, s')`. Successor and predecessor images are
//! relational products: conjoin, quantify, rename.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::rc::Rc;

use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::formula::Prop;
use crate::model::{Error, TransitionModel};
use crate::reference::Ref;
use crate::set::StateSet;

/// A state set represented by a BDD node.
///
/// Equality of handles is semantic equality of sets: the manager is
/// canonical, so two sets are equal iff their nodes coincide.
#[derive(Clone)]
pub struct BddSet {
    bdd: Rc<Bdd>,
    node: Ref,
}

impl BddSet {
    pub fn node(&self) -> Ref {
        self.node
    }
}

impl PartialEq for BddSet {
    fn eq(&self, other: &Self) -> bool {
        debug_assert!(Rc::ptr_eq(&self.bdd, &other.bdd), "sets from different managers");
        self.node == other.node
    }
}

impl Eq for BddSet {}

impl std::fmt::Debug for BddSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BddSet({})", self.node)
    }
}

impl StateSet for BddSet {
    fn union(&self, other: &Self) -> Self {
        BddSet {
            bdd: Rc::clone(&self.bdd),
            node: self.bdd.apply_or(self.node, other.node),
        }
    }

    fn intersect(&self, other: &Self) -> Self {
        BddSet {
            bdd: Rc::clone(&self.bdd),
            node: self.bdd.apply_and(self.node, other.node),
        }
    }

    fn subtract(&self, other: &Self) -> Self {
        BddSet {
            bdd: Rc::clone(&self.bdd),
            node: self.bdd.apply_and(self.node, -other.node),
        }
    }

    fn is_empty(&self) -> bool {
        self.bdd.is_zero(self.node)
    }

    fn entails(&self, other: &Self) -> bool {
        self.bdd.is_implies(self.node, other.node)
    }
}

#[derive(Debug, Clone)]
struct StateVar {
    name: String,
    present: u32,
    next: u32,
}

#[derive(Debug, Clone)]
struct InputVar {
    name: String,
    var: u32,
}

/// A symbolic transition system over boolean state and input variables.
///
/// Built by declaring variables, then setting the initial-state BDD and
/// the transition relation; read-only afterwards.
pub struct BddSystem {
    bdd: Rc<Bdd>,
    state_vars: Vec<StateVar>,
    input_vars: Vec<InputVar>,
    next_free_var: u32,
    init: Ref,
    transition: Ref,
    labels: HashMap<String, Ref>,
}

impl BddSystem {
    pub fn new() -> Self {
        let bdd = Rc::new(Bdd::new());
        let zero = bdd.zero();
        Self {
            bdd,
            state_vars: Vec::new(),
            input_vars: Vec::new(),
            next_free_var: 1,
            init: zero,
            transition: zero,
            labels: HashMap::new(),
        }
    }

    pub fn bdd(&self) -> &Bdd {
        &self.bdd
    }

    fn alloc_var(&mut self) -> u32 {
        let v = self.next_free_var;
        self.next_free_var += 1;
        v
    }

    /// Declare a boolean state variable; returns its (present, next) BDD
    /// variable indices.
    pub fn declare_var(&mut self, name: impl Into<String>) -> (u32, u32) {
        let name = name.into();
        if let Some(sv) = self.state_vars.iter().find(|sv| sv.name == name) {
            return (sv.present, sv.next);
        }
        let present = self.alloc_var();
        let next = self.alloc_var();
        self.state_vars.push(StateVar {
            name,
            present,
            next,
        });
        (present, next)
    }

    /// Declare a boolean input variable; returns its BDD variable index.
    pub fn declare_input(&mut self, name: impl Into<String>) -> u32 {
        let name = name.into();
        if let Some(iv) = self.input_vars.iter().find(|iv| iv.name == name) {
            return iv.var;
        }
        let var = self.alloc_var();
        self.input_vars.push(InputVar { name, var });
        var
    }

    /// The present-state literal of a declared state variable.
    pub fn var(&self, name: &str) -> Option<Ref> {
        self.state_vars
            .iter()
            .find(|sv| sv.name == name)
            .map(|sv| self.bdd.mk_var(sv.present))
    }

    /// The next-state literal of a declared state variable.
    pub fn var_next(&self, name: &str) -> Option<Ref> {
        self.state_vars
            .iter()
            .find(|sv| sv.name == name)
            .map(|sv| self.bdd.mk_var(sv.next))
    }

    /// The literal of a declared input variable.
    pub fn input(&self, name: &str) -> Option<Ref> {
        self.input_vars
            .iter()
            .find(|iv| iv.name == name)
            .map(|iv| self.bdd.mk_var(iv.var))
    }

    pub fn set_init(&mut self, init: Ref) {
        self.init = init;
    }

    pub fn set_transition(&mut self, transition: Ref) {
        self.transition = transition;
    }

    /// Label a state set with an atom name usable in formulas.
    pub fn add_label(&mut self, name: impl Into<String>, states: Ref) {
        self.labels.insert(name.into(), states);
    }

    /// The constraint `name' ↔ expr` for a transition relation.
    pub fn assign_var(&self, name: &str, expr: Ref) -> Ref {
        let next = self
            .var_next(name)
            .expect("assign_var: variable not declared");
        self.bdd.apply_eq(next, expr)
    }

    /// The constraint `name' ↔ name` (the variable keeps its value).
    pub fn unchanged_var(&self, name: &str) -> Ref {
        let present = self.var(name).expect("unchanged_var: variable not declared");
        self.assign_var(name, present)
    }

    /// Conjoin per-variable constraints into a transition relation.
    pub fn build_transition(&self, constraints: &[Ref]) -> Ref {
        self.bdd.apply_and_many(constraints.iter().copied())
    }

    /// Wrap a raw BDD node into a state set of this system.
    pub fn mk_set(&self, node: Ref) -> BddSet {
        BddSet {
            bdd: Rc::clone(&self.bdd),
            node,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.bdd.is_zero(self.init) {
            return Err(Error::NoInitialStates);
        }
        if self.bdd.is_zero(self.transition) {
            return Err(Error::NoTransitions);
        }
        Ok(())
    }

    fn present_vars(&self) -> Vec<u32> {
        self.state_vars.iter().map(|sv| sv.present).collect()
    }

    fn next_vars(&self) -> Vec<u32> {
        self.state_vars.iter().map(|sv| sv.next).collect()
    }

    fn input_var_ids(&self) -> Vec<u32> {
        self.input_vars.iter().map(|iv| iv.var).collect()
    }

    fn present_to_next(&self) -> Vec<(u32, u32)> {
        self.state_vars
            .iter()
            .map(|sv| (sv.present, sv.next))
            .collect()
    }

    fn next_to_present(&self) -> Vec<(u32, u32)> {
        self.state_vars
            .iter()
            .map(|sv| (sv.next, sv.present))
            .collect()
    }

    /// Number of states in a state set.
    pub fn count_states(&self, states: &BddSet) -> BigUint {
        self.bdd.sat_count(states.node, self.state_vars.len())
    }

    /// Pick one full assignment over `vars` from a satisfying cube,
    /// defaulting don't-cares to false.
    fn complete_cube(&self, node: Ref, vars: &[u32]) -> Ref {
        let path = self
            .bdd
            .one_sat(node)
            .expect("picking from an empty set");
        let mut literals = Vec::with_capacity(vars.len());
        for &v in vars {
            let lit = path
                .iter()
                .find(|lit| lit.unsigned_abs() == v)
                .copied()
                .unwrap_or(-(v as i32));
            literals.push(lit);
        }
        self.bdd.cube(literals)
    }

    fn assignment(&self, node: Ref, vars: &[(String, u32)]) -> BTreeMap<String, bool> {
        let path = self.bdd.one_sat(node).unwrap_or_default();
        let mut map = BTreeMap::new();
        for (name, v) in vars {
            let value = path
                .iter()
                .find(|lit| lit.unsigned_abs() == *v)
                .map(|&lit| lit > 0)
                .unwrap_or(false);
            map.insert(name.clone(), value);
        }
        map
    }

    /// Decode a singleton state set into a name-to-value map.
    pub fn state_assignment(&self, state: &BddSet) -> BTreeMap<String, bool> {
        let vars: Vec<(String, u32)> = self
            .state_vars
            .iter()
            .map(|sv| (sv.name.clone(), sv.present))
            .collect();
        self.assignment(state.node, &vars)
    }

    /// Decode a singleton input set into a name-to-value map.
    pub fn input_assignment(&self, inputs: &BddSet) -> BTreeMap<String, bool> {
        let vars: Vec<(String, u32)> = self
            .input_vars
            .iter()
            .map(|iv| (iv.name.clone(), iv.var))
            .collect();
        self.assignment(inputs.node, &vars)
    }

    fn eval_prop(&self, prop: &Prop) -> Result<Ref, Error> {
        match prop {
            Prop::True => Ok(self.bdd.one()),
            Prop::False => Ok(self.bdd.zero()),
            Prop::Atom(name) => {
                if let Some(lit) = self.var(name) {
                    return Ok(lit);
                }
                self.labels
                    .get(name)
                    .copied()
                    .ok_or_else(|| Error::UnknownAtom(name.clone()))
            }
            Prop::Not(p) => Ok(-self.eval_prop(p)?),
            Prop::And(p, q) => Ok(self.bdd.apply_and(self.eval_prop(p)?, self.eval_prop(q)?)),
            Prop::Or(p, q) => Ok(self.bdd.apply_or(self.eval_prop(p)?, self.eval_prop(q)?)),
            Prop::Xor(p, q) => Ok(self.bdd.apply_xor(self.eval_prop(p)?, self.eval_prop(q)?)),
            Prop::Implies(p, q) => {
                Ok(self.bdd.apply_imply(self.eval_prop(p)?, self.eval_prop(q)?))
            }
            Prop::Iff(p, q) => Ok(self.bdd.apply_eq(self.eval_prop(p)?, self.eval_prop(q)?)),
        }
    }
}

impl Default for BddSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BddSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BddSystem")
            .field("state_vars", &self.state_vars.len())
            .field("input_vars", &self.input_vars.len())
            .field("bdd_nodes", &self.bdd.num_nodes())
            .finish()
    }
}

impl TransitionModel for BddSystem {
    type Set = BddSet;

    fn init(&self) -> BddSet {
        self.mk_set(self.init)
    }

    fn empty(&self) -> BddSet {
        self.mk_set(self.bdd.zero())
    }

    /// `∃s, i. S(s) ∧ T(s, i, s')`, renamed back to present variables.
    fn post(&self, states: &BddSet) -> BddSet {
        let conj = self.bdd.apply_and(states.node, self.transition);
        let mut quantified = self.present_vars();
        quantified.extend(self.input_var_ids());
        let image_next = self.bdd.exists(conj, &quantified);
        self.mk_set(self.bdd.rename(image_next, &self.next_to_present()))
    }

    /// `∃s', i. T(s, i, s') ∧ S(s')`.
    fn pre(&self, states: &BddSet) -> BddSet {
        let states_next = self.bdd.rename(states.node, &self.present_to_next());
        let conj = self.bdd.apply_and(self.transition, states_next);
        let mut quantified = self.next_vars();
        quantified.extend(self.input_var_ids());
        self.mk_set(self.bdd.exists(conj, &quantified))
    }

    fn pick_one_state(&self, states: &BddSet) -> BddSet {
        self.mk_set(self.complete_cube(states.node, &self.present_vars()))
    }

    fn pick_one_inputs(&self, inputs: &BddSet) -> BddSet {
        if self.input_vars.is_empty() {
            // No input variables: the (unique) input assignment is empty.
            return self.mk_set(self.bdd.one());
        }
        self.mk_set(self.complete_cube(inputs.node, &self.input_var_ids()))
    }

    /// `∃s, s'. from(s) ∧ to(s') ∧ T(s, i, s')`.
    fn inputs_between(&self, from: &BddSet, to: &BddSet) -> BddSet {
        let to_next = self.bdd.rename(to.node, &self.present_to_next());
        let conj = self
            .bdd
            .apply_and_many([from.node, to_next, self.transition]);
        let mut quantified = self.present_vars();
        quantified.extend(self.next_vars());
        self.mk_set(self.bdd.exists(conj, &quantified))
    }

    fn eval(&self, prop: &Prop) -> Result<BddSet, Error> {
        Ok(self.mk_set(self.eval_prop(prop)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::reach::compute_reach;
    use crate::verify::{verify_invariant, verify_reactivity, Verdict};

    /// One-bit toggle: x' = !x, starting from x = 0.
    fn toggle() -> BddSystem {
        let mut sys = BddSystem::new();
        sys.declare_var("x");
        let x = sys.var("x").unwrap();
        sys.set_init(-x);
        let t = sys.assign_var("x", -x);
        sys.set_transition(t);
        sys
    }

    /// Two-bit counter: x' = !x, y' = y ⊕ x, starting from 00.
    fn counter() -> BddSystem {
        let mut sys = BddSystem::new();
        sys.declare_var("x");
        sys.declare_var("y");
        let x = sys.var("x").unwrap();
        let y = sys.var("y").unwrap();
        sys.set_init(sys.bdd().apply_and(-x, -y));
        let t = sys.build_transition(&[
            sys.assign_var("x", -x),
            sys.assign_var("y", sys.bdd().apply_xor(y, x)),
        ]);
        sys.set_transition(t);
        sys
    }

    #[test]
    fn test_toggle_images() {
        let sys = toggle();
        let x = sys.var("x").unwrap();

        let from_zero = sys.post(&sys.init());
        assert_eq!(from_zero, sys.mk_set(x));

        let back = sys.pre(&sys.mk_set(x));
        assert_eq!(back, sys.mk_set(-x));
    }

    #[test]
    fn test_counter_reach() {
        let sys = counter();
        let (reach, trace) = compute_reach(&sys);

        // All four states are reachable, one new state per layer.
        assert_eq!(sys.count_states(&reach), BigUint::from(4u8));
        assert_eq!(trace.len(), 4);
        for layer in trace.layers() {
            assert_eq!(sys.count_states(layer), BigUint::from(1u8));
        }
    }

    #[test]
    fn test_pick_one_state_is_singleton() {
        let sys = counter();
        let (reach, _) = compute_reach(&sys);
        let s = sys.pick_one_state(&reach);
        assert_eq!(sys.count_states(&s), BigUint::from(1u8));
        assert!(s.entails(&reach));
    }

    #[test]
    fn test_invariant_on_counter() {
        let sys = counter();

        // "Not both bits set" fails at state 11.
        let p = Prop::atom("x").and(Prop::atom("y")).not();
        let verdict = verify_invariant(&sys, &p).unwrap();
        let w = verdict.witness().expect("11 is reachable");
        assert_eq!(w.len(), 7);

        let last = sys.state_assignment(w.last_state());
        assert_eq!(last["x"], true);
        assert_eq!(last["y"], true);
    }

    #[test]
    fn test_invariant_holds_on_counter() {
        let sys = counter();
        // Tautology over the state bits.
        let p = Prop::atom("x").or(Prop::atom("x").not());
        assert!(verify_invariant(&sys, &p).unwrap().holds());
    }

    #[test]
    fn test_reactivity_on_toggle() {
        let sys = toggle();

        // The toggle alternates forever: GF x -> GF !x holds.
        let verdict =
            verify_reactivity(&sys, &Prop::atom("x"), &Prop::atom("x").not()).unwrap();
        assert!(verdict.holds());
    }

    #[test]
    fn test_reactivity_with_input_choice() {
        // s = 0: the scheduler may hold (stay) or move to s = 1;
        // s = 1: always back to s = 0. With the hold input always chosen,
        // the run stays in s = 0 forever, so GF (s=0) -> GF (s=1) fails.
        let mut sys = BddSystem::new();
        sys.declare_var("s");
        let hold = sys.declare_input("hold");
        let s = sys.var("s").unwrap();
        let hold = sys.bdd().mk_var(hold);
        sys.set_init(-s);

        // s' = !s ∧ !hold  (move only when not holding; from s=1 always back)
        let next = sys.bdd().apply_and(-s, -hold);
        sys.set_transition(sys.assign_var("s", next));
        sys.add_label("at0", -s);
        sys.add_label("at1", s);

        let verdict = verify_reactivity(&sys, &Prop::atom("at0"), &Prop::atom("at1")).unwrap();
        let w = match verdict {
            Verdict::Violated(w) => w,
            Verdict::Satisfied => panic!("holding forever avoids s=1"),
        };

        // The lasso loops in s = 0 with the hold input set.
        assert_eq!(w.last_state(), w.first_state());
        let inputs: Vec<_> = w.inputs().collect();
        let last_input = sys.input_assignment(inputs[inputs.len() - 1]);
        assert_eq!(last_input["hold"], true);
    }

    #[test]
    fn test_eval_atoms_and_labels() {
        let mut sys = counter();
        let x = sys.var("x").unwrap();
        let y = sys.var("y").unwrap();
        sys.add_label("odd", x);

        assert_eq!(sys.eval(&Prop::atom("x")).unwrap(), sys.mk_set(x));
        assert_eq!(sys.eval(&Prop::atom("odd")).unwrap(), sys.mk_set(x));
        assert_eq!(
            sys.eval(&Prop::atom("x").and(Prop::atom("y"))).unwrap(),
            sys.mk_set(sys.bdd().apply_and(x, y))
        );
        assert!(sys.eval(&Prop::atom("z")).is_err());
    }

    #[test]
    fn test_validate() {
        let mut sys = BddSystem::new();
        sys.declare_var("x");
        assert_eq!(sys.validate(), Err(Error::NoInitialStates));
        let x = sys.var("x").unwrap();
        sys.set_init(-x);
        assert_eq!(sys.validate(), Err(Error::NoTransitions));
        sys.set_transition(sys.unchanged_var("x"));
        assert!(sys.validate().is_ok());
    }
}

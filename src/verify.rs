//! The verifier facade: classification-driven dispatch, verdicts, and
//! counterexample assembly.

use log::debug;

use crate::fair::{build_cycle, find_fair_cycle};
use crate::formula::{Prop, Property};
use crate::model::{Error, TransitionModel};
use crate::reach::{check_invariant, compute_reach};
use crate::set::StateSet;
use crate::witness::{generate_witness, Witness};

/// Outcome of a verification run.
///
/// The boolean verdict is deterministic for a fixed model; the witness
/// content may differ between runs of an implementation with a
/// nondeterministic `pick_one_*`, since many valid witnesses can exist.
#[derive(Debug, Clone)]
pub enum Verdict<S> {
    Satisfied,
    Violated(Witness<S>),
}

impl<S> Verdict<S> {
    pub fn holds(&self) -> bool {
        matches!(self, Verdict::Satisfied)
    }

    pub fn witness(&self) -> Option<&Witness<S>> {
        match self {
            Verdict::Satisfied => None,
            Verdict::Violated(w) => Some(w),
        }
    }
}

/// Check that `p` holds in every reachable state.
///
/// On violation the witness is a concrete execution from an initial
/// state to a state falsifying `p`.
pub fn verify_invariant<M: TransitionModel>(
    model: &M,
    p: &Prop,
) -> Result<Verdict<M::Set>, Error> {
    let bad = model.eval(&p.clone().not())?;
    Ok(check_invariant(model, &bad))
}

/// Check the reactivity property `GF f -> GF g`.
///
/// On violation the witness is a lasso: a finite prefix from an initial
/// state to the cycle-start state, followed by a cyclic suffix that stays
/// in `¬g`, starts in `f ∧ ¬g`, and closes back on the start state.
pub fn verify_reactivity<M: TransitionModel>(
    model: &M,
    f: &Prop,
    g: &Prop,
) -> Result<Verdict<M::Set>, Error> {
    let f_states = model.eval(f)?;
    let not_g = model.eval(&g.clone().not())?;

    let (reach, trace) = compute_reach(model);
    let fair = match find_fair_cycle(model, &reach, &f_states, &not_g) {
        None => return Ok(Verdict::Satisfied),
        Some(fair) => fair,
    };

    // The frontier layers are pairwise disjoint, so the singleton start
    // state lies in exactly one of them; the prefix runs through the
    // layers strictly before it and ends on the start state itself.
    let cut = trace
        .layer_of(&fair.start)
        .expect("cycle start must be reachable");
    debug!("reactivity: cycle start found in layer {}", cut);

    let mut layers: Vec<M::Set> = trace.layers()[..cut].to_vec();
    layers.push(fair.start.clone());

    let prefix = generate_witness(model, &layers, &fair.start);
    let cycle = build_cycle(model, &fair);
    Ok(Verdict::Violated(prefix.concat(cycle)))
}

/// Verify a classified property.
///
/// Returns `Ok(None)` for [`Property::Unrecognized`]: an unsupported
/// shape is skipped, not an error.
pub fn verify<M: TransitionModel>(
    model: &M,
    property: &Property,
) -> Result<Option<Verdict<M::Set>>, Error> {
    match property {
        Property::Invariant(p) => verify_invariant(model, p).map(Some),
        Property::Reactivity(f, g) => verify_reactivity(model, f, g).map(Some),
        Property::Unrecognized => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::explicit::{Bits, ExplicitSystem};
    use crate::formula::{classify, Formula};

    /// Scenario A: two states, `s0 (x=0) -> s1 (x=1) -> s1`, invariant `x=0`.
    fn toggle_system() -> ExplicitSystem {
        let mut sys = ExplicitSystem::new(2, 1);
        sys.name_input(0, "tick");
        sys.set_init([0]);
        sys.add_transition(0, 0, 1);
        sys.add_transition(1, 0, 1);
        sys.add_label("x0", [0]);
        sys
    }

    #[test]
    fn test_invariant_violated_scenario() {
        let sys = toggle_system();
        let verdict = verify_invariant(&sys, &Prop::atom("x0")).unwrap();
        assert!(!verdict.holds());

        let w = verdict.witness().unwrap();
        assert_eq!(w.len(), 3);
        assert_eq!(w.first_state(), &sys.state_singleton(0));
        assert_eq!(w.last_state(), &sys.state_singleton(1));
        assert!(sys.is_valid_execution(w));
    }

    #[test]
    fn test_invariant_holds() {
        let mut sys = toggle_system();
        sys.add_label("reachable", [0, 1]);
        let verdict = verify_invariant(&sys, &Prop::atom("reachable")).unwrap();
        assert!(verdict.holds());
        assert!(verdict.witness().is_none());
    }

    /// Scenario B: the two-state ring `s0 <-> s1`.
    #[test]
    fn test_reactivity_holds_on_ring() {
        let mut sys = ExplicitSystem::new(2, 1);
        sys.name_input(0, "tick");
        sys.set_init([0]);
        sys.add_transition(0, 0, 1);
        sys.add_transition(1, 0, 0);
        sys.add_label("at_s0", [0]);
        sys.add_label("at_s1", [1]);

        let verdict =
            verify_reactivity(&sys, &Prop::atom("at_s0"), &Prop::atom("at_s1")).unwrap();
        assert!(verdict.holds());
    }

    /// Scenario C: an absorbing `f ∧ ¬g` state reachable from the start.
    #[test]
    fn test_reactivity_violated_by_absorbing_state() {
        let mut sys = ExplicitSystem::new(3, 1);
        sys.name_input(0, "tick");
        sys.set_init([0]);
        sys.add_transition(0, 0, 1);
        sys.add_transition(0, 0, 2);
        sys.add_transition(1, 0, 0);
        sys.add_transition(2, 0, 2);
        sys.add_label("f", [2]);
        sys.add_label("g", [1]);

        let verdict = verify_reactivity(&sys, &Prop::atom("f"), &Prop::atom("g")).unwrap();
        assert!(!verdict.holds());

        let w = verdict.witness().unwrap();
        assert!(sys.is_valid_execution(w));
        assert!(w.first_state().entails(&sys.init()));

        // The cyclic suffix is exactly [s2, input, s2].
        let states: Vec<&Bits> = w.states().collect();
        let n = states.len();
        assert_eq!(states[n - 1], &sys.state_singleton(2));
        assert_eq!(states[n - 2], &sys.state_singleton(2));
    }

    /// The cyclic suffix must stay in ¬g and start in f ∧ ¬g.
    #[test]
    fn test_violation_suffix_avoids_g() {
        let mut sys = ExplicitSystem::new(4, 1);
        sys.name_input(0, "tick");
        sys.set_init([0]);
        // 0 -> 1 (g-state) -> 2 -> 3 -> 2: the loop 2 -> 3 -> 2 avoids g.
        sys.add_transition(0, 0, 1);
        sys.add_transition(1, 0, 2);
        sys.add_transition(2, 0, 3);
        sys.add_transition(3, 0, 2);
        sys.add_label("f", [2]);
        sys.add_label("g", [1]);

        let verdict = verify_reactivity(&sys, &Prop::atom("f"), &Prop::atom("g")).unwrap();
        let w = verdict.witness().unwrap();
        assert!(sys.is_valid_execution(w));

        // Locate the loop: the final state closes back on an earlier one.
        let states: Vec<&Bits> = w.states().collect();
        let last = states[states.len() - 1];
        let loop_start = states.iter().position(|s| *s == last).unwrap();
        assert!(loop_start < states.len() - 1);

        let g_states = sys.state_set([1]);
        for s in &states[loop_start..] {
            assert!(s.intersect(&g_states).is_empty());
        }
        // The designated start state satisfies f ∧ ¬g.
        assert!(last.entails(&sys.state_set([2])));
    }

    #[test]
    fn test_verify_dispatch() {
        let sys = toggle_system();

        let inv = classify(&Formula::atom("x0").globally());
        let out = verify(&sys, &inv).unwrap();
        assert!(!out.unwrap().holds());

        let skipped = classify(&Formula::atom("x0").finally());
        assert!(verify(&sys, &skipped).unwrap().is_none());
    }

    #[test]
    fn test_unknown_atom_is_fatal() {
        let sys = toggle_system();
        let err = verify_invariant(&sys, &Prop::atom("nope")).unwrap_err();
        assert_eq!(err, Error::UnknownAtom("nope".to_string()));
    }

    #[test]
    fn test_verdict_idempotence() {
        let sys = toggle_system();
        let a = verify_invariant(&sys, &Prop::atom("x0")).unwrap().holds();
        let b = verify_invariant(&sys, &Prop::atom("x0")).unwrap().holds();
        assert_eq!(a, b);
    }
}

//! Fair-cycle detection for GR(1) reactivity properties.
//!
//! A violation of `GF f -> GF g` is an infinite execution that, from some
//! point on, stays inside `¬g` forever while revisiting `f ∧ ¬g`
//! infinitely often. Over a finite state space such an execution exists
//! iff some reachable `f ∧ ¬g` state lies on a cycle through `¬g` states,
//! which the nested fixpoint below decides symbolically.

use log::debug;

use crate::model::TransitionModel;
use crate::set::StateSet;
use crate::witness::Witness;

/// A located fair loop: a concrete start state together with the forward
/// frontier layers that close the loop back into it.
#[derive(Debug, Clone)]
pub struct FairLoop<S> {
    /// Singleton state in `f ∧ ¬g` known to lie on a `¬g` cycle.
    pub start: S,
    /// Forward frontiers of `start` restricted to the backward closure,
    /// used to extract one concrete cyclic path.
    pub cycle_trace: Vec<S>,
}

/// Decide whether `reach ∧ f ∧ ¬g` contains a state that starts an
/// infinite path staying in `¬g` and revisiting `f ∧ ¬g` forever.
///
/// `recur` is the candidate set; it only ever shrinks, and each outer
/// iteration either returns or strictly shrinks it, so the outer loop is
/// bounded by the size of the state space. The inner loop is a backward
/// reachability pass restricted to `¬g`, bounded the same way.
pub fn find_fair_cycle<M: TransitionModel>(
    model: &M,
    reach: &M::Set,
    f: &M::Set,
    not_g: &M::Set,
) -> Option<FairLoop<M::Set>> {
    let mut recur = reach.intersect(f).intersect(not_g);

    let mut iteration = 0usize;
    while !recur.is_empty() {
        iteration += 1;
        debug!("fair cycle: outer iteration {}", iteration);

        let mut pre_reach = model.empty();
        let mut new = model.pre(&recur).intersect(not_g);

        loop {
            if new.is_empty() {
                // Drop candidates that cannot be reached back into.
                recur = recur.intersect(&pre_reach);
                break;
            }
            pre_reach = pre_reach.union(&new);
            if recur.entails(&pre_reach) {
                // Every candidate can reach back into the candidate set:
                // a cycle exists, locate a concrete one.
                return Some(find_cycle_start(model, &recur, &pre_reach));
            }
            new = model.pre(&new).subtract(&pre_reach).intersect(not_g);
        }
    }

    None
}

/// Find one concrete state of `recur` that can reach itself through
/// `pre_reach`, together with the forward frontiers proving it.
///
/// A candidate is accepted when it is contained in the part of `recur`
/// forward-reachable from itself within `pre_reach`; otherwise the next
/// candidate is drawn from that (strictly smaller) part, so the retry
/// loop is bounded by the state space.
fn find_cycle_start<M: TransitionModel>(
    model: &M,
    recur: &M::Set,
    pre_reach: &M::Set,
) -> FairLoop<M::Set> {
    let mut s = model.pick_one_state(recur);

    loop {
        let mut r = model.empty();
        let mut new = model.post(&s).intersect(pre_reach);
        let mut cycle_trace = vec![new.clone()];

        while !new.is_empty() {
            r = r.union(&new);
            new = model.post(&new).intersect(pre_reach).subtract(&r);
            cycle_trace.push(new.clone());
        }

        let r = r.intersect(recur);
        if s.entails(&r) {
            debug!("fair cycle: start state accepted");
            return FairLoop {
                start: s,
                cycle_trace,
            };
        }
        s = model.pick_one_state(&r);
    }
}

/// Extract one concrete cyclic path from an accepted fair loop.
///
/// The forward frontiers of `cycle_trace` are pairwise disjoint, so the
/// singleton start state occurs in exactly one of them; the layers
/// strictly before it form the backward-walk prefix. The resulting
/// witness starts and ends in the start state.
pub fn build_cycle<M: TransitionModel>(model: &M, fair: &FairLoop<M::Set>) -> Witness<M::Set> {
    let s = &fair.start;

    // Layers computed before `s` itself was covered.
    let prefix: Vec<&M::Set> = fair
        .cycle_trace
        .iter()
        .take_while(|layer| !s.entails(layer))
        .collect();

    let mut rev_states = vec![s.clone()];
    let mut current = s.clone();
    for layer in prefix.into_iter().rev() {
        let pred = model.pre(&current).intersect(layer);
        debug_assert!(!pred.is_empty());
        current = model.pick_one_state(&pred);
        rev_states.push(current.clone());
    }
    rev_states.push(s.clone());
    rev_states.reverse();

    let mut witness = Witness::from_state(rev_states[0].clone());
    for pair in rev_states.windows(2) {
        let inputs = model.inputs_between(&pair[0], &pair[1]);
        witness.push_step(model.pick_one_inputs(&inputs), pair[1].clone());
    }
    witness
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::explicit::ExplicitSystem;
    use crate::reach::compute_reach;

    #[test]
    fn test_ring_has_no_fair_cycle() {
        // s0 <-> s1, f = at s0, g = at s1: every loop through s0 also
        // passes s1, so no cycle avoids g.
        let mut sys = ExplicitSystem::new(2, 1);
        sys.name_input(0, "tick");
        sys.set_init([0]);
        sys.add_transition(0, 0, 1);
        sys.add_transition(1, 0, 0);

        let (reach, _) = compute_reach(&sys);
        let f = sys.state_set([0]);
        let not_g = sys.state_set([0]); // ¬(at s1)
        assert!(find_fair_cycle(&sys, &reach, &f, &not_g).is_none());
    }

    #[test]
    fn test_absorbing_state_is_a_fair_cycle() {
        // 0 -> 1 -> 2 -> 2, with f ∧ ¬g holding in the absorbing state 2.
        let mut sys = ExplicitSystem::new(3, 1);
        sys.name_input(0, "tick");
        sys.set_init([0]);
        sys.add_transition(0, 0, 1);
        sys.add_transition(1, 0, 2);
        sys.add_transition(2, 0, 2);

        let (reach, _) = compute_reach(&sys);
        let f = sys.state_set([2]);
        let not_g = sys.state_set([0, 1, 2]);

        let fair = find_fair_cycle(&sys, &reach, &f, &not_g).expect("cycle expected");
        assert_eq!(fair.start, sys.state_singleton(2));

        let cycle = build_cycle(&sys, &fair);
        assert_eq!(cycle.len(), 3);
        assert_eq!(cycle.first_state(), cycle.last_state());
        assert!(sys.is_valid_execution(&cycle));
    }

    #[test]
    fn test_longer_cycle_is_reconstructed() {
        // 0 -> 1 -> 2 -> 3 -> 1: a three-state loop; f at 1, g nowhere.
        let mut sys = ExplicitSystem::new(4, 1);
        sys.name_input(0, "tick");
        sys.set_init([0]);
        sys.add_transition(0, 0, 1);
        sys.add_transition(1, 0, 2);
        sys.add_transition(2, 0, 3);
        sys.add_transition(3, 0, 1);

        let (reach, _) = compute_reach(&sys);
        let f = sys.state_set([1]);
        let not_g = sys.state_set([0, 1, 2, 3]);

        let fair = find_fair_cycle(&sys, &reach, &f, &not_g).expect("cycle expected");
        let cycle = build_cycle(&sys, &fair);

        // The loop 1 -> 2 -> 3 -> 1 has three transitions.
        assert_eq!(cycle.states().count(), 4);
        assert_eq!(cycle.first_state(), cycle.last_state());
        assert_eq!(cycle.first_state(), &sys.state_singleton(1));
        assert!(sys.is_valid_execution(&cycle));
    }

    #[test]
    fn test_unreachable_cycle_is_ignored() {
        // A perfect f ∧ ¬g self-loop at state 2, but nothing reaches it.
        let mut sys = ExplicitSystem::new(3, 1);
        sys.name_input(0, "tick");
        sys.set_init([0]);
        sys.add_transition(0, 0, 1);
        sys.add_transition(1, 0, 0);
        sys.add_transition(2, 0, 2);

        let (reach, _) = compute_reach(&sys);
        let f = sys.state_set([2]);
        let not_g = sys.state_set([0, 1, 2]);
        assert!(find_fair_cycle(&sys, &reach, &f, &not_g).is_none());
    }
}

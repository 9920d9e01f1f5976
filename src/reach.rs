//! Forward reachability with frontier recording.

use log::debug;

use crate::model::TransitionModel;
use crate::set::StateSet;
use crate::verify::Verdict;
use crate::witness::generate_witness;

/// The breadth-first layering of the reachable set.
///
/// `layers[0]` is the initial set, `layers[i + 1]` the states first
/// discovered `i + 1` steps from an initial state. The layers are
/// pairwise disjoint and their union is the full reachable set — that
/// disjointness is what later lets witness reconstruction locate the
/// unique layer of any reachable state.
#[derive(Debug, Clone)]
pub struct FrontierTrace<S> {
    layers: Vec<S>,
}

impl<S: StateSet> FrontierTrace<S> {
    pub fn layers(&self) -> &[S] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Index of the unique layer containing the given non-empty subset of
    /// the reachable set, or `None` for unreachable states.
    pub fn layer_of(&self, states: &S) -> Option<usize> {
        self.layers.iter().position(|layer| states.entails(layer))
    }
}

/// Compute the reachable set and its frontier trace.
///
/// Terminates because the frontiers are pairwise disjoint subsets of a
/// finite universe: the loop runs at most once per state.
pub fn compute_reach<M: TransitionModel>(model: &M) -> (M::Set, FrontierTrace<M::Set>) {
    let mut reach = model.init();
    let mut new = model.init();
    let mut layers = Vec::new();

    while !new.is_empty() {
        layers.push(new.clone());
        new = model.post(&new).subtract(&reach);
        reach = reach.union(&new);
        debug!("reach: frontier layer {}", layers.len());
    }

    (reach, FrontierTrace { layers })
}

/// Forward search that stops at the first state inside `bad`.
///
/// Each new frontier is intersected with `bad` before it is folded into
/// the reachable set; on a hit, a concrete path from an initial state to
/// a bad state is rebuilt backward over the layers discovered so far, so
/// every consecutive state/input/state triple of the witness is a real
/// transition of the model.
pub fn check_invariant<M: TransitionModel>(model: &M, bad: &M::Set) -> Verdict<M::Set> {
    let mut reach = model.init();
    let mut new = model.init();
    let mut layers = Vec::new();

    while !new.is_empty() {
        layers.push(new.clone());

        let hit = new.intersect(bad);
        if !hit.is_empty() {
            debug!("invariant violated in layer {}", layers.len() - 1);
            return Verdict::Violated(generate_witness(model, &layers, &hit));
        }

        new = model.post(&new).subtract(&reach);
        reach = reach.union(&new);
    }

    Verdict::Satisfied
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::explicit::ExplicitSystem;
    use crate::set::StateSet;

    fn diamond() -> ExplicitSystem {
        // 0 -> {1, 2} -> 3 -> 3; state 4 is unreachable.
        let mut sys = ExplicitSystem::new(5, 1);
        sys.name_input(0, "step");
        sys.set_init([0]);
        sys.add_transition(0, 0, 1);
        sys.add_transition(0, 0, 2);
        sys.add_transition(1, 0, 3);
        sys.add_transition(2, 0, 3);
        sys.add_transition(3, 0, 3);
        sys.add_transition(4, 0, 0);
        sys
    }

    #[test]
    fn test_compute_reach() {
        let sys = diamond();
        let (reach, trace) = compute_reach(&sys);

        assert_eq!(reach, sys.state_set([0, 1, 2, 3]));
        assert_eq!(trace.len(), 3);
        assert_eq!(trace.layers()[0], sys.state_set([0]));
        assert_eq!(trace.layers()[1], sys.state_set([1, 2]));
        assert_eq!(trace.layers()[2], sys.state_set([3]));
    }

    #[test]
    fn test_trace_layers_disjoint_and_cover() {
        let sys = diamond();
        let (reach, trace) = compute_reach(&sys);

        let mut union = sys.empty();
        for (i, a) in trace.layers().iter().enumerate() {
            for b in trace.layers().iter().skip(i + 1) {
                assert!(a.intersect(b).is_empty());
            }
            union = union.union(a);
        }
        assert_eq!(union, reach);
    }

    #[test]
    fn test_layer_of() {
        let sys = diamond();
        let (_, trace) = compute_reach(&sys);

        assert_eq!(trace.layer_of(&sys.state_singleton(0)), Some(0));
        assert_eq!(trace.layer_of(&sys.state_singleton(2)), Some(1));
        assert_eq!(trace.layer_of(&sys.state_singleton(3)), Some(2));
        assert_eq!(trace.layer_of(&sys.state_singleton(4)), None);
    }

    #[test]
    fn test_check_invariant_holds() {
        let sys = diamond();
        // State 4 is unreachable, so "not at 4" holds everywhere.
        let bad = sys.state_set([4]);
        assert!(check_invariant(&sys, &bad).holds());
    }

    #[test]
    fn test_check_invariant_violated() {
        let sys = diamond();
        let bad = sys.state_set([3]);
        match check_invariant(&sys, &bad) {
            Verdict::Satisfied => panic!("expected a violation"),
            Verdict::Violated(w) => {
                assert_eq!(w.len(), 5);
                assert!(w.first_state().entails(&sys.init()));
                assert!(w.last_state().entails(&bad));
                assert!(sys.is_valid_execution(&w));
            }
        }
    }

    #[test]
    fn test_check_invariant_violated_initially() {
        let sys = diamond();
        let bad = sys.state_set([0, 4]);
        match check_invariant(&sys, &bad) {
            Verdict::Satisfied => panic!("expected a violation"),
            Verdict::Violated(w) => {
                // The very first layer already contains a bad state.
                assert_eq!(w.len(), 1);
                assert_eq!(w.first_state(), &sys.state_singleton(0));
            }
        }
    }
}

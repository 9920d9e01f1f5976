//! Concrete execution traces and their reconstruction from frontier layers.

use log::debug;

use crate::model::TransitionModel;
use crate::set::StateSet;

/// A finite execution: an alternating State, Input, …, State sequence.
///
/// Every element is a singleton set of the model's universe. The sequence
/// starts and ends on a state; for liveness counterexamples the final
/// state equals an earlier one, marking the point the execution loops
/// back to.
#[derive(Debug, Clone)]
pub struct Witness<S> {
    steps: Vec<S>,
}

impl<S: StateSet> Witness<S> {
    pub fn from_state(state: S) -> Self {
        Witness { steps: vec![state] }
    }

    /// Append one transition: the input taken and the state reached.
    pub fn push_step(&mut self, input: S, state: S) {
        self.steps.push(input);
        self.steps.push(state);
    }

    /// The full alternating sequence.
    pub fn steps(&self) -> &[S] {
        &self.steps
    }

    /// Number of elements in the alternating sequence (always odd).
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The states of the execution, in order.
    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.steps.iter().step_by(2)
    }

    /// The inputs of the execution, in order.
    pub fn inputs(&self) -> impl Iterator<Item = &S> {
        self.steps.iter().skip(1).step_by(2)
    }

    pub fn first_state(&self) -> &S {
        &self.steps[0]
    }

    pub fn last_state(&self) -> &S {
        &self.steps[self.steps.len() - 1]
    }

    /// Concatenate `other` onto `self`, dropping the duplicated junction
    /// state (`other`'s first state must equal `self`'s last state).
    pub fn concat(mut self, other: Witness<S>) -> Witness<S> {
        self.steps.extend(other.steps.into_iter().skip(1));
        self
    }
}

/// Reconstruct one concrete path from the first layer of `layers` to a
/// state in `final_states ∩ layers[last]`.
///
/// This inverts a forward frontier trace into a forward path without
/// stored predecessor pointers: walk the layers backward, intersecting
/// the predecessors of the state picked so far with the previous layer.
/// The walk is an explicit loop, so the depth of the trace cannot
/// exhaust the stack.
///
/// Requires `final_states ∩ layers[last]` to be non-empty and each layer
/// to be contained in the successor image of the previous one, which is
/// exactly what reachability frontiers provide.
pub fn generate_witness<M: TransitionModel>(
    model: &M,
    layers: &[M::Set],
    final_states: &M::Set,
) -> Witness<M::Set> {
    debug_assert!(!layers.is_empty());

    let last = layers.len() - 1;
    let target = final_states.intersect(&layers[last]);
    debug_assert!(!target.is_empty());

    let mut current = model.pick_one_state(&target);
    debug!("witness: target reached in layer {}", last);

    // Backward pass: pick one predecessor per layer.
    let mut rev_states = vec![current.clone()];
    for layer in layers[..last].iter().rev() {
        let pred = model.pre(&current).intersect(layer);
        debug_assert!(!pred.is_empty());
        current = model.pick_one_state(&pred);
        rev_states.push(current.clone());
    }

    // Forward pass: thread the inputs between consecutive states.
    rev_states.reverse();
    let mut witness = Witness::from_state(rev_states[0].clone());
    for pair in rev_states.windows(2) {
        let inputs = model.inputs_between(&pair[0], &pair[1]);
        witness.push_step(model.pick_one_inputs(&inputs), pair[1].clone());
    }
    witness
}

//! The transition-model seam consumed by the verification algorithms.

use std::fmt;

use crate::formula::Prop;
use crate::set::StateSet;

/// Errors surfaced while building or querying a model.
///
/// A broken model is fatal for the run; the algorithms themselves are
/// total over any well-formed model and never fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A formula mentions an atom the model does not know.
    UnknownAtom(String),
    /// The model has no initial states.
    NoInitialStates,
    /// The model has no transition relation.
    NoTransitions,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownAtom(name) => write!(f, "unknown atom `{}`", name),
            Error::NoInitialStates => write!(f, "model has no initial states"),
            Error::NoTransitions => write!(f, "model has no transition relation"),
        }
    }
}

impl std::error::Error for Error {}

/// A finite-state transition system with nondeterministic inputs,
/// exposed purely through symbolic set operations.
///
/// The model is read-only: it is built once and every method is a pure
/// function over it. Singleton results of the `pick_one_*` operations are
/// ordinary sets, so they compose with the rest of the algebra.
pub trait TransitionModel {
    type Set: StateSet;

    /// The set of initial states.
    fn init(&self) -> Self::Set;

    /// The empty set over this model's universe.
    fn empty(&self) -> Self::Set;

    /// Successor image: states reachable from `states` in one transition.
    fn post(&self, states: &Self::Set) -> Self::Set;

    /// Predecessor image: states that reach `states` in one transition.
    fn pre(&self, states: &Self::Set) -> Self::Set;

    /// One concrete state of a non-empty set, as a singleton set.
    fn pick_one_state(&self, states: &Self::Set) -> Self::Set;

    /// One concrete input assignment of a non-empty input set, as a
    /// singleton set.
    fn pick_one_inputs(&self, inputs: &Self::Set) -> Self::Set;

    /// Input assignments labelling some transition from a state in `from`
    /// to a state in `to`.
    fn inputs_between(&self, from: &Self::Set, to: &Self::Set) -> Self::Set;

    /// Evaluate a propositional formula into the set of states satisfying
    /// it.
    fn eval(&self, prop: &Prop) -> Result<Self::Set, Error>;
}

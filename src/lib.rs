//! # mc-rs: Symbolic Model Checking in Rust
//!
//! **`mc-rs`** checks finite-state transition systems against **invariants**
//! and **GR(1) reactivity** properties of the form `GF f -> GF g`, and
//! produces concrete counterexample executions when a property fails.
//!
//! ## How it works
//!
//! State sets are manipulated purely symbolically through the [`StateSet`][crate::set::StateSet]
//! trait, and models expose their transition structure through
//! [`TransitionModel`][crate::model::TransitionModel]. On top of these seams
//! the library implements:
//!
//! - **Forward reachability** with a frontier trace: breadth-first layers
//!   that are pairwise disjoint, so any reachable state can be placed in a
//!   unique layer ([`reach`]).
//! - **Fair-cycle detection**: a nested backward fixpoint deciding whether a
//!   reachable `f ∧ ¬g` state lies on a cycle staying in `¬g` ([`fair`]).
//! - **Witness reconstruction**: concrete executions (alternating states and
//!   input assignments) rebuilt backward over the recorded layers, so every
//!   step of a reported counterexample is a real transition ([`witness`]).
//!
//! Two backends implement the seams: a BDD-backed one for real use
//! ([`symbolic`]) and an explicit bit-set one for small models and tests
//! ([`explicit`]).
//!
//! ## Basic Usage
//!
//! ```rust
//! use mc_rs::formula::Prop;
//! use mc_rs::symbolic::BddSystem;
//! use mc_rs::verify::verify_invariant;
//!
//! // A one-bit toggle: x' = !x, starting from x = 0.
//! let mut sys = BddSystem::new();
//! sys.declare_var("x");
//! let x = sys.var("x").unwrap();
//! sys.set_init(-x);
//! let t = sys.assign_var("x", -x);
//! sys.set_transition(t);
//!
//! // "x never holds" is violated after one step.
//! let verdict = verify_invariant(&sys, &Prop::atom("x").not()).unwrap();
//! assert!(!verdict.holds());
//! assert_eq!(verdict.witness().unwrap().len(), 3);
//! ```
//!
//! ## Core Components
//!
//! - **[`bdd`]**: The BDD engine: hash-consed nodes with complement edges,
//!   ITE-based boolean operations, quantification, and renaming.
//! - **[`formula`]**: Propositional and temporal formulas, plus the
//!   classifier that sorts formulas into invariants, reactivity properties,
//!   and everything else.
//! - **[`verify`]**: The verifier facade dispatching on the classification
//!   and assembling counterexamples.

pub mod bdd;
pub mod explicit;
pub mod fair;
pub mod formula;
pub mod model;
pub mod reach;
pub mod reference;
pub mod set;
pub mod symbolic;
pub mod verify;
pub mod witness;

//! Explicit finite-set backend.
//!
//! States and inputs are enumerated indices and sets are word-packed bit
//! sets, so every [`StateSet`] contract can be checked against a ground
//! truth. This backend exists for tests and small demos; real workloads
//! use the BDD backend in [`symbolic`][crate::symbolic].

use std::collections::HashMap;

use crate::formula::Prop;
use crate::model::{Error, TransitionModel};
use crate::set::StateSet;
use crate::witness::Witness;

/// An immutable set of indices over a fixed universe, packed into u64
/// words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bits {
    words: Vec<u64>,
    len: usize,
}

impl Bits {
    const BITS_PER_WORD: usize = 64;

    /// The empty set over a universe of `len` indices.
    pub fn new(len: usize) -> Self {
        let num_words = len.div_ceil(Self::BITS_PER_WORD);
        Self {
            words: vec![0; num_words],
            len,
        }
    }

    /// The full universe of `len` indices.
    pub fn full(len: usize) -> Self {
        let mut bits = Self::new(len);
        for word in &mut bits.words {
            *word = u64::MAX;
        }
        // Mask off bits past the universe.
        let tail = len % Self::BITS_PER_WORD;
        if tail != 0 {
            if let Some(last) = bits.words.last_mut() {
                *last &= (1u64 << tail) - 1;
            }
        }
        bits
    }

    pub fn singleton(len: usize, index: usize) -> Self {
        let mut bits = Self::new(len);
        bits.insert(index);
        bits
    }

    pub fn from_indices(len: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut bits = Self::new(len);
        for index in indices {
            bits.insert(index);
        }
        bits
    }

    /// Universe size in indices (not the number of set bits).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn insert(&mut self, index: usize) {
        assert!(index < self.len, "index {} out of universe {}", index, self.len);
        self.words[index / Self::BITS_PER_WORD] |= 1u64 << (index % Self::BITS_PER_WORD);
    }

    pub fn contains(&self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        (self.words[index / Self::BITS_PER_WORD] >> (index % Self::BITS_PER_WORD)) & 1 != 0
    }

    /// Number of set bits.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// The smallest contained index, if any.
    pub fn first(&self) -> Option<usize> {
        for (word_idx, &word) in self.words.iter().enumerate() {
            if word != 0 {
                return Some(word_idx * Self::BITS_PER_WORD + word.trailing_zeros() as usize);
            }
        }
        None
    }

    /// Iterator over the contained indices, in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(|&i| self.contains(i))
    }

    fn zip_words(&self, other: &Self, op: impl Fn(u64, u64) -> u64) -> Self {
        debug_assert_eq!(self.len, other.len, "sets from different universes");
        Self {
            words: self
                .words
                .iter()
                .zip(&other.words)
                .map(|(&a, &b)| op(a, b))
                .collect(),
            len: self.len,
        }
    }
}

impl StateSet for Bits {
    fn union(&self, other: &Self) -> Self {
        self.zip_words(other, |a, b| a | b)
    }

    fn intersect(&self, other: &Self) -> Self {
        self.zip_words(other, |a, b| a & b)
    }

    fn subtract(&self, other: &Self) -> Self {
        self.zip_words(other, |a, b| a & !b)
    }

    fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    fn entails(&self, other: &Self) -> bool {
        debug_assert_eq!(self.len, other.len, "sets from different universes");
        self.words
            .iter()
            .zip(&other.words)
            .all(|(&a, &b)| a & !b == 0)
    }
}

/// An enumerated transition system: states and inputs are indices,
/// transitions are explicit `(from, input, to)` triples.
#[derive(Debug, Clone)]
pub struct ExplicitSystem {
    num_states: usize,
    num_inputs: usize,
    init: Bits,
    transitions: Vec<(usize, usize, usize)>,
    labels: HashMap<String, Bits>,
    input_names: Vec<String>,
}

impl ExplicitSystem {
    pub fn new(num_states: usize, num_inputs: usize) -> Self {
        Self {
            num_states,
            num_inputs,
            init: Bits::new(num_states),
            transitions: Vec::new(),
            labels: HashMap::new(),
            input_names: (0..num_inputs).map(|i| format!("i{}", i)).collect(),
        }
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn set_init(&mut self, states: impl IntoIterator<Item = usize>) {
        self.init = Bits::from_indices(self.num_states, states);
    }

    pub fn add_transition(&mut self, from: usize, input: usize, to: usize) {
        assert!(from < self.num_states && to < self.num_states);
        assert!(input < self.num_inputs);
        self.transitions.push((from, input, to));
    }

    /// Label a set of states with an atom name usable in formulas.
    pub fn add_label(&mut self, name: impl Into<String>, states: impl IntoIterator<Item = usize>) {
        self.labels
            .insert(name.into(), Bits::from_indices(self.num_states, states));
    }

    pub fn name_input(&mut self, input: usize, name: impl Into<String>) {
        self.input_names[input] = name.into();
    }

    pub fn input_name(&self, input: usize) -> &str {
        &self.input_names[input]
    }

    pub fn state_singleton(&self, state: usize) -> Bits {
        Bits::singleton(self.num_states, state)
    }

    pub fn input_singleton(&self, input: usize) -> Bits {
        Bits::singleton(self.num_inputs, input)
    }

    pub fn state_set(&self, states: impl IntoIterator<Item = usize>) -> Bits {
        Bits::from_indices(self.num_states, states)
    }

    /// Reject models with no initial states or no transitions at all.
    pub fn validate(&self) -> Result<(), Error> {
        if self.init.is_empty() {
            return Err(Error::NoInitialStates);
        }
        if self.transitions.is_empty() {
            return Err(Error::NoTransitions);
        }
        Ok(())
    }

    /// Check that a witness is a real execution: odd alternating length,
    /// all elements singletons, and every state/input/state triple an
    /// actual transition.
    pub fn is_valid_execution(&self, witness: &Witness<Bits>) -> bool {
        let steps = witness.steps();
        if steps.len() % 2 == 0 {
            return false;
        }
        if steps.iter().any(|s| s.count() != 1) {
            return false;
        }
        steps.windows(3).step_by(2).all(|triple| {
            let from = triple[0].first().unwrap();
            let input = triple[1].first().unwrap();
            let to = triple[2].first().unwrap();
            self.transitions.contains(&(from, input, to))
        })
    }

    fn eval_prop(&self, prop: &Prop) -> Result<Bits, Error> {
        let all = || Bits::full(self.num_states);
        match prop {
            Prop::True => Ok(all()),
            Prop::False => Ok(Bits::new(self.num_states)),
            Prop::Atom(name) => self
                .labels
                .get(name)
                .cloned()
                .ok_or_else(|| Error::UnknownAtom(name.clone())),
            Prop::Not(p) => Ok(all().subtract(&self.eval_prop(p)?)),
            Prop::And(p, q) => Ok(self.eval_prop(p)?.intersect(&self.eval_prop(q)?)),
            Prop::Or(p, q) => Ok(self.eval_prop(p)?.union(&self.eval_prop(q)?)),
            Prop::Xor(p, q) => {
                let a = self.eval_prop(p)?;
                let b = self.eval_prop(q)?;
                Ok(a.subtract(&b).union(&b.subtract(&a)))
            }
            Prop::Implies(p, q) => {
                let a = self.eval_prop(p)?;
                Ok(all().subtract(&a).union(&self.eval_prop(q)?))
            }
            Prop::Iff(p, q) => {
                let a = self.eval_prop(p)?;
                let b = self.eval_prop(q)?;
                let xor = a.subtract(&b).union(&b.subtract(&a));
                Ok(all().subtract(&xor))
            }
        }
    }
}

impl TransitionModel for ExplicitSystem {
    type Set = Bits;

    fn init(&self) -> Bits {
        self.init.clone()
    }

    fn empty(&self) -> Bits {
        Bits::new(self.num_states)
    }

    fn post(&self, states: &Bits) -> Bits {
        let mut result = Bits::new(self.num_states);
        for &(from, _, to) in &self.transitions {
            if states.contains(from) {
                result.insert(to);
            }
        }
        result
    }

    fn pre(&self, states: &Bits) -> Bits {
        let mut result = Bits::new(self.num_states);
        for &(from, _, to) in &self.transitions {
            if states.contains(to) {
                result.insert(from);
            }
        }
        result
    }

    fn pick_one_state(&self, states: &Bits) -> Bits {
        let index = states.first().expect("picking from an empty state set");
        Bits::singleton(self.num_states, index)
    }

    fn pick_one_inputs(&self, inputs: &Bits) -> Bits {
        let index = inputs.first().expect("picking from an empty input set");
        Bits::singleton(self.num_inputs, index)
    }

    fn inputs_between(&self, from: &Bits, to: &Bits) -> Bits {
        let mut result = Bits::new(self.num_inputs);
        for &(f, input, t) in &self.transitions {
            if from.contains(f) && to.contains(t) {
                result.insert(input);
            }
        }
        result
    }

    fn eval(&self, prop: &Prop) -> Result<Bits, Error> {
        self.eval_prop(prop)
    }
}

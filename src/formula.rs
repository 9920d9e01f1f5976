//! Property formulas and their classification.
//!
//! The checker handles two property shapes: invariants `G p` and GR(1)
//! reactivity `GF f -> GF g`, where `p`, `f`, `g` are propositional.
//! [`classify`] inspects a temporal [`Formula`] and produces the tagged
//! [`Property`] the verifier facade dispatches on; everything else is
//! [`Property::Unrecognized`] and gets skipped, not rejected.

use std::fmt;

/// A propositional (non-temporal) formula over named atoms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prop {
    True,
    False,
    Atom(String),
    Not(Box<Prop>),
    And(Box<Prop>, Box<Prop>),
    Or(Box<Prop>, Box<Prop>),
    Xor(Box<Prop>, Box<Prop>),
    Implies(Box<Prop>, Box<Prop>),
    Iff(Box<Prop>, Box<Prop>),
}

impl Prop {
    pub fn atom(name: impl Into<String>) -> Self {
        Prop::Atom(name.into())
    }

    pub fn not(self) -> Self {
        match self {
            Prop::Not(inner) => *inner,
            other => Prop::Not(Box::new(other)),
        }
    }

    pub fn and(self, other: Self) -> Self {
        Prop::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Self) -> Self {
        Prop::Or(Box::new(self), Box::new(other))
    }

    pub fn xor(self, other: Self) -> Self {
        Prop::Xor(Box::new(self), Box::new(other))
    }

    pub fn implies(self, other: Self) -> Self {
        Prop::Implies(Box::new(self), Box::new(other))
    }

    pub fn iff(self, other: Self) -> Self {
        Prop::Iff(Box::new(self), Box::new(other))
    }
}

impl fmt::Display for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prop::True => write!(f, "true"),
            Prop::False => write!(f, "false"),
            Prop::Atom(s) => write!(f, "{}", s),
            Prop::Not(p) => write!(f, "!{}", p),
            Prop::And(p, q) => write!(f, "({} & {})", p, q),
            Prop::Or(p, q) => write!(f, "({} | {})", p, q),
            Prop::Xor(p, q) => write!(f, "({} ^ {})", p, q),
            Prop::Implies(p, q) => write!(f, "({} -> {})", p, q),
            Prop::Iff(p, q) => write!(f, "({} <-> {})", p, q),
        }
    }
}

/// A temporal formula, as produced by a property parser.
///
/// Only the fragment [`classify`] recognizes is ever verified; the rest
/// of the constructors exist so that arbitrary parsed properties can be
/// represented and reported as skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    Prop(Prop),
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    /// `G φ`: φ holds in every state of every execution.
    Globally(Box<Formula>),
    /// `F φ`: φ holds eventually.
    Finally(Box<Formula>),
    /// `X φ`: φ holds in the next state.
    Next(Box<Formula>),
    /// `φ U ψ`: φ holds until ψ does.
    Until(Box<Formula>, Box<Formula>),
}

impl Formula {
    pub fn prop(p: Prop) -> Self {
        Formula::Prop(p)
    }

    pub fn atom(name: impl Into<String>) -> Self {
        Formula::Prop(Prop::atom(name))
    }

    pub fn not(self) -> Self {
        Formula::Not(Box::new(self))
    }

    pub fn and(self, other: Self) -> Self {
        Formula::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Self) -> Self {
        Formula::Or(Box::new(self), Box::new(other))
    }

    pub fn implies(self, other: Self) -> Self {
        Formula::Implies(Box::new(self), Box::new(other))
    }

    pub fn globally(self) -> Self {
        Formula::Globally(Box::new(self))
    }

    pub fn finally(self) -> Self {
        Formula::Finally(Box::new(self))
    }

    pub fn next(self) -> Self {
        Formula::Next(Box::new(self))
    }

    pub fn until(self, other: Self) -> Self {
        Formula::Until(Box::new(self), Box::new(other))
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Prop(p) => write!(f, "{}", p),
            Formula::Not(x) => write!(f, "!{}", x),
            Formula::And(x, y) => write!(f, "({} & {})", x, y),
            Formula::Or(x, y) => write!(f, "({} | {})", x, y),
            Formula::Implies(x, y) => write!(f, "({} -> {})", x, y),
            Formula::Globally(x) => write!(f, "G {}", x),
            Formula::Finally(x) => write!(f, "F {}", x),
            Formula::Next(x) => write!(f, "X {}", x),
            Formula::Until(x, y) => write!(f, "({} U {})", x, y),
        }
    }
}

/// The shape of a property, as seen by the verifier facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    /// `G p`: the propositional formula `p` holds in every reachable state.
    Invariant(Prop),
    /// `GF f -> GF g`: if `f` holds infinitely often, so does `g`.
    Reactivity(Prop, Prop),
    /// Anything else; reported as skipped.
    Unrecognized,
}

/// Fold a boolean combination of propositional subformulas into a [`Prop`],
/// or `None` if a temporal operator occurs anywhere inside.
fn as_prop(formula: &Formula) -> Option<Prop> {
    match formula {
        Formula::Prop(p) => Some(p.clone()),
        Formula::Not(x) => Some(as_prop(x)?.not()),
        Formula::And(x, y) => Some(as_prop(x)?.and(as_prop(y)?)),
        Formula::Or(x, y) => Some(as_prop(x)?.or(as_prop(y)?)),
        Formula::Implies(x, y) => Some(as_prop(x)?.implies(as_prop(y)?)),
        _ => None,
    }
}

/// Match `G F f` with `f` propositional.
fn as_gf(formula: &Formula) -> Option<Prop> {
    match formula {
        Formula::Globally(inner) => match inner.as_ref() {
            Formula::Finally(body) => as_prop(body),
            _ => None,
        },
        _ => None,
    }
}

/// Classify a formula into one of the supported property shapes.
///
/// Recognized shapes:
/// - `G p` with `p` propositional, and bare `p` (an invariant declaration);
/// - `GF f -> GF g` with `f`, `g` propositional.
pub fn classify(formula: &Formula) -> Property {
    // GF f -> GF g
    if let Formula::Implies(lhs, rhs) = formula {
        if let (Some(f), Some(g)) = (as_gf(lhs), as_gf(rhs)) {
            return Property::Reactivity(f, g);
        }
    }
    // G p
    if let Formula::Globally(inner) = formula {
        if let Some(p) = as_prop(inner) {
            return Property::Invariant(p);
        }
    }
    // A bare propositional formula is an invariant declaration.
    if let Some(p) = as_prop(formula) {
        return Property::Invariant(p);
    }
    Property::Unrecognized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_involution() {
        let p = Prop::atom("x");
        assert_eq!(p.clone().not().not(), p);
    }

    #[test]
    fn test_classify_invariant() {
        let f = Formula::atom("safe").globally();
        assert_eq!(classify(&f), Property::Invariant(Prop::atom("safe")));

        // Bare propositional formulas count as invariant declarations.
        let g = Formula::atom("a").and(Formula::atom("b").not());
        assert_eq!(
            classify(&g),
            Property::Invariant(Prop::atom("a").and(Prop::atom("b").not()))
        );
    }

    #[test]
    fn test_classify_reactivity() {
        let f = Formula::atom("req")
            .finally()
            .globally()
            .implies(Formula::atom("grant").finally().globally());
        assert_eq!(
            classify(&f),
            Property::Reactivity(Prop::atom("req"), Prop::atom("grant"))
        );
    }

    #[test]
    fn test_classify_boolean_combination_inside_gf() {
        let lhs = Formula::atom("a").or(Formula::atom("b")).finally().globally();
        let rhs = Formula::atom("c").not().finally().globally();
        let f = lhs.implies(rhs);
        assert_eq!(
            classify(&f),
            Property::Reactivity(
                Prop::atom("a").or(Prop::atom("b")),
                Prop::atom("c").not()
            )
        );
    }

    #[test]
    fn test_classify_unrecognized() {
        // A temporal operator under GF disqualifies the formula.
        let f = Formula::atom("a")
            .next()
            .finally()
            .globally()
            .implies(Formula::atom("b").finally().globally());
        assert_eq!(classify(&f), Property::Unrecognized);

        // GF alone is not a supported shape.
        let g = Formula::atom("a").finally().globally();
        assert_eq!(classify(&g), Property::Unrecognized);

        // Neither is F p.
        let h = Formula::atom("a").finally();
        assert_eq!(classify(&h), Property::Unrecognized);
    }
}

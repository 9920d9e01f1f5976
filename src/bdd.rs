//! Manager-centric BDD engine used as the symbolic state-set backend.
//!
//! Nodes are hash-consed with complement edges: the high edge of a stored
//! node is never negated, so every boolean function has exactly one
//! representation and equality of [`Ref`]s is semantic equality.

use std::cell::RefCell;
use std::collections::HashMap;

use log::debug;
use num_bigint::BigUint;

use crate::reference::Ref;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct Node {
    variable: u32,
    low: Ref,
    high: Ref,
}

pub struct Bdd {
    nodes: RefCell<Vec<Node>>,
    unique: RefCell<HashMap<Node, u32>>,
    ite_cache: RefCell<HashMap<(Ref, Ref, Ref), Ref>>,
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new()
    }
}

impl std::fmt::Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bdd")
            .field("size", &self.nodes.borrow().len())
            .finish()
    }
}

impl Bdd {
    pub fn new() -> Self {
        // Index 0 is a sentinel, index 1 is the terminal node.
        let terminal = Node {
            variable: 0,
            low: Ref::positive(1),
            high: Ref::positive(1),
        };
        Self {
            nodes: RefCell::new(vec![terminal, terminal]),
            unique: RefCell::new(HashMap::new()),
            ite_cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn one(&self) -> Ref {
        Ref::positive(1)
    }

    pub fn zero(&self) -> Ref {
        -self.one()
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == self.zero()
    }

    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one()
    }

    pub fn is_terminal(&self, node: Ref) -> bool {
        node.index() == 1
    }

    /// Variable of the node (0 for the terminal).
    pub fn variable(&self, node: Ref) -> u32 {
        self.nodes.borrow()[node.index()].variable
    }

    /// Low child with the complement edge pushed through.
    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.nodes.borrow()[node.index()].low;
        if node.is_negated() {
            -low
        } else {
            low
        }
    }

    /// High child with the complement edge pushed through.
    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.nodes.borrow()[node.index()].high;
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    /// Number of allocated nodes, terminal included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.borrow().len() - 1
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Ref {
        debug!("mk(v = {}, low = {}, high = {})", v, low, high);
        debug_assert_ne!(v, 0, "Variable index should not be zero");

        // Canonicity: the stored high edge is never negated.
        if high.is_negated() {
            return -self.mk_node(v, -low, -high);
        }
        if low == high {
            return low;
        }

        let node = Node {
            variable: v,
            low,
            high,
        };
        if let Some(&i) = self.unique.borrow().get(&node) {
            return Ref::positive(i);
        }
        let mut nodes = self.nodes.borrow_mut();
        let i = nodes.len() as u32;
        nodes.push(node);
        self.unique.borrow_mut().insert(node, i);
        Ref::positive(i)
    }

    pub fn mk_var(&self, v: u32) -> Ref {
        self.mk_node(v, self.zero(), self.one())
    }

    /// Conjunction of literals, given in DIMACS convention (negative = negated).
    pub fn cube(&self, literals: impl IntoIterator<Item = i32>) -> Ref {
        let mut literals = literals.into_iter().collect::<Vec<_>>();
        literals.sort_by_key(|&lit| lit.abs());
        let mut current = self.one();
        for lit in literals.into_iter().rev() {
            debug_assert_ne!(lit, 0, "Variable index should not be zero");
            current = if lit < 0 {
                self.mk_node(-lit as u32, current, self.zero())
            } else {
                self.mk_node(lit as u32, self.zero(), current)
            };
        }
        current
    }

    fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        if self.is_terminal(node) || v < self.variable(node) {
            return (node, node);
        }
        debug_assert_eq!(v, self.variable(node));
        (self.low_node(node), self.high_node(node))
    }

    /// Apply the ITE operation: `ite(f, g, h) = (f ∧ g) ∨ (¬f ∧ h)`.
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        if self.is_one(f) {
            return g;
        }
        if self.is_zero(f) {
            return h;
        }
        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,~F) => ite(F,G,1)
        if g == f {
            return self.apply_ite(f, self.one(), h);
        }
        if h == f {
            return self.apply_ite(f, g, self.zero());
        }
        if g == -f {
            return self.apply_ite(f, self.zero(), h);
        }
        if h == -f {
            return self.apply_ite(f, g, self.one());
        }

        // Normalize so that f and g are regular (not negated):
        //   ite(~F,G,H) => ite(F,H,G)
        //   ite(F,~G,H) => ~ite(F,G,~H)
        let (mut f, mut g, mut h) = (f, g, h);
        if f.is_negated() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }
        let negate = g.is_negated();
        if negate {
            g = -g;
            h = -h;
        }

        let key = (f, g, h);
        if let Some(&res) = self.ite_cache.borrow().get(&key) {
            return if negate { -res } else { res };
        }

        // Top variable among the non-terminal arguments.
        let mut m = self.variable(f);
        for r in [g, h] {
            let v = self.variable(r);
            if v != 0 {
                m = m.min(v);
            }
        }
        debug_assert_ne!(m, 0);

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let low = self.apply_ite(f0, g0, h0);
        let high = self.apply_ite(f1, g1, h1);
        let res = self.mk_node(m, low, high);

        self.ite_cache.borrow_mut().insert(key, res);
        if negate {
            -res
        } else {
            res
        }
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.zero())
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, self.one(), v)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, -v, v)
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, -v)
    }

    pub fn apply_imply(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.one())
    }

    pub fn apply_and_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        nodes
            .into_iter()
            .fold(self.one(), |acc, node| self.apply_and(acc, node))
    }

    pub fn apply_or_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        nodes
            .into_iter()
            .fold(self.zero(), |acc, node| self.apply_or(acc, node))
    }

    /// Semantic inclusion test: `f ⇒ g` is a tautology.
    pub fn is_implies(&self, f: Ref, g: Ref) -> bool {
        self.is_zero(self.apply_and(f, -g))
    }

    /// Substitute the constant `b` for variable `v` in `f` (a cofactor).
    pub fn substitute(&self, f: Ref, v: u32, b: bool) -> Ref {
        let mut cache = HashMap::new();
        self.substitute_rec(f, v, b, &mut cache)
    }

    fn substitute_rec(&self, f: Ref, v: u32, b: bool, cache: &mut HashMap<Ref, Ref>) -> Ref {
        if self.is_terminal(f) {
            return f;
        }
        let fv = self.variable(f);
        // Variables below the root are strictly larger, so `v` cannot occur.
        if fv > v {
            return f;
        }
        if fv == v {
            return if b {
                self.high_node(f)
            } else {
                self.low_node(f)
            };
        }
        if let Some(&res) = cache.get(&f) {
            return res;
        }
        let low = self.substitute_rec(self.low_node(f), v, b, cache);
        let high = self.substitute_rec(self.high_node(f), v, b, cache);
        let res = self.mk_node(fv, low, high);
        cache.insert(f, res);
        res
    }

    /// Existentially quantify the given variables out of `f`.
    pub fn exists(&self, f: Ref, vars: &[u32]) -> Ref {
        let mut res = f;
        for &v in vars {
            let low = self.substitute(res, v, false);
            let high = self.substitute(res, v, true);
            res = self.apply_or(low, high);
        }
        res
    }

    /// Rename variables in `f` according to `(from, to)` pairs.
    ///
    /// The `from` and `to` variable sets must be disjoint; the renaming is
    /// performed simultaneously by conjoining equalities and quantifying the
    /// old variables out.
    pub fn rename(&self, f: Ref, map: &[(u32, u32)]) -> Ref {
        let mut g = f;
        for &(from, to) in map {
            let eq = self.apply_eq(self.mk_var(from), self.mk_var(to));
            g = self.apply_and(g, eq);
        }
        let from_vars: Vec<u32> = map.iter().map(|&(from, _)| from).collect();
        self.exists(g, &from_vars)
    }

    /// One satisfying cube, as DIMACS literals for the variables on the path.
    ///
    /// Variables not mentioned are don't-cares. Returns `None` iff `f` is
    /// the constant false.
    pub fn one_sat(&self, f: Ref) -> Option<Vec<i32>> {
        if self.is_zero(f) {
            return None;
        }

        let mut path = Vec::new();
        let mut current = f;

        // With complement edges, every non-zero node is satisfiable,
        // so a branch whose child is non-zero always leads to `one`.
        while !self.is_one(current) {
            let v = self.variable(current) as i32;
            let high = self.high_node(current);
            if !self.is_zero(high) {
                path.push(v);
                current = high;
            } else {
                path.push(-v);
                current = self.low_node(current);
            }
        }

        Some(path)
    }

    /// Number of satisfying assignments of `f` over `num_vars` variables.
    pub fn sat_count(&self, f: Ref, num_vars: usize) -> BigUint {
        let max = BigUint::from(1u8) << num_vars;
        let mut cache = HashMap::new();
        self.sat_count_rec(f, &max, &mut cache)
    }

    fn sat_count_rec(&self, f: Ref, max: &BigUint, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        if self.is_zero(f) {
            return BigUint::ZERO;
        }
        if self.is_one(f) {
            return max.clone();
        }
        if let Some(count) = cache.get(&f) {
            return count.clone();
        }

        // Each decision halves the weight; skipped levels take care of
        // themselves because both cofactors then coincide.
        let count_low = self.sat_count_rec(self.low_node(f), max, cache);
        let count_high = self.sat_count_rec(self.high_node(f), max, cache);
        let count: BigUint = (count_low + count_high) >> 1;

        cache.insert(f, count.clone());
        count
    }
}

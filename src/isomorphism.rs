//! Cell graphs as relational structures, compared up to isomorphism.
//!
//! Every node, cell, weight expression, weight term and weight variable becomes a
//! symbol; the cell-graph facts and the term structure of the weights become facts
//! over those symbols. Two cell graphs are equivalent iff a sort-preserving bijection
//! of symbols maps the facts of one exactly onto the facts of the other.
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use crate::cell::Fact;
use crate::cellgraph::CellGraph;
use crate::weight::SymbolicWeight;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
enum Sort {
    Node,
    Graph,
    Sum,
    Product,
    Variable,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
enum Arg {
    Symbol(usize),
    Const(String),
}

type Atom = (char, Vec<Arg>);

/// Relational view of one cell graph.
#[derive(Debug, Clone)]
pub struct Structure {
    sorts: Vec<Sort>,
    atoms: Vec<Atom>,
    atom_set: HashSet<Atom>,
    /// Atoms each symbol occurs in.
    occurrences: Vec<Vec<usize>>,
    colors: Vec<u64>,
    invariant: u64,
}

/// In-process hash only: `DefaultHasher` output may change between Rust releases, so
/// these values must never be persisted or used as store keys.
fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

struct Builder {
    sorts: Vec<Sort>,
    atoms: HashSet<Atom>,
    sums: HashMap<String, Arg>,
    variables: HashMap<String, usize>,
}

impl Builder {
    fn symbol(&mut self, sort: Sort) -> usize {
        self.sorts.push(sort);
        self.sorts.len() - 1
    }

    fn weight(&mut self, weight: &SymbolicWeight) -> Arg {
        if let Some(s) = weight.scalar() {
            return Arg::Const(s.to_string());
        }
        let key = weight.to_string();
        if let Some(arg) = self.sums.get(&key) {
            return arg.clone();
        }
        let sum = self.symbol(Sort::Sum);
        for (coefficient, factors) in weight.monomials() {
            let product = self.symbol(Sort::Product);
            self.atoms.insert(('M', vec![Arg::Symbol(sum), Arg::Symbol(product)]));
            self.atoms
                .insert(('K', vec![Arg::Symbol(product), Arg::Const(coefficient.to_string())]));
            for (name, exponent) in factors {
                let variable = match self.variables.get(name) {
                    Some(&v) => v,
                    None => {
                        let v = self.symbol(Sort::Variable);
                        self.variables.insert(name.clone(), v);
                        v
                    }
                };
                self.atoms.insert((
                    'P',
                    vec![Arg::Symbol(product), Arg::Symbol(variable), Arg::Const(exponent.to_string())],
                ));
            }
        }
        self.sums.insert(key, Arg::Symbol(sum));
        Arg::Symbol(sum)
    }
}

impl Structure {
    pub fn new(graph: &CellGraph) -> Self {
        let mut b = Builder {
            sorts: Vec::new(),
            atoms: HashSet::new(),
            sums: HashMap::new(),
            variables: HashMap::new(),
        };

        for cell in graph.cells() {
            let g = Arg::Symbol(b.symbol(Sort::Graph));
            let mut nodes: HashMap<u32, usize> = HashMap::new();
            let mut node = |b: &mut Builder, n: u32| Arg::Symbol(*nodes.entry(n).or_insert_with(|| b.symbol(Sort::Node)));
            let weights = cell.weights();

            b.atoms.insert(('G', vec![g.clone()]));
            b.atoms.insert(('W', vec![Arg::Const(cell.argument().to_string()), g.clone()]));
            for fact in cell.facts() {
                let atom = match *fact {
                    Fact::Loop { node: n, first, second } => {
                        let n = node(&mut b, n);
                        let w1 = b.weight(&weights[first]);
                        let w2 = b.weight(&weights[second]);
                        ('L', vec![n, w1, w2, g.clone()])
                    }
                    Fact::Clique {
                        node: n,
                        first,
                        second,
                        size,
                        inner,
                    } => {
                        let n = node(&mut b, n);
                        let w1 = b.weight(&weights[first]);
                        let w2 = b.weight(&weights[second]);
                        let w3 = b.weight(&weights[inner]);
                        ('C', vec![n, w1, w2, Arg::Const(size.to_string()), w3, g.clone()])
                    }
                    Fact::Edge { a, b: other, weight } => {
                        let x = node(&mut b, a);
                        let y = node(&mut b, other);
                        let w = b.weight(&weights[weight]);
                        b.atoms.insert(('E', vec![y.clone(), x.clone(), w.clone(), g.clone()]));
                        ('E', vec![x, y, w, g.clone()])
                    }
                };
                b.atoms.insert(atom);
            }
        }

        let mut atoms: Vec<Atom> = b.atoms.iter().cloned().collect();
        atoms.sort_unstable();
        let mut occurrences = vec![Vec::new(); b.sorts.len()];
        for (i, (_, args)) in atoms.iter().enumerate() {
            for arg in args {
                if let Arg::Symbol(s) = arg {
                    if occurrences[*s].last() != Some(&i) {
                        occurrences[*s].push(i);
                    }
                }
            }
        }

        let mut structure = Structure {
            sorts: b.sorts,
            atoms,
            atom_set: b.atoms,
            occurrences,
            colors: Vec::new(),
            invariant: 0,
        };
        structure.refine(2);
        let mut sorted = structure.colors.clone();
        sorted.sort_unstable();
        structure.invariant = hash_of(&(structure.atoms.len(), sorted));
        structure
    }

    /// Colour refinement: a symbol's colour summarises its sort and the atoms around it.
    fn refine(&mut self, rounds: usize) {
        let shape = |atom: &Atom, position: usize, colors: Option<&[u64]>| {
            let args: Vec<(bool, u64)> = atom
                .1
                .iter()
                .enumerate()
                .map(|(j, arg)| match arg {
                    Arg::Const(c) => (false, hash_of(c)),
                    Arg::Symbol(_) if j == position => (true, u64::MAX),
                    Arg::Symbol(s) => (true, colors.map_or(0, |cs| cs[*s])),
                })
                .collect();
            hash_of(&(atom.0, args))
        };
        let positions = |s: usize, atom: &Atom| -> Vec<usize> {
            atom.1
                .iter()
                .enumerate()
                .filter(|(_, a)| **a == Arg::Symbol(s))
                .map(|(j, _)| j)
                .collect()
        };

        let mut colors: Vec<u64> = (0..self.sorts.len())
            .map(|s| {
                let mut shapes: Vec<u64> = self.occurrences[s]
                    .iter()
                    .flat_map(|&i| {
                        let atom = &self.atoms[i];
                        positions(s, atom).into_iter().map(move |p| shape(atom, p, None))
                    })
                    .collect();
                shapes.sort_unstable();
                hash_of(&(self.sorts[s], shapes))
            })
            .collect();

        for _ in 0..rounds {
            colors = (0..self.sorts.len())
                .map(|s| {
                    let mut shapes: Vec<u64> = self.occurrences[s]
                        .iter()
                        .flat_map(|&i| {
                            let atom = &self.atoms[i];
                            let colors: &[u64] = &colors;
                            positions(s, atom)
                                .into_iter()
                                .map(move |p| shape(atom, p, Some(colors)))
                        })
                        .collect();
                    shapes.sort_unstable();
                    hash_of(&(colors[s], shapes))
                })
                .collect();
        }
        self.colors = colors;
    }

    /// Equal for isomorphic structures.
    pub fn invariant(&self) -> u64 {
        self.invariant
    }

    pub fn num_symbols(&self) -> usize {
        self.sorts.len()
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    fn color_counts(&self) -> HashMap<u64, usize> {
        let mut counts = HashMap::new();
        for &c in &self.colors {
            *counts.entry(c).or_default() += 1;
        }
        counts
    }

    /// Searches for a colour-preserving bijection mapping every atom of `self` onto an
    /// atom of `other`.
    pub fn is_isomorphic(&self, other: &Structure) -> bool {
        if self.invariant != other.invariant
            || self.sorts.len() != other.sorts.len()
            || self.atoms.len() != other.atoms.len()
            || self.color_counts() != other.color_counts()
        {
            return false;
        }

        let mut by_color: HashMap<u64, Vec<usize>> = HashMap::new();
        for (s, &c) in other.colors.iter().enumerate() {
            by_color.entry(c).or_default().push(s);
        }
        // Most constrained symbols first.
        let mut order: Vec<usize> = (0..self.sorts.len()).collect();
        order.sort_by_key(|&s| (by_color.get(&self.colors[s]).map_or(0, Vec::len), s));

        let mut image = vec![None; self.sorts.len()];
        let mut used = vec![false; other.sorts.len()];
        self.extend(other, &order, 0, &by_color, &mut image, &mut used)
    }

    fn extend(
        &self,
        other: &Structure,
        order: &[usize],
        depth: usize,
        by_color: &HashMap<u64, Vec<usize>>,
        image: &mut [Option<usize>],
        used: &mut [bool],
    ) -> bool {
        let Some(&s) = order.get(depth) else {
            return true;
        };
        let Some(candidates) = by_color.get(&self.colors[s]) else {
            return false;
        };
        for &t in candidates {
            if used[t] {
                continue;
            }
            image[s] = Some(t);
            used[t] = true;
            if self.consistent(other, s, image) && self.extend(other, order, depth + 1, by_color, image, used) {
                return true;
            }
            image[s] = None;
            used[t] = false;
        }
        false
    }

    /// Do all fully mapped atoms around `s` exist in `other`?
    fn consistent(&self, other: &Structure, s: usize, image: &[Option<usize>]) -> bool {
        self.occurrences[s].iter().all(|&i| {
            let (name, args) = &self.atoms[i];
            let mapped: Option<Vec<Arg>> = args
                .iter()
                .map(|arg| match arg {
                    Arg::Const(c) => Some(Arg::Const(c.clone())),
                    Arg::Symbol(x) => image[*x].map(Arg::Symbol),
                })
                .collect();
            match mapped {
                Some(args) => other.atom_set.contains(&(*name, args)),
                None => true,
            }
        })
    }
}

/// Representatives of the isomorphism classes seen so far, bucketed by invariant.
#[derive(Debug, Default)]
pub struct StructureIndex {
    buckets: HashMap<u64, Vec<usize>>,
    representatives: Vec<Structure>,
}

impl StructureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.representatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.representatives.is_empty()
    }

    /// Class of `structure`, registering it as a new representative if none matches.
    pub fn class_of(&mut self, structure: Structure) -> usize {
        let bucket = self.buckets.entry(structure.invariant()).or_default();
        if let Some(&found) = bucket
            .iter()
            .find(|&&r| self.representatives[r].is_isomorphic(&structure))
        {
            return found;
        }
        let id = self.representatives.len();
        bucket.push(id);
        self.representatives.push(structure);
        id
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn structure(text: &str) -> Structure {
        Structure::new(&CellGraph::parse(text).unwrap())
    }

    #[test]
    fn test_symbols_and_atoms() {
        let s = structure("[W(1), L(n1,'x1+2',1), E(n1,n2,'x1')]");
        // g, n1, n2, two sums, three products, x1
        assert_eq!(s.num_symbols(), 9);
        // G, W, L, E twice, M x3, K x3, P x2
        assert_eq!(s.num_atoms(), 13);
    }

    #[test]
    fn test_relabelled_graphs_are_isomorphic() {
        let a = structure("[W(1), L(n1,'x1',1), L(n2,'x2',2), E(n1,n2,'x1*x2')]");
        let b = structure("[W(1), L(n5,'y2',2), L(n3,'y9',1), E(n3,n5,'y9*y2')]");
        assert_eq!(a.invariant(), b.invariant());
        assert!(a.is_isomorphic(&b));
        assert!(b.is_isomorphic(&a));
    }

    #[test]
    fn test_different_graphs_are_not_isomorphic() {
        let a = structure("[W(1), L(n1,'x1',1), L(n2,'x2',2), E(n1,n2,'x1')]");
        let b = structure("[W(1), L(n1,'x1',1), L(n2,'x2',2), E(n1,n2,'x2')]");
        assert!(!a.is_isomorphic(&b));
    }

    #[test]
    fn test_shared_variables_across_cells() {
        let a = structure("[W(1), L(n1,'x1',1); W(1), L(n1,'x1',2)]");
        let b = structure("[W(1), L(n1,'x1',1); W(1), L(n1,'x2',2)]");
        assert!(!a.is_isomorphic(&b));
        let c = structure("[W(1), L(n4,'z',2); W(1), L(n2,'z',1)]");
        assert!(a.is_isomorphic(&c));
    }

    #[test]
    fn test_index_classes() {
        let mut index = StructureIndex::new();
        assert!(index.is_empty());
        let first = index.class_of(structure("[W(1), E(n1,n2,'x1')]"));
        let again = index.class_of(structure("[W(1), E(n2,n1,'x7')]"));
        let other = index.class_of(structure("[W(2), E(n1,n2,'x1')]"));
        let none = index.class_of(structure("[]"));
        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_ne!(none, first);
        assert_eq!(index.len(), 3);
    }
}

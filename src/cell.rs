//! A single cell of a cell graph and its canonical labelling.
//!
//! A cell is a conjunction of facts:
//!
//! ```text
//! W(scalar)                      aggregate argument
//! L(node, weight, weight)        unary node weights
//! E(node, node, weight)          undirected edge
//! C(node, weight, weight, k, w)  clique summary of size k with inner weight w
//! G(...)                         ignored
//! ```
//!
//! Node names are one letter followed by an index (`n1`, `x3`). Weights are
//! [`SymbolicWeight`]s, shared by text within the cell.
use std::collections::{BTreeSet, HashMap};

use num_bigint::BigInt;

use crate::error::{Error, Result};
use crate::mapping::RenamingMapping;
use crate::utils::min_ties;
use crate::weight::{minimal_binding, SymbolicWeight};

/// Splits `text` at every `separator` outside parentheses and single quotes.
pub(crate) fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth = depth.saturating_sub(1),
            c if c == separator && !quoted && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Splits `P(a, b)` into `("P", ["a", "b"])`.
pub(crate) fn split_fact(text: &str) -> Result<(&str, Vec<&str>)> {
    let fact = text.trim();
    let open = fact
        .find('(')
        .ok_or_else(|| Error::cell_graph(fact, "expected `(`"))?;
    let inner = fact[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| Error::cell_graph(fact, "expected `)`"))?;
    let name = fact[..open].trim();
    let args = if inner.trim().is_empty() {
        Vec::new()
    } else {
        split_top_level(inner, ',').into_iter().map(str::trim).collect()
    };
    Ok((name, args))
}

fn node_index(text: &str, fact: &str) -> Result<u32> {
    let mut chars = text.chars();
    chars.next();
    chars
        .as_str()
        .parse()
        .map_err(|_| Error::cell_graph(fact, format!("bad node `{}`", text)))
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Kind {
    Loop,
    Clique,
    Edge,
}

/// A fact with weights stored as indices into the cell's weight table.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum Fact {
    Loop {
        node: u32,
        first: usize,
        second: usize,
    },
    Clique {
        node: u32,
        first: usize,
        second: usize,
        size: u64,
        inner: usize,
    },
    Edge {
        a: u32,
        b: u32,
        weight: usize,
    },
}

impl Fact {
    fn kind(&self) -> Kind {
        match self {
            Fact::Loop { .. } => Kind::Loop,
            Fact::Clique { .. } => Kind::Clique,
            Fact::Edge { .. } => Kind::Edge,
        }
    }

    fn weights(&self) -> Vec<usize> {
        match *self {
            Fact::Loop { first, second, .. } => vec![first, second],
            Fact::Clique {
                first, second, inner, ..
            } => vec![first, second, inner],
            Fact::Edge { weight, .. } => vec![weight],
        }
    }

    /// Orders in which the fact's nodes may be bound.
    fn node_orders(&self) -> Vec<Vec<u32>> {
        match *self {
            Fact::Loop { node, .. } | Fact::Clique { node, .. } => vec![vec![node]],
            Fact::Edge { a, b, .. } if a == b => vec![vec![a]],
            Fact::Edge { a, b, .. } => vec![vec![a, b], vec![b, a]],
        }
    }

    fn nodes(&self) -> Vec<u32> {
        match *self {
            Fact::Loop { node, .. } | Fact::Clique { node, .. } => vec![node],
            Fact::Edge { a, b, .. } => vec![a, b],
        }
    }

    fn is_bound(&self, weights: &[SymbolicWeight], mapping: &RenamingMapping) -> bool {
        self.nodes().iter().all(|&n| mapping.contains_node(n))
            && self.weights().iter().all(|&w| weights[w].is_fully_applicable(mapping))
    }

    fn render(&self, weights: &[SymbolicWeight], mapping: &RenamingMapping) -> String {
        match *self {
            // Rendered as `A` so that unary facts sort first.
            Fact::Loop { node, first, second } => format!(
                "A({},{},{})",
                mapping.node_label(node),
                weights[first].apply(mapping),
                weights[second].apply(mapping)
            ),
            Fact::Clique {
                node,
                first,
                second,
                size,
                inner,
            } => format!(
                "C({},{},{},{},{})",
                mapping.node_label(node),
                weights[first].apply(mapping),
                weights[second].apply(mapping),
                size,
                weights[inner].apply(mapping)
            ),
            Fact::Edge { a, b, weight } => {
                let (lo, hi) = if mapping.node(a) <= mapping.node(b) { (a, b) } else { (b, a) };
                format!(
                    "E({},{},{})",
                    mapping.node_label(lo),
                    mapping.node_label(hi),
                    weights[weight].apply(mapping)
                )
            }
        }
    }
}

fn distinct(mappings: Vec<RenamingMapping>) -> Vec<RenamingMapping> {
    let mut out: Vec<RenamingMapping> = Vec::with_capacity(mappings.len());
    for m in mappings {
        if !out.contains(&m) {
            out.push(m);
        }
    }
    out
}

/// One parsed cell.
#[derive(Debug, Clone)]
pub struct CellSubGraph {
    nodes: u32,
    argument: String,
    sizes: Vec<u64>,
    facts: Vec<Fact>,
    weights: Vec<SymbolicWeight>,
}

struct WeightTable {
    weights: Vec<SymbolicWeight>,
    index: HashMap<String, usize>,
}

impl WeightTable {
    fn get(&mut self, text: &str) -> Result<usize> {
        let text = text.trim();
        if let Some(&i) = self.index.get(text) {
            return Ok(i);
        }
        let weight = SymbolicWeight::parse(text)?;
        self.weights.push(weight);
        self.index.insert(text.to_string(), self.weights.len() - 1);
        Ok(self.weights.len() - 1)
    }
}

impl CellSubGraph {
    pub fn parse(text: &str) -> Result<Self> {
        let mut table = WeightTable {
            weights: Vec::new(),
            index: HashMap::new(),
        };
        let mut argument = BigInt::from(0);
        let mut facts = Vec::new();

        for part in split_top_level(text, ',') {
            if part.trim().is_empty() {
                continue;
            }
            let (name, args) = split_fact(part)?;
            let expect = |n: usize| {
                if args.len() == n {
                    Ok(())
                } else {
                    Err(Error::cell_graph(
                        part.trim(),
                        format!("`{}` takes {} arguments, found {}", name, n, args.len()),
                    ))
                }
            };
            match name {
                "W" => {
                    expect(1)?;
                    argument = args[0]
                        .parse()
                        .map_err(|_| Error::cell_graph(part.trim(), "W takes an integer"))?;
                }
                "L" => {
                    expect(3)?;
                    facts.push(Fact::Loop {
                        node: node_index(args[0], part)?,
                        first: table.get(args[1])?,
                        second: table.get(args[2])?,
                    });
                }
                "E" => {
                    expect(3)?;
                    facts.push(Fact::Edge {
                        a: node_index(args[0], part)?,
                        b: node_index(args[1], part)?,
                        weight: table.get(args[2])?,
                    });
                }
                "C" => {
                    expect(5)?;
                    facts.push(Fact::Clique {
                        node: node_index(args[0], part)?,
                        first: table.get(args[1])?,
                        second: table.get(args[2])?,
                        size: args[3]
                            .parse()
                            .map_err(|_| Error::cell_graph(part.trim(), "clique size must be an integer"))?,
                        inner: table.get(args[4])?,
                    });
                }
                "G" => {}
                _ => return Err(Error::cell_graph(part.trim(), format!("unknown fact `{}`", name))),
            }
        }

        let nodes = facts.iter().flat_map(Fact::nodes).collect::<BTreeSet<u32>>().len() as u32;
        let weights = table.weights;

        // The most frequent scalar edge weight is folded into the W argument.
        let mut histogram: HashMap<&BigInt, usize> = HashMap::new();
        for fact in &facts {
            if let Fact::Edge { weight, .. } = fact {
                if let Some(s) = weights[*weight].scalar() {
                    *histogram.entry(s).or_default() += 1;
                }
            }
        }
        let common = histogram
            .into_iter()
            .max_by(|(a, x), (b, y)| x.cmp(y).then_with(|| a.cmp(b)))
            .map(|(value, _)| value.clone());
        let argument = match &common {
            Some(value) => format!("{}.{}", argument, value),
            None => argument.to_string(),
        };
        if let Some(value) = &common {
            facts.retain(|f| match f {
                Fact::Edge { weight, .. } => weights[*weight].scalar() != Some(value),
                _ => true,
            });
        }

        let mut sizes: Vec<u64> = facts
            .iter()
            .filter_map(|f| match f {
                Fact::Clique { size, .. } => Some(*size),
                _ => None,
            })
            .collect();
        sizes.sort_unstable();

        Ok(Self {
            nodes,
            argument,
            sizes,
            facts,
            weights,
        })
    }

    /// Number of distinct nodes mentioned by the facts.
    pub fn nodes(&self) -> u32 {
        self.nodes
    }

    /// The `W` argument, suffixed with `.v` when scalar edges of value `v` were folded in.
    pub fn argument(&self) -> &str {
        &self.argument
    }

    pub fn num_facts(&self) -> usize {
        self.facts.len()
    }

    pub(crate) fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub(crate) fn weights(&self) -> &[SymbolicWeight] {
        &self.weights
    }

    /// Relabelling-invariant summary; isomorphic cells share it.
    pub fn hash(&self) -> String {
        let mut signatures: Vec<String> = self.weights.iter().map(SymbolicWeight::variableless).collect();
        signatures.sort_unstable();
        let mut out = format!("{}-[", self.nodes);
        for k in &self.sizes {
            out.push_str(&k.to_string());
            out.push(',');
        }
        out.push_str("]-[");
        for s in &signatures {
            out.push_str(s);
            out.push(',');
        }
        out.push_str("]-");
        out.push_str(&self.argument);
        out
    }

    /// All facts rendered under `mapping`, sorted and joined.
    pub fn apply(&self, mapping: &RenamingMapping) -> String {
        let mut facts: Vec<String> = self.facts.iter().map(|f| f.render(&self.weights, mapping)).collect();
        facts.push(format!("W({})", self.argument));
        facts.sort_unstable();
        facts.join(", ")
    }

    /// Smallest bindings of one fact, rendered.
    fn bind(&self, fact: &Fact, mapping: &RenamingMapping) -> Vec<(String, RenamingMapping)> {
        let mut rendered = Vec::new();
        for order in fact.node_orders() {
            let mut start = mapping.clone();
            for node in order {
                start.add_node_if_needed(node);
            }
            let mut partial = vec![start];
            for w in fact.weights() {
                partial = partial
                    .iter()
                    .flat_map(|p| minimal_binding(&self.weights[w], p).1)
                    .collect();
            }
            rendered.extend(partial.into_iter().map(|m| (fact.render(&self.weights, &m), m)));
        }
        match min_ties(rendered) {
            Some((text, mappings)) => distinct(mappings).into_iter().map(|m| (text.clone(), m)).collect(),
            None => Vec::new(),
        }
    }

    /// Canonical rendering of this cell over all completions of `mapping`.
    ///
    /// Unary facts are bound first, then cliques, then edges. Within the first kind that
    /// still has unbound facts, every fact is tried and only the lexicographically
    /// smallest renderings are continued. Returns the smallest full rendering and every
    /// completed mapping that produces it.
    pub fn minimal(&self, mapping: &RenamingMapping) -> (String, Vec<RenamingMapping>) {
        for kind in [Kind::Loop, Kind::Clique, Kind::Edge] {
            let candidates = self
                .facts
                .iter()
                .filter(|f| f.kind() == kind && !f.is_bound(&self.weights, mapping))
                .flat_map(|f| self.bind(f, mapping));
            let Some((_, ties)) = min_ties(candidates) else {
                continue;
            };
            let results = ties.iter().flat_map(|m| {
                let (text, completions) = self.minimal(m);
                completions.into_iter().map(move |c| (text.clone(), c))
            });
            if let Some((text, completions)) = min_ties(results) {
                return (text, distinct(completions));
            }
        }
        (self.apply(mapping), vec![mapping.clone()])
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("W(1), L(n1,'a,b',1)", ','),
            vec!["W(1)", " L(n1,'a,b',1)"]
        );
        assert_eq!(split_top_level("a;b", ';'), vec!["a", "b"]);
    }

    #[test]
    fn test_split_fact() {
        let (name, args) = split_fact(" E(n1, n2, 'x1^2 + 1') ").unwrap();
        assert_eq!(name, "E");
        assert_eq!(args, vec!["n1", "n2", "'x1^2 + 1'"]);
        assert!(split_fact("E n1").is_err());
    }

    #[test]
    fn test_parse() {
        let cell = CellSubGraph::parse("W(1), L(n1,1,1)").unwrap();
        assert_eq!(cell.nodes(), 1);
        assert_eq!(cell.argument(), "1");
        assert_eq!(cell.num_facts(), 1);
        assert_eq!(cell.hash(), "1-[]-[1,,,]-1");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            CellSubGraph::parse("W(1), Q(n1)"),
            Err(Error::CellGraph { .. })
        ));
        assert!(CellSubGraph::parse("L(n1,1)").is_err());
        assert!(CellSubGraph::parse("E(n1,nx,1)").is_err());
        assert!(CellSubGraph::parse("W(1), G(n1)").is_ok());
    }

    #[test]
    fn test_common_edge_weight_is_folded() {
        let cell = CellSubGraph::parse("W(2), E(n1,n2,3), E(n2,n3,3), E(n1,n3,'x1'), L(n1,1,1)").unwrap();
        assert_eq!(cell.nodes(), 3);
        assert_eq!(cell.argument(), "2.3");
        assert_eq!(cell.num_facts(), 2);
    }

    #[test]
    fn test_edge_histogram_ties_prefer_larger_value() {
        let cell = CellSubGraph::parse("W(1), E(n1,n2,2), E(n2,n3,5)").unwrap();
        assert_eq!(cell.argument(), "1.5");
    }

    #[test]
    fn test_minimal_ignores_node_labels() {
        let a = CellSubGraph::parse("W(1), L(n1,'x1',1), L(n2,'x2',2), E(n1,n2,'x1*x2')").unwrap();
        let b = CellSubGraph::parse("W(1), L(n7,'y2',2), L(n3,'y1',1), E(n7,n3,'y1*y2')").unwrap();
        let (ca, _) = a.minimal(&RenamingMapping::new());
        let (cb, _) = b.minimal(&RenamingMapping::new());
        assert_eq!(ca, cb);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_node_count_ignores_names() {
        let a = CellSubGraph::parse("W(1), E(n1,n2,'x1')").unwrap();
        let b = CellSubGraph::parse("W(1), E(n9,n4,'x1')").unwrap();
        assert_eq!(a.nodes(), 2);
        assert_eq!(b.nodes(), 2);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_minimal_separates_non_isomorphic() {
        let a = CellSubGraph::parse("W(1), L(n1,'x1',1), L(n2,'x2',2), E(n1,n2,'x1')").unwrap();
        let b = CellSubGraph::parse("W(1), L(n1,'x1',1), L(n2,'x2',2), E(n1,n2,'x2')").unwrap();
        let (ca, _) = a.minimal(&RenamingMapping::new());
        let (cb, _) = b.minimal(&RenamingMapping::new());
        assert_ne!(ca, cb);
    }

    #[test]
    fn test_minimal_binds_everything() {
        let cell = CellSubGraph::parse("W(1), C(n1,'x1',1,3,'x1^2'), E(n1,n2,'x2')").unwrap();
        let (canonical, mappings) = cell.minimal(&RenamingMapping::new());
        assert_eq!(mappings.len(), 1);
        let mapping = &mappings[0];
        assert!(!canonical.contains('?'));
        assert!(mapping.contains_node(1) && mapping.contains_node(2));
        assert!(mapping.contains_math("x1") && mapping.contains_math("x2"));
        assert!(canonical.contains("C(0,1*x0^1,1,3,1*x0^2)"));
    }
}

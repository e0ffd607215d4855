//! Symbolic polynomial weights of cell graphs.
//!
//! A weight is a sum of monomials `c * v1^e1 * v2^e2 * ...` with an arbitrary-precision
//! integer coefficient `c` and abstract variables `vi`. Variable names carry no meaning
//! across isomorphic cell graphs, so every rendering goes through a [`RenamingMapping`].
use std::collections::BTreeMap;
use std::fmt;

use num_bigint::BigInt;

use crate::error::{Error, Result};
use crate::mapping::RenamingMapping;
use crate::utils::{cartesian, min_ties, permutations};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Monomial {
    coefficient: BigInt,
    factors: Vec<(String, i64)>,
}

impl Monomial {
    /// Renaming-invariant key: coefficient and sorted exponents.
    fn key(&self) -> (BigInt, Vec<i64>) {
        let mut exponents: Vec<i64> = self.factors.iter().map(|&(_, e)| e).collect();
        exponents.sort_unstable();
        (self.coefficient.clone(), exponents)
    }

    fn render(&self, mapping: &RenamingMapping) -> String {
        if self.factors.is_empty() {
            return self.coefficient.to_string();
        }
        let mut factors: Vec<String> = self
            .factors
            .iter()
            .map(|(v, e)| format!("{}^{}", mapping.math_label(v), e))
            .collect();
        factors.sort_unstable();
        format!("{}*{}", self.coefficient, factors.join("*"))
    }

    fn is_bound(&self, mapping: &RenamingMapping) -> bool {
        self.factors.iter().all(|(v, _)| mapping.contains_math(v))
    }
}

/// A parsed polynomial weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolicWeight {
    terms: Vec<Monomial>,
}

/// Splits `text` into signed terms at `+`/`-` that do not follow `^` or `*`.
fn split_terms(text: &str) -> Vec<(bool, &str)> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    let mut negative = false;
    for (i, &b) in bytes.iter().enumerate() {
        if (b == b'+' || b == b'-') && i > 0 && !matches!(bytes[i - 1], b'^' | b'*') {
            out.push((negative, &text[start..i]));
            negative = b == b'-';
            start = i + 1;
        } else if i == 0 && b == b'-' {
            negative = true;
            start = 1;
        } else if i == 0 && b == b'+' {
            start = 1;
        }
    }
    out.push((negative, &text[start..]));
    out
}

impl SymbolicWeight {
    /// Parses `'x1^2 + 2*x1*x2 - 1'`, surrounding quotes optional.
    pub fn parse(text: &str) -> Result<Self> {
        let inner = text.trim();
        let inner = inner
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .unwrap_or(inner);
        let compact: String = inner.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(Error::cell_graph(text, "empty weight"));
        }

        let mut terms = Vec::new();
        for (negative, part) in split_terms(&compact) {
            if part.is_empty() {
                return Err(Error::cell_graph(text, "empty term"));
            }
            let mut coefficient = BigInt::from(if negative { -1 } else { 1 });
            let mut factors = Vec::new();
            for factor in part.split('*') {
                if let Ok(scalar) = factor.parse::<BigInt>() {
                    coefficient *= scalar;
                    continue;
                }
                let (name, exponent) = match factor.split_once('^') {
                    Some((name, e)) => {
                        let e = e
                            .parse::<i64>()
                            .map_err(|_| Error::cell_graph(text, format!("bad exponent in `{}`", factor)))?;
                        (name, e)
                    }
                    None => (factor, 1),
                };
                if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    return Err(Error::cell_graph(text, format!("bad factor `{}`", factor)));
                }
                factors.push((name.to_string(), exponent));
            }
            terms.push(Monomial { coefficient, factors });
        }
        Ok(Self { terms })
    }

    /// Rendering with every variable forgotten: `coef,,e1,e2` per term, sorted.
    pub fn variableless(&self) -> String {
        let mut parts: Vec<String> = self
            .terms
            .iter()
            .map(|t| {
                let (coef, exponents) = t.key();
                let exponents: Vec<String> = exponents.iter().map(i64::to_string).collect();
                format!("{},,{}", coef, exponents.join(","))
            })
            .collect();
        parts.sort_unstable();
        parts.join("+")
    }

    /// Rendering under `mapping`, terms sorted; unbound variables render as `?`.
    pub fn apply(&self, mapping: &RenamingMapping) -> String {
        let mut parts: Vec<String> = self.terms.iter().map(|t| t.render(mapping)).collect();
        parts.sort_unstable();
        parts.join("+")
    }

    pub fn is_fully_applicable(&self, mapping: &RenamingMapping) -> bool {
        self.terms.iter().all(|t| t.is_bound(mapping))
    }

    pub fn is_only_scalar(&self) -> bool {
        self.terms.len() == 1 && self.terms[0].factors.is_empty()
    }

    /// The value of a constant weight.
    pub fn scalar(&self) -> Option<&BigInt> {
        self.is_only_scalar().then(|| &self.terms[0].coefficient)
    }

    /// Coefficient and `(variable, exponent)` factors of every term.
    pub(crate) fn monomials(&self) -> impl Iterator<Item = (&BigInt, &[(String, i64)])> {
        self.terms.iter().map(|t| (&t.coefficient, t.factors.as_slice()))
    }

    /// Distinct variable names, in order of appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for t in &self.terms {
            for (v, _) in &t.factors {
                if !out.contains(&v.as_str()) {
                    out.push(v);
                }
            }
        }
        out
    }

    /// The next binding step of canonical labelling.
    ///
    /// Among the terms that still have unbound variables, only those with the smallest
    /// renaming-invariant key are candidates. For each candidate, the free variables are
    /// bound group by group (ascending exponent), trying every order within a group.
    /// Returns the smallest rendering of a candidate term together with every extended
    /// mapping producing it, or `None` if the weight is already fully bound.
    pub fn first_unassigned_addition(&self, mapping: &RenamingMapping) -> Option<(String, Vec<RenamingMapping>)> {
        let open: Vec<&Monomial> = self.terms.iter().filter(|t| !t.is_bound(mapping)).collect();
        let min_key = open.iter().map(|t| t.key()).min()?;

        let mut candidates: Vec<(String, RenamingMapping)> = Vec::new();
        for term in open.into_iter().filter(|t| t.key() == min_key) {
            let mut groups: BTreeMap<i64, Vec<&str>> = BTreeMap::new();
            for (v, e) in &term.factors {
                if !mapping.contains_math(v) {
                    let group = groups.entry(*e).or_default();
                    if !group.contains(&v.as_str()) {
                        group.push(v);
                    }
                }
            }
            let orders: Vec<Vec<Vec<&str>>> = groups.values().map(|g| permutations(g)).collect();
            for choice in cartesian(&orders) {
                let mut extended = mapping.clone();
                for v in choice.iter().flatten() {
                    extended.add_math_variable_image(v);
                }
                candidates.push((term.render(&extended), extended));
            }
        }
        min_ties(candidates)
    }
}

impl fmt::Display for SymbolicWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, t) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{}", t.coefficient)?;
            for (v, e) in &t.factors {
                write!(f, "*{}^{}", v, e)?;
            }
        }
        Ok(())
    }
}

/// The smallest full rendering of `weight` over all completions of `mapping`, with every
/// completion that attains it.
pub fn minimal_binding(weight: &SymbolicWeight, mapping: &RenamingMapping) -> (String, Vec<RenamingMapping>) {
    let Some((_, candidates)) = weight.first_unassigned_addition(mapping) else {
        return (weight.apply(mapping), vec![mapping.clone()]);
    };
    let results = candidates.iter().flat_map(|c| {
        let (rendered, completions) = minimal_binding(weight, c);
        completions.into_iter().map(move |m| (rendered.clone(), m))
    });
    min_ties(results).unwrap_or_else(|| (weight.apply(mapping), vec![mapping.clone()]))
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_parse_scalar() {
        let w = SymbolicWeight::parse("-4").unwrap();
        assert!(w.is_only_scalar());
        assert_eq!(w.scalar(), Some(&BigInt::from(-4)));
        let w = SymbolicWeight::parse("'2*3'").unwrap();
        assert_eq!(w.scalar(), Some(&BigInt::from(6)));
    }

    #[test]
    fn test_parse_polynomial() {
        let w = SymbolicWeight::parse("'x1^2 + 2*x1*x2^3 - 1'").unwrap();
        assert!(!w.is_only_scalar());
        assert_eq!(w.variables(), vec!["x1", "x2"]);
        assert_eq!(w.variableless(), "-1,,+1,,2+2,,1,3");
        assert_eq!(w.to_string(), "1*x1^2+2*x1^1*x2^3+-1");
    }

    #[test]
    fn test_parse_negative_exponent() {
        let w = SymbolicWeight::parse("'3*x1^-1-x2'").unwrap();
        assert_eq!(w.variableless(), "-1,,1+3,,-1");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(SymbolicWeight::parse("''"), Err(Error::CellGraph { .. })));
        assert!(SymbolicWeight::parse("x1^a").is_err());
        assert!(SymbolicWeight::parse("x1++x2").is_err());
    }

    #[test]
    fn test_apply() {
        let w = SymbolicWeight::parse("'x1*x2^2 + 5'").unwrap();
        let mut m = RenamingMapping::new();
        assert_eq!(w.apply(&m), "1*?^1*?^2+5");
        assert!(!w.is_fully_applicable(&m));
        m.add_math_variable_image("x2");
        m.add_math_variable_image("x1");
        assert!(w.is_fully_applicable(&m));
        assert_eq!(w.apply(&m), "1*x0^2*x1^1+5");
    }

    #[test]
    fn test_minimal_binding_is_renaming_invariant() {
        let a = SymbolicWeight::parse("'x1^2 + x1*x2 + 3*x2'").unwrap();
        let b = SymbolicWeight::parse("'y7^2 + y7*y3 + 3*y3'").unwrap();
        let (ra, _) = minimal_binding(&a, &RenamingMapping::new());
        let (rb, _) = minimal_binding(&b, &RenamingMapping::new());
        assert_eq!(ra, rb);

        let c = SymbolicWeight::parse("'x1^2 + x1*x2 + 3*x1'").unwrap();
        let (rc, _) = minimal_binding(&c, &RenamingMapping::new());
        assert_ne!(ra, rc);
    }

    #[test]
    fn test_minimal_binding_ties() {
        let w = SymbolicWeight::parse("'x1 + x2'").unwrap();
        let (rendered, mappings) = minimal_binding(&w, &RenamingMapping::new());
        assert_eq!(rendered, "1*x0^1+1*x1^1");
        assert_eq!(mappings.len(), 2);
    }
}

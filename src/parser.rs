//! Text syntax for literals, clauses and sentences.
//!
//! ```text
//! clause     := ["[" id "]"] ["("] prefix literals [")"]
//! prefix     := ( ("V" | "E" | "E=" k) var ){0,2}
//! literals   := literal ( sep literal )* ["."]
//! literal    := ["!" | "~"] name [ "(" term ( "," term )* ")" ]
//! ```
//!
//! Terms starting with an uppercase letter, terms bound by the prefix, and `_` (a fresh
//! anonymous variable) are variables; everything else is a constant. Inside `'...'` any
//! character is literal, and `\` escapes the next character.
use crate::arena::Arena;
use crate::clause::Clause;
use crate::error::{Error, Result};
use crate::quantifier::{Quantifier, QuantifierKind};
use crate::types::{LitId, TermId};

/// Splits on `separator` at bracket depth zero, dropping unquoted whitespace.
fn split_top_level(text: &str, separator: char, context: &str) -> Result<Vec<String>> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut escaped = false;

    for ch in text.chars().chain(std::iter::once(separator)) {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' => {
                current.push(ch);
                escaped = true;
            }
            '\'' => {
                quoted = !quoted;
                current.push(ch);
            }
            _ if quoted => current.push(ch),
            c if c.is_whitespace() => {}
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::parse(context, "unbalanced `)`"))?;
                current.push(ch);
            }
            c if c == separator && depth == 0 => {
                if current.is_empty() {
                    return Err(Error::parse(context, "empty element"));
                }
                out.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }

    if quoted {
        return Err(Error::parse(context, "unterminated quote"));
    }
    if depth != 0 {
        return Err(Error::parse(context, "unbalanced `(`"));
    }
    Ok(out)
}

fn parse_term(arena: &mut Arena, text: &str, bound: &[&str]) -> TermId {
    if text == "_" {
        return arena.fresh_variable();
    }
    let starts_upper = text.chars().next().is_some_and(char::is_uppercase);
    if starts_upper || bound.contains(&text) {
        arena.variable(text)
    } else {
        arena.constant(text)
    }
}

fn parse_literal(arena: &mut Arena, text: &str, bound: &[&str]) -> Result<LitId> {
    let (negated, body) = match text.strip_prefix(['!', '~']) {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let (name, args) = match body.find('(') {
        None => (body, Vec::new()),
        Some(open) => {
            let inner = body[open + 1..]
                .strip_suffix(')')
                .ok_or_else(|| Error::parse(text, "literal must end with `)`"))?;
            let args = if inner.is_empty() {
                Vec::new()
            } else {
                split_top_level(inner, ',', text)?
            };
            (&body[..open], args)
        }
    };
    if name.is_empty() {
        return Err(Error::parse(text, "missing predicate name"));
    }
    if name.contains([')', ',', '\'']) {
        return Err(Error::parse(text, "malformed predicate name"));
    }

    let terms: Vec<TermId> = args.iter().map(|a| parse_term(arena, a, bound)).collect();
    let predicate = arena.predicate(name, terms.len());
    Ok(arena.literal(predicate, terms, negated))
}

/// Parses a separator-delimited list of literals.
pub fn parse_literals(arena: &mut Arena, text: &str, separator: char, bound: &[&str]) -> Result<Vec<LitId>> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    split_top_level(trimmed, separator, text)?
        .iter()
        .map(|lit| parse_literal(arena, lit, bound))
        .collect()
}

/// Parses an unquantified clause, e.g. `p(X,Y), !q(Y,X)` with `,` as separator.
pub fn parse_clause(arena: &mut Arena, text: &str, separator: char) -> Result<Clause> {
    let literals = parse_literals(arena, text, separator, &[])?;
    Ok(Clause::new(arena, literals, None))
}

/// Strips one pair of parentheses if they enclose the whole text.
fn strip_wrapper(text: &str) -> &str {
    let Some(inner) = text.strip_prefix('(').and_then(|s| s.strip_suffix(')')) else {
        return text;
    };
    let mut depth = 0i32;
    for ch in inner.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return text;
                }
            }
            _ => {}
        }
    }
    if depth == 0 {
        inner.trim()
    } else {
        text
    }
}

/// Parses a clause with an optional `[id]` tag, optional wrapping parentheses and a
/// quantifier prefix, e.g. `(V x E=1 y ~B0(x, y) | U0(x))`.
pub fn parse_quantified(arena: &mut Arena, text: &str) -> Result<Clause> {
    let mut rest = text.trim();
    if let Some(tagged) = rest.strip_prefix('[') {
        let close = tagged
            .find(']')
            .ok_or_else(|| Error::parse(text, "unterminated `[` tag"))?;
        rest = tagged[close + 1..].trim();
    }
    rest = strip_wrapper(rest);

    // (universal, bound, variable name)
    let mut prefix: Vec<(bool, Option<u32>, &str)> = Vec::new();
    loop {
        let mut parts = rest.splitn(3, char::is_whitespace);
        let (Some(head), Some(var)) = (parts.next(), parts.next()) else {
            break;
        };
        let marker = match head {
            "V" => (true, None),
            "E" => (false, None),
            _ => match head.strip_prefix("E=") {
                Some(k) => {
                    let k = k
                        .parse::<u32>()
                        .map_err(|_| Error::parse(text, format!("bad cardinality `{}`", k)))?;
                    (false, Some(k))
                }
                None => break,
            },
        };
        prefix.push((marker.0, marker.1, var));
        rest = parts.next().unwrap_or("").trim_start();
    }

    let bound: Vec<&str> = prefix.iter().map(|&(_, _, v)| v).collect();
    let quantifier = match prefix.as_slice() {
        [] => None,
        [(u, k, v)] => {
            let kind = QuantifierKind::from_tokens(&[*u]).ok_or_else(|| Error::parse(text, "bad prefix"))?;
            if !Quantifier::is_valid(kind, *k, None) {
                return Err(Error::parse(text, "cardinality on a universal quantifier"));
            }
            let var = arena.variable(v);
            Some(Quantifier::single(kind, var, *k))
        }
        [(u1, k1, v1), (u2, k2, v2)] => {
            let kind = QuantifierKind::from_tokens(&[*u1, *u2]).ok_or_else(|| Error::parse(text, "bad prefix"))?;
            if !Quantifier::is_valid(kind, *k1, *k2) {
                return Err(Error::parse(text, "cardinality on a universal quantifier"));
            }
            if v1 == v2 {
                return Err(Error::parse(text, "a variable is bound twice"));
            }
            let vars = [arena.variable(v1), arena.variable(v2)];
            Some(Quantifier::new(kind, vars, *k1, *k2))
        }
        _ => return Err(Error::parse(text, "more than two quantified variables")),
    };

    let literals = parse_literals(arena, rest, '|', &bound)?;
    Ok(Clause::new(arena, literals, quantifier))
}

/// Parses a conjunction of quantified clauses joined by `&`.
pub fn parse_sentence(arena: &mut Arena, text: &str) -> Result<Vec<Clause>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split('&').map(|part| parse_quantified(arena, part)).collect()
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_parse_comma_separated() {
        let mut arena = Arena::new();
        let clause = parse_clause(&mut arena, "p(X,Y), !q(Y,X)", ',').unwrap();
        assert_eq!(clause.len(), 2);
        let mut shown: Vec<&str> = clause.literals().iter().map(|&l| arena.display(l)).collect();
        shown.sort();
        assert_eq!(shown, vec!["p(X, Y)", "~q(Y, X)"]);
        assert!(clause.literals().iter().all(|&l| arena.variables(l).len() == 2));
    }

    #[test]
    fn test_terms() {
        let mut arena = Arena::new();
        let lits = parse_literals(&mut arena, "p(a, X, _, 'Big one'), q(_).", ',', &[]).unwrap();
        assert_eq!(lits.len(), 2);
        let p = arena.lit(lits[0]).clone();
        assert!(!arena.is_variable(p.args[0]));
        assert!(arena.is_variable(p.args[1]));
        assert!(arena.is_variable(p.args[2]));
        assert_eq!(arena.term(p.args[3]).name(), "'Big one'");
        let q = arena.lit(lits[1]).clone();
        assert_ne!(q.args[0], p.args[2]);
    }

    #[test]
    fn test_quoted_separator() {
        let mut arena = Arena::new();
        let lits = parse_literals(&mut arena, r"p('a,b'), q(c\,d)", ',', &[]).unwrap();
        assert_eq!(lits.len(), 2);
        assert_eq!(arena.lit(lits[0]).args.len(), 1);
    }

    #[test]
    fn test_errors() {
        let mut arena = Arena::new();
        assert!(matches!(parse_literals(&mut arena, "p(X", ',', &[]), Err(Error::Parse { .. })));
        assert!(parse_literals(&mut arena, "p(X))", ',', &[]).is_err());
        assert!(parse_literals(&mut arena, "p('X)", ',', &[]).is_err());
        assert!(parse_literals(&mut arena, "p(X),,q", ',', &[]).is_err());
        assert!(parse_literals(&mut arena, "(X)", ',', &[]).is_err());
    }

    #[test]
    fn test_quantified() {
        let mut arena = Arena::new();
        let c = parse_quantified(&mut arena, "[7] (V x E=1 y ~B0(x, y) | U0(x))").unwrap();
        let q = c.quantifier().unwrap();
        assert_eq!(q.kind(), QuantifierKind::ForallExists);
        assert_eq!(q.second(), Some(1));
        assert_eq!(c.len(), 2);
        assert_eq!(c.to_fol(&arena), "V x E=1 y U0(x) | ~B0(x, y)");
    }

    #[test]
    fn test_invalid_prefix() {
        let mut arena = Arena::new();
        assert!(parse_quantified(&mut arena, "E=k x U0(x)").is_err());
        assert!(parse_quantified(&mut arena, "V x E x U0(x)").is_err());
        assert!(parse_quantified(&mut arena, "V x V y V z U0(x)").is_err());
    }

    #[test]
    fn test_roundtrip() {
        let mut arena = Arena::new();
        for text in [
            "V x V y B0(x, y) | ~B0(y, x)",
            "E=2 x U0(x)",
            "E x V y B0(x, x) | U1(y)",
            "V x E=1 y B0(x, y)",
        ] {
            let c = parse_quantified(&mut arena, text).unwrap();
            let fol = c.to_fol(&arena);
            let again = parse_quantified(&mut arena, &fol).unwrap();
            assert_eq!(c, again);
            let again = parse_quantified(&mut arena, c.canonical()).unwrap();
            assert_eq!(c.canonical(), again.canonical());
        }
    }

    #[test]
    fn test_sentence() {
        let mut arena = Arena::new();
        let clauses = parse_sentence(&mut arena, "(V x U0(x)) & (E x E y B0(x, y))").unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[1].used_variables(), 2);
    }
}

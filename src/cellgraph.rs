//! Whole cell graphs: parsing of the external tool's output lines and canonical forms.
use std::collections::BTreeMap;
use std::fmt;

use crate::cell::{split_top_level, CellSubGraph};
use crate::error::{Error, Result};
use crate::mapping::RenamingMapping;
use crate::utils::min_ties;

/// The cell graph of one sentence.
#[derive(Debug, Clone)]
pub enum CellGraph {
    /// The sentence has no model.
    NoModel,
    /// `;`-separated cells together with the text they were parsed from.
    Cells { text: String, cells: Vec<CellSubGraph> },
}

impl CellGraph {
    /// Parses `[cell; cell; ...]`; the brackets are optional and `[]` means no model.
    pub fn parse(line: &str) -> Result<Self> {
        let trimmed = line.trim();
        let inner = match (trimmed.strip_prefix('['), trimmed.ends_with(']')) {
            (Some(rest), true) => &rest[..rest.len() - 1],
            (None, false) => trimmed,
            _ => return Err(Error::cell_graph(line, "unbalanced brackets")),
        };
        let inner = inner.trim();
        if inner.is_empty() {
            return Ok(CellGraph::NoModel);
        }
        let cells = split_top_level(inner, ';')
            .into_iter()
            .map(CellSubGraph::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(CellGraph::Cells {
            text: inner.to_string(),
            cells,
        })
    }

    pub fn is_no_model(&self) -> bool {
        matches!(self, CellGraph::NoModel)
    }

    /// The text between the brackets.
    pub fn text(&self) -> &str {
        match self {
            CellGraph::NoModel => "",
            CellGraph::Cells { text, .. } => text,
        }
    }

    pub fn cells(&self) -> &[CellSubGraph] {
        match self {
            CellGraph::NoModel => &[],
            CellGraph::Cells { cells, .. } => cells,
        }
    }

    /// A string shared by exactly the cell graphs equal up to node renaming inside
    /// each cell, renaming of weight variables across all cells, and cell order.
    pub fn canonical(&self) -> String {
        let cells = match self {
            CellGraph::NoModel => return "[]".to_string(),
            CellGraph::Cells { cells, .. } => cells,
        };
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, cell) in cells.iter().enumerate() {
            groups.entry(cell.hash()).or_default().push(i);
        }
        minimal_canonical(cells, &mut groups, &RenamingMapping::new())
    }
}

/// Picks the smallest cell of the first hash group, removes it and recurses.
///
/// Weight variables bound by earlier cells stay bound for later ones; node bindings
/// are per cell.
fn minimal_canonical(
    cells: &[CellSubGraph],
    groups: &mut BTreeMap<String, Vec<usize>>,
    mapping: &RenamingMapping,
) -> String {
    let Some((key, members)) = groups.iter().next() else {
        return String::new();
    };
    let key = key.clone();
    let members = members.clone();

    let starts = members.iter().enumerate().flat_map(|(position, &i)| {
        let (text, completions) = cells[i].minimal(&mapping.copy_math_variables());
        completions.into_iter().map(move |c| (text.clone(), (position, c)))
    });
    let Some((minimal, ties)) = min_ties(starts) else {
        return String::new();
    };

    // Tied starts leaving the same weight-variable bindings lead to the same remainder.
    let mut seen: Vec<RenamingMapping> = Vec::new();
    let mut rest: Option<String> = None;
    for (position, completed) in ties {
        let math = completed.copy_math_variables();
        if seen.contains(&math) {
            continue;
        }
        seen.push(math);

        if members.len() == 1 {
            groups.remove(&key);
        } else if let Some(group) = groups.get_mut(&key) {
            group.remove(position);
        }
        let current = minimal_canonical(cells, groups, &completed);
        groups.insert(key.clone(), members.clone());

        if rest.as_ref().map_or(true, |r| current < *r) {
            rest = Some(current);
        }
    }

    match rest {
        Some(rest) if !rest.is_empty() => format!("{}>{}", minimal, rest),
        _ => minimal,
    }
}

impl fmt::Display for CellGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.text())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_parse_one_fact_and_no_model() {
        let graph = CellGraph::parse("[W(1), L(n1,1,1)]").unwrap();
        assert!(!graph.is_no_model());
        assert_eq!(graph.cells().len(), 1);
        assert_eq!(graph.cells()[0].num_facts(), 1);
        assert_eq!(graph.text(), "W(1), L(n1,1,1)");

        let empty = CellGraph::parse(" [] ").unwrap();
        assert!(empty.is_no_model());
        assert_eq!(empty.canonical(), "[]");
        assert_eq!(empty.to_string(), "[]");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            CellGraph::parse("[W(1), X(n1)]"),
            Err(Error::CellGraph { .. })
        ));
        assert!(CellGraph::parse("[W(1)").is_err());
    }

    #[test]
    fn test_swapped_node_labels_share_canonical() {
        let a = CellGraph::parse("[W(1), L(n1,'x1',1), L(n2,2,1), E(n1,n2,'x2')]").unwrap();
        let b = CellGraph::parse("[W(1), L(n2,'x1',1), L(n1,2,1), E(n2,n1,'x2')]").unwrap();
        assert_eq!(a.canonical(), b.canonical());

        let c = CellGraph::parse("[W(1), L(n1,'x1',1), L(n2,'x1',1), E(n1,n2,'x2')]").unwrap();
        assert_ne!(a.canonical(), c.canonical());
    }

    #[test]
    fn test_renamed_variables_share_canonical() {
        let a = CellGraph::parse("[W(1), L(n1,'x1',1); W(2), L(n1,'x1*x2',1)]").unwrap();
        let b = CellGraph::parse("[W(2), L(n4,'y1*y2',1); W(1), L(n9,'y2',1)]").unwrap();
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn test_canonical_shape() {
        let graph = CellGraph::parse("[W(1), L(n1,1,1); W(3), L(n1,1,1)]").unwrap();
        assert_eq!(graph.canonical(), "A(0,1,1), W(1)>A(0,1,1), W(3)");
    }

    #[test]
    fn test_cell_order_is_irrelevant() {
        let a = CellGraph::parse("[W(1), L(n1,'x1',1), E(n1,n2,'x1'); W(1), L(n1,'x2',1), E(n1,n2,'x1')]").unwrap();
        let b = CellGraph::parse("[W(1), L(n2,'x2',1), E(n1,n2,'x1'); W(1), L(n2,'x1',1), E(n2,n1,'x1')]").unwrap();
        assert_eq!(a.canonical(), b.canonical());
    }
}

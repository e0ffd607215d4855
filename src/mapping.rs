//! Partial renamings of cell-graph nodes and weight variables.
use std::collections::HashMap;

/// Assigns dense labels to node indices and to polynomial variable names.
///
/// The label of a newly bound item is the number of items of its sort bound before it,
/// so two mappings built by binding in the same structural order agree label by label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamingMapping {
    nodes: HashMap<u32, usize>,
    math: HashMap<String, usize>,
}

impl RenamingMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy keeping only the weight-variable bindings.
    pub fn copy_math_variables(&self) -> Self {
        Self {
            nodes: HashMap::new(),
            math: self.math.clone(),
        }
    }

    /// Adds every binding of `other`, overwriting on conflict.
    pub fn incorporate(&mut self, other: &RenamingMapping) {
        self.nodes.extend(other.nodes.iter().map(|(&k, &v)| (k, v)));
        self.math.extend(other.math.iter().map(|(k, &v)| (k.clone(), v)));
    }

    pub fn node(&self, node: u32) -> Option<usize> {
        self.nodes.get(&node).copied()
    }

    pub fn math(&self, variable: &str) -> Option<usize> {
        self.math.get(variable).copied()
    }

    pub fn contains_node(&self, node: u32) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn contains_math(&self, variable: &str) -> bool {
        self.math.contains_key(variable)
    }

    pub fn is_nodes_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_node_if_needed(&mut self, node: u32) {
        let next = self.nodes.len();
        self.nodes.entry(node).or_insert(next);
    }

    pub fn add_math_variable_image(&mut self, variable: &str) {
        if !self.math.contains_key(variable) {
            let next = self.math.len();
            self.math.insert(variable.to_string(), next);
        }
    }

    /// Label of `node`, or `?` while unbound.
    pub fn node_label(&self, node: u32) -> String {
        self.node(node).map_or_else(|| "?".to_string(), |l| l.to_string())
    }

    /// Label of `variable`, or `?` while unbound.
    pub fn math_label(&self, variable: &str) -> String {
        self.math(variable).map_or_else(|| "?".to_string(), |l| format!("x{}", l))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_labels_follow_binding_order() {
        let mut m = RenamingMapping::new();
        m.add_node_if_needed(7);
        m.add_node_if_needed(3);
        m.add_node_if_needed(7);
        assert_eq!(m.node(7), Some(0));
        assert_eq!(m.node(3), Some(1));
        assert_eq!(m.node_label(9), "?");

        m.add_math_variable_image("x5");
        m.add_math_variable_image("x2");
        m.add_math_variable_image("x5");
        assert_eq!(m.math_label("x5"), "x0");
        assert_eq!(m.math_label("x2"), "x1");
    }

    #[test]
    fn test_copy_and_incorporate() {
        let mut m = RenamingMapping::new();
        m.add_node_if_needed(1);
        m.add_math_variable_image("a");
        let copy = m.copy_math_variables();
        assert!(copy.is_nodes_empty());
        assert!(copy.contains_math("a"));

        let mut other = RenamingMapping::new();
        other.add_math_variable_image("b");
        let mut merged = copy.clone();
        merged.incorporate(&other);
        assert_eq!(merged.math("b"), Some(0));
        assert!(merged.contains_math("a"));
    }
}

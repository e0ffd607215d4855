//! Hiding sentences whose cell graphs coincide with earlier ones.
//!
//! Both strategies map a batch of sentences (by ultra-canonical key) to equivalence
//! classes of cell graphs. Classes are numbered densely in order of discovery, so a
//! class number below the count at the start of a batch means "seen in an earlier
//! batch or among hidden sentences".
use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use rayon::prelude::*;

use crate::cellgraph::CellGraph;
use crate::error::{Error, Result};
use crate::isomorphism::{Structure, StructureIndex};
use crate::source::CellGraphSource;
use crate::store::KeyValueStore;

/// Outcome of adding one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grouping {
    /// Sentences of this batch sharing a new class, first-seen order.
    pub groups: Vec<Vec<usize>>,
    /// Sentences whose class was already known before this batch.
    pub repeated: Vec<usize>,
}

/// Groups sentences by cell-graph equivalence across batches.
pub trait CellGraphFilter: Send {
    /// Registers the classes of sentences hidden for other reasons.
    fn add_hidden(&mut self, keys: &[String]) -> Result<()>;

    /// Classifies the sentences of one batch, ignoring those with `skip[i]` set.
    fn add(&mut self, keys: &[String], skip: &[bool]) -> Result<Grouping>;
}

/// Fetches derived cell-graph strings, computing the missing ones in one batch.
pub struct CellGraphResolver {
    source: Box<dyn CellGraphSource>,
    store: Arc<dyn KeyValueStore>,
}

impl CellGraphResolver {
    pub fn new(source: Box<dyn CellGraphSource>, store: Arc<dyn KeyValueStore>) -> Self {
        Self { source, store }
    }

    /// The value stored under `prefix + key` for every key, computing absent ones with
    /// the source and `derive`.
    fn resolve<F>(&self, prefix: &str, keys: &[&str], derive: F) -> Result<Vec<String>>
    where
        F: Fn(&CellGraph) -> String + Sync,
    {
        let mut values: Vec<Option<String>> = keys
            .iter()
            .map(|k| self.store.get(&format!("{}{}", prefix, k)))
            .collect();
        let missing: Vec<usize> = (0..keys.len()).filter(|&i| values[i].is_none()).collect();
        if !missing.is_empty() {
            debug!("Computing {} of {} cell graphs", missing.len(), keys.len());
            let queries: Vec<String> = missing.iter().map(|&i| keys[i].to_string()).collect();
            let graphs = self.source.compute(&queries)?;
            if graphs.len() != queries.len() {
                return Err(Error::cell_graph(
                    queries.join("\n"),
                    format!("expected {} cell graphs, got {}", queries.len(), graphs.len()),
                ));
            }
            let derived: Vec<String> = graphs.par_iter().map(&derive).collect();
            for (&i, value) in missing.iter().zip(derived) {
                self.store.put_if_absent(&format!("{}{}", prefix, keys[i]), &value);
                values[i] = Some(value);
            }
        }
        Ok(values.into_iter().flatten().collect())
    }
}

fn visible<'a>(keys: &'a [String], skip: &[bool]) -> (Vec<usize>, Vec<&'a str>) {
    keys.iter()
        .enumerate()
        .filter(|(i, _)| !skip.get(*i).copied().unwrap_or(false))
        .map(|(i, k)| (i, k.as_str()))
        .unzip()
}

/// Turns class numbers of the visible sentences into a [`Grouping`].
fn group(keys: &[String], indices: &[usize], classes: &[usize], known: usize) -> Grouping {
    let mut grouping = Grouping::default();
    let mut slots: HashMap<usize, usize> = HashMap::new();
    for (&i, &class) in indices.iter().zip(classes) {
        if class < known {
            debug!("CellGraph-Inter {}", keys[i]);
            grouping.repeated.push(i);
        } else {
            let slot = *slots.entry(class).or_insert_with(|| {
                grouping.groups.push(Vec::new());
                grouping.groups.len() - 1
            });
            grouping.groups[slot].push(i);
        }
    }
    grouping
}

/// Compares canonical cell-graph strings.
pub struct CanonicalFilter {
    resolver: CellGraphResolver,
    classes: HashMap<String, usize>,
}

impl CanonicalFilter {
    pub const PREFIX: &'static str = "CF";

    pub fn new(resolver: CellGraphResolver) -> Self {
        Self {
            resolver,
            classes: HashMap::new(),
        }
    }

    fn classify(&mut self, keys: &[&str]) -> Result<Vec<usize>> {
        let values = self.resolver.resolve(Self::PREFIX, keys, CellGraph::canonical)?;
        Ok(values
            .into_iter()
            .map(|v| {
                let next = self.classes.len();
                *self.classes.entry(v).or_insert(next)
            })
            .collect())
    }
}

impl CellGraphFilter for CanonicalFilter {
    fn add_hidden(&mut self, keys: &[String]) -> Result<()> {
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        self.classify(&keys).map(|_| ())
    }

    fn add(&mut self, keys: &[String], skip: &[bool]) -> Result<Grouping> {
        let (indices, selected) = visible(keys, skip);
        let known = self.classes.len();
        let classes = self.classify(&selected)?;
        Ok(group(keys, &indices, &classes, known))
    }
}

/// Keeps one representative structure per class and tests isomorphism against it.
pub struct IsomorphicFilter {
    resolver: CellGraphResolver,
    index: StructureIndex,
}

impl IsomorphicFilter {
    pub const PREFIX: &'static str = "IF";

    pub fn new(resolver: CellGraphResolver) -> Self {
        Self {
            resolver,
            index: StructureIndex::new(),
        }
    }

    fn classify(&mut self, keys: &[&str]) -> Result<Vec<usize>> {
        let values = self.resolver.resolve(Self::PREFIX, keys, |g| g.to_string())?;
        let structures = values
            .par_iter()
            .map(|v| CellGraph::parse(v).map(|g| Structure::new(&g)))
            .collect::<Result<Vec<_>>>()?;
        Ok(structures.into_iter().map(|s| self.index.class_of(s)).collect())
    }
}

impl CellGraphFilter for IsomorphicFilter {
    fn add_hidden(&mut self, keys: &[String]) -> Result<()> {
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        self.classify(&keys).map(|_| ())
    }

    fn add(&mut self, keys: &[String], skip: &[bool]) -> Result<Grouping> {
        let (indices, selected) = visible(keys, skip);
        let known = self.index.len();
        let classes = self.classify(&selected)?;
        Ok(group(keys, &indices, &classes, known))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use test_log::test;

    use super::*;
    use crate::source::tests::TableSource;
    use crate::store::MemoryStore;

    const ANSWERS: &[(&str, &str)] = &[
        ("a", "[W(1), L(n1,'x1',1), E(n1,n2,'x2')]"),
        ("b", "[W(1), L(n2,'y1',1), E(n2,n1,'y2')]"),
        ("c", "[W(2), L(n1,1,1)]"),
        ("d", "[]"),
        ("e", "[]"),
    ];

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn filters(store: Arc<MemoryStore>) -> Vec<Box<dyn CellGraphFilter>> {
        vec![
            Box::new(CanonicalFilter::new(CellGraphResolver::new(
                Box::new(TableSource::new(ANSWERS)),
                store.clone(),
            ))),
            Box::new(IsomorphicFilter::new(CellGraphResolver::new(
                Box::new(TableSource::new(ANSWERS)),
                store,
            ))),
        ]
    }

    #[test]
    fn test_grouping_within_batch() {
        for mut filter in filters(Arc::new(MemoryStore::new())) {
            let grouping = filter.add(&keys(&["a", "c", "b", "d", "e"]), &[false; 5]).unwrap();
            assert_eq!(grouping.groups, vec![vec![0, 2], vec![1], vec![3, 4]]);
            assert!(grouping.repeated.is_empty());
        }
    }

    #[test]
    fn test_repeated_across_batches() {
        for mut filter in filters(Arc::new(MemoryStore::new())) {
            filter.add(&keys(&["a"]), &[false]).unwrap();
            let grouping = filter.add(&keys(&["b", "c"]), &[false, false]).unwrap();
            assert_eq!(grouping.repeated, vec![0]);
            assert_eq!(grouping.groups, vec![vec![1]]);
        }
    }

    #[test]
    fn test_hidden_and_skipped() {
        for mut filter in filters(Arc::new(MemoryStore::new())) {
            filter.add_hidden(&keys(&["c"])).unwrap();
            let grouping = filter
                .add(&keys(&["a", "c", "b"]), &[false, false, true])
                .unwrap();
            assert_eq!(grouping.groups, vec![vec![0]]);
            assert_eq!(grouping.repeated, vec![1]);
        }
    }

    #[test]
    fn test_store_is_consulted_first() {
        let store = Arc::new(MemoryStore::new());
        store.put_if_absent("CFz", "A(0,1,1), W(9)");
        let source = Arc::new(TableSource::new(ANSWERS));
        struct Shared(Arc<TableSource>);
        impl CellGraphSource for Shared {
            fn compute(&self, sentences: &[String]) -> Result<Vec<CellGraph>> {
                self.0.compute(sentences)
            }
        }
        let mut filter = CanonicalFilter::new(CellGraphResolver::new(Box::new(Shared(source.clone())), store.clone()));

        let grouping = filter.add(&keys(&["z"]), &[false]).unwrap();
        assert_eq!(grouping.groups, vec![vec![0]]);
        assert_eq!(source.calls.load(Ordering::Relaxed), 0);

        filter.add(&keys(&["a", "c"]), &[false, false]).unwrap();
        assert_eq!(source.calls.load(Ordering::Relaxed), 1);
        assert!(store.get("CFa").is_some());
        filter.add(&keys(&["a"]), &[false]).unwrap();
        assert_eq!(source.calls.load(Ordering::Relaxed), 1);
    }
}

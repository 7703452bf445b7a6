//! Tag implication graph and closure computation.
//!
//! Edges map a (tag, value) pair to an implied (tag, value) pair, either side
//! possibly carrying the [`ValueSelector::Any`] wildcard. The graph may contain
//! cycles; both closure directions are breadth-first walks over a visited set
//! so every pair is expanded at most once.
//!
//! - [`ImplicationGraph::closure`] walks forward: what a pair implies.
//! - [`ImplicationGraph::implying_closure`] walks backward: which pairs imply
//!   the seeds. The query compiler uses this direction.

use std::collections::VecDeque;

use fnv::{FnvHashMap, FnvHashSet};

use crate::entities::{Fact, Implication, TagId, TagValue, ValueSelector};

/// Immutable snapshot of the implication rules.
#[derive(Debug, Clone, Default)]
pub struct ImplicationGraph {
    outgoing: FnvHashMap<TagId, Vec<Implication>>,
    incoming: FnvHashMap<TagId, Vec<Implication>>,
    edge_count: usize,
}

impl ImplicationGraph {
    pub fn new(edges: impl IntoIterator<Item = Implication>) -> Self {
        let mut seen = FnvHashSet::default();
        let mut graph = Self::default();

        for edge in edges {
            if !seen.insert(edge) {
                continue;
            }
            graph.outgoing.entry(edge.source.tag).or_default().push(edge);
            graph.incoming.entry(edge.implied.tag).or_default().push(edge);
            graph.edge_count += 1;
        }

        graph
    }

    pub fn len(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.edge_count == 0
    }

    /// Edges whose source tag is `tag`.
    pub fn edges_from(&self, tag: TagId) -> &[Implication] {
        self.outgoing.get(&tag).map_or(&[], Vec::as_slice)
    }

    /// Edges whose implied tag is `tag`.
    pub fn edges_into(&self, tag: TagId) -> &[Implication] {
        self.incoming.get(&tag).map_or(&[], Vec::as_slice)
    }

    /// Reflexive-transitive closure of everything `start` implies.
    ///
    /// An edge applies when its source value is the wildcard or equals the
    /// current pair's value. A wildcard pair only triggers wildcard-sourced
    /// edges, since "some value of T" does not pin a specific one.
    pub fn closure(&self, start: TagValue) -> ClosureSet {
        self.closure_of(std::iter::once(start))
    }

    /// Union of the forward closures of every pair in `seeds`.
    pub fn closure_of(&self, seeds: impl IntoIterator<Item = TagValue>) -> ClosureSet {
        Self::walk(seeds, move |pair| {
            self.edges_from(pair.tag)
                .iter()
                .filter(move |edge| {
                    edge.source.value == ValueSelector::Any || edge.source.value == pair.value
                })
                .map(|edge| edge.implied)
        })
    }

    /// Every pair that implies one of `seeds`, seeds included.
    ///
    /// Walking backward from (t, sel), an edge into `t` contributes its source
    /// when `sel` is the wildcard or when the edge implies exactly `sel`.
    pub fn implying_closure(&self, seeds: impl IntoIterator<Item = TagValue>) -> ClosureSet {
        Self::walk(seeds, move |pair| {
            self.edges_into(pair.tag)
                .iter()
                .filter(move |edge| {
                    pair.value == ValueSelector::Any || edge.implied.value == pair.value
                })
                .map(|edge| edge.source)
        })
    }

    fn walk<F, I>(seeds: impl IntoIterator<Item = TagValue>, next: F) -> ClosureSet
    where
        F: Fn(TagValue) -> I,
        I: Iterator<Item = TagValue>,
    {
        let mut visited = FnvHashSet::default();
        let mut queue = VecDeque::new();

        for seed in seeds {
            if visited.insert(seed) {
                queue.push_back(seed);
            }
        }

        while let Some(pair) = queue.pop_front() {
            for reached in next(pair) {
                if visited.insert(reached) {
                    log::trace!("closure: {pair:?} reaches {reached:?}");
                    queue.push_back(reached);
                }
            }
        }

        ClosureSet { pairs: visited }
    }
}

/// A set of (tag, value selector) pairs produced by a closure walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosureSet {
    pairs: FnvHashSet<TagValue>,
}

impl ClosureSet {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn contains(&self, pair: &TagValue) -> bool {
        self.pairs.contains(pair)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagValue> {
        self.pairs.iter()
    }

    /// Distinct tag ids present in the set.
    pub fn tags(&self) -> FnvHashSet<TagId> {
        self.pairs.iter().map(|pair| pair.tag).collect()
    }

    /// Whether the fact's (tag, value) is covered by the set.
    ///
    /// A wildcard entry covers every fact of its tag, valued or not. An exact
    /// entry only covers facts carrying that value.
    pub fn accepts(&self, fact: &Fact) -> bool {
        if self.pairs.contains(&TagValue::any(fact.tag)) {
            return true;
        }
        match fact.value {
            Some(value) => self.pairs.contains(&TagValue::exact(fact.tag, value)),
            None => false,
        }
    }
}

impl FromIterator<TagValue> for ClosureSet {
    fn from_iter<T: IntoIterator<Item = TagValue>>(iter: T) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{FileId, ValueId};
    use proptest::prelude::*;

    fn any(tag: u32) -> TagValue {
        TagValue::any(TagId(tag))
    }

    fn exact(tag: u32, value: u32) -> TagValue {
        TagValue::exact(TagId(tag), ValueId(value))
    }

    fn edge(source: TagValue, implied: TagValue) -> Implication {
        Implication::new(source, implied)
    }

    #[test]
    fn closure_is_reflexive() {
        let graph = ImplicationGraph::default();
        let closure = graph.closure(exact(1, 1));
        assert_eq!(closure.len(), 1);
        assert!(closure.contains(&exact(1, 1)));
    }

    #[test]
    fn closure_follows_chain() {
        let graph = ImplicationGraph::new([edge(any(1), any(2)), edge(any(2), exact(3, 7))]);
        let closure = graph.closure(any(1));
        assert!(closure.contains(&any(2)));
        assert!(closure.contains(&exact(3, 7)));
        assert_eq!(closure.len(), 3);
    }

    #[test]
    fn wildcard_source_applies_to_concrete_value() {
        let graph = ImplicationGraph::new([edge(any(1), exact(2, 5))]);
        let closure = graph.closure(exact(1, 9));
        assert!(closure.contains(&exact(2, 5)));
    }

    #[test]
    fn concrete_source_does_not_fire_for_other_values() {
        let graph = ImplicationGraph::new([edge(exact(1, 1), any(2))]);
        assert!(!graph.closure(exact(1, 2)).contains(&any(2)));
        assert!(!graph.closure(any(1)).contains(&any(2)));
        assert!(graph.closure(exact(1, 1)).contains(&any(2)));
    }

    #[test]
    fn cycles_terminate() {
        let graph = ImplicationGraph::new([
            edge(any(1), any(2)),
            edge(any(2), any(3)),
            edge(any(3), any(1)),
            edge(any(4), any(4)),
        ]);
        assert_eq!(graph.closure(any(1)).len(), 3);
        assert_eq!(graph.closure(any(4)).len(), 1);
        assert_eq!(graph.implying_closure([any(1)]).len(), 3);
    }

    #[test]
    fn duplicate_edges_are_collapsed() {
        let graph = ImplicationGraph::new([edge(any(1), any(2)), edge(any(1), any(2))]);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.edges_from(TagId(1)).len(), 1);
        assert_eq!(graph.edges_into(TagId(2)).len(), 1);
    }

    #[test]
    fn implying_closure_from_wildcard_takes_every_incoming_edge() {
        let graph = ImplicationGraph::new([
            edge(exact(1, 1), any(5)),
            edge(any(2), exact(5, 3)),
        ]);
        let closure = graph.implying_closure([any(5)]);
        assert!(closure.contains(&exact(1, 1)));
        assert!(closure.contains(&any(2)));
    }

    #[test]
    fn implying_closure_from_exact_value_needs_exact_target() {
        let graph = ImplicationGraph::new([
            edge(any(1), exact(5, 3)),
            edge(any(2), any(5)),
            edge(any(4), exact(5, 4)),
        ]);
        let closure = graph.implying_closure([exact(5, 3)]);
        assert!(closure.contains(&any(1)));
        assert!(!closure.contains(&any(2)));
        assert!(!closure.contains(&any(4)));
    }

    #[test]
    fn accepts_respects_wildcards() {
        let set: ClosureSet = [any(1), exact(2, 3)].into_iter().collect();
        assert!(set.accepts(&Fact::new(FileId(1), TagId(1), None)));
        assert!(set.accepts(&Fact::new(FileId(1), TagId(1), Some(ValueId(8)))));
        assert!(set.accepts(&Fact::new(FileId(1), TagId(2), Some(ValueId(3)))));
        assert!(!set.accepts(&Fact::new(FileId(1), TagId(2), Some(ValueId(4)))));
        assert!(!set.accepts(&Fact::new(FileId(1), TagId(2), None)));
    }

    fn arb_pair() -> impl Strategy<Value = TagValue> {
        (0u32..6, prop::option::of(0u32..3)).prop_map(|(tag, value)| match value {
            Some(value) => exact(tag, value),
            None => any(tag),
        })
    }

    fn arb_graph() -> impl Strategy<Value = ImplicationGraph> {
        prop::collection::vec((arb_pair(), arb_pair()), 0..24)
            .prop_map(|edges| ImplicationGraph::new(edges.into_iter().map(|(s, i)| edge(s, i))))
    }

    proptest! {
        #[test]
        fn closure_is_idempotent(graph in arb_graph(), start in arb_pair()) {
            let once = graph.closure(start);
            let twice = graph.closure_of(once.iter().copied());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn implying_closure_is_idempotent(graph in arb_graph(), start in arb_pair()) {
            let once = graph.implying_closure([start]);
            let twice = graph.implying_closure(once.iter().copied());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn closure_is_bounded_by_endpoints(graph in arb_graph(), start in arb_pair()) {
            // 6 tags x (3 values + wildcard)
            prop_assert!(graph.closure(start).len() <= 24);
            prop_assert!(graph.closure(start).contains(&start));
        }
    }
}

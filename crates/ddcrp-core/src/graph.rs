//! Customer link graph: the functional assignment array and its
//! symmetrized undirected view.
//!
//! Two synchronized representations are kept per customer index:
//!
//! - `targets[i]`: the single customer `i` points to (`Some(i)` is a valid
//!   self-link; `None` only while a Gibbs step has the link lifted).
//! - `adjacency[i]`: every `j` with `j == targets[i]` or `targets[j] == i`.
//!
//! Connected components of the undirected view are the tables. Outside an
//! in-progress mutation each component contains exactly one directed cycle
//! of the functional graph (possibly a self-loop), with all other members
//! forming trees rooted into that cycle. Whether removing `i`'s link splits
//! its table is therefore a cycle question, answered by
//! [`splits_component`](LinkGraph::splits_component) *before* the removal
//! mutates anything.

use std::collections::{BTreeSet, HashSet};

/// Assignment array plus undirected adjacency for all ingested customers.
///
/// Mutation goes through the coordinator
/// ([`DdcrpClustering`](crate::sampler::DdcrpClustering)), which pairs every
/// link change with the matching mixture-model merge or split.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    /// Directed assignment `c`. `None` marks the transient unassigned state.
    targets: Vec<Option<usize>>,
    /// Undirected adjacency `g` induced by symmetrizing `targets`.
    adjacency: Vec<HashSet<usize>>,
}

impl LinkGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of customers in the arena.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True if no customer has been ingested.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Current link target of customer `i`, `None` while lifted.
    pub fn target_of(&self, i: usize) -> Option<usize> {
        self.targets[i]
    }

    /// Append a new customer linked to itself; returns its index.
    pub fn push_customer(&mut self) -> usize {
        let i = self.targets.len();
        self.targets.push(Some(i));
        let mut row = HashSet::new();
        row.insert(i);
        self.adjacency.push(row);
        i
    }

    /// Set `targets[i] = target` and insert both adjacency directions.
    ///
    /// Caller must have removed `i`'s previous link first; the coordinator
    /// enforces that ordering.
    pub fn add_link(&mut self, i: usize, target: usize) {
        debug_assert!(
            self.targets[i].is_none(),
            "add_link on customer {i} that still holds a link"
        );
        self.targets[i] = Some(target);
        self.adjacency[i].insert(target);
        self.adjacency[target].insert(i);
    }

    /// Remove customer `i`'s current link, leaving it unassigned.
    ///
    /// Three cases keep the undirected view consistent:
    /// - self-link: drop `i` from its own row;
    /// - mutual pair (`targets[target] == i`): adjacency untouched, the
    ///   reverse edge still justifies it;
    /// - otherwise: drop both directions.
    ///
    /// Split detection depends on pre-removal state, so
    /// [`splits_component`](Self::splits_component) must be evaluated
    /// before calling this.
    pub fn remove_link(&mut self, i: usize) {
        let Some(target) = self.targets[i] else {
            return;
        };

        if target == i {
            self.adjacency[i].remove(&i);
        } else if self.targets[target] == Some(i) {
            // a <-> b degrades to a <- b; the edge survives
        } else {
            self.adjacency[i].remove(&target);
            self.adjacency[target].remove(&i);
        }

        self.targets[i] = None;
    }

    /// Would removing `i -> targets[i]` split `i`'s table in two?
    ///
    /// Self-links and mutual pairs never split. Otherwise walk the
    /// functional graph from `targets[i]`: returning to `i` means `i` sits
    /// on its component's cycle and the component stays connected without
    /// its edge; revisiting any other node first means `i`'s edge was the
    /// sole path back and the table splits. The walk touches each component
    /// member at most once, so it terminates for any out-degree-1 graph.
    pub fn splits_component(&self, i: usize) -> bool {
        let Some(target) = self.targets[i] else {
            return false;
        };

        // Trivial cycle a <-> a
        if target == i {
            return false;
        }

        // Trivial cycle a <-> b
        if self.targets[target] == Some(i) {
            return false;
        }

        let mut visited = HashSet::new();
        visited.insert(i);
        let mut cursor = target;
        while visited.insert(cursor) {
            let next = match self.targets[cursor] {
                Some(next) => next,
                // Only reachable mid-mutation; treat the missing return
                // path as a split.
                None => return true,
            };
            if next == i {
                return false;
            }
            cursor = next;
        }

        true
    }

    /// Full connected component of `i` in the undirected view.
    ///
    /// Returned as an ordered set so it can serve directly as a
    /// likelihood-cache key and as the member payload of a split.
    pub fn component_of(&self, i: usize) -> BTreeSet<usize> {
        let mut visited = BTreeSet::new();
        let mut stack = vec![i];
        while let Some(c) = stack.pop() {
            if visited.insert(c) {
                stack.extend(
                    self.adjacency[c]
                        .iter()
                        .copied()
                        .filter(|n| !visited.contains(n)),
                );
            }
        }
        visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a graph of `n` self-linked customers.
    fn arena(n: usize) -> LinkGraph {
        let mut g = LinkGraph::new();
        for _ in 0..n {
            g.push_customer();
        }
        g
    }

    /// Re-point customer `i` at `target` without coordinator involvement.
    fn relink(g: &mut LinkGraph, i: usize, target: usize) {
        g.remove_link(i);
        g.add_link(i, target);
    }

    #[test]
    fn test_push_customer_self_links() {
        let g = arena(3);
        assert_eq!(g.len(), 3);
        for i in 0..3 {
            assert_eq!(g.target_of(i), Some(i));
            assert_eq!(g.component_of(i), BTreeSet::from([i]));
            assert!(!g.splits_component(i), "self-link must never split");
        }
    }

    #[test]
    fn test_mutual_pair_never_splits() {
        let mut g = arena(2);
        relink(&mut g, 0, 1);
        relink(&mut g, 1, 0);

        assert!(!g.splits_component(0));
        assert!(!g.splits_component(1));

        // Breaking one direction keeps the component connected
        g.remove_link(0);
        assert_eq!(g.component_of(0), BTreeSet::from([0, 1]));
        assert_eq!(g.component_of(1), BTreeSet::from([0, 1]));
    }

    #[test]
    fn test_chain_tail_splits() {
        // 0 <- 1 <- 2, with 0 self-linked: 2's edge is the sole path in.
        let mut g = arena(3);
        relink(&mut g, 1, 0);
        relink(&mut g, 2, 1);

        assert!(!g.splits_component(0), "0 is the cycle (self-loop)");
        assert!(g.splits_component(1), "removing 1->0 strands {{1, 2}}");
        assert!(g.splits_component(2), "removing 2->1 strands {{2}}");

        g.remove_link(2);
        assert_eq!(g.component_of(2), BTreeSet::from([2]));
        assert_eq!(g.component_of(0), BTreeSet::from([0, 1]));
    }

    #[test]
    fn test_long_cycle_member_does_not_split() {
        // 0 -> 1 -> 2 -> 0: every member is on the cycle.
        let mut g = arena(3);
        relink(&mut g, 0, 1);
        relink(&mut g, 1, 2);
        relink(&mut g, 2, 0);

        for i in 0..3 {
            assert!(
                !g.splits_component(i),
                "cycle member {i} must not split its table"
            );
        }

        // After the removal the component survives as a chain.
        g.remove_link(1);
        assert_eq!(g.component_of(0), BTreeSet::from([0, 1, 2]));
    }

    #[test]
    fn test_tree_hanging_off_cycle() {
        // Cycle 0 <-> 1 with 2 and 3 chained in: 2 -> 0, 3 -> 2.
        let mut g = arena(4);
        relink(&mut g, 0, 1);
        relink(&mut g, 1, 0);
        relink(&mut g, 2, 0);
        relink(&mut g, 3, 2);

        assert_eq!(g.component_of(3), BTreeSet::from([0, 1, 2, 3]));
        assert!(!g.splits_component(0));
        assert!(!g.splits_component(1));
        assert!(g.splits_component(2), "2's edge carries {{2, 3}}");
        assert!(g.splits_component(3), "3 is a leaf");

        g.remove_link(2);
        assert_eq!(g.component_of(2), BTreeSet::from([2, 3]));
        assert_eq!(g.component_of(0), BTreeSet::from([0, 1]));
    }

    #[test]
    fn test_remove_link_mutual_pair_keeps_adjacency() {
        let mut g = arena(2);
        relink(&mut g, 0, 1);
        relink(&mut g, 1, 0);

        g.remove_link(1);
        assert_eq!(g.target_of(1), None);
        // 0 -> 1 still justifies the undirected edge
        assert_eq!(g.component_of(1), BTreeSet::from([0, 1]));
    }

    #[test]
    fn test_relink_into_cycle_then_out() {
        // Functional graphs admit exactly one cycle per component; check
        // the walk handles a non-trivial entry point.
        let mut g = arena(5);
        relink(&mut g, 0, 1);
        relink(&mut g, 1, 2);
        relink(&mut g, 2, 1); // cycle {1, 2}
        relink(&mut g, 3, 0);
        relink(&mut g, 4, 3);

        assert!(g.splits_component(0), "0 roots the {{0, 3, 4}} branch");
        assert!(!g.splits_component(1));
        assert!(!g.splits_component(2));
        assert!(g.splits_component(4));
    }
}

//! Code-point registry.
//!
//! Two independent mappings, both keyed by code-point name and both
//! populated lazily: point to call-tree node and point to statistics
//! recorder. Creation is at-most-once per key even when many threads race
//! on the first use of a point; steady-state lookups are lock-free reads.
//!
//! The maps never lock on caller-supplied data. Per-key exclusion for the
//! create path comes from the map's own sharded locks via the entry API,
//! which also makes the parent attachment of a fresh node exactly-once:
//! it happens inside the entry's write-locked closure.

use crate::stats::PointStats;
use crate::tree::CallNode;
use dashmap::DashMap;
use std::sync::Arc;

pub(crate) struct Registry {
    nodes: DashMap<Arc<str>, Arc<CallNode>>,
    stats: DashMap<Arc<str>, Arc<PointStats>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Registry {
            nodes: DashMap::new(),
            stats: DashMap::new(),
        }
    }

    /// Node for `point`, created and attached under `parent` on first use.
    ///
    /// The attachment only happens when the node is created, so the first
    /// observed parent wins for the lifetime of the process.
    pub(crate) fn node_for(&self, point: &str, parent: &Arc<CallNode>) -> Arc<CallNode> {
        if let Some(existing) = self.nodes.get(point) {
            return existing.value().clone();
        }

        let key: Arc<str> = Arc::from(point);
        self.nodes
            .entry(key.clone())
            .or_insert_with(|| {
                let node = CallNode::new(key);
                parent.attach(node.clone());
                node
            })
            .value()
            .clone()
    }

    /// Statistics recorder for `point`, created on first use.
    pub(crate) fn stats_for(&self, point: &str) -> Arc<PointStats> {
        if let Some(existing) = self.stats.get(point) {
            return existing.value().clone();
        }

        self.stats
            .entry(Arc::from(point))
            .or_insert_with(|| Arc::new(PointStats::new()))
            .value()
            .clone()
    }

    /// Recorder lookup without creation, for report rendering.
    pub(crate) fn stats_of(&self, point: &str) -> Option<Arc<PointStats>> {
        self.stats.get(point).map(|entry| entry.value().clone())
    }

    /// Reset every recorder's counters.
    ///
    /// Not atomic as a whole: a thread recording into one point while
    /// another point is being reset sees no interference, and a recording
    /// racing the reset of its own recorder may leave a transient count
    /// that does not match the total. Both are acceptable for a
    /// monitoring view.
    pub(crate) fn reset_all(&self) {
        for entry in self.stats.iter() {
            entry.value().reset();
        }
    }

    #[cfg(test)]
    pub(crate) fn point_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn root() -> Arc<CallNode> {
        CallNode::new(Arc::from("Root"))
    }

    #[test]
    fn test_node_created_once_and_attached() {
        let registry = Registry::new();
        let root = root();

        let first = registry.node_for("point", &root);
        let second = registry.node_for("point", &root);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(root.children().len(), 1);
        assert_eq!(registry.point_count(), 1);
    }

    #[test]
    fn test_first_observed_parent_wins() {
        let registry = Registry::new();
        let parent_a = root();
        let parent_b = CallNode::new(Arc::from("other"));

        let node = registry.node_for("point", &parent_a);
        let again = registry.node_for("point", &parent_b);

        assert!(Arc::ptr_eq(&node, &again));
        assert_eq!(parent_a.children().len(), 1);
        assert!(parent_b.children().is_empty());
    }

    #[test]
    fn test_stats_map_is_independent() {
        let registry = Registry::new();
        let root = root();

        registry.node_for("only-node", &root);
        assert!(registry.stats_of("only-node").is_none());

        let stats = registry.stats_for("only-node");
        assert!(Arc::ptr_eq(&stats, &registry.stats_of("only-node").unwrap()));
    }

    #[test]
    fn test_concurrent_first_access_creates_one_node() {
        let registry = Arc::new(Registry::new());
        let root = root();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let root = Arc::clone(&root);
                thread::spawn(move || registry.node_for("hot", &root))
            })
            .collect();

        let nodes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for node in &nodes {
            assert!(Arc::ptr_eq(node, &nodes[0]));
        }
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn test_concurrent_first_access_creates_one_recorder() {
        let registry = Arc::new(Registry::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.stats_for("hot"))
            })
            .collect();

        let recorders: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for recorder in &recorders {
            assert!(Arc::ptr_eq(recorder, &recorders[0]));
        }
    }

    #[test]
    fn test_reset_all_zeroes_every_recorder() {
        let registry = Registry::new();
        registry.stats_for("a").record(Duration::from_millis(2));
        registry.stats_for("b").record(Duration::from_millis(3));

        registry.reset_all();

        assert_eq!(registry.stats_of("a").unwrap().runs(), 0);
        assert_eq!(registry.stats_of("b").unwrap().runs(), 0);
    }
}

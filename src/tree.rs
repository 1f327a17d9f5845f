//! Call-tree nodes.
//!
//! Every distinct code point maps to exactly one [`CallNode`] for the
//! lifetime of the process; the registry owns that identity. A node keeps
//! its children in the order they were first attached, deduplicated by
//! point name, and has at most one parent: the parent under which the
//! point was first observed. Reaching the same point later through a
//! different parent adds no edge and never re-parents.

use parking_lot::Mutex;
use std::sync::Arc;

/// One node of the call tree.
pub struct CallNode {
    point: Arc<str>,
    children: Mutex<Vec<Arc<CallNode>>>,
}

impl CallNode {
    pub(crate) fn new(point: Arc<str>) -> Arc<CallNode> {
        Arc::new(CallNode {
            point,
            children: Mutex::new(Vec::new()),
        })
    }

    /// Name of the code point this node represents.
    pub fn point(&self) -> &str {
        &self.point
    }

    /// Snapshot of the children, in first-attached order.
    ///
    /// Callers iterate the returned vector, so traversal tolerates nodes
    /// being attached concurrently; a traversal may simply see a subset of
    /// the final tree.
    pub fn children(&self) -> Vec<Arc<CallNode>> {
        self.children.lock().clone()
    }

    /// Attach a child unless a child with the same point already exists.
    pub(crate) fn attach(&self, child: Arc<CallNode>) {
        let mut children = self.children.lock();
        if !children.iter().any(|c| c.point() == child.point()) {
            children.push(child);
        }
    }
}

impl std::fmt::Debug for CallNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallNode")
            .field("point", &self.point())
            .field("children", &self.children.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(point: &str) -> Arc<CallNode> {
        CallNode::new(Arc::from(point))
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let parent = node("parent");
        parent.attach(node("b"));
        parent.attach(node("a"));
        parent.attach(node("c"));

        let points: Vec<_> = parent.children().iter().map(|c| c.point().to_string()).collect();
        assert_eq!(points, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_attach_deduplicates_by_point() {
        let parent = node("parent");
        parent.attach(node("child"));
        parent.attach(node("child"));

        assert_eq!(parent.children().len(), 1);
    }

    #[test]
    fn test_children_returns_a_snapshot() {
        let parent = node("parent");
        parent.attach(node("first"));

        let snapshot = parent.children();
        parent.attach(node("second"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(parent.children().len(), 2);
    }
}

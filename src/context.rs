//! Per-thread trace context.
//!
//! Each thread owns a single slot holding its currently active frame.
//! Frames are immutable after construction and chained through their
//! parent references, so "the stack" is just the current frame plus the
//! chain behind it. No synchronization is needed: no two threads ever
//! touch the same slot.
//!
//! The slot is process-wide rather than per-profiler (a `thread_local!`
//! static is per-declaration), so every frame records which profiler
//! created it. Parent resolution walks the chain to the nearest frame
//! with the right owner, which keeps two profiler instances interleaved
//! on one thread from attributing points to each other.

use crate::stats::PointStats;
use crate::tree::CallNode;
use std::cell::RefCell;
use std::sync::Arc;
use std::time::Instant;

/// One in-flight timing of a code point.
pub(crate) struct Frame {
    pub(crate) started: Instant,
    pub(crate) parent: Option<Arc<Frame>>,
    pub(crate) node: Arc<CallNode>,
    pub(crate) stats: Arc<PointStats>,
    pub(crate) owner: usize,
}

impl Frame {
    pub(crate) fn point(&self) -> &str {
        self.node.point()
    }
}

thread_local! {
    static CURRENT: RefCell<Option<Arc<Frame>>> = const { RefCell::new(None) };
}

/// The calling thread's current frame, if any.
pub(crate) fn current() -> Option<Arc<Frame>> {
    CURRENT.with(|slot| slot.borrow().clone())
}

/// Replace the calling thread's current frame.
pub(crate) fn set_current(frame: Option<Arc<Frame>>) {
    CURRENT.with(|slot| *slot.borrow_mut() = frame);
}

/// Nearest frame in the calling thread's chain created by `owner`.
pub(crate) fn current_owned_by(owner: usize) -> Option<Arc<Frame>> {
    let mut cursor = current();
    while let Some(frame) = cursor {
        if frame.owner == owner {
            return Some(frame);
        }
        cursor = frame.parent.clone();
    }
    None
}

//! Profiler facade.
//!
//! A [`Profiler`] owns one registry and one call tree, hands out RAII
//! [`Span`] guards for timed regions, and exposes the report and reset
//! surface the control collaborators drive. Instances are cheap to clone
//! and share; [`global()`] provides a process-wide default for callers
//! that do not want to thread an instance through their code.

use crate::context::{self, Frame};
use crate::registry::Registry;
use crate::report::{self, ReportSink};
use crate::stats::PointStats;
use crate::tree::CallNode;
use once_cell::sync::Lazy;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Name of the synthetic root node anchoring all top-level code points.
pub const ROOT_POINT: &str = "Root";

/// Name prefix used by [`Profiler::start_inherited`] when no trace is
/// active on the calling thread.
pub const INHERITED_UNAVAILABLE_PREFIX: &str = "INHERITED_TRACE_NOT_AVAILABLE.";

/// Sentinel for "no timing recorded since the last report".
const NO_TIMESTAMP: u64 = u64::MAX;

struct Inner {
    registry: Registry,
    root: Arc<CallNode>,
    epoch: Instant,
    last_recorded: AtomicU64,
}

/// The profiler engine.
///
/// Cloning is cheap and every clone shares the same registry, tree, and
/// timestamps.
///
/// # Example
///
/// ```ignore
/// use proftree::Profiler;
///
/// let profiler = Profiler::new();
/// {
///     let _span = profiler.start("handle-request");
///     // timed work
/// }
/// println!("{}", profiler.render_to_string());
/// ```
///
/// Each distinct point name creates a permanent registry entry with no
/// eviction, so derive names from a small fixed set of instrumentation
/// sites, never from unbounded runtime values such as request ids.
#[derive(Clone)]
pub struct Profiler {
    inner: Arc<Inner>,
}

impl Profiler {
    /// Create an empty profiler with its own registry and call tree.
    pub fn new() -> Self {
        Profiler {
            inner: Arc::new(Inner {
                registry: Registry::new(),
                root: CallNode::new(Arc::from(ROOT_POINT)),
                epoch: Instant::now(),
                last_recorded: AtomicU64::new(NO_TIMESTAMP),
            }),
        }
    }

    fn owner_id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    /// Start timing `point` as a child of the calling thread's current
    /// trace (or as a top-level point when none is active).
    ///
    /// The returned [`Span`] ends the timing when dropped or explicitly
    /// ended; to fall back to the unpaired call style, combine
    /// [`Span::detach`] with [`Profiler::end_current`].
    pub fn start(&self, point: impl Into<String>) -> Span {
        let parent = context::current_owned_by(self.owner_id());
        self.start_with_parent(point.into(), parent)
    }

    /// Start timing with a name inherited from the current trace.
    ///
    /// With an active trace named `parent`, the effective point name is
    /// `parent.suffix` (no extra dot when `suffix` already leads with
    /// one). Without one, the name is the fixed
    /// [`INHERITED_UNAVAILABLE_PREFIX`] followed by `suffix`.
    pub fn start_inherited(&self, suffix: &str) -> Span {
        let parent = context::current_owned_by(self.owner_id());
        let point = match &parent {
            Some(frame) if suffix.starts_with('.') => format!("{}{}", frame.point(), suffix),
            Some(frame) => format!("{}.{}", frame.point(), suffix),
            None => format!("{INHERITED_UNAVAILABLE_PREFIX}{suffix}"),
        };
        self.start_with_parent(point, parent)
    }

    fn start_with_parent(&self, point: String, parent: Option<Arc<Frame>>) -> Span {
        let parent_node = parent
            .as_ref()
            .map(|frame| frame.node.clone())
            .unwrap_or_else(|| self.inner.root.clone());

        let node = self.inner.registry.node_for(&point, &parent_node);
        let stats = self.inner.registry.stats_for(&point);

        let frame = Arc::new(Frame {
            started: Instant::now(),
            parent,
            node,
            stats,
            owner: self.owner_id(),
        });
        context::set_current(Some(frame.clone()));
        self.inner
            .last_recorded
            .store(self.nanos_since_epoch(), Ordering::Relaxed);

        Span {
            profiler: self.clone(),
            frame: Some(frame),
            _not_send: PhantomData,
        }
    }

    /// End the calling thread's current trace, if any.
    ///
    /// Ending a trace that is not the innermost active one silently
    /// rewinds past the intermediate traces; they become orphaned and
    /// their own end calls will unwind against stale state. That is a
    /// caller contract, not a detected error — same as ending the same
    /// trace twice.
    pub fn end_current(&self) {
        if let Some(frame) = context::current_owned_by(self.owner_id()) {
            self.end_frame(frame);
        }
    }

    fn end_frame(&self, frame: Arc<Frame>) {
        frame.stats.record(frame.started.elapsed());
        context::set_current(frame.parent.clone());
    }

    /// Wrap `task` so that executing it is timed as `point`, attributed
    /// to the trace active on *this* thread right now.
    ///
    /// The parent is captured at wrap time, not at execution time. A task
    /// handed to a pooled worker is therefore attributed to its logical
    /// parent instead of whatever stale context lives on the worker
    /// thread. The timing closes even when the task panics, and the
    /// panic propagates unchanged.
    pub fn wrap<T, F>(&self, point: impl Into<String>, task: F) -> impl FnOnce() -> T
    where
        F: FnOnce() -> T,
    {
        let profiler = self.clone();
        let point = point.into();
        let parent = context::current_owned_by(self.owner_id());
        move || {
            let _span = profiler.start_with_parent(point, parent);
            task()
        }
    }

    /// Zero the run count and total duration of every code point.
    ///
    /// Tree structure and recent-duration windows are left untouched.
    pub fn reset(&self) {
        self.inner.registry.reset_all();
    }

    /// Render the report, one line per code point, into `sink`.
    pub fn render(&self, sink: &mut dyn ReportSink) {
        report::render(&self.inner.root, &self.inner.registry, sink);
    }

    /// Render the report into a string.
    pub fn render_to_string(&self) -> String {
        let mut out = String::new();
        self.render(&mut out);
        out
    }

    /// The synthetic root node of the call tree.
    pub fn root(&self) -> Arc<CallNode> {
        self.inner.root.clone()
    }

    /// Statistics recorder for `point`, if the point was ever started.
    pub fn stats_of(&self, point: &str) -> Option<Arc<PointStats>> {
        self.inner.registry.stats_of(point)
    }

    fn nanos_since_epoch(&self) -> u64 {
        self.inner.epoch.elapsed().as_nanos() as u64
    }

    /// Nanoseconds (since profiler construction) of the most recent
    /// `start`, or `None` when cleared.
    pub fn last_recorded_nanos(&self) -> Option<u64> {
        match self.inner.last_recorded.load(Ordering::Relaxed) {
            NO_TIMESTAMP => None,
            nanos => Some(nanos),
        }
    }

    /// Nanoseconds elapsed since the most recent `start`, or `None` when
    /// the timestamp is cleared.
    pub fn nanos_since_last_recorded(&self) -> Option<u64> {
        self.last_recorded_nanos()
            .map(|last| self.nanos_since_epoch().saturating_sub(last))
    }

    /// Clear the last-recorded timestamp.
    ///
    /// The idle-report monitor calls this after each automatic report so
    /// one quiet period produces one report.
    pub fn reset_last_recorded(&self) {
        self.inner
            .last_recorded
            .store(NO_TIMESTAMP, Ordering::Relaxed);
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Profiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profiler")
            .field("root", &self.inner.root)
            .finish()
    }
}

static GLOBAL: Lazy<Profiler> = Lazy::new(Profiler::new);

/// The process-wide default profiler.
///
/// A convenience wrapper over a shared [`Profiler`] instance; everything
/// it can do works the same on explicitly constructed instances.
pub fn global() -> Profiler {
    GLOBAL.clone()
}

/// An active timing of a code point.
///
/// A single-use token: the timing ends when the span is dropped, ended
/// explicitly, or the surrounding code panics — the region closes on
/// every exit path. Spans are bound to the thread that started them and
/// are not `Send`.
#[must_use = "dropping a span immediately ends its timing"]
pub struct Span {
    profiler: Profiler,
    frame: Option<Arc<Frame>>,
    _not_send: PhantomData<*const ()>,
}

impl Span {
    /// Name of the code point being timed.
    pub fn point(&self) -> &str {
        self.frame
            .as_ref()
            .map(|frame| frame.point())
            .unwrap_or_default()
    }

    /// End the timing now.
    ///
    /// Equivalent to dropping the span; spelled out for call sites where
    /// an explicit end reads better than a scope boundary.
    pub fn end(self) {}

    /// Release the span without ending its timing.
    ///
    /// The trace stays the thread's current one, to be closed later by
    /// [`Profiler::end_current`]. A detached trace that is never ended
    /// simply never records and leaves the thread's context pointing at
    /// it until the next `start` layers on top.
    pub fn detach(mut self) {
        self.frame = None;
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.profiler.end_frame(frame);
        }
    }
}

impl std::fmt::Debug for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Span").field("point", &self.point()).finish()
    }
}

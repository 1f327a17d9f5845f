//! # proftree
//!
//! In-process execution profiler: time named "code points" as a program
//! runs, aggregate repeated invocations into running statistics, and
//! report them as a call tree built from the parent/child relationships
//! observed at runtime. No external tracing backend, no persistence —
//! instrument a hot path, read the report, move on.
//!
//! ## Quick Start
//!
//! ```ignore
//! use proftree::prelude::*;
//!
//! let profiler = Profiler::new();
//!
//! {
//!     let _request = profiler.start("handle-request");
//!     {
//!         let _parse = profiler.start("parse");
//!         // ...
//!     }
//!     let _query = profiler.start_inherited("query"); // "handle-request.query"
//! }
//!
//! // One aligned line per code point, nested under its first-observed parent.
//! print!("{}", profiler.render_to_string());
//! ```
//!
//! A process-wide default instance is available through [`global()`] for
//! code that does not want to pass a profiler around.
//!
//! ## Crossing threads
//!
//! The active trace lives in a per-thread context, so work handed to a
//! pooled executor would normally be attributed to whatever context the
//! worker thread happens to carry. [`Profiler::wrap`] captures the
//! logical parent at wrap time and reattaches it when the task actually
//! runs:
//!
//! ```ignore
//! let task = profiler.wrap("load-user", move || load_user(id));
//! pool.execute(task); // timed as a child of the trace that created it
//! ```
//!
//! ## Control surface
//!
//! [`control::HttpControl`] serves the report and a reset action over a
//! minimal TCP endpoint; [`control::ReportMonitor`] prints the report
//! automatically once tracing goes quiet. Both are opt-in.

#![warn(missing_docs)]

mod context;
mod error;
mod profiler;
mod registry;
mod report;
mod stats;
mod tree;

pub mod control;
pub mod prelude;

pub use error::{Error, Result};
pub use profiler::{global, Profiler, Span, INHERITED_UNAVAILABLE_PREFIX, ROOT_POINT};
pub use report::{ReportSink, StdoutSink, TracingSink};
pub use stats::{PointStats, RECENT_WINDOW};
pub use tree::CallNode;

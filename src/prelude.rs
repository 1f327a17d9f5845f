//! Convenient imports for proftree.
//!
//! ```ignore
//! use proftree::prelude::*;
//!
//! let profiler = Profiler::new();
//! let _span = profiler.start("work");
//! ```

// Main entry points
pub use crate::profiler::{global, Profiler, Span};

// Error handling
pub use crate::error::{Error, Result};

// Report destinations
pub use crate::report::{ReportSink, StdoutSink, TracingSink};

// Control-surface collaborators
pub use crate::control::{HttpControl, MonitorOptions, ReportMonitor};

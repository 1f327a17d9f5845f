//! Report rendering.
//!
//! A depth-first walk of the call tree, one formatted line per node. A
//! pre-pass finds the widest `indent + name` across the tree so the
//! statistic columns line up regardless of nesting depth or name length.
//! Children render in first-attached order; each node's child list is
//! snapshotted before recursing, so a render racing new attachments sees
//! a subset of the final tree rather than failing.

use crate::registry::Registry;
use crate::tree::CallNode;
use std::sync::Arc;

/// Destination for rendered report lines, one call per line.
pub trait ReportSink {
    /// Accept one formatted report line, without a trailing newline.
    fn line(&mut self, line: &str);
}

/// Sink that logs each report line through `tracing` at info level.
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn line(&mut self, line: &str) {
        tracing::info!("{line}");
    }
}

/// Sink that prints each report line to stdout.
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn line(&mut self, line: &str) {
        println!("{line}");
    }
}

impl ReportSink for String {
    fn line(&mut self, line: &str) {
        self.push_str(line);
        self.push('\n');
    }
}

impl ReportSink for Vec<String> {
    fn line(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Spaces of indentation for a node at `depth`.
///
/// Depth 0 is the synthetic root, which renders no line; its negative
/// value only feeds the width pre-pass, exactly balancing the root's
/// name so top-level points line up at one space of indent.
fn line_indent(depth: usize) -> isize {
    (depth as isize - 1) * 4 + 1
}

fn max_line_length(node: &CallNode, depth: usize) -> usize {
    let own = (line_indent(depth) + node.point().len() as isize).max(0) as usize;
    node.children()
        .iter()
        .fold(own, |acc, child| acc.max(max_line_length(child, depth + 1)))
}

pub(crate) fn render(root: &Arc<CallNode>, registry: &Registry, sink: &mut dyn ReportSink) {
    let width = max_line_length(root, 0) + 4;
    render_node(root, 0, width, registry, sink);
}

fn render_node(
    node: &CallNode,
    depth: usize,
    width: usize,
    registry: &Registry,
    sink: &mut dyn ReportSink,
) {
    if depth > 0 {
        let indent = line_indent(depth).max(1) as usize;
        // A node attached after the width pre-pass can be deeper than
        // anything the pre-pass saw; saturate rather than underflow.
        let name_width = width.saturating_sub(indent);
        let point = node.point();

        match registry.stats_of(point) {
            Some(stats) => {
                let runs = stats.runs();
                let avg_ms = stats.average_nanos() / 1_000_000;
                let recent_ms = stats.recent_average_nanos() / 1_000_000;
                sink.line(&format!(
                    "Profiler| {:>indent$} {point:<name_width$}| runs:{runs:>6} | avgRunTime: {avg_ms:>8} ms | avgOnLast10: {recent_ms:>8} ms",
                    " ",
                ));
            }
            None => {
                sink.line(&format!(
                    "Profiler| {:>indent$} {point:<name_width$}| no data",
                    " ",
                ));
            }
        }
    }

    for child in node.children() {
        render_node(&child, depth + 1, width, registry, sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fixture() -> (Arc<CallNode>, Registry) {
        let root = CallNode::new(Arc::from("Root"));
        let registry = Registry::new();

        let outer = registry.node_for("outer", &root);
        registry.node_for("outer.inner", &outer);
        registry.stats_for("outer").record(Duration::from_millis(12));
        registry
            .stats_for("outer.inner")
            .record(Duration::from_millis(3));

        (root, registry)
    }

    fn rendered(root: &Arc<CallNode>, registry: &Registry) -> Vec<String> {
        let mut lines = Vec::new();
        render(root, registry, &mut lines);
        lines
    }

    #[test]
    fn test_root_renders_no_line() {
        let (root, registry) = fixture();
        let lines = rendered(&root, &registry);

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("outer"));
        assert!(lines[1].contains("outer.inner"));
    }

    #[test]
    fn test_columns_align_across_depths() {
        let (root, registry) = fixture();
        let lines = rendered(&root, &registry);

        let offsets: Vec<_> = lines.iter().map(|l| l.find("| runs:").unwrap()).collect();
        assert!(offsets.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_line_carries_runs_and_averages() {
        let (root, registry) = fixture();
        let lines = rendered(&root, &registry);

        assert!(lines[0].contains("runs:     1"));
        assert!(lines[0].contains("avgRunTime:       12 ms"));
        // 12 ms spread over the 10-slot window.
        assert!(lines[0].contains("avgOnLast10:        1 ms"));
    }

    #[test]
    fn test_node_without_stats_renders_no_data_marker() {
        let root = CallNode::new(Arc::from("Root"));
        let registry = Registry::new();
        registry.node_for("bare", &root);

        let lines = rendered(&root, &registry);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("| no data"));
    }

    #[test]
    fn test_indent_grows_four_spaces_per_level() {
        assert_eq!(line_indent(1), 1);
        assert_eq!(line_indent(2), 5);
        assert_eq!(line_indent(3), 9);
    }

    #[test]
    fn test_string_sink_joins_lines_with_newlines() {
        let (root, registry) = fixture();
        let mut out = String::new();
        render(&root, &registry, &mut out);

        assert_eq!(out.lines().count(), 2);
        assert!(out.ends_with('\n'));
    }
}

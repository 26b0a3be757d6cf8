//! Logging and debugging facilities for Horizon DataView.
//!
//! This module provides:
//! - Target and span names for filtering `tracing` output by subsystem
//! - Options shared by the group tree debug formatters
//! - Performance spans around expensive view operations
//!
//! # Tracing Integration
//!
//! Horizon DataView uses the `tracing` crate for instrumentation. Install a
//! subscriber in your application to see the output:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_dataview::view=debug")
//!     .init();
//! ```

/// Span names used throughout Horizon DataView for tracing.
pub mod span_names {
    /// View refresh span.
    pub const REFRESH: &str = "horizon_dataview::refresh";
    /// Incremental source change processing span.
    pub const SOURCE_CHANGES: &str = "horizon_dataview::source_changes";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_dataview_core::signal";
    /// Collection view target.
    pub const VIEW: &str = "horizon_dataview::view";
    /// Group tree and grouping driver target.
    pub const GROUP: &str = "horizon_dataview::group";
    /// Sort/group/filter descriptions target.
    pub const DESCRIPTION: &str = "horizon_dataview::description";
    /// Data connection target.
    pub const CONNECTION: &str = "horizon_dataview::connection";
    /// Performance spans target.
    pub const PERF: &str = "horizon_dataview::perf";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

impl TreeStyle {
    /// Connector drawn before a child, depending on whether it is the last one.
    pub fn branch(self, last: bool) -> &'static str {
        match (self, last) {
            (Self::Ascii, false) => "|-- ",
            (Self::Ascii, true) => "`-- ",
            (Self::Unicode, false) => "├── ",
            (Self::Unicode, true) => "└── ",
            (Self::Compact, _) => "",
        }
    }

    /// Prefix continuing an ancestor's branch.
    pub fn continuation(self, ancestor_was_last: bool) -> &'static str {
        match (self, ancestor_was_last) {
            (Self::Ascii, false) => "|   ",
            (Self::Unicode, false) => "│   ",
            (Self::Compact, _) => "",
            (_, true) => "    ",
        }
    }
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node handles.
    pub show_ids: bool,
    /// Whether to show leaf and full counts.
    pub show_counts: bool,
    /// Whether to list leaf items under bottom-level groups.
    pub show_items: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: false,
            show_counts: true,
            show_items: false,
            max_depth: None,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_ids: true,
            show_items: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_counts: false,
            ..Default::default()
        }
    }

    /// Set the style.
    pub fn with_style(mut self, style: TreeStyle) -> Self {
        self.style = style;
        self
    }

    /// Limit traversal depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

/// A guard that measures an operation as an `info` span.
///
/// The span is entered on creation and closed when the guard is dropped.
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

//! Public API for result aggregation and reporting
//!
//! External modules should import from here rather than directly from internal modules.

pub use crate::report::aggregator::{AggregationTree, LeafRow, ResultAggregator, DEFAULT_PATTERN};
pub use crate::report::error::{ReportError, ReportResult};
pub use crate::report::finding::Finding;
pub use crate::report::render::{write_json, ReportRenderer, DEFAULT_HTTP_TIMEOUT_SECS};
pub use crate::report::sarif::{parse_sarif, parse_sarif_file, SeverityStrategy};
pub use crate::report::summary::{print_summary, summary_table};

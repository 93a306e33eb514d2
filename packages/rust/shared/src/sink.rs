//! Output-sink contract fed by the orchestrator.

use crate::error::Result;
use crate::types::OutputRecord;

/// Append-only tabular writer.
///
/// Implementations write their column header exactly once, at construction;
/// `append_batch` only ever appends. The orchestrator is the sole caller, so
/// batches from concurrent workers never interleave mid-row.
pub trait RecordSink {
    fn append_batch(&mut self, records: &[OutputRecord]) -> Result<()>;
}

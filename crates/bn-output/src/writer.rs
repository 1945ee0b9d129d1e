//! Sink for rows produced by a run.

use crate::{AgentFrameRow, OutputResult, TickSummaryRow};

/// Something that can store frame rows and tick summaries.
///
/// Writers return their errors; [`SimOutputObserver`](crate::SimOutputObserver)
/// keeps the first one for [`take_error`](crate::SimOutputObserver::take_error)
/// since observer hooks cannot fail.
pub trait OutputWriter {
    /// Rows of one frame, in agent order.  An empty slice is a no-op.
    fn write_frames(&mut self, rows: &[AgentFrameRow]) -> OutputResult<()>;

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Flush buffered rows.  Calls after the first do nothing.
    fn finish(&mut self) -> OutputResult<()>;
}

//! Write a finished history in one go.

use bn_sim::History;

use crate::{AgentFrameRow, OutputResult, OutputWriter};

/// Write every published frame of `history` (including frame 0) as agent
/// rows, then finish the writer.  Returns the number of rows written.
///
/// Tick summaries are not derivable from frames alone and are only produced
/// by [`SimOutputObserver`][crate::SimOutputObserver] during a live run.
pub fn export_history<W: OutputWriter>(history: &History, writer: &mut W) -> OutputResult<usize> {
    let mut written = 0;
    for frame in history.frames() {
        let rows = AgentFrameRow::from_frame(&frame);
        if !rows.is_empty() {
            writer.write_frames(&rows)?;
            written += rows.len();
        }
    }
    writer.finish()?;
    Ok(written)
}

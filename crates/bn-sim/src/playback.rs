//! Display-side cursor over a [`History`].

use std::sync::Arc;

use crate::scheduler::Control;
use crate::{Frame, History};

/// Reads frames from a history at the display's own cadence.
///
/// The cursor never reads past the published frame count: [`next_frame`]
/// blocks until the frame exists (or the history is closed) and
/// [`try_next`] returns `None` instead.  A cursor obtained from
/// [`Scheduler::playback`][crate::Scheduler::playback] also blocks while the
/// run is paused.
///
/// [`next_frame`]: Playback::next_frame
/// [`try_next`]: Playback::try_next
#[derive(Debug)]
pub struct Playback {
    history: Arc<History>,
    control: Option<Arc<Control>>,
    cursor:  u64,
    stride:  u64,
}

impl Playback {
    pub fn new(history: Arc<History>) -> Self {
        Self { history, control: None, cursor: 0, stride: 1 }
    }

    pub(crate) fn with_control(history: Arc<History>, control: Arc<Control>) -> Self {
        Self { control: Some(control), ..Self::new(history) }
    }

    /// Advance `stride` frames per step (display skipping).  Minimum 1.
    pub fn with_stride(mut self, stride: u64) -> Self {
        self.stride = stride.max(1);
        self
    }

    /// Index of the next frame to be returned.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn seek(&mut self, k: u64) {
        self.cursor = k;
    }

    /// The frame at the cursor, clamped to the newest published frame.
    pub fn current(&self) -> Option<Arc<Frame>> {
        self.history.frame_at(self.cursor)
    }

    /// Return the frame at the cursor and advance, or `None` if it has not
    /// been published yet.  Never blocks.
    pub fn try_next(&mut self) -> Option<Arc<Frame>> {
        let frame = self.history.get(self.cursor)?;
        self.cursor += self.stride;
        Some(frame)
    }

    /// Return the frame at the cursor and advance, waiting for it to be
    /// published.  `None` once the history is closed and the cursor has
    /// passed its last frame.
    pub fn next_frame(&mut self) -> Option<Arc<Frame>> {
        if let Some(control) = &self.control {
            control.wait_while_paused();
        }
        let frame = self.history.wait_for(self.cursor)?;
        self.cursor += self.stride;
        Some(frame)
    }
}

impl Iterator for Playback {
    type Item = Arc<Frame>;

    fn next(&mut self) -> Option<Arc<Frame>> {
        self.next_frame()
    }
}

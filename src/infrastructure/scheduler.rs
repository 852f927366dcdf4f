use crate::application::session::FrameScheduler;
use std::cell::Cell;
use std::rc::Rc;

/// Scheduler driven by hand; clones share counters so a caller can keep a
/// handle after passing one to a session.
#[derive(Debug, Clone, Default)]
pub struct ManualFrameScheduler {
    pending: Rc<Cell<bool>>,
    requested: Rc<Cell<usize>>,
    cancelled: Rc<Cell<usize>>,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }

    pub fn requested(&self) -> usize {
        self.requested.get()
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled.get()
    }

    /// Consume the pending frame; true when one was requested
    pub fn fire(&self) -> bool {
        self.pending.replace(false)
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&mut self) {
        self.pending.set(true);
        self.requested.set(self.requested.get() + 1);
    }

    fn cancel_frame(&mut self) {
        if self.pending.replace(false) {
            self.cancelled.set(self.cancelled.get() + 1);
        }
    }
}

#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::sequencing::pitch::BoardPosition;

/// Live performance input from the UI thread.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PerformanceMessage {
    KeyDown { position: BoardPosition },
    KeyUp { position: BoardPosition },
    AllNotesOff,
}

pub trait MessageReceiver: Send {
    fn pop(&mut self) -> Option<PerformanceMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<PerformanceMessage> {
    fn pop(&mut self) -> Option<PerformanceMessage> {
        Consumer::pop(self).ok()
    }
}

/// Plain queue, for hosts without a ring buffer and for tests.
impl MessageReceiver for std::collections::VecDeque<PerformanceMessage> {
    fn pop(&mut self) -> Option<PerformanceMessage> {
        self.pop_front()
    }
}

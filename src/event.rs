//! Playback lifecycle events.
//!
//! Engines push events from whichever thread caused them (control thread or
//! decode thread) into a shared [`EventSink`].  The manager drains the sink
//! on the consumer thread and hands each event to every listener, so
//! listener code never runs on a decode thread.

use std::fmt;
use std::sync::Arc;

use crate::queue::ThreadSafeQueue;

/// Slot handle of a stream inside a [`StreamManager`](crate::StreamManager).
pub type SlotId = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Play,
    Pause,
    Stop,
    Resume,
    /// The cursor crossed a loop bound.  Fired for every loop mode,
    /// including `None` right before the stream stops.
    Loop,
}

impl EventKind {
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Play   => "play",
            EventKind::Pause  => "pause",
            EventKind::Stop   => "stop",
            EventKind::Resume => "resume",
            EventKind::Loop   => "loop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub kind:   EventKind,
    pub stream: SlotId,
}

impl Event {
    pub fn new(kind: EventKind, stream: SlotId) -> Self {
        Self { kind, stream }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream {}: {}", self.stream, self.kind.name())
    }
}

pub type EventSink = Arc<ThreadSafeQueue<Event>>;

pub trait EventListener: Send {
    fn handle(&mut self, event: &Event);
}

impl<F> EventListener for F
where
    F: FnMut(&Event) + Send,
{
    fn handle(&mut self, event: &Event) {
        self(event)
    }
}

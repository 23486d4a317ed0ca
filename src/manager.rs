//! Registry of playback engines plus the event bus that fans decode-thread
//! notifications back out on the consumer thread.
//!
//! The manager is an ordinary value: construct one per application (or per
//! test) and pass it where it is needed.  Slot ids are handed out in
//! increasing order and only reset by [`StreamManager::close_all`].

use std::path::Path;
use std::sync::Arc;

use crate::config::EngineOptions;
use crate::engine::PlaybackEngine;
use crate::error::ManagerError;
use crate::event::{Event, EventListener, EventSink, SlotId};
use crate::queue::ThreadSafeQueue;

/// Upper bound on concurrently registered streams.
pub const MAX_STREAMS: usize = 6;

pub struct StreamManager {
    options:   EngineOptions,
    engines:   Vec<PlaybackEngine>,
    listeners: Vec<Box<dyn EventListener>>,
    events:    EventSink,
    next_id:   SlotId,
}

impl Default for StreamManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamManager {
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    /// Every engine created by this manager gets a copy of `options`.
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            options,
            engines:   Vec::with_capacity(MAX_STREAMS),
            listeners: Vec::new(),
            events:    Arc::new(ThreadSafeQueue::new()),
            next_id:   0,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    // ── Registry ─────────────────────────────────────────────────────────────

    /// Create an unopened engine wired to this manager's event queue.
    pub fn add_engine(&mut self) -> Result<SlotId, ManagerError> {
        if self.engines.len() >= MAX_STREAMS {
            tracing::warn!("cannot add stream: {MAX_STREAMS} already registered");
            return Err(ManagerError::CapacityExceeded { max: MAX_STREAMS });
        }
        let id = self.next_id;
        self.next_id += 1;

        let engine = PlaybackEngine::new(id, self.options.clone());
        engine.set_event_sink(Arc::clone(&self.events));
        self.engines.push(engine);
        tracing::debug!(stream = id, "engine added");
        Ok(id)
    }

    /// Add an engine and open `path` in it.  The slot stays allocated when
    /// the open fails.
    pub fn open_stream<P: AsRef<Path>>(&mut self, path: P) -> Result<SlotId, ManagerError> {
        let id = self.add_engine()?;
        if let Some(engine) = self.engine_mut(id) {
            engine.open(path)?;
        }
        Ok(id)
    }

    pub fn engine(&self, id: SlotId) -> Option<&PlaybackEngine> {
        self.engines.iter().find(|e| e.id() == id)
    }

    pub fn engine_mut(&mut self, id: SlotId) -> Option<&mut PlaybackEngine> {
        self.engines.iter_mut().find(|e| e.id() == id)
    }

    pub fn engines(&self) -> impl Iterator<Item = &PlaybackEngine> {
        self.engines.iter()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Per engine, in slot order: did a new frame arrive since the last call?
    /// Unopened engines always report `false`.
    pub fn update(&self) -> Vec<bool> {
        self.engines
            .iter()
            .map(|e| e.is_loaded() && e.has_new_frame())
            .collect()
    }

    /// Close every engine, forget all slots, drop pending events and restart
    /// slot numbering at zero.
    pub fn close_all(&mut self) {
        for engine in &mut self.engines {
            engine.close();
        }
        self.engines.clear();
        self.events.clear();
        self.next_id = 0;
        tracing::debug!("all streams closed");
    }

    // ── Events ───────────────────────────────────────────────────────────────

    pub fn event_sink(&self) -> EventSink {
        Arc::clone(&self.events)
    }

    pub fn add_listener<L: EventListener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener));
    }

    pub fn post_event(&self, event: Event) {
        self.events.push(event);
    }

    /// Deliver every queued event to every listener, in arrival order and
    /// listener registration order.  Returns the number of events drained.
    pub fn process_events(&mut self) -> usize {
        let pending = self.events.drain();
        for event in &pending {
            tracing::trace!("{event}");
            for listener in &mut self.listeners {
                listener.handle(event);
            }
        }
        pending.len()
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        self.close_all();
    }
}

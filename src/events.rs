//! Inbound event queue.
//!
//! Events are produced by:
//! - the radio stack (crash frames decoded by the link manager)
//! - the countdown tick source
//! - the wearer (cancel / send now) and the UI (dismiss)
//!
//! and consumed by the [`GuardService`](crate::app::service::GuardService)
//! one at a time, in arrival order.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Radio       │────▶│              │     │              │
//! │ Tick source │────▶│  Event Queue │────▶│ GuardService │
//! │ Wearer / UI │────▶│  (bounded)   │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::model::ImpactEvent;

/// Maximum number of pending events.
pub const EVENT_QUEUE_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A crash frame arrived (or a synthetic one was injected).
    Impact(ImpactEvent),
    /// One countdown period elapsed.
    Tick,
    /// Wearer pressed "I'm safe".
    Cancel,
    /// Wearer pressed "Send help now".
    SendNow,
    /// The confirmation UI went away.
    Dismiss,
}

/// Bounded FIFO between event producers and the controller.
///
/// Single-threaded: the controller owns the queue and both ends run on
/// its thread, so the channel needs no real lock.
pub struct EventQueue {
    chan: Channel<NoopRawMutex, Event, EVENT_QUEUE_DEPTH>,
    dropped: u32,
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            chan: Channel::new(),
            dropped: 0,
        }
    }

    /// Enqueue `event`.  Returns `false` if the queue is full (event dropped).
    pub fn push(&mut self, event: Event) -> bool {
        match self.chan.try_send(event) {
            Ok(()) => true,
            Err(_) => {
                self.dropped = self.dropped.saturating_add(1);
                warn!("event queue full, dropping event");
                false
            }
        }
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.chan.try_receive().ok()
    }

    /// Remove and return every pending event matching `pick`; the rest
    /// keep their order.
    pub fn take_matching(&mut self, mut pick: impl FnMut(&Event) -> bool) -> Vec<Event> {
        let mut taken = Vec::new();
        let mut keep: heapless::Vec<Event, EVENT_QUEUE_DEPTH> = heapless::Vec::new();
        while let Ok(ev) = self.chan.try_receive() {
            if pick(&ev) {
                taken.push(ev);
            } else {
                // Capacity matches the channel, so this cannot overflow.
                let _ = keep.push(ev);
            }
        }
        for ev in keep {
            let _ = self.chan.try_send(ev);
        }
        taken
    }

    pub fn len(&self) -> usize {
        self.chan.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chan.is_empty()
    }

    /// Events lost to a full queue since construction.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

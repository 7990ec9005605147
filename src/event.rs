//! Events going to the test process and the scheduler that delivers them

use core::sync::atomic::{AtomicU16, Ordering};

/// Identifies a kind of posted event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct EventId(pub u8);

/// What the process gets resumed with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Event {
    /// First dispatch after the process got started
    Init,
    /// The delay timer expired
    Timer,
    /// Someone posted an event to the process
    Posted { id: EventId, data: u32 },
}

impl Event {
    /// True if this is a posted event with the given id
    pub fn is(&self, id: Option<EventId>) -> bool {
        matches!((self, id), (Event::Posted { id: posted, .. }, Some(id)) if *posted == id)
    }
}

/// The scheduler side that creates and posts events.
///
/// Posting happens from interrupt context and must not block.
pub trait EventQueue {
    /// Hand out a new, unique, event id
    fn alloc_event(&self) -> EventId;

    fn post(&self, id: EventId, data: u32);
}

impl<T: EventQueue + ?Sized> EventQueue for &T {
    fn alloc_event(&self) -> EventId {
        T::alloc_event(self)
    }

    fn post(&self, id: EventId, data: u32) {
        T::post(self, id, data)
    }
}

/// The scheduler side that delivers events to the process
#[allow(async_fn_in_trait)]
pub trait EventSource {
    /// Wait for the next event. This must be cancel-safe.
    async fn next(&mut self) -> Event;
}

/// An event id that gets filled in once and can be read from interrupt context
#[derive(Debug)]
pub struct EventSlot(AtomicU16);

impl EventSlot {
    /// Outside of the id range, so every id can be stored
    const EMPTY: u16 = u16::MAX;

    pub const fn new() -> Self {
        Self(AtomicU16::new(Self::EMPTY))
    }

    pub fn set(&self, id: EventId) {
        self.0.store(u16::from(id.0), Ordering::Relaxed);
    }

    pub fn get(&self) -> Option<EventId> {
        match self.0.load(Ordering::Relaxed) {
            Self::EMPTY => None,
            id => Some(EventId(id as u8)),
        }
    }
}

impl Default for EventSlot {
    fn default() -> Self {
        Self::new()
    }
}

//! Timer events and the subscriber bridge.
//!
//! Every milestone the engine produces is a [`TimerEvent`]; consumers
//! register interest per [`EventKind`] and receive events synchronously, in
//! registration order. A failing subscriber is logged and skipped -- it never
//! blocks delivery to the others, and it never touches engine state. There is
//! no buffering and no replay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Mode, TimerState};

/// The closed set of event kinds a subscriber can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Tick,
    StateChange,
    Complete,
    ModeSwitch,
}

/// A milestone produced by the session state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TimerEvent {
    /// One quantum elapsed on a running timer.
    Tick {
        mode: Mode,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// Any state mutation outside the tick path. `previous` is None for
    /// full-replacement mutations (preset selection, full reset); consumers
    /// must treat those as a complete refresh, not a delta.
    StateChange {
        previous: Option<TimerState>,
        current: TimerState,
        at: DateTime<Utc>,
    },
    /// A phase ran to natural expiry.
    Complete {
        completed_mode: Mode,
        next_mode: Mode,
        completed_sessions: u32,
        at: DateTime<Utc>,
    },
    /// The phase flipped, by expiry or by user skip.
    ModeSwitch {
        from: Mode,
        to: Mode,
        completed_sessions: u32,
        at: DateTime<Utc>,
    },
}

impl TimerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TimerEvent::Tick { .. } => EventKind::Tick,
            TimerEvent::StateChange { .. } => EventKind::StateChange,
            TimerEvent::Complete { .. } => EventKind::Complete,
            TimerEvent::ModeSwitch { .. } => EventKind::ModeSwitch,
        }
    }
}

pub type HandlerResult = Result<(), Box<dyn std::error::Error>>;

type Handler = Box<dyn FnMut(&TimerEvent) -> HandlerResult>;

/// Handle returned at registration; passing it back removes the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

/// Synchronous fan-out of timer events to registered subscribers.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    handlers: Vec<(u64, EventKind, Handler)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind. Handlers fire in registration
    /// order.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> Subscription
    where
        F: FnMut(&TimerEvent) -> HandlerResult + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.handlers.push((id, kind, Box::new(handler)));
        Subscription(id)
    }

    /// Remove a previously registered handler. Returns false if the handle
    /// was already removed.
    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(id, _, _)| *id != sub.0);
        self.handlers.len() != before
    }

    /// Deliver an event to every current subscriber of its kind.
    pub fn publish(&mut self, event: &TimerEvent) {
        let kind = event.kind();
        for (_, k, handler) in self.handlers.iter_mut() {
            if *k != kind {
                continue;
            }
            if let Err(e) = handler(event) {
                eprintln!("Warning: event subscriber failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn tick_event() -> TimerEvent {
        TimerEvent::Tick {
            mode: Mode::Work,
            remaining_ms: 1000,
            at: Utc::now(),
        }
    }

    #[test]
    fn delivers_in_registration_order() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = Rc::clone(&seen);
            bus.subscribe(EventKind::Tick, move |_| {
                seen.borrow_mut().push(tag);
                Ok(())
            });
        }

        bus.publish(&tick_event());
        assert_eq!(*seen.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn only_matching_kind_fires() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0u32));
        {
            let count = Rc::clone(&count);
            bus.subscribe(EventKind::Complete, move |_| {
                *count.borrow_mut() += 1;
                Ok(())
            });
        }
        bus.publish(&tick_event());
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn failing_subscriber_does_not_block_the_rest() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        bus.subscribe(EventKind::Tick, |_| Err("boom".into()));
        {
            let seen = Rc::clone(&seen);
            bus.subscribe(EventKind::Tick, move |_| {
                seen.borrow_mut().push("after");
                Ok(())
            });
        }

        bus.publish(&tick_event());
        assert_eq!(*seen.borrow(), vec!["after"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0u32));
        let sub = {
            let count = Rc::clone(&count);
            bus.subscribe(EventKind::Tick, move |_| {
                *count.borrow_mut() += 1;
                Ok(())
            })
        };

        bus.publish(&tick_event());
        assert!(bus.unsubscribe(sub));
        bus.publish(&tick_event());
        assert_eq!(*count.borrow(), 1);
        assert!(!bus.unsubscribe(sub));
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(tick_event()).unwrap();
        assert_eq!(json["type"], "Tick");
        assert_eq!(json["remaining_ms"], 1000);
    }
}

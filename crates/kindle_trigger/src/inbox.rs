// SPDX-License-Identifier: MIT OR Apache-2.0
//! Channel funnelling triggers from other threads onto the owning thread.
//!
//! A trigger site must only be mutated by its owner. Timers and other
//! threads hold a [`TriggerSender`]; the owner polls its [`TriggerInbox`]
//! once per frame and applies the events itself.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Events delivered to a trigger site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Fire the effect once
    Trigger,
    /// A periodic timer fired
    Tick,
    /// Enable or disable the site
    SetEnabled(bool),
}

/// Sending half, cheap to clone and safe to move across threads
#[derive(Debug, Clone)]
pub struct TriggerSender {
    tx: Sender<TriggerEvent>,
}

impl TriggerSender {
    /// Send an event. Returns `false` once the inbox is gone
    pub fn send(&self, event: TriggerEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Request a trigger
    pub fn trigger(&self) -> bool {
        self.send(TriggerEvent::Trigger)
    }

    /// Deliver a timer tick
    pub fn tick(&self) -> bool {
        self.send(TriggerEvent::Tick)
    }

    /// Request an enable-state change
    pub fn set_enabled(&self, is_enabled: bool) -> bool {
        self.send(TriggerEvent::SetEnabled(is_enabled))
    }
}

/// Receiving half, owned by the thread that owns the site
#[derive(Debug)]
pub struct TriggerInbox {
    rx: Receiver<TriggerEvent>,
    disconnected: bool,
}

/// Create a connected sender/inbox pair
pub fn channel() -> (TriggerSender, TriggerInbox) {
    let (tx, rx) = mpsc::channel();
    (
        TriggerSender { tx },
        TriggerInbox {
            rx,
            disconnected: false,
        },
    )
}

impl TriggerInbox {
    /// Poll for pending events (non-blocking)
    pub fn drain(&mut self) -> Vec<TriggerEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        tracing::warn!("Trigger channel disconnected");
                        self.disconnected = true;
                    }
                    break;
                }
            }
        }
        events
    }

    /// Whether every sender has been dropped
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

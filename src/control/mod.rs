//! # Control State Machine
//!
//! Tracks whether a print request is in flight from this control client.
//!
//! ```text
//!            trigger (link open)              scan-end
//!   Idle ---------------------------> Busy ------------> Idle
//!                                      |
//!                                      +---- watchdog ---> Idle
//! ```
//!
//! The machine is pure: time is passed in, events are handed back. The async
//! side lives in [`driver`].

pub mod driver;

use crate::protocol::Event;
use std::time::Duration;
use tokio::time::Instant;

/// Watchdog delay after which a stuck busy state clears itself.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Idle,
    Busy { deadline: Instant },
}

/// What a trigger did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The event to put on the wire.
    Sent(Event),
    IgnoredBusy,
    IgnoredOffline,
}

/// Snapshot published to whatever renders the control surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlStatus {
    pub busy: bool,
    pub scanning: bool,
}

impl ControlStatus {
    /// Terminal label. An indicator still lit after the watchdog reads as
    /// ready.
    pub fn label(&self) -> &'static str {
        match (self.busy, self.scanning) {
            (false, _) => "ready",
            (true, true) => "scanning...",
            (true, false) => "printing",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControlMachine {
    state: ControlState,
    busy_timeout: Duration,
    scanning: bool,
}

impl Default for ControlMachine {
    fn default() -> Self {
        Self::new(DEFAULT_BUSY_TIMEOUT)
    }
}

impl ControlMachine {
    pub fn new(busy_timeout: Duration) -> Self {
        Self {
            state: ControlState::Idle,
            busy_timeout,
            scanning: false,
        }
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, ControlState::Busy { .. })
    }

    /// Whether the cosmetic "scan in progress" indicator is lit.
    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn status(&self) -> ControlStatus {
        ControlStatus {
            busy: self.is_busy(),
            scanning: self.scanning,
        }
    }

    /// When the watchdog fires, if busy.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            ControlState::Busy { deadline } => Some(deadline),
            ControlState::Idle => None,
        }
    }

    /// User pressed print.
    ///
    /// Only an idle machine with an open link sends; anything else is a
    /// silent no-op.
    pub fn trigger(&mut self, link_open: bool, now: Instant) -> TriggerOutcome {
        if self.is_busy() {
            return TriggerOutcome::IgnoredBusy;
        }
        if !link_open {
            return TriggerOutcome::IgnoredOffline;
        }
        self.state = ControlState::Busy {
            deadline: now + self.busy_timeout,
        };
        TriggerOutcome::Sent(Event::Print)
    }

    /// Applies an event received from the relay. Returns true if the status
    /// changed.
    pub fn on_event(&mut self, event: Event) -> bool {
        let before = self.status();
        match event {
            Event::ScanStart => self.scanning = true,
            Event::ScanEnd => {
                self.scanning = false;
                self.state = ControlState::Idle;
            }
            // Our own print, echoed back by the relay.
            Event::Print => {}
        }
        self.status() != before
    }

    /// Clears a busy state whose deadline has passed. Returns true if it did.
    ///
    /// The scanning indicator is left as is; only `scan-end` turns it off.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.state {
            ControlState::Busy { deadline } if now >= deadline => {
                self.state = ControlState::Idle;
                true
            }
            _ => false,
        }
    }
}

//! Async driver for [`ControlMachine`]: merges user triggers, relay events and
//! the watchdog timer into one loop.

use super::{ControlMachine, ControlStatus, TriggerOutcome};
use crate::protocol::Event;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Channels the driver is wired to.
pub struct ControlPorts {
    /// One message per button press.
    pub triggers: mpsc::Receiver<()>,
    /// Decoded events from the relay.
    pub inbound: mpsc::UnboundedReceiver<Event>,
    /// Events to send to the relay.
    pub outbound: mpsc::UnboundedSender<Event>,
    /// Whether the relay link is currently open.
    pub link: watch::Receiver<bool>,
    /// Status for the UI.
    pub status: watch::Sender<ControlStatus>,
}

/// Runs until the trigger source or the relay link goes away.
pub async fn run_control(mut machine: ControlMachine, ports: ControlPorts) {
    let ControlPorts {
        mut triggers,
        mut inbound,
        outbound,
        link,
        status,
    } = ports;

    status.send_replace(machine.status());

    loop {
        let deadline = machine.deadline();

        tokio::select! {
            trigger = triggers.recv() => {
                if trigger.is_none() {
                    break;
                }
                let link_open = *link.borrow();
                match machine.trigger(link_open, Instant::now()) {
                    TriggerOutcome::Sent(event) => {
                        info!(%event, "print requested");
                        if outbound.send(event).is_err() {
                            break;
                        }
                    }
                    TriggerOutcome::IgnoredBusy => debug!("trigger ignored, print in flight"),
                    TriggerOutcome::IgnoredOffline => debug!("trigger ignored, relay link down"),
                }
            }
            event = inbound.recv() => {
                let Some(event) = event else { break };
                if machine.on_event(event) {
                    debug!(%event, status = ?machine.status(), "control status changed");
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if machine.expire(Instant::now()) {
                    warn!("no scan-end before the busy timeout, re-enabling print");
                }
            }
        }

        status.send_if_modified(|current| {
            let next = machine.status();
            let changed = *current != next;
            *current = next;
            changed
        });
    }
}

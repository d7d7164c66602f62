//! # Wire Protocol
//!
//! Control and wall clients talk to each other through the relay using small
//! JSON text frames tagged by a `type` field.
//!
//! | `type` | Direction | Meaning |
//! |--------|-----------|---------|
//! | `print` | control -> wall | A new degraded copy was requested |
//! | `scan-start` | wall -> control | The sweep animation began |
//! | `scan-end` | wall -> control | Scan and composite both finished |
//!
//! The relay never looks inside a frame. Only the clients decode, and they
//! drop anything that is not valid JSON or carries an unknown `type`.

use serde::{Deserialize, Serialize};

/// A synchronisation event exchanged between control and wall.
///
/// Extra fields in an incoming frame are ignored so that newer peers can add
/// payload without breaking older ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    Print,
    ScanStart,
    ScanEnd,
}

impl Event {
    /// Decodes a text frame.
    ///
    /// Returns `None` for non-JSON payloads and for JSON without a recognised
    /// `type`. Callers treat `None` as "drop silently".
    pub fn decode(frame: &str) -> Option<Self> {
        serde_json::from_str(frame).ok()
    }

    /// Encodes the event as a compact JSON text frame, e.g. `{"type":"print"}`.
    pub fn encode(&self) -> String {
        // A fieldless tagged enum always serialises.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Event::Print => "print",
            Event::ScanStart => "scan-start",
            Event::ScanEnd => "scan-end",
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Exchange connection state machine.
//!
//! Adapted from the teacher's `core/connection_fsm.rs` typestate FSM to a
//! runtime enum: the connection lives behind `SimulatedExchange`'s shared
//! lock (§5), which a consume-and-return-`Self` typestate can't model.

use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
    Error,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "DISCONNECTED",
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Connected => "CONNECTED",
            ConnectionState::Disconnecting => "DISCONNECTING",
            ConnectionState::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Data carried alongside the connection state: counters and timestamps,
/// matching the fields the teacher's `ConnectionData` tracked.
#[derive(Debug, Clone)]
pub struct ConnectionData {
    pub state: ConnectionState,
    pub connected_at: Option<i64>,
    pub disconnected_at: Option<i64>,
    pub disconnect_count: u32,
}

impl Default for ConnectionData {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            connected_at: None,
            disconnected_at: None,
            disconnect_count: 0,
        }
    }
}

impl ConnectionData {
    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }

    /// Idempotent: connecting while already connected leaves the state and
    /// timestamp unchanged, per SPEC_FULL.md §8 round-trip properties.
    pub fn connect(&mut self) {
        if self.state == ConnectionState::Connected {
            return;
        }
        self.state = ConnectionState::Connecting;
        self.state = ConnectionState::Connected;
        self.connected_at = Some(Self::now());
    }

    pub fn disconnect(&mut self) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        self.state = ConnectionState::Disconnecting;
        self.state = ConnectionState::Disconnected;
        self.disconnected_at = Some(Self::now());
        self.disconnect_count += 1;
    }

    pub fn mark_error(&mut self) {
        self.state = ConnectionState::Error;
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

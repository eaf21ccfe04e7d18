//! Per-tenant session state machine.
//!
//! ```text
//! UNINITIALIZED --init--> INITIALIZING
//! INITIALIZING  --challenge--> PAIRING_READY
//! PAIRING_READY --accepted--> PAIRED
//! PAIRED        --ready--> CONNECTED
//! any live state --failure/disconnect--> DISCONNECTED
//! DISCONNECTED  --init--> INITIALIZING
//! ```

use super::transport::TransportEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Uninitialized,
    Initializing,
    PairingReady,
    Paired,
    Connected,
    Disconnected,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Uninitialized => "UNINITIALIZED",
            SessionState::Initializing => "INITIALIZING",
            SessionState::PairingReady => "PAIRING_READY",
            SessionState::Paired => "PAIRED",
            SessionState::Connected => "CONNECTED",
            SessionState::Disconnected => "DISCONNECTED",
        }
    }

    /// A session exists and has not failed.
    pub fn is_live(self) -> bool {
        !matches!(self, SessionState::Uninitialized | SessionState::Disconnected)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot published to readers of a tenant's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub state: SessionState,
    /// Present only while `PAIRING_READY`.
    pub pairing_challenge: Option<String>,
    pub since: DateTime<Utc>,
}

/// What [`SessionStatus::apply`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved { from: SessionState, to: SessionState },
    ChallengeRefreshed,
    Ignored,
}

impl SessionStatus {
    pub fn uninitialized() -> Self {
        Self::at(SessionState::Uninitialized)
    }

    pub fn initializing() -> Self {
        Self::at(SessionState::Initializing)
    }

    fn at(state: SessionState) -> Self {
        Self {
            state,
            pairing_challenge: None,
            since: Utc::now(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Connected
    }

    fn move_to(&mut self, to: SessionState, challenge: Option<String>) -> Transition {
        let from = self.state;
        self.state = to;
        self.pairing_challenge = challenge;
        self.since = Utc::now();
        Transition::Moved { from, to }
    }

    /// Marks the session as failed and forgets any challenge.
    pub fn disconnect(&mut self) -> Transition {
        if self.state == SessionState::Disconnected {
            return Transition::Ignored;
        }
        self.move_to(SessionState::Disconnected, None)
    }

    /// Applies a transport event. Out-of-order events leave the status untouched.
    pub fn apply(&mut self, event: &TransportEvent) -> Transition {
        use SessionState::*;

        match (self.state, event) {
            (PairingReady, TransportEvent::PairingChallenge(code)) => {
                self.pairing_challenge = Some(code.clone());
                self.since = Utc::now();
                Transition::ChallengeRefreshed
            }
            (Initializing, TransportEvent::PairingChallenge(code)) => {
                self.move_to(PairingReady, Some(code.clone()))
            }
            // Restored credentials skip the challenge entirely.
            (Initializing | PairingReady, TransportEvent::Authenticated) => self.move_to(Paired, None),
            (Paired, TransportEvent::Ready) => self.move_to(Connected, None),
            (
                Initializing | PairingReady | Paired | Connected,
                TransportEvent::AuthFailure(_) | TransportEvent::Disconnected(_),
            ) => self.move_to(Disconnected, None),
            _ => Transition::Ignored,
        }
    }
}

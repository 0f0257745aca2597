use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::GatewayError;

/// Outcome of a recorded attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Success,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            other => Err(GatewayError::Internal(format!("unknown event kind '{}'", other))),
        }
    }
}

/// Which gateway path produced the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Predict,
    Login,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Predict => "predict",
            Self::Login => "login",
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub actor: String,
    pub source: EventSource,
}

/// An event about to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub actor: String,
    pub source: EventSource,
}

impl NewEvent {
    pub fn new(
        timestamp: DateTime<Utc>,
        kind: EventKind,
        actor: impl Into<String>,
        source: EventSource,
    ) -> Self {
        Self {
            timestamp,
            kind,
            actor: actor.into(),
            source,
        }
    }

    /// Event stamped with the current wall-clock time
    pub fn now(kind: EventKind, actor: impl Into<String>, source: EventSource) -> Self {
        Self::new(Utc::now(), kind, actor, source)
    }

    pub fn into_event(self, id: i64) -> Event {
        Event {
            id,
            timestamp: self.timestamp,
            kind: self.kind,
            actor: self.actor,
            source: self.source,
        }
    }
}

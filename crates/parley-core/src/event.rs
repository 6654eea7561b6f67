//! Events delivered by the chat service's event feed.

use std::collections::BTreeSet;

use crate::message::Message;

/// Flag set by the server when the receiving user is mentioned anywhere in
/// the message.
pub const FLAG_MENTIONED: &str = "mentioned";

/// Classification flags attached to a message event (`mentioned`, `read`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFlags(BTreeSet<String>);

impl EventFlags {
    /// Creates an empty flag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `flag` is present.
    pub fn contains(&self, flag: &str) -> bool {
        self.0.contains(flag)
    }

    /// Adds a flag.
    pub fn insert(&mut self, flag: impl Into<String>) {
        self.0.insert(flag.into());
    }

    /// Returns `true` if the bot was mentioned at any position.
    pub fn is_mentioned(&self) -> bool {
        self.contains(FLAG_MENTIONED)
    }

    /// Iterates over the flags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for EventFlags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Payload of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A new message.
    Message {
        /// The message itself.
        message: Message,
        /// Classification flags for the receiving user.
        flags: EventFlags,
    },
    /// Any other event type; carried only so it can be logged and skipped.
    Other {
        /// Raw type tag reported by the server.
        event_type: String,
    },
}

/// A single event from the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Queue-local event id.
    pub id: i64,
    /// Event payload.
    pub kind: EventKind,
}

impl Event {
    /// Creates a message event.
    pub fn message(id: i64, message: Message, flags: EventFlags) -> Self {
        Self {
            id,
            kind: EventKind::Message { message, flags },
        }
    }

    /// Creates an event of some other type.
    pub fn other(id: i64, event_type: impl Into<String>) -> Self {
        Self {
            id,
            kind: EventKind::Other {
                event_type: event_type.into(),
            },
        }
    }

    /// Returns the type tag of this event.
    pub fn event_type(&self) -> &str {
        match &self.kind {
            EventKind::Message { .. } => "message",
            EventKind::Other { event_type } => event_type,
        }
    }
}

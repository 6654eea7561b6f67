//! Message types exchanged with the chat service.
//!
//! Inbound messages arrive inside an [`Event`](crate::Event); outbound
//! traffic is described by an [`Envelope`] (new message) or a
//! [`MessageEdit`] (replacement content for a message the bot sent earlier).
//!
//! ```text
//! Message { id, sender_*, content, conversation }
//! ├── Conversation::Private { recipients: [Participant, ..] }
//! └── Conversation::Stream  { stream, topic }
//! ```

use serde::{Deserialize, Serialize};

/// The identity a bot runs as, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotProfile {
    /// Numeric user id of the bot account.
    pub user_id: u64,
    /// Display name; also the text inside the bot's mention token.
    pub full_name: String,
    /// Email address of the bot account.
    pub email: String,
}

/// One participant of a private conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Numeric user id.
    pub id: u64,
    /// Email address, used to address private replies.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub full_name: String,
}

impl Participant {
    /// Creates a participant.
    pub fn new(id: u64, email: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            full_name: full_name.into(),
        }
    }
}

/// Kind of conversation a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    /// Direct conversation between a set of users.
    Private,
    /// Stream (channel) conversation under a topic.
    Stream,
}

impl std::fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Private => write!(f, "private"),
            Self::Stream => write!(f, "stream"),
        }
    }
}

/// Where a message was posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Conversation {
    /// Private conversation; `recipients` lists every participant,
    /// including the sender and the bot itself.
    Private {
        /// All participants of the conversation.
        recipients: Vec<Participant>,
    },
    /// Stream conversation.
    Stream {
        /// Stream name.
        stream: String,
        /// Topic inside the stream.
        topic: String,
    },
}

impl Conversation {
    /// Returns the conversation kind.
    pub fn kind(&self) -> ConversationKind {
        match self {
            Self::Private { .. } => ConversationKind::Private,
            Self::Stream { .. } => ConversationKind::Stream,
        }
    }
}

/// An inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned message id.
    pub id: u64,
    /// Numeric id of the sender.
    pub sender_id: u64,
    /// Email of the sender.
    #[serde(default)]
    pub sender_email: String,
    /// Display name of the sender.
    #[serde(default)]
    pub sender_full_name: String,
    /// Conversation the message was posted in.
    pub conversation: Conversation,
    /// Markdown content of the message.
    pub content: String,
}

impl Message {
    /// Returns the conversation kind.
    pub fn kind(&self) -> ConversationKind {
        self.conversation.kind()
    }

    /// Returns `true` for private conversations.
    pub fn is_private(&self) -> bool {
        self.kind() == ConversationKind::Private
    }

    /// Returns `true` if this is a private message sent by someone other
    /// than `own_user_id`.
    pub fn is_private_from_other(&self, own_user_id: u64) -> bool {
        self.is_private() && self.sender_id != own_user_id
    }
}

// =============================================================================
// Outbound
// =============================================================================

/// Destination of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Destination {
    /// Private message to the listed emails.
    Private {
        /// Recipient emails.
        to: Vec<String>,
    },
    /// Stream message.
    Stream {
        /// Stream name.
        stream: String,
        /// Topic inside the stream.
        topic: String,
    },
}

/// An outbound message: destination plus content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Where the message goes.
    pub destination: Destination,
    /// Markdown content.
    pub content: String,
}

impl Envelope {
    /// Creates a private envelope.
    pub fn private<I, S>(to: I, content: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            destination: Destination::Private {
                to: to.into_iter().map(Into::into).collect(),
            },
            content: content.into(),
        }
    }

    /// Creates a stream envelope.
    pub fn stream(
        stream: impl Into<String>,
        topic: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            destination: Destination::Stream {
                stream: stream.into(),
                topic: topic.into(),
            },
            content: content.into(),
        }
    }

    /// Returns the conversation kind this envelope targets.
    pub fn kind(&self) -> ConversationKind {
        match self.destination {
            Destination::Private { .. } => ConversationKind::Private,
            Destination::Stream { .. } => ConversationKind::Stream,
        }
    }
}

/// Replacement content for a previously sent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEdit {
    /// Id of the message to edit.
    pub message_id: u64,
    /// New content.
    pub content: String,
}

impl MessageEdit {
    /// Creates an edit.
    pub fn new(message_id: u64, content: impl Into<String>) -> Self {
        Self {
            message_id,
            content: content.into(),
        }
    }
}

/// Echo returned by the server for a successful send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReceipt {
    /// Id of the newly created message.
    pub id: u64,
}

//! JSON shapes of the chat service's REST API.
//!
//! Every response is an object with `result` (`"success"` or `"error"`),
//! `msg`, an optional `code`, and endpoint-specific fields next to them.
//! [`into_result`] checks the envelope and decodes the rest; the structs
//! below mirror just the fields the runtime reads, and convert into the
//! `parley-core` model.

use parley_core::{
    ApiError, ApiResult, BotProfile, Conversation, Destination, Envelope, Event, Message,
    Participant, StorageMap,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event type the server sends to keep an idle long-poll alive.
pub const HEARTBEAT: &str = "heartbeat";

/// Code reported when an error response carries none.
const DEFAULT_ERROR_CODE: &str = "BAD_REQUEST";

#[derive(Deserialize)]
struct Status {
    result: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    code: Option<String>,
}

/// Checks the `result` field of a response and decodes its payload.
///
/// # Errors
///
/// [`ApiError::Remote`] when the server answered `result: "error"`,
/// [`ApiError::Decode`] when the body has an unexpected shape.
pub fn into_result<T: DeserializeOwned>(body: Value) -> ApiResult<T> {
    let status = Status::deserialize(&body)?;
    if status.result != "success" {
        let code = status
            .code
            .unwrap_or_else(|| DEFAULT_ERROR_CODE.to_string());
        return Err(ApiError::remote(code, status.msg));
    }
    Ok(serde_json::from_value(body)?)
}

// =============================================================================
// Responses
// =============================================================================

/// `GET /users/me`
#[derive(Debug, Deserialize)]
pub struct ProfileResponse {
    pub user_id: u64,
    pub full_name: String,
    pub email: String,
}

impl From<ProfileResponse> for BotProfile {
    fn from(profile: ProfileResponse) -> Self {
        Self {
            user_id: profile.user_id,
            full_name: profile.full_name,
            email: profile.email,
        }
    }
}

/// `GET /bot_storage`
#[derive(Debug, Deserialize)]
pub struct StorageResponse {
    #[serde(default)]
    pub storage: StorageMap,
}

/// `POST /messages`
#[derive(Debug, Deserialize)]
pub struct SendResponse {
    pub id: u64,
}

/// `POST /register`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterResponse {
    pub queue_id: String,
    pub last_event_id: i64,
}

/// `GET /events`
///
/// Entries stay raw so that one malformed event cannot fail the whole batch.
#[derive(Debug, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub events: Vec<Value>,
}

/// Reads the `id` of a raw event without decoding the rest of it.
pub fn raw_event_id(raw: &Value) -> Option<i64> {
    raw.get("id").and_then(Value::as_i64)
}

// =============================================================================
// Events
// =============================================================================

/// One entry of the `events` array.
#[derive(Debug, Clone, Deserialize)]
pub struct WireEvent {
    pub id: i64,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub message: Option<WireMessage>,
    #[serde(default)]
    pub flags: Vec<String>,
}

impl WireEvent {
    /// Decodes one raw entry of the `events` array.
    pub fn from_value(raw: Value) -> ApiResult<Self> {
        Ok(serde_json::from_value(raw)?)
    }

    /// Returns `true` for keep-alive events.
    pub fn is_heartbeat(&self) -> bool {
        self.event_type == HEARTBEAT
    }
}

/// A message as it appears inside a `message` event.
#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    pub id: u64,
    pub sender_id: u64,
    #[serde(default)]
    pub sender_email: String,
    #[serde(default)]
    pub sender_full_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub display_recipient: DisplayRecipient,
    #[serde(default, alias = "topic")]
    pub subject: String,
    pub content: String,
}

/// Stream name for stream messages, participant list for private ones.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DisplayRecipient {
    Stream(String),
    Private(Vec<WireRecipient>),
}

/// One participant of a private conversation.
#[derive(Debug, Clone, Deserialize)]
pub struct WireRecipient {
    pub id: u64,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
}

impl TryFrom<WireMessage> for Message {
    type Error = ApiError;

    fn try_from(wire: WireMessage) -> ApiResult<Self> {
        let conversation = match (wire.kind.as_str(), wire.display_recipient) {
            ("private", DisplayRecipient::Private(recipients)) => Conversation::Private {
                recipients: recipients
                    .into_iter()
                    .map(|r| Participant::new(r.id, r.email, r.full_name))
                    .collect(),
            },
            ("stream", DisplayRecipient::Stream(stream)) => Conversation::Stream {
                stream,
                topic: wire.subject,
            },
            (kind, _) => {
                return Err(ApiError::decode(format!(
                    "message {} of type '{kind}' has a mismatched display_recipient",
                    wire.id
                )));
            }
        };

        Ok(Self {
            id: wire.id,
            sender_id: wire.sender_id,
            sender_email: wire.sender_email,
            sender_full_name: wire.sender_full_name,
            conversation,
            content: wire.content,
        })
    }
}

impl TryFrom<WireEvent> for Event {
    type Error = ApiError;

    fn try_from(wire: WireEvent) -> ApiResult<Self> {
        if wire.event_type != "message" {
            return Ok(Event::other(wire.id, wire.event_type));
        }
        let message = wire
            .message
            .ok_or_else(|| ApiError::decode(format!("message event {} has no message", wire.id)))?;
        Ok(Event::message(
            wire.id,
            message.try_into()?,
            wire.flags.into_iter().collect(),
        ))
    }
}

// =============================================================================
// Request forms
// =============================================================================

/// Form body of `POST /messages`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SendMessageForm<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// JSON list of emails for private messages, stream name otherwise.
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<&'a str>,
    pub content: &'a str,
}

impl<'a> From<&'a Envelope> for SendMessageForm<'a> {
    fn from(envelope: &'a Envelope) -> Self {
        match &envelope.destination {
            Destination::Private { to } => Self {
                kind: "private",
                to: Value::from(to.clone()).to_string(),
                topic: None,
                content: &envelope.content,
            },
            Destination::Stream { stream, topic } => Self {
                kind: "stream",
                to: stream.clone(),
                topic: Some(topic),
                content: &envelope.content,
            },
        }
    }
}

/// Value of the `storage` form field of `PUT /bot_storage`.
pub fn storage_field(entries: &StorageMap) -> ApiResult<String> {
    Ok(serde_json::to_string(entries)?)
}

/// Value of the `event_types` form field of `POST /register`.
pub fn event_types_field() -> String {
    Value::from(vec!["message"]).to_string()
}

#[cfg(test)]
mod tests {
    use parley_core::{ConversationKind, EventKind};
    use serde_json::json;

    use super::*;

    fn private_event() -> Value {
        json!({
            "id": 4,
            "type": "message",
            "flags": ["read"],
            "message": {
                "id": 81,
                "sender_id": 2,
                "sender_email": "alice@example.com",
                "sender_full_name": "Alice",
                "type": "private",
                "display_recipient": [
                    {"id": 1, "email": "bot@example.com", "full_name": "Bot"},
                    {"id": 2, "email": "alice@example.com", "full_name": "Alice"}
                ],
                "subject": "",
                "content": "hello"
            }
        })
    }

    #[test]
    fn test_success_result_decodes_payload() {
        let body = json!({"result": "success", "msg": "", "id": 42});
        let sent: SendResponse = into_result(body).unwrap();
        assert_eq!(sent.id, 42);
    }

    #[test]
    fn test_error_result_maps_code() {
        let body = json!({
            "result": "error",
            "msg": "Bad event queue id: 1518",
            "code": "BAD_EVENT_QUEUE_ID"
        });
        let err = into_result::<EventsResponse>(body).unwrap_err();
        assert!(err.is_bad_event_queue());

        let body = json!({"result": "error", "msg": "Invalid API key"});
        match into_result::<ProfileResponse>(body).unwrap_err() {
            ApiError::Remote { code, msg } => {
                assert_eq!(code, "BAD_REQUEST");
                assert_eq!(msg, "Invalid API key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_fields_are_decode_errors() {
        let body = json!({"result": "success", "msg": ""});
        let err = into_result::<RegisterResponse>(body).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_private_message_event() {
        let wire: WireEvent = serde_json::from_value(private_event()).unwrap();
        let event = Event::try_from(wire).unwrap();
        let EventKind::Message { message, flags } = event.kind else {
            panic!("expected a message event");
        };
        assert!(!flags.is_mentioned());
        assert!(flags.contains("read"));
        assert_eq!(message.kind(), ConversationKind::Private);
        assert!(message.is_private_from_other(1));
        match message.conversation {
            Conversation::Private { recipients } => {
                assert_eq!(recipients.len(), 2);
                assert_eq!(recipients[1].email, "alice@example.com");
            }
            other => panic!("unexpected conversation: {other:?}"),
        }
    }

    #[test]
    fn test_stream_message_event_with_topic_alias() {
        let wire: WireEvent = serde_json::from_value(json!({
            "id": 5,
            "type": "message",
            "flags": ["mentioned"],
            "message": {
                "id": 90,
                "sender_id": 3,
                "type": "stream",
                "display_recipient": "general",
                "topic": "lunch",
                "content": "@**Bot** hi"
            }
        }))
        .unwrap();

        let event = Event::try_from(wire).unwrap();
        let EventKind::Message { message, flags } = event.kind else {
            panic!("expected a message event");
        };
        assert!(flags.is_mentioned());
        assert_eq!(
            message.conversation,
            Conversation::Stream {
                stream: "general".into(),
                topic: "lunch".into()
            }
        );
    }

    #[test]
    fn test_mismatched_recipient_is_rejected() {
        let mut raw = private_event();
        raw["message"]["display_recipient"] = json!("general");
        let wire: WireEvent = serde_json::from_value(raw).unwrap();
        assert!(matches!(Event::try_from(wire), Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_events_response_keeps_broken_entries_raw() {
        let body = json!({
            "result": "success",
            "msg": "",
            "events": [
                {"id": 1, "type": "message", "message": {"id": 7, "sender_id": 2}},
                private_event()
            ]
        });
        let response: EventsResponse = into_result(body).unwrap();
        assert_eq!(response.events.len(), 2);

        let broken = response.events[0].clone();
        assert_eq!(raw_event_id(&broken), Some(1));
        assert!(matches!(
            WireEvent::from_value(broken),
            Err(ApiError::Decode(_))
        ));
        assert_eq!(raw_event_id(&json!({"type": "message"})), None);
    }

    #[test]
    fn test_other_events() {
        let wire: WireEvent =
            serde_json::from_value(json!({"id": 9, "type": "heartbeat"})).unwrap();
        assert!(wire.is_heartbeat());

        let wire: WireEvent =
            serde_json::from_value(json!({"id": 10, "type": "presence"})).unwrap();
        let event = Event::try_from(wire).unwrap();
        assert_eq!(event.event_type(), "presence");
    }

    #[test]
    fn test_send_forms() {
        let private = Envelope::private(["a@example.com", "b@example.com"], "hi");
        let form = SendMessageForm::from(&private);
        assert_eq!(form.kind, "private");
        assert_eq!(form.to, r#"["a@example.com","b@example.com"]"#);
        assert_eq!(form.topic, None);

        let stream = Envelope::stream("general", "lunch", "noon?");
        let form = SendMessageForm::from(&stream);
        assert_eq!(
            form,
            SendMessageForm {
                kind: "stream",
                to: "general".into(),
                topic: Some("lunch"),
                content: "noon?",
            }
        );
    }

    #[test]
    fn test_request_fields() {
        let mut entries = StorageMap::new();
        entries.insert("count".into(), "3".into());
        assert_eq!(storage_field(&entries).unwrap(), r#"{"count":"3"}"#);
        assert_eq!(event_types_field(), r#"["message"]"#);
    }
}

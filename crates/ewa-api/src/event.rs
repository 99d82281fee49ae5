//! Inbound event normalization
//!
//! An invocation arrives in one of three shapes:
//! - a CORS preflight (`requestContext.http.method == "OPTIONS"`)
//! - an HTTP request whose `body` is a JSON string or an already decoded object
//! - a direct invocation where the event itself is the payload
//!
//! [`InboundEvent::classify`] decides the shape once; everything after that
//! works on a [`Payload`] object.
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use serde_json::{Map, Value};

/// Error message returned when neither alias carries a question
pub const MISSING_QUESTION: &str = "Missing \"question\" or \"message\" in request.";

/// Body of an HTTP-shaped event
#[derive(Debug, Clone, PartialEq)]
pub enum EventBody {
    /// JSON-encoded string body
    Text(String),
    /// Body already decoded by the caller
    Object(Map<String, Value>),
    /// Any other JSON value (null, number, array, ...)
    Other(Value),
}

/// The three known inbound shapes
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Preflight,
    Http { body: EventBody },
    Direct(Map<String, Value>),
}

impl InboundEvent {
    /// Classify a raw event
    pub fn classify(event: Value) -> Self {
        if is_preflight(&event) {
            return Self::Preflight;
        }

        let mut fields = match event {
            Value::Object(fields) => fields,
            _ => return Self::Direct(Map::new()),
        };

        match fields.remove("body") {
            Some(Value::String(text)) => Self::Http {
                body: EventBody::Text(text),
            },
            Some(Value::Object(object)) => Self::Http {
                body: EventBody::Object(object),
            },
            Some(other) => Self::Http {
                body: EventBody::Other(other),
            },
            None => Self::Direct(fields),
        }
    }

    /// Locate the payload the question is read from
    ///
    /// Preflight events carry no payload and yield an empty one.
    pub fn into_payload(self) -> Payload {
        match self {
            Self::Preflight => Payload::default(),
            Self::Direct(fields) => Payload(fields),
            Self::Http { body } => match body {
                EventBody::Object(object) => Payload(object),
                EventBody::Other(_) => Payload::default(),
                EventBody::Text(text) => match serde_json::from_str::<Value>(&text) {
                    Ok(Value::Object(object)) => Payload(object),
                    Ok(_) => Payload::default(),
                    Err(e) => {
                        tracing::error!("JSON decode error: {}", e);
                        let mut fallback = Map::new();
                        fallback.insert("body".to_string(), Value::String(text));
                        Payload(fallback)
                    }
                },
            },
        }
    }
}

fn is_preflight(event: &Value) -> bool {
    event
        .pointer("/requestContext/http/method")
        .and_then(Value::as_str)
        == Some("OPTIONS")
}

/// Parsed request payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// First non-empty string among `question` and `message`
    pub fn question(&self) -> Option<&str> {
        ["question", "message"].iter().find_map(|key| {
            self.0
                .get(*key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct SupportRequest {
    pub question: String,
    pub payload: Payload,
}

impl TryFrom<Payload> for SupportRequest {
    type Error = AppError;

    fn try_from(payload: Payload) -> Result<Self, Self::Error> {
        match payload.question().map(str::to_string) {
            Some(question) => Ok(Self { question, payload }),
            None => Err(AppError::Validation {
                message: MISSING_QUESTION.to_string(),
                received: payload.into_value(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question_of(event: Value) -> Option<String> {
        InboundEvent::classify(event)
            .into_payload()
            .question()
            .map(str::to_string)
    }

    #[test]
    fn test_preflight_detection() {
        let event = json!({
            "requestContext": { "http": { "method": "OPTIONS" } },
            "body": "{\"question\": \"ignored\"}"
        });
        assert_eq!(InboundEvent::classify(event), InboundEvent::Preflight);

        let event = json!({ "requestContext": { "http": { "method": "POST" } }, "body": "{}" });
        assert!(matches!(
            InboundEvent::classify(event),
            InboundEvent::Http { .. }
        ));
    }

    #[test]
    fn test_body_shapes_yield_same_question() {
        let expected = Some("How do I book a barber?".to_string());

        assert_eq!(
            question_of(json!({ "body": "{\"question\": \"How do I book a barber?\"}" })),
            expected
        );
        assert_eq!(
            question_of(json!({ "question": "How do I book a barber?" })),
            expected
        );
        assert_eq!(
            question_of(json!({ "body": { "question": "How do I book a barber?" } })),
            expected
        );
    }

    #[test]
    fn test_message_alias_and_precedence() {
        assert_eq!(
            question_of(json!({ "message": "Do you cut kids' hair?" })).as_deref(),
            Some("Do you cut kids' hair?")
        );
        assert_eq!(
            question_of(json!({ "question": "first", "message": "second" })).as_deref(),
            Some("first")
        );
        assert_eq!(
            question_of(json!({ "question": "", "message": "fallback" })).as_deref(),
            Some("fallback")
        );
    }

    #[test]
    fn test_malformed_body_falls_back_to_raw_string() {
        let payload = InboundEvent::classify(json!({ "body": "not valid json" })).into_payload();

        assert_eq!(payload.question(), None);
        assert_eq!(payload.into_value(), json!({ "body": "not valid json" }));
    }

    #[test]
    fn test_non_object_shapes_give_empty_payload() {
        for event in [
            json!({ "body": null }),
            json!({ "body": 42 }),
            json!({ "body": "[1, 2, 3]" }),
            json!("just a string"),
        ] {
            assert_eq!(
                InboundEvent::classify(event).into_payload(),
                Payload::default()
            );
        }
    }

    #[test]
    fn test_non_string_question_is_ignored() {
        assert_eq!(question_of(json!({ "question": 7 })), None);
        assert_eq!(
            question_of(json!({ "question": 7, "message": "Opening hours?" })).as_deref(),
            Some("Opening hours?")
        );
    }

    #[test]
    fn test_whitespace_question_is_kept_and_wins() {
        assert_eq!(question_of(json!({ "question": "   " })).as_deref(), Some("   "));
        assert_eq!(
            question_of(json!({ "question": "   ", "message": "real" })).as_deref(),
            Some("   ")
        );
    }

    #[test]
    fn test_support_request_validation() {
        let payload = InboundEvent::classify(json!({ "topic": "pricing" })).into_payload();
        let err = SupportRequest::try_from(payload).unwrap_err();

        match err {
            AppError::Validation { message, received } => {
                assert_eq!(message, MISSING_QUESTION);
                assert_eq!(received, json!({ "topic": "pricing" }));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_question_is_not_trimmed() {
        let payload = InboundEvent::classify(json!({ "question": "  Price list? " })).into_payload();
        let request = SupportRequest::try_from(payload).unwrap();
        assert_eq!(request.question, "  Price list? ");
    }
}

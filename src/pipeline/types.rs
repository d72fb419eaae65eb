//! Shared types for the inbound-email pipeline.

use serde::{Deserialize, Serialize};

use crate::error::InboundError;

// ── Inbound event ───────────────────────────────────────────────────

/// Outer envelope delivered by the email ingestion webhook.
///
/// `body` is itself a JSON document (an [`InboundEmail`]) encoded as a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub body: String,
}

impl InboundEvent {
    /// Wrap an email the way the ingestion webhook does.
    pub fn from_email(email: &InboundEmail) -> Result<Self, InboundError> {
        let body = serde_json::to_string(email).map_err(InboundError::InvalidPayload)?;
        Ok(Self { body })
    }

    /// Decode the raw outer JSON text.
    pub fn from_json(raw: &str) -> Result<Self, InboundError> {
        serde_json::from_str(raw).map_err(InboundError::InvalidEnvelope)
    }

    /// Decode the inner email payload.
    pub fn email(&self) -> Result<InboundEmail, InboundError> {
        serde_json::from_str(&self.body).map_err(InboundError::InvalidPayload)
    }
}

/// Headers the pipeline reads from the inbound email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailHeaders {
    /// Display sender, e.g. `Alice <alice@example.com>`.
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "Subject")]
    pub subject: String,
}

/// SMTP envelope metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Routing address. Used only for credential lookup.
    pub from: String,
}

/// The decoded inbound email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEmail {
    pub headers: EmailHeaders,
    /// Plain-text body.
    pub plain: String,
    pub envelope: Envelope,
}

impl InboundEmail {
    pub fn new(
        from: impl Into<String>,
        subject: impl Into<String>,
        plain: impl Into<String>,
        envelope_from: impl Into<String>,
    ) -> Self {
        Self {
            headers: EmailHeaders {
                from: from.into(),
                subject: subject.into(),
            },
            plain: plain.into(),
            envelope: Envelope {
                from: envelope_from.into(),
            },
        }
    }

    /// The `From` header as given.
    pub fn sender(&self) -> &str {
        &self.headers.from
    }

    pub fn subject(&self) -> &str {
        self.headers.subject.trim()
    }

    pub fn body(&self) -> &str {
        self.plain.trim()
    }

    pub fn envelope_address(&self) -> &str {
        &self.envelope.from
    }
}

// ── Response ────────────────────────────────────────────────────────

/// Handler result: an HTTP status plus a human-readable body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: body.into(),
        }
    }

    pub fn unauthorized(body: impl Into<String>) -> Self {
        Self {
            status_code: 401,
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT: &str = r#"{
        "body": "{\"headers\": {\"From\": \"Alice <alice@example.com>\", \"Subject\": \"  Offsite  \"}, \"plain\": \"\\n  Please book the venue.\\n\", \"envelope\": {\"from\": \"me@example.com\"}}"
    }"#;

    #[test]
    fn decodes_nested_event() {
        let event = InboundEvent::from_json(EVENT).unwrap();
        let email = event.email().unwrap();
        assert_eq!(email.sender(), "Alice <alice@example.com>");
        assert_eq!(email.subject(), "Offsite");
        assert_eq!(email.body(), "Please book the venue.");
        assert_eq!(email.envelope_address(), "me@example.com");
    }

    #[test]
    fn envelope_and_sender_can_differ() {
        let email = InboundEmail::new("Boss <boss@corp.com>", "s", "b", "me@example.com");
        assert_ne!(email.sender(), email.envelope_address());
    }

    #[test]
    fn from_email_round_trips_through_body_string() {
        let email = InboundEmail::new("a@x.com", "Hi", "Body", "me@x.com");
        let event = InboundEvent::from_email(&email).unwrap();
        let json: serde_json::Value = serde_json::from_str(&event.body).unwrap();
        assert_eq!(json["headers"]["From"], "a@x.com");
        assert_eq!(json["envelope"]["from"], "me@x.com");
    }

    #[test]
    fn bad_outer_json_is_envelope_error() {
        assert!(matches!(
            InboundEvent::from_json("nope"),
            Err(InboundError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn missing_envelope_is_payload_error() {
        let event = InboundEvent {
            body: r#"{"headers": {"From": "a", "Subject": "b"}, "plain": "c"}"#.into(),
        };
        assert!(matches!(event.email(), Err(InboundError::InvalidPayload(_))));
    }

    #[test]
    fn response_uses_status_code_key() {
        let json = serde_json::to_value(HandlerResponse::unauthorized("no")).unwrap();
        assert_eq!(json, serde_json::json!({"statusCode": 401, "body": "no"}));
    }
}

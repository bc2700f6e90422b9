// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Wire format for cross-window calls
//!
//! Requests travel as one JSON object. Responses are positional:
//!
//! ```text
//! tag U+E000 payloadJSON U+E000 prefsJSON U+E000 configJSON [U+E000 callId]
//! ```
//!
//! Absent or empty JSON segments decode to `{}`. The trailing call id is
//! optional so four-field replies from older CMS builds still decode.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Field separator for response envelopes (private use area)
pub const FIELD_SEPARATOR: char = '\u{E000}';

/// Operation requested from the counterpart window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    /// Read-only query
    #[serde(rename = "request")]
    Request,
    /// Request whose result replaces content in the CMS window
    #[serde(rename = "update", alias = "xupdater")]
    Update,
    /// Ask the other window a question and wait for the answer
    #[serde(rename = "info-query", alias = "wininfo")]
    InfoQuery,
}

impl OperationType {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Request => "request",
            OperationType::Update => "update",
            OperationType::InfoQuery => "info-query",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "request" => Ok(OperationType::Request),
            "update" | "xupdater" => Ok(OperationType::Update),
            "info-query" | "wininfo" => Ok(OperationType::InfoQuery),
            other => Err(Error::UnknownOperation(other.to_string())),
        }
    }
}

/// Correlation id echoed back by the responding window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(u64);

impl CallId {
    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for CallId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CallId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(CallId)
            .map_err(|e| Error::malformed("callId", e))
    }
}

/// HTTP method the remote side should use against the CMS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
}

/// Caller options carried in the request envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    /// CMS base URL; its origin addresses the message and validates replies
    #[serde(rename = "cmsURL")]
    pub cms_url: String,
    /// CGI application, e.g. `story.pl`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cms_app: Option<String>,
    /// HTTP method for the CMS request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    /// Name of the CMS form the result should be rendered into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    /// Question for info queries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Request parameters
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl RequestOptions {
    /// Options addressed to a CMS
    pub fn new(cms_url: impl Into<String>) -> Self {
        Self {
            cms_url: cms_url.into(),
            ..Default::default()
        }
    }

    /// Set the CGI application
    pub fn app(mut self, app: impl Into<String>) -> Self {
        self.cms_app = Some(app.into());
        self
    }

    /// Set the HTTP method
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the target form
    pub fn form(mut self, form: impl Into<String>) -> Self {
        self.form = Some(form.into());
        self
    }

    /// Set the info-query question
    pub fn question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    /// Add a request parameter
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// Request sent to the counterpart window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingEnvelope {
    /// Operation type
    #[serde(rename = "type")]
    pub operation: OperationType,
    /// Correlation id; absent from legacy callers
    #[serde(rename = "callId", default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<CallId>,
    /// Caller options
    #[serde(flatten)]
    pub options: RequestOptions,
}

impl OutgoingEnvelope {
    /// Serialize for `postMessage`
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a received request
    pub fn decode(data: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(data).map_err(|e| Error::malformed("request", e))?;

        // Surface unknown operation names as protocol errors, not JSON noise
        if let Some(op) = value.get("type").and_then(Value::as_str) {
            op.parse::<OperationType>()?;
        }

        serde_json::from_value(value).map_err(|e| Error::malformed("request", e))
    }
}

/// Response tag naming the caller handler to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseTag {
    OnComplete,
    OnFailure,
    OnException,
    /// Info-query answer; more messages follow
    Response,
    /// Info-query end
    Finish,
}

impl ResponseTag {
    /// All tags, in handler-table order
    pub const ALL: [ResponseTag; 5] = [
        ResponseTag::OnComplete,
        ResponseTag::OnFailure,
        ResponseTag::OnException,
        ResponseTag::Response,
        ResponseTag::Finish,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseTag::OnComplete => "onComplete",
            ResponseTag::OnFailure => "onFailure",
            ResponseTag::OnException => "onException",
            ResponseTag::Response => "response",
            ResponseTag::Finish => "finish",
        }
    }

    /// Whether this tag ends the call
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ResponseTag::Response)
    }
}

impl fmt::Display for ResponseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ResponseTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| Error::UnknownTag(s.to_string()))
    }
}

/// Response received from the counterpart window
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingEnvelope {
    /// Handler to run
    pub tag: ResponseTag,
    /// Primary payload (CMS JSON response)
    pub payload: Value,
    /// User preferences
    pub prefs: Value,
    /// CMS configuration
    pub config: Value,
    /// Echoed correlation id
    pub call_id: Option<CallId>,
}

impl IncomingEnvelope {
    /// Envelope with empty objects for every segment
    pub fn new(tag: ResponseTag) -> Self {
        Self {
            tag,
            payload: empty_object(),
            prefs: empty_object(),
            config: empty_object(),
            call_id: None,
        }
    }

    /// Set the primary payload
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Set the correlation id
    pub fn with_call_id(mut self, call_id: Option<CallId>) -> Self {
        self.call_id = call_id;
        self
    }

    /// Join the fields into one message string
    pub fn encode(&self) -> String {
        let mut fields = vec![
            self.tag.as_str().to_string(),
            encode_json(&self.payload),
            encode_json(&self.prefs),
            encode_json(&self.config),
        ];
        if let Some(id) = self.call_id {
            fields.push(id.to_string());
        }
        fields.join(&FIELD_SEPARATOR.to_string())
    }

    /// Trailing call id of a raw message, read without parsing the JSON fields
    pub fn peek_call_id(data: &str) -> Option<CallId> {
        data.splitn(5, FIELD_SEPARATOR).nth(4)?.trim().parse().ok()
    }

    /// Split and parse a message string
    pub fn decode(data: &str) -> Result<Self> {
        let mut parts = data.splitn(5, FIELD_SEPARATOR);

        let tag = parts.next().unwrap_or_default().parse::<ResponseTag>()?;
        let payload = decode_json("payload", parts.next())?;
        let prefs = decode_json("prefs", parts.next())?;
        let config = decode_json("config", parts.next())?;
        let call_id = match parts.next().map(str::trim) {
            None | Some("") => None,
            Some(id) => Some(id.parse::<CallId>()?),
        };

        Ok(Self {
            tag,
            payload,
            prefs,
            config,
            call_id,
        })
    }
}

/// `{}`
pub fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// JSON text with the separator escaped; it can only occur inside strings
fn encode_json(value: &Value) -> String {
    value.to_string().replace(FIELD_SEPARATOR, "\\ue000")
}

fn decode_json(field: &str, segment: Option<&str>) -> Result<Value> {
    match segment.map(str::trim) {
        None | Some("") => Ok(empty_object()),
        Some(text) => serde_json::from_str(text).map_err(|e| Error::malformed(field, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_envelope_fields() {
        let envelope = OutgoingEnvelope {
            operation: OperationType::Request,
            call_id: Some(CallId::from(9)),
            options: RequestOptions::new("https://cms.example.com")
                .app("story.pl")
                .method(HttpMethod::Get)
                .param("storyId", 42),
        };

        let wire: Value = serde_json::from_str(&envelope.encode().unwrap()).unwrap();
        assert_eq!(wire["type"], "request");
        assert_eq!(wire["callId"], 9);
        assert_eq!(wire["cmsURL"], "https://cms.example.com");
        assert_eq!(wire["cmsApp"], "story.pl");
        assert_eq!(wire["method"], "get");
        assert_eq!(wire["params"]["storyId"], 42);
        assert!(wire.get("form").is_none());
    }

    #[test]
    fn test_legacy_operation_names() {
        let env = OutgoingEnvelope::decode(
            r#"{"type":"xupdater","cmsURL":"https://cms.example.com","form":"edit"}"#,
        )
        .unwrap();
        assert_eq!(env.operation, OperationType::Update);
        assert_eq!(env.call_id, None);
        assert_eq!(env.options.form.as_deref(), Some("edit"));

        assert_eq!("wininfo".parse::<OperationType>().unwrap(), OperationType::InfoQuery);
        assert!(matches!(
            OutgoingEnvelope::decode(r#"{"type":"delete","cmsURL":"x"}"#),
            Err(Error::UnknownOperation(_))
        ));
    }

    #[test]
    fn test_response_round_trip() {
        let envelope = IncomingEnvelope {
            tag: ResponseTag::OnComplete,
            payload: json!({"status": "ok", "msg": "Story 42 saved", "weird": "a\u{E000}b"}),
            prefs: json!({"message_timeout": 5}),
            config: json!({"cms_root": "https://cms.example.com"}),
            call_id: Some(CallId::from(3)),
        };

        let decoded = IncomingEnvelope::decode(&envelope.encode()).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_decode_legacy_four_fields() {
        let data = "onComplete\u{E000}{\"status\":\"ok\"}\u{E000}{}\u{E000}{}";
        let env = IncomingEnvelope::decode(data).unwrap();
        assert_eq!(env.tag, ResponseTag::OnComplete);
        assert_eq!(env.payload, json!({"status": "ok"}));
        assert_eq!(env.prefs, json!({}));
        assert_eq!(env.call_id, None);
    }

    #[test]
    fn test_missing_and_empty_fields_decode_to_empty_object() {
        let env = IncomingEnvelope::decode("finish").unwrap();
        assert_eq!(env.payload, json!({}));
        assert_eq!(env.config, json!({}));

        let env = IncomingEnvelope::decode("onComplete\u{E000}\u{E000}{\"a\":1}").unwrap();
        assert_eq!(env.payload, json!({}));
        assert_eq!(env.prefs, json!({"a": 1}));
        assert_eq!(env.config, json!({}));
    }

    #[test]
    fn test_decode_errors() {
        let err = IncomingEnvelope::decode("onComplete\u{E000}{not json").unwrap_err();
        assert!(err.is_critical());
        assert!(err.to_string().contains("payload"));

        let err = IncomingEnvelope::decode("onSomething\u{E000}{}").unwrap_err();
        assert!(matches!(err, Error::UnknownTag(ref t) if t == "onSomething"));

        let err = IncomingEnvelope::decode("finish\u{E000}{}\u{E000}{}\u{E000}{}\u{E000}abc").unwrap_err();
        assert!(err.is_critical());
    }

    #[test]
    fn test_peek_call_id_of_undecodable_message() {
        let data = "onComplete\u{E000}{oops\u{E000}{}\u{E000}{}\u{E000}12";
        assert!(IncomingEnvelope::decode(data).is_err());
        assert_eq!(IncomingEnvelope::peek_call_id(data), Some(CallId::from(12)));
        assert_eq!(IncomingEnvelope::peek_call_id("onComplete\u{E000}{oops"), None);
    }

    #[test]
    fn test_terminal_tags() {
        assert!(ResponseTag::OnComplete.is_terminal());
        assert!(ResponseTag::Finish.is_terminal());
        assert!(!ResponseTag::Response.is_terminal());
    }
}

// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! CMS-window side of the cross-window RPC
//!
//! The responder accepts requests only from the one origin it serves,
//! hands them to a [`RequestService`] and posts every reply back to the
//! requesting window, restricted to that window's origin.

use serde_json::{json, Value};

use super::envelope::{empty_object, CallId, IncomingEnvelope, OutgoingEnvelope, ResponseTag};
use super::transport::RequestService;
use crate::error::{Error, Result};
use crate::window::{Delivery, Inbox, MessageEvent, Origin, TargetOrigin, WindowHandle};

/// A validated request together with its reply path
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub envelope: OutgoingEnvelope,
    /// Origin of the requesting window
    pub origin: Origin,
    pub reply_to: WindowHandle,
}

impl InboundRequest {
    pub fn call_id(&self) -> Option<CallId> {
        self.envelope.call_id
    }
}

/// One response message
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub tag: ResponseTag,
    pub payload: Value,
    pub prefs: Value,
    pub config: Value,
}

impl Reply {
    pub fn new(tag: ResponseTag, payload: Value) -> Self {
        Self {
            tag,
            payload,
            prefs: empty_object(),
            config: empty_object(),
        }
    }

    /// Successful CMS response
    pub fn complete(payload: Value) -> Self {
        Self::new(ResponseTag::OnComplete, payload)
    }

    /// CMS answered with an error status
    pub fn failure(payload: Value) -> Self {
        Self::new(ResponseTag::OnFailure, payload)
    }

    /// The request could not be carried out
    pub fn exception(message: impl Into<String>) -> Self {
        Self::new(ResponseTag::OnException, json!({ "error": message.into() }))
    }

    /// Info-query answer
    pub fn response(answer: Value) -> Self {
        Self::new(ResponseTag::Response, answer)
    }

    /// Info-query end
    pub fn finish() -> Self {
        Self::new(ResponseTag::Finish, empty_object())
    }

    /// Attach user preferences
    pub fn with_prefs(mut self, prefs: Value) -> Self {
        self.prefs = prefs;
        self
    }

    /// Attach CMS configuration
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// Envelope answering `call_id`
    pub fn into_envelope(self, call_id: Option<CallId>) -> IncomingEnvelope {
        IncomingEnvelope {
            tag: self.tag,
            payload: self.payload,
            prefs: self.prefs,
            config: self.config,
            call_id,
        }
    }
}

/// Request handler living in the CMS window
#[derive(Debug)]
pub struct Responder {
    window: WindowHandle,
    inbox: Inbox,
    allowed: Origin,
}

impl Responder {
    /// Serve requests arriving at `window` from `allowed_origin`
    pub fn new(window: WindowHandle, inbox: Inbox, allowed_origin: &str) -> Result<Self> {
        Ok(Self {
            window,
            inbox,
            allowed: Origin::parse(allowed_origin)?,
        })
    }

    pub fn window(&self) -> &WindowHandle {
        &self.window
    }

    /// Validate and decode a request event
    pub fn accept(&self, event: &MessageEvent) -> Result<InboundRequest> {
        if !self.allowed.matches(&event.origin) {
            tracing::warn!(origin = %event.origin, expected = %self.allowed, "Refusing request");
            return Err(Error::origin_rejected(&event.origin, self.allowed.serialize()));
        }

        let reply_to = event
            .source
            .clone()
            .ok_or_else(|| Error::malformed("source", "message event has no source window"))?;
        let envelope = OutgoingEnvelope::decode(&event.data)?;

        tracing::debug!(
            operation = %envelope.operation,
            call = ?envelope.call_id.map(|id| id.as_u64()),
            "Accepted request"
        );
        Ok(InboundRequest {
            envelope,
            origin: self.allowed.clone(),
            reply_to,
        })
    }

    /// Post `reply` to the requesting window
    pub fn reply(&self, request: &InboundRequest, reply: Reply) -> Result<Delivery> {
        let tag = reply.tag;
        let data = reply.into_envelope(request.call_id()).encode();
        tracing::debug!(tag = %tag, to = %request.reply_to.id(), "Posting response");
        self.window.post_to(
            &request.reply_to,
            data,
            &TargetOrigin::Exact(request.origin.clone()),
        )
    }

    /// Handle the next request; `Ok(None)` once the inbox is closed
    pub async fn serve_one(&mut self, service: &dyn RequestService) -> Result<Option<usize>> {
        let Some(event) = self.inbox.recv().await else {
            return Ok(None);
        };

        let request = self.accept(&event)?;
        let replies = service.handle(&request.envelope).await;
        let count = replies.len();
        for reply in replies {
            self.reply(&request, reply)?;
        }
        Ok(Some(count))
    }

    /// Serve until the inbox closes, skipping requests that fail
    pub async fn serve(&mut self, service: &dyn RequestService) -> Result<()> {
        loop {
            match self.serve_one(service).await {
                Ok(Some(_)) => {}
                Ok(None) => return Ok(()),
                Err(e @ Error::WindowClosed(_)) => return Err(e),
                Err(e) => tracing::warn!(error = %e, "Request not served"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::envelope::{OperationType, RequestOptions};
    use crate::rpc::transport::WindowInfoService;
    use crate::window::open_window;

    fn windows() -> (WindowHandle, Inbox, Responder) {
        let (preview, preview_inbox) = open_window("https://www.example.com/story.html").unwrap();
        let (cms, cms_inbox) = open_window("https://cms.example.com/krang/").unwrap();
        let responder = Responder::new(cms, cms_inbox, "https://www.example.com").unwrap();
        (preview, preview_inbox, responder)
    }

    fn request(call_id: u64) -> String {
        OutgoingEnvelope {
            operation: OperationType::InfoQuery,
            call_id: Some(CallId::from(call_id)),
            options: RequestOptions::new("https://cms.example.com").question("isStoryOnEditScreen"),
        }
        .encode()
        .unwrap()
    }

    #[test]
    fn test_accept_rejects_foreign_origin() {
        let (_preview, _inbox, responder) = windows();
        let (evil, _) = open_window("https://evil.example.com/").unwrap();

        let err = responder.accept(&evil.message(request(1))).unwrap_err();
        assert!(err.is_security_violation());
    }

    #[test]
    fn test_accept_requires_source() {
        let (_preview, _inbox, responder) = windows();
        let event = MessageEvent::new("https://www.example.com", request(1));
        assert!(responder.accept(&event).unwrap_err().is_critical());
    }

    #[tokio::test]
    async fn test_reply_echoes_call_id() {
        let (preview, mut preview_inbox, responder) = windows();
        let request = responder.accept(&preview.message(request(77))).unwrap();

        let delivery = responder
            .reply(&request, Reply::complete(json!({"status": "ok"})).with_prefs(json!({"message_timeout": 3})))
            .unwrap();
        assert_eq!(delivery, Delivery::Delivered);

        let event = preview_inbox.recv().await.unwrap();
        assert_eq!(event.origin, "https://cms.example.com");
        let envelope = IncomingEnvelope::decode(&event.data).unwrap();
        assert_eq!(envelope.tag, ResponseTag::OnComplete);
        assert_eq!(envelope.call_id, Some(CallId::from(77)));
        assert_eq!(envelope.prefs["message_timeout"], 3);
    }

    #[tokio::test]
    async fn test_serve_one_info_query() {
        let (preview, mut preview_inbox, mut responder) = windows();
        preview
            .post_to(responder.window(), request(5), &TargetOrigin::Any)
            .unwrap();

        let service = WindowInfoService::new(|question: &str| json!(question == "isStoryOnEditScreen"));
        let count = responder.serve_one(&service).await.unwrap();
        assert_eq!(count, Some(2));

        let first = IncomingEnvelope::decode(&preview_inbox.recv().await.unwrap().data).unwrap();
        let second = IncomingEnvelope::decode(&preview_inbox.recv().await.unwrap().data).unwrap();
        assert_eq!(first.tag, ResponseTag::Response);
        assert_eq!(first.payload, json!(true));
        assert_eq!(second.tag, ResponseTag::Finish);
        assert_eq!(second.call_id, Some(CallId::from(5)));
    }
}

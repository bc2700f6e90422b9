// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request/response correlation between two windows
//!
//! An [`RpcChannel`] lives in the calling window (typically the preview
//! popup) and talks to one CMS origin. Every [`invoke`](RpcChannel::invoke)
//! serializes a request, shows the busy indicator and posts the request to
//! the CMS window. Responses come back through the window's inbox and are
//! routed to the handler table of the call named by the echoed call id.
//!
//! A message from any other origin aborts the whole exchange: every call that
//! is still waiting is rejected and none of its handlers run.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::time::Instant;

use super::config::ChannelConfig;
use super::envelope::{CallId, IncomingEnvelope, OperationType, OutgoingEnvelope, RequestOptions, ResponseTag};
use super::handler::Handlers;
use super::indicator::LoadIndicator;
use crate::error::{Error, Result};
use crate::ui::{AlertPopup, MessageBoard, Notifier, Preferences, UiReporter};
use crate::window::{Delivery, Inbox, MessageEvent, MessageTarget, Origin, TargetOrigin, WindowHandle};

/// Lifecycle of one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Created, not yet posted
    Idle,
    /// Posted; waiting for a terminal response
    AwaitingResponse,
    /// A terminal response was dispatched
    Resolved,
    /// Aborted by a message from a foreign origin
    OriginRejected,
    /// Dropped after the call timeout
    Expired,
    /// Its response could not be decoded
    Aborted,
}

impl CallState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, CallState::Idle | CallState::AwaitingResponse)
    }
}

/// One in-flight call
#[derive(Debug)]
pub struct PendingCall {
    pub call_id: CallId,
    pub operation: OperationType,
    /// Origin the request was addressed to and replies must come from
    pub target_origin: Origin,
    pub created_at: DateTime<Utc>,
    pub state: CallState,
    started: Instant,
    handlers: Handlers,
}

/// Outcome of processing one message
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// A handler ran
    Handled {
        call_id: CallId,
        tag: ResponseTag,
        /// The call is finished
        settled: bool,
    },
    /// The message was valid but nothing ran
    Ignored(IgnoreReason),
    /// Calls dropped after the call timeout
    Expired(Vec<CallId>),
}

/// Why a message was not dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No listener is registered
    NotListening,
    /// The call id is unknown or already settled
    UnknownCall(CallId),
    /// A response without call id arrived while nothing was pending
    NoPendingCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listener {
    Detached,
    Attached,
    /// Removed once `until` passes
    Draining { until: Instant },
}

/// Calling side of the cross-window RPC
pub struct RpcChannel {
    window: WindowHandle,
    inbox: Inbox,
    cms_url: String,
    cms_origin: Origin,
    config: ChannelConfig,
    indicator: LoadIndicator,
    board: MessageBoard,
    notifier: Arc<dyn Notifier>,
    pending: VecDeque<PendingCall>,
    settled: VecDeque<(CallId, CallState)>,
    listener: Listener,
    last_call_id: u64,
}

impl fmt::Debug for RpcChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcChannel")
            .field("window", &self.window.id())
            .field("cms_origin", &self.cms_origin.serialize())
            .field("pending", &self.pending.len())
            .field("listener", &self.listener)
            .finish()
    }
}

impl RpcChannel {
    /// Channel for `window` talking to the CMS at `cms_url`
    pub fn new(window: WindowHandle, inbox: Inbox, cms_url: &str) -> Result<Self> {
        let cms_origin = Origin::parse(cms_url)?;

        Ok(Self {
            window,
            inbox,
            cms_url: cms_url.to_string(),
            cms_origin,
            config: ChannelConfig::default(),
            indicator: LoadIndicator::new(),
            board: MessageBoard::new(),
            notifier: Arc::new(UiReporter::new()),
            pending: VecDeque::new(),
            settled: VecDeque::new(),
            listener: Listener::Detached,
            last_call_id: 0,
        })
    }

    /// Set the configuration
    pub fn with_config(mut self, config: ChannelConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the busy indicator
    pub fn with_indicator(mut self, indicator: LoadIndicator) -> Self {
        self.indicator = indicator;
        self
    }

    /// Set the message board used by the completion hook
    pub fn with_board(mut self, board: MessageBoard) -> Self {
        self.board = board;
        self
    }

    /// Set where critical errors and alerts go
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn cms_origin(&self) -> &Origin {
        &self.cms_origin
    }

    pub fn indicator(&self) -> &LoadIndicator {
        &self.indicator
    }

    pub fn board(&self) -> &MessageBoard {
        &self.board
    }

    pub fn window(&self) -> &WindowHandle {
        &self.window
    }

    /// Calls still waiting for a terminal response
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// State of a pending or recently settled call
    pub fn call_state(&self, call_id: CallId) -> Option<CallState> {
        self.pending
            .iter()
            .find(|c| c.call_id == call_id)
            .map(|c| c.state)
            .or_else(|| {
                self.settled
                    .iter()
                    .rev()
                    .find(|(id, _)| *id == call_id)
                    .map(|(_, state)| *state)
            })
    }

    /// Whether incoming messages are currently processed
    pub fn is_listening(&self) -> bool {
        match self.listener {
            Listener::Detached => false,
            Listener::Attached => true,
            Listener::Draining { until } => Instant::now() < until,
        }
    }

    /// Post a call to `target` and register its handlers
    pub fn invoke(
        &mut self,
        operation: OperationType,
        target: &dyn MessageTarget,
        options: RequestOptions,
        handlers: Handlers,
    ) -> Result<CallId> {
        let target_origin = Origin::parse(&options.cms_url)?;
        if target_origin != self.cms_origin {
            return Err(Error::Config(format!(
                "channel is bound to {}, call addressed to {}",
                self.cms_origin, target_origin
            )));
        }

        self.last_call_id += 1;
        let call_id = CallId::from(self.last_call_id);
        let mut call = PendingCall {
            call_id,
            operation,
            target_origin: target_origin.clone(),
            created_at: Utc::now(),
            state: CallState::Idle,
            started: Instant::now(),
            handlers,
        };

        let message = OutgoingEnvelope {
            operation,
            call_id: Some(call_id),
            options,
        }
        .encode()?;

        self.indicator.show();
        self.listener = Listener::Attached;

        tracing::debug!(call = %call_id, target = %target.window_id(), %message, "Posting request");
        let delivery = self
            .window
            .post_to(target, message, &TargetOrigin::Exact(target_origin));

        match delivery {
            Ok(Delivery::Delivered) => {}
            Ok(Delivery::Dropped) => {
                tracing::warn!(call = %call_id, "Request not delivered; target window has another origin");
            }
            Err(e) => {
                if self.pending.is_empty() {
                    self.indicator.hide();
                    self.listener = Listener::Detached;
                }
                return Err(e);
            }
        }

        call.state = CallState::AwaitingResponse;
        self.pending.push_back(call);
        Ok(call_id)
    }

    /// Read-only request
    pub fn request(
        &mut self,
        target: &dyn MessageTarget,
        options: RequestOptions,
        handlers: Handlers,
    ) -> Result<CallId> {
        self.invoke(OperationType::Request, target, options, handlers)
    }

    /// Content-replacing request
    pub fn update(
        &mut self,
        target: &dyn MessageTarget,
        options: RequestOptions,
        handlers: Handlers,
    ) -> Result<CallId> {
        self.invoke(OperationType::Update, target, options, handlers)
    }

    /// Question answered with `response` then `finish`
    pub fn info_query(
        &mut self,
        target: &dyn MessageTarget,
        options: RequestOptions,
        handlers: Handlers,
    ) -> Result<CallId> {
        self.invoke(OperationType::InfoQuery, target, options, handlers)
    }

    /// Process one `message` event
    pub fn handle_message(&mut self, event: &MessageEvent) -> Result<Dispatch> {
        if !self.is_listening() {
            self.listener = Listener::Detached;
            return Ok(Dispatch::Ignored(IgnoreReason::NotListening));
        }

        if !self.cms_origin.matches(&event.origin) {
            return Err(self.reject_origin(&event.origin));
        }

        self.indicator.hide();

        tracing::debug!(origin = %event.origin, data = %event.data, "Response data from CMS");
        let envelope = match IncomingEnvelope::decode(&event.data) {
            Ok(envelope) => envelope,
            Err(e) => {
                if e.is_critical() {
                    self.notifier.critical_error(&e.to_string());
                    self.abort_undecodable(&event.data);
                } else {
                    tracing::error!(error = %e, "Cannot dispatch response");
                }
                return Err(e);
            }
        };

        let index = match envelope.call_id {
            Some(id) => match self.pending.iter().position(|c| c.call_id == id) {
                Some(index) => index,
                None => {
                    tracing::debug!(call = %id, tag = %envelope.tag, "Response for unknown call");
                    return Ok(Dispatch::Ignored(IgnoreReason::UnknownCall(id)));
                }
            },
            None if self.pending.is_empty() => {
                return Ok(Dispatch::Ignored(IgnoreReason::NoPendingCall));
            }
            // Replies without a call id belong to the oldest call
            None => 0,
        };

        Ok(self.dispatch(index, envelope))
    }

    fn dispatch(&mut self, index: usize, envelope: IncomingEnvelope) -> Dispatch {
        let IncomingEnvelope {
            tag,
            payload,
            prefs,
            config,
            ..
        } = envelope;

        let call_id = {
            let call = &mut self.pending[index];
            call.handlers.call(tag, &payload, &prefs, &config);
            call.call_id
        };

        if self.config.apply_default_hooks {
            self.run_default_hook(tag, &payload, &prefs);
        }

        let settled = tag.is_terminal();
        if settled {
            if let Some(call) = self.pending.remove(index) {
                self.settle(call.call_id, CallState::Resolved);
            }
            tracing::debug!(call = %call_id, tag = %tag, remaining = self.pending.len(), "Call resolved");
            if self.pending.is_empty() {
                self.begin_drain();
            }
        }

        Dispatch::Handled {
            call_id,
            tag,
            settled,
        }
    }

    /// Settle the call a malformed response was meant for, without running
    /// any handler
    fn abort_undecodable(&mut self, data: &str) {
        let index = match IncomingEnvelope::peek_call_id(data) {
            Some(id) => self.pending.iter().position(|c| c.call_id == id),
            None if self.pending.len() == 1 => Some(0),
            None => None,
        };
        let Some(call) = index.and_then(|index| self.pending.remove(index)) else {
            return;
        };

        tracing::warn!(call = %call.call_id, operation = %call.operation, "Call aborted by malformed response");
        self.settle(call.call_id, CallState::Aborted);
        if self.pending.is_empty() {
            self.begin_drain();
        }
    }

    fn run_default_hook(&self, tag: ResponseTag, payload: &Value, prefs: &Value) {
        match tag {
            ResponseTag::OnComplete => {
                let timeout = Preferences::from_value(prefs).message_timeout();
                self.board.apply_response(payload, timeout);
            }
            ResponseTag::OnFailure => self.notifier.alert(AlertPopup::failure(&self.cms_url)),
            ResponseTag::OnException => self.notifier.alert(AlertPopup::exception(&self.cms_url)),
            ResponseTag::Response | ResponseTag::Finish => {}
        }
    }

    fn reject_origin(&mut self, origin: &str) -> Error {
        let err = Error::origin_rejected(origin, self.cms_origin.serialize());
        tracing::warn!(
            origin,
            expected = %self.cms_origin,
            rejected_calls = self.pending.len(),
            "Cross document message from unauthorized origin"
        );

        while let Some(call) = self.pending.pop_front() {
            self.settle(call.call_id, CallState::OriginRejected);
        }
        self.indicator.hide();
        self.listener = Listener::Detached;
        self.notifier.critical_error(&err.to_string());
        err
    }

    fn settle(&mut self, call_id: CallId, state: CallState) {
        self.settled.push_back((call_id, state));
        while self.settled.len() > self.config.history_limit {
            self.settled.pop_front();
        }
    }

    fn begin_drain(&mut self) {
        self.listener = Listener::Draining {
            until: Instant::now() + self.config.grace_delay,
        };
    }

    /// Drop calls older than the call timeout, firing their `onFailure`
    pub fn expire_stale(&mut self) -> Vec<CallId> {
        let Some(timeout) = self.config.call_timeout else {
            return Vec::new();
        };

        let now = Instant::now();
        let mut expired = Vec::new();
        let mut kept = VecDeque::with_capacity(self.pending.len());

        while let Some(mut call) = self.pending.pop_front() {
            if now.duration_since(call.started) < timeout {
                kept.push_back(call);
                continue;
            }

            tracing::warn!(call = %call.call_id, operation = %call.operation, "Call timed out");
            let payload = json!({
                "status": "timeout",
                "msg": Error::timeout(call.operation.as_str(), timeout.as_millis() as u64).to_string(),
            });
            let empty = json!({});
            call.handlers.call(ResponseTag::OnFailure, &payload, &empty, &empty);
            expired.push(call.call_id);
            self.settle(call.call_id, CallState::Expired);
        }
        self.pending = kept;

        if !expired.is_empty() && self.pending.is_empty() {
            self.indicator.hide();
            self.begin_drain();
        }
        expired
    }

    fn next_deadline(&self) -> Option<Instant> {
        let timeout = self.config.call_timeout?;
        self.pending.iter().map(|c| c.started + timeout).min()
    }

    /// Wait for the next message and dispatch it
    ///
    /// Returns `Ok(None)` once the listener is removed or the window's
    /// inbox is closed.
    pub async fn recv(&mut self) -> Result<Option<Dispatch>> {
        let deadline = match self.listener {
            Listener::Detached => return Ok(None),
            Listener::Attached => self.next_deadline(),
            Listener::Draining { until } => Some(until),
        };

        let event = match deadline {
            None => self.inbox.recv().await,
            Some(deadline) => match tokio::time::timeout_at(deadline, self.inbox.recv()).await {
                Ok(event) => event,
                Err(_) => {
                    if let Listener::Draining { .. } = self.listener {
                        tracing::debug!(window = %self.window.id(), "Removing message listener");
                        self.listener = Listener::Detached;
                        return Ok(None);
                    }
                    return Ok(Some(Dispatch::Expired(self.expire_stale())));
                }
            },
        };

        match event {
            Some(event) => self.handle_message(&event).map(Some),
            None => Ok(None),
        }
    }

    /// [`recv`](Self::recv) bounded by `timeout`
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<Dispatch>> {
        tokio::time::timeout(timeout, self.recv())
            .await
            .map_err(|_| Error::timeout("waiting for response", timeout.as_millis() as u64))?
    }

    /// Dispatch messages until every call settles and the listener is removed
    pub async fn run_until_settled(&mut self) -> Result<()> {
        while self.recv().await?.is_some() {}
        Ok(())
    }

    /// Dispatch every message already queued, without waiting
    pub fn drain(&mut self) -> Vec<Result<Dispatch>> {
        let mut results = Vec::new();
        while let Some(event) = self.inbox.try_recv() {
            results.push(self.handle_message(&event));
        }
        results
    }
}

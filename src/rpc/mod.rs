// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Cross-window RPC
//!
//! The calling window uses an [`RpcChannel`]; the CMS window answers through
//! a [`Responder`] backed by a [`RequestService`].

mod channel;
mod config;
mod envelope;
mod handler;
mod indicator;
mod responder;
mod transport;

pub use channel::{CallState, Dispatch, IgnoreReason, PendingCall, RpcChannel};
pub use config::ChannelConfig;
pub use envelope::{
    empty_object, CallId, HttpMethod, IncomingEnvelope, OperationType, OutgoingEnvelope,
    RequestOptions, ResponseTag, FIELD_SEPARATOR,
};
pub use handler::{Callback, Handlers};
pub use indicator::{LoadIndicator, DEFAULT_INDICATOR_ID};
pub use responder::{InboundRequest, Reply, Responder};
pub use transport::{
    CmsService, HttpRequestService, HttpServiceConfig, RequestService, WindowInfoService,
    DEFAULT_USER_AGENT,
};

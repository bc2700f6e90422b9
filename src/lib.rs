// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # Krang XWin - Cross-Window RPC for the Krang CMS UI
//!
//! Lets a window served from one origin (typically a story preview) ask the
//! CMS window on another origin to run requests on its behalf. Requests go
//! out as JSON over `postMessage`; responses come back as
//! `U+E000`-separated envelopes and are routed to the handlers of the call
//! they answer. Messages from any other origin abort the exchange.
//!
//! ## Features
//!
//! - RPC channel: request/update/info-query calls with per-call handlers
//! - Responder: CMS-side request service backed by an HTTP transport
//! - Origin checks: foreign origins reject every waiting call
//! - Behaviour rules: CSS selectors mapped to element initializers
//! - Preview editor: overlay state, label jumps and the template finder
//! - UI collaborators: message stacks, alerts, cookie-backed preferences
//!
//! ## Example
//!
//! ```rust,no_run
//! use krang_xwin::rpc::{Handlers, RequestOptions, RpcChannel};
//! use krang_xwin::window::open_window;
//!
//! #[tokio::main]
//! async fn main() -> krang_xwin::Result<()> {
//!     let (preview, inbox) = open_window("https://www.example.com/story.html")?;
//!     let (cms, _cms_inbox) = open_window("https://cms.example.com/krang/")?;
//!
//!     let mut channel = RpcChannel::new(preview, inbox, "https://cms.example.com")?;
//!     channel.request(
//!         &cms,
//!         RequestOptions::new("https://cms.example.com")
//!             .app("story.pl")
//!             .param("rm", "pe_get_status"),
//!         Handlers::new().on_complete(|status, _prefs, _config| println!("{}", status)),
//!     )?;
//!
//!     channel.run_until_settled().await
//! }
//! ```

pub mod behaviour;
pub mod dom;
pub mod error;
pub mod helpers;
pub mod preview;
pub mod rpc;
pub mod ui;
pub mod window;

// Re-exports for convenience

// RPC
pub use rpc::{
    CallId, CallState, ChannelConfig, Dispatch, Handlers, IncomingEnvelope, OperationType,
    OutgoingEnvelope, Reply, RequestOptions, Responder, ResponseTag, RpcChannel,
};
pub use rpc::{CmsService, HttpRequestService, RequestService, WindowInfoService};

// Windows
pub use window::{open_window, MessageEvent, MessageTarget, Origin, TargetOrigin, WindowHandle};

// Behaviours
pub use behaviour::{krang_rules, BehaviourRules, Bindings};

// Preview editor
pub use preview::{CmsContext, OverlayState, PreviewEditor};

// UI
pub use ui::{AlertPopup, CookieJar, MessageBoard, Notifier, Preferences, UiReporter};

// DOM
pub use dom::{Document, Element, Node};

// Errors
pub use error::{Error, ErrorContext, Result};

/// Krang XWin version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

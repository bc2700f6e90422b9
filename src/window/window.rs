// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Browser windows as message endpoints
//!
//! A window is a cloneable [`WindowHandle`] (used to post messages *to* it)
//! plus a single [`Inbox`] owned by whatever listens on it. Delivery follows
//! `postMessage` rules: the sender's origin is stamped on the event and the
//! message is silently dropped when the receiver's origin does not match the
//! requested target origin.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use url::Url;

use super::origin::{Origin, TargetOrigin};
use crate::error::{Error, Result};

/// Unique window identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(u64);

impl WindowId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// A cross-document `message` event
#[derive(Debug, Clone)]
pub struct MessageEvent {
    /// Serialized origin of the sending window
    pub origin: String,
    /// Message body
    pub data: String,
    /// Sending window, for replies
    pub source: Option<WindowHandle>,
}

impl MessageEvent {
    /// Event with no reply path
    pub fn new(origin: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            data: data.into(),
            source: None,
        }
    }
}

/// Outcome of a `postMessage` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued on the receiver's inbox
    Delivered,
    /// Receiver origin did not match the target origin
    Dropped,
}

/// Anything that can receive cross-document messages
pub trait MessageTarget: Send + Sync {
    /// Identifier for logs
    fn window_id(&self) -> WindowId;

    /// Deliver `event` if the receiver's origin is admitted by `target_origin`
    fn post_message(&self, event: MessageEvent, target_origin: &TargetOrigin) -> Result<Delivery>;
}

struct WindowState {
    id: WindowId,
    url: Url,
    origin: Origin,
    name: RwLock<String>,
    closed: AtomicBool,
    inbox: mpsc::UnboundedSender<MessageEvent>,
}

/// Handle to an open window
#[derive(Clone)]
pub struct WindowHandle {
    state: Arc<WindowState>,
}

impl fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowHandle")
            .field("id", &self.state.id)
            .field("origin", &self.state.origin.serialize())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Receiving end of a window's message queue
#[derive(Debug)]
pub struct Inbox {
    rx: mpsc::UnboundedReceiver<MessageEvent>,
}

/// Open a window showing `url`
pub fn open_window(url: &str) -> Result<(WindowHandle, Inbox)> {
    let url = Url::parse(url)?;
    let origin = Origin::from_url(&url)?;
    let (tx, rx) = mpsc::unbounded_channel();

    let state = WindowState {
        id: WindowId::next(),
        url,
        origin,
        name: RwLock::new(String::new()),
        closed: AtomicBool::new(false),
        inbox: tx,
    };

    tracing::debug!(window = %state.id, origin = %state.origin, "Opened window");
    Ok((
        WindowHandle {
            state: Arc::new(state),
        },
        Inbox { rx },
    ))
}

impl WindowHandle {
    /// Window identifier
    pub fn id(&self) -> WindowId {
        self.state.id
    }

    /// Document URL
    pub fn url(&self) -> &Url {
        &self.state.url
    }

    /// Window origin
    pub fn origin(&self) -> &Origin {
        &self.state.origin
    }

    /// `window.name`, which the CMS uses to hand JSON access data to popups
    pub fn name(&self) -> String {
        self.state.name.read().clone()
    }

    /// Set `window.name`
    pub fn set_name(&self, name: impl Into<String>) {
        *self.state.name.write() = name.into();
    }

    /// Close the window; later posts fail
    pub fn close(&self) {
        self.state.closed.store(true, Ordering::SeqCst);
    }

    /// Whether the window was closed
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Build a message event sent *from* this window
    pub fn message(&self, data: impl Into<String>) -> MessageEvent {
        MessageEvent {
            origin: self.state.origin.serialize(),
            data: data.into(),
            source: Some(self.clone()),
        }
    }

    /// Post `data` from this window to `target`
    pub fn post_to(
        &self,
        target: &dyn MessageTarget,
        data: impl Into<String>,
        target_origin: &TargetOrigin,
    ) -> Result<Delivery> {
        target.post_message(self.message(data), target_origin)
    }
}

impl MessageTarget for WindowHandle {
    fn window_id(&self) -> WindowId {
        self.state.id
    }

    fn post_message(&self, event: MessageEvent, target_origin: &TargetOrigin) -> Result<Delivery> {
        if self.is_closed() {
            return Err(Error::WindowClosed(self.state.id.to_string()));
        }

        if !target_origin.admits(&self.state.origin) {
            tracing::warn!(
                window = %self.state.id,
                receiver = %self.state.origin,
                target = %target_origin,
                "Dropped message: receiver origin does not match target origin"
            );
            return Ok(Delivery::Dropped);
        }

        self.state
            .inbox
            .send(event)
            .map_err(|_| Error::WindowClosed(self.state.id.to_string()))?;
        Ok(Delivery::Delivered)
    }
}

impl Inbox {
    /// Wait for the next message
    pub async fn recv(&mut self) -> Option<MessageEvent> {
        self.rx.recv().await
    }

    /// Wait for the next message, giving up after `timeout`
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Result<MessageEvent> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(event)) => Ok(event),
            Ok(None) => Err(Error::WindowClosed("inbox".into())),
            Err(_) => Err(Error::timeout("waiting for message", timeout.as_millis() as u64)),
        }
    }

    /// Take a queued message without waiting
    pub fn try_recv(&mut self) -> Option<MessageEvent> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_post_message_stamps_sender_origin() {
        let (cms, _cms_inbox) = open_window("https://cms.example.com/krang/").unwrap();
        let (preview, mut preview_inbox) = open_window("https://www.example.com/story.html").unwrap();

        let target = TargetOrigin::Exact(preview.origin().clone());
        let delivery = cms.post_to(&preview, "hello", &target).unwrap();
        assert_eq!(delivery, Delivery::Delivered);

        let event = preview_inbox.recv().await.unwrap();
        assert_eq!(event.origin, "https://cms.example.com");
        assert_eq!(event.data, "hello");
        assert_eq!(event.source.unwrap().id(), cms.id());
    }

    #[test]
    fn test_mismatched_target_origin_is_dropped() {
        let (preview, _inbox) = open_window("https://www.example.com/").unwrap();
        let (popup, mut popup_inbox) = open_window("https://evil.example.com/").unwrap();

        let target = TargetOrigin::parse("https://cms.example.com").unwrap();
        assert_eq!(preview.post_to(&popup, "secret", &target).unwrap(), Delivery::Dropped);
        assert!(popup_inbox.try_recv().is_none());
    }

    #[test]
    fn test_closed_window() {
        let (cms, _inbox) = open_window("https://cms.example.com/").unwrap();
        let (preview, _) = open_window("https://www.example.com/").unwrap();
        cms.close();

        let err = preview.post_to(&cms, "x", &TargetOrigin::Any).unwrap_err();
        assert!(matches!(err, Error::WindowClosed(_)));
    }

    #[test]
    fn test_window_name() {
        let (popup, _inbox) = open_window("https://www.example.com/").unwrap();
        assert_eq!(popup.name(), "");
        popup.set_name(r#"{"cmsURL":"https://cms.example.com","winID":"7"}"#);
        assert!(popup.name().contains("winID"));
    }

    #[tokio::test]
    async fn test_recv_timeout() {
        let (_win, mut inbox) = open_window("https://www.example.com/").unwrap();
        let err = inbox.recv_timeout(Duration::from_millis(5)).await.unwrap_err();
        assert!(err.is_timeout());
    }
}

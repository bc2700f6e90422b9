// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Modal alerts and user-facing error reporting

use std::sync::Arc;

use parking_lot::Mutex;

const FAILURE_BODY: &str = "Looks like a little bug (probably an Internal Server Error)<br/>\
Contact your System Administrator if this problem continues.";

const EXCEPTION_BODY: &str = "Looks like a little bug (probably a JavaScript error)<br/>\
Contact your System Administrator if this problem continues.";

/// A modal popup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertPopup {
    /// Popup id
    pub id: String,
    pub modal: bool,
    /// CSS width
    pub width: String,
    /// HTML body
    pub body: String,
    pub body_background_image: Option<String>,
    pub close_button_background_image: Option<String>,
}

impl AlertPopup {
    /// Popup shown after a remote `onFailure`
    pub fn failure(cms_url: &str) -> Self {
        Self::little_bug("krang_preview_editor_failure", FAILURE_BODY, cms_url)
    }

    /// Popup shown after a remote `onException`
    pub fn exception(cms_url: &str) -> Self {
        Self::little_bug("krang_preview_editor_exception", EXCEPTION_BODY, cms_url)
    }

    fn little_bug(id: &str, body: &str, cms_url: &str) -> Self {
        let root = cms_url.trim_end_matches('/');
        Self {
            id: id.to_string(),
            modal: true,
            width: "500px".to_string(),
            body: body.to_string(),
            body_background_image: Some(format!("url(\"{}/images/bug.gif\")", root)),
            close_button_background_image: Some(format!(
                "url(\"{}/images/bkg-button-mini.gif\")",
                root
            )),
        }
    }
}

/// Sink for errors and alerts meant for the user
pub trait Notifier: Send + Sync {
    /// Report an application-level "critical error"
    fn critical_error(&self, message: &str);

    /// Show a modal alert
    fn alert(&self, popup: AlertPopup);
}

#[derive(Debug, Default)]
struct Reported {
    critical: Vec<String>,
    alerts: Vec<AlertPopup>,
}

/// In-memory [`Notifier`] that logs and records everything it is given
#[derive(Debug, Clone, Default)]
pub struct UiReporter {
    inner: Arc<Mutex<Reported>>,
}

impl UiReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Critical errors reported so far
    pub fn critical_errors(&self) -> Vec<String> {
        self.inner.lock().critical.clone()
    }

    /// Alerts shown so far
    pub fn alerts(&self) -> Vec<AlertPopup> {
        self.inner.lock().alerts.clone()
    }
}

impl Notifier for UiReporter {
    fn critical_error(&self, message: &str) {
        tracing::error!(error = message, "Critical error");
        self.inner.lock().critical.push(message.to_string());
    }

    fn alert(&self, popup: AlertPopup) {
        tracing::warn!(popup = %popup.id, "Showing alert");
        self.inner.lock().alerts.push(popup);
    }
}

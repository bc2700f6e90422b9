// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Busy indicator shown while a cross-window call is in flight

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::dom::{Document, Element};

/// Element id of the preview editor's load indicator
pub const DEFAULT_INDICATOR_ID: &str = "krang_preview_editor_load_indicator";

/// Shared visibility flag, optionally mirrored onto a DOM element
#[derive(Debug, Clone, Default)]
pub struct LoadIndicator {
    visible: Arc<AtomicBool>,
    element: Option<Element>,
}

impl LoadIndicator {
    /// Indicator with no DOM element
    pub fn new() -> Self {
        Self::default()
    }

    /// Indicator driving the `display` style of `element`
    pub fn with_element(element: Element) -> Self {
        Self {
            visible: Arc::new(AtomicBool::new(!element.is_hidden())),
            element: Some(element),
        }
    }

    /// Bind to the element with [`DEFAULT_INDICATOR_ID`], if the document has one
    pub fn from_document(document: &Document) -> Self {
        match document.get_element_by_id(DEFAULT_INDICATOR_ID) {
            Some(element) => Self::with_element(element),
            None => Self::new(),
        }
    }

    pub fn show(&self) {
        self.visible.store(true, Ordering::SeqCst);
        if let Some(el) = &self.element {
            el.show();
        }
    }

    pub fn hide(&self) {
        self.visible.store(false, Ordering::SeqCst);
        if let Some(el) = &self.element {
            el.hide();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Cross-document messaging model
//!
//! Origins, `message` events and window handles with `postMessage`
//! delivery semantics.

mod origin;
mod window;

pub use origin::{Origin, TargetOrigin};
pub use window::{open_window, Delivery, Inbox, MessageEvent, MessageTarget, WindowHandle, WindowId};

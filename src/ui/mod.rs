// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! CMS user interface collaborators
//!
//! Message stacks, modal alerts and cookie-backed preferences.

mod alert;
mod cookie;
mod messages;
mod prefs;

pub use alert::{AlertPopup, Notifier, UiReporter};
pub use cookie::{Cookie, CookieJar};
pub use messages::{MessageBoard, MessageLevel, ShownBatch};
pub use prefs::{CookieStore, JarCookieStore, Preferences, PREFS_COOKIE};

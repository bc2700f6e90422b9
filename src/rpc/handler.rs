// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Per-call response handlers

use std::fmt;

use serde_json::Value;

use super::envelope::ResponseTag;

/// Callback receiving `(payload, prefs, config)`
pub type Callback = Box<dyn FnMut(&Value, &Value, &Value) + Send>;

fn noop() -> Callback {
    Box::new(|_, _, _| {})
}

/// Handler table of one call, keyed by response tag
///
/// Slots that were never set hold no-ops.
pub struct Handlers {
    on_complete: Callback,
    on_failure: Callback,
    on_exception: Callback,
    response: Callback,
    finish: Callback,
}

impl Default for Handlers {
    fn default() -> Self {
        Self::new()
    }
}

impl Handlers {
    /// Table of no-ops
    pub fn new() -> Self {
        Self {
            on_complete: noop(),
            on_failure: noop(),
            on_exception: noop(),
            response: noop(),
            finish: noop(),
        }
    }

    /// Set the `onComplete` handler
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Value, &Value, &Value) + Send + 'static,
    {
        self.on_complete = Box::new(f);
        self
    }

    /// Set the `onFailure` handler
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Value, &Value, &Value) + Send + 'static,
    {
        self.on_failure = Box::new(f);
        self
    }

    /// Set the `onException` handler
    pub fn on_exception<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Value, &Value, &Value) + Send + 'static,
    {
        self.on_exception = Box::new(f);
        self
    }

    /// Set the `response` handler (info-query answers)
    pub fn response<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Value, &Value, &Value) + Send + 'static,
    {
        self.response = Box::new(f);
        self
    }

    /// Set the `finish` handler (end of an info query)
    pub fn finish<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Value, &Value, &Value) + Send + 'static,
    {
        self.finish = Box::new(f);
        self
    }

    /// Run the handler registered for `tag`
    pub fn call(&mut self, tag: ResponseTag, payload: &Value, prefs: &Value, config: &Value) {
        let handler = match tag {
            ResponseTag::OnComplete => &mut self.on_complete,
            ResponseTag::OnFailure => &mut self.on_failure,
            ResponseTag::OnException => &mut self.on_exception,
            ResponseTag::Response => &mut self.response,
            ResponseTag::Finish => &mut self.finish,
        };
        handler(payload, prefs, config);
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_dispatch_by_tag() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s1 = seen.clone();
        let s2 = seen.clone();

        let mut handlers = Handlers::new()
            .on_complete(move |p, _, _| s1.lock().unwrap().push(format!("complete {}", p)))
            .finish(move |_, _, _| s2.lock().unwrap().push("finish".to_string()));

        let empty = json!({});
        handlers.call(ResponseTag::OnComplete, &json!({"status": "ok"}), &empty, &empty);
        handlers.call(ResponseTag::OnFailure, &empty, &empty, &empty);
        handlers.call(ResponseTag::Finish, &empty, &empty, &empty);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), [r#"complete {"status":"ok"}"#, "finish"]);
    }
}

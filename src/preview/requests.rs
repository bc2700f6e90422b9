// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Calls the preview editor makes into the CMS window

use serde_json::Value;

use crate::error::Result;
use crate::rpc::{CallId, Handlers, HttpMethod, OperationType, RequestOptions, RpcChannel};
use crate::window::MessageTarget;

const STORY_APP: &str = "story.pl";

/// Question asked before jumping to an element
pub const IS_ON_EDIT_SCREEN: &str = "isStoryOnEditScreen";

/// A prepared call
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRequest {
    pub operation: OperationType,
    pub options: RequestOptions,
}

impl PreviewRequest {
    fn story(operation: OperationType, cms_url: &str, rm: &str) -> Self {
        Self {
            operation,
            options: RequestOptions::new(cms_url).app(STORY_APP).param("rm", rm),
        }
    }

    /// Add a parameter
    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.options = self.options.param(name, value);
        self
    }

    /// Post the call through `channel`
    pub fn invoke(
        self,
        channel: &mut RpcChannel,
        target: &dyn MessageTarget,
        handlers: Handlers,
    ) -> Result<CallId> {
        channel.invoke(self.operation, target, self.options, handlers)
    }
}

/// Checkout status of the story (read-only)
pub fn status_request(cms_url: &str, story_id: &str) -> PreviewRequest {
    let mut req = PreviewRequest::story(OperationType::Request, cms_url, "pe_get_status")
        .param("story_id", story_id);
    req.options.method = Some(HttpMethod::Get);
    req
}

/// Check the story out and open it on the Edit Story screen
pub fn checkout_request(cms_url: &str, story_id: &str) -> PreviewRequest {
    PreviewRequest::story(OperationType::Update, cms_url, "pe_checkout_and_edit").param("story_id", story_id)
}

/// Take the story over from its current owner
pub fn steal_request(cms_url: &str, story_id: &str) -> PreviewRequest {
    let mut req = PreviewRequest::story(OperationType::Update, cms_url, "steal_selected")
        .param("krang_pager_rows_checked", story_id);
    req.options.method = Some(HttpMethod::Get);
    req
}

/// Open the story on the Edit Story screen, optionally through a CMS form
pub fn edit_request(cms_url: &str, story_id: &str, form: Option<&str>) -> PreviewRequest {
    let mut req = PreviewRequest::story(OperationType::Update, cms_url, "edit").param("story_id", story_id);
    if let Some(form) = form {
        req.options = req.options.form(form);
    }
    req
}

/// Jump to a container element on the Edit Story screen
///
/// When the story is not on that screen yet it is opened first (`rm=edit`).
pub fn jump_request(
    cms_url: &str,
    run_mode: &str,
    element_xpath: &str,
    story_id: &str,
    on_edit_screen: bool,
) -> PreviewRequest {
    let rm = if on_edit_screen { run_mode } else { "edit" };
    let mut req = PreviewRequest::story(OperationType::Update, cms_url, rm).param("jump_to", element_xpath);
    if !on_edit_screen {
        req = req.param("story_id", story_id);
    }
    req.options = req.options.form("edit");
    req
}

/// Ask the CMS window whether the story is on the Edit Story screen
pub fn is_on_edit_screen_query(cms_url: &str) -> PreviewRequest {
    PreviewRequest {
        operation: OperationType::InfoQuery,
        options: RequestOptions::new(cms_url).question(IS_ON_EDIT_SCREEN),
    }
}

/// Whether an info-query answer is a refusal; the CMS answers `"yes"`/`"no"`
pub fn answer_is_no(answer: &Value) -> bool {
    match answer {
        Value::Bool(b) => !*b,
        Value::String(s) => s.eq_ignore_ascii_case("no"),
        _ => false,
    }
}

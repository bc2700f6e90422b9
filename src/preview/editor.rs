// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Preview editor session
//!
//! Drives the calls behind the overlay buttons and container labels of a
//! preview page, one call at a time, against the CMS window that opened it.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use super::context::{CmsContext, ElementLabel};
use super::overlay::{EditMode, OverlayState, StoryStatus};
use super::requests::{
    answer_is_no, checkout_request, edit_request, is_on_edit_screen_query, jump_request,
    status_request, steal_request, PreviewRequest,
};
use crate::error::{Error, Result};
use crate::rpc::{CallState, Handlers, ResponseTag, RpcChannel};
use crate::window::WindowHandle;

type Replies = Arc<Mutex<Vec<(ResponseTag, Value)>>>;

/// What a label click ended in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelJump {
    /// The jump was posted to the CMS
    Jumped {
        /// The story had to be checked out first
        checked_out: bool,
        /// The story was already on the Edit Story screen
        on_edit_screen: bool,
    },
    /// The story cannot be edited by this user
    NotEditable(EditMode),
}

/// Preview window talking to its CMS window
#[derive(Debug)]
pub struct PreviewEditor {
    context: CmsContext,
    story_id: String,
    cms: WindowHandle,
    channel: RpcChannel,
}

impl PreviewEditor {
    /// Editor for `story_id`; `cms` is the window that opened the preview
    pub fn new(
        context: CmsContext,
        story_id: impl Into<String>,
        cms: WindowHandle,
        channel: RpcChannel,
    ) -> Result<Self> {
        context.require_cms_url()?;
        Ok(Self {
            context,
            story_id: story_id.into(),
            cms,
            channel,
        })
    }

    pub fn story_id(&self) -> &str {
        &self.story_id
    }

    pub fn channel(&self) -> &RpcChannel {
        &self.channel
    }

    fn cms_url(&self) -> Result<String> {
        self.context.require_cms_url().map(str::to_string)
    }

    /// Post `request` and dispatch messages until its terminal response
    ///
    /// Returns every `(tag, payload)` the call received, in order.
    async fn call(&mut self, request: PreviewRequest) -> Result<Vec<(ResponseTag, Value)>> {
        let operation = request.operation;
        let replies: Replies = Arc::default();
        let id = request.invoke(&mut self.channel, &self.cms, recorder(&replies))?;

        while !self.channel.call_state(id).map_or(false, |s| s.is_settled()) {
            if self.channel.recv().await?.is_none() {
                break;
            }
        }

        match self.channel.call_state(id) {
            Some(CallState::Resolved) => Ok(std::mem::take(&mut *replies.lock())),
            Some(CallState::Expired) => {
                let waited = self.channel.config().call_timeout.unwrap_or_default();
                Err(Error::timeout(operation.as_str(), waited.as_millis() as u64))
            }
            Some(CallState::Aborted) => Err(Error::malformed(operation.as_str(), "undecodable response")),
            state => Err(Error::WindowClosed(format!(
                "call {} ended without a response ({:?})",
                id, state
            ))),
        }
    }

    /// Payload of the `onComplete` reply, or an error for failures
    async fn complete(&mut self, request: PreviewRequest) -> Result<Value> {
        let replies = self.call(request).await?;
        match replies.into_iter().last() {
            Some((ResponseTag::OnComplete, payload)) => Ok(payload),
            Some((tag, payload)) => Err(Error::other(format!("CMS answered {}: {}", tag, payload))),
            None => Err(Error::other("CMS sent no response")),
        }
    }

    /// Current checkout status of the story
    pub async fn story_status(&mut self) -> Result<StoryStatus> {
        let request = status_request(&self.cms_url()?, &self.story_id);
        let payload = self.complete(request).await?;
        Ok(StoryStatus::from_value(&payload))
    }

    /// Overlay state for the current status
    pub async fn load_status(&mut self) -> Result<OverlayState> {
        let status = self.story_status().await?;
        let state = OverlayState::from_status(&status, &self.story_id);
        tracing::info!(story = %self.story_id, mode = ?state.mode, "Story status loaded");
        Ok(state)
    }

    /// Whether the CMS window shows the story on its Edit Story screen
    ///
    /// Only an explicit "no" counts as off screen.
    pub async fn is_on_edit_screen(&mut self) -> Result<bool> {
        let replies = self.call(is_on_edit_screen_query(&self.cms_url()?)).await?;
        Ok(!replies
            .iter()
            .any(|(tag, answer)| *tag == ResponseTag::Response && answer_is_no(answer)))
    }

    /// Open the story for editing in the CMS window (the Edit button)
    pub async fn edit(&mut self, state: &OverlayState) -> Result<()> {
        let cms_url = self.cms_url()?;
        match &state.mode {
            EditMode::Owner { in_session: true } => {
                if !self.is_on_edit_screen().await? {
                    self.complete(edit_request(&cms_url, &self.story_id, Some("edit"))).await?;
                }
            }
            EditMode::Owner { in_session: false } => {
                self.complete(edit_request(&cms_url, &self.story_id, None)).await?;
            }
            EditMode::MayEdit => {
                self.complete(checkout_request(&cms_url, &self.story_id)).await?;
            }
            mode => return Err(Error::other(format!("story is not editable ({:?})", mode))),
        }
        Ok(())
    }

    /// Take the story over from its owner
    pub async fn steal(&mut self, state: &mut OverlayState) -> Result<()> {
        if !matches!(state.mode, EditMode::MaySteal { .. }) {
            return Err(Error::other("story may not be stolen"));
        }
        let request = steal_request(&self.cms_url()?, &self.story_id);
        self.complete(request).await?;
        state.stolen();
        tracing::info!(story = %self.story_id, "Story stolen");
        Ok(())
    }

    /// Jump to the container element behind a label click
    ///
    /// The status is fetched again since it may have changed since the
    /// overlay was drawn.
    pub async fn label_jump(&mut self, run_mode: &str, label: &ElementLabel) -> Result<LabelJump> {
        let cms_url = self.cms_url()?;
        let status = self.story_status().await?;

        let (checked_out, on_edit_screen) = if status.is_mine() {
            (false, self.is_on_edit_screen().await?)
        } else if !status.checked_out {
            self.complete(checkout_request(&cms_url, &self.story_id)).await?;
            (true, true)
        } else {
            return Ok(LabelJump::NotEditable(EditMode::from_status(&status, &self.story_id)));
        };

        let request = jump_request(&cms_url, run_mode, &label.element_xpath, &self.story_id, on_edit_screen);
        self.complete(request).await?;

        tracing::debug!(story = %self.story_id, xpath = %label.element_xpath, checked_out, on_edit_screen, "Jumped to element");
        Ok(LabelJump::Jumped {
            checked_out,
            on_edit_screen,
        })
    }
}

fn recorder(replies: &Replies) -> Handlers {
    let slot = |tag: ResponseTag| {
        let replies = replies.clone();
        move |payload: &Value, _: &Value, _: &Value| replies.lock().push((tag, payload.clone()))
    };
    Handlers::new()
        .on_complete(slot(ResponseTag::OnComplete))
        .on_failure(slot(ResponseTag::OnFailure))
        .on_exception(slot(ResponseTag::OnException))
        .response(slot(ResponseTag::Response))
        .finish(slot(ResponseTag::Finish))
}

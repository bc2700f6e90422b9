// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Preview editor overlay: story status to button state

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::context::string_or_number;
use crate::dom::{Document, Element};

/// Run mode of label clicks once the story is editable
pub const RUN_MODE: &str = "save_and_jump";

/// Owner marker in `checkedOutBy`
const OWNER_ME: &str = "me";

const BTN_PRESSED: &str = "krang_preview_editor_btn_pressed";
const BTN_BROWSE: &str = "krang_preview_editor_btn_browse";
const BTN_FIND: &str = "krang_preview_editor_btn_find";
const BTN_EDIT: &str = "krang_preview_editor_btn_edit";
const BTN_STEAL: &str = "krang_preview_editor_btn_steal";
const MSG_FORBIDDEN: &str = "krang_preview_editor_forbidden";
const MSG_CHECKED_OUT: &str = "krang_preview_editor_checked_out";

/// CMS flags come as `"0"`/`"1"`, numbers or booleans
fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |n| n != 0.0),
        Some(Value::String(s)) => !matches!(s.trim(), "" | "0" | "false"),
        _ => false,
    })
}

/// Checkout status of a story, as reported by `rm=pe_get_status`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryStatus {
    /// `"me"` when the current user holds the story
    #[serde(default, deserialize_with = "string_or_number")]
    pub checked_out_by: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub checked_out: bool,
    #[serde(default, deserialize_with = "flag")]
    pub may_edit: bool,
    #[serde(default, deserialize_with = "flag")]
    pub may_steal: bool,
    #[serde(default, deserialize_with = "flag")]
    pub may_read_templates: bool,
    /// Story currently open in the user's CMS session
    #[serde(default, deserialize_with = "string_or_number")]
    pub story_in_session: Option<String>,
}

impl StoryStatus {
    /// Parse an `onComplete` payload; unknown shapes yield a checked-in, read-only status
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    pub fn is_mine(&self) -> bool {
        self.checked_out_by.as_deref() == Some(OWNER_ME)
    }

    fn owner(&self) -> String {
        self.checked_out_by.clone().unwrap_or_default()
    }
}

/// What the overlay lets the user do with the story
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditMode {
    /// Checked out by the current user
    Owner {
        /// The story is the one open in the CMS session
        in_session: bool,
    },
    /// Checked in and editable
    MayEdit,
    /// Checked out by someone else; may be stolen
    MaySteal { owner: String },
    /// Checked in but not editable by this user
    Forbidden,
    /// Checked out by someone else
    CheckedOut { owner: String },
}

impl EditMode {
    pub fn from_status(status: &StoryStatus, story_id: &str) -> Self {
        if status.is_mine() {
            EditMode::Owner {
                in_session: status.story_in_session.as_deref() == Some(story_id),
            }
        } else if !status.checked_out && status.may_edit {
            EditMode::MayEdit
        } else if status.checked_out && status.may_steal {
            EditMode::MaySteal {
                owner: status.owner(),
            }
        } else if !status.checked_out {
            EditMode::Forbidden
        } else {
            EditMode::CheckedOut {
                owner: status.owner(),
            }
        }
    }

    /// Whether the Edit button is offered
    pub fn can_edit(&self) -> bool {
        matches!(self, EditMode::Owner { .. } | EditMode::MayEdit)
    }
}

/// Button and message state of the overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayState {
    pub mode: EditMode,
    /// Find Template button offered
    pub find_enabled: bool,
    /// Run mode for label clicks; `None` until the story is editable
    pub run_mode: Option<&'static str>,
}

impl OverlayState {
    pub fn from_status(status: &StoryStatus, story_id: &str) -> Self {
        let mode = EditMode::from_status(status, story_id);
        let run_mode = mode.can_edit().then_some(RUN_MODE);
        Self {
            mode,
            find_enabled: status.may_read_templates,
            run_mode,
        }
    }

    /// A successful steal makes the user the owner
    pub fn stolen(&mut self) {
        self.mode = EditMode::Owner { in_session: false };
        self.run_mode = Some(RUN_MODE);
    }

    /// Reflect the state onto the overlay's buttons
    pub fn apply(&self, document: &Document) {
        let by_id = |id: &str| document.get_element_by_id(id);

        for button in document.query_selector_all(".krang_preview_editor_btn") {
            button.remove_class(BTN_PRESSED);
        }

        if let Some(browse) = by_id(BTN_BROWSE) {
            browse.add_class(BTN_PRESSED);
            browse.show();
        }
        if self.find_enabled {
            if let Some(find) = by_id(BTN_FIND) {
                find.show();
            }
        }

        match &self.mode {
            EditMode::Owner { .. } | EditMode::MayEdit => {
                if let Some(edit) = by_id(BTN_EDIT) {
                    edit.show();
                }
            }
            EditMode::MaySteal { owner } => {
                if let Some(steal) = by_id(BTN_STEAL) {
                    append_owner(&steal, owner);
                    steal.show();
                }
            }
            EditMode::Forbidden => {
                if let Some(msg) = by_id(MSG_FORBIDDEN) {
                    msg.show();
                }
            }
            EditMode::CheckedOut { owner } => {
                if let Some(msg) = by_id(MSG_CHECKED_OUT) {
                    append_owner(&msg, owner);
                    msg.show();
                }
            }
        }
    }
}

fn append_owner(element: &Element, owner: &str) {
    let text = format!("{} {}", element.text_content().trim_end(), owner);
    element.set_text_content(text);
}

// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Preview window tools: editor overlay and template finder

mod context;
mod editor;
mod finder;
mod overlay;
mod requests;

pub use context::{CmsContext, ElementLabel, ELEMENT_LABEL_CLASS};
pub use editor::{LabelJump, PreviewEditor};
pub use finder::{
    find_comments_up, find_template_infos, format_info, format_infos, should_skip_click,
    template_finder_click, FinderClick, InfoKind, InfoPopup, TemplateInfo, INFO_POPUP_ID,
};
pub use overlay::{EditMode, OverlayState, StoryStatus, RUN_MODE};
pub use requests::{
    answer_is_no, checkout_request, edit_request, is_on_edit_screen_query, jump_request,
    status_request, steal_request, PreviewRequest, IS_ON_EDIT_SCREEN,
};

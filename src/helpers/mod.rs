// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Small helpers shared by the Krang UI scripts

mod class_name;
mod load_file;
mod poll;
mod window;

pub use class_name::{class_name_suffix, element_class_suffix};
pub use load_file::{load_file, FileInclude};
pub use poll::{exec_when_true, exec_when_true_within, DEFAULT_POLL_INTERVAL};
pub use window::{
    help_window, new_window, WindowOpen, HELP_WINDOW_FEATURES, HELP_WINDOW_NAME,
    NEW_WINDOW_FEATURES, NEW_WINDOW_NAME,
};

// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Popup window requests

/// Shared popup used for `a.new_window` links
pub const NEW_WINDOW_NAME: &str = "thewindow";

pub const NEW_WINDOW_FEATURES: &str = "width=500,height=500,left=200,top=0,status=no,toolbar=no,\
menubar=no,scrollbars=yes,location=no,directories=no,resizable=no";

/// Popup used by the preview editor's help button
pub const HELP_WINDOW_NAME: &str = "kranghelp";

pub const HELP_WINDOW_FEATURES: &str = "width=400,height=500";

/// Arguments of a `window.open` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowOpen {
    pub url: String,
    /// Target window name; reused if already open
    pub name: String,
    pub features: String,
    /// Focus the window after opening
    pub focus: bool,
}

impl WindowOpen {
    /// Comma separated features as `(key, value)` pairs
    pub fn feature_list(&self) -> Vec<(&str, &str)> {
        self.features
            .split(',')
            .filter_map(|f| f.split_once('='))
            .map(|(k, v)| (k.trim(), v.trim()))
            .collect()
    }

    /// Value of a single feature
    pub fn feature(&self, key: &str) -> Option<&str> {
        self.feature_list()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

/// Open `url` in the shared CMS popup
pub fn new_window(url: impl Into<String>) -> WindowOpen {
    WindowOpen {
        url: url.into(),
        name: NEW_WINDOW_NAME.to_string(),
        features: NEW_WINDOW_FEATURES.to_string(),
        focus: true,
    }
}

/// Open the preview editor help page
pub fn help_window(url: impl Into<String>) -> WindowOpen {
    WindowOpen {
        url: url.into(),
        name: HELP_WINDOW_NAME.to_string(),
        features: HELP_WINDOW_FEATURES.to_string(),
        focus: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_window() {
        let open = new_window("/help/story.html");
        assert_eq!(open.name, "thewindow");
        assert!(open.focus);
        assert_eq!(open.feature("width"), Some("500"));
        assert_eq!(open.feature("scrollbars"), Some("yes"));
        assert_eq!(open.feature("resizable"), Some("no"));
        assert_eq!(open.feature_list().len(), 11);
    }

    #[test]
    fn test_help_window() {
        let open = help_window("https://cms.example.com/help/preview_editor.html");
        assert_eq!(open.name, "kranghelp");
        assert_eq!(open.feature("height"), Some("500"));
    }
}

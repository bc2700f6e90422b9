// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use regex::Regex;

use crate::dom::Element;

/// Portion of the first class starting with `prefix`
///
/// Only whole classes match, so `class="foo for_bar"` with prefix `for_`
/// yields `bar` while `class="xfor_bar"` yields nothing. Returns an empty
/// string when no class matches.
pub fn class_name_suffix(class_attr: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return String::new();
    }

    let pattern = format!(r"(?:^|\s){}(\S+)(?:$|\s)", regex::escape(prefix));
    match Regex::new(&pattern) {
        Ok(re) => re
            .captures(class_attr)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        Err(e) => {
            tracing::warn!(prefix, error = %e, "Bad class prefix");
            String::new()
        }
    }
}

/// [`class_name_suffix`] on an element's `class` attribute
pub fn element_class_suffix(element: &Element, prefix: &str) -> String {
    element
        .get_attribute("class")
        .map(|classes| class_name_suffix(&classes, prefix))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix() {
        assert_eq!(class_name_suffix("foo for_bar", "for_"), "bar");
        assert_eq!(class_name_suffix("for_bar foo", "for_"), "bar");
        assert_eq!(class_name_suffix("autocomplete from_category", "from_"), "category");
    }

    #[test]
    fn test_no_partial_class_match() {
        assert_eq!(class_name_suffix("xfor_bar", "for_"), "");
        assert_eq!(class_name_suffix("for_", "for_"), "");
        assert_eq!(class_name_suffix("", "for_"), "");
    }

    #[test]
    fn test_prefix_is_literal() {
        assert_eq!(class_name_suffix("a.b-c", "a.b"), "-c");
        assert_eq!(class_name_suffix("axb-c", "a.b"), "");
    }
}

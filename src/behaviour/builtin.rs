// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Behaviours every Krang page loads

use super::rules::{Autocompleter, BehaviourRules, Binding, Bindings};
use crate::dom::{Document, Element};
use crate::error::{Error, Result};
use crate::helpers::{element_class_suffix, new_window};

/// Rule set with the standard Krang behaviours registered
pub fn krang_rules() -> Result<BehaviourRules> {
    let mut rules = BehaviourRules::new();
    rules
        .register("a.new_window", new_window_link)?
        .register("input.autocomplete", autocomplete_input)?;
    Ok(rules)
}

/// Clicking the link opens its `href` in the shared popup
fn new_window_link(el: &Element, bindings: &mut Bindings, _: &Document) -> Result<()> {
    let href = el.href().unwrap_or_default();
    bindings.bind(el, Binding::OpenWindowOnClick(new_window(href)));
    Ok(())
}

/// Suggestion list below the input, fed by the form's action URL
fn autocomplete_input(el: &Element, bindings: &mut Bindings, document: &Document) -> Result<()> {
    let form = el
        .form()
        .ok_or_else(|| Error::dom("autocomplete input outside of a form"))?;
    let url = form.get_attribute("action").unwrap_or_default();

    let list = document.create_element("div");
    list.set_attribute("class", "autocomplete");
    list.set_attribute("style", "display:none");
    el.insert_after(&list.node)?;

    // Browser completion would cover our list
    el.set_attribute("autocomplete", "off");

    bindings.bind(
        el,
        Binding::Autocompleter(Autocompleter {
            update: list.node.id,
            url,
            param_name: "phrase".to_string(),
            tokens: vec![" ".to_string()],
            target_class: element_class_suffix(el, "from_"),
        }),
    );
    Ok(())
}

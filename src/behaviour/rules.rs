// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Selector-driven element initialization
//!
//! A rule pairs a CSS selector with an initializer. Applying the rules to a
//! document runs every initializer on every matching element, in rule
//! registration order, and remembers which `(rule, element)` pairs already
//! ran so a rescan after DOM changes only touches new elements.

use std::collections::HashSet;
use std::fmt;

use crate::dom::{Document, Element, NodeId, Selector};
use crate::error::Result;
use crate::helpers::WindowOpen;

/// Interactivity attached to an element
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Clicking opens a popup instead of following the link
    OpenWindowOnClick(WindowOpen),
    /// Input suggestions fetched from the CMS
    Autocompleter(Autocompleter),
}

/// Ajax autocompleter settings of an input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Autocompleter {
    /// Element receiving the suggestion list
    pub update: NodeId,
    /// URL suggestions are posted to (the form action)
    pub url: String,
    /// Name of the parameter carrying the typed text
    pub param_name: String,
    /// Characters separating independent entries
    pub tokens: Vec<String>,
    /// Object class the suggestions come from
    pub target_class: String,
}

impl Autocompleter {
    /// Text being completed: the part after the last token
    pub fn current_token<'a>(&self, value: &'a str) -> &'a str {
        let start = self
            .tokens
            .iter()
            .filter_map(|t| value.rfind(t.as_str()).map(|i| i + t.len()))
            .max()
            .unwrap_or(0);
        value[start..].trim()
    }

    /// Request body for the suggestions of `value`
    pub fn parameters(&self, value: &str) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair(&self.param_name, self.current_token(value))
            .append_pair("rm", "autocomplete")
            .append_pair("class", &self.target_class)
            .finish()
    }
}

/// Bindings created by initializers, keyed by element
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: Vec<(NodeId, Binding)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a binding to an element
    pub fn bind(&mut self, element: &Element, binding: Binding) {
        self.entries.push((element.node.id, binding));
    }

    /// Bindings of one element
    pub fn for_element(&self, element: &Element) -> Vec<&Binding> {
        self.entries
            .iter()
            .filter(|(id, _)| *id == element.node.id)
            .map(|(_, b)| b)
            .collect()
    }

    /// Popups a click on `element` opens
    pub fn click(&self, element: &Element) -> Vec<WindowOpen> {
        self.for_element(element)
            .into_iter()
            .filter_map(|b| match b {
                Binding::OpenWindowOnClick(open) => Some(open.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(NodeId, Binding)> {
        self.entries.iter()
    }
}

/// Initializer receiving the matched element, the binding table and the document
pub type Initializer = Box<dyn Fn(&Element, &mut Bindings, &Document) -> Result<()> + Send + Sync>;

struct Rule {
    selector: Selector,
    init: Initializer,
}

/// Ordered rule list
#[derive(Default)]
pub struct BehaviourRules {
    rules: Vec<Rule>,
    applied: HashSet<(usize, NodeId)>,
}

impl fmt::Debug for BehaviourRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviourRules")
            .field(
                "selectors",
                &self.rules.iter().map(|r| r.selector.as_str()).collect::<Vec<_>>(),
            )
            .field("applied", &self.applied.len())
            .finish()
    }
}

impl BehaviourRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule; invalid selectors are rejected here rather than at apply time
    pub fn register<F>(&mut self, selector: &str, init: F) -> Result<&mut Self>
    where
        F: Fn(&Element, &mut Bindings, &Document) -> Result<()> + Send + Sync + 'static,
    {
        let selector = Selector::parse(selector)?;
        tracing::debug!(selector = selector.as_str(), "Registered behaviour");
        self.rules.push(Rule {
            selector,
            init: Box::new(init),
        });
        Ok(self)
    }

    /// Registered selectors, in order
    pub fn selectors(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.selector.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule to the whole document; returns how many initializers ran
    pub fn apply(&mut self, document: &Document, bindings: &mut Bindings) -> usize {
        self.apply_with(document, bindings, |selector| document.select(selector))
    }

    /// Apply every rule to `root` and its descendants (a mutation batch)
    pub fn apply_subtree(&mut self, document: &Document, root: &Element, bindings: &mut Bindings) -> usize {
        self.apply_with(document, bindings, |selector| root.select(selector))
    }

    fn apply_with<M>(&mut self, document: &Document, bindings: &mut Bindings, matches: M) -> usize
    where
        M: Fn(&Selector) -> Vec<Element>,
    {
        let mut count = 0;
        for (index, rule) in self.rules.iter().enumerate() {
            for element in matches(&rule.selector) {
                let key = (index, element.node.id);
                if self.applied.contains(&key) {
                    continue;
                }

                match (rule.init)(&element, bindings, document) {
                    Ok(()) => {
                        self.applied.insert(key);
                        count += 1;
                    }
                    Err(e) => tracing::warn!(
                        selector = rule.selector.as_str(),
                        error = %e,
                        "Behaviour initializer failed"
                    ),
                }
            }
        }

        if count > 0 {
            tracing::debug!(initialized = count, "Applied behaviours");
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::error::Error;
    use crate::helpers::new_window;

    fn link_rules() -> BehaviourRules {
        let mut rules = BehaviourRules::new();
        rules
            .register("a.popup", |el, bindings, _| {
                let href = el.href().unwrap_or_default();
                bindings.bind(el, Binding::OpenWindowOnClick(new_window(href)));
                Ok(())
            })
            .unwrap();
        rules
    }

    #[test]
    fn test_register_rejects_bad_selector() {
        let mut rules = BehaviourRules::new();
        let err = rules.register("a ~ b", |_, _, _| Ok(())).unwrap_err();
        assert!(matches!(err, Error::Selector { .. }));
        assert!(rules.is_empty());
    }

    #[test]
    fn test_each_element_initialized_once() {
        let doc = parse_html(r#"<body><a class="popup" href="/a">a</a><a href="/b">b</a></body>"#).unwrap();
        let mut rules = link_rules();
        let mut bindings = Bindings::new();

        assert_eq!(rules.apply(&doc, &mut bindings), 1);
        assert_eq!(rules.apply(&doc, &mut bindings), 0);
        assert_eq!(bindings.len(), 1);

        // A new matching element appears
        let body = doc.body().unwrap();
        let link = doc.create_element("a");
        link.set_attribute("class", "popup");
        link.set_attribute("href", "/c");
        body.append_child(&link.node);

        assert_eq!(rules.apply_subtree(&doc, &body, &mut bindings), 1);
        assert_eq!(bindings.click(&link)[0].url, "/c");
    }

    #[test]
    fn test_rules_run_in_registration_order() {
        let doc = parse_html(r#"<body><p class="x">p</p></body>"#).unwrap();
        let mut rules = BehaviourRules::new();
        rules
            .register("p", |el, _, _| {
                el.set_attribute("data-order", "first");
                Ok(())
            })
            .unwrap()
            .register(".x", |el, _, _| {
                let prev = el.get_attribute("data-order").unwrap_or_default();
                el.set_attribute("data-order", format!("{},second", prev));
                Ok(())
            })
            .unwrap();

        assert_eq!(rules.selectors(), vec!["p", ".x"]);
        assert_eq!(rules.apply(&doc, &mut Bindings::new()), 2);
        let p = doc.query_selector("p").unwrap();
        assert_eq!(p.get_attribute("data-order").as_deref(), Some("first,second"));
    }

    #[test]
    fn test_failed_initializer_retried_on_next_scan() {
        let doc = parse_html(r#"<body><div id="d"></div></body>"#).unwrap();
        let mut rules = BehaviourRules::new();
        rules
            .register("div", |el, _, _| {
                if el.has_attribute("data-ready") {
                    Ok(())
                } else {
                    Err(Error::dom("not ready"))
                }
            })
            .unwrap();

        let mut bindings = Bindings::new();
        assert_eq!(rules.apply(&doc, &mut bindings), 0);
        doc.get_element_by_id("d").unwrap().set_attribute("data-ready", "1");
        assert_eq!(rules.apply(&doc, &mut bindings), 1);
    }

    #[test]
    fn test_autocompleter_parameters() {
        let ac = Autocompleter {
            update: NodeId::new(),
            url: "/story.pl?rm=search".into(),
            param_name: "phrase".into(),
            tokens: vec![" ".into()],
            target_class: "category".into(),
        };
        assert_eq!(ac.current_token("news spo"), "spo");
        assert_eq!(ac.parameters("news & spo"), "phrase=spo&rm=autocomplete&class=category");
        assert_eq!(ac.parameters("a&b"), "phrase=a%26b&rm=autocomplete&class=category");

        let odd = Autocompleter {
            target_class: "media&type=x".into(),
            ..ac
        };
        assert_eq!(odd.parameters("x"), "phrase=x&rm=autocomplete&class=media%26type%3Dx");
    }
}

// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! CSS selector parsing and matching
//!
//! Enough of CSS to drive behaviour rules: compound selectors (tag, id,
//! class, attribute, a few pseudo-classes), descendant and child combinators,
//! and comma-separated selector lists.

use crate::error::{Error, Result};

use super::node::Node;

/// A comma-separated list of selectors; matches if any member matches
#[derive(Debug, Clone)]
pub struct Selector {
    source: String,
    alternatives: Vec<ComplexSelector>,
}

/// Compound selectors joined by combinators, stored right to left
#[derive(Debug, Clone)]
struct ComplexSelector {
    /// Rightmost compound (the subject)
    subject: Compound,
    /// Ancestors, nearest first
    ancestors: Vec<(Combinator, Compound)>,
}

/// Combinator between compounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant (space)
    Descendant,
    /// Child (>)
    Child,
}

#[derive(Debug, Clone, Default)]
struct Compound {
    parts: Vec<SelectorPart>,
}

/// A part of a compound selector
#[derive(Debug, Clone)]
enum SelectorPart {
    Universal,
    Tag(String),
    Id(String),
    Class(String),
    Attribute(AttributeSelector),
    PseudoClass(PseudoClass),
}

#[derive(Debug, Clone)]
struct AttributeSelector {
    name: String,
    operator: Option<AttributeOperator>,
    value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributeOperator {
    /// [attr=value]
    Equals,
    /// [attr~=value]
    Includes,
    /// [attr^=value]
    Prefix,
    /// [attr$=value]
    Suffix,
    /// [attr*=value]
    Substring,
}

#[derive(Debug, Clone)]
enum PseudoClass {
    FirstChild,
    LastChild,
    Checked,
    Disabled,
    Enabled,
    Not(Box<Selector>),
}

impl Selector {
    /// Parse a CSS selector string
    pub fn parse(selector: &str) -> Result<Self> {
        let trimmed = selector.trim();
        if trimmed.is_empty() {
            return Err(Error::selector(selector, "empty selector"));
        }

        let alternatives = split_top_level(trimmed)
            .into_iter()
            .map(|alt| SelectorParser::new(selector, alt).parse())
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source: trimmed.to_string(),
            alternatives,
        })
    }

    /// The selector text as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check if a node matches this selector
    pub fn matches(&self, node: &Node) -> bool {
        node.is_element() && self.alternatives.iter().any(|alt| alt.matches(node))
    }
}

impl ComplexSelector {
    fn matches(&self, node: &Node) -> bool {
        self.subject.matches(node) && Self::match_ancestors(&self.ancestors, node)
    }

    fn match_ancestors(ancestors: &[(Combinator, Compound)], node: &Node) -> bool {
        let Some(((combinator, compound), rest)) = ancestors.split_first() else {
            return true;
        };

        let mut parent = element_parent(node);
        match combinator {
            Combinator::Child => match parent {
                Some(p) => compound.matches(&p) && Self::match_ancestors(rest, &p),
                None => false,
            },
            Combinator::Descendant => {
                while let Some(p) = parent {
                    if compound.matches(&p) && Self::match_ancestors(rest, &p) {
                        return true;
                    }
                    parent = element_parent(&p);
                }
                false
            }
        }
    }
}

fn element_parent(node: &Node) -> Option<Node> {
    node.parent().filter(|p| p.is_element())
}

impl Compound {
    fn matches(&self, node: &Node) -> bool {
        self.parts.iter().all(|part| part_matches(part, node))
    }
}

fn part_matches(part: &SelectorPart, node: &Node) -> bool {
    match part {
        SelectorPart::Universal => true,
        SelectorPart::Tag(tag) => node
            .local_name()
            .map(|n| n.eq_ignore_ascii_case(tag))
            .unwrap_or(false),
        SelectorPart::Id(id) => node.get_attribute("id").map(|n| n == *id).unwrap_or(false),
        SelectorPart::Class(class) => node
            .get_attribute("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false),
        SelectorPart::Attribute(attr) => attribute_matches(attr, node),
        SelectorPart::PseudoClass(pseudo) => pseudo_matches(pseudo, node),
    }
}

fn attribute_matches(attr: &AttributeSelector, node: &Node) -> bool {
    let Some(value) = node.get_attribute(&attr.name) else {
        return false;
    };

    let (Some(op), Some(target)) = (&attr.operator, &attr.value) else {
        return true;
    };

    match op {
        AttributeOperator::Equals => value == *target,
        AttributeOperator::Includes => value.split_whitespace().any(|w| w == target),
        AttributeOperator::Prefix => value.starts_with(target.as_str()),
        AttributeOperator::Suffix => value.ends_with(target.as_str()),
        AttributeOperator::Substring => value.contains(target.as_str()),
    }
}

fn pseudo_matches(pseudo: &PseudoClass, node: &Node) -> bool {
    match pseudo {
        PseudoClass::FirstChild => !has_element_sibling(node, Node::prev_sibling),
        PseudoClass::LastChild => !has_element_sibling(node, Node::next_sibling),
        PseudoClass::Checked => node.has_attribute("checked"),
        PseudoClass::Disabled => node.has_attribute("disabled"),
        PseudoClass::Enabled => !node.has_attribute("disabled"),
        PseudoClass::Not(sel) => !sel.matches(node),
    }
}

fn has_element_sibling(node: &Node, step: fn(&Node) -> Option<Node>) -> bool {
    let mut sibling = step(node);
    while let Some(s) = sibling {
        if s.is_element() {
            return true;
        }
        sibling = step(&s);
    }
    false
}

/// Split on commas that are not inside brackets, parentheses or quotes
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '(') | (None, '[') => depth += 1,
            (None, ')') | (None, ']') => depth -= 1,
            (None, ',') if depth == 0 => {
                parts.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(input[start..].trim());
    parts
}

/// Parser for one complex selector (no top-level commas)
struct SelectorParser<'a> {
    source: &'a str,
    input: Vec<char>,
    pos: usize,
}

impl<'a> SelectorParser<'a> {
    fn new(source: &'a str, input: &str) -> Self {
        Self {
            source,
            input: input.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::selector(self.source, reason)
    }

    fn parse(&mut self) -> Result<ComplexSelector> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_space = self.skip_whitespace();
            match self.peek() {
                None => break,
                Some('>') => {
                    self.advance();
                    self.skip_whitespace();
                    combinators.push(Combinator::Child);
                }
                Some('+') | Some('~') => {
                    return Err(self.error("sibling combinators are not supported"));
                }
                Some(_) if had_space => combinators.push(Combinator::Descendant),
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            }
            compounds.push(self.parse_compound()?);
        }

        let subject = compounds.pop().unwrap_or_default();
        let ancestors = combinators.into_iter().rev().zip(compounds.into_iter().rev()).collect();

        Ok(ComplexSelector { subject, ancestors })
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let mut parts = Vec::new();

        while let Some(c) = self.peek() {
            match c {
                '#' => {
                    self.advance();
                    parts.push(SelectorPart::Id(self.read_identifier()?));
                }
                '.' => {
                    self.advance();
                    parts.push(SelectorPart::Class(self.read_identifier()?));
                }
                '[' => parts.push(SelectorPart::Attribute(self.parse_attribute()?)),
                ':' => parts.push(SelectorPart::PseudoClass(self.parse_pseudo()?)),
                '*' => {
                    self.advance();
                    parts.push(SelectorPart::Universal);
                }
                c if c.is_alphabetic() || c == '_' || c == '-' => {
                    let tag = self.read_identifier()?;
                    parts.push(SelectorPart::Tag(tag.to_lowercase()));
                }
                _ => break,
            }
        }

        if parts.is_empty() {
            return Err(self.error("expected a compound selector"));
        }
        Ok(Compound { parts })
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
        self.pos > start
    }

    fn read_identifier(&mut self) -> Result<String> {
        let mut result = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                result.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if result.is_empty() {
            return Err(self.error("expected identifier"));
        }
        Ok(result)
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector> {
        self.advance(); // '['
        self.skip_whitespace();
        let name = self.read_identifier()?.to_lowercase();
        self.skip_whitespace();

        let mut operator = None;
        let mut value = None;

        if let Some(c) = self.peek() {
            if c != ']' {
                let op = match c {
                    '=' => AttributeOperator::Equals,
                    '~' => AttributeOperator::Includes,
                    '^' => AttributeOperator::Prefix,
                    '$' => AttributeOperator::Suffix,
                    '*' => AttributeOperator::Substring,
                    _ => return Err(self.error(format!("unknown attribute operator '{}'", c))),
                };
                self.advance();
                if op != AttributeOperator::Equals {
                    self.expect('=')?;
                }
                operator = Some(op);

                self.skip_whitespace();
                value = Some(self.read_string_or_ident()?);
                self.skip_whitespace();
            }
        }

        self.expect(']')?;

        Ok(AttributeSelector {
            name,
            operator,
            value,
        })
    }

    fn parse_pseudo(&mut self) -> Result<PseudoClass> {
        self.advance(); // ':'
        let name = self.read_identifier()?;

        match name.to_lowercase().as_str() {
            "first-child" => Ok(PseudoClass::FirstChild),
            "last-child" => Ok(PseudoClass::LastChild),
            "checked" => Ok(PseudoClass::Checked),
            "disabled" => Ok(PseudoClass::Disabled),
            "enabled" => Ok(PseudoClass::Enabled),
            "not" => {
                let inner = self.parse_function_arg()?;
                Ok(PseudoClass::Not(Box::new(Selector::parse(&inner)?)))
            }
            other => Err(self.error(format!("unsupported pseudo-class ':{}'", other))),
        }
    }

    fn parse_function_arg(&mut self) -> Result<String> {
        self.expect('(')?;
        let mut depth = 1;
        let mut result = String::new();

        while let Some(c) = self.advance() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(result.trim().to_string());
                    }
                }
                _ => {}
            }
            result.push(c);
        }

        Err(self.error("unterminated function argument"))
    }

    fn read_string_or_ident(&mut self) -> Result<String> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.advance();
                let mut result = String::new();
                while let Some(c) = self.advance() {
                    if c == quote {
                        return Ok(result);
                    }
                    if c == '\\' {
                        if let Some(escaped) = self.advance() {
                            result.push(escaped);
                        }
                    } else {
                        result.push(c);
                    }
                }
                Err(self.error("unterminated string"))
            }
            _ => self.read_identifier(),
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.advance() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected '{}', got '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', got end of input", expected))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn test_selector_parsing() {
        assert!(Selector::parse("div").is_ok());
        assert!(Selector::parse("a.new_window").is_ok());
        assert!(Selector::parse("#id").is_ok());
        assert!(Selector::parse("[attr=value]").is_ok());
        assert!(Selector::parse("form input.autocomplete, a[href^='http']").is_ok());
        assert!(Selector::parse("div > span:not(.skip)").is_ok());
    }

    #[test]
    fn test_selector_errors() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("a + b").is_err());
        assert!(Selector::parse("div:hover").is_err());
        assert!(matches!(
            Selector::parse("[attr"),
            Err(Error::Selector { .. })
        ));
    }

    #[test]
    fn test_combinators() {
        let doc = parse_html(
            r#"<div id="outer"><form><p><input class="autocomplete" id="deep"></p>
               <input class="autocomplete" id="direct"></form></div>"#,
        )
        .unwrap();

        let ids = |sel: &str| -> Vec<String> {
            doc.query_selector_all(sel)
                .iter()
                .filter_map(|e| e.id())
                .collect()
        };

        assert_eq!(ids("form input.autocomplete"), vec!["deep", "direct"]);
        assert_eq!(ids("form > input.autocomplete"), vec!["direct"]);
        assert_eq!(ids("#outer input:not(#deep)"), vec!["direct"]);
        assert_eq!(ids("p > input, form > input"), vec!["deep", "direct"]);
    }
}

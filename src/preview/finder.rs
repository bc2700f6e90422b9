// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Template finder
//!
//! The CMS wraps every rendered template and media object in a pair of
//! comments:
//!
//! ```text
//! <!-- KrangPreviewFinder Start {"type":"template","id":12,...} -->
//! ...
//! <!-- KrangPreviewFinder End -->
//! ```
//!
//! Clicking an element collects the Start comments enclosing it by walking
//! previous siblings and then ancestors. An End comment met on the way means
//! that block closed before the clicked element, so its Start is skipped.

use serde::Deserialize;

use super::context::string_or_number;
use crate::dom::{Element, Node};
use crate::error::{Error, Result};

const START_MARKER: &str = "KrangPreviewFinder Start";
const END_MARKER: &str = "KrangPreviewFinder End";

/// Id of the info popup
pub const INFO_POPUP_ID: &str = "__pinfo";

const SKIP_CLASS: &str = "__skip_pinfo";
const OWN_LINK_CLASS: &str = "krang-find-template-link";

/// What a finder comment describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfoKind {
    Template,
    Media,
}

/// Payload of a Start comment
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateInfo {
    #[serde(rename = "type")]
    pub kind: InfoKind,
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    /// Template file name
    #[serde(default)]
    pub filename: Option<String>,
    /// Media title
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: String,
}

impl TemplateInfo {
    /// CMS search page for this template or media object
    pub fn search_url(&self, cms_url: &str) -> String {
        let id = self.id.as_deref().unwrap_or_default();
        match self.kind {
            InfoKind::Template => format!(
                "{}/template.pl?rm=search&do_advanced_search=1&search_template_id={}",
                cms_url, id
            ),
            InfoKind::Media => format!(
                "{}/media.pl?rm=find&do_advanced_search=1&search_media_id={}",
                cms_url, id
            ),
        }
    }
}

/// Comment nodes from `node` backwards through its siblings, then up through
/// each ancestor and its previous siblings
pub fn find_comments_up(node: &Node) -> Vec<Node> {
    let mut comments = Vec::new();
    let mut current = Some(node.clone());

    while let Some(start) = current {
        let mut last = start.clone();
        let mut sibling = Some(start);
        while let Some(n) = sibling {
            if n.is_comment() {
                comments.push(n.clone());
            }
            sibling = n.prev_sibling();
            last = n;
        }
        current = last.parent();
    }

    comments
}

/// Infos of the template and media blocks enclosing `node`, innermost first
pub fn find_template_infos(node: &Node) -> Result<Vec<TemplateInfo>> {
    let mut infos = Vec::new();
    let mut skip = false;

    for comment in find_comments_up(node) {
        let text = comment.node_value().unwrap_or_default();

        if skip {
            if text.contains(START_MARKER) {
                skip = false;
            }
            continue;
        }

        if text.contains(START_MARKER) {
            let json = text.replacen(START_MARKER, "", 1);
            let info = serde_json::from_str(json.trim()).map_err(|e| Error::malformed("finder comment", e))?;
            infos.push(info);
        } else if text.contains(END_MARKER) {
            skip = true;
        }
    }

    Ok(infos)
}

/// HTML snippet describing one info, optionally preceded by a separator rule
pub fn format_info(info: &TemplateInfo, separator: bool, cms_url: &str) -> String {
    let mut html = String::new();
    if separator {
        html.push_str(&format!(r#"<hr style="margin:3px 0px" class="{}"/>"#, SKIP_CLASS));
    }

    let id = info.id.as_deref().unwrap_or_default();
    match info.kind {
        InfoKind::Template => html.push_str(&format!(
            r#"<div class="{c}"><strong class="{c}">Template</strong> {id}<br /><strong class="{c}">File:</strong> {file}"#,
            c = SKIP_CLASS,
            id = id,
            file = info.filename.as_deref().unwrap_or_default(),
        )),
        InfoKind::Media => html.push_str(&format!(
            r#"<div class="{c}"><strong class="{c}">Media</strong> {id}<br /><strong class="{c}">Title:</strong> {title}"#,
            c = SKIP_CLASS,
            id = id,
            title = info.title.as_deref().unwrap_or_default(),
        )),
    }

    html.push_str(&format!(
        r#"<br /><strong class="{c}">URL:</strong> <a target="_blank" href="{href}" class="{link} {c}">{url}</a></div>"#,
        c = SKIP_CLASS,
        href = info.search_url(cms_url),
        link = OWN_LINK_CLASS,
        url = info.url,
    ));
    html
}

/// All infos, separated by rules
pub fn format_infos(infos: &[TemplateInfo], cms_url: &str) -> String {
    infos
        .iter()
        .enumerate()
        .map(|(index, info)| format_info(info, index > 0, cms_url))
        .collect()
}

/// Clicks on the info popup or on container labels are not finder clicks
pub fn should_skip_click(element: &Element) -> bool {
    element.id().map_or(false, |id| id.contains(INFO_POPUP_ID))
        || element.has_class(SKIP_CLASS)
        || element.has_class(super::context::ELEMENT_LABEL_CLASS)
}

/// Popup showing finder results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoPopup {
    pub id: String,
    pub header: String,
    pub width: String,
    pub cancel_icon: String,
    pub body: String,
}

/// Result of a finder click
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinderClick {
    pub popup: InfoPopup,
    /// Stop the browser from following the clicked link
    pub prevent_default: bool,
}

/// Handle a click while the finder is active; `None` for ignored clicks
pub fn template_finder_click(element: &Element, cms_url: &str) -> Result<Option<FinderClick>> {
    if should_skip_click(element) {
        return Ok(None);
    }

    let infos = find_template_infos(&element.node)?;
    tracing::debug!(found = infos.len(), "Template finder click");

    Ok(Some(FinderClick {
        popup: InfoPopup {
            id: INFO_POPUP_ID.to_string(),
            header: "<strong>Template / Media Info</strong>".to_string(),
            width: "400px".to_string(),
            cancel_icon: format!("{}/proto_popup/images/cancel.png", cms_url),
            body: format_infos(&infos, cms_url),
        },
        prevent_default: !element.has_class(OWN_LINK_CLASS),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    const CMS: &str = "https://cms.example.com";

    const PAGE: &str = r#"<html><body>
<!-- KrangPreviewFinder Start {"type":"template","id":1,"filename":"page.tmpl","url":"/page.tmpl"} -->
<div id="page">
  <!-- KrangPreviewFinder Start {"type":"media","id":"9","title":"Logo","url":"/logo.png"} -->
  <img src="/logo.png">
  <!-- KrangPreviewFinder End -->
  <!-- KrangPreviewFinder Start {"type":"template","id":2,"filename":"para.tmpl","url":"/para.tmpl"} -->
  <p id="para">text <a id="link" href="/x">x</a></p>
  <!-- KrangPreviewFinder End -->
</div>
<!-- KrangPreviewFinder End -->
</body></html>"#;

    #[test]
    fn test_find_comments_up_order() {
        let doc = parse_html(PAGE).unwrap();
        let p = doc.get_element_by_id("para").unwrap();
        let comments: Vec<String> = find_comments_up(&p.node)
            .iter()
            .map(|c| c.node_value().unwrap_or_default())
            .collect();

        assert_eq!(comments.len(), 4);
        assert!(comments[0].contains("para.tmpl"));
        assert!(comments[1].contains("End"));
        assert!(comments[2].contains("Logo"));
        assert!(comments[3].contains("page.tmpl"));
    }

    #[test]
    fn test_closed_blocks_are_skipped() {
        let doc = parse_html(PAGE).unwrap();
        let link = doc.get_element_by_id("link").unwrap();
        let infos = find_template_infos(&link.node).unwrap();

        let ids: Vec<_> = infos.iter().map(|i| i.id.clone().unwrap_or_default()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert_eq!(infos[0].filename.as_deref(), Some("para.tmpl"));
    }

    #[test]
    fn test_malformed_comment() {
        let doc = parse_html(r#"<body><!-- KrangPreviewFinder Start {nope --><p id="p">x</p></body>"#).unwrap();
        let p = doc.get_element_by_id("p").unwrap();
        assert!(find_template_infos(&p.node).unwrap_err().is_critical());
    }

    #[test]
    fn test_format_info() {
        let template = TemplateInfo {
            kind: InfoKind::Template,
            id: Some("2".into()),
            filename: Some("para.tmpl".into()),
            title: None,
            url: "/para.tmpl".into(),
        };
        let html = format_info(&template, false, CMS);
        assert!(html.starts_with(r#"<div class="__skip_pinfo"><strong class="__skip_pinfo">Template</strong> 2"#));
        assert!(html.contains("File:</strong> para.tmpl"));
        assert!(html.contains(r#"href="https://cms.example.com/template.pl?rm=search&do_advanced_search=1&search_template_id=2""#));
        assert!(html.ends_with(">/para.tmpl</a></div>"));

        let media = TemplateInfo {
            kind: InfoKind::Media,
            id: Some("9".into()),
            filename: None,
            title: Some("Logo".into()),
            url: "/logo.png".into(),
        };
        let html = format_infos(&[template, media], CMS);
        assert_eq!(html.matches("<hr").count(), 1);
        assert!(html.contains("media.pl?rm=find&do_advanced_search=1&search_media_id=9"));
    }

    #[test]
    fn test_finder_click() {
        let doc = parse_html(PAGE).unwrap();

        let p = doc.get_element_by_id("para").unwrap();
        let click = template_finder_click(&p, CMS).unwrap().unwrap();
        assert!(click.prevent_default);
        assert_eq!(click.popup.id, "__pinfo");
        assert_eq!(click.popup.cancel_icon, "https://cms.example.com/proto_popup/images/cancel.png");
        assert!(click.popup.body.contains("para.tmpl"));

        p.add_class("__skip_pinfo");
        assert!(template_finder_click(&p, CMS).unwrap().is_none());
    }
}

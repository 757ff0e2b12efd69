//! Markup scanning for trackable references.
//!
//! Both passes run on lol_html's streaming rewriter, so malformed markup,
//! comments and raw-text elements (`<script>`, `<style>`) are handled by a
//! real HTML tokenizer. [`find_references`] lists every `<a href>` and
//! `<img src>` in document order; [`rewrite`] walks the same elements again
//! and swaps values in by position. Start tags that are not rewritten, and
//! everything between tags, pass through byte for byte.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use lol_html::{RewriteStrSettings, element, rewrite_str};
use quick_xml::escape::{escape, resolve_html5_entity, unescape_with};
use serde::Serialize;

use crate::errors::{LinkTrackerError, Result};

const ANCHOR_SELECTOR: &str = "a[href]";
const IMAGE_SELECTOR: &str = "img[src]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// `<a href>`
    Anchor,
    /// `<img src>`
    Image,
}

impl ReferenceKind {
    pub fn attribute(self) -> &'static str {
        match self {
            ReferenceKind::Anchor => "href",
            ReferenceKind::Image => "src",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupReference {
    pub kind: ReferenceKind,
    /// Attribute value with character references decoded
    pub value: String,
    /// Index among all references of the scanned markup, in document order
    pub position: usize,
}

#[derive(Debug, Clone)]
pub struct Replacement {
    pub position: usize,
    pub value: String,
}

impl MarkupReference {
    pub fn replace_with(&self, value: impl Into<String>) -> Replacement {
        Replacement {
            position: self.position,
            value: value.into(),
        }
    }
}

/// 解码字符引用；无法识别的实体保留原文
pub fn decode_entities(raw: &str) -> Cow<'_, str> {
    unescape_with(raw, resolve_html5_entity).unwrap_or(Cow::Borrowed(raw))
}

fn scan_error(e: lol_html::errors::RewritingError) -> LinkTrackerError {
    LinkTrackerError::validation(format!("Content could not be scanned: {}", e))
}

pub fn find_references(markup: &str) -> Result<Vec<MarkupReference>> {
    let found = RefCell::new(Vec::new());
    let record = |kind: ReferenceKind, raw: Option<String>| {
        let mut found = found.borrow_mut();
        let position = found.len();
        found.push(MarkupReference {
            kind,
            value: decode_entities(raw.as_deref().unwrap_or_default()).into_owned(),
            position,
        });
    };

    rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(ANCHOR_SELECTOR, |el| {
                    let kind = ReferenceKind::Anchor;
                    record(kind, el.get_attribute(kind.attribute()));
                    Ok(())
                }),
                element!(IMAGE_SELECTOR, |el| {
                    let kind = ReferenceKind::Image;
                    record(kind, el.get_attribute(kind.attribute()));
                    Ok(())
                }),
            ],
            // 歧义标记按浏览器方式继续解析，不中断扫描
            strict: false,
            ..RewriteStrSettings::new()
        },
    )
    .map_err(scan_error)?;

    Ok(found.into_inner())
}

/// Apply replacements; positions must come from a scan of this same `markup`.
///
/// A rewritten start tag is re-serialized with the new value double-quoted.
pub fn rewrite(markup: &str, replacements: &[Replacement]) -> Result<String> {
    if replacements.is_empty() {
        return Ok(markup.to_string());
    }

    let by_position: HashMap<usize, Cow<'_, str>> = replacements
        .iter()
        .map(|r| (r.position, escape(r.value.as_str())))
        .collect();
    let cursor = Cell::new(0usize);
    let next = || {
        let position = cursor.get();
        cursor.set(position + 1);
        by_position.get(&position)
    };

    rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(ANCHOR_SELECTOR, |el| {
                    if let Some(value) = next() {
                        el.set_attribute(ReferenceKind::Anchor.attribute(), value)?;
                    }
                    Ok(())
                }),
                element!(IMAGE_SELECTOR, |el| {
                    if let Some(value) = next() {
                        el.set_attribute(ReferenceKind::Image.attribute(), value)?;
                    }
                    Ok(())
                }),
            ],
            // 歧义标记按浏览器方式继续解析，不中断扫描
            strict: false,
            ..RewriteStrSettings::new()
        },
    )
    .map_err(scan_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(markup: &str) -> Vec<(ReferenceKind, String)> {
        find_references(markup)
            .unwrap()
            .into_iter()
            .map(|r| (r.kind, r.value))
            .collect()
    }

    #[test]
    fn test_find_references_in_document_order() {
        let markup = r#"<img src="/1.png"><a href="/a">a</a><a name="top"></a><img alt="x"><a href="/b">"#;
        let refs = find_references(markup).unwrap();
        let found: Vec<_> = refs
            .iter()
            .map(|r| (r.kind, r.value.as_str(), r.position))
            .collect();
        assert_eq!(
            found,
            [
                (ReferenceKind::Image, "/1.png", 0),
                (ReferenceKind::Anchor, "/a", 1),
                (ReferenceKind::Anchor, "/b", 2),
            ]
        );
    }

    #[test]
    fn test_values_are_decoded() {
        let found = values(r#"<a href="/s?a=1&amp;b=2&#x26;c=3"><img src="/&eacute;t&eacute;.png">"#);
        assert_eq!(found[0].1, "/s?a=1&b=2&c=3");
        assert_eq!(found[1].1, "/été.png");
    }

    #[test]
    fn test_unknown_entity_keeps_raw_value() {
        assert_eq!(values(r#"<a href="/x?q=&bogus;">"#)[0].1, "/x?q=&bogus;");
    }

    #[test]
    fn test_tag_and_attribute_names_are_case_insensitive() {
        let found = values("<A HREF='/upper'>x</A><IMG SRC=/unquoted.png>");
        assert_eq!(
            found,
            [
                (ReferenceKind::Anchor, "/upper".to_string()),
                (ReferenceKind::Image, "/unquoted.png".to_string()),
            ]
        );
    }

    #[test]
    fn test_comments_and_raw_text_are_skipped() {
        let markup = concat!(
            "<!-- <a href=\"/commented\"> -->",
            "<script>document.write('<a href=\"/scripted\">')</script>",
            "<style>a[href=\"/styled\"] { color: red }</style>",
            "<textarea><img src=\"/typed.png\"></textarea>",
            "<a href=\"/real\">real</a>",
        );
        assert_eq!(values(markup), [(ReferenceKind::Anchor, "/real".to_string())]);
    }

    #[test]
    fn test_malformed_markup_does_not_fail() {
        let found = values("<div>< broken <a href=\"/x\"<p>text</div><img src=\"/y.png\"");
        assert!(found.len() <= 2);
    }

    #[test]
    fn test_rewrite_preserves_everything_else() {
        let markup = "<p class=\"intro\">Hi <a href='/a' data-x=1>there</a>\n<!-- keep -->\n<img src=/i.png alt=\"\"></p>";
        let replacements: Vec<_> = find_references(markup)
            .unwrap()
            .iter()
            .map(|r| r.replace_with(format!("/go/s{}", r.position)))
            .collect();

        let out = rewrite(markup, &replacements).unwrap();
        assert!(out.starts_with("<p class=\"intro\">Hi <a "), "{}", out);
        assert!(out.contains(">there</a>\n<!-- keep -->\n<img "), "{}", out);
        assert!(out.ends_with("></p>"), "{}", out);
        assert!(out.contains("data-x"), "{}", out);
        assert!(!out.contains("/i.png"), "{}", out);
        assert_eq!(
            values(&out),
            [
                (ReferenceKind::Anchor, "/go/s0".to_string()),
                (ReferenceKind::Image, "/go/s1".to_string()),
            ]
        );
    }

    #[test]
    fn test_rewrite_only_touches_listed_positions() {
        let markup = r#"<a href="/keep">k</a><a href="/swap">s</a>"#;
        let refs = find_references(markup).unwrap();
        let out = rewrite(markup, &[refs[1].replace_with("/go/new")]).unwrap();

        assert!(out.starts_with(r#"<a href="/keep">k</a>"#), "{}", out);
        assert_eq!(values(&out)[1].1, "/go/new");
    }

    #[test]
    fn test_rewritten_values_are_escaped() {
        let markup = r#"<a href='/x'><a href="/y">"#;
        let refs = find_references(markup).unwrap();
        let replacements = vec![
            refs[0].replace_with("/it's \"quoted\""),
            refs[1].replace_with("/a&b"),
        ];

        let out = rewrite(markup, &replacements).unwrap();
        assert!(out.contains("&amp;"), "{}", out);
        assert_eq!(
            values(&out),
            [
                (ReferenceKind::Anchor, "/it's \"quoted\"".to_string()),
                (ReferenceKind::Anchor, "/a&b".to_string()),
            ]
        );
    }

    #[test]
    fn test_rewrite_without_replacements_is_identity() {
        let markup = "<div>< broken <a href=\"x\"</div>";
        assert_eq!(rewrite(markup, &[]).unwrap(), markup);
    }
}

//! Link management service
//!
//! Creation of tracked links (directly or by scanning markup) and the
//! lookups around a single link. Shared by the admin API and tests.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::errors::{LinkTrackerError, Result};
use crate::services::object_store::{ObjectStore, ResolvedSource, StoredObject, resolve_source};
use crate::services::scanner::{MarkupReference, ReferenceKind, find_references, rewrite};
use crate::services::slug::{SlugClaim, SlugGenerator, is_valid_slug};
use crate::storage::{
    EntityRef, LinkHit, LinkType, NewTrackedLink, SeaOrmStorage, Source, TrackedLink,
};
use crate::utils::url_validator::{dangerous_protocol, validate_destination, validate_fetch_url};

// ============ Request/Response DTOs ============

/// Request to track every reference in a piece of markup
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub content: String,
    pub source: Source,
    /// Prepended to each slug in the rewritten markup
    pub url_prefix: String,
    pub observer: Option<EntityRef>,
    /// Relative references are resolved against this; without it they are left untouched
    pub base_url: Option<Url>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub content: String,
    /// Anchors first, then images, each in document order
    pub links: Vec<TrackedLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkDetails {
    pub link: TrackedLink,
    pub hits: u64,
    pub source: Option<ResolvedSource>,
    pub observer: Option<StoredObject>,
}

// ============ LinkService ============

pub struct LinkService {
    storage: Arc<SeaOrmStorage>,
    objects: Arc<dyn ObjectStore>,
    slugs: SlugGenerator,
}

impl LinkService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        objects: Arc<dyn ObjectStore>,
        slugs: SlugGenerator,
    ) -> Self {
        Self {
            storage,
            objects,
            slugs,
        }
    }

    pub fn storage(&self) -> &Arc<SeaOrmStorage> {
        &self.storage
    }

    /// Create one link. Without an explicit slug one is generated and
    /// claimed against the unique index, retrying on collision.
    pub async fn create_link(&self, mut request: NewTrackedLink) -> Result<TrackedLink> {
        request.destination = request.destination.trim().to_string();
        destination_check(request.link_type, &request.destination)
            .map_err(LinkTrackerError::validation)?;
        request.source.validate()?;
        if let Some(observer) = &request.observer {
            observer.validate("Observer")?;
        }

        let link = match request.slug.as_deref() {
            Some(slug) => {
                if !is_valid_slug(slug) {
                    return Err(LinkTrackerError::validation(format!(
                        "Invalid slug '{}': use 1-64 characters from [A-Za-z0-9_-]",
                        slug
                    )));
                }
                self.storage.insert_link(&request, slug).await?
            }
            None => self.insert_with_generated_slug(&request).await?,
        };

        info!(
            "Tracked link created: {} -> {} ({}, source {})",
            link.slug, link.destination, link.link_type, link.source
        );
        Ok(link)
    }

    async fn insert_with_generated_slug(&self, request: &NewTrackedLink) -> Result<TrackedLink> {
        let storage = &self.storage;
        self.slugs
            .claim(|slug| async move {
                if storage.slug_exists(&slug).await? {
                    return Ok(SlugClaim::Taken);
                }
                // 预检查与插入之间可能被并发请求抢占，由唯一索引兜底
                match storage.insert_link(request, &slug).await {
                    Ok(link) => Ok(SlugClaim::Claimed(link)),
                    Err(LinkTrackerError::SlugTaken(_)) => Ok(SlugClaim::Taken),
                    Err(e) => Err(e),
                }
            })
            .await
    }

    pub async fn create(
        &self,
        destination: &str,
        source: Source,
        link_type: LinkType,
        observer: Option<EntityRef>,
    ) -> Result<TrackedLink> {
        self.create_link(
            NewTrackedLink::new(destination, source)
                .with_type(link_type)
                .with_observer(observer),
        )
        .await
    }

    /// Replace every trackable `<a href>` (Redirect) and `<img src>`
    /// (DirectDownload) with `url_prefix + slug`.
    ///
    /// Links are created one by one; a failure part-way leaves the links
    /// created so far in place and returns the error.
    pub async fn create_from_content(&self, request: ScanRequest) -> Result<ScanOutcome> {
        let references = find_references(&request.content)?;
        let ordered = references
            .iter()
            .filter(|r| r.kind == ReferenceKind::Anchor)
            .chain(
                references
                    .iter()
                    .filter(|r| r.kind == ReferenceKind::Image),
            );

        let mut replacements = Vec::new();
        let mut links = Vec::new();
        for reference in ordered {
            let Some((destination, link_type)) =
                trackable_destination(reference, request.base_url.as_ref())
            else {
                debug!("Leaving {:?} reference '{}' untouched", reference.kind, reference.value);
                continue;
            };

            let link = self
                .create(
                    &destination,
                    request.source.clone(),
                    link_type,
                    request.observer.clone(),
                )
                .await?;

            replacements.push(reference.replace_with(format!("{}{}", request.url_prefix, link.slug)));
            links.push(link);
        }

        Ok(ScanOutcome {
            content: rewrite(&request.content, &replacements)?,
            links,
        })
    }

    pub async fn get_link(&self, slug: &str) -> Result<Option<TrackedLink>> {
        if !is_valid_slug(slug) {
            return Ok(None);
        }
        self.storage.find_by_slug(slug).await
    }

    pub async fn source_of(&self, link: &TrackedLink) -> Result<Option<ResolvedSource>> {
        resolve_source(self.objects.as_ref(), &link.source).await
    }

    pub async fn observer_of(&self, link: &TrackedLink) -> Result<Option<StoredObject>> {
        match &link.observer {
            Some(observer) => self.objects.resolve(observer).await,
            None => Ok(None),
        }
    }

    pub async fn hits(&self, link: &TrackedLink) -> Result<Vec<LinkHit>> {
        self.storage.hits_for_link(link.id).await
    }

    pub async fn link_details(&self, slug: &str) -> Result<LinkDetails> {
        let link = self
            .get_link(slug)
            .await?
            .ok_or_else(|| LinkTrackerError::not_found(format!("Link '{}' not found", slug)))?;

        let hits = self.storage.count_hits_for_link(link.id).await?;
        let source = self.source_of(&link).await?;
        let observer = self.observer_of(&link).await?;

        Ok(LinkDetails {
            link,
            hits,
            source,
            observer,
        })
    }
}

/// Redirects may point at any absolute non-script URL; DirectDownload
/// targets are fetched server-side and must be absolute http(s).
fn destination_check(link_type: LinkType, destination: &str) -> std::result::Result<(), String> {
    let checked = match link_type {
        LinkType::Redirect => validate_destination(destination),
        LinkType::DirectDownload => validate_fetch_url(destination),
    };
    checked.map(|_| ()).map_err(|e| e.to_string())
}

/// The destination a reference should be tracked as, or `None` when it
/// must be left alone: empty values, `mailto:` and fragment-only anchors,
/// script-capable schemes, relative references with no base to resolve
/// against, and images that cannot be fetched over http(s).
fn trackable_destination(
    reference: &MarkupReference,
    base_url: Option<&Url>,
) -> Option<(String, LinkType)> {
    let value = reference.value.trim();
    if value.is_empty() || dangerous_protocol(value).is_some() {
        return None;
    }
    if reference.kind == ReferenceKind::Anchor
        && (value.starts_with('#') || value.to_ascii_lowercase().starts_with("mailto:"))
    {
        return None;
    }

    let destination = match base_url {
        Some(base) => base.join(value).ok()?.to_string(),
        None => value.to_string(),
    };

    let link_type = match reference.kind {
        ReferenceKind::Anchor => LinkType::Redirect,
        ReferenceKind::Image => LinkType::DirectDownload,
    };
    destination_check(link_type, &destination).ok()?;
    Some((destination, link_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(value: &str) -> MarkupReference {
        MarkupReference {
            kind: ReferenceKind::Anchor,
            value: value.to_string(),
            position: 0,
        }
    }

    fn image(value: &str) -> MarkupReference {
        MarkupReference {
            kind: ReferenceKind::Image,
            ..anchor(value)
        }
    }

    fn tracked(reference: &MarkupReference, base: Option<&Url>) -> Option<String> {
        trackable_destination(reference, base).map(|(destination, _)| destination)
    }

    #[test]
    fn test_untrackable_references() {
        for value in [
            "",
            "   ",
            "mailto:a@example.com",
            "MAILTO:a@example.com",
            "#top",
            "javascript:void(0)",
            "/pricing",
            "docs/intro.html",
        ] {
            assert_eq!(tracked(&anchor(value), None), None, "{}", value);
        }
        for value in [
            "data:image/png;base64,AAAA",
            "ftp://files.example.com/a.png",
            "/logo.png",
        ] {
            assert_eq!(tracked(&image(value), None), None, "{}", value);
        }
    }

    #[test]
    fn test_trackable_references() {
        assert_eq!(
            trackable_destination(&anchor(" https://example.com/a "), None),
            Some(("https://example.com/a".to_string(), LinkType::Redirect))
        );
        assert_eq!(
            trackable_destination(&image("https://cdn.example.com/a.png"), None),
            Some((
                "https://cdn.example.com/a.png".to_string(),
                LinkType::DirectDownload
            ))
        );
    }

    #[test]
    fn test_non_web_anchors_are_tracked() {
        for value in ["tel:+15550100", "sms:+15550100", "ftp://files.example.com/r.pdf"] {
            assert_eq!(tracked(&anchor(value), None).as_deref(), Some(value));
        }
    }

    #[test]
    fn test_relative_references_resolve_against_base() {
        let base = Url::parse("https://news.example.com/2026/10/post.html").unwrap();
        assert_eq!(
            tracked(&image("img/chart.png"), Some(&base)).as_deref(),
            Some("https://news.example.com/2026/10/img/chart.png")
        );
        assert_eq!(
            tracked(&anchor("/about"), Some(&base)).as_deref(),
            Some("https://news.example.com/about")
        );
        assert_eq!(
            tracked(&anchor("tel:+15550100"), Some(&base)).as_deref(),
            Some("tel:+15550100")
        );
    }

    #[test]
    fn test_destination_rules_by_link_type() {
        assert!(destination_check(LinkType::Redirect, "tel:+15550100").is_ok());
        assert!(destination_check(LinkType::DirectDownload, "tel:+15550100").is_err());
        assert!(destination_check(LinkType::Redirect, "/relative").is_err());
        assert!(destination_check(LinkType::DirectDownload, "/relative.png").is_err());
    }
}

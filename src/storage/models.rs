use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::errors::{LinkTrackerError, Result};

/// How a resolved link is served.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
pub enum LinkType {
    /// 302 to the destination
    #[default]
    Redirect,
    /// Fetch the destination server-side and relay the body
    DirectDownload,
}

/// A weak reference to an object living in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: String,
    pub id: i64,
}

/// `source_type` / `observer_type` 列宽
pub const MAX_TYPE_LEN: usize = 255;

impl EntityRef {
    pub fn new(entity_type: impl Into<String>, id: i64) -> Self {
        Self {
            entity_type: entity_type.into(),
            id,
        }
    }

    /// `role` names the reference in error messages ("Source", "Observer")
    pub fn validate(&self, role: &str) -> Result<()> {
        validate_type_name(&self.entity_type, role)
    }
}

fn validate_type_name(name: &str, role: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LinkTrackerError::validation(format!(
            "{} cannot be empty",
            role
        )));
    }
    if name.chars().count() > MAX_TYPE_LEN {
        return Err(LinkTrackerError::validation(format!(
            "{} type/label must be at most {} characters",
            role, MAX_TYPE_LEN
        )));
    }
    Ok(())
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity_type, self.id)
    }
}

/// The channel a link was distributed through.
///
/// Stored as `(source_type, source_id)`: a label keeps its text in
/// `source_type` with a NULL id, an entity keeps its type and id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Label(String),
    Entity(EntityRef),
}

impl Source {
    pub fn label(name: impl Into<String>) -> Self {
        Source::Label(name.into())
    }

    pub fn entity(entity_type: impl Into<String>, id: i64) -> Self {
        Source::Entity(EntityRef::new(entity_type, id))
    }

    /// 持久化列 (source_type, source_id)
    pub fn columns(&self) -> (String, Option<i64>) {
        match self {
            Source::Label(name) => (name.clone(), None),
            Source::Entity(r) => (r.entity_type.clone(), Some(r.id)),
        }
    }

    pub fn from_columns(source_type: String, source_id: Option<i64>) -> Self {
        match source_id {
            Some(id) => Source::Entity(EntityRef {
                entity_type: source_type,
                id,
            }),
            None => Source::Label(source_type),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Source::Label(name) => validate_type_name(name, "Source"),
            Source::Entity(r) => r.validate("Source"),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Label(name) => write!(f, "{}", name),
            Source::Entity(r) => write!(f, "{}", r),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedLink {
    pub id: i64,
    pub slug: String,
    pub link_type: LinkType,
    pub destination: String,
    pub source: Source,
    pub observer: Option<EntityRef>,
    pub created_at: DateTime<Utc>,
}

/// Link creation request. `slug: None` means "assign one on insert".
#[derive(Debug, Clone)]
pub struct NewTrackedLink {
    pub slug: Option<String>,
    pub link_type: LinkType,
    pub destination: String,
    pub source: Source,
    pub observer: Option<EntityRef>,
}

impl NewTrackedLink {
    pub fn new(destination: impl Into<String>, source: Source) -> Self {
        Self {
            slug: None,
            link_type: LinkType::Redirect,
            destination: destination.into(),
            source,
            observer: None,
        }
    }

    pub fn with_type(mut self, link_type: LinkType) -> Self {
        self.link_type = link_type;
        self
    }

    pub fn with_observer(mut self, observer: Option<EntityRef>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkHit {
    pub id: i64,
    pub link_id: i64,
    pub created_at: DateTime<Utc>,
    pub remote_address: String,
}

/// Typed narrowing for hit queries: `since <= created_at < until`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitFilter {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub source: Option<Source>,
}

impl HitFilter {
    pub fn between(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            until: Some(until),
            source: None,
        }
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }
}

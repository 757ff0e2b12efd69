//! Admin API 类型定义

use serde::{Deserialize, Serialize};

use crate::services::{LinkDetails, ResolvedSource, StoredObject};
use crate::storage::{EntityRef, LinkType, Source, TrackedLink};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

// ============ 请求 ============

/// POST /links
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PostNewLink {
    pub destination: String,
    pub source: Source,
    #[serde(default)]
    pub link_type: Option<LinkType>,
    #[serde(default)]
    pub observer: Option<EntityRef>,
    #[serde(default)]
    pub slug: Option<String>,
}

/// POST /links/scan
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ScanContentRequest {
    pub content: String,
    pub source: Source,
    /// 缺省时使用 public_base_url + route_prefix + "/"
    #[serde(default)]
    pub url_prefix: Option<String>,
    #[serde(default)]
    pub observer: Option<EntityRef>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// `?since&until&source_type&source_id`
#[derive(Deserialize, Clone, Debug, Default)]
pub struct HitRangeQuery {
    pub since: Option<String>,
    pub until: Option<String>,
    pub source_type: Option<String>,
    pub source_id: Option<i64>,
}

/// `?start&end&increment`
#[derive(Deserialize, Clone, Debug)]
pub struct ActivityQuery {
    pub start: String,
    pub end: String,
    /// 桶宽（秒）
    pub increment: i64,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct DestinationsQuery {
    pub limit: Option<u64>,
}

// ============ 响应 ============

#[derive(Serialize, Clone, Debug)]
pub struct LinkResponse {
    #[serde(flatten)]
    pub link: TrackedLink,
    /// 对外跟踪地址
    pub tracking_url: String,
}

impl LinkResponse {
    pub fn new(link: TrackedLink, tracking_prefix: &str) -> Self {
        let tracking_url = format!("{}{}", tracking_prefix, link.slug);
        Self { link, tracking_url }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct LinkDetailsResponse {
    #[serde(flatten)]
    pub link: LinkResponse,
    pub hits: u64,
    pub resolved_source: Option<ResolvedSource>,
    pub resolved_observer: Option<StoredObject>,
}

impl LinkDetailsResponse {
    pub fn new(details: LinkDetails, tracking_prefix: &str) -> Self {
        Self {
            link: LinkResponse::new(details.link, tracking_prefix),
            hits: details.hits,
            resolved_source: details.source,
            resolved_observer: details.observer,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct ScanResponse {
    pub content: String,
    pub links: Vec<LinkResponse>,
}

// ============ Health ============

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthStorageCheck {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthCacheCheck {
    pub enabled: bool,
    pub entries: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthChecks {
    pub storage: HealthStorageCheck,
    pub cache: HealthCacheCheck,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    /// 运行秒数
    pub uptime: u64,
    pub checks: HealthChecks,
    pub response_time_ms: u32,
}

//! DirectDownload 上游抓取
//!
//! ureq 是同步客户端，请求在 spawn_blocking 中执行，整体受超时控制。
//! 重定向手动跟随，以便每一跳都经过 DestinationGuard。

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};
use ureq::Agent;
use ureq::http::header::{CONTENT_TYPE, LOCATION, USER_AGENT};
use url::Url;

use super::guard::DestinationGuard;
use crate::config::ProxyConfig;
use crate::errors::{LinkTrackerError, Result};
use crate::utils::url_validator::validate_fetch_url;

/// 上游未返回 Content-Type 时使用
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamPayload {
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl UpstreamPayload {
    pub fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or(FALLBACK_CONTENT_TYPE)
    }
}

#[async_trait]
pub trait UpstreamFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<UpstreamPayload>;
}

/// 单次请求的结果
enum Hop {
    Done(UpstreamPayload),
    Redirect(String),
}

pub struct HttpFetcher {
    agent: Agent,
    guard: DestinationGuard,
    timeout: Duration,
    max_redirects: u32,
    max_body_bytes: u64,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(config: &ProxyConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .max_redirects(0)
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            guard: DestinationGuard::new(config.block_private_destinations),
            timeout,
            max_redirects: config.max_redirects,
            max_body_bytes: config.max_body_bytes,
            user_agent: config.user_agent.clone(),
        }
    }

    /// 同步执行一次 GET（在 spawn_blocking 中调用）
    fn fetch_once_sync(agent: &Agent, url: &str, user_agent: &str, limit: u64) -> Result<Hop> {
        let mut resp = agent
            .get(url)
            .header(USER_AGENT, user_agent)
            .call()
            .map_err(|e| LinkTrackerError::upstream_fetch(format!("GET {} failed: {}", url, e)))?;

        let status = resp.status();
        if status.is_redirection() {
            let location = resp
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    LinkTrackerError::upstream_fetch(format!(
                        "{} returned {} without Location",
                        url, status
                    ))
                })?;
            return Ok(Hop::Redirect(location.to_string()));
        }
        if !status.is_success() {
            return Err(LinkTrackerError::upstream_fetch(format!(
                "{} returned {}",
                url, status
            )));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = resp
            .body_mut()
            .with_config()
            .limit(limit)
            .read_to_vec()
            .map_err(|e| {
                LinkTrackerError::upstream_fetch(format!("Reading body of {} failed: {}", url, e))
            })?;

        Ok(Hop::Done(UpstreamPayload {
            content_type,
            body: Bytes::from(body),
        }))
    }

    async fn fetch_once(&self, url: &Url, deadline: Instant) -> Result<Hop> {
        let agent = self.agent.clone();
        let target = url.to_string();
        let user_agent = self.user_agent.clone();
        let limit = self.max_body_bytes;

        let task = tokio::task::spawn_blocking(move || {
            Self::fetch_once_sync(&agent, &target, &user_agent, limit)
        });

        match timeout_at(deadline, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!("Upstream fetch task failed: {}", e);
                Err(LinkTrackerError::upstream_fetch(format!(
                    "Fetch task failed: {}",
                    e
                )))
            }
            Err(_) => Err(LinkTrackerError::upstream_fetch(format!(
                "Fetching {} timed out after {:?}",
                url, self.timeout
            ))),
        }
    }
}

#[async_trait]
impl UpstreamFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<UpstreamPayload> {
        let mut current = validate_fetch_url(url)
            .map_err(|e| LinkTrackerError::upstream_fetch(format!("{}: {}", e, url)))?;
        let deadline = Instant::now() + self.timeout;

        for hop in 0..=self.max_redirects {
            self.guard.check(&current).await?;

            match self.fetch_once(&current, deadline).await? {
                Hop::Done(payload) => {
                    debug!(
                        "Fetched {} ({} bytes, {} redirects)",
                        current,
                        payload.body.len(),
                        hop
                    );
                    return Ok(payload);
                }
                Hop::Redirect(location) => {
                    current = current.join(&location).map_err(|e| {
                        LinkTrackerError::upstream_fetch(format!(
                            "Bad redirect Location '{}': {}",
                            location, e
                        ))
                    })?;
                    debug!("Following redirect to {}", current);
                }
            }
        }

        Err(LinkTrackerError::upstream_fetch(format!(
            "Too many redirects (> {}) fetching {}",
            self.max_redirects, url
        )))
    }
}

//! Analytics service layer
//!
//! Observer-scoped aggregates over the hit history: unique visitors,
//! clicks, time-bucketed activity, per-source and per-destination
//! breakdowns. Every query is read-only.
//!
//! 术语：hit 指任意一次成功解析；click 指 Redirect 链接上的 hit。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::debug;

use crate::errors::{LinkTrackerError, Result};
use crate::storage::{EntityRef, HitFilter, LinkHit, SeaOrmStorage, Source, TrackedLink};

// ============ 公共类型定义 ============

/// One half-open window `[bucket_start, bucket_end)` of an activity series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityBucket {
    pub bucket_start: DateTime<Utc>,
    pub bucket_end: DateTime<Utc>,
    pub unique_hits: u64,
    pub clicks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub source: Source,
    /// Earliest hit through this source
    pub first_seen: DateTime<Utc>,
    /// Redirect hits through this source
    pub clicks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationClicks {
    pub destination: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObserverSummary {
    pub unique_hits: u64,
    pub links: u64,
    pub clicks: u64,
}

/// 解析日期，支持 RFC3339 和 YYYY-MM-DD 格式
pub fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
        .ok_or_else(|| {
            LinkTrackerError::date_parse(format!(
                "Invalid date '{}'. Supported formats: RFC3339 or YYYY-MM-DD",
                s
            ))
        })
}

/// Split `[start, end)` into consecutive windows of `increment_secs`, the
/// last one clipped to `end`.
pub fn bucket_windows(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    increment_secs: i64,
    max_buckets: usize,
) -> Result<Vec<(DateTime<Utc>, DateTime<Utc>)>> {
    if increment_secs <= 0 {
        return Err(LinkTrackerError::validation(format!(
            "Increment must be a positive number of seconds, got {}",
            increment_secs
        )));
    }
    if start >= end {
        return Ok(Vec::new());
    }

    let step = TimeDelta::try_seconds(increment_secs).ok_or_else(|| {
        LinkTrackerError::validation(format!("Increment {}s is out of range", increment_secs))
    })?;

    let span_secs = (end - start).num_seconds().max(1);
    let needed = (span_secs as u64).div_ceil(increment_secs as u64);
    if needed > max_buckets as u64 {
        return Err(LinkTrackerError::validation(format!(
            "Range would produce {} buckets (limit {}); use a larger increment",
            needed, max_buckets
        )));
    }

    let mut windows = Vec::with_capacity(needed as usize);
    let mut cursor = start;
    while cursor < end {
        let next = cursor.checked_add_signed(step).map_or(end, |n| n.min(end));
        windows.push((cursor, next));
        cursor = next;
    }
    Ok(windows)
}

// ============ AnalyticsService ============

/// Analytics 服务
pub struct AnalyticsService {
    storage: Arc<SeaOrmStorage>,
    max_buckets: usize,
}

impl AnalyticsService {
    pub fn new(storage: Arc<SeaOrmStorage>, max_buckets: usize) -> Self {
        Self {
            storage,
            max_buckets: max_buckets.max(1),
        }
    }

    /// Bind this service to one observer.
    pub fn observe(self: &Arc<Self>, observer: EntityRef) -> Observed {
        Observed {
            service: Arc::clone(self),
            observer,
        }
    }

    pub async fn unique_hits(&self, observer: &EntityRef, filter: Option<&HitFilter>) -> Result<u64> {
        let default = HitFilter::default();
        self.storage
            .count_unique_hits(observer, filter.unwrap_or(&default))
            .await
    }

    pub async fn links(&self, observer: &EntityRef) -> Result<Vec<TrackedLink>> {
        self.storage.list_observed_links(observer).await
    }

    pub async fn clicks(&self, observer: &EntityRef, filter: Option<&HitFilter>) -> Result<Vec<LinkHit>> {
        let default = HitFilter::default();
        self.storage
            .list_clicks(observer, filter.unwrap_or(&default))
            .await
    }

    pub async fn count_clicks(&self, observer: &EntityRef, filter: Option<&HitFilter>) -> Result<u64> {
        let default = HitFilter::default();
        self.storage
            .count_clicks(observer, filter.unwrap_or(&default))
            .await
    }

    pub async fn summary(&self, observer: &EntityRef, filter: Option<&HitFilter>) -> Result<ObserverSummary> {
        let (unique_hits, links, clicks) = futures_util::try_join!(
            self.unique_hits(observer, filter),
            self.links(observer),
            self.count_clicks(observer, filter),
        )?;
        Ok(ObserverSummary {
            unique_hits,
            links: links.len() as u64,
            clicks,
        })
    }

    /// Unique hits and clicks per window over `[start, end)`.
    pub async fn activity_over_time(
        &self,
        observer: &EntityRef,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        increment_secs: i64,
    ) -> Result<Vec<ActivityBucket>> {
        let windows = bucket_windows(start, end, increment_secs, self.max_buckets)?;
        debug!(
            "Activity for {}: {} buckets of {}s",
            observer,
            windows.len(),
            increment_secs
        );

        let mut buckets = Vec::with_capacity(windows.len());
        for (bucket_start, bucket_end) in windows {
            let filter = HitFilter::between(bucket_start, bucket_end);
            let (unique_hits, clicks) = futures_util::try_join!(
                self.storage.count_unique_hits(observer, &filter),
                self.storage.count_clicks(observer, &filter),
            )?;
            buckets.push(ActivityBucket {
                bucket_start,
                bucket_end,
                unique_hits,
                clicks,
            });
        }
        Ok(buckets)
    }

    /// One row per source: when it was first seen and how many clicks it
    /// brought across all of the observer's links.
    pub async fn hits_by_source(&self, observer: &EntityRef) -> Result<Vec<SourceSummary>> {
        let (first_seen, click_counts) = futures_util::try_join!(
            self.storage.source_first_seen(observer),
            self.storage.source_click_counts(observer),
        )?;

        let clicks: HashMap<(String, Option<i64>), u64> = click_counts
            .into_iter()
            .map(|row| ((row.source_type, row.source_id), row.count.max(0) as u64))
            .collect();

        Ok(first_seen
            .into_iter()
            .map(|row| {
                let key = (row.source_type, row.source_id);
                let clicks = clicks.get(&key).copied().unwrap_or(0);
                SourceSummary {
                    source: Source::from_columns(key.0, key.1),
                    first_seen: row.first_seen,
                    clicks,
                }
            })
            .collect())
    }

    pub async fn clicks_by_destination(
        &self,
        observer: &EntityRef,
        limit: Option<u64>,
    ) -> Result<Vec<DestinationClicks>> {
        let rows = self.storage.clicks_by_destination(observer, limit).await?;
        Ok(rows
            .into_iter()
            .map(|row| DestinationClicks {
                destination: row.destination,
                count: row.clicks.max(0) as u64,
            })
            .collect())
    }
}

// ============ Observer capability ============

/// Analytics for one observer. Any entity gains these queries by being
/// wrapped with [`AnalyticsService::observe`].
#[async_trait]
pub trait ObserverQueries: Send + Sync {
    fn observer(&self) -> &EntityRef;
    async fn unique_hits(&self, filter: Option<HitFilter>) -> Result<u64>;
    async fn links(&self) -> Result<Vec<TrackedLink>>;
    async fn clicks(&self, filter: Option<HitFilter>) -> Result<Vec<LinkHit>>;
    async fn activity_over_time(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        increment_secs: i64,
    ) -> Result<Vec<ActivityBucket>>;
    async fn hits_by_source(&self) -> Result<Vec<SourceSummary>>;
    async fn clicks_by_destination(&self, limit: Option<u64>) -> Result<Vec<DestinationClicks>>;
}

#[derive(Clone)]
pub struct Observed {
    service: Arc<AnalyticsService>,
    observer: EntityRef,
}

#[async_trait]
impl ObserverQueries for Observed {
    fn observer(&self) -> &EntityRef {
        &self.observer
    }

    async fn unique_hits(&self, filter: Option<HitFilter>) -> Result<u64> {
        self.service.unique_hits(&self.observer, filter.as_ref()).await
    }

    async fn links(&self) -> Result<Vec<TrackedLink>> {
        self.service.links(&self.observer).await
    }

    async fn clicks(&self, filter: Option<HitFilter>) -> Result<Vec<LinkHit>> {
        self.service.clicks(&self.observer, filter.as_ref()).await
    }

    async fn activity_over_time(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        increment_secs: i64,
    ) -> Result<Vec<ActivityBucket>> {
        self.service
            .activity_over_time(&self.observer, start, end, increment_secs)
            .await
    }

    async fn hits_by_source(&self) -> Result<Vec<SourceSummary>> {
        self.service.hits_by_source(&self.observer).await
    }

    async fn clicks_by_destination(&self, limit: Option<u64>) -> Result<Vec<DestinationClicks>> {
        self.service
            .clicks_by_destination(&self.observer, limit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2026-10-16").unwrap(), at(0, 0));
        assert_eq!(parse_date("2026-10-16T12:30:00Z").unwrap(), at(12, 30));
        assert_eq!(parse_date("2026-10-16T14:30:00+02:00").unwrap(), at(12, 30));
        assert!(matches!(
            parse_date("16/10/2026"),
            Err(LinkTrackerError::DateParse(_))
        ));
    }

    #[test]
    fn test_bucket_windows_are_contiguous() {
        let windows = bucket_windows(at(0, 0), at(2, 0), 3600, 100).unwrap();
        assert_eq!(windows, vec![(at(0, 0), at(1, 0)), (at(1, 0), at(2, 0))]);
    }

    #[test]
    fn test_last_bucket_is_clipped() {
        let windows = bucket_windows(at(0, 0), at(2, 30), 3600, 100).unwrap();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[2], (at(2, 0), at(2, 30)));
    }

    #[test]
    fn test_empty_and_invalid_ranges() {
        assert!(bucket_windows(at(2, 0), at(2, 0), 60, 100).unwrap().is_empty());
        assert!(bucket_windows(at(3, 0), at(2, 0), 60, 100).unwrap().is_empty());
        assert!(matches!(
            bucket_windows(at(0, 0), at(1, 0), 0, 100),
            Err(LinkTrackerError::Validation(_))
        ));
        assert!(matches!(
            bucket_windows(at(0, 0), at(1, 0), -60, 100),
            Err(LinkTrackerError::Validation(_))
        ));
    }

    #[test]
    fn test_bucket_limit() {
        assert!(bucket_windows(at(0, 0), at(1, 0), 60, 60).is_ok());
        assert!(matches!(
            bucket_windows(at(0, 0), at(1, 0), 59, 60),
            Err(LinkTrackerError::Validation(_))
        ));
    }
}

//! Write operations: links are insert-only, hits are append-only.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use tracing::{debug, error};

use super::SeaOrmStorage;
use super::constraint::{is_foreign_key_violation, is_unique_violation};
use super::converters::{model_to_link_hit, model_to_tracked_link, new_link_to_active_model};
use crate::errors::{LinkTrackerError, Result};
use crate::storage::models::{LinkHit, NewTrackedLink, TrackedLink};
use migration::entities::link_hit;

impl SeaOrmStorage {
    /// 插入新链接；slug 冲突时返回 `SlugTaken`，由调用方决定是否换 slug 重试
    pub async fn insert_link(&self, link: &NewTrackedLink, slug: &str) -> Result<TrackedLink> {
        let active = new_link_to_active_model(link, slug, Utc::now());

        match active.insert(&self.db).await {
            Ok(model) => {
                debug!("Inserted tracked link '{}' -> {}", model.slug, model.destination);
                model_to_tracked_link(model)
            }
            Err(e) if is_unique_violation(&e) => {
                debug!("Slug '{}' rejected by unique index", slug);
                Err(LinkTrackerError::slug_taken(format!(
                    "Slug '{}' already exists",
                    slug
                )))
            }
            Err(e) => {
                error!("Failed to insert tracked link '{}': {}", slug, e);
                Err(LinkTrackerError::database_operation(format!(
                    "插入链接失败: {}",
                    e
                )))
            }
        }
    }

    /// 记录一次访问；链接已被删除时返回 `NotFound`
    pub async fn record_hit(
        &self,
        link_id: i64,
        remote_address: &str,
        at: DateTime<Utc>,
    ) -> Result<LinkHit> {
        let active = link_hit::ActiveModel {
            link_id: Set(link_id),
            created_at: Set(at),
            remote_address: Set(remote_address.to_string()),
            ..Default::default()
        };

        let result = match link_hit::Entity::insert(active).exec(&self.db).await {
            Ok(result) => result,
            Err(e) if is_foreign_key_violation(&e) => {
                debug!("Hit rejected: link {} no longer exists", link_id);
                return Err(LinkTrackerError::not_found(format!(
                    "Link {} no longer exists",
                    link_id
                )));
            }
            Err(e) => {
                return Err(LinkTrackerError::database_operation(format!(
                    "记录访问失败 (link {}): {}",
                    link_id, e
                )));
            }
        };

        Ok(model_to_link_hit(link_hit::Model {
            id: result.last_insert_id,
            link_id,
            created_at: at,
            remote_address: remote_address.to_string(),
        }))
    }
}

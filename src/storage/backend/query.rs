use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::warn;

use super::SeaOrmStorage;
use super::converters::{model_to_link_hit, model_to_tracked_link};
use crate::errors::{LinkTrackerError, Result};
use crate::storage::models::{EntityRef, LinkHit, TrackedLink};
use migration::entities::{link_hit, tracked_link};

impl SeaOrmStorage {
    /// 按 slug 精确查找（区分大小写）
    ///
    /// 行内 link_type 无法识别时视为不存在。
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<TrackedLink>> {
        let model = tracked_link::Entity::find()
            .filter(tracked_link::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(|e| {
                LinkTrackerError::database_operation(format!("查询链接失败 '{}': {}", slug, e))
            })?;

        // MySQL 默认排序规则不区分大小写，这里再比较一次
        let Some(model) = model.filter(|m| m.slug == slug) else {
            return Ok(None);
        };

        match model_to_tracked_link(model) {
            Ok(link) => Ok(Some(link)),
            Err(LinkTrackerError::NotFound(msg)) => {
                warn!("{}", msg);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let count = tracked_link::Entity::find()
            .filter(tracked_link::Column::Slug.eq(slug))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// 某个观察者名下的全部链接，按 id 排序
    pub async fn list_observed_links(&self, observer: &EntityRef) -> Result<Vec<TrackedLink>> {
        let models = tracked_link::Entity::find()
            .filter(tracked_link::Column::ObserverType.eq(observer.entity_type.as_str()))
            .filter(tracked_link::Column::ObserverId.eq(observer.id))
            .order_by_asc(tracked_link::Column::Id)
            .all(&self.db)
            .await?;

        let mut links = Vec::with_capacity(models.len());
        for model in models {
            match model_to_tracked_link(model) {
                Ok(link) => links.push(link),
                Err(e) => warn!("Skipping unreadable link for {}: {}", observer, e),
            }
        }
        Ok(links)
    }

    pub async fn hits_for_link(&self, link_id: i64) -> Result<Vec<LinkHit>> {
        let models = link_hit::Entity::find()
            .filter(link_hit::Column::LinkId.eq(link_id))
            .order_by_asc(link_hit::Column::CreatedAt)
            .order_by_asc(link_hit::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_link_hit).collect())
    }

    pub async fn count_hits_for_link(&self, link_id: i64) -> Result<u64> {
        link_hit::Entity::find()
            .filter(link_hit::Column::LinkId.eq(link_id))
            .count(&self.db)
            .await
            .map_err(Into::into)
    }
}

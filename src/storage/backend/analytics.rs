//! Analytics 相关的数据库查询
//!
//! 所有查询都以观察者 (observer_type, observer_id) 为范围，
//! 可选地再按 HitFilter 收窄。只读，不需要事务。

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, sea_query::Expr,
};

use super::SeaOrmStorage;
use super::converters::model_to_link_hit;
use crate::errors::Result;
use crate::storage::models::{EntityRef, HitFilter, LinkHit, LinkType};
use migration::entities::{link_hit, tracked_link};

// ============ 查询结果类型 ============

/// 每个来源最早一次访问
#[derive(Debug, FromQueryResult)]
pub struct SourceFirstSeenRow {
    pub source_type: String,
    pub source_id: Option<i64>,
    pub first_seen: DateTime<Utc>,
}

/// 每个来源的点击数
#[derive(Debug, FromQueryResult)]
pub struct SourceCountRow {
    pub source_type: String,
    pub source_id: Option<i64>,
    pub count: i64,
}

/// 按目标地址聚合的点击数
#[derive(Debug, FromQueryResult)]
pub struct DestinationCountRow {
    pub destination: String,
    pub clicks: i64,
}

/// 观察者范围 + 过滤条件
fn hit_scope(observer: &EntityRef, filter: &HitFilter) -> Condition {
    let mut cond = Condition::all()
        .add(tracked_link::Column::ObserverType.eq(observer.entity_type.as_str()))
        .add(tracked_link::Column::ObserverId.eq(observer.id));

    if let Some(since) = filter.since {
        cond = cond.add(link_hit::Column::CreatedAt.gte(since));
    }
    if let Some(until) = filter.until {
        cond = cond.add(link_hit::Column::CreatedAt.lt(until));
    }
    if let Some(source) = &filter.source {
        let (source_type, source_id) = source.columns();
        cond = cond.add(tracked_link::Column::SourceType.eq(source_type));
        cond = match source_id {
            Some(id) => cond.add(tracked_link::Column::SourceId.eq(id)),
            None => cond.add(tracked_link::Column::SourceId.is_null()),
        };
    }
    cond
}

/// 只统计 Redirect 链接的访问（即“点击”）
fn clicks_only() -> Condition {
    Condition::all().add(tracked_link::Column::LinkType.eq(LinkType::Redirect.as_ref()))
}

fn hits_with_link() -> sea_orm::Select<link_hit::Entity> {
    link_hit::Entity::find().join(
        sea_orm::JoinType::InnerJoin,
        link_hit::Relation::TrackedLink.def(),
    )
}

// ============ SeaOrmStorage Analytics 方法 ============

impl SeaOrmStorage {
    /// 去重访问数：不同的 (remote_address, source_type, source_id) 组合个数
    pub async fn count_unique_hits(&self, observer: &EntityRef, filter: &HitFilter) -> Result<u64> {
        hits_with_link()
            .select_only()
            .column(link_hit::Column::RemoteAddress)
            .column(tracked_link::Column::SourceType)
            .column(tracked_link::Column::SourceId)
            .distinct()
            .filter(hit_scope(observer, filter))
            .count(&self.db)
            .await
            .map_err(Into::into)
    }

    /// 全部访问数（含 DirectDownload）
    pub async fn count_hits(&self, observer: &EntityRef, filter: &HitFilter) -> Result<u64> {
        hits_with_link()
            .filter(hit_scope(observer, filter))
            .count(&self.db)
            .await
            .map_err(Into::into)
    }

    pub async fn count_clicks(&self, observer: &EntityRef, filter: &HitFilter) -> Result<u64> {
        hits_with_link()
            .filter(hit_scope(observer, filter))
            .filter(clicks_only())
            .count(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Redirect 链接的访问记录，按时间升序
    pub async fn list_clicks(
        &self,
        observer: &EntityRef,
        filter: &HitFilter,
    ) -> Result<Vec<LinkHit>> {
        let models = hits_with_link()
            .filter(hit_scope(observer, filter))
            .filter(clicks_only())
            .order_by_asc(link_hit::Column::CreatedAt)
            .order_by_asc(link_hit::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_link_hit).collect())
    }

    /// 按来源分组的最早访问时间（MIN），按 first_seen 升序
    pub async fn source_first_seen(&self, observer: &EntityRef) -> Result<Vec<SourceFirstSeenRow>> {
        hits_with_link()
            .select_only()
            .column(tracked_link::Column::SourceType)
            .column(tracked_link::Column::SourceId)
            .column_as(link_hit::Column::CreatedAt.min(), "first_seen")
            .filter(hit_scope(observer, &HitFilter::default()))
            .group_by(tracked_link::Column::SourceType)
            .group_by(tracked_link::Column::SourceId)
            .order_by_asc(Expr::cust("first_seen"))
            .order_by_asc(tracked_link::Column::SourceType)
            .order_by_asc(tracked_link::Column::SourceId)
            .into_model::<SourceFirstSeenRow>()
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// 按来源分组的点击数（仅 Redirect）
    pub async fn source_click_counts(&self, observer: &EntityRef) -> Result<Vec<SourceCountRow>> {
        hits_with_link()
            .select_only()
            .column(tracked_link::Column::SourceType)
            .column(tracked_link::Column::SourceId)
            .column_as(link_hit::Column::Id.count(), "count")
            .filter(hit_scope(observer, &HitFilter::default()))
            .filter(clicks_only())
            .group_by(tracked_link::Column::SourceType)
            .group_by(tracked_link::Column::SourceId)
            .into_model::<SourceCountRow>()
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// 按目标地址聚合点击数，降序；同数按目标地址升序
    pub async fn clicks_by_destination(
        &self,
        observer: &EntityRef,
        limit: Option<u64>,
    ) -> Result<Vec<DestinationCountRow>> {
        let mut query = hits_with_link()
            .select_only()
            .column(tracked_link::Column::Destination)
            .column_as(link_hit::Column::Id.count(), "clicks")
            .filter(hit_scope(observer, &HitFilter::default()))
            .filter(clicks_only())
            .group_by(tracked_link::Column::Destination)
            .order_by_desc(Expr::cust("clicks"))
            .order_by_asc(tracked_link::Column::Destination);

        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        query
            .into_model::<DestinationCountRow>()
            .all(&self.db)
            .await
            .map_err(Into::into)
    }
}

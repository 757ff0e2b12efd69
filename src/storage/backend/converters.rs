use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::errors::{LinkTrackerError, Result};
use crate::storage::models::{EntityRef, LinkHit, LinkType, NewTrackedLink, Source, TrackedLink};
use migration::entities::{link_hit, tracked_link};

/// 将 Sea-ORM Model 转换为 TrackedLink
///
/// 存储的 link_type 无法识别时返回 NotFound：这样的行不可被解析。
pub fn model_to_tracked_link(model: tracked_link::Model) -> Result<TrackedLink> {
    let link_type = LinkType::from_str(&model.link_type).map_err(|_| {
        LinkTrackerError::not_found(format!(
            "Link '{}' has unrecognized type '{}'",
            model.slug, model.link_type
        ))
    })?;

    let observer = match (model.observer_type, model.observer_id) {
        (Some(entity_type), Some(id)) => Some(EntityRef { entity_type, id }),
        _ => None,
    };

    Ok(TrackedLink {
        id: model.id,
        slug: model.slug,
        link_type,
        destination: model.destination,
        source: Source::from_columns(model.source_type, model.source_id),
        observer,
        created_at: model.created_at,
    })
}

/// 将 NewTrackedLink 转换为 ActiveModel（仅用于插入，链接创建后不可修改）
pub fn new_link_to_active_model(
    link: &NewTrackedLink,
    slug: &str,
    created_at: DateTime<Utc>,
) -> tracked_link::ActiveModel {
    use sea_orm::ActiveValue::*;

    let (source_type, source_id) = link.source.columns();
    let (observer_type, observer_id) = match &link.observer {
        Some(r) => (Some(r.entity_type.clone()), Some(r.id)),
        None => (None, None),
    };

    tracked_link::ActiveModel {
        id: NotSet,
        slug: Set(slug.to_string()),
        link_type: Set(link.link_type.as_ref().to_string()),
        destination: Set(link.destination.clone()),
        source_type: Set(source_type),
        source_id: Set(source_id),
        observer_type: Set(observer_type),
        observer_id: Set(observer_id),
        created_at: Set(created_at),
    }
}

pub fn model_to_link_hit(model: link_hit::Model) -> LinkHit {
    LinkHit {
        id: model.id,
        link_id: model.link_id,
        created_at: model.created_at,
        remote_address: model.remote_address,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ActiveValue;

    fn create_test_model() -> tracked_link::Model {
        tracked_link::Model {
            id: 9,
            slug: "aB3xY9".to_string(),
            link_type: "DirectDownload".to_string(),
            destination: "https://cdn.example.com/logo.png".to_string(),
            source_type: "Member".to_string(),
            source_id: Some(4),
            observer_type: Some("Campaign".to_string()),
            observer_id: Some(1),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_model_to_tracked_link() {
        let link = model_to_tracked_link(create_test_model()).unwrap();
        assert_eq!(link.link_type, LinkType::DirectDownload);
        assert_eq!(link.source, Source::entity("Member", 4));
        assert_eq!(link.observer, Some(EntityRef::new("Campaign", 1)));
    }

    #[test]
    fn test_partial_observer_is_none() {
        let mut model = create_test_model();
        model.observer_id = None;
        assert_eq!(model_to_tracked_link(model).unwrap().observer, None);
    }

    #[test]
    fn test_unknown_link_type_is_not_found() {
        let mut model = create_test_model();
        model.link_type = "Teleport".to_string();
        assert!(matches!(
            model_to_tracked_link(model),
            Err(LinkTrackerError::NotFound(_))
        ));
    }

    #[test]
    fn test_label_source_to_active_model() {
        let new = NewTrackedLink::new("/pricing", Source::label("web"));
        let active = new_link_to_active_model(&new, "slug01", Utc::now());

        assert_eq!(active.slug, ActiveValue::Set("slug01".to_string()));
        assert_eq!(active.link_type, ActiveValue::Set("Redirect".to_string()));
        assert_eq!(active.source_type, ActiveValue::Set("web".to_string()));
        assert_eq!(active.source_id, ActiveValue::Set(None));
        assert_eq!(active.observer_type, ActiveValue::Set(None));
        assert!(matches!(active.id, ActiveValue::NotSet));
    }
}

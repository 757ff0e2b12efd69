pub mod link_hit;
pub mod tracked_link;

pub use link_hit::Entity as LinkHitEntity;
pub use tracked_link::Entity as TrackedLinkEntity;

//! Service layer for business logic
//!
//! Link creation, slug generation, markup scanning, upstream relay and
//! analytics. HTTP handlers and tests share these; none of them touch
//! actix-web types.

mod analytics_service;
mod link_service;
pub mod object_store;
pub mod proxy;
pub mod scanner;
pub mod slug;

pub use analytics_service::*;
pub use link_service::*;
pub use object_store::{InMemoryObjectStore, ObjectStore, ResolvedSource, StoredObject};
pub use proxy::{HttpFetcher, UpstreamFetcher, UpstreamPayload};
pub use slug::{SlugClaim, SlugGenerator};

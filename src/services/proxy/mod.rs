//! Server-side relay for DirectDownload links.

mod fetcher;
mod guard;

pub use fetcher::{FALLBACK_CONTENT_TYPE, HttpFetcher, UpstreamFetcher, UpstreamPayload};
pub use guard::{DestinationGuard, is_public_ip};

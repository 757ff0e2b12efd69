//! Linktracker - a link-tracking redirector
//!
//! Content is scanned for outbound links, each link is replaced by a short
//! slug on this service, and every resolution of a slug is recorded as a
//! hit before the visitor is redirected (or the destination is relayed).
//! Hits are aggregated per observer: unique visitors, clicks over time,
//! per-source and per-destination breakdowns.
//!
//! # Architecture
//! - `storage`: SeaORM persistence for links and hits
//! - `services`: link creation, slug generation, markup scanning, upstream
//!   relay and analytics
//! - `cache`: read-through slug resolution cache
//! - `api`: HTTP handlers and middleware
//! - `config`: TOML + environment configuration
//! - `runtime`: startup, shutdown and server mode
//! - `system`: logging

pub mod api;
pub mod cache;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;

//! Mode routing
//!
//! `serve` runs the HTTP server; `generate-config` prints a sample
//! configuration and exits.

pub mod server;

pub use server::run_server;

/// 打印示例配置到 stdout
pub fn generate_config() {
    println!("{}", crate::config::StaticConfig::generate_sample_config());
}

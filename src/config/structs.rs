use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{LinkTrackerError, Result};

/// 环境变量前缀，例如 LT__SERVER__PORT=9999
pub const ENV_PREFIX: &str = "LT";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - server: 监听地址、端口、worker 数量、可信代理
/// - database: 数据库连接配置
/// - logging: 日志配置
/// - redirector: 跳转路由前缀与对外地址
/// - proxy: DirectDownload 上游抓取限制
/// - slug: slug 长度与重试次数
/// - cache: 链接解析缓存
/// - analytics: 分析查询限制
/// - admin / health: 管理与健康检查接口
/// - object_store: 来源/观察者对象存储
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub redirector: RedirectorConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub slug: SlugConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub object_store: ObjectStoreConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// 加载失败时打印错误并回退到默认配置。
    pub fn load() -> Self {
        match Self::load_from(None) {
            Ok(config) => {
                if Path::new(DEFAULT_CONFIG_PATH).exists() {
                    eprintln!("[INFO] Configuration loaded from: {}", DEFAULT_CONFIG_PATH);
                }
                config
            }
            Err(e) => {
                eprintln!("[ERROR] {}", e);
                Self::default()
            }
        }
    }

    /// Load from `path` (required) or the optional default `config.toml`,
    /// layered under `LT__` environment variables.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        use config::{Config, Environment, File};

        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_PATH).required(false),
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.trusted_proxies")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| LinkTrackerError::config(format!("Failed to build config: {}", e)))?;

        settings
            .try_deserialize::<StaticConfig>()
            .map_err(|e| LinkTrackerError::config(format!("Failed to deserialize config: {}", e)))
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// Externally visible prefix for generated tracking URLs,
    /// e.g. `https://t.example.com/go/`.
    pub fn tracking_url_prefix(&self) -> String {
        format!(
            "{}{}/",
            self.redirector.public_base_url.trim_end_matches('/'),
            self.redirector.route_prefix
        )
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// 可信反向代理（IP 或 CIDR），只有来自这些地址的请求才读取 X-Forwarded-For
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    /// 连接超时（秒）
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "text" | "json"
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_true")]
    pub enable_rotation: bool,
}

/// 跳转入口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectorConfig {
    #[serde(default = "default_redirect_prefix")]
    pub route_prefix: String,
    /// 生成跟踪链接时使用的对外地址（不含路由前缀）
    #[serde(default)]
    pub public_base_url: String,
}

/// DirectDownload 上游抓取配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_proxy_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
    /// 拒绝解析到内网/回环等地址的目标
    #[serde(default = "default_true")]
    pub block_private_destinations: bool,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Slug 生成配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlugConfig {
    #[serde(default = "default_slug_length")]
    pub length: usize,
    #[serde(default = "default_slug_attempts")]
    pub max_attempts: u32,
}

/// 链接解析缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
}

/// 分析查询配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// activity_over_time 最多返回的时间桶数量
    #[serde(default = "default_max_buckets")]
    pub max_buckets: usize,
}

/// 管理接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_prefix")]
    pub route_prefix: String,
    /// Bearer token；为空时管理接口禁用
    #[serde(default)]
    pub token: String,
}

/// 健康检查配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_health_prefix")]
    pub route_prefix: String,
}

/// 对象存储配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObjectStoreConfig {
    /// JSON 种子文件：[{ "entity_type": "...", "id": 1, "name": "...", "attributes": {} }]
    #[serde(default)]
    pub seed_file: Option<String>,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_true() -> bool {
    true
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_database_url() -> String {
    "sqlite://linktracker.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_redirect_prefix() -> String {
    "/go".to_string()
}

fn default_proxy_timeout() -> u64 {
    10
}

fn default_max_redirects() -> u32 {
    5
}

fn default_max_body_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_user_agent() -> String {
    concat!("linktracker/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_slug_length() -> usize {
    6
}

fn default_slug_attempts() -> u32 {
    100
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_cache_capacity() -> u64 {
    10_000
}

fn default_max_buckets() -> usize {
    10_000
}

fn default_admin_prefix() -> String {
    "/admin".to_string()
}

fn default_health_prefix() -> String {
    "/health".to_string()
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            trusted_proxies: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: true,
        }
    }
}

impl Default for RedirectorConfig {
    fn default() -> Self {
        Self {
            route_prefix: default_redirect_prefix(),
            public_base_url: String::new(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_proxy_timeout(),
            max_redirects: default_max_redirects(),
            max_body_bytes: default_max_body_bytes(),
            block_private_destinations: true,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for SlugConfig {
    fn default() -> Self {
        Self {
            length: default_slug_length(),
            max_attempts: default_slug_attempts(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_cache_ttl(),
            max_capacity: default_cache_capacity(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            max_buckets: default_max_buckets(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            route_prefix: default_admin_prefix(),
            token: String::new(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            route_prefix: default_health_prefix(),
        }
    }
}

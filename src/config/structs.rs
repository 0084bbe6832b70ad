use serde::{Deserialize, Serialize};

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 服务器地址、端口、CPU 数量
/// - logging: 日志配置
/// - providers: 三个地理位置后端的连接配置
/// - tiers: 各访问级别的配额与可见字段
/// - routing: tier → provider 主/备路由
/// - credentials: 启动时注入凭证缓存的 API key 种子
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub tiers: TiersConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default = "default_credential_seeds")]
    pub credentials: Vec<CredentialSeed>,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            providers: ProvidersConfig::default(),
            tiers: TiersConfig::default(),
            routing: RoutingConfig::default(),
            credentials: default_credential_seeds(),
        }
    }
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：GG，分隔符：__
    /// 示例：GG__SERVER__PORT=9999
    pub fn load() -> Self {
        use config::{Config, Environment, File};

        let path = "config.toml";

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 GG，分隔符 __
            .add_source(
                Environment::with_prefix("GG")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
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
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 后端 Provider 连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// 公共 HTTP 查询服务 URL，使用 {ip} 作为占位符
    #[serde(default = "default_public_api_url")]
    pub public_api_url: String,

    /// 商业 API 基础 URL（ip 和 key 通过查询参数传入）
    #[serde(default = "default_premium_api_url")]
    pub premium_api_url: String,

    /// 商业 API key，未配置时该 provider 视为不可用
    #[serde(default)]
    pub premium_api_key: Option<String>,

    /// MaxMindDB 文件路径 (GeoLite2-City.mmdb)
    /// 未配置或文件不可读时该 provider 视为不可用
    #[serde(default)]
    pub maxminddb_path: Option<String>,

    /// 后端 HTTP 请求超时（秒）
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

/// 单个 tier 的配额与可见字段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierQuota {
    /// 单窗口内最大请求数
    pub max_requests: u32,
    /// 窗口长度（秒）
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// 可见字段列表，None 表示全部字段
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

/// 各 tier 的配额配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TiersConfig {
    #[serde(default = "default_free_quota")]
    pub free: TierQuota,
    #[serde(default = "default_pro1_quota")]
    pub pro1: TierQuota,
    #[serde(default = "default_pro2_quota")]
    pub pro2: TierQuota,
}

/// 单个 tier 的主/备 provider 路由
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderPair {
    /// 主 provider 名称: "public" | "premium" | "maxmind"
    pub primary: String,
    /// 备用 provider，主库失败或字段不全时回退
    #[serde(default)]
    pub secondary: Option<String>,
}

/// tier → provider 路由表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "default_free_routing")]
    pub free: ProviderPair,
    #[serde(default = "default_pro1_routing")]
    pub pro1: ProviderPair,
    #[serde(default = "default_pro2_routing")]
    pub pro2: ProviderPair,
}

/// 凭证种子，启动时写入凭证缓存
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialSeed {
    pub key: String,
    /// tier 名称，启动时解析为 Tier，非法值会被跳过并告警
    pub tier: String,
    #[serde(default)]
    pub email: Option<String>,
}

// ============================================================
// Default value functions
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
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

fn default_enable_rotation() -> bool {
    true
}

fn default_public_api_url() -> String {
    "http://ip-api.com/json/{ip}".to_string()
}

fn default_premium_api_url() -> String {
    "https://api.ipgeolocation.io/ipgeo".to_string()
}

fn default_provider_timeout() -> u64 {
    2
}

fn default_window_secs() -> u64 {
    // 按天计，与原始配额口径一致
    24 * 60 * 60
}

fn default_free_quota() -> TierQuota {
    TierQuota {
        max_requests: 100,
        window_secs: default_window_secs(),
        fields: Some(
            [
                "query", "status", "country", "city", "lat", "lon", "timezone", "isp",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        ),
    }
}

fn default_pro1_quota() -> TierQuota {
    TierQuota {
        max_requests: 1_000,
        window_secs: default_window_secs(),
        fields: None,
    }
}

fn default_pro2_quota() -> TierQuota {
    TierQuota {
        max_requests: 10_000,
        window_secs: default_window_secs(),
        fields: None,
    }
}

fn default_free_routing() -> ProviderPair {
    ProviderPair {
        primary: "public".to_string(),
        secondary: None,
    }
}

fn default_pro1_routing() -> ProviderPair {
    ProviderPair {
        primary: "premium".to_string(),
        secondary: Some("public".to_string()),
    }
}

fn default_pro2_routing() -> ProviderPair {
    ProviderPair {
        primary: "maxmind".to_string(),
        secondary: Some("premium".to_string()),
    }
}

fn default_credential_seeds() -> Vec<CredentialSeed> {
    vec![
        CredentialSeed {
            key: "abc123XYZ!".to_string(),
            tier: "free".to_string(),
            email: None,
        },
        CredentialSeed {
            key: "pro1-5f4dcc3b5aa765d61d8327deb882cf99".to_string(),
            tier: "pro1".to_string(),
            email: None,
        },
        CredentialSeed {
            key: "pro2-8f14e45fceea167a5a36dedd4bea2543".to_string(),
            tier: "pro2".to_string(),
            email: None,
        },
    ]
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
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            public_api_url: default_public_api_url(),
            premium_api_url: default_premium_api_url(),
            premium_api_key: None,
            maxminddb_path: None,
            timeout_secs: default_provider_timeout(),
        }
    }
}

impl Default for TiersConfig {
    fn default() -> Self {
        Self {
            free: default_free_quota(),
            pro1: default_pro1_quota(),
            pro2: default_pro2_quota(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            free: default_free_routing(),
            pro1: default_pro1_routing(),
            pro2: default_pro2_routing(),
        }
    }
}

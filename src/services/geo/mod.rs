//! 地理位置查询模块
//!
//! 单一 [`GeoProvider`] 抽象下挂三个实现：
//! - 公共 HTTP 服务 (ip-api.com 风格)
//! - 商业 API (需要 key)
//! - MaxMind GeoLite2 本地数据库
//!
//! tier → provider 的路由由注册表 + 配置决定，
//! 主/备调用与合并收敛在 [`FallbackResolver`]。

mod fallback;
mod ip_api;
mod maxmind;
mod premium;
mod provider;
mod record;

pub use fallback::{FallbackResolver, ProviderChain};
pub use ip_api::IpApiProvider;
pub use maxmind::MaxMindProvider;
pub use premium::PremiumApiProvider;
pub use provider::{DisabledProvider, GeoProvider, Unavailable};
pub use record::GeoRecord;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::ProvidersConfig;

/// 按配置构建 provider 注册表
///
/// 三个名字总是存在；后端未配置或初始化失败时挂 DisabledProvider，
/// 查询时降级而不是启动失败。
pub fn build_provider_registry(config: &ProvidersConfig) -> HashMap<String, Arc<dyn GeoProvider>> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let mut registry: HashMap<String, Arc<dyn GeoProvider>> = HashMap::new();

    registry.insert(
        "public".to_string(),
        Arc::new(IpApiProvider::new(&config.public_api_url, timeout)),
    );

    if config.premium_api_key.is_none() {
        info!("Premium provider has no API key configured; lookups will degrade");
    }
    registry.insert(
        "premium".to_string(),
        Arc::new(PremiumApiProvider::new(
            &config.premium_api_url,
            config.premium_api_key.clone(),
            timeout,
        )),
    );

    let maxmind: Arc<dyn GeoProvider> = match config.maxminddb_path {
        Some(ref path) => match MaxMindProvider::open(path) {
            Ok(provider) => {
                info!("MaxMind database loaded from {}", path);
                Arc::new(provider)
            }
            Err(e) => {
                warn!("Failed to load MaxMind database at {}: {}", path, e);
                Arc::new(DisabledProvider::new(
                    "maxmind",
                    format!("database unreadable: {}", e),
                ))
            }
        },
        None => Arc::new(DisabledProvider::new("maxmind", "database not configured")),
    };
    registry.insert("maxmind".to_string(), maxmind);

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registry_always_contains_all_three_names() {
        let registry = build_provider_registry(&ProvidersConfig::default());
        assert!(registry.contains_key("public"));
        assert!(registry.contains_key("premium"));
        assert!(registry.contains_key("maxmind"));

        // 默认配置下 maxmind 未配置，查询直接不可用
        let err = registry["maxmind"].lookup("8.8.8.8").await.unwrap_err();
        assert_eq!(err.reason, "database not configured");
    }

    #[tokio::test]
    async fn unreadable_mmdb_degrades_to_disabled() {
        let config = ProvidersConfig {
            maxminddb_path: Some("/nonexistent/GeoLite2-City.mmdb".to_string()),
            ..ProvidersConfig::default()
        };
        let registry = build_provider_registry(&config);
        assert!(registry["maxmind"].lookup("8.8.8.8").await.is_err());
    }
}

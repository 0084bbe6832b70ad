//! 访问网关（请求编排）
//!
//! 每个请求走固定状态机：
//! 身份解析 → 配额检查 → 后端查询（含回退） → 字段投影 → 序列化。
//! 所有策略决策都集中在这里，路由层只负责取参数和回 HTTP 状态码。

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::access::{CredentialStore, RateLimiter, Tier, TierPolicySet};
use crate::config::{RoutingConfig, StaticConfig};
use crate::errors::{GeogateError, Result};
use crate::output::{self, OutputFormat};
use crate::services::geo::{
    build_provider_registry, FallbackResolver, GeoProvider, ProviderChain,
};

/// 网关的入站请求（传输无关）
#[derive(Debug, Clone)]
pub struct LookupRequest {
    /// 请求携带的凭证
    pub key: Option<String>,
    /// 目标 IP；缺省时查调用方来源 IP
    pub target_ip: Option<String>,
    /// 调用方来源 IP（身份兜底 + 默认查询目标）
    pub source_ip: String,
    /// 请求的输出格式
    pub format: OutputFormat,
}

/// 网关的出站响应
#[derive(Debug, Clone)]
pub struct LookupResponse {
    pub body: Vec<u8>,
    pub content_type: &'static str,
}

/// 访问网关
pub struct Gateway {
    store: Arc<CredentialStore>,
    policies: Arc<TierPolicySet>,
    limiter: RateLimiter,
    resolver: FallbackResolver,
    routes: HashMap<Tier, ProviderChain>,
}

impl Gateway {
    pub fn new(
        store: Arc<CredentialStore>,
        policies: Arc<TierPolicySet>,
        routes: HashMap<Tier, ProviderChain>,
    ) -> Self {
        let limiter = RateLimiter::new(Arc::clone(&policies));
        Self {
            store,
            policies,
            limiter,
            resolver: FallbackResolver,
            routes,
        }
    }

    /// 从配置 + provider 注册表组装网关
    pub fn from_config(config: &StaticConfig) -> Result<Self> {
        let registry = build_provider_registry(&config.providers);
        let routes = build_routes(&config.routing, &registry)?;
        let store = Arc::new(CredentialStore::from_seeds(&config.credentials));
        let policies = Arc::new(TierPolicySet::from_config(&config.tiers));
        Ok(Self::new(store, policies, routes))
    }

    pub fn credential_store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// tier 的主/备 provider 名称（健康检查用）
    pub fn route_names(&self, tier: Tier) -> Option<(String, Option<String>)> {
        self.routes.get(&tier).map(|chain| {
            (
                chain.primary.name().to_string(),
                chain.secondary.as_ref().map(|s| s.name().to_string()),
            )
        })
    }

    /// 限流器清理入口，由后台任务周期调用
    pub fn purge_rate_counters(&self) {
        self.limiter.purge_expired();
    }

    /// 处理一次查询请求
    ///
    /// 错误分类：MalformedInput(400) / Authentication(401) /
    /// QuotaExceeded(429) / LookupNotFound(404)。
    /// IP 语法检查在最前，任何后端都不会被无效 IP 触达；
    /// 到达配额检查的请求恰好计数一次。
    pub async fn handle(&self, request: LookupRequest) -> Result<LookupResponse> {
        let target_ip = request
            .target_ip
            .as_deref()
            .unwrap_or(&request.source_ip)
            .to_string();

        // 1. IP 语法校验，先于任何后端调用
        if !crate::utils::is_valid_ip(&target_ip) {
            debug!("Rejected malformed target IP: {}", target_ip);
            return Err(GeogateError::malformed_input("Invalid IP address"));
        }

        // 2. 身份解析
        let entitlement = self
            .store
            .resolve(request.key.as_deref(), &request.source_ip)?;

        // 3. 配额检查
        self.limiter.admit(&entitlement.identity, entitlement.tier)?;

        // 4. 后端查询 + 回退
        let chain = self.routes.get(&entitlement.tier).ok_or_else(|| {
            // 路由表在启动时校验过，缺项属于配置错误
            warn!("No provider chain for tier {}", entitlement.tier);
            GeogateError::lookup_not_found("IP not found")
        })?;
        let record = self.resolver.resolve(&target_ip, chain).await?;

        // 5. 字段投影
        let policy = self.policies.get(entitlement.tier);
        let pairs = output::project(&record, policy.fields.as_deref(), request.format)?;

        // 6. 序列化
        let body = output::serialize(&pairs, request.format)?;
        info!(
            "Lookup {} served for {} tier as {} ({} fields)",
            target_ip,
            entitlement.tier,
            request.format,
            pairs.len()
        );

        Ok(LookupResponse {
            body,
            content_type: request.format.content_type(),
        })
    }
}

/// 路由配置 → provider 调用链，名字查不到注册表即配置错误
fn build_routes(
    routing: &RoutingConfig,
    registry: &HashMap<String, Arc<dyn GeoProvider>>,
) -> Result<HashMap<Tier, ProviderChain>> {
    let mut routes = HashMap::new();
    for (tier, pair) in [
        (Tier::Free, &routing.free),
        (Tier::Pro1, &routing.pro1),
        (Tier::Pro2, &routing.pro2),
    ] {
        let primary = registry
            .get(&pair.primary)
            .cloned()
            .ok_or_else(|| {
                GeogateError::config(format!(
                    "Unknown primary provider '{}' for {} tier",
                    pair.primary, tier
                ))
            })?;
        let secondary = match pair.secondary {
            Some(ref name) => Some(registry.get(name).cloned().ok_or_else(|| {
                GeogateError::config(format!(
                    "Unknown secondary provider '{}' for {} tier",
                    name, tier
                ))
            })?),
            None => None,
        };
        routes.insert(tier, ProviderChain { primary, secondary });
    }
    Ok(routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderPair;
    use crate::services::geo::DisabledProvider;

    #[test]
    fn build_routes_rejects_unknown_provider_name() {
        let mut registry: HashMap<String, Arc<dyn GeoProvider>> = HashMap::new();
        registry.insert(
            "public".to_string(),
            Arc::new(DisabledProvider::new("public", "test")),
        );

        let mut routing = RoutingConfig::default();
        routing.free = ProviderPair {
            primary: "does-not-exist".to_string(),
            secondary: None,
        };

        let err = build_routes(&routing, &registry).unwrap_err();
        assert!(matches!(err, GeogateError::Config(_)));
    }
}

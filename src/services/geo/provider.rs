//! Provider 抽象层
//!
//! 每个后端实现一个 [`GeoProvider`]：调用自己的数据源并把原生 schema
//! 映射到 [`GeoRecord`]。任何失败路径都收敛为 [`Unavailable`]，
//! 绝不 panic，回退链据此做统一的失败处理。

use async_trait::async_trait;

use super::record::GeoRecord;

/// 后端不可用的原因，对外不再细分（超时等同于不可用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unavailable {
    pub reason: String,
}

impl Unavailable {
    pub fn new<T: Into<String>>(reason: T) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for Unavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason)
    }
}

/// 地理位置后端查询 trait
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// 查询 IP，成功返回规范化记录，失败一律 Unavailable
    async fn lookup(&self, ip: &str) -> Result<GeoRecord, Unavailable>;

    /// provider 名称（用于日志与路由表）
    fn name(&self) -> &'static str;
}

/// 占位 provider：对应后端未配置或初始化失败
///
/// 路由表引用了它时，该 tier 的查询会直接走备库或以 NotFound 终止，
/// 进程本身不受影响。
pub struct DisabledProvider {
    name: &'static str,
    reason: String,
}

impl DisabledProvider {
    pub fn new(name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            name,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl GeoProvider for DisabledProvider {
    async fn lookup(&self, _ip: &str) -> Result<GeoRecord, Unavailable> {
        Err(Unavailable::new(self.reason.clone()))
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

//! 回退解析器
//!
//! 主库 → 备库的调用链与字段级合并，是唯一处理 Unavailable 的地方。
//! 单个后端失败从不直接上抛，链路耗尽才升级为 LookupNotFound。

use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{GeogateError, Result};

use super::provider::GeoProvider;
use super::record::GeoRecord;

/// 某个 tier 的 provider 调用链
#[derive(Clone)]
pub struct ProviderChain {
    pub primary: Arc<dyn GeoProvider>,
    pub secondary: Option<Arc<dyn GeoProvider>>,
}

impl std::fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderChain")
            .field("primary", &self.primary.name())
            .field("secondary", &self.secondary.as_ref().map(|p| p.name()))
            .finish()
    }
}

/// 回退解析器（无状态）
#[derive(Default, Clone, Copy)]
pub struct FallbackResolver;

impl FallbackResolver {
    /// 解析一个 IP
    ///
    /// - 主库失败 → 尝试备库，备库也失败 → LookupNotFound
    /// - 主库命中但 city / 一级行政区仍为默认 → 调备库合并，
    ///   备库只填主库的默认字段，主库已填充的字段不被覆盖
    pub async fn resolve(&self, ip: &str, chain: &ProviderChain) -> Result<GeoRecord> {
        match chain.primary.lookup(ip).await {
            Ok(mut record) => {
                if !record.is_complete() {
                    if let Some(ref secondary) = chain.secondary {
                        debug!(
                            "Primary {} returned incomplete record for {}, merging from {}",
                            chain.primary.name(),
                            ip,
                            secondary.name()
                        );
                        if let Ok(fill) = secondary.lookup(ip).await {
                            record.fill_from(&fill);
                        }
                    }
                }
                Ok(record)
            }
            Err(primary_err) => {
                debug!(
                    "Primary {} unavailable for {}: {}",
                    chain.primary.name(),
                    ip,
                    primary_err
                );
                let Some(ref secondary) = chain.secondary else {
                    return Err(GeogateError::lookup_not_found("IP not found"));
                };
                match secondary.lookup(ip).await {
                    Ok(record) => {
                        info!(
                            "Fallback {} served {} after primary outage",
                            secondary.name(),
                            ip
                        );
                        Ok(record)
                    }
                    Err(secondary_err) => {
                        debug!(
                            "Secondary {} unavailable for {}: {}",
                            secondary.name(),
                            ip,
                            secondary_err
                        );
                        Err(GeogateError::lookup_not_found("IP not found"))
                    }
                }
            }
        }
    }
}

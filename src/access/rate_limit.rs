//! 固定窗口限流器
//!
//! 每个身份一个计数器，窗口长度与配额按 tier 从策略表实时读取。
//! check-then-increment 依赖 DashMap 的 per-key entry 锁保证原子性，
//! 并发下不会超发。

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::errors::{GeogateError, Result};

use super::tier::{Tier, TierPolicySet};

/// 单身份窗口计数，仅限流器内部读写
#[derive(Debug, Clone, Copy)]
struct WindowCounter {
    window_start: i64,
    count: u32,
}

/// 固定窗口限流器
pub struct RateLimiter {
    policies: Arc<TierPolicySet>,
    counters: DashMap<String, WindowCounter>,
}

impl RateLimiter {
    pub fn new(policies: Arc<TierPolicySet>) -> Self {
        Self {
            policies,
            counters: DashMap::new(),
        }
    }

    /// 准入检查
    ///
    /// 窗口内已达配额则拒绝，拒绝本身不再计数；窗口滚动后从零重新开始。
    /// tier 每次调用重新查表，tier 变更即时生效。
    pub fn admit(&self, identity: &str, tier: Tier) -> Result<()> {
        self.admit_at(identity, tier, chrono::Utc::now().timestamp())
    }

    /// 以显式时间戳准入，便于测试窗口滚动
    fn admit_at(&self, identity: &str, tier: Tier, now: i64) -> Result<()> {
        let policy = self.policies.get(tier);

        let mut entry = self
            .counters
            .entry(identity.to_string())
            .or_insert(WindowCounter {
                window_start: now,
                count: 0,
            });

        if now - entry.window_start >= policy.window_secs as i64 {
            trace!("Rate window rollover for identity (tier {})", tier);
            entry.window_start = now;
            entry.count = 0;
        }

        if entry.count >= policy.max_requests {
            debug!(
                "Quota exceeded for {} tier: {}/{} in current window",
                tier, entry.count, policy.max_requests
            );
            return Err(GeogateError::quota_exceeded(tier));
        }

        entry.count += 1;
        Ok(())
    }

    /// 清理已过期的计数器，按最长窗口口径保守保留
    pub fn purge_expired(&self) {
        let now = chrono::Utc::now().timestamp();
        let max_window = self.policies.max_window_secs() as i64;
        let before = self.counters.len();
        self.counters
            .retain(|_, c| now - c.window_start < max_window);
        let purged = before - self.counters.len();
        if purged > 0 {
            debug!("Purged {} expired rate counters", purged);
        }
    }

    /// 当前跟踪的身份数量
    pub fn tracked_identities(&self) -> usize {
        self.counters.len()
    }
}

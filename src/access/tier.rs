//! 访问级别与策略表

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};

use crate::config::TiersConfig;

/// 访问级别
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, EnumIter, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro1,
    Pro2,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Pro1 => write!(f, "pro1"),
            Self::Pro2 => write!(f, "pro2"),
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "pro1" => Ok(Self::Pro1),
            "pro2" => Ok(Self::Pro2),
            _ => Err(format!("Invalid tier: '{}'. Valid: free, pro1, pro2", s)),
        }
    }
}

/// 单个 tier 的策略条目
///
/// `fields == None` 表示该 tier 可见全部字段。
#[derive(Debug, Clone)]
pub struct TierPolicy {
    pub max_requests: u32,
    pub window_secs: u64,
    pub fields: Option<Vec<String>>,
}

/// 静态策略表，启动时从配置构建，运行期只读
#[derive(Debug, Clone)]
pub struct TierPolicySet {
    free: TierPolicy,
    pro1: TierPolicy,
    pro2: TierPolicy,
}

impl TierPolicySet {
    pub fn from_config(config: &TiersConfig) -> Self {
        Self {
            free: TierPolicy {
                max_requests: config.free.max_requests,
                window_secs: config.free.window_secs,
                fields: config.free.fields.clone(),
            },
            pro1: TierPolicy {
                max_requests: config.pro1.max_requests,
                window_secs: config.pro1.window_secs,
                fields: config.pro1.fields.clone(),
            },
            pro2: TierPolicy {
                max_requests: config.pro2.max_requests,
                window_secs: config.pro2.window_secs,
                fields: config.pro2.fields.clone(),
            },
        }
    }

    pub fn get(&self, tier: Tier) -> &TierPolicy {
        match tier {
            Tier::Free => &self.free,
            Tier::Pro1 => &self.pro1,
            Tier::Pro2 => &self.pro2,
        }
    }

    /// 所有 tier 中最长的窗口，供限流器清理过期计数用
    pub fn max_window_secs(&self) -> u64 {
        self.free
            .window_secs
            .max(self.pro1.window_secs)
            .max(self.pro2.window_secs)
    }
}

impl Default for TierPolicySet {
    fn default() -> Self {
        Self::from_config(&TiersConfig::default())
    }
}

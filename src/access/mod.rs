//! 访问控制模块
//!
//! 提供三个相互独立的小组件，由 Gateway 按请求编排：
//! - [`CredentialStore`]: API key → tier 的凭证解析
//! - [`TierPolicySet`]: tier → {配额, 可见字段} 静态策略表
//! - [`RateLimiter`]: 按身份的固定窗口限流

mod rate_limit;
mod store;
mod tier;

pub use rate_limit::RateLimiter;
pub use store::{Credential, CredentialStore, Entitlement};
pub use tier::{Tier, TierPolicy, TierPolicySet};

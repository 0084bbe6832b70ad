//! 凭证缓存
//!
//! API key → [`Credential`] 的内存映射。凭证在创建后不可变，
//! 进程重启即清空（按设计不做持久化）。

use std::str::FromStr;

use dashmap::DashMap;
use rand::RngExt;
use tracing::{debug, info, warn};

use crate::config::CredentialSeed;
use crate::errors::{GeogateError, Result};

use super::tier::Tier;

/// 凭证记录
#[derive(Debug, Clone)]
pub struct Credential {
    pub key: String,
    pub tier: Tier,
    pub email: Option<String>,
}

/// 身份解析结果
///
/// `identity` 是限流的 key：有凭证时为凭证本身（同一 NAT 后的
/// 多个付费用户不共享预算），无凭证时为来源 IP。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entitlement {
    pub tier: Tier,
    pub identity: String,
}

/// 凭证缓存
#[derive(Default)]
pub struct CredentialStore {
    keys: DashMap<String, Credential>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从配置种子构建，非法 tier 名的种子跳过并告警
    pub fn from_seeds(seeds: &[CredentialSeed]) -> Self {
        let store = Self::new();
        for seed in seeds {
            match Tier::from_str(&seed.tier) {
                Ok(tier) => {
                    store.keys.insert(
                        seed.key.clone(),
                        Credential {
                            key: seed.key.clone(),
                            tier,
                            email: seed.email.clone(),
                        },
                    );
                }
                Err(e) => {
                    warn!("Skipping credential seed '{}': {}", seed.key, e);
                }
            }
        }
        info!("Credential store initialized with {} keys", store.keys.len());
        store
    }

    /// 解析请求凭证
    ///
    /// - 未携带 key → free tier，以来源 IP 作为限流身份
    /// - 携带但未注册 → Authentication 错误
    /// - 已注册 → 该凭证的 tier，以 key 本身作为限流身份
    pub fn resolve(&self, key: Option<&str>, source_ip: &str) -> Result<Entitlement> {
        match key {
            None => Ok(Entitlement {
                tier: Tier::Free,
                identity: source_ip.to_string(),
            }),
            Some(k) => match self.keys.get(k) {
                Some(cred) => Ok(Entitlement {
                    tier: cred.tier,
                    identity: k.to_string(),
                }),
                None => {
                    debug!("Unknown API key presented (len={})", k.len());
                    Err(GeogateError::authentication("Invalid API key"))
                }
            },
        }
    }

    /// 注册新凭证，返回生成的 API key
    ///
    /// key 形如 `user-{tier}-{9 位随机字母数字}`
    pub fn create(&self, email: &str, tier: Tier) -> String {
        let key = format!("user-{}-{}", tier, random_suffix(9));
        self.keys.insert(
            key.clone(),
            Credential {
                key: key.clone(),
                tier,
                email: Some(email.to_string()),
            },
        );
        info!("Registered new {} tier key for {}", tier, email);
        key
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn random_suffix(len: usize) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..len)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> CredentialStore {
        CredentialStore::from_seeds(&crate::config::StaticConfig::default().credentials)
    }

    #[test]
    fn missing_key_defaults_to_free_with_ip_identity() {
        let store = seeded_store();
        let ent = store.resolve(None, "203.0.113.9").unwrap();
        assert_eq!(ent.tier, Tier::Free);
        assert_eq!(ent.identity, "203.0.113.9");
    }

    #[test]
    fn known_key_resolves_to_its_tier() {
        let store = seeded_store();
        let ent = store.resolve(Some("abc123XYZ!"), "203.0.113.9").unwrap();
        assert_eq!(ent.tier, Tier::Free);
        assert_eq!(ent.identity, "abc123XYZ!");

        let ent = store
            .resolve(Some("pro1-5f4dcc3b5aa765d61d8327deb882cf99"), "203.0.113.9")
            .unwrap();
        assert_eq!(ent.tier, Tier::Pro1);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let store = seeded_store();
        let err = store.resolve(Some("nope"), "203.0.113.9").unwrap_err();
        assert!(matches!(err, GeogateError::Authentication(_)));
        assert_eq!(err.message(), "Invalid API key");
    }

    #[test]
    fn create_produces_resolvable_key_with_expected_shape() {
        let store = CredentialStore::new();
        let key = store.create("user@example.com", Tier::Pro2);
        assert!(key.starts_with("user-pro2-"));
        assert_eq!(key.len(), "user-pro2-".len() + 9);

        let ent = store.resolve(Some(&key), "203.0.113.9").unwrap();
        assert_eq!(ent.tier, Tier::Pro2);
        assert_eq!(ent.identity, key);
    }

    #[test]
    fn bad_seed_tier_is_skipped() {
        let seeds = vec![CredentialSeed {
            key: "broken".to_string(),
            tier: "gold".to_string(),
            email: None,
        }];
        let store = CredentialStore::from_seeds(&seeds);
        assert!(store.is_empty());
    }
}

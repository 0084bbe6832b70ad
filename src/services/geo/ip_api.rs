//! 公共 HTTP 查询服务实现
//!
//! 调用 ip-api.com 风格的免费接口，URL 模板以 `{ip}` 为占位符。
//! 同步 HTTP（ureq）放在 spawn_blocking 中执行，超时可配置。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{trace, warn};
use ureq::Agent;

use super::provider::{GeoProvider, Unavailable};
use super::record::GeoRecord;

/// 公共 API Provider
pub struct IpApiProvider {
    api_url_template: String,
    agent: Arc<Agent>,
}

impl IpApiProvider {
    /// 创建公共 API Provider
    ///
    /// `api_url_template` 使用 `{ip}` 作为占位符，
    /// 例如: `http://ip-api.com/json/{ip}`
    pub fn new(api_url_template: &str, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            api_url_template: api_url_template.to_string(),
            agent: Arc::new(agent),
        }
    }

    /// 同步请求并映射响应（在 spawn_blocking 中调用）
    fn fetch_sync(agent: &Agent, url: &str) -> Result<GeoRecord, Unavailable> {
        let resp = agent
            .get(url)
            .call()
            .map_err(|e| Unavailable::new(format!("request failed: {}", e)))?;

        let json: serde_json::Value = resp
            .into_body()
            .read_json()
            .map_err(|e| Unavailable::new(format!("response parse failed: {}", e)))?;

        // 后端显式报告 fail（保留地址、私网地址等）
        if json["status"].as_str() == Some("fail") {
            let why = json["message"].as_str().unwrap_or("unresolvable");
            trace!("Public API returned fail: {}", why);
            return Err(Unavailable::new(format!("backend fail: {}", why)));
        }

        Ok(Self::map_record(&json))
    }

    /// ip-api 原生 schema → GeoRecord，缺字段取记录默认值
    fn map_record(json: &serde_json::Value) -> GeoRecord {
        let mut rec = GeoRecord::default();

        let str_into = |key: &str, dst: &mut String| {
            if let Some(v) = json[key].as_str() {
                if !v.is_empty() {
                    *dst = v.to_string();
                }
            }
        };

        str_into("query", &mut rec.query);
        str_into("continent", &mut rec.continent);
        str_into("continentCode", &mut rec.continent_code);
        str_into("country", &mut rec.country);
        str_into("countryCode", &mut rec.country_code);
        str_into("region", &mut rec.region);
        str_into("regionName", &mut rec.region_name);
        str_into("city", &mut rec.city);
        str_into("district", &mut rec.district);
        str_into("zip", &mut rec.zip);
        str_into("timezone", &mut rec.timezone);
        str_into("currency", &mut rec.currency);
        str_into("isp", &mut rec.isp);
        str_into("org", &mut rec.org);
        str_into("as", &mut rec.as_number);
        str_into("asname", &mut rec.as_name);

        rec.lat = json["lat"].as_f64().unwrap_or(0.0);
        rec.lon = json["lon"].as_f64().unwrap_or(0.0);
        rec.offset = json["offset"].as_i64().unwrap_or(0);
        rec.mobile = json["mobile"].as_bool().unwrap_or(false);
        rec.proxy = json["proxy"].as_bool().unwrap_or(false);
        rec.hosting = json["hosting"].as_bool().unwrap_or(false);

        rec
    }
}

#[async_trait]
impl GeoProvider for IpApiProvider {
    async fn lookup(&self, ip: &str) -> Result<GeoRecord, Unavailable> {
        let url = self.api_url_template.replace("{ip}", ip);
        let agent = Arc::clone(&self.agent);
        let ip_owned = ip.to_string();

        // 同步 HTTP 放线程池执行
        let result = tokio::task::spawn_blocking(move || Self::fetch_sync(&agent, &url))
            .await
            .unwrap_or_else(|e| {
                warn!("Public API spawn_blocking failed: {}", e);
                Err(Unavailable::new(format!("join error: {}", e)))
            });

        match &result {
            Ok(rec) => trace!(
                "Public API lookup {}: country={}, city={}",
                ip_owned, rec.country, rec.city
            ),
            Err(e) => warn!("Public API lookup {} unavailable: {}", ip_owned, e),
        }
        result
    }

    fn name(&self) -> &'static str {
        "public"
    }
}

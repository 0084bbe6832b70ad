//! 商业地理位置 API 实现
//!
//! 对接 ipgeolocation.io 风格的付费接口，需要 API key。
//! key 未配置时构造仍成功，但每次查询都返回 Unavailable，
//! 由回退链决定该 tier 的降级行为。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{trace, warn};
use ureq::Agent;

use super::provider::{GeoProvider, Unavailable};
use super::record::GeoRecord;

/// 商业 API Provider
pub struct PremiumApiProvider {
    base_url: String,
    api_key: Option<String>,
    agent: Arc<Agent>,
}

impl PremiumApiProvider {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            base_url: base_url.to_string(),
            api_key,
            agent: Arc::new(agent),
        }
    }

    fn fetch_sync(agent: &Agent, url: &str) -> Result<GeoRecord, Unavailable> {
        let resp = agent
            .get(url)
            .call()
            .map_err(|e| Unavailable::new(format!("request failed: {}", e)))?;

        if resp.status().as_u16() == 401 || resp.status().as_u16() == 403 {
            return Err(Unavailable::new("auth rejected by backend"));
        }

        let json: serde_json::Value = resp
            .into_body()
            .read_json()
            .map_err(|e| Unavailable::new(format!("response parse failed: {}", e)))?;

        if let Some(msg) = json["message"].as_str() {
            // 商业接口把"查不到/参数错"都放在 message 里
            trace!("Premium API message: {}", msg);
            return Err(Unavailable::new(format!("backend fail: {}", msg)));
        }

        Ok(Self::map_record(&json))
    }

    /// ipgeolocation 原生 schema → GeoRecord
    ///
    /// 注意该接口的经纬度是字符串，security 块为嵌套对象。
    fn map_record(json: &serde_json::Value) -> GeoRecord {
        let mut rec = GeoRecord::default();

        let str_into = |key: &str, dst: &mut String| {
            if let Some(v) = json[key].as_str() {
                if !v.is_empty() {
                    *dst = v.to_string();
                }
            }
        };

        str_into("ip", &mut rec.query);
        str_into("continent_name", &mut rec.continent);
        str_into("continent_code", &mut rec.continent_code);
        str_into("country_name", &mut rec.country);
        str_into("country_code2", &mut rec.country_code);
        str_into("state_code", &mut rec.region);
        str_into("state_prov", &mut rec.region_name);
        str_into("city", &mut rec.city);
        str_into("district", &mut rec.district);
        str_into("zipcode", &mut rec.zip);
        str_into("isp", &mut rec.isp);
        str_into("organization", &mut rec.org);
        str_into("asn", &mut rec.as_number);

        // 字符串形式的经纬度
        rec.lat = json["latitude"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .or_else(|| json["latitude"].as_f64())
            .unwrap_or(0.0);
        rec.lon = json["longitude"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .or_else(|| json["longitude"].as_f64())
            .unwrap_or(0.0);

        if let Some(tz) = json["time_zone"]["name"].as_str() {
            rec.timezone = tz.to_string();
        }
        if let Some(offset_hours) = json["time_zone"]["offset"].as_f64() {
            rec.offset = (offset_hours * 3600.0) as i64;
        }
        if let Some(currency) = json["currency"]["code"].as_str() {
            rec.currency = currency.to_string();
        }

        let security = &json["security"];
        rec.proxy = security["is_proxy"].as_bool().unwrap_or(false);
        rec.hosting = security["is_cloud_provider"].as_bool().unwrap_or(false);
        if let Some(vpn) = security["is_vpn"].as_bool() {
            rec.vpn = Some(vpn);
        }
        if let Some(tor) = security["is_tor"].as_bool() {
            rec.tor = Some(tor);
        }
        if let Some(user_type) = json["user_type"].as_str() {
            rec.user_type = Some(user_type.to_string());
        }
        if let Some(radius) = json["accuracy_radius"]
            .as_u64()
            .or_else(|| json["accuracy_radius"].as_str().and_then(|s| s.parse().ok()))
        {
            rec.accuracy_radius = Some(radius as u32);
        }

        rec
    }
}

#[async_trait]
impl GeoProvider for PremiumApiProvider {
    async fn lookup(&self, ip: &str) -> Result<GeoRecord, Unavailable> {
        let Some(ref key) = self.api_key else {
            return Err(Unavailable::new("api key not configured"));
        };

        let url = format!("{}?apiKey={}&ip={}", self.base_url, key, ip);
        let agent = Arc::clone(&self.agent);

        let result = tokio::task::spawn_blocking(move || Self::fetch_sync(&agent, &url))
            .await
            .unwrap_or_else(|e| {
                warn!("Premium API spawn_blocking failed: {}", e);
                Err(Unavailable::new(format!("join error: {}", e)))
            });

        if let Err(ref e) = result {
            warn!("Premium API lookup {} unavailable: {}", ip, e);
        }
        result
    }

    fn name(&self) -> &'static str {
        "premium"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_api_key_is_unavailable_without_network() {
        let provider = PremiumApiProvider::new(
            "https://api.ipgeolocation.io/ipgeo",
            None,
            Duration::from_secs(2),
        );
        let err = provider.lookup("8.8.8.8").await.unwrap_err();
        assert_eq!(err.reason, "api key not configured");
    }

    #[test]
    fn maps_premium_schema_with_nested_blocks() {
        let json = serde_json::json!({
            "ip": "8.8.8.8",
            "continent_name": "North America",
            "continent_code": "NA",
            "country_name": "United States",
            "country_code2": "US",
            "state_prov": "California",
            "state_code": "CA",
            "city": "Mountain View",
            "zipcode": "94043",
            "latitude": "37.42240",
            "longitude": "-122.08421",
            "isp": "Google LLC",
            "organization": "Google LLC",
            "asn": "AS15169",
            "user_type": "hosting",
            "accuracy_radius": "5",
            "time_zone": { "name": "America/Los_Angeles", "offset": -8.0 },
            "currency": { "code": "USD" },
            "security": {
                "is_proxy": false,
                "is_vpn": false,
                "is_tor": false,
                "is_cloud_provider": true
            }
        });

        let rec = PremiumApiProvider::map_record(&json);
        assert_eq!(rec.query, "8.8.8.8");
        assert_eq!(rec.region, "CA");
        assert_eq!(rec.region_name, "California");
        assert_eq!(rec.lat, 37.4224);
        assert_eq!(rec.offset, -28800);
        assert_eq!(rec.currency, "USD");
        assert_eq!(rec.vpn, Some(false));
        assert_eq!(rec.tor, Some(false));
        assert_eq!(rec.user_type.as_deref(), Some("hosting"));
        assert_eq!(rec.accuracy_radius, Some(5));
        assert!(rec.hosting);
    }

    #[test]
    fn backend_message_means_unavailable_schema() {
        // message 字段存在即视为失败响应
        let json = serde_json::json!({ "message": "Provided IP is a bogon" });
        assert!(json["message"].as_str().is_some());
    }
}

//! HTTP API 集成测试
//!
//! 用 actix_web::test 驱动完整路由栈（健康检查 / 注册 / 查询），
//! 后端 provider 全部用 mock 替身，不发真实请求。

use std::collections::HashMap;
use std::sync::Arc;

use actix_web::{App, test, web};
use async_trait::async_trait;

use geogate::access::{CredentialStore, Tier, TierPolicySet};
use geogate::api::services::{AppStartTime, health_routes, lookup_routes, register_routes};
use geogate::config::{StaticConfig, TierQuota, TiersConfig};
use geogate::services::Gateway;
use geogate::services::geo::{GeoProvider, GeoRecord, ProviderChain, Unavailable};

// =============================================================================
// Test helpers
// =============================================================================

struct StaticProvider {
    record: GeoRecord,
}

#[async_trait]
impl GeoProvider for StaticProvider {
    async fn lookup(&self, ip: &str) -> Result<GeoRecord, Unavailable> {
        let mut rec = self.record.clone();
        rec.query = ip.to_string();
        Ok(rec)
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

struct DeadProvider;

#[async_trait]
impl GeoProvider for DeadProvider {
    async fn lookup(&self, _ip: &str) -> Result<GeoRecord, Unavailable> {
        Err(Unavailable::new("simulated outage"))
    }

    fn name(&self) -> &'static str {
        "dead"
    }
}

fn sample_record() -> GeoRecord {
    let mut rec = GeoRecord::new("8.8.8.8");
    rec.country = "United States".to_string();
    rec.country_code = "US".to_string();
    rec.region_name = "California".to_string();
    rec.city = "Mountain View".to_string();
    rec.lat = 37.4223;
    rec.lon = -122.085;
    rec.timezone = "America/Los_Angeles".to_string();
    rec.isp = "Google LLC".to_string();
    rec
}

fn mock_routes(chain: ProviderChain) -> HashMap<Tier, ProviderChain> {
    let mut routes = HashMap::new();
    routes.insert(Tier::Free, chain.clone());
    routes.insert(Tier::Pro1, chain.clone());
    routes.insert(Tier::Pro2, chain);
    routes
}

fn test_gateway(tiers: &TiersConfig, chain: ProviderChain) -> Arc<Gateway> {
    let store = Arc::new(CredentialStore::from_seeds(
        &StaticConfig::default().credentials,
    ));
    Arc::new(Gateway::new(
        store,
        Arc::new(TierPolicySet::from_config(tiers)),
        mock_routes(chain),
    ))
}

fn serving_chain() -> ProviderChain {
    ProviderChain {
        primary: Arc::new(StaticProvider {
            record: sample_record(),
        }),
        secondary: None,
    }
}

macro_rules! test_app {
    ($gateway:expr) => {{
        let store = Arc::clone($gateway.credential_store());
        test::init_service(
            App::new()
                .app_data(web::Data::new(Arc::clone(&$gateway)))
                .app_data(web::Data::new(store))
                .app_data(web::Data::new(AppStartTime {
                    start_datetime: chrono::Utc::now(),
                }))
                .service(health_routes())
                .service(register_routes())
                .service(lookup_routes()),
        )
        .await
    }};
}

// =============================================================================
// Lookup routes
// =============================================================================

#[actix_rt::test]
async fn json_lookup_with_free_key_returns_projected_payload() {
    let gateway = test_gateway(&TiersConfig::default(), serving_chain());
    let app = test_app!(gateway);

    let req = test::TestRequest::get()
        .uri("/json/8.8.8.8?key=abc123XYZ!")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/json; charset=utf-8"
    );
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["status"], "success");
    assert_eq!(json["query"], "8.8.8.8");
    assert_eq!(json["city"], "Mountain View");
    // free tier 不可见的字段被投影剔除
    assert!(json.get("countryCode").is_none());
    assert_eq!(json.as_object().unwrap().len(), 8);
}

#[actix_rt::test]
async fn api_key_header_is_honored() {
    let gateway = test_gateway(&TiersConfig::default(), serving_chain());
    let app = test_app!(gateway);

    let req = test::TestRequest::get()
        .uri("/json/8.8.8.8")
        .insert_header(("X-Api-Key", "pro1-5f4dcc3b5aa765d61d8327deb882cf99"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["countryCode"], "US");
    assert_eq!(json["regionName"], "California");
}

#[actix_rt::test]
async fn malformed_ip_returns_400_with_fail_envelope() {
    let gateway = test_gateway(&TiersConfig::default(), serving_chain());
    let app = test_app!(gateway);

    let req = test::TestRequest::get()
        .uri("/json/999.999.999.999")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 400);
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["status"], "fail");
    assert_eq!(json["message"], "Invalid IP address");
}

#[actix_rt::test]
async fn unknown_key_returns_401() {
    let gateway = test_gateway(&TiersConfig::default(), serving_chain());
    let app = test_app!(gateway);

    let req = test::TestRequest::get()
        .uri("/json/8.8.8.8?key=bogus-key")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 401);
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["message"], "Invalid API key");
}

#[actix_rt::test]
async fn exhausted_quota_returns_429_with_tier_name() {
    let mut tiers = TiersConfig::default();
    tiers.free = TierQuota {
        max_requests: 1,
        window_secs: 3600,
        fields: None,
    };
    let gateway = test_gateway(&tiers, serving_chain());
    let app = test_app!(gateway);

    let first = test::TestRequest::get().uri("/json/8.8.8.8").to_request();
    assert!(test::call_service(&app, first).await.status().is_success());

    let second = test::TestRequest::get().uri("/json/8.8.8.8").to_request();
    let resp = test::call_service(&app, second).await;
    assert_eq!(resp.status().as_u16(), 429);
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["message"], "Too many requests for free tier");
}

#[actix_rt::test]
async fn all_backends_down_returns_404_ip_not_found() {
    let gateway = test_gateway(
        &TiersConfig::default(),
        ProviderChain {
            primary: Arc::new(DeadProvider),
            secondary: Some(Arc::new(DeadProvider)),
        },
    );
    let app = test_app!(gateway);

    let req = test::TestRequest::get().uri("/json/8.8.8.8").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 404);
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["message"], "IP not found");
}

#[actix_rt::test]
async fn xml_lookup_wraps_fields_in_response_element() {
    let gateway = test_gateway(&TiersConfig::default(), serving_chain());
    let app = test_app!(gateway);

    let req = test::TestRequest::get()
        .uri("/xml/8.8.8.8?key=pro1-5f4dcc3b5aa765d61d8327deb882cf99")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/xml; charset=utf-8"
    );
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.starts_with("<response>"));
    assert!(body.contains("<city>Mountain View</city>"));
    assert!(body.ends_with("</response>"));
}

#[actix_rt::test]
async fn csv_lookup_emits_header_and_one_data_row() {
    let gateway = test_gateway(&TiersConfig::default(), serving_chain());
    let app = test_app!(gateway);

    let req = test::TestRequest::get()
        .uri("/csv/8.8.8.8?key=abc123XYZ!")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "text/csv; charset=utf-8"
    );
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 2);
    // 过滤后的 CSV 不含 status 列
    assert!(!lines[0].contains("status"));
    assert!(lines[0].starts_with("query,"));
    assert!(lines[1].contains("Mountain View"));
}

#[actix_rt::test]
async fn unknown_format_segment_is_plain_404() {
    let gateway = test_gateway(&TiersConfig::default(), serving_chain());
    let app = test_app!(gateway);

    let req = test::TestRequest::get().uri("/yaml/8.8.8.8").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 404);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert_eq!(body, "Not Found");
}

#[actix_rt::test]
async fn lookup_without_ip_targets_the_caller() {
    let gateway = test_gateway(&TiersConfig::default(), serving_chain());
    let app = test_app!(gateway);

    // 测试环境没有 peer 地址，来源 IP 回退为 127.0.0.1
    let req = test::TestRequest::get()
        .uri("/json?key=pro1-5f4dcc3b5aa765d61d8327deb882cf99")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["query"], "127.0.0.1");
}

// =============================================================================
// Register route
// =============================================================================

#[actix_rt::test]
async fn register_issues_a_usable_key() {
    let gateway = test_gateway(&TiersConfig::default(), serving_chain());
    let app = test_app!(gateway);

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(serde_json::json!({"email": "dev@example.com", "tier": "pro2"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["status"], "success");
    assert_eq!(json["tier"], "pro2");
    let api_key = json["apiKey"].as_str().unwrap().to_string();
    assert!(api_key.starts_with("user-pro2-"));

    // 新 key 立刻可用
    let req = test::TestRequest::get()
        .uri(&format!("/json/8.8.8.8?key={}", api_key))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["countryCode"], "US");
}

#[actix_rt::test]
async fn register_rejects_missing_email_and_unknown_tier() {
    let gateway = test_gateway(&TiersConfig::default(), serving_chain());
    let app = test_app!(gateway);

    for payload in [
        serde_json::json!({"tier": "pro1"}),
        serde_json::json!({"email": "", "tier": "pro1"}),
        serde_json::json!({"email": "dev@example.com", "tier": "platinum"}),
    ] {
        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["status"], "fail");
        assert_eq!(json["message"], "Invalid registration data");
    }
}

// =============================================================================
// Health routes
// =============================================================================

#[actix_rt::test]
async fn health_reports_routing_and_credentials() {
    let gateway = test_gateway(&TiersConfig::default(), serving_chain());
    let app = test_app!(gateway);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["credentials"], 3);
    assert_eq!(json["routing"].as_array().unwrap().len(), 3);
}

#[actix_rt::test]
async fn liveness_returns_no_content() {
    let gateway = test_gateway(&TiersConfig::default(), serving_chain());
    let app = test_app!(gateway);

    let req = test::TestRequest::get().uri("/health/live").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 204);
}

//! 健康检查路由
//!
//! 基础设施端点，直接报告网关的路由接线与运行时长，
//! 不触达任何外部后端（探针要求快速返回）。

use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::trace;

use crate::access::Tier;
use crate::services::Gateway;

/// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    uptime_seconds: u32,
    credentials: usize,
    routing: Vec<TierRoute>,
}

#[derive(Debug, Serialize)]
struct TierRoute {
    tier: Tier,
    primary: String,
    secondary: Option<String>,
}

pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        gateway: web::Data<Arc<Gateway>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        trace!("Received health check request");

        let now = chrono::Utc::now();
        let uptime_seconds = (now - app_start_time.start_datetime).num_seconds().max(0) as u32;

        let routing = Tier::iter()
            .filter_map(|tier| {
                gateway.route_names(tier).map(|(primary, secondary)| TierRoute {
                    tier,
                    primary,
                    secondary,
                })
            })
            .collect();

        HttpResponse::Ok()
            .append_header(("Content-Type", "application/json; charset=utf-8"))
            .json(HealthResponse {
                status: "healthy",
                timestamp: now.to_rfc3339(),
                uptime_seconds,
                credentials: gateway.credential_store().len(),
                routing,
            })
    }

    /// 活跃性检查，只确认进程在响应
    pub async fn liveness_check() -> impl Responder {
        trace!("Received liveness check request");
        HttpResponse::NoContent().finish()
    }
}

/// Health 路由配置
pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
        .route("/live", web::get().to(HealthService::liveness_check))
        .route("/live", web::head().to(HealthService::liveness_check))
}

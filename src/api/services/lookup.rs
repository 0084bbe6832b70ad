//! 查询路由 handler
//!
//! `GET /{format}/{ip}` 与 `GET /{format}`（缺省查调用方 IP），
//! format ∈ {json, xml, csv}。凭证通过 `?key=` 或 `X-Api-Key` 头携带。

use std::str::FromStr;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::Deserialize;
use tracing::trace;

use crate::errors::GeogateError;
use crate::output::{OutputFormat, fail_body};
use crate::services::{Gateway, LookupRequest};
use crate::utils::extract_client_ip;

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub key: Option<String>,
}

pub struct LookupService;

impl LookupService {
    pub async fn lookup_with_ip(
        req: HttpRequest,
        path: web::Path<(String, String)>,
        query: web::Query<LookupQuery>,
        gateway: web::Data<Arc<Gateway>>,
    ) -> impl Responder {
        let (format, ip) = path.into_inner();
        Self::process(req, format, Some(ip), query.into_inner(), gateway).await
    }

    pub async fn lookup_self(
        req: HttpRequest,
        path: web::Path<String>,
        query: web::Query<LookupQuery>,
        gateway: web::Data<Arc<Gateway>>,
    ) -> impl Responder {
        let format = path.into_inner();
        Self::process(req, format, None, query.into_inner(), gateway).await
    }

    async fn process(
        req: HttpRequest,
        format: String,
        target_ip: Option<String>,
        query: LookupQuery,
        gateway: web::Data<Arc<Gateway>>,
    ) -> HttpResponse {
        // 未知格式不属于 API 面，按普通 404 处理
        let Ok(format) = OutputFormat::from_str(&format) else {
            trace!("Unknown output format segment: {}", format);
            return HttpResponse::NotFound()
                .insert_header(("Content-Type", "text/plain; charset=utf-8"))
                .body("Not Found");
        };

        let key = query.key.or_else(|| extract_api_key_header(&req));
        let source_ip = extract_client_ip(&req).unwrap_or_else(|| "127.0.0.1".to_string());

        let request = LookupRequest {
            key,
            target_ip,
            source_ip,
            format,
        };

        match gateway.handle(request).await {
            Ok(response) => HttpResponse::Ok()
                .insert_header(("Content-Type", response.content_type))
                .body(response.body),
            Err(e) => Self::error_response(&e, format),
        }
    }

    /// 错误分类 → HTTP 状态码，响应体用请求格式的 fail 信封
    fn error_response(err: &GeogateError, format: OutputFormat) -> HttpResponse {
        let (status, message) = match err {
            GeogateError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg.as_str()),
            GeogateError::QuotaExceeded(msg) => (StatusCode::TOO_MANY_REQUESTS, msg.as_str()),
            GeogateError::LookupNotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            GeogateError::MalformedInput(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            // ProviderUnavailable 在回退链内消化，这里兜底当内部错误
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        HttpResponse::build(status)
            .insert_header(("Content-Type", format.content_type()))
            .body(fail_body(message, format))
    }
}

/// 从 X-Api-Key 头提取凭证
fn extract_api_key_header(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("x-api-key")
        .and_then(|h| h.to_str().ok())
        .map(String::from)
}

/// 查询路由配置
///
/// 必须注册在具体路由（/health, /register）之后，
/// `/{format}` 是兜底模式。
pub fn lookup_routes() -> actix_web::Scope {
    web::scope("")
        .route(
            "/{format}/{ip}",
            web::get().to(LookupService::lookup_with_ip),
        )
        .route("/{format}", web::get().to(LookupService::lookup_self))
}

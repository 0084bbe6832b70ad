//! 凭证注册路由
//!
//! `POST /register` {email, tier} → 新 API key。
//! 简单 CRUD：创建即不可变，不提供更新/吊销。

use std::str::FromStr;
use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::access::{CredentialStore, Tier};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub tier: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub status: &'static str,
    #[serde(rename = "apiKey")]
    pub api_key: String,
    pub tier: Tier,
}

#[derive(Debug, Serialize)]
struct RegisterError {
    status: &'static str,
    message: &'static str,
}

pub struct RegisterService;

impl RegisterService {
    pub async fn register(
        body: web::Json<RegisterRequest>,
        store: web::Data<Arc<CredentialStore>>,
    ) -> impl Responder {
        let req = body.into_inner();

        let (Some(email), Some(tier_name)) = (req.email, req.tier) else {
            return Self::invalid_registration();
        };
        if email.is_empty() {
            return Self::invalid_registration();
        }
        let Ok(tier) = Tier::from_str(&tier_name) else {
            debug!("Registration with unknown tier '{}'", tier_name);
            return Self::invalid_registration();
        };

        let api_key = store.create(&email, tier);
        HttpResponse::Ok().json(RegisterResponse {
            status: "success",
            api_key,
            tier,
        })
    }

    fn invalid_registration() -> HttpResponse {
        HttpResponse::BadRequest().json(RegisterError {
            status: "fail",
            message: "Invalid registration data",
        })
    }
}

/// 注册路由配置
pub fn register_routes() -> actix_web::Scope {
    web::scope("/register").route("", web::post().to(RegisterService::register))
}

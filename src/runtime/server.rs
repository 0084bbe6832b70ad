//! Server mode
//!
//! This module contains the HTTP server startup logic.
//! It assembles the gateway from configuration and starts the
//! HTTP server with all routes.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, middleware::Compress, web};
use anyhow::Result;
use tracing::{info, warn};

use crate::api::middleware::RequestIdMiddleware;
use crate::api::services::{AppStartTime, health_routes, lookup_routes, register_routes};
use crate::config::StaticConfig;
use crate::services::Gateway;

/// 限流计数器后台清理间隔
const RATE_PURGE_INTERVAL_SECS: u64 = 10 * 60;

/// Run the HTTP server
///
/// This function:
/// 1. Records startup time
/// 2. Builds the gateway (credential store, policies, provider routing)
/// 3. Spawns the rate-counter purge task
/// 4. Configures and starts the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: StaticConfig) -> Result<()> {
    // Record application start time
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    let gateway = Arc::new(
        Gateway::from_config(&config).map_err(|e| anyhow::anyhow!(e.format_simple()))?,
    );
    let store = Arc::clone(gateway.credential_store());

    // 过期限流计数的周期清理
    let purge_gateway = Arc::clone(&gateway);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(RATE_PURGE_INTERVAL_SECS));
        loop {
            interval.tick().await;
            purge_gateway.purge_rate_counters();
        }
    });

    let cpu_count = config.server.cpu_count.min(32);
    info!("Using {} CPU cores for the server", cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);

    // Configure HTTP server
    // 注意路由顺序：/health 与 /register 在前，/{format} 兜底在后
    HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(Compress::default())
            .app_data(web::Data::new(gateway.clone()))
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .app_data(web::PayloadConfig::new(64 * 1024))
            .service(health_routes())
            .service(register_routes())
            .service(lookup_routes())
    })
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_millis(5000))
    .client_disconnect_timeout(Duration::from_millis(1000))
    .workers(cpu_count)
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}

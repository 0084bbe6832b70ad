use tracing::debug;

use geogate::config::StaticConfig;
use geogate::runtime::run_server;
use geogate::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = StaticConfig::load();

    // guard 活到进程结束，保证日志完整落盘
    let _log_guard = init_logging(&config.logging);
    debug!("Configuration loaded: {:?}", config.server);

    run_server(config).await
}

mod config;
mod errors;
mod handlers;
mod models;
mod services;
#[cfg(feature = "web-server")]
mod web; // Form page + JSON/CSV endpoints

use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;

use config::Config;
use handlers::PlanHandler;
use services::{PlanProvider, PlanService};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables before the logger reads RUST_LOG
    dotenv().ok();
    env_logger::init();

    log::info!("🚀 Starting NutriPlan...");

    let config = Config::from_env()?;
    log::info!(
        "✅ Configuration loaded (provider timeout {:?}, bind {})",
        config.provider_timeout,
        config.bind_addr
    );

    let provider = PlanProvider::from_config(&config)?;
    log::info!("✅ Plan provider initialized ({} mode)", provider.source());

    let provider: Arc<dyn PlanService> = Arc::new(provider);
    let plan_handler = Arc::new(PlanHandler::new(provider));
    log::info!("✅ Plan handler initialized");

    #[cfg(feature = "web-server")]
    {
        let app = web::create_router(plan_handler.clone());
        let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
        log::info!("🌐 Web server listening on http://{}", config.bind_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("❌ Web server stopped: {}", e);
            }
        });
    }

    #[cfg(not(feature = "web-server"))]
    {
        let _ = &plan_handler;
        log::warn!("⚠️ Built without the web-server feature, nothing to serve");
        return Ok(());
    }

    #[cfg(feature = "web-server")]
    {
        log::info!("🎉 Ready! Press Ctrl+C to stop");
        tokio::signal::ctrl_c().await?;
        log::info!("🛑 Shutting down...");
        Ok(())
    }
}

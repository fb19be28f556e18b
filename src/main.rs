use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};

use schoolcast::bootstrap;
use schoolcast::config;
use schoolcast::db;
use schoolcast::gateway::GatewayAdapter;
use schoolcast::ledger::PgLedger;
use schoolcast::routes;
use schoolcast::services::{NotificationService, PgContactDirectory};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = config::Config::from_env().map_err(|e| {
        log::error!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!("Starting Schoolcast on {}:{}", config.host, config.port);

    let db_pool = db::create_pool(&config.database).await.map_err(|e| {
        log::error!("Database pool error: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    db::run_migrations(&db_pool).await.map_err(|e| {
        log::error!("Migration error: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    bootstrap::create_api_token_if_needed(&db_pool).await;

    let gateways = GatewayAdapter::from_config(&config.gateways).map_err(|e| {
        log::error!("Gateway configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    for channel in schoolcast::models::Channel::ALL {
        match gateways.provider_for(channel) {
            Some(provider) => log::info!("Channel {} served by {}", channel, provider),
            None => log::warn!(
                "Channel {} has no provider configured; batches on it will be rejected",
                channel
            ),
        }
    }

    // One service for the whole process, so provider pacing spans all batches
    let notifications = web::Data::new(NotificationService::new(
        &config.dispatch,
        gateways,
        Arc::new(PgLedger::new(db_pool.clone())),
        Arc::new(PgContactDirectory::new(db_pool.clone())),
    ));

    let host = config.host.clone();
    let port = config.port;

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CONTENT_TYPE,
            ])
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(notifications.clone())
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .wrap(cors)
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .shutdown_timeout(30)
    .run();

    let server_handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        log::info!("Shutdown signal received, stopping server...");
        server_handle.stop(true).await;
    });

    server.await
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                log::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use log::info;

use tenant_bench_api::{configure_app_with_options, ApiConfiguration, ApiResponse, CoreServices};
use tenant_bench_core::config::load_app_config;
use tenant_bench_persistence::MigrationService;
use tenant_bench_services::{init_logger_with_default, init_pg_pool};

async fn default_404_handler() -> impl actix_web::Responder {
    ApiResponse::<()>::not_found("Resource not found")
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config =
        load_app_config().map_err(|e| anyhow::anyhow!("Failed to load application configuration: {e}"))?;

    init_logger_with_default(&config.log.level);

    info!("Starting tenant-bench server...");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log.level);

    let pool = init_pg_pool(&config.database.connection_string, config.database.max_connections)
        .await
        .context("Failed to create database connection pool")?;

    MigrationService::new(pool.clone())
        .run_migrations()
        .await
        .context("Failed to run database migrations")?;

    let services = web::Data::new(CoreServices::new(config.clone(), pool));

    let bind_address = format!("{}:{}", config.api.host, config.api.port);
    let bind_address_clone = bind_address.clone();
    info!("Starting HTTP server at http://{bind_address}");

    let api_config = ApiConfiguration {
        enable_docs: config.api.enable_docs,
    };

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let services = services.clone();
        App::new()
            .wrap(Logger::new("%a %{User-Agent}i %r %s %D"))
            .wrap(cors)
            .configure(move |cfg| configure_app_with_options(cfg, services, api_config))
            .default_service(web::route().to(default_404_handler))
    })
    .bind(&bind_address)
    .map_err(|e| anyhow::anyhow!("Failed to bind to address {bind_address_clone}: {e}"))?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("HTTP server error: {e}"))
}

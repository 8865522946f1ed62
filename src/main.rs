//! Caller-ID allocation engine — HTTP server
//!
//! Wires the Coordination Store (Redis), the Pool Store (PostgreSQL), and
//! the `Allocator` behind a thin actix-web surface: `/health` plus the
//! `allocate`/`release`/`lookup_reservation` routes (`spec.md` §6).

use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use callerid_allocator::Allocator;
use callerid_api::{configure_allocations, AppAllocator};
use callerid_coordination::RedisCoordinationStore;
use callerid_core::AppConfig;
use callerid_pool::{create_pool, PgAllocationLogRepository, PgCallerIdRepository};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Health check endpoint
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "callerid-allocator",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Configure API routes
fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(configure_allocations),
    );
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("callerid_allocator_service=info,callerid_allocator=info,callerid_api=info,callerid_pool=info,callerid_coordination=info,actix_web=info,sqlx=warn")
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!(
        "Starting caller-ID allocation engine v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = AppConfig::load().expect("failed to load configuration");

    info!("Connecting to the Pool Store (PostgreSQL)...");
    let pool = create_pool(&config.database.url, Some(config.database.max_connections))
        .await
        .expect("failed to create Pool Store connection pool");
    info!(
        "Pool Store connection established with {} max connections",
        config.database.max_connections
    );

    info!("Connecting to the Coordination Store (Redis)...");
    let coordination = RedisCoordinationStore::new(&config.redis.url)
        .await
        .expect("failed to connect to Coordination Store");
    coordination
        .ping()
        .await
        .expect("Coordination Store did not respond to ping");
    info!("Coordination Store connection established");

    let caller_id_repo = Arc::new(PgCallerIdRepository::new(pool.clone()));
    let allocation_log = Arc::new(PgAllocationLogRepository::new(pool.clone()));

    let allocator: Arc<AppAllocator> = Arc::new(
        Allocator::new(Arc::new(coordination), caller_id_repo, config.allocator.clone())
            .with_log(allocation_log),
    );

    let bind_addr = config.server_addr();
    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, config.server.workers
    );

    let workers = config.server.workers;

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(allocator.clone()))
            .app_data(web::PayloadConfig::new(64 * 1024))
            .wrap(middleware::Logger::new("%a \"%r\" %s %b %Dms"))
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_routes)
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/api/v1/health"))
                        .finish()
                }),
            )
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await
}

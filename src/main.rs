use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use portfolio_contact::{
    background_task::start_prune_task,
    graceful_shutdown::shutdown_signal,
    repositories::rate_limit::RateLimitStore,
    routes::configure_routes,
    settings::{AppConfig, AppEnvironment},
    telemetry::init_tracing,
    use_cases::rate_limit::RateLimiter,
    web::build_cors,
    AppState,
};
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing(&AppEnvironment::current().unwrap_or(AppEnvironment::Development));

    let config = match AppConfig::new() {
        Ok(cfg) => {
            tracing::info!("Loaded configuration: {:?}", cfg);
            cfg
        },
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = web::Data::new(AppState::new(&config)?);

    let server_addr = format!("{}:{}", config.host, config.port);
    let cors_origins = config.cors_origins();

    let limiter = &app_state.contact_handler.rate_limiter;
    let pruner = RateLimiter::new(limiter.store.clone(), *limiter.policy());
    tracing::info!(
        "Starting {} v{} on {} (rate limit store: {})",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr,
        pruner.store.backend_name()
    );

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(build_cors(&cors_origins))
            .wrap(NormalizePath::trim())
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .workers(config.worker_count)
    .bind(&server_addr)?
    .run();

    let handle = server.handle();

    tokio::spawn(start_prune_task(pruner, config.rate_limit.prune_interval));

    tokio::select! {
        res = server => res?,
        _ = shutdown_signal() => {
            handle.stop(true).await;
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

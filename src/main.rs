mod api;
mod config;
mod database;
mod jobs;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use std::time::Duration;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::AppState;
use crate::config::Config;
use crate::jobs::notification_worker::{start_notification_worker, NotificationQueue};
use crate::utils::validation::Validator;

fn startup_error<E: std::fmt::Display>(context: &str, err: E) -> io::Error {
    log::error!("❌ {}: {}", context, err);
    io::Error::other(format!("{}: {}", context, err))
}

fn cors(config: &Config) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![header::CONTENT_TYPE])
        .max_age(3600);

    if config.allows_any_origin() {
        cors = cors.allow_any_origin();
    } else {
        for origin in &config.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
        cors = cors.supports_credentials();
    }
    cors
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
            return Err(startup_error("Invalid configuration", e));
        }
    };

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(config.log_level.as_str()));

    log::info!("🚀 Starting Intro-Hub...");

    let store = database::connect(&config.database_url)
        .await
        .map_err(|e| startup_error("Failed to open store", e))?;
    log::info!("✅ Store ready");

    let notifier = services::notifier::from_settings(config.email.clone())
        .map_err(|e| startup_error("Failed to build notifier", e))?;

    let (notifications, receiver) = NotificationQueue::channel(config.notification_queue_capacity);
    let worker = start_notification_worker(store.clone(), notifier, receiver);

    let state = web::Data::new(AppState {
        store,
        auth: config.auth.clone(),
        validator: Validator::new(config.min_password_length),
        notifications,
    });

    let host = config.host.clone();
    let port = config.port;

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    let openapi = api::swagger::ApiDoc::openapi();

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors(&config))
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
            .configure(api::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    // Queue handles died with the server; give pending emails a moment.
    match tokio::time::timeout(Duration::from_secs(10), worker).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::error!("❌ Notification worker panicked: {}", e),
        Err(_) => log::warn!("⚠️  Notification worker still busy at shutdown"),
    }
    log::info!("👋 Intro-Hub stopped");
    Ok(())
}

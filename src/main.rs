//! Coffee Shift Backend
//!
//! REST backend for a coffee shop's staff roster, availability and weekly
//! shift schedule, with SQLite persistence and pluggable schedule generation.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod scheduling;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use scheduling::{GreedyGenerator, RemoteGenerator, ScheduleGenerator, ScheduleService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub schedule: Arc<ScheduleService>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Coffee Shift Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (COFFEE_API_PSK). Authentication is disabled!");
    }
    if config.admin_key.is_none() {
        tracing::warn!(
            "No admin key configured (COFFEE_ADMIN_KEY). Requests without {} act as admin!",
            auth::STAFF_ID_HEADER
        );
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    if config.seed_demo {
        db::seed_demo_staff(&repo).await?;
    }

    // Load scheduling state
    let requirements = repo.load_requirements().await;
    let schedule = repo.load_schedule().await;
    tracing::info!("Loaded schedule with {} shift(s)", schedule.len());

    let generator: Arc<dyn ScheduleGenerator> = match &config.generator_url {
        Some(url) => Arc::new(RemoteGenerator::new(
            url.clone(),
            config.generator_token.clone(),
            config.generator_timeout,
        )),
        None => Arc::new(GreedyGenerator),
    };
    tracing::info!("Schedule generator: {}", generator.name());

    let schedule = Arc::new(ScheduleService::new(
        requirements,
        schedule,
        generator,
        config.generator_timeout,
    ));

    // Create application state
    let state = AppState {
        repo,
        schedule,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        // Datastore
        .route("/datastore", get(api::get_datastore))
        .route("/datastore/revision", get(api::get_revision))
        // Staff
        .route("/staff", get(api::list_staff).post(api::create_staff))
        .route(
            "/staff/{id}",
            get(api::get_staff)
                .put(api::update_staff)
                .delete(api::delete_staff),
        )
        .route("/staff/{id}/availability", put(api::set_availability))
        .route(
            "/staff/{id}/availability/toggle",
            post(api::toggle_availability),
        )
        // Requirements
        .route("/requirements", get(api::get_requirements))
        .route("/requirements/{day}/{shift}", put(api::update_requirement))
        // Schedule
        .route("/schedule", get(api::get_schedule))
        .route("/schedule/grid", get(api::get_grid))
        .route("/schedule/generate", post(api::generate_schedule))
        .route("/schedule/{day}/{shift}", get(api::get_cell))
        .route(
            "/schedule/{day}/{shift}/assignments",
            post(api::assign_staff),
        )
        .route(
            "/schedule/{day}/{shift}/assignments/{staff_id}",
            delete(api::unassign_staff),
        )
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use mentorhero_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = mentorhero_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, media::ImageStore, middleware::security::SecurityHeadersLayer};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use mentorhero_shared::auth::middleware::create_jwt_middleware;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Image host client; None when uploads are not configured
    pub media: Option<ImageStore>,
}

impl AppState {
    /// Creates new application state
    ///
    /// The image host client is built here from the optional media config
    /// so handlers only see a ready-to-use `Option<ImageStore>`.
    pub fn new(db: PgPool, config: Config) -> Self {
        let media = config
            .media
            .as_ref()
            .map(|m| ImageStore::new(m.upload_url.clone(), m.upload_preset.clone()));

        Self {
            db,
            config: Arc::new(config),
            media,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// The router is organized as follows:
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /api/
///     ├── /catalog/                    # Reference data (public)
///     │   ├── GET /majors
///     │   └── GET /subjects
///     ├── /auth/                       # Authentication (public)
///     │   ├── POST /register
///     │   └── POST /login
///     ├── /users/                      # Profiles (authenticated)
///     │   ├── GET   /profile
///     │   ├── PATCH /update-profile
///     │   ├── GET   /tutors
///     │   └── GET   /profile/:id
///     └── /solicitudes/                # Request lifecycle (authenticated)
///         ├── POST  /
///         ├── GET   /tutor
///         ├── GET   /aprendiz
///         ├── PATCH /:id/status
///         ├── POST  /finalizar
///         └── POST  /calificar-tutor
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Compression (gzip/brotli)
/// 4. Security headers
/// 5. Authentication (per-group, JWT bearer tokens)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let jwt_layer = axum::middleware::from_fn(create_jwt_middleware(state.jwt_secret().to_owned()));

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Catalog routes (public; registration and request forms need the ids
    // before any session exists)
    let catalog_routes = Router::new()
        .route("/majors", get(routes::catalog::list_majors))
        .route("/subjects", get(routes::catalog::list_subjects));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    // User routes (require JWT authentication)
    let user_routes = Router::new()
        .route("/profile", get(routes::users::get_profile))
        .route("/update-profile", patch(routes::users::update_profile))
        .route("/tutors", get(routes::users::list_tutors))
        .route("/profile/:id", get(routes::users::get_tutor_profile))
        .layer(jwt_layer.clone());

    // Tutoring request routes (require JWT authentication; role gates are
    // applied inside the handlers)
    let request_routes = Router::new()
        .route("/", post(routes::requests::create_request))
        .route("/tutor", get(routes::requests::list_for_tutor))
        .route("/aprendiz", get(routes::requests::list_for_learner))
        .route("/:id/status", patch(routes::requests::transition_status))
        .route("/finalizar", post(routes::requests::finalize))
        .route("/calificar-tutor", post(routes::requests::rate_tutor))
        .layer(jwt_layer);

    // Build complete API
    let api_routes = Router::new()
        .nest("/catalog", catalog_routes)
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/solicitudes", request_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, DatabaseConfig, JwtConfig, MediaConfig};

    fn test_config(media: Option<MediaConfig>) -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                production: false,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/mentorhero_test".to_string(),
                max_connections: 2,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            media,
        }
    }

    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/mentorhero_test")
            .unwrap()
    }

    #[tokio::test]
    async fn test_state_without_media_config() {
        let state = AppState::new(lazy_pool(), test_config(None));
        assert!(state.media.is_none());
    }

    #[tokio::test]
    async fn test_state_builds_image_store_from_config() {
        let state = AppState::new(
            lazy_pool(),
            test_config(Some(MediaConfig {
                upload_url: "https://images.example.com/upload".to_string(),
                upload_preset: "mentorhero".to_string(),
            })),
        );
        assert!(state.media.is_some());
    }

    #[tokio::test]
    async fn test_router_builds() {
        let state = AppState::new(lazy_pool(), test_config(None));
        let _router = build_router(state);
    }
}

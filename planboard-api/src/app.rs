/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use planboard_api::{app::AppState, config::Config};
/// use planboard_shared::{auth::password::HashingConfig, store::MemoryStore, Services};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let store = Arc::new(MemoryStore::new());
/// let services = Services::new(store.clone(), HashingConfig::default(), config.token_config()?)?;
///
/// let app = planboard_api::app::build_router(AppState::new(services, store, config));
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch, post, put},
    Router,
};
use planboard_shared::{auth::middleware::session_auth, store::SharedStore, Services};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,

    /// Store behind the services, used for health checks
    pub store: SharedStore,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(services: Services, store: SharedStore, config: Config) -> Self {
        Self {
            services,
            store,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                   # Store health (public)
/// └── /v1/
///     ├── /auth/register, /auth/login           # Public
///     ├── POST /users                           # Public, links a profile to a credential
///     ├── /auth/logout                          # Everything below requires a Bearer token
///     ├── /credentials
///     ├── /users/:user_id[/password|/projects[/created]]
///     ├── /users/by-email/:email
///     ├── /projects[/:project_id[/participants|/stages[/:sid/tasks[/:tid/comments]]]]
///     ├── /tasks/:task_id[/comments]
///     └── /comments/:comment_id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Session authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/users", post(routes::users::create_profile));

    let protected_routes = Router::new()
        .route("/auth/logout", post(routes::auth::logout))
        .route("/credentials", get(routes::credentials::list_credentials))
        .route("/users/by-email/:email", get(routes::users::user_id_by_email))
        .route("/users/:user_id", get(routes::users::get_user))
        .route("/users/:user_id/password", put(routes::users::change_password))
        .route(
            "/users/:user_id/projects",
            get(routes::users::participant_projects),
        )
        .route(
            "/users/:user_id/projects/created",
            get(routes::users::created_projects),
        )
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:project_id",
            patch(routes::projects::update_project).delete(routes::projects::delete_project),
        )
        .route(
            "/projects/:project_id/participants",
            get(routes::projects::list_participants).post(routes::projects::link_participant),
        )
        .route(
            "/projects/:project_id/stages",
            get(routes::projects::list_stages).post(routes::projects::add_stage),
        )
        .route(
            "/projects/:project_id/stages/:stage_id/tasks",
            get(routes::projects::list_tasks).post(routes::projects::add_task),
        )
        .route(
            "/projects/:project_id/stages/:stage_id/tasks/:task_id/comments",
            get(routes::projects::list_comments),
        )
        .route(
            "/tasks/:task_id",
            patch(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        .route("/tasks/:task_id/comments", post(routes::tasks::add_comment))
        .route(
            "/comments/:comment_id",
            patch(routes::comments::edit_comment).delete(routes::comments::delete_comment),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.services.sessions.clone(),
            session_auth,
        ));

    let v1_routes = Router::new().merge(public_routes).merge(protected_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config.api.cors_origins))
        .with_state(state)
}

/// Permissive CORS when `*` is configured, otherwise an explicit allow-list
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

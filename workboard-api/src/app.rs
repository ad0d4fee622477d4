/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use workboard_api::{app::{build_router, AppState}, config::Config};
/// use workboard_shared::store::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    http::{header, HeaderValue, Method, Uri},
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use workboard_shared::auth::middleware::jwt_auth_middleware;
use workboard_shared::store::Store;

/// Shared application state
///
/// Cloned for each request handler via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}

/// Builds the complete router with all routes and middleware
///
/// ```text
/// /health                                   public
/// /api/v1
/// ├── /health                               public
/// ├── /auth/{signup,login,refresh}          public
/// ├── /user/me                              GET, PATCH
/// ├── /organizations                        POST, GET
/// │   ├── /accept-invite                    POST
/// │   └── /:slug/invite                     POST
/// ├── /projects                             POST
/// │   ├── /:id                              GET, PUT, DELETE
/// │   └── /organization/:organization_id    GET (keyset paginated)
/// ├── /tasks                                POST, GET
/// │   ├── /:id                              GET, PATCH, DELETE
/// │   └── /:id/status                       PATCH
/// ├── /comments                             POST
/// │   └── /:id                              DELETE
/// ├── /tags                                 POST, GET
/// │   ├── /attach                           POST
/// │   └── /detach                           POST
/// └── /audit                                GET
/// ```
///
/// Everything except health and `/auth` requires a bearer access token.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/signup", post(routes::auth::signup))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh));

    let protected_routes = Router::new()
        .route(
            "/user/me",
            get(routes::users::get_me).patch(routes::users::update_me),
        )
        .route(
            "/organizations",
            post(routes::organizations::create_organization)
                .get(routes::organizations::list_organizations),
        )
        .route(
            "/organizations/accept-invite",
            post(routes::organizations::accept_invite),
        )
        .route(
            "/organizations/:slug/invite",
            post(routes::organizations::invite_member),
        )
        .route("/projects", post(routes::projects::create_project))
        .route(
            "/projects/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/projects/organization/:organization_id",
            get(routes::projects::list_projects),
        )
        .route(
            "/tasks",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/tasks/:id/status", patch(routes::tasks::change_status))
        .route("/comments", post(routes::comments::create_comment))
        .route("/comments/:id", delete(routes::comments::delete_comment))
        .route(
            "/tags",
            post(routes::tags::create_tag).get(routes::tags::list_tags),
        )
        .route("/tags/attach", post(routes::tags::attach_tag))
        .route("/tags/detach", post(routes::tags::detach_tag))
        .route("/audit", get(routes::audit::list_audit_logs))
        .route_layer(axum::middleware::from_fn_with_state(
            state.config.jwt.clone(),
            jwt_auth_middleware,
        ));

    let cors = if state.config.allows_any_origin() {
        CorsLayer::permissive()
    } else {
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
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let production = state.config.api.production;

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", public_routes.merge(protected_routes))
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

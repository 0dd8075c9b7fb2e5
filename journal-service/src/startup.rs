//! Application startup: state wiring, routing and server lifecycle.

use crate::authz::gate::LEGACY_TOKEN_HEADER;
use crate::authz::{
    ownership_gate, Authenticator, AuthorizationEngine, IdentityResolver, OwnershipResolver,
    ResourceRegistry, TokenVerifier,
};
use crate::config::JournalConfig;
use crate::handlers::{self, boards, comments, drawing_boxes, drawings, kids};
use crate::services::{Database, JwtService, LocalStorage, Storage};
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

/// Headroom for the JSON part and multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: JournalConfig,
    pub db: Database,
    pub storage: Arc<dyn Storage>,
    pub authz: Arc<AuthorizationEngine>,
}

impl FromRef<AppState> for Arc<Authenticator> {
    fn from_ref(state: &AppState) -> Self {
        state.authz.authenticator().clone()
    }
}

/// Gate wiring over the given collaborators.
pub fn authorization_engine(
    verifier: Arc<dyn TokenVerifier>,
    identities: Arc<dyn IdentityResolver>,
    owners: Arc<dyn OwnershipResolver>,
    config: &JournalConfig,
) -> AuthorizationEngine {
    let authenticator = Arc::new(Authenticator::new(
        verifier,
        identities,
        config.authz.lookup_timeout(),
    ));
    AuthorizationEngine::new(ResourceRegistry::standard(owners), authenticator)
}

/// Kid, drawing box and drawing routes. Every request passes the ownership
/// gate; creation requests are checked by their handlers.
fn family_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/kids", post(kids::create_kid))
        .route(
            "/kids/:kidId",
            get(kids::get_kid)
                .put(kids::update_kid)
                .delete(kids::delete_kid),
        )
        .route(
            "/kids/:kidId/drawing-boxes",
            post(drawing_boxes::create_drawing_box),
        )
        .route(
            "/drawing-boxes/:drawingBoxId",
            get(drawing_boxes::get_drawing_box)
                .put(drawing_boxes::rename_drawing_box)
                .delete(drawing_boxes::delete_drawing_box),
        )
        .route(
            "/drawing-boxes/:drawingBoxId/drawings",
            post(drawings::create_drawing),
        )
        .route(
            "/drawings/:drawingId",
            get(drawings::get_drawing)
                .put(drawings::update_drawing)
                .delete(drawings::delete_drawing),
        )
        .route(
            "/drawings/:drawingId/drawing-boxes/:drawingBoxId",
            put(drawings::move_drawing),
        )
        .route_layer(from_fn_with_state(state.authz.clone(), ownership_gate))
        .layer(DefaultBodyLimit::max(
            state.config.storage.max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
        ))
}

/// Community boards and comments. Not family-scoped.
fn community_routes() -> Router<AppState> {
    Router::new()
        .route("/boards", get(boards::list_boards).post(boards::create_board))
        .route("/boards/category", get(boards::list_boards_by_category))
        .route("/boards/search", get(boards::search_boards))
        .route(
            "/boards/:boardId",
            get(boards::get_board)
                .put(boards::update_board)
                .delete(boards::delete_board),
        )
        .route("/boards/:boardId/comments", post(comments::create_comment))
        .route(
            "/comments/:commentId",
            put(comments::update_comment).delete(comments::delete_comment),
        )
}

fn cors_layer(config: &JournalConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(LEGACY_TOKEN_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .merge(family_routes(&state))
        .merge(community_routes())
        .nest_service("/files", ServeDir::new(&state.config.storage.local_path))
        .with_state(state.clone())
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    account_id = tracing::field::Empty,
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config))
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: JournalConfig) -> Result<Self, AppError> {
        let db = Database::new(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to PostgreSQL: {}", e);
            e
        })?;
        db.run_migrations().await?;

        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(
                &config.storage.local_path,
                &config.storage.public_base_url,
                config.storage.max_upload_bytes,
            )
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to initialize local storage at {}: {}",
                    config.storage.local_path,
                    e
                );
                e
            })?,
        );

        let jwt = JwtService::new(&config.jwt).map_err(AppError::ConfigError)?;
        let repository = Arc::new(db.clone());
        let authz = Arc::new(authorization_engine(
            Arc::new(jwt),
            repository.clone(),
            repository,
            &config,
        ));

        let state = AppState {
            config: config.clone(),
            db,
            storage,
            authz,
        };

        let app = build_router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            service = %config.service_name,
            environment = ?config.common.environment,
            "Listening on {}",
            port
        );

        let server = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .into_future();

        Ok(Self {
            port,
            server: Box::new(Box::pin(server)),
            state,
        })
    }

    pub fn db(&self) -> &Database {
        &self.state.db
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received, draining connections");
}

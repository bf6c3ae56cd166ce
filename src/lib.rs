//! Taska is a lightweight task and account management API.

#![forbid(unsafe_code)]
#![deny(unused_mut)]

mod crypto;
pub mod error;
mod middleware;
mod router;
mod storage;
mod task;
pub mod telemetry;
mod token;
mod user;

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, header};
use axum::routing::{get, post};
use axum::{Router, middleware as AxumMiddleware};
use error::ServerError;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    state: Option<&AppState>,
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let token = match state {
        Some(state) => state
            .token
            .create(1, "ann@x.com")
            .expect("cannot create JWT"),
        None => String::default(),
    };

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub db: storage::Database,
    pub crypto: Arc<crypto::PasswordManager>,
    pub token: token::TokenManager,
}

impl AppState {
    /// Account manager over this state.
    pub(crate) fn accounts(&self) -> user::AccountService {
        user::AccountService::new(
            self.db.clone(),
            Arc::clone(&self.crypto),
            self.token.clone(),
        )
    }

    /// Task manager over this state.
    pub(crate) fn tasks(&self) -> task::TaskService {
        task::TaskService::new(self.db.clone())
    }
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    // Authorization required.
    let protected = Router::new()
        // `GET /users` goes to `list`.
        .route("/users", get(router::users::list_handler))
        // `GET /users/:ID` goes to `get`.
        .route("/users/{user_id}", get(router::users::get_handler))
        // `POST /tasks` goes to `create`.
        .route("/tasks", post(router::tasks::create_handler))
        // `GET /tasks/:ID` lists by user; `PUT`/`DELETE` address a task.
        .route(
            "/tasks/{id}",
            get(router::tasks::list_handler)
                .put(router::tasks::update_handler)
                .delete(router::tasks::delete_handler),
        )
        .route_layer(AxumMiddleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        // `POST /users/register` goes to `create`.
        .route("/users/register", post(router::create::handler))
        // `POST /users/login` goes to `login`.
        .route("/users/login", post(router::login::handler))
        .merge(protected)
        .layer(middleware)
        .with_state(state)
}

/// Initialize the application state.
pub async fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>>
{
    // read configuration file. let it in memory.
    let config = config::Configuration::default().read()?;

    let db = match &config.postgres {
        Some(postgres) => storage::Database::postgres(postgres).await?,
        None => {
            tracing::warn!(
                "no postgres configured, falling back to in-memory storage"
            );
            storage::Database::memory()
        },
    };

    let crypto = Arc::new(crypto::PasswordManager::new(config.argon2.clone())?);

    let issuer = if config.name.is_empty() {
        config.url.clone()
    } else {
        config.name.clone()
    };
    let mut token = match &config.token {
        Some(cfg) => token::TokenManager::new(&issuer, cfg.secret.as_bytes()),
        None => {
            tracing::warn!(
                "no token secret configured, sessions will not survive a restart"
            );

            let mut secret = [0u8; 32];
            rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut secret);
            token::TokenManager::new(&issuer, &secret)
        },
    };
    if let Some(audience) =
        config.token.as_ref().and_then(|cfg| cfg.audience.as_deref())
    {
        token.audience(audience);
    }

    Ok(AppState {
        config,
        db,
        crypto,
        token,
    })
}

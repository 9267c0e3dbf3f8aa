//! HTTP API for dartscore.
//!
//! Builds the axum router and the shared state handed to every handler.
//!
//! | Method | Path                       | Handler                  |
//! |--------|----------------------------|--------------------------|
//! | GET    | `/api/v1/darts/info`       | [`system::info`]         |
//! | GET    | `/api/v1/darts/health`     | [`system::health`]       |
//! | GET    | `/api/v1/darts`            | [`darts::list_darts`]    |
//! | POST   | `/api/v1/darts`            | [`darts::create_dart`]   |
//! | GET    | `/api/v1/darts/{id}`       | [`darts::get_dart`]      |
//! | PUT    | `/api/v1/darts/{id}`       | [`darts::update_dart`]   |
//! | PATCH  | `/api/v1/darts/{id}`       | [`darts::patch_dart`]    |
//! | DELETE | `/api/v1/darts/{id}`       | [`darts::delete_dart`]   |
//! | GET    | `/api/v1/darts/docs`       | Scalar UI                |
//! | GET    | `/api/v1/darts/openapi.json` | `OpenAPI` document     |
//! | GET    | `/darts/test/darts.html`   | [`system::test_page`]    |

pub mod darts;
pub mod docs;
pub mod error;
pub mod extract;
pub mod system;

use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::Storage;

pub use error::{ApiError, ErrorBody};

/// Collection path of the darts resource.
pub const RESOURCE_PATH: &str = "/api/v1/darts";

/// Path of the interactive documentation.
pub const DOCS_PATH: &str = "/api/v1/darts/docs";

/// Path of the raw `OpenAPI` document.
pub const OPENAPI_PATH: &str = "/api/v1/darts/openapi.json";

/// Path of the browser test page.
pub const TEST_PAGE_PATH: &str = "/darts/test/darts.html";

/// State shared by every handler.
///
/// The storage connection sits behind a mutex and is only touched from the
/// blocking thread pool.
#[derive(Debug, Clone)]
pub struct AppState {
    storage: Arc<Mutex<Storage>>,
    config: Arc<Config>,
}

impl AppState {
    /// Wrap storage and configuration for sharing across handlers.
    #[must_use]
    pub fn new(storage: Storage, config: Config) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            config: Arc::new(config),
        }
    }

    /// The loaded configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run a storage operation on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns the operation's error, or [`Error::Internal`] if the task
    /// panicked or a previous panic poisoned the lock.
    pub async fn with_storage<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&Storage) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || {
            let guard = storage
                .lock()
                .map_err(|_| Error::internal("storage lock poisoned"))?;
            op(&*guard)
        })
        .await
        .map_err(|err| Error::internal(format!("storage task failed: {err}")))?
    }
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let docs_enabled = state.config().api.docs_enabled;

    let router = Router::new()
        .route("/api/v1/darts/info", get(system::info))
        .route("/api/v1/darts/health", get(system::health))
        .route(
            RESOURCE_PATH,
            get(darts::list_darts).post(darts::create_dart),
        )
        .route(
            "/api/v1/darts/{id}",
            get(darts::get_dart)
                .put(darts::update_dart)
                .patch(darts::patch_dart)
                .delete(darts::delete_dart),
        )
        .route(TEST_PAGE_PATH, get(system::test_page));

    // Keep the docs paths reserved so they never reach the `{id}` route.
    let router = if docs_enabled {
        router.merge(docs::routes())
    } else {
        router
            .route(DOCS_PATH, get(not_found))
            .route(OPENAPI_PATH, get(not_found))
    };

    router
        .fallback(not_found)
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Not Found")
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "request"
    );
    response
}

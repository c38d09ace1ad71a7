//! HTTP API server for VAVI

pub mod assist;
pub mod health;
pub mod rate_limit;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::{ApiServerConfig, DEFAULT_HOST};
use crate::dispatch::Assistant;
use crate::Result;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub assistant: Arc<Assistant>,
    pub rate_limiter: Option<rate_limit::SharedLimiter>,
    /// Deadline for one dispatch
    pub request_timeout: Option<Duration>,
}

/// Builder for [`ApiServer`]
pub struct ApiServerBuilder {
    assistant: Arc<Assistant>,
    host: String,
    port: u16,
    cors_origins: Vec<String>,
    static_dir: Option<PathBuf>,
    rate_limit_per_minute: Option<u32>,
    request_timeout: Option<Duration>,
}

impl ApiServerBuilder {
    /// Create a new builder bound to loopback
    #[must_use]
    pub fn new(assistant: Arc<Assistant>, port: u16) -> Self {
        Self {
            assistant,
            host: DEFAULT_HOST.to_string(),
            port,
            cors_origins: Vec::new(),
            static_dir: None,
            rate_limit_per_minute: None,
            request_timeout: None,
        }
    }

    /// Apply the server section of the configuration
    #[must_use]
    pub fn config(self, config: &ApiServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            cors_origins: config.cors_origins.clone(),
            static_dir: config.static_dir.clone(),
            rate_limit_per_minute: config.rate_limit_per_minute,
            request_timeout: config.request_timeout_secs.map(Duration::from_secs),
            ..self
        }
    }

    /// Set the interface to bind
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Allow cross-origin browser calls from these origins
    #[must_use]
    pub fn cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Set the port
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set static files directory for the web UI
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Limit the total request rate
    #[must_use]
    pub const fn rate_limit_per_minute(mut self, limit: Option<u32>) -> Self {
        self.rate_limit_per_minute = limit;
        self
    }

    /// Bound how long one dispatch may run
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        let rate_limiter = self.rate_limit_per_minute.map(|rpm| {
            tracing::info!(requests_per_minute = rpm, "rate limiting enabled");
            rate_limit::create_limiter(rpm)
        });

        let cors_origins = self
            .cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        ApiServer {
            state: Arc::new(ApiState {
                assistant: self.assistant,
                rate_limiter,
                request_timeout: self.request_timeout,
            }),
            host: self.host,
            port: self.port,
            cors_origins,
            static_dir: self.static_dir,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    host: String,
    port: u16,
    cors_origins: Vec<HeaderValue>,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Build the router with all routes and layers
    #[must_use]
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(assist::router(self.state.clone()))
            .merge(health::router());

        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir =
                ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        let router = router.layer(axum::middleware::from_fn_with_state(
            self.state.clone(),
            rate_limit::rate_limit_middleware,
        ));

        // Same-origin only unless origins are listed
        let router = if self.cors_origins.is_empty() {
            router
        } else {
            router.layer(
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(self.cors_origins.clone()))
                    .allow_methods([Method::GET, Method::POST])
                    .allow_headers([header::CONTENT_TYPE]),
            )
        };

        router.layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind((self.host.as_str(), self.port))
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(
            host = %self.host,
            port = self.port,
            video_mode = ?self.state.assistant.video_mode(),
            "API server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("shutdown requested");
            })
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}

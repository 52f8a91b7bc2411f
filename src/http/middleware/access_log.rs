//! Access-log middleware.
//! Writes one Common Log Format line per request and recovers handler panics.

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use chrono::{DateTime, Local};
use http_body::Body as _;
use tower_http::catch_panic::CatchPanicLayer;

use crate::http::basic_auth::basic_auth_user;
use crate::observability::{LoggingError, Sink};

/// Access-log settings: where lines go and which optional behaviours apply.
#[derive(Clone, Debug)]
pub struct AccessLog {
    sink: Sink,
    attribute_basic_auth_user: bool,
    recover_panics: bool,
}

impl AccessLog {
    pub fn new(sink: Sink) -> Self {
        Self {
            sink,
            attribute_basic_auth_user: false,
            recover_panics: true,
        }
    }

    /// Resolve `stdout`, `stderr` or a file path (create-or-append).
    pub fn open(name: &str) -> Result<Self, LoggingError> {
        Ok(Self::new(Sink::open(name)?))
    }

    /// Log the Basic-Auth username as the requester identity.
    pub fn attribute_basic_auth_user(mut self, enabled: bool) -> Self {
        self.attribute_basic_auth_user = enabled;
        self
    }

    /// Turn handler panics into `500` responses instead of dropping the
    /// connection. On by default.
    pub fn recover_panics(mut self, enabled: bool) -> Self {
        self.recover_panics = enabled;
        self
    }

    /// Wrap every route of `router`.
    ///
    /// The access log sits outside panic recovery, so recovered panics are
    /// logged with their `500` status.
    pub fn wrap<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let router = if self.recover_panics {
            router.layer(CatchPanicLayer::custom(panic_response))
        } else {
            router
        };
        router.layer(middleware::from_fn_with_state(
            Arc::new(self),
            access_log_middleware,
        ))
    }
}

/// Wrap `router` with an access log writing to `sink_name`.
///
/// # Panics
/// If the sink cannot be opened.
pub fn access_log_handler<S>(sink_name: &str, router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    match AccessLog::open(sink_name) {
        Ok(log) => log.wrap(router),
        Err(err) => panic!("failed to open access log: {}", err),
    }
}

/// What is known about a request before the handler runs.
struct RequestLine {
    host: Option<String>,
    user: Option<String>,
    method: String,
    uri: String,
    version: String,
    received_at: DateTime<Local>,
}

impl RequestLine {
    fn capture(request: &Request, attribute_user: bool) -> Self {
        let host = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        let user = if attribute_user {
            basic_auth_user(request.headers())
        } else {
            None
        };
        let uri = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| request.uri().path().to_string());

        Self {
            host,
            user,
            method: request.method().to_string(),
            uri,
            version: format!("{:?}", request.version()),
            received_at: Local::now(),
        }
    }

    fn format(&self, status: StatusCode, bytes: Option<u64>, elapsed: Duration) -> String {
        format!(
            "{} - {} [{}] \"{} {} {}\" {} {} {:.3}ms\n",
            self.host.as_deref().unwrap_or("-"),
            self.user.as_deref().unwrap_or("-"),
            self.received_at.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.uri,
            self.version,
            status.as_u16(),
            bytes.map_or_else(|| "-".to_string(), |b| b.to_string()),
            elapsed.as_secs_f64() * 1000.0,
        )
    }
}

async fn access_log_middleware(
    State(log): State<Arc<AccessLog>>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let line = RequestLine::capture(&request, log.attribute_basic_auth_user);

    let response = next.run(request).await;

    let bytes = response.body().size_hint().exact();
    let entry = line.format(response.status(), bytes, started.elapsed());
    if let Err(err) = log.sink.write_record(entry.as_bytes()) {
        tracing::warn!(sink = %log.sink.name(), error = %err, "Failed to write access log line");
    }

    response
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "Request handler panicked");

    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

//! HTTP forwarding server.
//!
//! # Responsibilities
//! - Create Axum Router with the forwarding handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Forward requests to the upstream backend through the observed client
//! - Map upstream transport failures to 502/504
//!
//! # Design Decisions
//! - The upstream client is wrapped in `ObserveLayer`, so every forwarded
//!   call is visible to the detector without touching handler code
//! - Upstream errors are logged at WARN; ERROR is reserved for events the
//!   log observer should count

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower::{timeout::Timeout, ServiceBuilder, ServiceExt};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::MonitorConfig;
use crate::observability::metrics;
use crate::observer::{NetworkObserver, Observe, ObserveLayer};

/// Upstream client: hyper client with a per-call timeout, observed.
pub type UpstreamClient = Observe<Timeout<Client<HttpConnector, Body>>>;

/// Build the observed upstream client.
pub fn upstream_client(timeout: Duration, observer: Arc<dyn NetworkObserver>) -> UpstreamClient {
    let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
    ServiceBuilder::new()
        .layer(ObserveLayer::new(observer))
        .layer(tower::timeout::TimeoutLayer::new(timeout))
        .service(client)
}

/// State injected into the forwarding handler.
#[derive(Clone)]
pub struct ForwardState {
    base_url: Arc<str>,
    client: UpstreamClient,
}

/// HTTP server forwarding traffic to the upstream backend.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &MonitorConfig, observer: Arc<dyn NetworkObserver>) -> Self {
        let state = ForwardState {
            base_url: Arc::from(config.upstream.base_url.trim_end_matches('/')),
            client: upstream_client(Duration::from_secs(config.upstream.timeout_secs), observer),
        };
        let router = Self::build_router(config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &MonitorConfig, state: ForwardState) -> Router {
        Router::new()
            .route("/", any(forward_handler))
            .route("/{*path}", any(forward_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.listener.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Forwarding server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Forwarding server stopped");
        Ok(())
    }
}

async fn forward_handler(State(state): State<ForwardState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let (parts, body) = request.into_parts();
    let path_and_query = parts.uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    let uri: Uri = match format!("{}{}", state.base_url, path_and_query).parse() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Could not build upstream URI");
            return (StatusCode::BAD_REQUEST, "Invalid request URI").into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        uri = %uri,
        "Forwarding request"
    );

    let mut upstream_req = Request::from_parts(parts, body);
    *upstream_req.uri_mut() = uri;
    *upstream_req.version_mut() = Version::HTTP_11;
    upstream_req.headers_mut().remove(header::HOST);

    match state.client.clone().oneshot(upstream_req).await {
        Ok(response) => {
            metrics::record_forwarded(response.status().as_u16(), start);
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            let status = if e.is::<tower::timeout::error::Elapsed>() {
                StatusCode::GATEWAY_TIMEOUT
            } else {
                StatusCode::BAD_GATEWAY
            };
            tracing::warn!(
                request_id = %request_id,
                error = %e,
                status = %status,
                "Upstream request failed"
            );
            metrics::record_forwarded(status.as_u16(), start);
            (status, "Upstream request failed").into_response()
        }
    }
}

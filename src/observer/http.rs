//! Tower middleware reporting HTTP client outcomes.
//!
//! # Responsibilities
//! - Report 2xx responses as successes
//! - Report connect errors, resets and timeouts as transport failures
//! - Return the inner result untouched
//!
//! # Design Decisions
//! - Non-2xx responses are neither successes nor failures
//! - The request URI is the classification target

use futures_util::future::BoxFuture;
use hyper::{Request, Response};
use std::error::Error as StdError;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{BoxError, Layer, Service};

use crate::detector::FailureSample;
use crate::observer::NetworkObserver;

/// Errors that can tell whether they came from the transport.
pub trait TransportErrorClass {
    fn is_transport_failure(&self) -> bool;
}

fn source_chain_is_transport(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<std::io::Error>() {
            return true;
        }
        if let Some(h) = e.downcast_ref::<hyper::Error>() {
            if h.is_incomplete_message() || h.is_closed() || h.is_timeout() {
                return true;
            }
        }
        current = e.source();
    }
    false
}

impl TransportErrorClass for std::io::Error {
    fn is_transport_failure(&self) -> bool {
        true
    }
}

impl TransportErrorClass for hyper_util::client::legacy::Error {
    fn is_transport_failure(&self) -> bool {
        self.is_connect() || source_chain_is_transport(self)
    }
}

impl TransportErrorClass for BoxError {
    fn is_transport_failure(&self) -> bool {
        if self.is::<tower::timeout::error::Elapsed>() {
            return true;
        }
        if let Some(e) = self.downcast_ref::<hyper_util::client::legacy::Error>() {
            return e.is_transport_failure();
        }
        source_chain_is_transport(&**self)
    }
}

/// Layer that wraps a client service with outcome reporting.
#[derive(Clone)]
pub struct ObserveLayer {
    observer: Arc<dyn NetworkObserver>,
}

impl ObserveLayer {
    pub fn new(observer: Arc<dyn NetworkObserver>) -> Self {
        Self { observer }
    }
}

impl<S> Layer<S> for ObserveLayer {
    type Service = Observe<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Observe {
            inner,
            observer: self.observer.clone(),
        }
    }
}

/// Service produced by [`ObserveLayer`].
#[derive(Clone)]
pub struct Observe<S> {
    inner: S,
    observer: Arc<dyn NetworkObserver>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for Observe<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Error: TransportErrorClass + 'static,
    S::Future: Send + 'static,
    ResBody: 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let target = req.uri().to_string();
        let observer = self.observer.clone();
        let fut = self.inner.call(req);

        Box::pin(async move {
            let result = fut.await;
            match &result {
                Ok(response) if response.status().is_success() => {
                    observer.on_outcome(FailureSample::success(target));
                }
                Ok(_) => {}
                Err(e) if e.is_transport_failure() => {
                    observer.on_outcome(FailureSample::transport_failure(target));
                }
                Err(_) => {}
            }
            result
        })
    }
}

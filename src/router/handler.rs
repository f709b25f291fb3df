use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::protocol::{Request, SendError, StatusCode};
use crate::response::{default_headers, ResponseWriter};

/// A request handler: writes a response for a parsed request.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(
        &self,
        writer: &mut ResponseWriter,
        request: &Request,
    ) -> Result<(), SendError>;
}

pub type DynHandler = Arc<dyn Handler>;

/// Adapts a plain function to a [`Handler`].
///
/// Works with `fn` items of the shape
/// `fn(&mut ResponseWriter, &Request) -> BoxFuture<'_, Result<(), SendError>>`.
pub struct HandlerFn<F>(F);

pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&'a mut ResponseWriter, &'a Request) -> BoxFuture<'a, Result<(), SendError>>
        + Send
        + Sync,
{
    HandlerFn(f)
}

#[async_trait]
impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(&'a mut ResponseWriter, &'a Request) -> BoxFuture<'a, Result<(), SendError>>
        + Send
        + Sync,
{
    async fn handle(
        &self,
        writer: &mut ResponseWriter,
        request: &Request,
    ) -> Result<(), SendError> {
        (self.0)(writer, request).await
    }
}

/// Wraps a handler, returning the handler that runs in its place.
/// Middleware may short-circuit by not invoking `next`.
pub trait Middleware: Send + Sync {
    fn wrap(&self, next: DynHandler) -> DynHandler;
}

pub type DynMiddleware = Arc<dyn Middleware>;

impl<F> Middleware for F
where
    F: Fn(DynHandler) -> DynHandler + Send + Sync,
{
    fn wrap(&self, next: DynHandler) -> DynHandler {
        (self)(next)
    }
}

/// Terminal handler for paths with no node in the trie.
pub(crate) struct NotFoundHandler;

#[async_trait]
impl Handler for NotFoundHandler {
    async fn handle(
        &self,
        writer: &mut ResponseWriter,
        _request: &Request,
    ) -> Result<(), SendError> {
        writer
            .write_response(StatusCode::NOT_FOUND, &default_headers(0), b"")
            .await
    }
}

/// Terminal handler for nodes that exist but lack the requested method.
pub(crate) struct MethodNotAllowedHandler;

#[async_trait]
impl Handler for MethodNotAllowedHandler {
    async fn handle(
        &self,
        writer: &mut ResponseWriter,
        _request: &Request,
    ) -> Result<(), SendError> {
        writer
            .write_response(StatusCode::METHOD_NOT_ALLOWED, &default_headers(0), b"")
            .await
    }
}

use std::sync::Arc;

use tokio::net::TcpStream;
use tracing::{debug, error};

use crate::codec::parse_request;
use crate::protocol::StatusCode;
use crate::response::{default_headers, ResponseWriter};
use crate::router::{DynHandler, Router};

/// Drives one accepted connection: parse a single request, resolve a
/// handler, run it, close.
///
/// Parse failures are answered with their mapped status and the error text
/// as body. An explicitly provided handler takes precedence over the
/// router; with neither, the connection gets a bare `500`. Handler failures
/// from a peer that went away are dropped silently, everything else is
/// logged. The stream drops on return, which is the `Connection: close`
/// contract.
pub(crate) async fn process(
    stream: TcpStream,
    handler: Option<DynHandler>,
    router: Option<Arc<Router>>,
) {
    let (read_half, write_half) = stream.into_split();
    let mut writer = ResponseWriter::new(write_half);

    let mut request = match parse_request(read_half).await {
        Ok(request) => request,
        Err(e) => {
            debug!(cause = %e, "failed to parse request");
            let body = e.to_string();
            let headers = default_headers(body.len());
            if let Err(write_err) = writer
                .write_response(e.status(), &headers, body.as_bytes())
                .await
            {
                if !write_err.is_connection_closed() {
                    error!(cause = %write_err, "failed to write error response");
                }
            }
            return;
        }
    };

    let resolved = match (&handler, &router) {
        (Some(handler), _) => Arc::clone(handler),
        (None, Some(router)) => router.get_handler(&mut request),
        (None, None) => {
            let headers = default_headers(0);
            if let Err(e) = writer
                .write_response(StatusCode::INTERNAL_SERVER_ERROR, &headers, b"")
                .await
            {
                if !e.is_connection_closed() {
                    error!(cause = %e, "failed to write fallback response");
                }
            }
            return;
        }
    };

    match resolved.handle(&mut writer, &request).await {
        Ok(()) => {}
        Err(e) if e.is_connection_closed() => {}
        Err(e) => error!(cause = %e, "handler error"),
    }
}

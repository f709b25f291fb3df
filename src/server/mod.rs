use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::connection;
use crate::router::{DynHandler, Router};

/// A running origin server.
///
/// Binds on construction and accepts on a spawned task, one task per
/// connection. `close` stops the accept loop; connections already in
/// flight run to completion.
pub struct Server {
    local_addr: SocketAddr,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl Server {
    /// Binds `addr` and starts accepting.
    ///
    /// A provided `handler` serves every request; otherwise `router`
    /// resolves one per request.
    pub async fn serve(
        addr: impl ToSocketAddrs,
        handler: Option<DynHandler>,
        router: Option<Router>,
    ) -> crate::Result<Server> {
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(cause = %e, "bind server error");
                return Err(e.into());
            }
        };
        let local_addr = listener.local_addr()?;

        let closed = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(Notify::new());
        let router = router.map(Arc::new);

        tokio::spawn(accept_loop(
            listener,
            handler,
            router,
            Arc::clone(&closed),
            Arc::clone(&shutdown),
        ));

        Ok(Server {
            local_addr,
            closed,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting new connections. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.shutdown.notify_one();
    }
}

async fn accept_loop(
    listener: TcpListener,
    handler: Option<DynHandler>,
    router: Option<Arc<Router>>,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) {
    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                info!("listener closed, stopped accepting connections");
                break;
            }
            accepted = listener.accept() => {
                let (stream, _remote_addr) = match accepted {
                    Ok(stream_and_addr) => stream_and_addr,
                    Err(e) => {
                        if closed.load(Ordering::SeqCst) {
                            break;
                        }
                        warn!(cause = %e, "failed to accept");
                        continue;
                    }
                };

                let handler = handler.clone();
                let router = router.clone();
                tokio::spawn(async move {
                    connection::process(stream, handler, router).await;
                });
            }
        }
    }
}

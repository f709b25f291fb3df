use futures::future::BoxFuture;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use trellis_http::config::Config;
use trellis_http::protocol::{Headers, Request, SendError, StatusCode};
use trellis_http::response::{default_headers, ResponseWriter};
use trellis_http::router::{handler_fn, Router};
use trellis_http::server::Server;

fn home<'a>(
    writer: &'a mut ResponseWriter,
    _request: &'a Request,
) -> BoxFuture<'a, Result<(), SendError>> {
    Box::pin(async move {
        let body = b"<html><body><h1>trellis</h1></body></html>";
        writer
            .write_response(StatusCode::OK, &default_headers(body.len()), body)
            .await
    })
}

fn ping<'a>(
    writer: &'a mut ResponseWriter,
    _request: &'a Request,
) -> BoxFuture<'a, Result<(), SendError>> {
    Box::pin(async move {
        let body = b"pong";
        let mut headers = default_headers(body.len());
        headers.replace("Content-Type", "text/plain");
        writer.write_response(StatusCode::OK, &headers, body).await
    })
}

fn greet<'a>(
    writer: &'a mut ResponseWriter,
    request: &'a Request,
) -> BoxFuture<'a, Result<(), SendError>> {
    Box::pin(async move {
        let name = request
            .path_params
            .get("name")
            .map(String::as_str)
            .unwrap_or("world");
        let body = format!("<html><body><p>hello, {name}</p></body></html>");
        writer
            .write_response(StatusCode::OK, &default_headers(body.len()), body.as_bytes())
            .await
    })
}

/// Streams a chunked response and finishes with a trailer block.
fn chunked<'a>(
    writer: &'a mut ResponseWriter,
    _request: &'a Request,
) -> BoxFuture<'a, Result<(), SendError>> {
    Box::pin(async move {
        let mut headers = Headers::new();
        headers.set("Transfer-Encoding", "chunked");
        headers.set("Connection", "close");
        headers.set("Content-Type", "text/plain");
        headers.set("Trailer", "X-Content-Length");

        writer.write_status_line(StatusCode::OK).await?;
        writer.write_headers(&headers).await?;

        let mut total = 0;
        for piece in [&b"Hello"[..], &b" "[..], &b"World!"[..]] {
            total += piece.len();
            writer.write_chunk(piece).await?;
        }
        writer.write_chunk_end(true).await?;

        let mut trailers = Headers::new();
        trailers.set("X-Content-Length", &total.to_string());
        writer.write_trailers(&trailers).await
    })
}

/// Serves a local file with `Range` support.
fn video<'a>(
    writer: &'a mut ResponseWriter,
    request: &'a Request,
) -> BoxFuture<'a, Result<(), SendError>> {
    Box::pin(async move {
        let path = "assets/sample.mp4";
        let mut file = match tokio::fs::File::open(path).await {
            Ok(file) => file,
            Err(_) => {
                let body = b"no such video";
                let mut headers = default_headers(body.len());
                headers.replace("Content-Type", "text/plain");
                return writer
                    .write_response(StatusCode::NOT_FOUND, &headers, body)
                    .await;
            }
        };
        let total_size = match file.metadata().await {
            Ok(metadata) => metadata.len(),
            Err(source) => return Err(SendError::FailedToWrite { source }),
        };
        writer
            .write_partial(&mut file, total_size, "video/mp4", request)
            .await
    })
}

#[tokio::main]
async fn main() -> trellis_http::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = Config::from_env();

    let router = Router::new();
    router.get("/", handler_fn(home))?;
    router.get("/chunk", handler_fn(chunked))?;
    router.get("/video", handler_fn(video))?;

    let api = router.group("/api");
    api.get("/ping", handler_fn(ping))?;
    api.get("/users/:name", handler_fn(greet))?;

    let server = Server::serve(config.listen_addr.as_str(), None, Some(router)).await?;
    info!(addr = %server.local_addr(), "server started");

    tokio::signal::ctrl_c().await?;
    server.close();
    info!("server gracefully stopped");
    Ok(())
}

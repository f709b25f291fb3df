use std::io::{self, ErrorKind, SeekFrom};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::{Headers, Request, SendError, StatusCode};

/// Headers every response starts from: `Content-Length`,
/// `Connection: close`, `Content-Type: text/html`. Callers override the
/// content type for anything that is not HTML.
pub fn default_headers(content_length: usize) -> Headers {
    let mut headers = Headers::new();
    headers.set("Content-Length", &content_length.to_string());
    headers.set("Connection", "close");
    headers.set("Content-Type", "text/html");
    headers
}

/// Serializes responses onto a byte sink.
///
/// Every emission drains through a single write-all loop: short writes are
/// retried, a zero-length write and sink errors both surface as
/// `FailedToWrite`.
pub struct ResponseWriter {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
}

impl ResponseWriter {
    pub fn new(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            writer: Box::new(writer),
        }
    }

    async fn write_all(&mut self, mut buf: &[u8]) -> Result<(), SendError> {
        while !buf.is_empty() {
            let n = self.writer.write(buf).await.map_err(SendError::from)?;
            if n == 0 {
                return Err(SendError::FailedToWrite {
                    source: io::Error::from(ErrorKind::WriteZero),
                });
            }
            buf = &buf[n..];
        }
        self.writer.flush().await.map_err(SendError::from)?;
        Ok(())
    }

    /// Emits `HTTP/1.1 <code> <reason>\r\n`; codes outside the closed table
    /// are rejected before anything reaches the sink.
    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<(), SendError> {
        let reason = status
            .reason_phrase()
            .ok_or(SendError::UnrecognizedStatusCode(status.as_u16()))?;
        let line = format!("HTTP/1.1 {} {}\r\n", status.as_u16(), reason);
        self.write_all(line.as_bytes()).await
    }

    /// Emits the header block, lowercased names, terminated by a bare CRLF.
    pub async fn write_headers(&mut self, headers: &Headers) -> Result<(), SendError> {
        let mut block = String::new();
        headers.for_each(|name, value| {
            block.push_str(name);
            block.push_str(": ");
            block.push_str(value);
            block.push_str("\r\n");
        });
        block.push_str("\r\n");
        self.write_all(block.as_bytes()).await
    }

    pub async fn write_body(&mut self, body: &[u8]) -> Result<(), SendError> {
        self.write_all(body).await
    }

    /// Emits one chunk as `<len-hex>\r\n<data>\r\n`.
    pub async fn write_chunk(&mut self, data: &[u8]) -> Result<(), SendError> {
        let head = format!("{:x}\r\n", data.len());
        self.write_all(head.as_bytes()).await?;
        self.write_all(data).await?;
        self.write_all(b"\r\n").await
    }

    /// Ends a chunked body. With trailers pending only the `0` chunk goes
    /// out and the caller follows up with `write_trailers`; otherwise the
    /// final CRLF is included.
    pub async fn write_chunk_end(&mut self, has_trailers: bool) -> Result<(), SendError> {
        if has_trailers {
            self.write_all(b"0\r\n").await
        } else {
            self.write_all(b"0\r\n\r\n").await
        }
    }

    /// Trailers are a header block after the last chunk.
    pub async fn write_trailers(&mut self, trailers: &Headers) -> Result<(), SendError> {
        self.write_headers(trailers).await
    }

    /// Status line, headers and body in one call.
    pub async fn write_response(
        &mut self,
        status: StatusCode,
        headers: &Headers,
        body: &[u8],
    ) -> Result<(), SendError> {
        self.write_status_line(status).await?;
        self.write_headers(headers).await?;
        self.write_body(body).await
    }

    /// Serves a seekable source honoring a `bytes=start-[end]` request
    /// range.
    ///
    /// Without a `Range` header the whole source goes out as `200`. A
    /// syntactically bad range is `400`, an unsatisfiable one `416` with
    /// `Content-Range: bytes */<total>`, a failing source `500`, and a good
    /// one `206` with the end clamped to the last byte.
    pub async fn write_partial<S>(
        &mut self,
        source: &mut S,
        total_size: u64,
        content_type: &str,
        request: &Request,
    ) -> Result<(), SendError>
    where
        S: AsyncRead + AsyncSeek + Unpin,
    {
        let mut headers = default_headers(0);
        headers.replace("Content-Type", content_type);
        headers.set("Accept-Ranges", "bytes");

        let Some(range) = request.headers.get("range") else {
            let mut body = Vec::new();
            return match source.read_to_end(&mut body).await {
                Ok(_) => {
                    headers.replace("Content-Length", &body.len().to_string());
                    self.write_response(StatusCode::OK, &headers, &body).await
                }
                Err(_) => {
                    let body = b"error loading content";
                    headers.replace("Content-Type", "text/plain");
                    headers.replace("Content-Length", &body.len().to_string());
                    self.write_response(StatusCode::INTERNAL_SERVER_ERROR, &headers, body)
                        .await
                }
            };
        };

        let Some((start, end)) = parse_range(range) else {
            let body = b"invalid range";
            headers.replace("Content-Type", "text/plain");
            headers.replace("Content-Length", &body.len().to_string());
            return self
                .write_response(StatusCode::BAD_REQUEST, &headers, body)
                .await;
        };

        match load_range(source, total_size, start, end).await {
            Ok((body, used_end)) => {
                headers.replace("Content-Length", &body.len().to_string());
                headers.set(
                    "Content-Range",
                    &format!("bytes {}-{}/{}", start, used_end, total_size),
                );
                self.write_response(StatusCode::PARTIAL_CONTENT, &headers, &body)
                    .await
            }
            Err(RangeLoadError::OutOfBounds) | Err(RangeLoadError::EndBeforeStart) => {
                let body = b"invalid range provided";
                headers.replace("Content-Type", "text/plain");
                headers.replace("Content-Length", &body.len().to_string());
                headers.set("Content-Range", &format!("bytes */{}", total_size));
                self.write_response(StatusCode::RANGE_NOT_SATISFIABLE, &headers, body)
                    .await
            }
            Err(RangeLoadError::Io(_)) => {
                let body = b"error loading range";
                headers.replace("Content-Type", "text/plain");
                headers.replace("Content-Length", &body.len().to_string());
                self.write_response(StatusCode::INTERNAL_SERVER_ERROR, &headers, body)
                    .await
            }
        }
    }
}

enum RangeLoadError {
    OutOfBounds,
    EndBeforeStart,
    Io(io::Error),
}

/// Accepts `bytes=first[-last]` with a mandatory first byte position.
/// Suffix ranges (`bytes=-N`) and multi-range are malformed.
fn parse_range(value: &str) -> Option<(u64, Option<u64>)> {
    let spec = value.strip_prefix("bytes=")?;
    let (start, end) = spec.split_once('-')?;
    if start.is_empty() {
        return None;
    }
    let start = start.parse::<u64>().ok()?;
    if end.is_empty() {
        return Some((start, None));
    }
    let end = end.parse::<u64>().ok()?;
    Some((start, Some(end)))
}

async fn load_range<S>(
    source: &mut S,
    total_size: u64,
    start: u64,
    end: Option<u64>,
) -> Result<(Vec<u8>, u64), RangeLoadError>
where
    S: AsyncRead + AsyncSeek + Unpin,
{
    if total_size == 0 || start >= total_size {
        return Err(RangeLoadError::OutOfBounds);
    }

    let used_end = match end {
        None => total_size - 1,
        Some(end) => {
            if end < start {
                return Err(RangeLoadError::EndBeforeStart);
            }
            end.min(total_size - 1)
        }
    };

    let len = (used_end - start + 1) as usize;
    source
        .seek(SeekFrom::Start(start))
        .await
        .map_err(RangeLoadError::Io)?;
    let mut body = vec![0u8; len];
    source
        .read_exact(&mut body)
        .await
        .map_err(RangeLoadError::Io)?;

    Ok((body, used_end))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use crate::protocol::Request;

    use super::*;

    /// Accepts at most `max_per_write` bytes per call, like a congested
    /// socket.
    #[derive(Clone, Default)]
    struct ChunkSink {
        max_per_write: usize,
        buf: Arc<Mutex<Vec<u8>>>,
    }

    impl ChunkSink {
        fn new(max_per_write: usize) -> Self {
            Self {
                max_per_write,
                buf: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn contents(&self) -> String {
            String::from_utf8(self.buf.lock().unwrap().clone()).unwrap()
        }
    }

    impl AsyncWrite for ChunkSink {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let n = if self.max_per_write == 0 {
                buf.len()
            } else {
                buf.len().min(self.max_per_write)
            };
            self.buf.lock().unwrap().extend_from_slice(&buf[..n]);
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// Reports zero bytes written on every call.
    struct ZeroSink;

    impl AsyncWrite for ZeroSink {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Ok(0))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// Succeeds for `ok_writes` calls, then errors.
    struct FailSink {
        ok_writes: usize,
        writes: usize,
    }

    impl AsyncWrite for FailSink {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            self.writes += 1;
            if self.writes > self.ok_writes {
                Poll::Ready(Err(io::Error::other("boom")))
            } else {
                Poll::Ready(Ok(buf.len()))
            }
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// Reads fail outright; seeks succeed.
    struct ReadFail;

    impl AsyncRead for ReadFail {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::other("readfail")))
        }
    }

    impl AsyncSeek for ReadFail {
        fn start_seek(self: Pin<&mut Self>, _position: SeekFrom) -> io::Result<()> {
            Ok(())
        }

        fn poll_complete(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
            Poll::Ready(Ok(0))
        }
    }

    /// Seeks fail; reads would succeed.
    struct SeekFail;

    impl AsyncRead for SeekFail {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncSeek for SeekFail {
        fn start_seek(self: Pin<&mut Self>, _position: SeekFrom) -> io::Result<()> {
            Err(io::Error::other("seekfail"))
        }

        fn poll_complete(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
            Poll::Ready(Ok(0))
        }
    }

    fn request(method: &str, target: &str) -> Request {
        let mut request = Request::new();
        request.request_line.method = method.to_string();
        request.request_line.target = target.to_string();
        request
    }

    fn status_line_of(out: &str) -> &str {
        match out.find("\r\n") {
            Some(i) => &out[..i + 2],
            None => out,
        }
    }

    fn header_block(out: &str) -> &str {
        match out.find("\r\n\r\n") {
            Some(i) => &out[..i + 4],
            None => out,
        }
    }

    fn body_of(out: &str) -> &str {
        match out.find("\r\n\r\n") {
            Some(i) => &out[i + 4..],
            None => "",
        }
    }

    #[tokio::test]
    async fn status_line_survives_short_writes() {
        let sink = ChunkSink::new(3);
        let mut writer = ResponseWriter::new(sink.clone());

        writer.write_status_line(StatusCode::OK).await.unwrap();

        assert_eq!(sink.contents(), "HTTP/1.1 200 OK\r\n");
    }

    #[tokio::test]
    async fn status_line_rejects_unknown_code() {
        let sink = ChunkSink::new(64);
        let mut writer = ResponseWriter::new(sink.clone());

        let err = writer
            .write_status_line(StatusCode::from_u16(999))
            .await
            .unwrap_err();

        assert!(matches!(err, SendError::UnrecognizedStatusCode(999)));
        assert_eq!(sink.contents(), "");
    }

    #[tokio::test]
    async fn zero_write_is_failed_to_write() {
        let mut writer = ResponseWriter::new(ZeroSink);

        let err = writer.write_status_line(StatusCode::OK).await.unwrap_err();

        assert!(matches!(err, SendError::FailedToWrite { .. }));
    }

    #[tokio::test]
    async fn sink_error_is_failed_to_write() {
        let mut writer = ResponseWriter::new(FailSink {
            ok_writes: 0,
            writes: 0,
        });

        let err = writer.write_body(b"hi").await.unwrap_err();

        assert!(matches!(err, SendError::FailedToWrite { .. }));
    }

    #[tokio::test]
    async fn headers_are_lowercased_and_terminated() {
        let sink = ChunkSink::new(2);
        let mut writer = ResponseWriter::new(sink.clone());

        let mut headers = Headers::new();
        headers.set("Host", "localhost:8080");
        headers.set("Content-Type", "text/plain");
        headers.set("X-Test", "abc");

        writer.write_headers(&headers).await.unwrap();

        let out = sink.contents();
        assert!(out.ends_with("\r\n\r\n"));
        assert!(out.contains("host: localhost:8080\r\n"));
        assert!(out.contains("content-type: text/plain\r\n"));
        assert!(out.contains("x-test: abc\r\n"));
    }

    #[tokio::test]
    async fn body_survives_byte_at_a_time_sink() {
        let sink = ChunkSink::new(1);
        let mut writer = ResponseWriter::new(sink.clone());

        writer.write_body(b"Hello World!\n").await.unwrap();

        assert_eq!(sink.contents(), "Hello World!\n");
    }

    #[tokio::test]
    async fn chunk_framing() {
        let sink = ChunkSink::new(2);
        let mut writer = ResponseWriter::new(sink.clone());

        writer.write_chunk(b"hello").await.unwrap();

        assert_eq!(sink.contents(), "5\r\nhello\r\n");
    }

    #[tokio::test]
    async fn chunk_end_with_and_without_trailers() {
        let sink = ChunkSink::new(1);
        let mut writer = ResponseWriter::new(sink.clone());
        writer.write_chunk_end(true).await.unwrap();
        assert_eq!(sink.contents(), "0\r\n");

        let sink = ChunkSink::new(1);
        let mut writer = ResponseWriter::new(sink.clone());
        writer.write_chunk_end(false).await.unwrap();
        assert_eq!(sink.contents(), "0\r\n\r\n");
    }

    #[tokio::test]
    async fn chunked_body_with_trailer_block() {
        let sink = ChunkSink::new(0);
        let mut writer = ResponseWriter::new(sink.clone());

        writer.write_chunk(b"abc").await.unwrap();
        writer.write_chunk_end(true).await.unwrap();
        let mut trailers = Headers::new();
        trailers.set("X-Content-Length", "3");
        writer.write_trailers(&trailers).await.unwrap();

        assert_eq!(
            sink.contents(),
            "3\r\nabc\r\n0\r\nx-content-length: 3\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn full_response_in_order() {
        let sink = ChunkSink::new(3);
        let mut writer = ResponseWriter::new(sink.clone());

        let mut headers = Headers::new();
        headers.set("Content-Length", "2");
        headers.set("Connection", "close");
        headers.set("Content-Type", "text/plain");

        writer
            .write_response(StatusCode::OK, &headers, b"OK")
            .await
            .unwrap();

        let out = sink.contents();
        assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
        assert_eq!(body_of(&out), "OK");
        let block = header_block(&out);
        assert!(block.contains("content-length: 2\r\n"));
        assert!(block.contains("connection: close\r\n"));
        assert!(block.contains("content-type: text/plain\r\n"));
    }

    #[tokio::test]
    async fn response_stops_after_first_failed_write() {
        // the status line consumes the only successful write; headers fail
        let mut writer = ResponseWriter::new(FailSink {
            ok_writes: 1,
            writes: 0,
        });
        let headers = default_headers(2);

        let err = writer
            .write_response(StatusCode::OK, &headers, b"OK")
            .await
            .unwrap_err();

        assert!(matches!(err, SendError::FailedToWrite { .. }));
    }

    #[tokio::test]
    async fn default_headers_values() {
        let headers = default_headers(123);

        assert_eq!(headers.get("Content-Length"), Some("123"));
        assert_eq!(headers.get("Connection"), Some("close"));
        assert_eq!(headers.get("Content-Type"), Some("text/html"));
    }

    #[test]
    fn range_parsing() {
        assert_eq!(parse_range("bytes=0-"), Some((0, None)));
        assert_eq!(parse_range("bytes=5-10"), Some((5, Some(10))));
        assert_eq!(parse_range("bytes=-10"), None);
        assert_eq!(parse_range("bytes=abc-10"), None);
        assert_eq!(parse_range("nope=0-10"), None);
        assert_eq!(parse_range("bytes=1"), None);
        assert_eq!(parse_range("bytes=0-5,10-"), None);
    }

    #[tokio::test]
    async fn partial_without_range_returns_200_full_body() {
        let content = b"hello-world";
        let req = request("GET", "/video");
        let sink = ChunkSink::new(0);
        let mut writer = ResponseWriter::new(sink.clone());

        let mut source = Cursor::new(&content[..]);
        writer
            .write_partial(&mut source, content.len() as u64, "video/mp4", &req)
            .await
            .unwrap();

        let out = sink.contents();
        assert_eq!(status_line_of(&out), "HTTP/1.1 200 OK\r\n");
        let block = header_block(&out);
        assert!(block.contains("content-type: video/mp4\r\n"));
        assert!(block.contains("accept-ranges: bytes\r\n"));
        assert!(block.contains("content-length: 11\r\n"));
        assert_eq!(body_of(&out), "hello-world");
    }

    #[tokio::test]
    async fn partial_open_ended_range_returns_206_to_eof() {
        let content = b"0123456789";
        let mut req = request("GET", "/video");
        req.headers.set("Range", "bytes=0-");
        let sink = ChunkSink::new(0);
        let mut writer = ResponseWriter::new(sink.clone());

        let mut source = Cursor::new(&content[..]);
        writer
            .write_partial(&mut source, content.len() as u64, "video/mp4", &req)
            .await
            .unwrap();

        let out = sink.contents();
        assert_eq!(status_line_of(&out), "HTTP/1.1 206 Partial Content\r\n");
        let block = header_block(&out);
        assert!(block.contains("content-range: bytes 0-9/10\r\n"));
        assert!(block.contains("content-length: 10\r\n"));
        assert_eq!(body_of(&out), "0123456789");
    }

    #[tokio::test]
    async fn partial_bounded_range_returns_206_subset() {
        let content = b"abcdefghijklmnopqrstuvwxyz";
        let mut req = request("GET", "/video");
        req.headers.set("Range", "bytes=2-5");
        let sink = ChunkSink::new(0);
        let mut writer = ResponseWriter::new(sink.clone());

        let mut source = Cursor::new(&content[..]);
        writer
            .write_partial(&mut source, content.len() as u64, "video/mp4", &req)
            .await
            .unwrap();

        let out = sink.contents();
        assert_eq!(status_line_of(&out), "HTTP/1.1 206 Partial Content\r\n");
        let block = header_block(&out);
        assert!(block.contains("content-range: bytes 2-5/26\r\n"));
        assert!(block.contains("content-length: 4\r\n"));
        assert_eq!(body_of(&out), "cdef");
    }

    #[tokio::test]
    async fn partial_end_clamped_to_last_byte() {
        let content = b"abcdefghij";
        let mut req = request("GET", "/video");
        req.headers.set("Range", "bytes=7-999");
        let sink = ChunkSink::new(0);
        let mut writer = ResponseWriter::new(sink.clone());

        let mut source = Cursor::new(&content[..]);
        writer
            .write_partial(&mut source, content.len() as u64, "video/mp4", &req)
            .await
            .unwrap();

        let out = sink.contents();
        assert_eq!(status_line_of(&out), "HTTP/1.1 206 Partial Content\r\n");
        let block = header_block(&out);
        assert!(block.contains("content-range: bytes 7-9/10\r\n"));
        assert!(block.contains("content-length: 3\r\n"));
        assert_eq!(body_of(&out), "hij");
    }

    #[tokio::test]
    async fn partial_suffix_range_is_400() {
        let content = b"abcdefghij";
        let mut req = request("GET", "/video");
        req.headers.set("Range", "bytes=-10");
        let sink = ChunkSink::new(0);
        let mut writer = ResponseWriter::new(sink.clone());

        let mut source = Cursor::new(&content[..]);
        writer
            .write_partial(&mut source, content.len() as u64, "video/mp4", &req)
            .await
            .unwrap();

        let out = sink.contents();
        assert_eq!(status_line_of(&out), "HTTP/1.1 400 Bad Request\r\n");
        let block = header_block(&out);
        assert!(block.contains("content-type: text/plain\r\n"));
        assert!(block.contains("content-length: 13\r\n"));
        assert_eq!(body_of(&out), "invalid range");
    }

    #[tokio::test]
    async fn partial_start_past_end_is_416() {
        let content = b"abcdefghij";
        let mut req = request("GET", "/video");
        req.headers.set("Range", "bytes=10-");
        let sink = ChunkSink::new(0);
        let mut writer = ResponseWriter::new(sink.clone());

        let mut source = Cursor::new(&content[..]);
        writer
            .write_partial(&mut source, content.len() as u64, "video/mp4", &req)
            .await
            .unwrap();

        let out = sink.contents();
        assert_eq!(status_line_of(&out), "HTTP/1.1 416 Range Not Satisfiable\r\n");
        let block = header_block(&out);
        assert!(block.contains("content-range: bytes */10\r\n"));
        assert!(block.contains("content-length: 22\r\n"));
        assert_eq!(body_of(&out), "invalid range provided");
    }

    #[tokio::test]
    async fn partial_end_before_start_is_416() {
        let content = b"abcdefghij";
        let mut req = request("GET", "/video");
        req.headers.set("Range", "bytes=7-3");
        let sink = ChunkSink::new(0);
        let mut writer = ResponseWriter::new(sink.clone());

        let mut source = Cursor::new(&content[..]);
        writer
            .write_partial(&mut source, content.len() as u64, "video/mp4", &req)
            .await
            .unwrap();

        let out = sink.contents();
        assert_eq!(status_line_of(&out), "HTTP/1.1 416 Range Not Satisfiable\r\n");
        assert!(header_block(&out).contains("content-range: bytes */10\r\n"));
        assert_eq!(body_of(&out), "invalid range provided");
    }

    #[tokio::test]
    async fn partial_empty_source_is_416() {
        let mut req = request("GET", "/video");
        req.headers.set("Range", "bytes=0-");
        let sink = ChunkSink::new(0);
        let mut writer = ResponseWriter::new(sink.clone());

        let mut source = Cursor::new(&b""[..]);
        writer
            .write_partial(&mut source, 0, "video/mp4", &req)
            .await
            .unwrap();

        let out = sink.contents();
        assert_eq!(status_line_of(&out), "HTTP/1.1 416 Range Not Satisfiable\r\n");
        assert!(header_block(&out).contains("content-range: bytes */0\r\n"));
    }

    #[tokio::test]
    async fn partial_read_failure_is_500() {
        let req = request("GET", "/video");
        let sink = ChunkSink::new(0);
        let mut writer = ResponseWriter::new(sink.clone());

        writer
            .write_partial(&mut ReadFail, 10, "video/mp4", &req)
            .await
            .unwrap();

        let out = sink.contents();
        assert_eq!(status_line_of(&out), "HTTP/1.1 500 Internal Server Error\r\n");
        assert!(header_block(&out).contains("content-type: text/plain\r\n"));
        assert_eq!(body_of(&out), "error loading content");
    }

    #[tokio::test]
    async fn partial_seek_failure_is_500() {
        let mut req = request("GET", "/video");
        req.headers.set("Range", "bytes=0-");
        let sink = ChunkSink::new(0);
        let mut writer = ResponseWriter::new(sink.clone());

        writer
            .write_partial(&mut SeekFail, 10, "video/mp4", &req)
            .await
            .unwrap();

        let out = sink.contents();
        assert_eq!(status_line_of(&out), "HTTP/1.1 500 Internal Server Error\r\n");
        assert_eq!(body_of(&out), "error loading range");
    }
}

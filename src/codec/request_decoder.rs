use bytes::{Buf, BytesMut};
use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::{Decoder, FramedRead};

use crate::protocol::find_crlf;
use crate::protocol::{ParseError, ParserState, Request, RequestLine};

/// Upper bound on a start-line/header or trailer section, counting both
/// consumed lines and pending bytes.
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Upper bound on an accumulated request body, declared or chunked.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const READ_BUFFER_SIZE: usize = 8 * 1024;
const CRLF: &[u8] = b"\r\n";

/// Incremental request parser.
///
/// `decode` consumes whatever complete pieces are visible in `src`, carries
/// partial state across calls, and yields the finished `Request` once the
/// framing (content-length or chunked, with optional trailers) is complete.
/// `Ok(None)` means more bytes are needed.
pub struct RequestDecoder {
    request: Request,
    state: ParserState,
    content_length: usize,
    chunk_remaining: usize,
    // bytes of the current start-line/header or trailer section consumed
    // so far, carried across calls; reset when the section completes
    section_bytes: usize,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Self {
            request: Request::new(),
            state: ParserState::Init,
            content_length: 0,
            chunk_remaining: 0,
            section_bytes: 0,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    fn step(&mut self, src: &mut BytesMut) -> Result<Option<Request>, ParseError> {
        loop {
            match self.state {
                ParserState::Init => {
                    let Some(idx) = find_crlf(src) else {
                        ensure_header_bound(self.section_bytes + src.len())?;
                        return Ok(None);
                    };
                    self.section_bytes += idx + CRLF.len();
                    ensure_header_bound(self.section_bytes)?;
                    let line = src.split_to(idx);
                    src.advance(CRLF.len());
                    self.request.request_line = parse_request_line(&line)?;
                    self.state = ParserState::Headers;
                }

                ParserState::Headers => {
                    let (consumed, done) = self.request.headers.parse(src)?;
                    src.advance(consumed);
                    self.section_bytes += consumed;
                    if !done {
                        ensure_header_bound(self.section_bytes + src.len())?;
                        return Ok(None);
                    }
                    ensure_header_bound(self.section_bytes)?;
                    self.section_bytes = 0;
                    self.state = self.body_state()?;
                }

                ParserState::Body => {
                    if src.is_empty() {
                        return Ok(None);
                    }
                    let remaining = self.content_length - self.request.body.len();
                    let take = remaining.min(src.len());
                    self.request.body.extend_from_slice(&src[..take]);
                    src.advance(take);
                    if self.request.body.len() < self.content_length {
                        return Ok(None);
                    }
                    self.state = ParserState::Done;
                }

                ParserState::ChunkLength => {
                    let Some(idx) = find_crlf(src) else {
                        if src.len() > MAX_HEADER_BYTES {
                            return Err(ParseError::MalformedChunkedBody);
                        }
                        return Ok(None);
                    };
                    let line = src.split_to(idx);
                    src.advance(CRLF.len());
                    let size = parse_chunk_size(&line)?;
                    if size == 0 {
                        self.state = if self.request.headers.get("trailer").is_some() {
                            ParserState::Trailer
                        } else {
                            ParserState::Done
                        };
                    } else {
                        let available = (MAX_BODY_BYTES - self.request.body.len()) as u64;
                        if size > available {
                            return Err(ParseError::BodyTooLarge { max_size: MAX_BODY_BYTES });
                        }
                        self.chunk_remaining = size as usize;
                        self.state = ParserState::ChunkData;
                    }
                }

                ParserState::ChunkData => {
                    if self.chunk_remaining > 0 {
                        if src.is_empty() {
                            return Ok(None);
                        }
                        let take = self.chunk_remaining.min(src.len());
                        self.request.body.extend_from_slice(&src[..take]);
                        src.advance(take);
                        self.chunk_remaining -= take;
                        if self.chunk_remaining > 0 {
                            return Ok(None);
                        }
                    }
                    // the CRLF closing the chunk must be literally present
                    if src.len() < CRLF.len() {
                        return Ok(None);
                    }
                    if &src[..CRLF.len()] != CRLF {
                        return Err(ParseError::MalformedChunkedBody);
                    }
                    src.advance(CRLF.len());
                    self.state = ParserState::ChunkLength;
                }

                ParserState::Trailer => {
                    let (consumed, done) = self.request.trailer.parse(src)?;
                    src.advance(consumed);
                    self.section_bytes += consumed;
                    if !done {
                        ensure_header_bound(self.section_bytes + src.len())?;
                        return Ok(None);
                    }
                    ensure_header_bound(self.section_bytes)?;
                    self.section_bytes = 0;
                    self.state = ParserState::Done;
                }

                ParserState::Done => {
                    let mut request = std::mem::take(&mut self.request);
                    self.state = ParserState::Init;
                    self.content_length = 0;
                    self.chunk_remaining = 0;
                    self.section_bytes = 0;
                    parse_query_params(&mut request)?;
                    return Ok(Some(request));
                }

                ParserState::Error => return Err(ParseError::RequestInErrorState),
            }
        }
    }

    /// Picks the state that follows the header block, evaluated in order:
    /// chunked transfer-encoding, then a positive content-length, then done.
    fn body_state(&mut self) -> Result<ParserState, ParseError> {
        let chunked = self
            .request
            .headers
            .get("transfer-encoding")
            .map(|value| value == "chunked")
            .unwrap_or(false);
        if chunked {
            return Ok(ParserState::ChunkLength);
        }

        let length = self
            .request
            .headers
            .get("content-length")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(0);
        if length > MAX_BODY_BYTES {
            return Err(ParseError::BodyTooLarge { max_size: MAX_BODY_BYTES });
        }
        if length > 0 {
            self.content_length = length;
            Ok(ParserState::Body)
        } else {
            Ok(ParserState::Done)
        }
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for RequestDecoder {
    type Item = Request;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Request>, ParseError> {
        match self.step(src) {
            Ok(item) => Ok(item),
            Err(e) => {
                self.state = ParserState::Error;
                Err(e)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Request>, ParseError> {
        match self.decode(src)? {
            Some(request) => Ok(Some(request)),
            None => {
                if src.is_empty() && self.state == ParserState::Init {
                    Ok(None)
                } else {
                    self.state = ParserState::Error;
                    Err(ParseError::UnexpectedEof)
                }
            }
        }
    }
}

/// Reads exactly one request from `reader`.
///
/// Convenience wrapper over the incremental decoder; EOF before the request
/// completes (including an immediate close) is `UnexpectedEof`.
pub async fn parse_request<R>(reader: R) -> Result<Request, ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut framed = FramedRead::with_capacity(reader, RequestDecoder::new(), READ_BUFFER_SIZE);
    match framed.next().await {
        Some(result) => result,
        None => Err(ParseError::UnexpectedEof),
    }
}

fn ensure_header_bound(current_size: usize) -> Result<(), ParseError> {
    if current_size > MAX_HEADER_BYTES {
        return Err(ParseError::TooLargeHeader {
            current_size,
            max_size: MAX_HEADER_BYTES,
        });
    }
    Ok(())
}

fn parse_request_line(line: &[u8]) -> Result<RequestLine, ParseError> {
    let line = std::str::from_utf8(line).map_err(|_| ParseError::MalformedRequestLine)?;

    let parts: Vec<&str> = line.split(' ').collect();
    let &[method, target, version_token] = parts.as_slice() else {
        return Err(ParseError::MalformedRequestLine);
    };

    let (proto, version) = version_token
        .split_once('/')
        .ok_or(ParseError::MalformedRequestLine)?;
    if proto != "HTTP" || version.contains('/') {
        return Err(ParseError::MalformedRequestLine);
    }
    if version != "1.1" {
        return Err(ParseError::UnsupportedVersion);
    }

    Ok(RequestLine {
        method: method.to_string(),
        target: target.to_string(),
        version: version.to_string(),
    })
}

/// Chunk-size lines may carry `;extension` suffixes; only the hex prefix
/// matters.
fn parse_chunk_size(line: &[u8]) -> Result<u64, ParseError> {
    let size = match line.iter().position(|&b| b == b';') {
        Some(pos) => &line[..pos],
        None => line,
    };
    let size = std::str::from_utf8(size).map_err(|_| ParseError::MalformedChunkedBody)?;
    u64::from_str_radix(size, 16).map_err(|_| ParseError::MalformedChunkedBody)
}

/// Splits the query off the request-target once parsing is done.
///
/// Values are stored as received (no percent-decoding); only the first `=`
/// splits a pair, duplicate keys are last-write-wins, and a token with an
/// empty key and no `=` (for example a leading `&`) is malformed.
fn parse_query_params(request: &mut Request) -> Result<(), ParseError> {
    let target = &request.request_line.target;
    let Some(pos) = target.find('?') else {
        return Ok(());
    };

    let query = target[pos + 1..].to_string();
    let path = target[..pos].to_string();

    for pair in query.split('&') {
        match pair.split_once('=') {
            Some((key, value)) => {
                request
                    .query_params
                    .insert(key.to_string(), value.to_string());
            }
            None => {
                if pair.is_empty() {
                    return Err(ParseError::MalformedRequestLine);
                }
                request.query_params.insert(pair.to_string(), String::new());
            }
        }
    }

    request.request_line.target = path;
    Ok(())
}

mod headers;
mod method;
mod request;
mod status;

pub use headers::Headers;
pub(crate) use headers::find_crlf;
pub use method::Method;
pub use request::{ParserState, Request, RequestLine};
pub use status::StatusCode;

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

/// Errors raised while consuming a request from the wire.
///
/// The `Display` text of each kind doubles as the response body when the
/// connection layer reports the failure back to the client.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed request-line")]
    MalformedRequestLine,

    #[error("unsupported http version")]
    UnsupportedVersion,

    #[error("malformed header")]
    MalformedHeader,

    #[error("malformed field line")]
    MalformedFieldLine,

    #[error("malformed header name")]
    MalformedHeaderName,

    #[error("malformed chunked body")]
    MalformedChunkedBody,

    #[error("header section too large, current: {current_size} exceeds the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("body exceeds the limit {max_size}")]
    BodyTooLarge { max_size: usize },

    #[error("request in error state")]
    RequestInErrorState,

    #[error("unexpected end of stream")]
    UnexpectedEof,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    /// Status written back to the client when this error aborts a connection.
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::UnsupportedVersion => StatusCode::HTTP_VERSION_NOT_SUPPORTED,
            ParseError::MalformedRequestLine
            | ParseError::MalformedHeader
            | ParseError::MalformedFieldLine
            | ParseError::MalformedHeaderName
            | ParseError::MalformedChunkedBody
            | ParseError::TooLargeHeader { .. }
            | ParseError::BodyTooLarge { .. } => StatusCode::BAD_REQUEST,
            ParseError::RequestInErrorState
            | ParseError::UnexpectedEof
            | ParseError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors raised while emitting a response.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("unrecognized status code {0}")]
    UnrecognizedStatusCode(u16),

    #[error("failed to write: {source}")]
    FailedToWrite {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    /// True when the peer went away mid-write; such failures are dropped
    /// silently instead of logged.
    pub fn is_connection_closed(&self) -> bool {
        match self {
            SendError::FailedToWrite { source } => matches!(
                source.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
            ),
            SendError::UnrecognizedStatusCode(_) => false,
        }
    }
}

/// Registration-time routing errors, surfaced to the caller rather than
/// onto the wire.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("ambiguous path params: ':{existing}' conflicts with ':{conflicting}'")]
    AmbiguousPathParams {
        existing: String,
        conflicting: String,
    },

    #[error("request target is empty")]
    RequestTargetEmpty,

    #[error("malformed request target: {target}")]
    MalformedRequestTarget { target: String },
}

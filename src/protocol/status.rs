use std::fmt;

/// Response status code with a closed reason-phrase table.
///
/// Codes outside the table have no reason phrase; attempting to write them
/// fails with `SendError::UnrecognizedStatusCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const PARTIAL_CONTENT: StatusCode = StatusCode(206);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    pub const RANGE_NOT_SATISFIABLE: StatusCode = StatusCode(416);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const NOT_IMPLEMENTED: StatusCode = StatusCode(501);
    pub const HTTP_VERSION_NOT_SUPPORTED: StatusCode = StatusCode(505);

    pub fn from_u16(code: u16) -> StatusCode {
        StatusCode(code)
    }

    pub fn as_u16(self) -> u16 {
        self.0
    }

    pub fn reason_phrase(self) -> Option<&'static str> {
        match self.0 {
            200 => Some("OK"),
            201 => Some("Created"),
            206 => Some("Partial Content"),
            400 => Some("Bad Request"),
            404 => Some("Not Found"),
            405 => Some("Method Not Allowed"),
            416 => Some("Range Not Satisfiable"),
            500 => Some("Internal Server Error"),
            501 => Some("Not Implemented"),
            505 => Some("HTTP Version Not Supported"),
            _ => None,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

mod request_decoder;

pub use request_decoder::{parse_request, RequestDecoder, MAX_BODY_BYTES, MAX_HEADER_BYTES};

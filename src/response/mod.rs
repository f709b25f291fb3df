mod writer;

pub use writer::{default_headers, ResponseWriter};

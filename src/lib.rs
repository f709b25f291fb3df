pub mod codec;
pub mod config;
mod connection;
pub mod protocol;
pub mod response;
pub mod router;
pub mod server;

pub type Error = anyhow::Error;
pub type Result<T> = anyhow::Result<T>;

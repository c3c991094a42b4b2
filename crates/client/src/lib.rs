#![forbid(unsafe_code)]

//! HTTP transport for talking to a Flamenco Manager.

mod http;
mod slot;

pub use http::HttpManagerClient;
pub use slot::{client_version, ClientSlot};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("could not build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

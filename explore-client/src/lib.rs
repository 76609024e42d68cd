//! HTTP transport for the MeTTa-KG explore endpoint.

mod client;
mod config;
mod wire;

pub use client::HttpExploreClient;
pub use config::CREDENTIAL_ENV_VAR;
pub use config::ClientConfig;
pub use wire::encode_token;
pub use wire::parse_explore_body;

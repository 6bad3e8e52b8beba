pub mod config;
pub mod error;
pub mod http;
pub mod logging;
mod metrics;
pub mod protocol;
pub mod server;

pub use config::{ServerConfig, Transport};
pub use error::ApiError;
pub use http::{HttpRequest, HttpResponse};
pub use server::RankingServer;

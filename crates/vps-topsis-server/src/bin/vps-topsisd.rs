use std::io;

use vps_topsis_server::logging::init_tracing_subscriber;
use vps_topsis_server::{RankingServer, ServerConfig, Transport};

fn main() -> io::Result<()> {
    let config = ServerConfig::from_env()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
    init_tracing_subscriber("vps-topsisd", config.log_dir.as_deref());

    let server = RankingServer::open(&config).map_err(|err| io::Error::other(err.to_string()))?;
    tracing::info!(
        transport = ?config.transport,
        catalog = %config.catalog_path.display(),
        history = %config.history_path.display(),
        "vps-topsisd starting"
    );
    match config.transport {
        Transport::Stdio => server.serve_stdio(),
        Transport::Http => server.serve_http(&config.http_addr),
    }
}

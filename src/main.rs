//! Demo server binary: the connection core wired to the minimal HTTP/1.x
//! reference collaborators with a static dispatch handler.

use std::path::PathBuf;

use bytes::Bytes;
use clap::Parser;

use exchange_core::config::{load_config, ServerConfig};
use exchange_core::exchange::http1::{
    simple_response, ContentLengthFraming, Http1HeadParser, RequestHead,
};
use exchange_core::exchange::{Dispatch, Reply};
use exchange_core::lifecycle::{signals, Shutdown};
use exchange_core::observability::{logging, metrics};
use exchange_core::Server;

#[derive(Parser, Debug)]
#[command(about = "Request/response server built on the exchange-core connection driver")]
struct Args {
    /// Path to a TOML configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Echoes the request target (and body size) back to the peer.
struct EchoDispatch;

impl Dispatch for EchoDispatch {
    type Request = RequestHead;
    type Body = Bytes;

    async fn handle(&mut self, request: RequestHead, body: Option<Bytes>) -> Reply {
        let body_len = body.map_or(0, |b| b.len());
        let text = format!("{} {} ({} body bytes)\n", request.method, request.target, body_len);
        Reply {
            buffers: simple_response("HTTP/1.1 200 OK", Bytes::from(text)),
            keep_alive: request.keep_alive,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        header_read_ms = config.timeouts.header_read_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let server = Server::new(config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        signals::wait_for_termination().await;
        shutdown.trigger();
    });

    server
        .run(
            || (Http1HeadParser::new(), ContentLengthFraming::default(), EchoDispatch),
            server_shutdown,
        )
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

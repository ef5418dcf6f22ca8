use clap::Parser;
use embedproj_reduce::config::{Args, ListenTarget, PluginConfig};
use embedproj_reduce::proto::projection_plugin_service_server::ProjectionPluginServiceServer;
use embedproj_reduce::{logging, DefaultReducer, ReducePluginService};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Report panics on stderr even before logging is up
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: Plugin panicked during startup or execution");
        eprintln!(
            "  Location: {}",
            panic_info
                .location()
                .map(|l| l.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
        let payload = panic_info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("<no message>");
        eprintln!("  Message: {}", message);
    }));

    let config = PluginConfig::try_from(Args::parse())?;
    logging::init(config.log_level);

    info!("Initializing embedproj Reduce Plugin");
    info!("  Version: {}", env!("CARGO_PKG_VERSION"));

    let listener = bind(&config.listen).await?;
    let local_addr = listener.local_addr()?;

    // Announce actual port to the plugin manager via stdout protocol.
    // Must be println (stdout), not info (stderr).
    println!("EMBEDPROJ_PLUGIN_PORT={}", local_addr.port());

    let service = ReducePluginService::<DefaultReducer>::default();
    info!("  Learned backend: {}", service.backend_name());

    #[cfg(feature = "umap")]
    if !embedproj_reduce::UmapReducer::is_available() {
        warn!("umap-learn is not importable; every batch will use the fallback projection");
    }

    info!("Starting gRPC server on {}", local_addr);

    let incoming = TcpListenerStream::new(listener);
    Server::builder()
        .add_service(
            ProjectionPluginServiceServer::new(service)
                .max_decoding_message_size(config.max_message_bytes)
                .max_encoding_message_size(config.max_message_bytes),
        )
        .serve_with_incoming_shutdown(incoming, shutdown_signal())
        .await?;

    info!("Plugin shutdown complete");
    Ok(())
}

/// Bind the listener, moving to the next port when the requested one is
/// taken by another session.
async fn bind(target: &ListenTarget) -> Result<TcpListener, Box<dyn std::error::Error>> {
    let start = match target {
        ListenTarget::Address(addr) => return Ok(TcpListener::bind(*addr).await?),
        ListenTarget::Port(port) => *port,
    };

    let mut last_err = None;
    let mut last_port = start;
    for port in ListenTarget::candidate_ports(start) {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                warn!("Port {} in use", port);
                last_err = Some(e);
                last_port = port;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(format!(
        "failed to bind ports {}..={}: {}",
        start,
        last_port,
        last_err.map(|e| e.to_string()).unwrap_or_default()
    )
    .into())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}

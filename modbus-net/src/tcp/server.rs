// Crate
use crate::Handler;
use crate::tcp::Config;

// Workspace
use modbus_mem::DeviceMap;

// External
use anyhow::anyhow;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_modbus::server::tcp::{Server as TcpServer, accept_tcp_connection};

/// Bind the listener and serve the device memory on a background task.
///
/// Every accepted connection gets its own [`Handler`], all of them share the same map.
pub async fn run<L>(
    config: &Config,
    map: Arc<DeviceMap>,
    log: L,
) -> Result<JoinHandle<Result<(), anyhow::Error>>, anyhow::Error>
where
    L: Fn(String) + Clone + Send + Sync + 'static,
{
    let addr: SocketAddr = format!("{}:{}", config.ip, config.port)
        .parse()
        .map_err(|e| anyhow!("Invalid address {}:{} [{}]", config.ip, config.port, e))?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow!("Failed to bind to address {} [{}]", addr, e))?;
    log(format!("Serving Modbus TCP on {}", addr));

    let server = TcpServer::new(listener);
    Ok(tokio::task::spawn(async move {
        let new_handler = |socket_addr: SocketAddr| {
            log(format!("Accepted connection from {}", socket_addr));
            Ok(Some(Handler::new(map.clone(), log.clone())))
        };
        let on_connected = |stream, socket_addr| async move {
            accept_tcp_connection(stream, socket_addr, new_handler)
        };
        let on_process_log = log.clone();
        let on_process_error = move |err| {
            on_process_log(format!("Server processing failed. [{}]", err));
        };
        server
            .serve(&on_connected, on_process_error)
            .await
            .map_err(|e| anyhow!("{}", e))
    }))
}

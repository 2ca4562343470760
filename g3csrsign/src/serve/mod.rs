/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use log::info;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Server, ServerTlsConfig};

use g3csrsign_proto::securityapi::security_service_server::SecurityServiceServer;

use crate::bootstrap::ServerIdentity;
use crate::issue::IssuanceHandler;

mod service;
pub use service::SecurityApi;

pub async fn bind(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow!("failed to listen on {addr}: {e}"))
}

/// Bind the listener and serve until `shutdown` resolves.
pub async fn run<F>(
    addr: SocketAddr,
    identity: &ServerIdentity,
    handler: Arc<IssuanceHandler>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let listener = bind(addr).await?;
    serve_with_listener(listener, identity, handler, shutdown).await
}

pub async fn serve_with_listener<F>(
    listener: TcpListener,
    identity: &ServerIdentity,
    handler: Arc<IssuanceHandler>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let local_addr = listener
        .local_addr()
        .map_err(|e| anyhow!("failed to get local address: {e}"))?;

    let tls_config = ServerTlsConfig::new().identity(identity.to_tonic());
    let mut server = Server::builder()
        .tls_config(tls_config)
        .context("invalid server TLS config")?;

    info!("CSR signing server listening on {local_addr}");
    server
        .add_service(SecurityServiceServer::new(SecurityApi::new(handler)))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await
        .context("gRPC server failed")?;
    info!("CSR signing server on {local_addr} stopped");
    Ok(())
}

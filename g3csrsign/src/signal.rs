/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use log::{info, warn};

/// Resolves on the first SIGINT or SIGTERM.
#[cfg(unix)]
pub async fn wait_for_quit() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!("failed to register SIGTERM handler: {e}");
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to wait for SIGINT: {e}");
            }
            info!("got SIGINT, quit now");
            return;
        }
    };

    tokio::select! {
        r = tokio::signal::ctrl_c() => {
            if let Err(e) = r {
                warn!("failed to wait for SIGINT: {e}");
            }
            info!("got SIGINT, quit now");
        }
        _ = sigterm.recv() => {
            info!("got SIGTERM, quit now");
        }
    }
}

#[cfg(windows)]
pub async fn wait_for_quit() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to wait for ctrl-c: {e}");
    }
    info!("got ctrl-c, quit now");
}

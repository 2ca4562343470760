/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use anyhow::{Context, anyhow};
use log::{debug, error, info};

use g3csrsign::bootstrap::ServerIdentity;
use g3csrsign::config::SignerConfig;
use g3csrsign::issue::IssuanceHandler;
use g3csrsign::opts::ProcArgs;

fn main() -> anyhow::Result<()> {
    openssl::init();

    let Some(proc_args) = g3csrsign::opts::parse_clap() else {
        return Ok(());
    };

    // set up process logger early, only proc args is used inside
    let log_guard =
        g3csrsign::log::setup(proc_args.verbose_level).context("failed to setup logger")?;

    let ret = load_and_run(proc_args);
    log_guard.report_dropped();
    match ret {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("{e:?}");
            Err(e)
        }
    }
}

fn load_and_run(proc_args: ProcArgs) -> anyhow::Result<()> {
    let config = SignerConfig::load(proc_args.config_file.as_deref(), proc_args.overrides)
        .context("failed to load config")?;
    if let Some(path) = &proc_args.config_file {
        debug!("loaded config from {}", path.display());
    }
    info!("using token with prefix {}", config.token().prefix());

    let ca = g3csrsign::bootstrap::load_ca(&config)?;
    let identity =
        ServerIdentity::from_config(&config, &ca).context("failed to set up server identity")?;

    if proc_args.test_config {
        info!("the config is OK");
        return Ok(());
    }

    let handler = Arc::new(IssuanceHandler::new(
        Arc::new(ca),
        config.token().clone(),
        config.validity(),
    ));
    tokio_run(&config, &identity, handler)
}

fn tokio_run(
    config: &SignerConfig,
    identity: &ServerIdentity,
    handler: Arc<IssuanceHandler>,
) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to start runtime: {e}"))?;
    rt.block_on(async {
        g3csrsign::serve::run(
            config.listen_addr(),
            identity,
            handler,
            g3csrsign::signal::wait_for_quit(),
        )
        .await
    })
}

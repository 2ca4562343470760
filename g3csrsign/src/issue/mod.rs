/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use log::{debug, error, info, warn};

use g3_tls_cert::builder::{LeafCertBuilder, ValidityPolicy};
use g3_tls_cert::ca::CaIdentity;
use g3_tls_cert::csr::{CertRequest, decode_pem};

use crate::auth::{SharedToken, TokenSource};

mod error;
pub use error::{ErrorClass, RequestError};

#[derive(Debug)]
pub struct IssuedBundle {
    pub ca: Vec<u8>,
    pub crt: Vec<u8>,
}

/// Serves certificate requests against one CA and one shared token.
///
/// Holds no per request state, and is shared by all connections.
pub struct IssuanceHandler {
    ca: Arc<CaIdentity>,
    token: SharedToken,
    builder: LeafCertBuilder,
}

impl IssuanceHandler {
    pub fn new(ca: Arc<CaIdentity>, token: SharedToken, validity: ValidityPolicy) -> Self {
        IssuanceHandler {
            ca,
            token,
            builder: LeafCertBuilder::tls_server(validity),
        }
    }

    pub fn handle<S: TokenSource + ?Sized>(
        &self,
        source: &S,
        csr: &[u8],
    ) -> Result<IssuedBundle, RequestError> {
        self.token.authenticate(source)?;

        debug!("parsing CSR (length: {} bytes)", csr.len());
        let der = decode_pem(csr).inspect_err(|e| warn!("{e}"))?;
        let req = CertRequest::from_der(&der).inspect_err(|e| warn!("{e}"))?;
        let req = req.verify().inspect_err(|e| warn!("{e}"))?;
        debug!(
            "CSR details: subject={}, dns_names={:?}, ip_addresses={:?}",
            req.common_name(),
            req.dns_names(),
            req.ip_addresses()
        );

        let crt = self
            .builder
            .issue_pem(&self.ca, req.public_key(), &req.leaf_subject())
            .inspect_err(|e| error!("failed to issue certificate for {}: {e}", req.common_name()))?;
        info!(
            "certificate signed for {} (valid for {} days)",
            req.common_name(),
            self.builder.validity().days()
        );

        Ok(IssuedBundle {
            ca: self.ca.certificate_pem().to_vec(),
            crt,
        })
    }
}

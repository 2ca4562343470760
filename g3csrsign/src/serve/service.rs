/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use log::error;
use tonic::{Request, Response, Status};

use g3csrsign_proto::securityapi::security_service_server::SecurityService;
use g3csrsign_proto::securityapi::{CertificateRequest, CertificateResponse};

use crate::issue::IssuanceHandler;

pub struct SecurityApi {
    handler: Arc<IssuanceHandler>,
}

impl SecurityApi {
    pub fn new(handler: Arc<IssuanceHandler>) -> Self {
        SecurityApi { handler }
    }
}

#[tonic::async_trait]
impl SecurityService for SecurityApi {
    async fn certificate(
        &self,
        request: Request<CertificateRequest>,
    ) -> Result<Response<CertificateResponse>, Status> {
        let (metadata, _extensions, req) = request.into_parts();
        let handler = self.handler.clone();

        // signing is CPU bound
        let bundle = tokio::task::spawn_blocking(move || handler.handle(&metadata, &req.csr))
            .await
            .map_err(|e| {
                error!("certificate task failed: {e}");
                Status::internal("failed to issue certificate")
            })??;

        Ok(Response::new(CertificateResponse {
            ca: bundle.ca,
            crt: bundle.crt,
        }))
    }
}

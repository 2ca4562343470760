/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use thiserror::Error;

use g3_tls_cert::builder::IssueError;
use g3_tls_cert::csr::CsrError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    Unauthenticated,
    InvalidArgument,
    Internal,
}

impl From<ErrorClass> for tonic::Code {
    fn from(value: ErrorClass) -> Self {
        match value {
            ErrorClass::Unauthenticated => tonic::Code::Unauthenticated,
            ErrorClass::InvalidArgument => tonic::Code::InvalidArgument,
            ErrorClass::Internal => tonic::Code::Internal,
        }
    }
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("missing token")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("failed to decode PEM CSR: {0}")]
    MalformedPem(String),
    #[error("failed to parse CSR: {0}")]
    UnparseableCsr(String),
    #[error("invalid CSR signature: {0}")]
    InvalidCsrSignature(String),
    #[error("internal error: {0}")]
    Internal(#[from] IssueError),
}

impl From<CsrError> for RequestError {
    fn from(value: CsrError) -> Self {
        match value {
            CsrError::MalformedPem(s) => RequestError::MalformedPem(s),
            CsrError::Unparseable(s) => RequestError::UnparseableCsr(s),
            CsrError::InvalidSignature(s) => RequestError::InvalidCsrSignature(s),
        }
    }
}

impl RequestError {
    pub fn class(&self) -> ErrorClass {
        match self {
            RequestError::MissingToken | RequestError::InvalidToken => ErrorClass::Unauthenticated,
            RequestError::MalformedPem(_)
            | RequestError::UnparseableCsr(_)
            | RequestError::InvalidCsrSignature(_) => ErrorClass::InvalidArgument,
            RequestError::Internal(_) => ErrorClass::Internal,
        }
    }

    /// The message returned to the caller, internal details are withheld.
    pub fn client_message(&self) -> String {
        match self {
            RequestError::MalformedPem(_) => "failed to decode PEM CSR".to_string(),
            RequestError::Internal(_) => "failed to issue certificate".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<RequestError> for tonic::Status {
    fn from(value: RequestError) -> Self {
        tonic::Status::new(value.class().into(), value.client_message())
    }
}

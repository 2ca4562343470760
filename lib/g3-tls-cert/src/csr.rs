/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Certificate signing request decoding and validation.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use openssl::nid::Nid;
use openssl::pkey::{PKey, PKeyRef, Public};
use openssl::x509::X509Req;
use thiserror::Error;
use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::cri_attributes::ParsedCriAttribute;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::oid_registry::OID_X509_EXT_SUBJECT_ALT_NAME;
use x509_parser::prelude::FromDer;

use crate::builder::LeafSubject;

pub const PEM_TAG_CERTIFICATE_REQUEST: &str = "CERTIFICATE REQUEST";
pub const PEM_TAG_NEW_CERTIFICATE_REQUEST: &str = "NEW CERTIFICATE REQUEST";

#[derive(Debug, Error)]
pub enum CsrError {
    #[error("failed to decode PEM CSR: {0}")]
    MalformedPem(String),
    #[error("failed to parse CSR: {0}")]
    Unparseable(String),
    #[error("CSR signature verification failed: {0}")]
    InvalidSignature(String),
}

/// Extract the DER body of a PEM encoded CSR.
pub fn decode_pem(data: &[u8]) -> Result<Vec<u8>, CsrError> {
    let block = pem::parse(data).map_err(|e| CsrError::MalformedPem(e.to_string()))?;
    match block.tag() {
        PEM_TAG_CERTIFICATE_REQUEST | PEM_TAG_NEW_CERTIFICATE_REQUEST => {
            Ok(block.into_contents())
        }
        tag => Err(CsrError::MalformedPem(format!(
            "unexpected PEM block type {tag}"
        ))),
    }
}

/// A parsed, not yet verified, CSR.
pub struct CertRequest {
    req: X509Req,
    public_key: PKey<Public>,
    common_name: String,
    dns_names: Vec<String>,
    ip_addresses: Vec<IpAddr>,
}

impl CertRequest {
    pub fn from_pem(data: &[u8]) -> Result<Self, CsrError> {
        let der = decode_pem(data)?;
        CertRequest::from_der(&der)
    }

    pub fn from_der(der: &[u8]) -> Result<Self, CsrError> {
        let (left, parsed) = X509CertificationRequest::from_der(der)
            .map_err(|e| CsrError::Unparseable(e.to_string()))?;
        if !left.is_empty() {
            return Err(CsrError::Unparseable(format!(
                "{} bytes of trailing data",
                left.len()
            )));
        }

        let mut dns_names = Vec::new();
        let mut ip_addresses = Vec::new();
        for attr in parsed.certification_request_info.iter_attributes() {
            let ParsedCriAttribute::ExtensionRequest(requested) = attr.parsed_attribute() else {
                continue;
            };
            for ext in &requested.extensions {
                if ext.oid != OID_X509_EXT_SUBJECT_ALT_NAME {
                    continue;
                }
                let san = match ext.parsed_extension() {
                    ParsedExtension::SubjectAlternativeName(san) => san,
                    ParsedExtension::ParseError { error } => {
                        return Err(CsrError::Unparseable(format!(
                            "invalid SubjectAlternativeName extension: {error}"
                        )));
                    }
                    _ => {
                        return Err(CsrError::Unparseable(
                            "unexpected SubjectAlternativeName extension content".to_string(),
                        ));
                    }
                };
                for name in &san.general_names {
                    match name {
                        GeneralName::DNSName(s) => dns_names.push(s.to_string()),
                        GeneralName::IPAddress(b) => ip_addresses.push(ip_from_bytes(b)?),
                        _ => {}
                    }
                }
            }
        }

        let req = X509Req::from_der(der).map_err(|e| CsrError::Unparseable(e.to_string()))?;
        let public_key = req
            .public_key()
            .map_err(|e| CsrError::Unparseable(format!("invalid public key: {e}")))?;

        let common_name = match req.subject_name().entries_by_nid(Nid::COMMONNAME).next() {
            Some(entry) => entry
                .data()
                .to_string()
                .map_err(|e| CsrError::Unparseable(format!("invalid common name: {e}")))?,
            None => String::new(),
        };
        // a NUL would truncate the issued subject name
        if common_name.contains('\0') {
            return Err(CsrError::Unparseable(
                "NUL character in common name".to_string(),
            ));
        }

        Ok(CertRequest {
            req,
            public_key,
            common_name,
            dns_names,
            ip_addresses,
        })
    }

    #[inline]
    pub fn common_name(&self) -> &str {
        &self.common_name
    }

    #[inline]
    pub fn dns_names(&self) -> &[String] {
        &self.dns_names
    }

    #[inline]
    pub fn ip_addresses(&self) -> &[IpAddr] {
        &self.ip_addresses
    }

    /// Check the self signature against the embedded public key.
    pub fn verify(self) -> Result<VerifiedCertRequest, CsrError> {
        match self.req.verify(&self.public_key) {
            Ok(true) => Ok(VerifiedCertRequest(self)),
            Ok(false) => Err(CsrError::InvalidSignature(
                "signature does not match the public key".to_string(),
            )),
            Err(e) => Err(CsrError::InvalidSignature(e.to_string())),
        }
    }
}

/// A CSR with proven possession of the private key.
pub struct VerifiedCertRequest(CertRequest);

impl VerifiedCertRequest {
    #[inline]
    pub fn public_key(&self) -> &PKeyRef<Public> {
        &self.0.public_key
    }

    #[inline]
    pub fn common_name(&self) -> &str {
        &self.0.common_name
    }

    #[inline]
    pub fn dns_names(&self) -> &[String] {
        &self.0.dns_names
    }

    #[inline]
    pub fn ip_addresses(&self) -> &[IpAddr] {
        &self.0.ip_addresses
    }

    pub fn leaf_subject(&self) -> LeafSubject<'_> {
        LeafSubject {
            common_name: &self.0.common_name,
            organization: None,
            dns_names: &self.0.dns_names,
            ip_addresses: &self.0.ip_addresses,
        }
    }
}

fn ip_from_bytes(b: &[u8]) -> Result<IpAddr, CsrError> {
    if let Ok(v4) = <[u8; 4]>::try_from(b) {
        Ok(IpAddr::V4(Ipv4Addr::from(v4)))
    } else if let Ok(v6) = <[u8; 16]>::try_from(b) {
        Ok(IpAddr::V6(Ipv6Addr::from(v6)))
    } else {
        Err(CsrError::Unparseable(format!(
            "invalid IP address length {} in SAN",
            b.len()
        )))
    }
}

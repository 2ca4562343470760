/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::IpAddr;

use chrono::{DateTime, Days, Utc};
use openssl::error::ErrorStack;
use openssl::pkey::{HasPublic, PKeyRef};
use openssl::x509::extension::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAlternativeName,
    SubjectKeyIdentifier,
};
use openssl::x509::{X509, X509Builder, X509Extension};
use thiserror::Error;

use super::{SubjectNameBuilder, asn1_time_from_chrono};
use crate::ca::CaIdentity;

pub const DEFAULT_VALIDITY_DAYS: u32 = 365;

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to use CA certificate: {0}")]
    CaCertificate(ErrorStack),
    #[error("failed to generate serial number: {0}")]
    Serial(ErrorStack),
    #[error("invalid validity window: {0}")]
    Validity(String),
    #[error("failed to set {0}: {1}")]
    Template(&'static str, ErrorStack),
    #[error("failed to sign certificate: {0}")]
    Sign(ErrorStack),
    #[error("failed to encode certificate: {0}")]
    Encode(ErrorStack),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeafProfile {
    TlsServer,
    TlsClient,
}

impl LeafProfile {
    fn key_usage(&self) -> Result<X509Extension, ErrorStack> {
        let mut usage = KeyUsage::new();
        usage.critical().digital_signature();
        if *self == LeafProfile::TlsServer {
            usage.key_encipherment();
        }
        usage.build()
    }

    fn ext_key_usage(&self) -> Result<X509Extension, ErrorStack> {
        let mut usage = ExtendedKeyUsage::new();
        match self {
            LeafProfile::TlsServer => usage.server_auth(),
            LeafProfile::TlsClient => usage.client_auth(),
        };
        usage.build()
    }
}

/// Validity window anchored at issuance time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidityPolicy {
    days: u32,
}

impl Default for ValidityPolicy {
    fn default() -> Self {
        ValidityPolicy {
            days: DEFAULT_VALIDITY_DAYS,
        }
    }
}

impl ValidityPolicy {
    pub fn with_days(days: u32) -> Self {
        ValidityPolicy { days }
    }

    #[inline]
    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn window(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>), IssueError> {
        if self.days == 0 {
            return Err(IssueError::Validity("zero days".to_string()));
        }
        let not_after = now
            .checked_add_days(Days::new(self.days as u64))
            .ok_or_else(|| IssueError::Validity(format!("now + {} days overflow", self.days)))?;
        Ok((now, not_after))
    }
}

/// The requested identity of a leaf certificate.
///
/// The issued subject name is built from `common_name` and `organization`
/// only, never copied from a CSR subject as a whole.
pub struct LeafSubject<'a> {
    pub common_name: &'a str,
    pub organization: Option<&'a str>,
    pub dns_names: &'a [String],
    pub ip_addresses: &'a [IpAddr],
}

impl LeafSubject<'_> {
    fn subject_alt_name(&self) -> Option<SubjectAlternativeName> {
        if self.dns_names.is_empty() && self.ip_addresses.is_empty() {
            return None;
        }
        let mut san = SubjectAlternativeName::new();
        for name in self.dns_names {
            san.dns(name);
        }
        for ip in self.ip_addresses {
            san.ip(&ip.to_string());
        }
        Some(san)
    }
}

/// Builds CA signed leaf certificates.
///
/// No per certificate state is kept here, serial and validity window are
/// fresh for every call, so a single builder can be shared between threads.
pub struct LeafCertBuilder {
    profile: LeafProfile,
    validity: ValidityPolicy,
}

impl LeafCertBuilder {
    pub fn new(profile: LeafProfile, validity: ValidityPolicy) -> Self {
        LeafCertBuilder { profile, validity }
    }

    pub fn tls_server(validity: ValidityPolicy) -> Self {
        LeafCertBuilder::new(LeafProfile::TlsServer, validity)
    }

    pub fn tls_client(validity: ValidityPolicy) -> Self {
        LeafCertBuilder::new(LeafProfile::TlsClient, validity)
    }

    #[inline]
    pub fn profile(&self) -> LeafProfile {
        self.profile
    }

    #[inline]
    pub fn validity(&self) -> ValidityPolicy {
        self.validity
    }

    pub fn build<T: HasPublic>(
        &self,
        ca: &CaIdentity,
        pubkey: &PKeyRef<T>,
        subject: &LeafSubject<'_>,
    ) -> Result<X509, IssueError> {
        let ca_cert = ca.certificate();

        let serial = super::serial::random_128().map_err(IssueError::Serial)?;
        let (time_before, time_after) = self.validity.window(Utc::now())?;
        let not_before = asn1_time_from_chrono(&time_before)
            .map_err(|e| IssueError::Validity(format!("invalid NotBefore time: {e}")))?;
        let not_after = asn1_time_from_chrono(&time_after)
            .map_err(|e| IssueError::Validity(format!("invalid NotAfter time: {e}")))?;

        // Only CN and the optional O reach the issued subject. Other RDNs in a
        // CSR subject are dropped, callers cannot choose them.
        let mut name_builder = SubjectNameBuilder::default();
        name_builder.set_common_name(subject.common_name.to_string());
        if let Some(o) = subject.organization {
            name_builder.set_organization(o.to_string());
        }
        let subject_name = name_builder
            .build()
            .map_err(|e| IssueError::Template("subject name", e))?;

        let mut builder = X509Builder::new().map_err(|e| IssueError::Template("x509 builder", e))?;
        builder
            .set_version(2)
            .map_err(|e| IssueError::Template("x509 version 3", e))?;
        builder
            .set_serial_number(&serial)
            .map_err(|e| IssueError::Template("serial number", e))?;
        builder
            .set_subject_name(&subject_name)
            .map_err(|e| IssueError::Template("subject name", e))?;
        builder
            .set_issuer_name(ca_cert.subject_name())
            .map_err(IssueError::CaCertificate)?;
        builder
            .set_pubkey(pubkey)
            .map_err(|e| IssueError::Template("pub key", e))?;
        builder
            .set_not_before(&not_before)
            .map_err(|e| IssueError::Template("NotBefore", e))?;
        builder
            .set_not_after(&not_after)
            .map_err(|e| IssueError::Template("NotAfter", e))?;

        let basic_constraints = BasicConstraints::new()
            .critical()
            .build()
            .map_err(|e| IssueError::Template("BasicConstraints extension", e))?;
        builder
            .append_extension(basic_constraints)
            .map_err(|e| IssueError::Template("BasicConstraints extension", e))?;
        let key_usage = self
            .profile
            .key_usage()
            .map_err(|e| IssueError::Template("KeyUsage extension", e))?;
        builder
            .append_extension(key_usage)
            .map_err(|e| IssueError::Template("KeyUsage extension", e))?;
        let ext_key_usage = self
            .profile
            .ext_key_usage()
            .map_err(|e| IssueError::Template("ExtendedKeyUsage extension", e))?;
        builder
            .append_extension(ext_key_usage)
            .map_err(|e| IssueError::Template("ExtendedKeyUsage extension", e))?;

        let v3_ctx = builder.x509v3_context(Some(ca_cert), None);
        let san = match subject.subject_alt_name() {
            Some(san) => Some(
                san.build(&v3_ctx)
                    .map_err(|e| IssueError::Template("SubjectAlternativeName extension", e))?,
            ),
            None => None,
        };
        let ski = SubjectKeyIdentifier::new()
            .build(&v3_ctx)
            .map_err(|e| IssueError::Template("SubjectKeyIdentifier extension", e))?;
        let aki = AuthorityKeyIdentifier::new()
            .keyid(false)
            .build(&v3_ctx)
            .map_err(IssueError::CaCertificate)?;

        if let Some(san) = san {
            builder
                .append_extension(san)
                .map_err(|e| IssueError::Template("SubjectAlternativeName extension", e))?;
        }
        builder
            .append_extension(ski)
            .map_err(|e| IssueError::Template("SubjectKeyIdentifier extension", e))?;
        builder
            .append_extension(aki)
            .map_err(|e| IssueError::Template("AuthorityKeyIdentifier extension", e))?;

        ca.signer().sign(&mut builder).map_err(IssueError::Sign)?;
        Ok(builder.build())
    }

    /// Build and PEM encode a new certificate.
    pub fn issue_pem<T: HasPublic>(
        &self,
        ca: &CaIdentity,
        pubkey: &PKeyRef<T>,
        subject: &LeafSubject<'_>,
    ) -> Result<Vec<u8>, IssueError> {
        let cert = self.build(ca, pubkey, subject)?;
        cert.to_pem().map_err(IssueError::Encode)
    }
}

/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! CA material loading.
//!
//! The CA certificate and private key are handed over as raw PEM bytes, the
//! private key decoder is chosen by the PEM block label. The result is an
//! immutable [`CaIdentity`] which is shared read-only by everything that
//! issues certificates.

use openssl::ec::EcKey;
use openssl::error::ErrorStack;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{Id, PKey, PKeyRef, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509, X509Builder, X509Ref};
use thiserror::Error;

pub const PEM_TAG_CERTIFICATE: &str = "CERTIFICATE";

pub const PEM_TAG_ED25519_PRIVATE_KEY: &str = "ED25519 PRIVATE KEY";
pub const PEM_TAG_EC_PRIVATE_KEY: &str = "EC PRIVATE KEY";
pub const PEM_TAG_RSA_PRIVATE_KEY: &str = "RSA PRIVATE KEY";
pub const PEM_TAG_PKCS8_PRIVATE_KEY: &str = "PRIVATE KEY";

#[derive(Debug, Error)]
pub enum CaLoadError {
    #[error("failed to decode CA certificate: {0}")]
    DecodeError(String),
    #[error("failed to parse CA certificate: {0}")]
    InvalidCertificate(ErrorStack),
    #[error("failed to decode PEM private key: {0}")]
    KeyDecodeError(String),
    #[error("unsupported block type: {0}")]
    UnsupportedKeyType(String),
    #[error("failed to parse private key: {0}")]
    InvalidKey(ErrorStack),
    #[error("unsupported private key algorithm {0:?}")]
    UnsupportedKeyAlgorithm(Id),
    #[error("CA private key does not match the CA certificate")]
    KeyMismatch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EcDigest {
    Sha256,
    Sha384,
    Sha512,
}

/// The CA private key, classified once at load time.
pub enum CaSigner {
    Ecdsa(PKey<Private>, EcDigest),
    Rsa(PKey<Private>),
    Ed25519(PKey<Private>),
}

impl CaSigner {
    fn from_pkey(key: PKey<Private>) -> Result<Self, CaLoadError> {
        match key.id() {
            Id::EC => {
                let ec_key = key.ec_key().map_err(CaLoadError::InvalidKey)?;
                let digest = match ec_key.group().curve_name() {
                    Some(Nid::SECP384R1) => EcDigest::Sha384,
                    Some(Nid::SECP521R1) => EcDigest::Sha512,
                    _ => EcDigest::Sha256,
                };
                Ok(CaSigner::Ecdsa(key, digest))
            }
            Id::RSA => Ok(CaSigner::Rsa(key)),
            Id::ED25519 => Ok(CaSigner::Ed25519(key)),
            id => Err(CaLoadError::UnsupportedKeyAlgorithm(id)),
        }
    }

    pub fn pkey(&self) -> &PKeyRef<Private> {
        match self {
            CaSigner::Ecdsa(key, _) => key,
            CaSigner::Rsa(key) => key,
            CaSigner::Ed25519(key) => key,
        }
    }

    pub fn algorithm(&self) -> &'static str {
        match self {
            CaSigner::Ecdsa(_, EcDigest::Sha256) => "ecdsa-with-SHA256",
            CaSigner::Ecdsa(_, EcDigest::Sha384) => "ecdsa-with-SHA384",
            CaSigner::Ecdsa(_, EcDigest::Sha512) => "ecdsa-with-SHA512",
            CaSigner::Rsa(_) => "sha256WithRSAEncryption",
            CaSigner::Ed25519(_) => "ED25519",
        }
    }

    fn digest(&self) -> MessageDigest {
        match self {
            CaSigner::Ecdsa(_, EcDigest::Sha256) => MessageDigest::sha256(),
            CaSigner::Ecdsa(_, EcDigest::Sha384) => MessageDigest::sha384(),
            CaSigner::Ecdsa(_, EcDigest::Sha512) => MessageDigest::sha512(),
            CaSigner::Rsa(_) => MessageDigest::sha256(),
            // EdDSA signs the message directly
            CaSigner::Ed25519(_) => MessageDigest::null(),
        }
    }

    pub(crate) fn sign(&self, builder: &mut X509Builder) -> Result<(), ErrorStack> {
        builder.sign(self.pkey(), self.digest())
    }
}

/// Parse a CA private key, the decoder is selected by the PEM block type.
pub fn parse_private_key(key_pem: &[u8]) -> Result<CaSigner, CaLoadError> {
    let block = pem::parse(key_pem).map_err(|e| CaLoadError::KeyDecodeError(e.to_string()))?;
    let der = block.contents();

    let key = match block.tag() {
        PEM_TAG_ED25519_PRIVATE_KEY | PEM_TAG_PKCS8_PRIVATE_KEY => {
            PKey::private_key_from_pkcs8(der).map_err(CaLoadError::InvalidKey)?
        }
        PEM_TAG_EC_PRIVATE_KEY => {
            let ec_key = EcKey::private_key_from_der(der).map_err(CaLoadError::InvalidKey)?;
            PKey::from_ec_key(ec_key).map_err(CaLoadError::InvalidKey)?
        }
        PEM_TAG_RSA_PRIVATE_KEY => {
            let rsa = Rsa::private_key_from_der(der).map_err(CaLoadError::InvalidKey)?;
            PKey::from_rsa(rsa).map_err(CaLoadError::InvalidKey)?
        }
        tag => return Err(CaLoadError::UnsupportedKeyType(tag.to_string())),
    };

    CaSigner::from_pkey(key)
}

/// Parse the CA certificate, exactly one `CERTIFICATE` block is accepted.
pub fn parse_certificate(cert_pem: &[u8]) -> Result<X509, CaLoadError> {
    let blocks = pem::parse_many(cert_pem).map_err(|e| CaLoadError::DecodeError(e.to_string()))?;
    let block = match blocks.as_slice() {
        [] => return Err(CaLoadError::DecodeError("no PEM block found".to_string())),
        [block] => block,
        _ => {
            return Err(CaLoadError::DecodeError(format!(
                "expected exactly one PEM block, found {}",
                blocks.len()
            )));
        }
    };
    if block.tag() != PEM_TAG_CERTIFICATE {
        return Err(CaLoadError::DecodeError(format!(
            "unexpected PEM block type {}",
            block.tag()
        )));
    }
    X509::from_der(block.contents()).map_err(CaLoadError::InvalidCertificate)
}

/// The immutable process wide CA.
pub struct CaIdentity {
    cert: X509,
    cert_pem: Vec<u8>,
    signer: CaSigner,
}

impl CaIdentity {
    pub fn load(cert_pem: &[u8], key_pem: &[u8]) -> Result<Self, CaLoadError> {
        let cert = parse_certificate(cert_pem)?;
        let signer = parse_private_key(key_pem)?;

        let cert_pubkey = cert
            .public_key()
            .map_err(CaLoadError::InvalidCertificate)?;
        if !cert_pubkey.public_eq(signer.pkey()) {
            return Err(CaLoadError::KeyMismatch);
        }

        Ok(CaIdentity {
            cert,
            cert_pem: cert_pem.to_vec(),
            signer,
        })
    }

    #[inline]
    pub fn certificate(&self) -> &X509Ref {
        &self.cert
    }

    /// The CA certificate exactly as it was supplied.
    #[inline]
    pub fn certificate_pem(&self) -> &[u8] {
        &self.cert_pem
    }

    #[inline]
    pub fn signer(&self) -> &CaSigner {
        &self.signer
    }
}

/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! CA loading and the server TLS identity.

use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use log::{debug, info, warn};
use openssl::pkey::PKey;
use openssl::x509::X509;

use g3_tls_cert::builder::{LeafCertBuilder, LeafSubject, ValidityPolicy};
use g3_tls_cert::ca::CaIdentity;

use crate::config::SignerConfig;

fn read_file(path: &Path, what: &str) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| anyhow!("failed to read {what} file {}: {e}", path.display()))
}

pub fn load_ca(config: &SignerConfig) -> anyhow::Result<CaIdentity> {
    let cert_pem = read_file(config.ca_cert_path(), "CA certificate")?;
    let key_pem = read_file(config.ca_key_path(), "CA private key")?;
    let ca = CaIdentity::load(&cert_pem, &key_pem).context(format!(
        "failed to load CA from {} and {}",
        config.ca_cert_path().display(),
        config.ca_key_path().display()
    ))?;
    info!(
        "loaded CA certificate from {} (signature algorithm {})",
        config.ca_cert_path().display(),
        ca.signer().algorithm()
    );
    Ok(ca)
}

/// The cluster internal DNS names of the service.
pub fn service_dns_names(name: &str, namespace: &str) -> Vec<String> {
    vec![
        name.to_string(),
        format!("{name}.{namespace}"),
        format!("{name}.{namespace}.svc"),
        format!("{name}.{namespace}.svc.cluster.local"),
    ]
}

/// Loopback first, then every configured address that parses as an IP literal.
pub fn collect_ip_addresses(server_ips: &[String]) -> Vec<IpAddr> {
    let mut ips = vec![IpAddr::V4(Ipv4Addr::LOCALHOST)];
    for s in server_ips {
        match IpAddr::from_str(s.trim()) {
            Ok(ip) => {
                if !ips.contains(&ip) {
                    ips.push(ip);
                }
            }
            Err(_) => warn!("skip invalid server IP address {s}"),
        }
    }
    ips
}

/// PEM encoded certificate chain and private key for the TLS listener.
pub struct ServerIdentity {
    cert_chain_pem: Vec<u8>,
    key_pem: Vec<u8>,
}

impl ServerIdentity {
    pub fn generate(
        ca: &CaIdentity,
        common_name: &str,
        dns_names: &[String],
        server_ips: &[String],
        validity: ValidityPolicy,
    ) -> anyhow::Result<Self> {
        let key = g3_tls_cert::builder::pkey::new_ec256()
            .context("failed to generate server private key")?;
        let ip_addresses = collect_ip_addresses(server_ips);
        debug!("server certificate SANs: dns={dns_names:?}, ip={ip_addresses:?}");

        let subject = LeafSubject {
            common_name,
            organization: None,
            dns_names,
            ip_addresses: &ip_addresses,
        };
        let builder = LeafCertBuilder::tls_server(validity);
        let leaf_pem = builder
            .issue_pem(ca, &key, &subject)
            .context("failed to issue server certificate")?;

        let mut cert_chain_pem = leaf_pem;
        cert_chain_pem.extend_from_slice(ca.certificate_pem());
        let key_pem = key
            .private_key_to_pem_pkcs8()
            .map_err(|e| anyhow!("failed to encode server private key: {e}"))?;

        let identity = ServerIdentity {
            cert_chain_pem,
            key_pem,
        };
        identity.check()?;
        Ok(identity)
    }

    pub fn from_config(config: &SignerConfig, ca: &CaIdentity) -> anyhow::Result<Self> {
        match config.tls_files() {
            Some(files) => {
                let identity =
                    ServerIdentity::load(&files.cert_path, &files.key_path).context(format!(
                        "failed to load server certificate from {} and {}",
                        files.cert_path.display(),
                        files.key_path.display()
                    ))?;
                info!(
                    "loaded server certificate from {}",
                    files.cert_path.display()
                );
                Ok(identity)
            }
            None => {
                let dns_names =
                    service_dns_names(config.service_name(), config.service_namespace());
                let identity = ServerIdentity::generate(
                    ca,
                    config.service_name(),
                    &dns_names,
                    config.server_ips(),
                    config.validity(),
                )?;
                info!("generated server certificate signed by the CA");
                Ok(identity)
            }
        }
    }

    /// Use a pre-provisioned certificate chain and private key.
    pub fn load(cert_path: &Path, key_path: &Path) -> anyhow::Result<Self> {
        let identity = ServerIdentity {
            cert_chain_pem: read_file(cert_path, "server certificate")?,
            key_pem: read_file(key_path, "server private key")?,
        };
        identity.check()?;
        Ok(identity)
    }

    fn check(&self) -> anyhow::Result<()> {
        let leaf = X509::from_pem(&self.cert_chain_pem)
            .map_err(|e| anyhow!("invalid server certificate: {e}"))?;
        let key = PKey::private_key_from_pem(&self.key_pem)
            .map_err(|e| anyhow!("invalid server private key: {e}"))?;
        let leaf_key = leaf
            .public_key()
            .map_err(|e| anyhow!("invalid server certificate public key: {e}"))?;
        if !leaf_key.public_eq(&key) {
            return Err(anyhow!(
                "server private key does not match the server certificate"
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn cert_chain_pem(&self) -> &[u8] {
        &self.cert_chain_pem
    }

    #[inline]
    pub fn key_pem(&self) -> &[u8] {
        &self.key_pem
    }

    pub fn to_tonic(&self) -> tonic::transport::Identity {
        tonic::transport::Identity::from_pem(&self.cert_chain_pem, &self.key_pem)
    }
}

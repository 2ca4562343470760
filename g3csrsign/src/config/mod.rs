/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Daemon configuration.
//!
//! Built-in defaults are overlaid by the optional YAML file, which is in turn
//! overlaid by command line options and environment variables. The result is
//! validated once into an immutable [`SignerConfig`].

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use thiserror::Error;

use g3_tls_cert::builder::ValidityPolicy;

use crate::auth::SharedToken;

mod yaml;

pub const DEFAULT_PORT: i64 = 50001;
pub const DEFAULT_LISTEN_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
pub const DEFAULT_CA_CERT_PATH: &str = "/etc/talos-ca/tls.crt";
pub const DEFAULT_CA_KEY_PATH: &str = "/etc/talos-ca/tls.key";
pub const DEFAULT_SERVICE_NAME: &str = "talos-csr-signer";
pub const DEFAULT_SERVICE_NAMESPACE: &str = "default";
pub const DEFAULT_CERT_VALIDITY_DAYS: i64 = 365;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing gRPC server port")]
    MissingPort,
    #[error("gRPC server port {0} is out of range")]
    PortOutOfRange(i64),
    #[error("invalid listen address {0}")]
    InvalidListenAddress(String),
    #[error("missing Talos token")]
    MissingToken,
    #[error("{0} path is required")]
    MissingPath(&'static str),
    #[error("tls certificate and tls private key should be set together")]
    IncompleteTlsPair,
    #[error("{0} should not be empty")]
    EmptyValue(&'static str),
    #[error("certificate validity {0} days is invalid")]
    InvalidValidity(i64),
}

/// Partially specified settings from one configuration source.
#[derive(Clone, Default)]
#[cfg_attr(test, derive(Debug))]
pub struct ConfigOverrides {
    pub port: Option<i64>,
    pub listen_address: Option<String>,
    pub ca_cert_path: Option<PathBuf>,
    pub ca_key_path: Option<PathBuf>,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
    pub token: Option<String>,
    pub server_ips: Option<Vec<String>>,
    pub service_name: Option<String>,
    pub service_namespace: Option<String>,
    pub cert_validity_days: Option<i64>,
}

macro_rules! overlay_fields {
    ($dst:expr, $src:expr, $($field:ident),+) => {
        $(
            if $src.$field.is_some() {
                $dst.$field = $src.$field;
            }
        )+
    };
}

impl ConfigOverrides {
    /// Fields set in `other` take precedence.
    pub fn overlay(&mut self, other: ConfigOverrides) {
        overlay_fields!(
            self,
            other,
            port,
            listen_address,
            ca_cert_path,
            ca_key_path,
            tls_cert_path,
            tls_key_path,
            token,
            server_ips,
            service_name,
            service_namespace,
            cert_validity_days
        );
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

pub struct SignerConfig {
    listen: SocketAddr,
    ca_cert_path: PathBuf,
    ca_key_path: PathBuf,
    tls_files: Option<TlsFiles>,
    token: SharedToken,
    server_ips: Vec<String>,
    service_name: String,
    service_namespace: String,
    validity: ValidityPolicy,
}

fn non_empty_path(
    path: Option<PathBuf>,
    default: &str,
    name: &'static str,
) -> Result<PathBuf, ConfigError> {
    let path = path.unwrap_or_else(|| PathBuf::from(default));
    if path.as_os_str().is_empty() {
        Err(ConfigError::MissingPath(name))
    } else {
        Ok(path)
    }
}

fn non_empty_string(
    value: Option<String>,
    default: &str,
    name: &'static str,
) -> Result<String, ConfigError> {
    let value = value.unwrap_or_else(|| default.to_string());
    if value.is_empty() {
        Err(ConfigError::EmptyValue(name))
    } else {
        Ok(value)
    }
}

impl SignerConfig {
    pub fn build(settings: ConfigOverrides) -> Result<Self, ConfigError> {
        let port = match settings.port.unwrap_or(DEFAULT_PORT) {
            0 => return Err(ConfigError::MissingPort),
            p => u16::try_from(p).map_err(|_| ConfigError::PortOutOfRange(p))?,
        };
        let listen_ip = match settings.listen_address {
            Some(s) => IpAddr::from_str(s.trim())
                .map_err(|_| ConfigError::InvalidListenAddress(s.clone()))?,
            None => DEFAULT_LISTEN_ADDRESS,
        };

        let token = settings
            .token
            .and_then(SharedToken::new)
            .ok_or(ConfigError::MissingToken)?;

        let ca_cert_path =
            non_empty_path(settings.ca_cert_path, DEFAULT_CA_CERT_PATH, "CA certificate")?;
        let ca_key_path =
            non_empty_path(settings.ca_key_path, DEFAULT_CA_KEY_PATH, "CA private key")?;

        let tls_cert_path = settings.tls_cert_path.filter(|p| !p.as_os_str().is_empty());
        let tls_key_path = settings.tls_key_path.filter(|p| !p.as_os_str().is_empty());
        let tls_files = match (tls_cert_path, tls_key_path) {
            (Some(cert_path), Some(key_path)) => Some(TlsFiles {
                cert_path,
                key_path,
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTlsPair),
        };

        let server_ips = settings
            .server_ips
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let service_name =
            non_empty_string(settings.service_name, DEFAULT_SERVICE_NAME, "service name")?;
        let service_namespace = non_empty_string(
            settings.service_namespace,
            DEFAULT_SERVICE_NAMESPACE,
            "service namespace",
        )?;

        let days = settings
            .cert_validity_days
            .unwrap_or(DEFAULT_CERT_VALIDITY_DAYS);
        let validity = match u32::try_from(days) {
            Ok(d) if d > 0 => ValidityPolicy::with_days(d),
            _ => return Err(ConfigError::InvalidValidity(days)),
        };

        Ok(SignerConfig {
            listen: SocketAddr::new(listen_ip, port),
            ca_cert_path,
            ca_key_path,
            tls_files,
            token,
            server_ips,
            service_name,
            service_namespace,
            validity,
        })
    }

    /// Load the optional config file and apply `overrides` on top of it.
    pub fn load(config_file: Option<&Path>, overrides: ConfigOverrides) -> anyhow::Result<Self> {
        let mut settings = match config_file {
            Some(path) => yaml::load_file(path)?,
            None => ConfigOverrides::default(),
        };
        settings.overlay(overrides);
        SignerConfig::build(settings).context("invalid config")
    }

    #[inline]
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen
    }

    #[inline]
    pub fn ca_cert_path(&self) -> &Path {
        &self.ca_cert_path
    }

    #[inline]
    pub fn ca_key_path(&self) -> &Path {
        &self.ca_key_path
    }

    /// Pre-provisioned server certificate files, the identity is bootstrapped if absent.
    #[inline]
    pub fn tls_files(&self) -> Option<&TlsFiles> {
        self.tls_files.as_ref()
    }

    #[inline]
    pub fn token(&self) -> &SharedToken {
        &self.token
    }

    #[inline]
    pub fn server_ips(&self) -> &[String] {
        &self.server_ips
    }

    #[inline]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    #[inline]
    pub fn service_namespace(&self) -> &str {
        &self.service_namespace
    }

    #[inline]
    pub fn validity(&self) -> ValidityPolicy {
        self.validity
    }
}

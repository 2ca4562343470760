/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

#![allow(dead_code)]

use std::net::IpAddr;

use chrono::{Days, Utc};
use openssl::asn1::{Asn1Object, Asn1OctetString, Asn1Time};
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{Id, PKey, Private};
use openssl::stack::Stack;
use openssl::x509::extension::{BasicConstraints, KeyUsage, SubjectAlternativeName, SubjectKeyIdentifier};
use openssl::x509::{X509, X509Extension, X509Name, X509ReqBuilder};

use g3_tls_cert::builder::pkey;

pub struct CaFixture {
    pub key: PKey<Private>,
    pub cert: X509,
    pub cert_pem: Vec<u8>,
}

fn sign_digest(key: &PKey<Private>) -> MessageDigest {
    match key.id() {
        Id::ED25519 => MessageDigest::null(),
        _ => MessageDigest::sha256(),
    }
}

pub fn build_ca(key: PKey<Private>, cn: &str) -> CaFixture {
    let mut name = X509Name::builder().unwrap();
    name.append_entry_by_nid(Nid::ORGANIZATIONNAME, "talos").unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    let name = name.build();

    let mut serial = BigNum::new().unwrap();
    serial.rand(128, MsbOption::MAYBE_ZERO, false).unwrap();
    let serial = serial.to_asn1_integer().unwrap();

    let now = Utc::now();
    let not_before = Asn1Time::from_unix((now - Days::new(1)).timestamp()).unwrap();
    let not_after = Asn1Time::from_unix((now + Days::new(3650)).timestamp()).unwrap();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&not_before).unwrap();
    builder.set_not_after(&not_after).unwrap();
    builder
        .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    builder
        .append_extension(
            KeyUsage::new()
                .critical()
                .key_cert_sign()
                .crl_sign()
                .build()
                .unwrap(),
        )
        .unwrap();
    let ski = SubjectKeyIdentifier::new()
        .build(&builder.x509v3_context(None, None))
        .unwrap();
    builder.append_extension(ski).unwrap();
    builder.sign(&key, sign_digest(&key)).unwrap();
    let cert = builder.build();
    let cert_pem = cert.to_pem().unwrap();

    CaFixture {
        key,
        cert,
        cert_pem,
    }
}

pub fn ec256_ca() -> CaFixture {
    build_ca(pkey::new_ec256().unwrap(), "Talos EC CA")
}

pub fn ec384_ca() -> CaFixture {
    build_ca(pkey::new_ec384().unwrap(), "Talos EC P-384 CA")
}

pub fn rsa_ca() -> CaFixture {
    build_ca(pkey::new_rsa(2048).unwrap(), "Talos RSA CA")
}

pub fn ed25519_ca() -> CaFixture {
    build_ca(pkey::new_ed25519().unwrap(), "Talos Ed25519 CA")
}

impl CaFixture {
    /// `EC PRIVATE KEY`
    pub fn ec_key_pem(&self) -> Vec<u8> {
        self.key.ec_key().unwrap().private_key_to_pem().unwrap()
    }

    /// `RSA PRIVATE KEY`
    pub fn rsa_key_pem(&self) -> Vec<u8> {
        self.key.rsa().unwrap().private_key_to_pem().unwrap()
    }

    /// `PRIVATE KEY`
    pub fn pkcs8_key_pem(&self) -> Vec<u8> {
        self.key.private_key_to_pem_pkcs8().unwrap()
    }

    /// `ED25519 PRIVATE KEY`, a PKCS#8 body with a custom label
    pub fn ed25519_key_pem(&self) -> Vec<u8> {
        let der = self.key.private_key_to_pkcs8().unwrap();
        pem::encode(&pem::Pem::new("ED25519 PRIVATE KEY", der)).into_bytes()
    }

    pub fn native_key_pem(&self) -> Vec<u8> {
        match self.key.id() {
            Id::EC => self.ec_key_pem(),
            Id::RSA => self.rsa_key_pem(),
            Id::ED25519 => self.ed25519_key_pem(),
            _ => self.pkcs8_key_pem(),
        }
    }
}

pub struct CsrFixture {
    pub key: PKey<Private>,
    pub der: Vec<u8>,
    pub pem: Vec<u8>,
}

pub fn build_csr(cn: &str, dns_names: &[&str], ips: &[IpAddr]) -> CsrFixture {
    let key = pkey::new_ec256().unwrap();
    build_csr_with_key(key, cn, dns_names, ips)
}

pub fn build_csr_with_key(
    key: PKey<Private>,
    cn: &str,
    dns_names: &[&str],
    ips: &[IpAddr],
) -> CsrFixture {
    let mut name = X509Name::builder().unwrap();
    if !cn.is_empty() {
        name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    }
    let name = name.build();

    let mut builder = X509ReqBuilder::new().unwrap();
    builder.set_version(0).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();

    if !dns_names.is_empty() || !ips.is_empty() {
        let mut san = SubjectAlternativeName::new();
        for dns in dns_names {
            san.dns(dns);
        }
        for ip in ips {
            san.ip(&ip.to_string());
        }
        let san = san.build(&builder.x509v3_context(None)).unwrap();
        let mut extensions = Stack::new().unwrap();
        extensions.push(san).unwrap();
        builder.add_extensions(&extensions).unwrap();
    }

    builder.sign(&key, sign_digest(&key)).unwrap();
    let req = builder.build();
    CsrFixture {
        key,
        der: req.to_der().unwrap(),
        pem: req.to_pem().unwrap(),
    }
}

/// A properly signed CSR carrying `san_der` as the SubjectAltName extension value.
pub fn build_csr_with_raw_san(cn: &str, san_der: &[u8]) -> CsrFixture {
    let key = pkey::new_ec256().unwrap();

    let mut name = X509Name::builder().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    let name = name.build();

    let mut builder = X509ReqBuilder::new().unwrap();
    builder.set_version(0).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();

    let oid = Asn1Object::from_str("2.5.29.17").unwrap();
    let value = Asn1OctetString::new_from_bytes(san_der).unwrap();
    let san = X509Extension::new_from_der(&oid, false, &value).unwrap();
    let mut extensions = Stack::new().unwrap();
    extensions.push(san).unwrap();
    builder.add_extensions(&extensions).unwrap();

    builder.sign(&key, sign_digest(&key)).unwrap();
    let req = builder.build();
    CsrFixture {
        key,
        der: req.to_der().unwrap(),
        pem: req.to_pem().unwrap(),
    }
}

/// Flip a byte inside the signed body of a CSR.
pub fn tamper_der(der: &[u8], needle: &[u8]) -> Vec<u8> {
    let pos = der
        .windows(needle.len())
        .position(|w| w == needle)
        .expect("needle not found in der");
    let mut out = der.to_vec();
    out[pos + needle.len() - 1] ^= 0x01;
    out
}

pub fn der_to_pem(der: &[u8]) -> Vec<u8> {
    pem::encode(&pem::Pem::new("CERTIFICATE REQUEST", der.to_vec())).into_bytes()
}

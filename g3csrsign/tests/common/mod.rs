/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

#![allow(dead_code)]

use std::net::IpAddr;
use std::sync::Arc;

use chrono::{Days, Utc};
use openssl::asn1::{Asn1Object, Asn1OctetString, Asn1Time};
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::stack::Stack;
use openssl::x509::extension::{BasicConstraints, KeyUsage, SubjectAlternativeName, SubjectKeyIdentifier};
use openssl::x509::{X509, X509Extension, X509Name, X509ReqBuilder};

use g3_tls_cert::builder::{ValidityPolicy, pkey};
use g3_tls_cert::ca::CaIdentity;

use g3csrsign::auth::SharedToken;
use g3csrsign::issue::IssuanceHandler;

pub const TOKEN: &str = "abcdef.0123456789abcdef";

pub struct TestCa {
    pub cert: X509,
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
}

impl TestCa {
    pub fn identity(&self) -> CaIdentity {
        CaIdentity::load(&self.cert_pem, &self.key_pem).unwrap()
    }

    pub fn handler(&self) -> IssuanceHandler {
        IssuanceHandler::new(
            Arc::new(self.identity()),
            SharedToken::new(TOKEN.to_string()).unwrap(),
            ValidityPolicy::default(),
        )
    }
}

/// A self signed P-256 CA, the same kind Talos generates.
pub fn new_ca() -> TestCa {
    let key = pkey::new_ec256().unwrap();

    let mut name = X509Name::builder().unwrap();
    name.append_entry_by_nid(Nid::ORGANIZATIONNAME, "talos").unwrap();
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
                .digital_signature()
                .key_cert_sign()
                .build()
                .unwrap(),
        )
        .unwrap();
    let ski = SubjectKeyIdentifier::new()
        .build(&builder.x509v3_context(None, None))
        .unwrap();
    builder.append_extension(ski).unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    let cert = builder.build();

    TestCa {
        cert_pem: cert.to_pem().unwrap(),
        key_pem: key.ec_key().unwrap().private_key_to_pem().unwrap(),
        cert,
    }
}

pub struct TestCsr {
    pub key: PKey<Private>,
    pub der: Vec<u8>,
    pub pem: Vec<u8>,
}

pub fn new_csr(cn: &str, dns_names: &[&str], ips: &[IpAddr]) -> TestCsr {
    let key = pkey::new_ec256().unwrap();

    let mut name = X509Name::builder().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
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
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    let req = builder.build();

    TestCsr {
        key,
        der: req.to_der().unwrap(),
        pem: req.to_pem().unwrap(),
    }
}

/// A properly signed CSR with `san_der` as the raw SubjectAltName value.
pub fn csr_with_raw_san(cn: &str, san_der: &[u8]) -> TestCsr {
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
    let mut extensions = Stack::new().unwrap();
    extensions
        .push(X509Extension::new_from_der(&oid, false, &value).unwrap())
        .unwrap();
    builder.add_extensions(&extensions).unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    let req = builder.build();

    TestCsr {
        key,
        der: req.to_der().unwrap(),
        pem: req.to_pem().unwrap(),
    }
}

pub fn apid_csr() -> TestCsr {
    new_csr(
        "apid",
        &["apid.local"],
        &["10.0.0.5".parse::<IpAddr>().unwrap()],
    )
}

/// Flip the last byte of `needle` inside the signed body.
pub fn tamper_pem(csr: &TestCsr, needle: &[u8]) -> Vec<u8> {
    let pos = csr
        .der
        .windows(needle.len())
        .position(|w| w == needle)
        .expect("needle not found in der");
    let mut der = csr.der.clone();
    der[pos + needle.len() - 1] ^= 0x01;
    pem::encode(&pem::Pem::new("CERTIFICATE REQUEST", der)).into_bytes()
}

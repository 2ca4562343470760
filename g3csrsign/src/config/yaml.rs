/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, YamlLoader, yaml};

use super::ConfigOverrides;

fn normalize_key(raw: &str) -> String {
    raw.to_lowercase().replace('-', "_")
}

fn foreach_kv<F>(table: &yaml::Hash, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&str, &Yaml) -> anyhow::Result<()>,
{
    for (k, v) in table.iter() {
        if let Yaml::String(key) = k {
            f(key, v).context(format!("failed to parse value of key {key}"))?;
        } else {
            return Err(anyhow!("key in hash should be string"));
        }
    }
    Ok(())
}

fn as_i64(v: &Yaml) -> anyhow::Result<i64> {
    match v {
        Yaml::String(s) => Ok(i64::from_str(s)?),
        Yaml::Integer(i) => Ok(*i),
        _ => Err(anyhow!(
            "yaml value type for 'i64' should be 'string' or 'integer'"
        )),
    }
}

fn as_string(v: &Yaml) -> anyhow::Result<String> {
    match v {
        Yaml::String(s) => Ok(s.to_string()),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Real(s) => Ok(s.to_string()),
        _ => Err(anyhow!(
            "yaml value type for string should be 'string' / 'integer' / 'real'"
        )),
    }
}

fn as_list<T, F>(v: &Yaml, convert: F) -> anyhow::Result<Vec<T>>
where
    F: Fn(&Yaml) -> anyhow::Result<T>,
{
    let mut vec = Vec::new();
    match v {
        Yaml::Array(seq) => {
            for (i, v) in seq.iter().enumerate() {
                let node = convert(v).context(format!("invalid value for list element #{i}"))?;
                vec.push(node);
            }
        }
        _ => {
            let node = convert(v).context("invalid single value for the list")?;
            vec.push(node);
        }
    }
    Ok(vec)
}

/// Relative paths are resolved against `lookup_dir`, the file need not exist yet.
fn as_file_path(v: &Yaml, lookup_dir: &Path) -> anyhow::Result<PathBuf> {
    if let Yaml::String(path) = v {
        let path = PathBuf::from_str(path).map_err(|e| anyhow!("invalid path: {e:?}"))?;
        if path.is_absolute() {
            Ok(path)
        } else {
            Ok(lookup_dir.join(path))
        }
    } else {
        Err(anyhow!("yaml value type for path should be string"))
    }
}

pub(super) fn load_doc(
    map: &yaml::Hash,
    lookup_dir: &Path,
    settings: &mut ConfigOverrides,
) -> anyhow::Result<()> {
    foreach_kv(map, |k, v| match normalize_key(k).as_str() {
        "port" => {
            settings.port = Some(as_i64(v)?);
            Ok(())
        }
        "listen_address" => {
            settings.listen_address = Some(as_string(v)?);
            Ok(())
        }
        "ca_certificate" => {
            settings.ca_cert_path = Some(as_file_path(v, lookup_dir)?);
            Ok(())
        }
        "ca_private_key" => {
            settings.ca_key_path = Some(as_file_path(v, lookup_dir)?);
            Ok(())
        }
        "tls_certificate" => {
            settings.tls_cert_path = Some(as_file_path(v, lookup_dir)?);
            Ok(())
        }
        "tls_private_key" => {
            settings.tls_key_path = Some(as_file_path(v, lookup_dir)?);
            Ok(())
        }
        "token" => {
            settings.token = Some(as_string(v)?);
            Ok(())
        }
        "server_ips" => {
            settings.server_ips = Some(as_list(v, as_string)?);
            Ok(())
        }
        "service_name" => {
            settings.service_name = Some(as_string(v)?);
            Ok(())
        }
        "service_namespace" => {
            settings.service_namespace = Some(as_string(v)?);
            Ok(())
        }
        "cert_validity_days" => {
            settings.cert_validity_days = Some(as_i64(v)?);
            Ok(())
        }
        _ => Err(anyhow!("invalid key {k}")),
    })
}

pub(super) fn load_str(content: &str, lookup_dir: &Path) -> anyhow::Result<ConfigOverrides> {
    let docs =
        YamlLoader::load_from_str(content).map_err(|e| anyhow!("invalid yaml content: {e}"))?;

    let mut settings = ConfigOverrides::default();
    // allow multiple docs, and treat them as the same
    for (i, doc) in docs.iter().enumerate() {
        match doc {
            Yaml::Hash(map) => load_doc(map, lookup_dir, &mut settings)
                .context(format!("failed to load yaml doc {i}"))?,
            Yaml::Null => {}
            _ => return Err(anyhow!("yaml doc {i} root should be hash")),
        }
    }
    Ok(settings)
}

pub(super) fn load_file(path: &Path) -> anyhow::Result<ConfigOverrides> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {e}", path.display()))?;
    let lookup_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    load_str(&content, &lookup_dir).context(format!("invalid config file {}", path.display()))
}

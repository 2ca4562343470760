/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint, value_parser};

use crate::config::ConfigOverrides;

const ARGS_VERSION: &str = "version";
const ARGS_VERBOSE: &str = "verbose";
const ARGS_TEST_CONFIG: &str = "test-config";
const ARGS_CONFIG_FILE: &str = "config-file";
const ARGS_PORT: &str = "port";
const ARGS_LISTEN_ADDRESS: &str = "listen-address";
const ARGS_CA_CERT_PATH: &str = "ca-cert-path";
const ARGS_CA_KEY_PATH: &str = "ca-key-path";
const ARGS_TLS_CERT_PATH: &str = "tls-cert-path";
const ARGS_TLS_KEY_PATH: &str = "tls-key-path";
const ARGS_TALOS_TOKEN: &str = "talos-token";
const ARGS_SERVER_IPS: &str = "server-ips";
const ARGS_SERVICE_NAME: &str = "service-name";
const ARGS_SERVICE_NAMESPACE: &str = "service-namespace";
const ARGS_CERT_VALIDITY_DAYS: &str = "cert-validity-days";

#[derive(Default)]
pub struct ProcArgs {
    pub verbose_level: u8,
    pub test_config: bool,
    pub config_file: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

fn path_arg(id: &'static str, help: &'static str, env: &'static str) -> Arg {
    Arg::new(id)
        .help(help)
        .num_args(1)
        .value_hint(ValueHint::FilePath)
        .value_parser(value_parser!(PathBuf))
        .env(env)
        .long(id)
}

fn string_arg(id: &'static str, help: &'static str, env: &'static str) -> Arg {
    Arg::new(id).help(help).num_args(1).env(env).long(id)
}

pub fn build_cli_args() -> Command {
    Command::new(crate::build::PKG_NAME)
        .disable_version_flag(true)
        .arg(
            Arg::new(ARGS_VERBOSE)
                .help("Show verbose output")
                .num_args(0)
                .action(ArgAction::Count)
                .short('v')
                .long("verbose"),
        )
        .arg(
            Arg::new(ARGS_VERSION)
                .help("Show version")
                .action(ArgAction::SetTrue)
                .short('V')
                .long("version"),
        )
        .arg(
            Arg::new(ARGS_TEST_CONFIG)
                .help("Test the format of config file and exit")
                .action(ArgAction::SetTrue)
                .short('t')
                .long("test-config"),
        )
        .arg(
            Arg::new(ARGS_CONFIG_FILE)
                .help("Config file path")
                .num_args(1)
                .value_name("CONFIG FILE")
                .value_hint(ValueHint::FilePath)
                .value_parser(value_parser!(PathBuf))
                .short('c')
                .long("config-file"),
        )
        .arg(
            Arg::new(ARGS_PORT)
                .help("gRPC listen port")
                .num_args(1)
                .value_name("PORT")
                .value_parser(value_parser!(i64))
                .env("PORT")
                .long(ARGS_PORT),
        )
        .arg(string_arg(
            ARGS_LISTEN_ADDRESS,
            "gRPC listen address",
            "LISTEN_ADDRESS",
        ))
        .arg(path_arg(
            ARGS_CA_CERT_PATH,
            "CA certificate PEM file",
            "CA_CERT_PATH",
        ))
        .arg(path_arg(
            ARGS_CA_KEY_PATH,
            "CA private key PEM file",
            "CA_KEY_PATH",
        ))
        .arg(path_arg(
            ARGS_TLS_CERT_PATH,
            "Pre-provisioned server certificate PEM file",
            "TLS_CERT_PATH",
        ))
        .arg(path_arg(
            ARGS_TLS_KEY_PATH,
            "Pre-provisioned server private key PEM file",
            "TLS_KEY_PATH",
        ))
        .arg(string_arg(ARGS_TALOS_TOKEN, "Talos machine token", "TALOS_TOKEN").hide_env_values(true))
        .arg(
            Arg::new(ARGS_SERVER_IPS)
                .help("Comma separated IP addresses for the server certificate")
                .num_args(1)
                .value_delimiter(',')
                .env("SERVER_IPS")
                .long(ARGS_SERVER_IPS),
        )
        .arg(string_arg(
            ARGS_SERVICE_NAME,
            "Service name used in the server certificate DNS names",
            "SERVICE_NAME",
        ))
        .arg(string_arg(
            ARGS_SERVICE_NAMESPACE,
            "Service namespace used in the server certificate DNS names",
            "SERVICE_NAMESPACE",
        ))
        .arg(
            Arg::new(ARGS_CERT_VALIDITY_DAYS)
                .help("Validity of issued certificates in days")
                .num_args(1)
                .value_parser(value_parser!(i64))
                .env("CERT_VALIDITY_DAYS")
                .long(ARGS_CERT_VALIDITY_DAYS),
        )
}

fn overrides_from_matches(args: &ArgMatches) -> ConfigOverrides {
    ConfigOverrides {
        port: args.get_one::<i64>(ARGS_PORT).copied(),
        listen_address: args.get_one::<String>(ARGS_LISTEN_ADDRESS).cloned(),
        ca_cert_path: args.get_one::<PathBuf>(ARGS_CA_CERT_PATH).cloned(),
        ca_key_path: args.get_one::<PathBuf>(ARGS_CA_KEY_PATH).cloned(),
        tls_cert_path: args.get_one::<PathBuf>(ARGS_TLS_CERT_PATH).cloned(),
        tls_key_path: args.get_one::<PathBuf>(ARGS_TLS_KEY_PATH).cloned(),
        token: args.get_one::<String>(ARGS_TALOS_TOKEN).cloned(),
        server_ips: args
            .get_many::<String>(ARGS_SERVER_IPS)
            .map(|ips| ips.cloned().collect()),
        service_name: args.get_one::<String>(ARGS_SERVICE_NAME).cloned(),
        service_namespace: args.get_one::<String>(ARGS_SERVICE_NAMESPACE).cloned(),
        cert_validity_days: args.get_one::<i64>(ARGS_CERT_VALIDITY_DAYS).copied(),
    }
}

fn proc_args_from_matches(args: &ArgMatches) -> Option<ProcArgs> {
    let mut proc_args = ProcArgs::default();

    if let Some(verbose_level) = args.get_one::<u8>(ARGS_VERBOSE) {
        proc_args.verbose_level = *verbose_level;
    }

    if args.get_flag(ARGS_VERSION) {
        crate::build::print_version(proc_args.verbose_level);
        return None;
    }

    proc_args.test_config = args.get_flag(ARGS_TEST_CONFIG);
    proc_args.config_file = args.get_one::<PathBuf>(ARGS_CONFIG_FILE).cloned();
    proc_args.overrides = overrides_from_matches(args);
    Some(proc_args)
}

/// Invalid arguments make clap print usage and exit, `None` means nothing left to do.
pub fn parse_clap() -> Option<ProcArgs> {
    let args_parser = build_cli_args();
    let args = args_parser.get_matches();
    proc_args_from_matches(&args)
}

/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

#[cfg(feature = "yaml")]
use std::path::Path;
use std::path::PathBuf;

#[cfg(feature = "yaml")]
use anyhow::anyhow;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

use ares_facade::engine::AnyEngineConfig;
use ares_facade::engine::hosts::HostsEngineConfig;
use ares_facade::ResolverConfig;

const GLOBAL_ARG_VERBOSE: &str = "verbose";
const GLOBAL_ARG_STATS: &str = "stats";
const GLOBAL_ARG_HOSTS_FILE: &str = "hosts-file";
const GLOBAL_ARG_SERVICES_FILE: &str = "services-file";
const GLOBAL_ARG_LENIENT_SERVICE: &str = "lenient-service";
#[cfg(feature = "yaml")]
const GLOBAL_ARG_CONFIG: &str = "config";
#[cfg(feature = "c-ares")]
const GLOBAL_ARG_C_ARES: &str = "c-ares";
#[cfg(feature = "c-ares")]
const GLOBAL_ARG_SERVER: &str = "server";

const DEFAULT_HOSTS_FILE: &str = "/etc/hosts";
const DEFAULT_SERVICES_FILE: &str = "/etc/services";

pub(crate) struct ProcArgs {
    pub(crate) verbose_level: u8,
    pub(crate) print_stats: bool,
    pub(crate) resolver_config: ResolverConfig,
}

pub(crate) fn append_global_args(cmd: Command) -> Command {
    let cmd = cmd
        .arg(
            Arg::new(GLOBAL_ARG_VERBOSE)
                .help("Show verbose output")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_STATS)
                .help("Print query stats after the command")
                .long(GLOBAL_ARG_STATS)
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_HOSTS_FILE)
                .help("Hosts file served by the built-in engine")
                .long(GLOBAL_ARG_HOSTS_FILE)
                .num_args(1)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .default_value(DEFAULT_HOSTS_FILE),
        )
        .arg(
            Arg::new(GLOBAL_ARG_SERVICES_FILE)
                .help("Services file served by the built-in engine")
                .long(GLOBAL_ARG_SERVICES_FILE)
                .num_args(1)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .default_value(DEFAULT_SERVICES_FILE),
        )
        .arg(
            Arg::new(GLOBAL_ARG_LENIENT_SERVICE)
                .help("Report port 0 instead of failing when getnameinfo finds no service name")
                .long(GLOBAL_ARG_LENIENT_SERVICE)
                .action(ArgAction::SetTrue),
        );

    #[cfg(feature = "yaml")]
    let cmd = cmd.arg(
        Arg::new(GLOBAL_ARG_CONFIG)
            .help("Load the resolver config from a yaml file")
            .short('c')
            .long(GLOBAL_ARG_CONFIG)
            .num_args(1)
            .value_name("CONFIG FILE")
            .value_parser(value_parser!(PathBuf))
            .conflicts_with_all([GLOBAL_ARG_HOSTS_FILE, GLOBAL_ARG_SERVICES_FILE]),
    );

    #[cfg(feature = "c-ares")]
    let cmd = cmd
        .arg(
            Arg::new(GLOBAL_ARG_C_ARES)
                .help("Resolve with c-ares instead of the hosts file")
                .long(GLOBAL_ARG_C_ARES)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(GLOBAL_ARG_SERVER)
                .help("DNS server for c-ares, may be repeated")
                .long(GLOBAL_ARG_SERVER)
                .num_args(1)
                .value_name("ADDR")
                .action(ArgAction::Append)
                .requires(GLOBAL_ARG_C_ARES),
        );

    cmd
}

pub(crate) fn parse_clap(args: &ArgMatches) -> anyhow::Result<ProcArgs> {
    let verbose_level = args.get_count(GLOBAL_ARG_VERBOSE);
    let print_stats = args.get_flag(GLOBAL_ARG_STATS);

    #[cfg(feature = "yaml")]
    if let Some(path) = args.get_one::<PathBuf>(GLOBAL_ARG_CONFIG) {
        let resolver_config = load_config_file(path)?;
        return Ok(ProcArgs {
            verbose_level,
            print_stats,
            resolver_config,
        });
    }

    let engine = build_engine_config(args)?;
    let mut resolver_config = ResolverConfig::new("ares-lookup", engine);
    if args.get_flag(GLOBAL_ARG_LENIENT_SERVICE) {
        resolver_config.runtime.strict_service_name = false;
    }
    Ok(ProcArgs {
        verbose_level,
        print_stats,
        resolver_config,
    })
}

fn build_engine_config(args: &ArgMatches) -> anyhow::Result<AnyEngineConfig> {
    #[cfg(feature = "c-ares")]
    if args.get_flag(GLOBAL_ARG_C_ARES) {
        let mut config = ares_facade::engine::c_ares::CAresEngineConfig::default();
        if let Some(servers) = args.get_many::<String>(GLOBAL_ARG_SERVER) {
            for s in servers {
                config.parse_server_str(s)?;
            }
        }
        config.load_env()?;
        return Ok(AnyEngineConfig::CAres(config));
    }

    let mut config = HostsEngineConfig::default();
    if let Some(path) = args.get_one::<PathBuf>(GLOBAL_ARG_HOSTS_FILE) {
        config.load_hosts_file(path)?;
    }
    if let Some(path) = args.get_one::<PathBuf>(GLOBAL_ARG_SERVICES_FILE) {
        // not every system ships a services file
        if path.exists() {
            config.load_services_file(path)?;
        }
    }
    Ok(AnyEngineConfig::Hosts(config))
}

#[cfg(feature = "yaml")]
fn load_config_file(path: &Path) -> anyhow::Result<ResolverConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {e}", path.display()))?;
    let docs = yaml_rust::YamlLoader::load_from_str(&content)
        .map_err(|e| anyhow!("invalid yaml file {}: {e}", path.display()))?;
    let doc = docs
        .first()
        .ok_or_else(|| anyhow!("no yaml document found in {}", path.display()))?;
    ResolverConfig::parse_yaml(doc)
}

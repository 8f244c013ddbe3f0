/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, SocketAddr};

use clap::{Arg, ArgAction, ArgMatches, value_parser};

use ares_facade::{
    AF_INET, AF_INET6, AF_UNSPEC, AI_NUMERICHOST, AI_PASSIVE, AddrInfo, HostEntry,
    IPPROTO_TCP, IPPROTO_UDP, NI_DGRAM, NI_NAMEREQD, NI_NOFQDN, NI_NUMERICHOST, NI_NUMERICSERV,
    Resolver, SOCK_DGRAM, SOCK_RAW, SOCK_STREAM, SockAddrArg,
};

pub(crate) const COMMAND_GETHOSTBYNAME: &str = "gethostbyname";
pub(crate) const COMMAND_GETHOSTBYNAME_EX: &str = "gethostbyname-ex";
pub(crate) const COMMAND_GETHOSTBYADDR: &str = "gethostbyaddr";
pub(crate) const COMMAND_GETADDRINFO: &str = "getaddrinfo";
pub(crate) const COMMAND_GETNAMEINFO: &str = "getnameinfo";

const COMMAND_ARG_HOST: &str = "host";
const COMMAND_ARG_ADDRESS: &str = "address";
const COMMAND_ARG_PORT: &str = "port";
const COMMAND_ARG_FAMILY: &str = "family";
const COMMAND_ARG_SOCKTYPE: &str = "socktype";
const COMMAND_ARG_PROTOCOL: &str = "protocol";
const COMMAND_ARG_PASSIVE: &str = "passive";
const COMMAND_ARG_NUMERIC_HOST: &str = "numeric-host";
const COMMAND_ARG_NUMERIC_SERV: &str = "numeric-serv";
const COMMAND_ARG_NAME_REQUIRED: &str = "name-required";
const COMMAND_ARG_NO_FQDN: &str = "no-fqdn";
const COMMAND_ARG_DGRAM: &str = "dgram";
const COMMAND_ARG_FLOWINFO: &str = "flowinfo";
const COMMAND_ARG_SCOPE_ID: &str = "scope-id";

pub(crate) mod commands {
    use super::*;
    use clap::Command;

    fn family_arg(default: &'static str) -> Arg {
        Arg::new(COMMAND_ARG_FAMILY)
            .help("Address family")
            .short('f')
            .long(COMMAND_ARG_FAMILY)
            .num_args(1)
            .value_parser(["any", "inet", "inet6"])
            .default_value(default)
    }

    fn flag_arg(id: &'static str, help: &'static str) -> Arg {
        Arg::new(id)
            .help(help)
            .long(id)
            .action(ArgAction::SetTrue)
    }

    pub(crate) fn gethostbyname() -> Command {
        Command::new(COMMAND_GETHOSTBYNAME)
            .about("Resolve a host name to one address")
            .arg(Arg::new(COMMAND_ARG_HOST).required(true).num_args(1))
            .arg(family_arg("inet"))
    }

    pub(crate) fn gethostbyname_ex() -> Command {
        Command::new(COMMAND_GETHOSTBYNAME_EX)
            .about("Resolve a host name to its canonical name, aliases and addresses")
            .arg(Arg::new(COMMAND_ARG_HOST).required(true).num_args(1))
            .arg(family_arg("inet"))
    }

    pub(crate) fn gethostbyaddr() -> Command {
        Command::new(COMMAND_GETHOSTBYADDR)
            .about("Reverse resolve an address, or the first address of a host name")
            .arg(Arg::new(COMMAND_ARG_ADDRESS).required(true).num_args(1))
    }

    pub(crate) fn getaddrinfo() -> Command {
        Command::new(COMMAND_GETADDRINFO)
            .about("Resolve a host and service to socket addresses")
            .arg(Arg::new(COMMAND_ARG_HOST).required(true).num_args(1))
            .arg(Arg::new(COMMAND_ARG_PORT).num_args(1))
            .arg(family_arg("any"))
            .arg(
                Arg::new(COMMAND_ARG_SOCKTYPE)
                    .help("Socket type")
                    .short('t')
                    .long(COMMAND_ARG_SOCKTYPE)
                    .num_args(1)
                    .value_parser(["stream", "dgram", "raw"]),
            )
            .arg(
                Arg::new(COMMAND_ARG_PROTOCOL)
                    .help("Protocol")
                    .short('p')
                    .long(COMMAND_ARG_PROTOCOL)
                    .num_args(1)
                    .value_parser(["tcp", "udp"]),
            )
            .arg(flag_arg(COMMAND_ARG_PASSIVE, "Set AI_PASSIVE"))
            .arg(flag_arg(COMMAND_ARG_NUMERIC_HOST, "Set AI_NUMERICHOST"))
    }

    pub(crate) fn getnameinfo() -> Command {
        Command::new(COMMAND_GETNAMEINFO)
            .about("Resolve a socket address to a host name and service name")
            .arg(Arg::new(COMMAND_ARG_HOST).required(true).num_args(1))
            .arg(
                Arg::new(COMMAND_ARG_PORT)
                    .required(true)
                    .num_args(1)
                    .value_parser(value_parser!(u16)),
            )
            .arg(
                Arg::new(COMMAND_ARG_FLOWINFO)
                    .help("IPv6 flow info, passes a 4 tuple sockaddr")
                    .long(COMMAND_ARG_FLOWINFO)
                    .num_args(1)
                    .value_parser(value_parser!(u32)),
            )
            .arg(
                Arg::new(COMMAND_ARG_SCOPE_ID)
                    .help("IPv6 scope id, passes a 4 tuple sockaddr")
                    .long(COMMAND_ARG_SCOPE_ID)
                    .num_args(1)
                    .value_parser(value_parser!(u32)),
            )
            .arg(flag_arg(COMMAND_ARG_NUMERIC_HOST, "Set NI_NUMERICHOST"))
            .arg(flag_arg(COMMAND_ARG_NUMERIC_SERV, "Set NI_NUMERICSERV"))
            .arg(flag_arg(COMMAND_ARG_NAME_REQUIRED, "Set NI_NAMEREQD"))
            .arg(flag_arg(COMMAND_ARG_NO_FQDN, "Set NI_NOFQDN"))
            .arg(flag_arg(COMMAND_ARG_DGRAM, "Set NI_DGRAM"))
    }
}

fn get_family(args: &ArgMatches) -> i32 {
    match args.get_one::<String>(COMMAND_ARG_FAMILY).map(|s| s.as_str()) {
        Some("inet") => AF_INET,
        Some("inet6") => AF_INET6,
        _ => AF_UNSPEC,
    }
}

fn get_host(args: &ArgMatches, id: &str) -> anyhow::Result<String> {
    args.get_one::<String>(id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("no {id} argument set"))
}

fn collect_flags(args: &ArgMatches, table: &[(&str, i32)]) -> i32 {
    table
        .iter()
        .filter(|(id, _)| args.get_flag(id))
        .fold(0, |flags, (_, f)| flags | f)
}

fn print_host_entry(entry: &HostEntry) {
    println!("name: {}", entry.name);
    for alias in &entry.aliases {
        println!("alias: {alias}");
    }
    for ip in &entry.addresses {
        println!("address: {ip}");
    }
}

fn family_name(family: i32) -> &'static str {
    match family {
        AF_INET => "inet",
        AF_INET6 => "inet6",
        _ => "unspec",
    }
}

fn socktype_name(socktype: i32) -> &'static str {
    match socktype {
        SOCK_STREAM => "stream",
        SOCK_DGRAM => "dgram",
        SOCK_RAW => "raw",
        _ => "unknown",
    }
}

fn print_addr_info(ai: &AddrInfo) {
    let mut line = format!(
        "{} {} {} {}",
        family_name(ai.family),
        socktype_name(ai.socktype),
        ai.protocol,
        ai.sockaddr
    );
    if !ai.canonname.is_empty() {
        line.push(' ');
        line.push_str(&ai.canonname);
    }
    println!("{line}");
}

pub(crate) async fn gethostbyname(resolver: &Resolver, args: &ArgMatches) -> anyhow::Result<()> {
    let host = get_host(args, COMMAND_ARG_HOST)?;
    let ip = resolver.gethostbyname(host, get_family(args)).await?;
    println!("{ip}");
    Ok(())
}

pub(crate) async fn gethostbyname_ex(
    resolver: &Resolver,
    args: &ArgMatches,
) -> anyhow::Result<()> {
    let host = get_host(args, COMMAND_ARG_HOST)?;
    let entry = resolver.gethostbyname_ex(host, get_family(args)).await?;
    print_host_entry(&entry);
    Ok(())
}

pub(crate) async fn gethostbyaddr(resolver: &Resolver, args: &ArgMatches) -> anyhow::Result<()> {
    let address = get_host(args, COMMAND_ARG_ADDRESS)?;
    let entry = resolver.gethostbyaddr(address).await?;
    print_host_entry(&entry);
    Ok(())
}

pub(crate) async fn getaddrinfo(resolver: &Resolver, args: &ArgMatches) -> anyhow::Result<()> {
    let host = get_host(args, COMMAND_ARG_HOST)?;
    let port = args.get_one::<String>(COMMAND_ARG_PORT).cloned();
    let socktype = match args.get_one::<String>(COMMAND_ARG_SOCKTYPE).map(|s| s.as_str()) {
        Some("stream") => SOCK_STREAM,
        Some("dgram") => SOCK_DGRAM,
        Some("raw") => SOCK_RAW,
        _ => 0,
    };
    let proto = match args.get_one::<String>(COMMAND_ARG_PROTOCOL).map(|s| s.as_str()) {
        Some("tcp") => IPPROTO_TCP,
        Some("udp") => IPPROTO_UDP,
        _ => 0,
    };
    let flags = collect_flags(
        args,
        &[
            (COMMAND_ARG_PASSIVE, AI_PASSIVE),
            (COMMAND_ARG_NUMERIC_HOST, AI_NUMERICHOST),
        ],
    );

    let results = resolver
        .getaddrinfo(host, port, get_family(args), socktype, proto, flags)
        .await?;
    for ai in &results {
        print_addr_info(ai);
    }
    Ok(())
}

fn build_sockaddr(args: &ArgMatches) -> anyhow::Result<SockAddrArg> {
    let host = get_host(args, COMMAND_ARG_HOST)?;
    let port = args.get_one::<u16>(COMMAND_ARG_PORT).copied().unwrap_or(0);
    let flowinfo = args.get_one::<u32>(COMMAND_ARG_FLOWINFO).copied();
    let scope_id = args.get_one::<u32>(COMMAND_ARG_SCOPE_ID).copied();

    if flowinfo.is_none() && scope_id.is_none() {
        if let Ok(IpAddr::V6(ip)) = host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(IpAddr::V6(ip), port).into());
        }
        return Ok(SockAddrArg::Pair {
            host: host.into(),
            port,
        });
    }
    Ok(SockAddrArg::Quad {
        host: host.into(),
        port,
        flowinfo: flowinfo.unwrap_or(0),
        scope_id: scope_id.unwrap_or(0),
    })
}

pub(crate) async fn getnameinfo(resolver: &Resolver, args: &ArgMatches) -> anyhow::Result<()> {
    let sockaddr = build_sockaddr(args)?;
    let flags = collect_flags(
        args,
        &[
            (COMMAND_ARG_NUMERIC_HOST, NI_NUMERICHOST),
            (COMMAND_ARG_NUMERIC_SERV, NI_NUMERICSERV),
            (COMMAND_ARG_NAME_REQUIRED, NI_NAMEREQD),
            (COMMAND_ARG_NO_FQDN, NI_NOFQDN),
            (COMMAND_ARG_DGRAM, NI_DGRAM),
        ],
    );

    let (node, service) = resolver.getnameinfo(&sockaddr, flags).await?;
    println!("{node} {service}");
    Ok(())
}

/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};
use clap::Command;

use ares_facade::ResolverBuilder;

mod log;
mod opts;
mod query;

fn build_cli_args() -> Command {
    opts::append_global_args(Command::new(env!("CARGO_PKG_NAME")))
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .subcommand(query::commands::gethostbyname())
        .subcommand(query::commands::gethostbyname_ex())
        .subcommand(query::commands::gethostbyaddr())
        .subcommand(query::commands::getaddrinfo())
        .subcommand(query::commands::getnameinfo())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = build_cli_args().get_matches();

    let proc_args = opts::parse_clap(&args)?;
    let _log_guard = log::setup(&proc_args).context("failed to setup logger")?;

    let print_stats = proc_args.print_stats;
    let resolver = ResolverBuilder::new(proc_args.resolver_config)
        .build()
        .context("failed to start resolver")?;

    let (subcommand, args) = args
        .subcommand()
        .ok_or_else(|| anyhow!("no subcommand found"))?;
    let r = match subcommand {
        query::COMMAND_GETHOSTBYNAME => query::gethostbyname(&resolver, args).await,
        query::COMMAND_GETHOSTBYNAME_EX => query::gethostbyname_ex(&resolver, args).await,
        query::COMMAND_GETHOSTBYADDR => query::gethostbyaddr(&resolver, args).await,
        query::COMMAND_GETADDRINFO => query::getaddrinfo(&resolver, args).await,
        query::COMMAND_GETNAMEINFO => query::getnameinfo(&resolver, args).await,
        _ => Err(anyhow!("unsupported command {subcommand}")),
    };

    if print_stats {
        println!("{:#?}", resolver.get_stats().snapshot());
    }
    resolver.close();
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_args() {
        build_cli_args().debug_assert();
    }
}

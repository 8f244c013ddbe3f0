/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use anyhow::{Context, anyhow};

use super::CAresEngine;
use crate::engine::BoxResolveEngine;

#[cfg(feature = "yaml")]
mod yaml;

const DNS_DEFAULT_PORT: u16 = 53;

const ENV_SERVERS: &str = "ARES_SERVERS";
const ENV_TIMEOUT: &str = "ARES_TIMEOUT";
const ENV_TRIES: &str = "ARES_TRIES";
const ENV_NDOTS: &str = "ARES_NDOTS";
const ENV_UDP_PORT: &str = "ARES_UDP_PORT";
const ENV_TCP_PORT: &str = "ARES_TCP_PORT";
const ENV_ROTATE: &str = "ARES_ROTATE";

/// Options for c-ares engine sessions. Unset options keep the c-ares
/// defaults, which come from `/etc/resolv.conf`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CAresEngineConfig {
    servers: Vec<SocketAddr>,
    timeout: Option<u32>,
    tries: Option<u32>,
    ndots: Option<u32>,
    udp_port: Option<u16>,
    tcp_port: Option<u16>,
    rotate: Option<bool>,
}

impl CAresEngineConfig {
    pub fn add_server(&mut self, addr: SocketAddr) {
        self.servers.push(addr);
    }

    pub fn get_servers(&self) -> Vec<SocketAddr> {
        self.servers.clone()
    }

    /// Add servers from a comma or whitespace separated list of `ip` or
    /// `ip:port` items.
    pub fn parse_server_str(&mut self, s: &str) -> anyhow::Result<()> {
        for item in s.split(|c: char| c == ',' || c.is_ascii_whitespace()) {
            if item.is_empty() {
                continue;
            }
            let addr = match IpAddr::from_str(item) {
                Ok(ip) => SocketAddr::new(ip, DNS_DEFAULT_PORT),
                Err(_) => SocketAddr::from_str(item)
                    .map_err(|e| anyhow!("invalid server address {item}: {e}"))?,
            };
            self.add_server(addr);
        }
        Ok(())
    }

    /// Per try timeout in milliseconds.
    pub fn set_timeout(&mut self, timeout: u32) {
        self.timeout = Some(timeout);
    }

    pub fn set_tries(&mut self, tries: u32) {
        self.tries = Some(tries);
    }

    pub fn set_ndots(&mut self, ndots: u32) {
        self.ndots = Some(ndots);
    }

    pub fn set_udp_port(&mut self, port: u16) {
        self.udp_port = Some(port);
    }

    pub fn set_tcp_port(&mut self, port: u16) {
        self.tcp_port = Some(port);
    }

    pub fn set_rotate(&mut self, rotate: bool) {
        self.rotate = Some(rotate);
    }

    /// Fill in options not set yet from the `ARES_*` environment variables.
    pub fn load_env(&mut self) -> anyhow::Result<()> {
        self.load_env_with(|k| std::env::var(k).ok())
    }

    pub fn load_env_with<F>(&mut self, get: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: FromStr>(key: &str, value: Option<String>) -> anyhow::Result<Option<T>>
        where
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            value
                .map(|v| v.trim().parse::<T>())
                .transpose()
                .context(format!("invalid value for env var {key}"))
        }

        if self.servers.is_empty() {
            if let Some(v) = get(ENV_SERVERS) {
                self.parse_server_str(&v)
                    .context(format!("invalid value for env var {ENV_SERVERS}"))?;
            }
        }
        if self.timeout.is_none() {
            self.timeout = parse(ENV_TIMEOUT, get(ENV_TIMEOUT))?;
        }
        if self.tries.is_none() {
            self.tries = parse(ENV_TRIES, get(ENV_TRIES))?;
        }
        if self.ndots.is_none() {
            self.ndots = parse(ENV_NDOTS, get(ENV_NDOTS))?;
        }
        if self.udp_port.is_none() {
            self.udp_port = parse(ENV_UDP_PORT, get(ENV_UDP_PORT))?;
        }
        if self.tcp_port.is_none() {
            self.tcp_port = parse(ENV_TCP_PORT, get(ENV_TCP_PORT))?;
        }
        if self.rotate.is_none() {
            if let Some(v) = get(ENV_ROTATE) {
                let rotate = match v.trim().to_lowercase().as_str() {
                    "1" | "true" | "yes" | "on" => true,
                    "0" | "false" | "no" | "off" => false,
                    _ => return Err(anyhow!("invalid value for env var {ENV_ROTATE}: {v}")),
                };
                self.rotate = Some(rotate);
            }
        }
        Ok(())
    }

    fn build_options(&self) -> c_ares_resolver::Options {
        let mut options = c_ares_resolver::Options::new();
        if let Some(timeout) = self.timeout {
            options.set_timeout(timeout);
        }
        if let Some(tries) = self.tries {
            options.set_tries(tries);
        }
        if let Some(ndots) = self.ndots {
            options.set_ndots(ndots);
        }
        if let Some(port) = self.udp_port {
            options.set_udp_port(port);
        }
        if let Some(port) = self.tcp_port {
            options.set_tcp_port(port);
        }
        match self.rotate {
            Some(true) => {
                options.set_rotate();
            }
            Some(false) => {
                options.set_no_rotate();
            }
            None => {}
        }
        options
    }

    pub(crate) fn spawn_engine(&self) -> anyhow::Result<BoxResolveEngine> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| anyhow!("no tokio runtime for c-ares engine: {e}"))?;

        let resolver = c_ares_resolver::Resolver::with_options(self.build_options())
            .map_err(|e| anyhow!("failed to create c-ares resolver: {e}"))?;
        if !self.servers.is_empty() {
            let servers = self
                .servers
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>();
            let servers = servers.iter().map(|s| s.as_str()).collect::<Vec<_>>();
            resolver
                .set_servers(&servers)
                .map_err(|e| anyhow!("failed to set c-ares servers: {e}"))?;
        }
        Ok(Box::new(CAresEngine::new(resolver, runtime)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parse_servers() {
        let mut config = CAresEngineConfig::default();
        config
            .parse_server_str("8.8.8.8, 192.0.2.53:5353 [2001:db8::1]:53")
            .unwrap();
        assert_eq!(
            config.get_servers(),
            vec![
                SocketAddr::from_str("8.8.8.8:53").unwrap(),
                SocketAddr::from_str("192.0.2.53:5353").unwrap(),
                SocketAddr::from_str("[2001:db8::1]:53").unwrap(),
            ]
        );
        assert!(config.parse_server_str("not-an-ip").is_err());
    }

    #[test]
    fn env_does_not_override() {
        let env = HashMap::from([
            (ENV_SERVERS, "192.0.2.1"),
            (ENV_TIMEOUT, "2000"),
            (ENV_TRIES, "3"),
            (ENV_ROTATE, "yes"),
        ]);
        let get = |k: &str| env.get(k).map(|v| v.to_string());

        let mut config = CAresEngineConfig::default();
        config.set_tries(1);
        config.load_env_with(get).unwrap();
        assert_eq!(
            config.get_servers(),
            vec![SocketAddr::from_str("192.0.2.1:53").unwrap()]
        );
        assert_eq!(config.timeout, Some(2000));
        assert_eq!(config.tries, Some(1));
        assert_eq!(config.ndots, None);
        assert_eq!(config.rotate, Some(true));
    }

    #[test]
    fn env_err() {
        let mut config = CAresEngineConfig::default();
        let r = config.load_env_with(|k| (k == ENV_TIMEOUT).then(|| "soon".to_string()));
        assert!(r.is_err());
    }
}

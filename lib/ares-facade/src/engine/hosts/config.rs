/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, anyhow};

use super::HostsEngine;
use crate::engine::BoxResolveEngine;

#[cfg(feature = "yaml")]
mod yaml;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct HostsLine {
    pub(crate) address: IpAddr,
    pub(crate) canonical: String,
    pub(crate) aliases: Vec<String>,
}

impl HostsLine {
    pub(crate) fn has_name(&self, name: &str) -> bool {
        self.canonical.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

/// Static host and service table served by the in-process engine.
///
/// Lines keep insertion order, so the first line naming a host decides its
/// canonical name, as in `/etc/hosts`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostsEngineConfig {
    pub(crate) lines: Vec<HostsLine>,
    pub(crate) services: BTreeMap<(u16, &'static str), String>,
}

impl HostsEngineConfig {
    pub fn add_host(&mut self, address: IpAddr, canonical: &str, aliases: &[&str]) {
        self.lines.push(HostsLine {
            address,
            canonical: canonical.to_string(),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
        });
    }

    /// Register a service name for `port`, `datagram` selecting udp over tcp.
    pub fn add_service(&mut self, name: &str, port: u16, datagram: bool) {
        let proto = if datagram { "udp" } else { "tcp" };
        self.services.insert((port, proto), name.to_string());
    }

    pub(crate) fn service(&self, port: u16, datagram: bool) -> Option<&str> {
        let proto = if datagram { "udp" } else { "tcp" };
        self.services.get(&(port, proto)).map(|s| s.as_str())
    }

    /// Add every entry of text in `/etc/hosts` format.
    pub fn parse_hosts(&mut self, content: &str) -> anyhow::Result<()> {
        for (i, line) in content.lines().enumerate() {
            self.parse_hosts_line(line)
                .context(format!("invalid hosts line {}", i + 1))?;
        }
        Ok(())
    }

    fn parse_hosts_line(&mut self, line: &str) -> anyhow::Result<()> {
        let line = match line.find('#') {
            Some(p) => &line[..p],
            None => line,
        };
        let mut words = line.split_whitespace();
        let Some(address) = words.next() else {
            return Ok(());
        };
        let address =
            IpAddr::from_str(address).map_err(|e| anyhow!("invalid address {address}: {e}"))?;
        let canonical = words
            .next()
            .ok_or_else(|| anyhow!("no host name for address {address}"))?;
        let aliases = words.collect::<Vec<_>>();
        self.add_host(address, canonical, &aliases);
        Ok(())
    }

    pub fn load_hosts_file<P: AsRef<Path>>(&mut self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
        self.parse_hosts(&content)
    }

    /// Add every entry of text in `/etc/services` format.
    ///
    /// The first name listed for a port wins, as with `getservbyport`.
    pub fn parse_services(&mut self, content: &str) -> anyhow::Result<()> {
        for (i, line) in content.lines().enumerate() {
            self.parse_services_line(line)
                .context(format!("invalid services line {}", i + 1))?;
        }
        Ok(())
    }

    fn parse_services_line(&mut self, line: &str) -> anyhow::Result<()> {
        let line = match line.find('#') {
            Some(p) => &line[..p],
            None => line,
        };
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(());
        };
        let port_proto = words
            .next()
            .ok_or_else(|| anyhow!("no port for service {name}"))?;
        let (port, proto) = port_proto
            .split_once('/')
            .ok_or_else(|| anyhow!("invalid port/protocol {port_proto}"))?;
        let port = u16::from_str(port).map_err(|e| anyhow!("invalid port {port}: {e}"))?;
        let proto = match proto {
            "tcp" => "tcp",
            "udp" => "udp",
            _ => return Ok(()),
        };
        self.services
            .entry((port, proto))
            .or_insert_with(|| name.to_string());
        Ok(())
    }

    pub fn load_services_file<P: AsRef<Path>>(&mut self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
        self.parse_services(&content)
    }

    pub(crate) fn spawn_engine(&self) -> anyhow::Result<BoxResolveEngine> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| anyhow!("no tokio runtime for hosts engine: {e}"))?;
        Ok(Box::new(HostsEngine::new(Arc::new(self.clone()), runtime)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn parse_hosts() {
        let mut config = HostsEngineConfig::default();
        config
            .parse_hosts(
                "# comment line\n\
                 127.0.0.1   localhost\n\
                 \n\
                 ::1         localhost ip6-localhost ip6-loopback # trailing\n\
                 192.0.2.10  www.example.net www\n",
            )
            .unwrap();
        assert_eq!(config.lines.len(), 3);
        assert_eq!(config.lines[0].address, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.lines[1].address, IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(config.lines[1].aliases, vec!["ip6-localhost", "ip6-loopback"]);
        assert!(config.lines[2].has_name("WWW"));
        assert!(!config.lines[2].has_name("example.net"));
    }

    #[test]
    fn parse_hosts_err() {
        let mut config = HostsEngineConfig::default();
        assert!(config.parse_hosts("not-an-ip localhost").is_err());
        assert!(config.parse_hosts("127.0.0.1").is_err());
    }

    #[test]
    fn services() {
        let mut config = HostsEngineConfig::default();
        config.add_service("domain", 53, false);
        config.add_service("domain", 53, true);
        config.add_service("syslog", 514, true);
        assert_eq!(config.service(53, false), Some("domain"));
        assert_eq!(config.service(514, true), Some("syslog"));
        assert_eq!(config.service(514, false), None);
    }

    #[test]
    fn parse_services() {
        let mut config = HostsEngineConfig::default();
        config
            .parse_services(
                "# Network services\n\
                 domain   53/tcp\n\
                 domain   53/udp\n\
                 http     80/tcp   www   # WorldWideWeb\n\
                 www-alt  80/tcp\n\
                 sctp-x   99/sctp\n",
            )
            .unwrap();
        assert_eq!(config.service(53, true), Some("domain"));
        assert_eq!(config.service(80, false), Some("http"));
        assert_eq!(config.service(99, false), None);

        assert!(config.parse_services("http").is_err());
        assert!(config.parse_services("http 80").is_err());
        assert!(config.parse_services("http 80000/tcp").is_err());
    }
}

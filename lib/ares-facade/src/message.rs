/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use super::AddressFamily;

/// Address record as produced by the engine for one family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostEntry {
    pub name: String,
    pub aliases: Vec<String>,
    pub family: AddressFamily,
    pub addresses: Vec<IpAddr>,
}

impl HostEntry {
    pub fn new(name: impl Into<String>, family: AddressFamily) -> Self {
        HostEntry {
            name: name.into(),
            aliases: Vec::new(),
            family,
            addresses: Vec::new(),
        }
    }

    pub(crate) fn broadcast() -> Self {
        let ip = IpAddr::V4(Ipv4Addr::BROADCAST);
        HostEntry {
            name: ip.to_string(),
            aliases: Vec::new(),
            family: AddressFamily::Inet,
            addresses: vec![ip],
        }
    }
}

/// Answer of a name-info query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameInfo {
    pub node: Option<String>,
    pub service: Option<String>,
}

/// One `getaddrinfo` result tuple.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddrInfo {
    pub family: i32,
    pub socktype: i32,
    pub protocol: i32,
    pub canonname: String,
    pub sockaddr: SocketAddr,
}

impl AddrInfo {
    pub fn ip(&self) -> IpAddr {
        self.sockaddr.ip()
    }
}

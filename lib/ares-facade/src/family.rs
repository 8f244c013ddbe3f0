/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::IpAddr;

use crate::ResolveError;

pub const AF_UNSPEC: i32 = libc::AF_UNSPEC;
pub const AF_INET: i32 = libc::AF_INET;
pub const AF_INET6: i32 = libc::AF_INET6;

pub const SOCK_STREAM: i32 = libc::SOCK_STREAM;
pub const SOCK_DGRAM: i32 = libc::SOCK_DGRAM;
pub const SOCK_RAW: i32 = libc::SOCK_RAW;

pub const IPPROTO_TCP: i32 = libc::IPPROTO_TCP;
pub const IPPROTO_UDP: i32 = libc::IPPROTO_UDP;

pub const AI_PASSIVE: i32 = libc::AI_PASSIVE;
pub const AI_NUMERICHOST: i32 = libc::AI_NUMERICHOST;

pub const NI_NUMERICHOST: i32 = libc::NI_NUMERICHOST;
pub const NI_NUMERICSERV: i32 = libc::NI_NUMERICSERV;
pub const NI_NOFQDN: i32 = libc::NI_NOFQDN;
pub const NI_NAMEREQD: i32 = libc::NI_NAMEREQD;
pub const NI_DGRAM: i32 = libc::NI_DGRAM;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    Unspec,
    Inet,
    Inet6,
}

impl AddressFamily {
    pub fn as_raw(&self) -> i32 {
        match self {
            AddressFamily::Unspec => AF_UNSPEC,
            AddressFamily::Inet => AF_INET,
            AddressFamily::Inet6 => AF_INET6,
        }
    }

    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => AddressFamily::Inet,
            IpAddr::V6(_) => AddressFamily::Inet6,
        }
    }

    pub fn matches(&self, ip: &IpAddr) -> bool {
        match self {
            AddressFamily::Unspec => true,
            AddressFamily::Inet => ip.is_ipv4(),
            AddressFamily::Inet6 => ip.is_ipv6(),
        }
    }
}

impl TryFrom<i32> for AddressFamily {
    type Error = ResolveError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            AF_UNSPEC => Ok(AddressFamily::Unspec),
            AF_INET => Ok(AddressFamily::Inet),
            AF_INET6 => Ok(AddressFamily::Inet6),
            _ => Err(ResolveError::FamilyNotSupported(value)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SocketType {
    Stream,
    Datagram,
    Raw,
}

impl SocketType {
    /// (socket type, protocol) pairs an address is expanded into,
    /// in result order.
    pub const CANONICAL_PROTOCOLS: [(SocketType, i32); 3] = [
        (SocketType::Stream, IPPROTO_TCP),
        (SocketType::Datagram, IPPROTO_UDP),
        (SocketType::Raw, 0),
    ];

    pub fn as_raw(&self) -> i32 {
        match self {
            SocketType::Stream => SOCK_STREAM,
            SocketType::Datagram => SOCK_DGRAM,
            SocketType::Raw => SOCK_RAW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_from_raw() {
        assert_eq!(AddressFamily::try_from(AF_UNSPEC).unwrap(), AddressFamily::Unspec);
        assert_eq!(AddressFamily::try_from(AF_INET).unwrap(), AddressFamily::Inet);
        assert_eq!(AddressFamily::try_from(AF_INET6).unwrap(), AddressFamily::Inet6);
        assert_eq!(
            AddressFamily::try_from(12345).unwrap_err(),
            ResolveError::FamilyNotSupported(12345)
        );
    }
}

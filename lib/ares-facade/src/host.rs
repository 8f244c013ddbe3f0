/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;

use crate::ResolveError;

/// Host names that never need a network round trip.
pub const LOCAL_HOSTNAMES: [&str; 2] = ["localhost", "ip6-localhost"];

pub(crate) const BROADCAST_NAME: &str = "<broadcast>";
pub(crate) const BROADCAST_ADDRESS: &str = "255.255.255.255";

/// A host argument as callers hand it in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostInput {
    None,
    Text(String),
    Bytes(Vec<u8>),
}

impl HostInput {
    pub fn type_name(&self) -> &'static str {
        match self {
            HostInput::None => "None",
            HostInput::Text(_) => "str",
            HostInput::Bytes(_) => "bytes",
        }
    }

    /// The name in the byte form the engine takes: IDNA for text, as-is for
    /// bytes. Only text and bytes are accepted.
    pub(crate) fn encode(&self) -> Result<Cow<'_, str>, ResolveError> {
        match self {
            HostInput::Text(s) => Ok(encode_idna(s)),
            HostInput::Bytes(b) => std::str::from_utf8(b)
                .map(Cow::Borrowed)
                .map_err(|_| ResolveError::InvalidInput("host name is not valid utf-8".to_string())),
            HostInput::None => Err(ResolveError::InvalidInput(format!(
                "expected str or bytes, not {}",
                self.type_name()
            ))),
        }
    }

    /// Like [`HostInput::encode`], but `None` for anything not usable as a
    /// host name.
    pub(crate) fn encoded_name(&self) -> Option<Cow<'_, str>> {
        self.encode().ok()
    }

    /// The text form, for arguments that must be text.
    pub(crate) fn as_text(&self) -> Result<&str, ResolveError> {
        match self {
            HostInput::Text(s) => Ok(s),
            _ => Err(ResolveError::InvalidInput(format!(
                "sockaddr[0] must be a string, not {}",
                self.type_name()
            ))),
        }
    }
}

fn encode_idna(s: &str) -> Cow<'_, str> {
    if s.is_ascii() {
        return Cow::Borrowed(s);
    }
    match idna::domain_to_ascii(s) {
        Ok(ascii) => Cow::Owned(ascii),
        // let the engine report its own error for names IDNA rejects
        Err(_) => Cow::Borrowed(s),
    }
}

/// Socket address argument of a name-info lookup: a host and port pair for
/// IPv4, or the four element form carrying IPv6 flow info and scope id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SockAddrArg {
    Pair {
        host: HostInput,
        port: u16,
    },
    Quad {
        host: HostInput,
        port: u16,
        flowinfo: u32,
        scope_id: u32,
    },
}

impl SockAddrArg {
    pub fn host(&self) -> &HostInput {
        match self {
            SockAddrArg::Pair { host, .. } | SockAddrArg::Quad { host, .. } => host,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            SockAddrArg::Pair { port, .. } | SockAddrArg::Quad { port, .. } => *port,
        }
    }
}

impl From<std::net::SocketAddr> for SockAddrArg {
    fn from(addr: std::net::SocketAddr) -> Self {
        match addr {
            std::net::SocketAddr::V4(a) => SockAddrArg::Pair {
                host: HostInput::Text(a.ip().to_string()),
                port: a.port(),
            },
            std::net::SocketAddr::V6(a) => SockAddrArg::Quad {
                host: HostInput::Text(a.ip().to_string()),
                port: a.port(),
                flowinfo: a.flowinfo(),
                scope_id: a.scope_id(),
            },
        }
    }
}

pub(crate) fn is_local_hostname(name: &str) -> bool {
    LOCAL_HOSTNAMES.contains(&name)
}

impl From<&str> for HostInput {
    fn from(s: &str) -> Self {
        HostInput::Text(s.to_string())
    }
}

impl From<String> for HostInput {
    fn from(s: String) -> Self {
        HostInput::Text(s)
    }
}

impl From<&[u8]> for HostInput {
    fn from(b: &[u8]) -> Self {
        HostInput::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for HostInput {
    fn from(b: Vec<u8>) -> Self {
        HostInput::Bytes(b)
    }
}

impl<T: Into<HostInput>> From<Option<T>> for HostInput {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => HostInput::None,
        }
    }
}

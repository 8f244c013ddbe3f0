/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use thiserror::Error;

/// `EAI_NODATA` as reported by the facade for empty answers.
pub const EAI_NODATA: i32 = -5;
/// Code used for an unsupported `ai_family`.
pub const EAI_FAMILY: i32 = 5;
/// `EAI_SERVICE`.
pub const EAI_SERVICE: i32 = -8;
/// Code used when the engine returned no service name.
pub const EAI_NONAME: i32 = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveServerError {
    #[error("server claims query was malformed")]
    FormErr,
    #[error("server returned general failure")]
    ServFail,
    #[error("server claims domain name not found")]
    NotFound,
    #[error("server does not implement requested operation")]
    NotImp,
    #[error("server refused query")]
    Refused,
}

impl ResolveServerError {
    pub fn get_type(&self) -> &str {
        match self {
            ResolveServerError::FormErr => "FORMERR",
            ResolveServerError::ServFail => "SERVFAIL",
            ResolveServerError::NotFound => "NOTFOUND",
            ResolveServerError::NotImp => "NOTIMP",
            ResolveServerError::Refused => "REFUSED",
        }
    }

    /// The c-ares status code of this error.
    pub fn code(&self) -> i32 {
        match self {
            ResolveServerError::FormErr => 2,
            ResolveServerError::ServFail => 3,
            ResolveServerError::NotFound => 4,
            ResolveServerError::NotImp => 5,
            ResolveServerError::Refused => 6,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveEngineError {
    #[error("malformed DNS query")]
    BadQuery,
    #[error("malformed domain name")]
    BadName,
    #[error("unsupported address family")]
    BadFamily,
    #[error("malformed DNS reply")]
    BadResp,
    #[error("connection refused by server")]
    ConnRefused,
    #[error("timeout while contacting server")]
    Timeout,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ResolveEngineError {
    pub fn get_type(&self) -> &str {
        match self {
            ResolveEngineError::BadQuery => "BadQuery",
            ResolveEngineError::BadName => "BadName",
            ResolveEngineError::BadFamily => "BadFamily",
            ResolveEngineError::BadResp => "BadResp",
            ResolveEngineError::ConnRefused => "ConnRefused",
            ResolveEngineError::Timeout => "Timeout",
            ResolveEngineError::Internal(_) => "InternalError",
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            ResolveEngineError::BadQuery => 7,
            ResolveEngineError::BadName => 8,
            ResolveEngineError::BadFamily => 9,
            ResolveEngineError::BadResp => 10,
            ResolveEngineError::ConnRefused => 11,
            ResolveEngineError::Timeout => 12,
            ResolveEngineError::Internal(_) => 16,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveLocalError {
    #[error("no resolver running")]
    NoResolverRunning,
    #[error("query cancelled")]
    QueryCancelled,
}

impl ResolveLocalError {
    pub fn get_type(&self) -> &str {
        match self {
            ResolveLocalError::NoResolverRunning => "NoResolverRunning",
            ResolveLocalError::QueryCancelled => "QueryCancelled",
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            ResolveLocalError::NoResolverRunning => 16,
            ResolveLocalError::QueryCancelled => 24,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("server error: {0}")]
    FromServer(#[from] ResolveServerError),
    #[error("engine error: {0}")]
    FromEngine(#[from] ResolveEngineError),
    #[error("local error: {0}")]
    FromLocal(#[from] ResolveLocalError),
    #[error("No address associated with hostname")]
    NoAddress,
    #[error("ai_family not supported: {0}")]
    FamilyNotSupported(i32),
    #[error("Servname not supported for ai_socktype")]
    ServiceNotSupported,
    #[error("nodename nor servname provided, or not known")]
    NameOrServiceUnknown,
    #[error("system resolver error {code}: {message}")]
    System { code: i32, message: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("illegal IP address string: {0}")]
    InvalidAddress(String),
    #[error("sockaddr resolved to multiple addresses")]
    MultipleAddresses,
    #[error("{0}")]
    BadSockAddr(&'static str),
}

impl ResolveError {
    /// Whether this is a resolution failure, the only class of error that
    /// depends on the engine session and so may be retried on a new one.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            ResolveError::FromServer(_)
                | ResolveError::FromEngine(_)
                | ResolveError::FromLocal(_)
                | ResolveError::NoAddress
                | ResolveError::FamilyNotSupported(_)
                | ResolveError::ServiceNotSupported
                | ResolveError::NameOrServiceUnknown
                | ResolveError::System { .. }
        )
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ResolveError::FromServer(e) => Some(e.code()),
            ResolveError::FromEngine(e) => Some(e.code()),
            ResolveError::FromLocal(e) => Some(e.code()),
            ResolveError::NoAddress => Some(EAI_NODATA),
            ResolveError::FamilyNotSupported(_) => Some(EAI_FAMILY),
            ResolveError::ServiceNotSupported => Some(EAI_SERVICE),
            ResolveError::NameOrServiceUnknown => Some(EAI_NONAME),
            ResolveError::System { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn get_type(&self) -> &str {
        match self {
            ResolveError::FromServer(_) => "ServerError",
            ResolveError::FromEngine(_) => "EngineError",
            ResolveError::FromLocal(_) => "LocalError",
            ResolveError::NoAddress => "NoAddress",
            ResolveError::FamilyNotSupported(_) => "FamilyNotSupported",
            ResolveError::ServiceNotSupported => "ServiceNotSupported",
            ResolveError::NameOrServiceUnknown => "NameOrServiceUnknown",
            ResolveError::System { .. } => "SystemError",
            ResolveError::InvalidInput(_) => "InvalidInput",
            ResolveError::InvalidAddress(_) => "InvalidAddress",
            ResolveError::MultipleAddresses => "MultipleAddresses",
            ResolveError::BadSockAddr(_) => "BadSockAddr",
        }
    }

    pub fn get_subtype(&self) -> &str {
        match self {
            ResolveError::FromServer(e) => e.get_type(),
            ResolveError::FromEngine(e) => e.get_type(),
            ResolveError::FromLocal(e) => e.get_type(),
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_class() {
        assert!(ResolveError::NoAddress.is_resolution_failure());
        assert!(ResolveError::from(ResolveLocalError::QueryCancelled).is_resolution_failure());
        assert!(ResolveError::from(ResolveServerError::NotFound).is_resolution_failure());
        assert!(!ResolveError::InvalidInput("x".to_string()).is_resolution_failure());
        assert!(!ResolveError::InvalidAddress("x".to_string()).is_resolution_failure());
        assert!(!ResolveError::MultipleAddresses.is_resolution_failure());
        assert!(!ResolveError::BadSockAddr("x").is_resolution_failure());
    }

    #[test]
    fn codes() {
        assert_eq!(ResolveError::NoAddress.code(), Some(-5));
        assert_eq!(ResolveError::FamilyNotSupported(99).code(), Some(5));
        assert_eq!(ResolveError::NameOrServiceUnknown.code(), Some(8));
        assert_eq!(
            ResolveError::from(ResolveServerError::NotFound).code(),
            Some(4)
        );
        assert_eq!(ResolveError::MultipleAddresses.code(), None);
        assert_eq!(
            ResolveError::NoAddress.to_string(),
            "No address associated with hostname"
        );
    }

    #[test]
    fn type_labels() {
        let e = ResolveError::from(ResolveEngineError::Timeout);
        assert_eq!(e.get_type(), "EngineError");
        assert_eq!(e.get_subtype(), "Timeout");
        assert_eq!(ResolveError::NoAddress.get_subtype(), "");
    }
}

/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicU64, Ordering};

use super::{ResolveEngineError, ResolveError, ResolveLocalError, ResolveServerError};

#[derive(Default)]
pub struct ResolverQueryStats {
    query_total: AtomicU64,
    query_fast_path: AtomicU64,
    query_retried: AtomicU64,
    query_failed: AtomicU64,
    engine_timeout: AtomicU64,
    engine_refused: AtomicU64,
    engine_malformed: AtomicU64,
    server_refused: AtomicU64,
    server_malformed: AtomicU64,
    server_not_found: AtomicU64,
    server_serv_fail: AtomicU64,
    no_address: AtomicU64,
    cancelled: AtomicU64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolverQuerySnapshot {
    pub total: u64,
    pub fast_path: u64,
    pub retried: u64,
    pub failed: u64,
    pub engine_timeout: u64,
    pub engine_refused: u64,
    pub engine_malformed: u64,
    pub server_refused: u64,
    pub server_malformed: u64,
    pub server_not_found: u64,
    pub server_serv_fail: u64,
    pub no_address: u64,
    pub cancelled: u64,
}

impl ResolverQueryStats {
    fn snapshot(&self) -> ResolverQuerySnapshot {
        ResolverQuerySnapshot {
            total: self.query_total.load(Ordering::Relaxed),
            fast_path: self.query_fast_path.load(Ordering::Relaxed),
            retried: self.query_retried.load(Ordering::Relaxed),
            failed: self.query_failed.load(Ordering::Relaxed),
            engine_timeout: self.engine_timeout.load(Ordering::Relaxed),
            engine_refused: self.engine_refused.load(Ordering::Relaxed),
            engine_malformed: self.engine_malformed.load(Ordering::Relaxed),
            server_refused: self.server_refused.load(Ordering::Relaxed),
            server_malformed: self.server_malformed.load(Ordering::Relaxed),
            server_not_found: self.server_not_found.load(Ordering::Relaxed),
            server_serv_fail: self.server_serv_fail.load(Ordering::Relaxed),
            no_address: self.no_address.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn add_query_total(&self) {
        self.query_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_query_fast_path(&self) {
        self.query_fast_path.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_query_retried(&self) {
        self.query_retried.fetch_add(1, Ordering::Relaxed);
    }

    fn add_server_error(&self, e: &ResolveServerError) {
        let counter = match e {
            ResolveServerError::Refused => &self.server_refused,
            ResolveServerError::FormErr => &self.server_malformed,
            ResolveServerError::NotFound => &self.server_not_found,
            ResolveServerError::ServFail => &self.server_serv_fail,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn add_engine_error(&self, e: &ResolveEngineError) {
        let counter = match e {
            ResolveEngineError::ConnRefused => &self.engine_refused,
            ResolveEngineError::Timeout => &self.engine_timeout,
            ResolveEngineError::BadName
            | ResolveEngineError::BadQuery
            | ResolveEngineError::BadResp => &self.engine_malformed,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_error(&self, e: &ResolveError) {
        self.query_failed.fetch_add(1, Ordering::Relaxed);
        match e {
            ResolveError::FromServer(e) => self.add_server_error(e),
            ResolveError::FromEngine(e) => self.add_engine_error(e),
            ResolveError::FromLocal(ResolveLocalError::QueryCancelled) => {
                self.cancelled.fetch_add(1, Ordering::Relaxed);
            }
            ResolveError::NoAddress => {
                self.no_address.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }
}

#[derive(Default)]
pub struct ResolverSessionStats {
    created: AtomicU64,
    destroyed: AtomicU64,
    forks_handled: AtomicU64,
    build_failed: AtomicU64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolverSessionSnapshot {
    pub created: u64,
    pub destroyed: u64,
    pub forks_handled: u64,
    pub build_failed: u64,
}

impl ResolverSessionStats {
    fn snapshot(&self) -> ResolverSessionSnapshot {
        ResolverSessionSnapshot {
            created: self.created.load(Ordering::Relaxed),
            destroyed: self.destroyed.load(Ordering::Relaxed),
            forks_handled: self.forks_handled.load(Ordering::Relaxed),
            build_failed: self.build_failed.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn add_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_destroyed(&self) {
        self.destroyed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_fork_handled(&self) {
        self.forks_handled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_build_failed(&self) {
        self.build_failed.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Default)]
pub struct ResolverStats {
    pub(crate) gethostbyname: ResolverQueryStats,
    pub(crate) gethostbyaddr: ResolverQueryStats,
    pub(crate) getaddrinfo: ResolverQueryStats,
    pub(crate) getnameinfo: ResolverQueryStats,
    pub(crate) session: ResolverSessionStats,
}

impl ResolverStats {
    pub fn snapshot(&self) -> ResolverSnapshot {
        ResolverSnapshot {
            gethostbyname: self.gethostbyname.snapshot(),
            gethostbyaddr: self.gethostbyaddr.snapshot(),
            getaddrinfo: self.getaddrinfo.snapshot(),
            getnameinfo: self.getnameinfo.snapshot(),
            session: self.session.snapshot(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolverSnapshot {
    pub gethostbyname: ResolverQuerySnapshot,
    pub gethostbyaddr: ResolverQuerySnapshot,
    pub getaddrinfo: ResolverQuerySnapshot,
    pub getnameinfo: ResolverQuerySnapshot,
    pub session: ResolverSessionSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        let stats = ResolverQueryStats::default();
        stats.add_query_total();
        stats.add_error(&ResolveServerError::NotFound.into());
        stats.add_error(&ResolveEngineError::Timeout.into());
        stats.add_error(&ResolveLocalError::QueryCancelled.into());
        stats.add_error(&ResolveError::NoAddress);
        stats.add_error(&ResolveError::ServiceNotSupported);

        let s = stats.snapshot();
        assert_eq!(s.total, 1);
        assert_eq!(s.failed, 5);
        assert_eq!(s.server_not_found, 1);
        assert_eq!(s.engine_timeout, 1);
        assert_eq!(s.cancelled, 1);
        assert_eq!(s.no_address, 1);
        assert_eq!(s.server_refused, 0);
    }
}

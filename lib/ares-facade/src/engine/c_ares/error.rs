/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use crate::error::{ResolveEngineError, ResolveError, ResolveLocalError, ResolveServerError};

impl ResolveError {
    pub(super) fn from_cares_error(e: c_ares::Error) -> ResolveError {
        match e {
            c_ares::Error::ENODATA => ResolveError::NoAddress,
            c_ares::Error::EFORMERR => ResolveServerError::FormErr.into(),
            c_ares::Error::ESERVFAIL => ResolveServerError::ServFail.into(),
            c_ares::Error::ENOTFOUND => ResolveServerError::NotFound.into(),
            c_ares::Error::ENOTIMP => ResolveServerError::NotImp.into(),
            c_ares::Error::EREFUSED => ResolveServerError::Refused.into(),
            c_ares::Error::EBADQUERY => ResolveEngineError::BadQuery.into(),
            c_ares::Error::EBADNAME => ResolveEngineError::BadName.into(),
            c_ares::Error::EBADFAMILY => ResolveEngineError::BadFamily.into(),
            c_ares::Error::EBADRESP => ResolveEngineError::BadResp.into(),
            c_ares::Error::ECONNREFUSED => ResolveEngineError::ConnRefused.into(),
            c_ares::Error::ETIMEOUT => ResolveEngineError::Timeout.into(),
            c_ares::Error::ECANCELLED | c_ares::Error::EDESTRUCTION => {
                ResolveLocalError::QueryCancelled.into()
            }
            _ => ResolveEngineError::Internal(e.to_string()).into(),
        }
    }
}

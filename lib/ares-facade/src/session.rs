/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use crate::engine::{BoxResolveEngine, ResolveEngine};

/// One live engine session, replaced as a whole whenever the process forks.
///
/// Sessions are compared by identity (`Arc::ptr_eq`), never by value.
pub(crate) struct EngineSession {
    id: u64,
    pid: u32,
    engine: BoxResolveEngine,
}

impl EngineSession {
    pub(crate) fn new(id: u64, pid: u32, engine: BoxResolveEngine) -> Self {
        EngineSession { id, pid, engine }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn engine(&self) -> &dyn ResolveEngine {
        self.engine.as_ref()
    }

    pub(crate) fn destroy(&self) {
        self.engine.destroy();
    }
}

impl fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineSession")
            .field("id", &self.id)
            .field("pid", &self.pid)
            .finish()
    }
}

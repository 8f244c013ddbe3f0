/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use crate::engine::AnyEngineConfig;

#[cfg(feature = "yaml")]
mod yaml;

const RESOLVER_DEFAULT_STRICT_SERVICE_NAME: bool = true;
const RESOLVER_DEFAULT_DESTROY_DELAY: Duration = Duration::ZERO;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolverRuntimeConfig {
    /// Fail name-info lookups whose port has no service name, instead of
    /// answering with service "0".
    pub strict_service_name: bool,
    /// How long a replaced or closed session is kept before it is destroyed.
    pub destroy_delay: Duration,
}

impl Default for ResolverRuntimeConfig {
    fn default() -> Self {
        ResolverRuntimeConfig {
            strict_service_name: RESOLVER_DEFAULT_STRICT_SERVICE_NAME,
            destroy_delay: RESOLVER_DEFAULT_DESTROY_DELAY,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolverConfig {
    pub name: String,
    pub engine: AnyEngineConfig,
    pub runtime: ResolverRuntimeConfig,
}

impl ResolverConfig {
    pub fn new(name: &str, engine: AnyEngineConfig) -> Self {
        ResolverConfig {
            name: name.to_string(),
            engine,
            runtime: ResolverRuntimeConfig::default(),
        }
    }
}

/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

use super::{ResolverConfig, ResolverRuntimeConfig};
use crate::engine::AnyEngineConfig;
use crate::engine::hosts::HostsEngineConfig;
use crate::yaml as yaml_value;

impl ResolverRuntimeConfig {
    pub fn set_by_yaml_kv(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match yaml_value::normalize_key(k).as_str() {
            "strict_service_name" => {
                self.strict_service_name = yaml_value::as_bool(v)?;
                Ok(())
            }
            "destroy_delay" => {
                self.destroy_delay = yaml_value::as_duration(v)?;
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        }
    }
}

impl ResolverConfig {
    /// Parse a resolver map. The `type` key selects the engine, every other
    /// key goes to the runtime or to the engine config, in that order.
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        let Yaml::Hash(map) = v else {
            return Err(anyhow!("invalid yaml value type, expect map"));
        };

        let engine_type = match map.get(&Yaml::String("type".to_string())) {
            Some(v) => yaml_value::as_string(v).context("invalid value for key type")?,
            None => "hosts".to_string(),
        };
        let mut engine = match yaml_value::normalize_key(&engine_type).as_str() {
            "hosts" => AnyEngineConfig::Hosts(HostsEngineConfig::default()),
            #[cfg(feature = "c-ares")]
            "c_ares" | "cares" => {
                AnyEngineConfig::CAres(crate::engine::c_ares::CAresEngineConfig::default())
            }
            _ => return Err(anyhow!("unsupported engine type {engine_type}")),
        };

        let mut config = ResolverConfig::default();
        for (k, v) in map.iter() {
            let k = yaml_value::as_string(k).context("invalid key type, expect string")?;
            match yaml_value::normalize_key(&k).as_str() {
                "type" => {}
                "name" => config.name = yaml_value::as_string(v)?,
                "strict_service_name" | "destroy_delay" => config
                    .runtime
                    .set_by_yaml_kv(&k, v)
                    .context(format!("invalid value for key {k}"))?,
                _ => match &mut engine {
                    AnyEngineConfig::Hosts(c) => c
                        .set_by_yaml_kv(&k, v)
                        .context(format!("invalid value for key {k}"))?,
                    #[cfg(feature = "c-ares")]
                    AnyEngineConfig::CAres(c) => c
                        .set_by_yaml_kv(&k, v)
                        .context(format!("invalid value for key {k}"))?,
                    AnyEngineConfig::Custom(_) => return Err(anyhow!("invalid key {k}")),
                },
            }
        }
        config.engine = engine;
        Ok(config)
    }
}

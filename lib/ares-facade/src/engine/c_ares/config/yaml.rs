/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::anyhow;
use yaml_rust::Yaml;

use super::CAresEngineConfig;
use crate::yaml as yaml_value;

impl CAresEngineConfig {
    fn parse_server_array(&mut self, seq: &[Yaml]) -> anyhow::Result<()> {
        for v in seq {
            let s = yaml_value::as_string(v)?;
            self.parse_server_str(&s)?;
        }
        Ok(())
    }

    pub fn set_by_yaml_kv(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match yaml_value::normalize_key(k).as_str() {
            "server" | "servers" => match v {
                Yaml::String(addrs) => self.parse_server_str(addrs),
                Yaml::Array(seq) => self.parse_server_array(seq),
                _ => Err(anyhow!("invalid yaml value type, expect string / array")),
            },
            "timeout" => {
                self.set_timeout(yaml_value::as_u32(v)?);
                Ok(())
            }
            "tries" => {
                self.set_tries(yaml_value::as_u32(v)?);
                Ok(())
            }
            "ndots" => {
                self.set_ndots(yaml_value::as_u32(v)?);
                Ok(())
            }
            "udp_port" => {
                self.set_udp_port(yaml_value::as_u16(v)?);
                Ok(())
            }
            "tcp_port" => {
                self.set_tcp_port(yaml_value::as_u16(v)?);
                Ok(())
            }
            "rotate" | "round_robin" => {
                self.set_rotate(yaml_value::as_bool(v)?);
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        }
    }
}

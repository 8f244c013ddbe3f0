/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

use super::HostsEngineConfig;
use crate::yaml as yaml_value;

impl HostsEngineConfig {
    pub fn set_by_yaml_kv(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match yaml_value::normalize_key(k).as_str() {
            "hosts" => match v {
                Yaml::String(s) => self.parse_hosts(s),
                Yaml::Array(seq) => {
                    for (i, line) in seq.iter().enumerate() {
                        let line = yaml_value::as_string(line)
                            .context(format!("invalid hosts line value for #{i}"))?;
                        self.parse_hosts(&line)?;
                    }
                    Ok(())
                }
                _ => Err(anyhow!("invalid yaml value type, expect string / array")),
            },
            "hosts_file" => {
                let path = yaml_value::as_string(v)?;
                self.load_hosts_file(path)
            }
            "services_file" => {
                let path = yaml_value::as_string(v)?;
                self.load_services_file(path)
            }
            "services" => {
                let Yaml::Hash(map) = v else {
                    return Err(anyhow!("invalid yaml value type, expect map"));
                };
                for (name, port) in map.iter() {
                    let name = yaml_value::as_string(name)?;
                    self.set_service_by_yaml(&name, port)
                        .context(format!("invalid value for service {name}"))?;
                }
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        }
    }

    fn set_service_by_yaml(&mut self, name: &str, v: &Yaml) -> anyhow::Result<()> {
        if let Yaml::Hash(map) = v {
            let mut port = None;
            let mut protocol = None;
            for (k, v) in map.iter() {
                let k = yaml_value::as_string(k)?;
                match yaml_value::normalize_key(&k).as_str() {
                    "port" => port = Some(yaml_value::as_u16(v)?),
                    "protocol" => protocol = Some(yaml_value::as_string(v)?.to_lowercase()),
                    _ => return Err(anyhow!("invalid key {k}")),
                }
            }
            let port = port.ok_or_else(|| anyhow!("no port set"))?;
            match protocol.as_deref() {
                Some("tcp") => self.add_service(name, port, false),
                Some("udp") => self.add_service(name, port, true),
                None => {
                    self.add_service(name, port, false);
                    self.add_service(name, port, true);
                }
                Some(p) => return Err(anyhow!("unsupported protocol {p}")),
            }
        } else {
            let port = yaml_value::as_u16(v)?;
            self.add_service(name, port, false);
            self.add_service(name, port, true);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yaml_rust::YamlLoader;

    fn load(s: &str) -> Yaml {
        YamlLoader::load_from_str(s).unwrap().remove(0)
    }

    #[test]
    fn set_by_yaml_kv_ok() {
        let yaml = load(
            r#"
            hosts:
              - "192.0.2.1 www.example.net www"
              - "2001:db8::1 www.example.net"
            services:
              domain: 53
              syslog:
                port: 514
                protocol: udp
            "#,
        );
        let mut config = HostsEngineConfig::default();
        for (k, v) in yaml.as_hash().unwrap().iter() {
            config.set_by_yaml_kv(k.as_str().unwrap(), v).unwrap();
        }
        assert_eq!(config.lines.len(), 2);
        assert!(config.lines[1].has_name("www.example.net"));
        assert_eq!(config.service(53, false), Some("domain"));
        assert_eq!(config.service(53, true), Some("domain"));
        assert_eq!(config.service(514, true), Some("syslog"));
        assert_eq!(config.service(514, false), None);
    }

    #[test]
    fn set_by_yaml_kv_err() {
        let mut config = HostsEngineConfig::default();
        assert!(config.set_by_yaml_kv("hosts", &Yaml::Integer(1)).is_err());
        assert!(config.set_by_yaml_kv("hosts", &load("\"no-ip localhost\"")).is_err());
        assert!(
            config
                .set_by_yaml_kv("services", &load("syslog: {port: 514, protocol: sctp}"))
                .is_err()
        );
        assert!(config.set_by_yaml_kv("no_such_key", &Yaml::Null).is_err());
    }
}

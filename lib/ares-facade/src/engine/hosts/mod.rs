/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod driver;
use driver::HostsEngine;

mod config;
pub use config::HostsEngineConfig;

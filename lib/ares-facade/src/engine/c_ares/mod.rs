/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod driver;
use driver::CAresEngine;

mod config;
pub use config::CAresEngineConfig;

mod error;

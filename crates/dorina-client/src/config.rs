// Copyright 2025 Dorina-RS Project
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Result;
use std::fs;
use std::time::Duration;

/// Client configuration. Merged from defaults, a TOML file, environment
/// variables and CLI flags, in that order.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Service root, e.g. `http://localhost:5000`.
    pub base_url: String,
    /// API path prefix. `api/v1.0` for the versioned API, empty for the
    /// older unversioned deployments.
    pub api_prefix: String,
    /// Delay between job status checks. Deployments historically used
    /// 1000-10000 ms.
    pub retry_after: Duration,
    /// Optional ceiling on status checks per search. `None` keeps the
    /// original unbounded polling.
    pub max_status_checks: Option<u32>,
    /// Whether this session carries an uploaded custom regulator; the
    /// catalogue then gets a synthetic CUSTOM entry tagged with the session
    /// uuid.
    pub custom_regulator: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            api_prefix: "api/v1.0".to_string(),
            retry_after: Duration::from_millis(10_000),
            max_status_checks: None,
            custom_regulator: false,
        }
    }
}

/// CLI-level options that binaries pass to `load_client_config`.
/// Keep this small and explicit; binaries can expand for extra fields.
#[derive(Clone, Debug, Default)]
pub struct MergeOpts {
    pub config_path: Option<std::path::PathBuf>,
    pub cli_base_url: Option<String>,
    pub cli_api_prefix: Option<String>,
    pub cli_retry_after_ms: Option<u64>,
    pub cli_max_status_checks: Option<u32>,
}

/// Load and merge ClientConfig from: defaults <- config file <- env vars <- CLI
pub fn load_client_config(mut base: ClientConfig, opts: MergeOpts) -> Result<ClientConfig> {
    if let Some(path) = opts.config_path.as_ref() {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            let v: toml::Value = toml::from_str(&s)?;
            if let Some(url) = v.get("base_url").and_then(|x| x.as_str()) {
                base.base_url = url.to_string();
            }
            if let Some(prefix) = v.get("api_prefix").and_then(|x| x.as_str()) {
                base.api_prefix = prefix.to_string();
            }
            if let Some(ms) = v.get("retry_after_ms").and_then(|x| x.as_integer()) {
                base.retry_after = Duration::from_millis(ms as u64);
            }
            if let Some(max) = v.get("max_status_checks").and_then(|x| x.as_integer()) {
                base.max_status_checks = Some(max as u32);
            }
            if let Some(custom) = v.get("custom_regulator").and_then(|x| x.as_bool()) {
                base.custom_regulator = custom;
            }
        }
    }

    // env vars override file
    if let Ok(url) = std::env::var("DORINA_BASE_URL") {
        base.base_url = url;
    }
    if let Ok(prefix) = std::env::var("DORINA_API_PREFIX") {
        base.api_prefix = prefix;
    }
    if let Ok(ms) = std::env::var("DORINA_RETRY_AFTER_MS") {
        if let Ok(v) = ms.parse::<u64>() {
            base.retry_after = Duration::from_millis(v);
        }
    }
    if let Ok(max) = std::env::var("DORINA_MAX_STATUS_CHECKS") {
        if let Ok(v) = max.parse::<u32>() {
            base.max_status_checks = Some(v);
        }
    }

    // CLI overrides everything
    if let Some(url) = opts.cli_base_url {
        base.base_url = url;
    }
    if let Some(prefix) = opts.cli_api_prefix {
        base.api_prefix = prefix;
    }
    if let Some(ms) = opts.cli_retry_after_ms {
        base.retry_after = Duration::from_millis(ms);
    }
    if let Some(max) = opts.cli_max_status_checks {
        base.max_status_checks = Some(max);
    }

    Ok(base)
}

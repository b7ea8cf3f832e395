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

//! Regulator catalogue fetch and normalization.
//!
//! The regulators endpoint answers in two historical shapes: a flat map of
//! regulator id to entry, and an older layout nesting those maps under the
//! experiment kind (`{"RBP": {...}, "miRNA": {...}}`). Both normalize into
//! one sorted list. Sessions with an uploaded custom regulator additionally
//! get a synthetic CUSTOM entry tagged with the session uuid, ahead of the
//! fetched list.

use anyhow::{bail, Result};
use serde_json::Value;

use crate::transport::SearchTransport;
use crate::Regulator;

/// Experiment kinds used by the nested (older) wire shape.
const NESTED_KINDS: [&str; 2] = ["RBP", "miRNA"];

fn entry_from_value(id: &str, value: &Value, fallback_experiment: &str) -> Regulator {
    let mut entry: Regulator = serde_json::from_value(value.clone()).unwrap_or_default();
    entry.id = id.to_string();
    if entry.experiment.is_empty() {
        entry.experiment = fallback_experiment.to_string();
    }
    entry
}

fn is_nested(map: &serde_json::Map<String, Value>) -> bool {
    !map.is_empty()
        && map
            .keys()
            .all(|key| NESTED_KINDS.contains(&key.as_str()))
}

/// Normalize either wire shape into a list sorted case-insensitively by
/// summary (ties by id, for a stable order).
pub fn normalize_regulators(raw: &Value) -> Result<Vec<Regulator>> {
    let map = match raw.as_object() {
        Some(map) => map,
        None => bail!("regulator listing is not a JSON object"),
    };

    let mut regulators = Vec::new();
    if is_nested(map) {
        for (kind, entries) in map {
            if let Some(entries) = entries.as_object() {
                for (id, value) in entries {
                    regulators.push(entry_from_value(id, value, kind));
                }
            }
        }
    } else {
        for (id, value) in map {
            regulators.push(entry_from_value(id, value, ""));
        }
    }

    regulators.sort_by(|a, b| {
        (a.summary.to_uppercase(), &a.id).cmp(&(b.summary.to_uppercase(), &b.id))
    });
    Ok(regulators)
}

/// The synthetic entry standing in for a user-uploaded regulator.
pub fn custom_regulator_entry(uuid: &str) -> Regulator {
    Regulator {
        id: uuid.to_string(),
        experiment: "CUSTOM".to_string(),
        summary: "uploaded custom regulator".to_string(),
        description: "Custom regulator uploaded by user".to_string(),
        sites: None,
        file: None,
    }
}

/// Fetch and normalize the catalogue for one assembly. With `custom_uuid`
/// set, the synthetic CUSTOM entry leads the list.
pub async fn fetch_regulators(
    transport: &dyn SearchTransport,
    assembly: &str,
    custom_uuid: Option<&str>,
) -> Result<Vec<Regulator>> {
    let raw = transport.regulators(assembly).await?;
    let mut regulators = normalize_regulators(&raw)?;
    if let Some(uuid) = custom_uuid {
        regulators.insert(0, custom_regulator_entry(uuid));
    }
    tracing::debug!(assembly, count = regulators.len(), "fetched regulators");
    Ok(regulators)
}

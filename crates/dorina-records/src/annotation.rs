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

//! Decoding of the packed annotation token (field 12 of a result line).
//!
//! Tokens come in three historical flavors, tried in precedence order:
//! the packed `source#track*site` form, a legacy `track|source` form, and a
//! bare track name for user-uploaded regulators. The rule order is part of
//! the wire contract and must not change.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Placeholder used wherever a name is missing entirely.
pub const UNKNOWN: &str = "unknown";

/// Decoded form of one annotation token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub data_source: String,
    pub track: String,
    pub site: String,
}

// Greedy on purpose: for tokens with repeated separators the longest
// source/track split wins, matching the upstream service.
static PACKED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.*)#(.*)\*(.*)").expect("packed annotation pattern"));

/// `source#track*site`; each segment may be empty.
fn packed_rule(token: &str) -> Option<Annotation> {
    PACKED.captures(token).map(|caps| Annotation {
        data_source: caps[1].to_string(),
        track: caps[2].to_string(),
        site: caps[3].to_string(),
    })
}

/// Legacy `track|source` tokens. The track name doubles as the site name;
/// only the text between the first and second `|` counts as the source.
fn piped_rule(token: &str) -> Option<Annotation> {
    if !token.contains('|') {
        return None;
    }
    let mut parts = token.split('|');
    let track = parts.next().unwrap_or_default();
    let data_source = parts.next().unwrap_or_default();
    Some(Annotation {
        data_source: data_source.to_string(),
        track: track.to_string(),
        site: track.to_string(),
    })
}

/// Bare tokens belong to user-uploaded (CUSTOM) regulators.
fn plain_rule(token: &str) -> Annotation {
    let name = if token.is_empty() { UNKNOWN } else { token };
    Annotation {
        data_source: "CUSTOM".to_string(),
        track: name.to_string(),
        site: name.to_string(),
    }
}

/// Decode one annotation token, first matching rule wins.
pub fn decode(token: &str) -> Annotation {
    packed_rule(token)
        .or_else(|| piped_rule(token))
        .unwrap_or_else(|| plain_rule(token))
}

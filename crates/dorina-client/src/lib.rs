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

//! Async client for doRiNA-style genomic-regulator annotation search
//! services.
//!
//! The flow is: build a [`SearchQuery`] from a [`SearchSelection`], submit it
//! as an asynchronous job, poll the job status until it leaves `pending`,
//! then page through the result list. Each raw result line is decoded by
//! `dorina-records`. The pieces are usable on their own
//! ([`session::PollingSession`], [`results::PaginationTracker`]) or wired
//! together by [`client::SearchClient`], which also enforces that only the
//! most recently submitted search writes into the shared result state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod client;
pub mod config;
pub mod query;
pub mod regulators;
pub mod results;
pub mod session;
pub mod test_utils;
pub mod transport;

pub use client::SearchClient;
pub use config::{load_client_config, ClientConfig, MergeOpts};
pub use query::build_search_query;
pub use results::PaginationTracker;
pub use session::{PollingSession, SessionError, SessionHandle, SessionState};
pub use transport::{HttpTransport, SearchTransport};

/// Job state string marking a search as still running. Anything else is
/// terminal.
pub const PENDING_STATE: &str = "pending";

/// Match filter for a regulator set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    #[default]
    #[serde(rename = "any")]
    Any,
    #[serde(rename = "all")]
    All,
}

/// Genomic region a regulator set is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionFilter {
    #[default]
    #[serde(rename = "any")]
    Any,
    #[serde(rename = "CDS")]
    Cds,
    #[serde(rename = "3prime")]
    ThreePrime,
    #[serde(rename = "5prime")]
    FivePrime,
    #[serde(rename = "intron")]
    Intron,
    #[serde(rename = "intergenic")]
    Intergenic,
}

/// Set operation combining set A and set B.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinatorialOp {
    #[default]
    Or,
    And,
    Xor,
    Not,
}

impl CombinatorialOp {
    /// Human-readable description of the operation.
    pub fn describe(self) -> &'static str {
        match self {
            CombinatorialOp::Or => "found in set A or set B",
            CombinatorialOp::And => "found in set A and set B",
            CombinatorialOp::Xor => "found either in set A or in set B, but not in both",
            CombinatorialOp::Not => "found in set A but not in set B",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchMode::Any => "any",
            MatchMode::All => "all",
        })
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(MatchMode::Any),
            "all" => Ok(MatchMode::All),
            other => Err(format!("unknown match mode: {other}")),
        }
    }
}

impl fmt::Display for RegionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RegionFilter::Any => "any",
            RegionFilter::Cds => "CDS",
            RegionFilter::ThreePrime => "3prime",
            RegionFilter::FivePrime => "5prime",
            RegionFilter::Intron => "intron",
            RegionFilter::Intergenic => "intergenic",
        })
    }
}

impl FromStr for RegionFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(RegionFilter::Any),
            "CDS" => Ok(RegionFilter::Cds),
            "3prime" => Ok(RegionFilter::ThreePrime),
            "5prime" => Ok(RegionFilter::FivePrime),
            "intron" => Ok(RegionFilter::Intron),
            "intergenic" => Ok(RegionFilter::Intergenic),
            other => Err(format!("unknown region filter: {other}")),
        }
    }
}

impl fmt::Display for CombinatorialOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CombinatorialOp::Or => "or",
            CombinatorialOp::And => "and",
            CombinatorialOp::Xor => "xor",
            CombinatorialOp::Not => "not",
        })
    }
}

impl FromStr for CombinatorialOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "or" => Ok(CombinatorialOp::Or),
            "and" => Ok(CombinatorialOp::And),
            "xor" => Ok(CombinatorialOp::Xor),
            "not" => Ok(CombinatorialOp::Not),
            other => Err(format!("unknown combinatorial op: {other}")),
        }
    }
}

/// Snapshot of the user's current selections. Plain values handed in by the
/// embedding UI; [`build_search_query`] turns one into the wire payload.
#[derive(Debug, Clone, Default)]
pub struct SearchSelection {
    pub set_a: Vec<String>,
    pub assembly: String,
    pub match_a: MatchMode,
    pub region_a: RegionFilter,
    pub genes: Vec<String>,
    pub offset: u64,
    pub use_window_a: bool,
    pub window_a: u64,
    pub set_b: Vec<String>,
    pub match_b: MatchMode,
    pub region_b: RegionFilter,
    pub combinatorial_op: CombinatorialOp,
    pub use_window_b: bool,
    pub window_b: u64,
    /// Session uuid, echoed on every submission once the backend assigned
    /// one.
    pub uuid: Option<String>,
}

impl SearchSelection {
    /// Restore filter defaults for a brand-new search. The regulator sets,
    /// assembly and session uuid are kept.
    pub fn reset_search_state(&mut self) {
        self.offset = 0;
        self.match_a = MatchMode::Any;
        self.match_b = MatchMode::Any;
        self.region_a = RegionFilter::Any;
        self.region_b = RegionFilter::Any;
        self.genes.clear();
    }
}

/// The optional set-B block. All five fields travel together; the block is
/// present iff the set-B regulator selection is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetBBlock {
    pub set_b: Vec<String>,
    pub match_b: MatchMode,
    pub region_b: RegionFilter,
    pub combinatorial_op: CombinatorialOp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_b: Option<u64>,
}

/// Wire payload for `POST {prefix}/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub set_a: Vec<String>,
    pub assembly: String,
    pub match_a: MatchMode,
    pub region_a: RegionFilter,
    pub genes: Vec<String>,
    pub offset: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_a: Option<u64>,
    #[serde(flatten)]
    pub set_b: Option<SetBBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

/// Response of the submit and status endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchStatus {
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl SearchStatus {
    pub fn is_pending(&self) -> bool {
        self.state == PENDING_STATE
    }
}

/// One page of raw result lines. Every field defaults so that the expired-
/// session answer (`{uuid, state: "expired"}`) parses into an empty page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default)]
    pub results: Vec<String>,
    #[serde(default)]
    pub more_results: bool,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u64>,
}

/// One entry of the regulator catalogue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Regulator {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub experiment: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sites: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Genome entry from the older browse API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Genome {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub scientific: String,
}

/// Assembly entry from the older browse API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Assembly {
    pub id: String,
    #[serde(default)]
    pub genome: String,
    #[serde(default)]
    pub weight: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for region in [
            RegionFilter::Any,
            RegionFilter::Cds,
            RegionFilter::ThreePrime,
            RegionFilter::FivePrime,
            RegionFilter::Intron,
            RegionFilter::Intergenic,
        ] {
            let name = region.to_string();
            assert_eq!(name.parse::<RegionFilter>().unwrap(), region);
            let json = serde_json::to_string(&region).unwrap();
            assert_eq!(json, format!("\"{name}\""));
        }
        assert_eq!("all".parse::<MatchMode>().unwrap(), MatchMode::All);
        assert_eq!(
            serde_json::to_string(&CombinatorialOp::Xor).unwrap(),
            "\"xor\""
        );
    }

    #[test]
    fn describe_covers_every_operation() {
        assert_eq!(CombinatorialOp::Or.describe(), "found in set A or set B");
        assert_eq!(CombinatorialOp::And.describe(), "found in set A and set B");
        assert_eq!(
            CombinatorialOp::Xor.describe(),
            "found either in set A or in set B, but not in both"
        );
        assert_eq!(
            CombinatorialOp::Not.describe(),
            "found in set A but not in set B"
        );
    }

    #[test]
    fn reset_keeps_sets_and_uuid() {
        let mut sel = SearchSelection {
            set_a: vec!["fake_rbp".into()],
            assembly: "hg19".into(),
            match_a: MatchMode::All,
            region_a: RegionFilter::Cds,
            genes: vec!["gene01".into()],
            offset: 23,
            uuid: Some("fake-uuid".into()),
            ..Default::default()
        };
        sel.reset_search_state();
        assert_eq!(sel.offset, 0);
        assert_eq!(sel.match_a, MatchMode::Any);
        assert_eq!(sel.region_a, RegionFilter::Any);
        assert!(sel.genes.is_empty());
        assert_eq!(sel.set_a, vec!["fake_rbp".to_string()]);
        assert_eq!(sel.uuid.as_deref(), Some("fake-uuid"));
    }

    #[test]
    fn expired_result_page_parses_with_defaults() {
        let page: ResultPage =
            serde_json::from_str(r#"{"uuid": "fake-uuid", "state": "expired"}"#).unwrap();
        assert_eq!(page.state.as_deref(), Some("expired"));
        assert!(page.results.is_empty());
        assert!(!page.more_results);
        assert_eq!(page.total_results, 0);
        assert!(page.next_offset.is_none());
    }
}

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

//! One decoded result row.
//!
//! Rows arrive as tab-separated lines; trailing fields may be truncated and
//! no field past index 8 is guaranteed. Every accessor checks the field
//! count itself and falls back to a documented sentinel, so a short line is
//! never an error. The only error condition is a non-empty attributes field
//! (index 8) that does not carry an `ID=` tag: the backend abuses that slot
//! for free-text diagnostics like `No results found`. Such a record enters a
//! permanent error state in which every accessor except [`ResultRecord::gene`]
//! returns the empty string and `gene()` passes the raw text through.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::annotation::{self, Annotation, UNKNOWN};

/// Sentinel token used when field 12 is missing; decodes to all-`unknown`.
pub const MISSING_ANNOTATION: &str = "unknown#unknown*unknown";

/// `ID=<gene>` terminated by end of string or the next `;key=value` pair.
static GENE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ID=(.*?)($|;\w+.*?=.*)").expect("gene id pattern"));

/// A single result row. Immutable once parsed; gene extraction and
/// annotation decoding happen at construction and are memoized.
#[derive(Debug, Clone)]
pub struct ResultRecord {
    cols: Vec<String>,
    gene: String,
    error_state: bool,
    annotation: Annotation,
}

impl ResultRecord {
    /// Split a raw line on tabs and derive the memoized fields. Absent
    /// trailing fields stay absent; the line is never padded.
    pub fn parse(line: &str) -> Self {
        let cols: Vec<String> = line.split('\t').map(str::to_string).collect();
        let (gene, error_state) = extract_gene(&cols);
        let token = raw_annotations(&cols);
        let annotation = annotation::decode(token);
        Self {
            cols,
            gene,
            error_state,
            annotation,
        }
    }

    /// Raw positional fields, for callers that render the row as-is.
    pub fn fields(&self) -> &[String] {
        &self.cols
    }

    /// True once the attributes field was found malformed. Never cleared.
    pub fn error_state(&self) -> bool {
        self.error_state
    }

    /// The raw annotation token (field 12). Not blanked by the error state;
    /// it is the decoded views below that collapse.
    pub fn annotations(&self) -> &str {
        raw_annotations(&self.cols)
    }

    /// Gene id extracted from the attributes field. In the error state this
    /// is the raw malformed text, kept for diagnosis.
    pub fn gene(&self) -> &str {
        &self.gene
    }

    pub fn data_source(&self) -> &str {
        if self.error_state {
            ""
        } else {
            &self.annotation.data_source
        }
    }

    pub fn track(&self) -> &str {
        if self.error_state {
            ""
        } else {
            &self.annotation.track
        }
    }

    pub fn site(&self) -> &str {
        if self.error_state {
            ""
        } else {
            &self.annotation.site
        }
    }

    pub fn score(&self) -> &str {
        if self.error_state {
            ""
        } else if self.cols.len() > 13 {
            &self.cols[13]
        } else {
            "-1"
        }
    }

    /// `<chrom>:<start>-<end>` of the regulator match (fields 0, 3, 4).
    pub fn location(&self) -> String {
        if self.error_state {
            String::new()
        } else if self.cols.len() < 5 {
            format!("{UNKNOWN}:0-0")
        } else {
            format!("{}:{}-{}", self.cols[0], self.cols[3], self.cols[4])
        }
    }

    /// `<chrom>:<start>-<end>` of the target feature (fields 9, 10, 11).
    pub fn feature_location(&self) -> String {
        if self.error_state {
            String::new()
        } else if self.cols.len() < 12 {
            format!("{UNKNOWN}:0-0")
        } else {
            format!("{}:{}-{}", self.cols[9], self.cols[10], self.cols[11])
        }
    }

    pub fn strand(&self) -> &str {
        if self.error_state {
            ""
        } else if self.cols.len() > 6 {
            &self.cols[6]
        } else {
            "."
        }
    }

    pub fn feature_strand(&self) -> &str {
        if self.error_state {
            ""
        } else if self.cols.len() > 14 {
            &self.cols[14]
        } else {
            "."
        }
    }

    /// Snapshot of every derived field, for serialization.
    pub fn decoded(&self) -> DecodedRecord {
        DecodedRecord {
            location: self.location(),
            gene: self.gene.clone(),
            score: self.score().to_string(),
            strand: self.strand().to_string(),
            feature_location: self.feature_location(),
            feature_strand: self.feature_strand().to_string(),
            data_source: self.data_source().to_string(),
            track: self.track().to_string(),
            site: self.site().to_string(),
            annotations: self.annotations().to_string(),
            error: self.error_state,
        }
    }
}

impl From<&str> for ResultRecord {
    fn from(line: &str) -> Self {
        Self::parse(line)
    }
}

/// Serializable view of a fully decoded record.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedRecord {
    pub location: String,
    pub gene: String,
    pub score: String,
    pub strand: String,
    pub feature_location: String,
    pub feature_strand: String,
    pub data_source: String,
    pub track: String,
    pub site: String,
    pub annotations: String,
    pub error: bool,
}

fn raw_annotations(cols: &[String]) -> &str {
    if cols.len() > 12 {
        &cols[12]
    } else {
        MISSING_ANNOTATION
    }
}

/// Returns the gene id and whether the record is in the error state.
fn extract_gene(cols: &[String]) -> (String, bool) {
    if cols.len() < 9 {
        return (UNKNOWN.to_string(), false);
    }
    let keyvals = &cols[8];
    if let Some(caps) = GENE_ID.captures(keyvals) {
        return (caps[1].to_string(), false);
    }
    if keyvals.is_empty() {
        return (UNKNOWN.to_string(), false);
    }
    (keyvals.clone(), true)
}

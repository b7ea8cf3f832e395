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

//! Parsing core for doRiNA-style search results.
//!
//! A result line is a tab-separated, GFF-like row of up to 17 positional
//! fields. Field 12 packs the data source, track and binding-site names into
//! a single encoded token. This crate turns a raw line into a [`ResultRecord`]
//! and decodes the packed token into an [`Annotation`]; the orchestration
//! layer lives in `dorina-client`.

pub mod annotation;
pub mod record;

pub use annotation::{decode, Annotation};
pub use record::{DecodedRecord, ResultRecord};

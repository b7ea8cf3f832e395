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

//! Accumulation of paged results.
//!
//! The tracker is deliberately free of I/O: it decides what to fetch
//! ([`PaginationTracker::page_request`]) and folds fetched pages into its
//! state ([`PaginationTracker::apply_page`]), so the offset/accumulation
//! rules are testable without a transport and the caller controls where the
//! network call happens.

use dorina_records::ResultRecord;

use crate::ResultPage;

/// Result collection and paging state for one search session.
#[derive(Debug)]
pub struct PaginationTracker {
    uuid: String,
    offset: u64,
    more_results: bool,
    total_results: u64,
    records: Vec<ResultRecord>,
}

impl PaginationTracker {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            offset: 0,
            more_results: false,
            total_results: 0,
            records: Vec::new(),
        }
    }

    /// Uuid echoed on every page request of this session.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn more_results(&self) -> bool {
        self.more_results
    }

    pub fn total_results(&self) -> u64 {
        self.total_results
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    /// What to fetch next: the session uuid plus, for a load-more request,
    /// the stored offset to append to the result path.
    pub fn page_request(&self, more: bool) -> (String, Option<u64>) {
        let offset = if more { Some(self.offset) } else { None };
        (self.uuid.clone(), offset)
    }

    /// Fold one fetched page into the collection; returns the number of
    /// records appended. The offset advances only when the backend both
    /// reports more results and names the next offset; a stale `next_offset`
    /// on the final page is ignored.
    pub fn apply_page(&mut self, page: ResultPage) -> usize {
        self.more_results = page.more_results;
        self.total_results = page.total_results;
        let added = page.results.len();
        self.records
            .extend(page.results.iter().map(|line| ResultRecord::parse(line)));
        if page.more_results {
            match page.next_offset {
                Some(next) => self.offset = next,
                None => {
                    tracing::debug!(
                        uuid = %self.uuid,
                        "more results reported without next_offset; offset unchanged"
                    );
                }
            }
        }
        tracing::debug!(
            uuid = %self.uuid,
            added,
            total = self.total_results,
            more = self.more_results,
            offset = self.offset,
            "applied result page"
        );
        added
    }

    /// Rebind the tracker to a freshly submitted search. Accumulated records
    /// are kept only when the caller asked for it; paging counters are left
    /// to the first applied page.
    pub fn begin_session(&mut self, uuid: impl Into<String>, keep_data: bool) {
        self.uuid = uuid.into();
        if !keep_data {
            self.records.clear();
        }
    }

    /// Drop accumulated results and restore the paging defaults, keeping the
    /// session uuid.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.more_results = false;
        self.total_results = 0;
        self.records.clear();
    }
}

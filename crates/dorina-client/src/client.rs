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

//! Orchestration context.
//!
//! [`SearchClient`] ties query building, polling and pagination together and
//! owns the shared observable result state. Submitting a new search
//! supersedes the previous session; a page is only folded into the shared
//! state while its session uuid still matches the active one, so a slow or
//! abandoned session can never clobber the results of a newer search.

use anyhow::{bail, Context, Result};
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::query::build_search_query;
use crate::regulators;
use crate::results::PaginationTracker;
use crate::session::{PollingSession, SessionHandle};
use crate::transport::{HttpTransport, SearchTransport};
use crate::{Regulator, ResultPage, SearchSelection, SearchStatus};

/// One client per service; holds the transport, the shared result state and
/// the active-session tag.
pub struct SearchClient {
    transport: Arc<dyn SearchTransport>,
    config: ClientConfig,
    tracker: RwLock<PaginationTracker>,
    active: RwLock<Option<SessionHandle>>,
}

impl SearchClient {
    pub fn new(transport: Arc<dyn SearchTransport>, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            tracker: RwLock::new(PaginationTracker::new(String::new())),
            active: RwLock::new(None),
        }
    }

    /// Convenience constructor wiring up the HTTP transport.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self::new(transport, config))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Read access to the accumulated results and paging state.
    pub fn results(&self) -> RwLockReadGuard<'_, PaginationTracker> {
        self.tracker.read()
    }

    /// Uuid of the most recently submitted search, if any.
    pub fn active_uuid(&self) -> Option<String> {
        self.active.read().as_ref().map(|h| h.uuid().to_string())
    }

    /// Submit a search, poll it to a terminal state and fetch the first
    /// result page. With `keep_data` false the accumulated results are
    /// cleared for the new search; with true they are kept and appended to.
    /// Any still-running previous session is superseded.
    pub async fn run_search(
        &self,
        selection: &SearchSelection,
        keep_data: bool,
    ) -> Result<SearchStatus> {
        let query = build_search_query(selection);
        tracing::info!(
            assembly = %query.assembly,
            set_a = query.set_a.len(),
            set_b = query.set_b.as_ref().map(|b| b.set_b.len()).unwrap_or(0),
            "submitting search"
        );
        let submitted = self.transport.submit(&query).await?;
        let uuid = submitted
            .uuid
            .clone()
            .context("search submission did not return a uuid")?;

        let (mut session, handle) =
            PollingSession::new(self.transport.clone(), uuid.clone(), &self.config);
        {
            let mut active = self.active.write();
            if let Some(prev) = active.replace(handle) {
                tracing::debug!(uuid = %prev.uuid(), "superseding previous search session");
                prev.supersede();
            }
        }
        self.tracker.write().begin_session(uuid.clone(), keep_data);

        let status = session
            .wait_until_terminal()
            .await
            .map_err(anyhow::Error::new)?;

        let page = self.transport.result_page(&uuid, None).await?;
        self.apply_page_if_active(&uuid, page);
        Ok(status)
    }

    /// Fetch the next page at the stored offset and append it. Returns the
    /// number of records added (zero when the session went stale meanwhile).
    pub async fn load_more(&self) -> Result<usize> {
        let (uuid, offset) = self.tracker.read().page_request(true);
        if uuid.is_empty() {
            bail!("no search session to load more results from");
        }
        let page = self.transport.result_page(&uuid, offset).await?;
        Ok(self.apply_page_if_active(&uuid, page))
    }

    /// Regulator catalogue for an assembly; injects the synthetic CUSTOM
    /// entry when this session carries an uploaded regulator.
    pub async fn fetch_regulators(&self, assembly: &str) -> Result<Vec<Regulator>> {
        let custom = if self.config.custom_regulator {
            self.active_uuid()
        } else {
            None
        };
        regulators::fetch_regulators(self.transport.as_ref(), assembly, custom.as_deref()).await
    }

    /// Gene-name completion for an assembly.
    pub async fn fetch_genes(&self, assembly: &str, query: &str) -> Result<Vec<String>> {
        self.transport.genes(assembly, query).await
    }

    /// Raw TSV export of the active session's results.
    pub async fn download_results(&self) -> Result<String> {
        let uuid = self.tracker.read().uuid().to_string();
        if uuid.is_empty() {
            bail!("no search session to download results from");
        }
        self.transport.download_results(&uuid).await
    }

    /// Fold a page into the shared state unless a newer search took over.
    fn apply_page_if_active(&self, uuid: &str, page: ResultPage) -> usize {
        let still_active = self
            .active
            .read()
            .as_ref()
            .map(|h| h.uuid() == uuid)
            .unwrap_or(false);
        if !still_active {
            tracing::debug!(uuid, "dropping result page from superseded session");
            return 0;
        }
        self.tracker.write().apply_page(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedTransport;
    use crate::PENDING_STATE;
    use std::time::Duration;

    fn fast_config() -> ClientConfig {
        ClientConfig {
            retry_after: Duration::from_millis(1),
            ..ClientConfig::default()
        }
    }

    fn page(lines: &[&str], more: bool, next_offset: Option<u64>) -> ResultPage {
        ResultPage {
            state: Some("done".into()),
            results: lines.iter().map(|l| l.to_string()).collect(),
            more_results: more,
            total_results: lines.len() as u64,
            next_offset,
        }
    }

    fn selection() -> SearchSelection {
        SearchSelection {
            set_a: vec!["fake_rbp".into()],
            assembly: "hg19".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn run_search_polls_then_fetches() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_submit("fake-uuid", PENDING_STATE);
        transport.push_status(PENDING_STATE);
        transport.push_status("done");
        transport.push_page(page(&["chr1\t\t\t1\t100\t.\t+\t.\tID=g1"], false, None));

        let client = SearchClient::new(transport.clone(), fast_config());
        let status = client.run_search(&selection(), false).await.expect("search");
        assert_eq!(status.state, "done");
        assert_eq!(client.results().records().len(), 1);
        assert_eq!(client.results().records()[0].gene(), "g1");
        assert_eq!(client.active_uuid().as_deref(), Some("fake-uuid"));
        assert_eq!(
            transport.calls(),
            vec![
                "submit",
                "status/fake-uuid",
                "status/fake-uuid",
                "result/fake-uuid"
            ]
        );
    }

    #[tokio::test]
    async fn load_more_appends_at_the_stored_offset() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_submit("fake-uuid", PENDING_STATE);
        transport.push_status("done");
        transport.push_page(page(
            &["chr1\t\t\t1\t100\t.\t+\t.\tID=g1"],
            true,
            Some(23),
        ));
        transport.push_page(page(&["chr2\t\t\t5\t50\t.\t-\t.\tID=g2"], false, None));

        let client = SearchClient::new(transport.clone(), fast_config());
        client.run_search(&selection(), false).await.expect("search");
        assert_eq!(client.results().offset(), 23);
        let added = client.load_more().await.expect("load more");
        assert_eq!(added, 1);
        assert_eq!(client.results().records().len(), 2);
        assert!(transport
            .calls()
            .contains(&"result/fake-uuid/23".to_string()));
    }

    #[tokio::test]
    async fn keep_data_controls_result_clearing() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = SearchClient::new(transport.clone(), fast_config());

        transport.push_submit("uuid-1", PENDING_STATE);
        transport.push_status("done");
        transport.push_page(page(&["chr1\t\t\t1\t100\t.\t+\t.\tID=g1"], false, None));
        client.run_search(&selection(), false).await.expect("first");
        assert_eq!(client.results().records().len(), 1);

        // keep_data = true appends the second search's records
        transport.push_submit("uuid-2", PENDING_STATE);
        transport.push_status("done");
        transport.push_page(page(&["chr2\t\t\t5\t50\t.\t-\t.\tID=g2"], false, None));
        client.run_search(&selection(), true).await.expect("second");
        assert_eq!(client.results().records().len(), 2);

        // keep_data = false starts over
        transport.push_submit("uuid-3", PENDING_STATE);
        transport.push_status("done");
        transport.push_page(page(&["chr3\t\t\t7\t70\t.\t+\t.\tID=g3"], false, None));
        client.run_search(&selection(), false).await.expect("third");
        assert_eq!(client.results().records().len(), 1);
        assert_eq!(client.results().records()[0].gene(), "g3");
    }

    #[tokio::test]
    async fn load_more_without_a_session_is_an_error() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = SearchClient::new(transport, fast_config());
        assert!(client.load_more().await.is_err());
    }

    #[tokio::test]
    async fn submission_without_uuid_is_an_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_status("done"); // submit answer with no uuid
        let client = SearchClient::new(transport, fast_config());
        let err = client.run_search(&selection(), false).await.unwrap_err();
        assert!(err.to_string().contains("uuid"));
    }

    #[tokio::test]
    async fn expired_session_yields_an_empty_page() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_submit("fake-uuid", PENDING_STATE);
        transport.push_status("expired");
        transport.push_page(ResultPage {
            state: Some("expired".into()),
            ..ResultPage::default()
        });
        let client = SearchClient::new(transport, fast_config());
        let status = client.run_search(&selection(), false).await.expect("search");
        assert_eq!(status.state, "expired");
        assert!(client.results().records().is_empty());
        assert!(!client.results().more_results());
    }
}

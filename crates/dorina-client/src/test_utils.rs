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

//! Test utilities for dorina-client.
//!
//! [`ScriptedTransport`] implements [`SearchTransport`] from a queue of
//! canned responses and records every call it serves, so tests can assert
//! both payloads and call ordering without a live service. Panics on a
//! script mismatch; it is test infrastructure, not production code.

use std::collections::VecDeque;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::transport::SearchTransport;
use crate::{Assembly, Genome, ResultPage, SearchQuery, SearchStatus};

#[derive(Debug)]
enum ScriptedResponse {
    Status(SearchStatus),
    Page(ResultPage),
    Regulators(Value),
    Genes(Vec<String>),
    Genomes(Vec<Genome>),
    Assemblies(Vec<Assembly>),
    Download(String),
    Error(String),
}

#[derive(Default)]
struct Script {
    responses: VecDeque<ScriptedResponse>,
    calls: Vec<String>,
    submissions: Vec<SearchQuery>,
}

/// Scripted fake transport; responses are served strictly in push order.
#[derive(Default)]
pub struct ScriptedTransport {
    inner: Mutex<Script>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a submit/status response.
    pub fn push_submit(&self, uuid: &str, state: &str) {
        self.push(ScriptedResponse::Status(SearchStatus {
            state: state.to_string(),
            uuid: Some(uuid.to_string()),
        }));
    }

    /// Script a status response with only a state string.
    pub fn push_status(&self, state: &str) {
        self.push(ScriptedResponse::Status(SearchStatus {
            state: state.to_string(),
            uuid: None,
        }));
    }

    pub fn push_page(&self, page: ResultPage) {
        self.push(ScriptedResponse::Page(page));
    }

    pub fn push_regulators(&self, raw: Value) {
        self.push(ScriptedResponse::Regulators(raw));
    }

    pub fn push_genes(&self, genes: &[&str]) {
        self.push(ScriptedResponse::Genes(
            genes.iter().map(|g| g.to_string()).collect(),
        ));
    }

    pub fn push_genomes(&self, genomes: Vec<Genome>) {
        self.push(ScriptedResponse::Genomes(genomes));
    }

    pub fn push_assemblies(&self, assemblies: Vec<Assembly>) {
        self.push(ScriptedResponse::Assemblies(assemblies));
    }

    pub fn push_download(&self, body: &str) {
        self.push(ScriptedResponse::Download(body.to_string()));
    }

    /// Script a transport failure for the next call, whatever it is.
    pub fn push_error(&self, message: &str) {
        self.push(ScriptedResponse::Error(message.to_string()));
    }

    /// Calls served so far, in order, as `status/<uuid>`-style paths.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().calls.clone()
    }

    /// Payloads of every submit call served so far.
    pub fn submissions(&self) -> Vec<SearchQuery> {
        self.inner.lock().submissions.clone()
    }

    fn push(&self, response: ScriptedResponse) {
        self.inner.lock().responses.push_back(response);
    }

    fn next_for(&self, call: String) -> ScriptedResponse {
        let mut inner = self.inner.lock();
        inner.calls.push(call.clone());
        match inner.responses.pop_front() {
            Some(response) => response,
            None => panic!("scripted transport: no response scripted for {call}"),
        }
    }
}

fn unexpected(call: &str, got: ScriptedResponse) -> ! {
    panic!("scripted transport: mismatched response for {call}: {got:?}")
}

#[async_trait]
impl SearchTransport for ScriptedTransport {
    async fn submit(&self, query: &SearchQuery) -> Result<SearchStatus> {
        self.inner.lock().submissions.push(query.clone());
        match self.next_for("submit".to_string()) {
            ScriptedResponse::Status(status) => Ok(status),
            ScriptedResponse::Error(message) => Err(anyhow!(message)),
            other => unexpected("submit", other),
        }
    }

    async fn status(&self, uuid: &str) -> Result<SearchStatus> {
        let call = format!("status/{uuid}");
        match self.next_for(call.clone()) {
            ScriptedResponse::Status(status) => Ok(status),
            ScriptedResponse::Error(message) => Err(anyhow!(message)),
            other => unexpected(&call, other),
        }
    }

    async fn result_page(&self, uuid: &str, offset: Option<u64>) -> Result<ResultPage> {
        let call = match offset {
            Some(offset) => format!("result/{uuid}/{offset}"),
            None => format!("result/{uuid}"),
        };
        match self.next_for(call.clone()) {
            ScriptedResponse::Page(page) => Ok(page),
            ScriptedResponse::Error(message) => Err(anyhow!(message)),
            other => unexpected(&call, other),
        }
    }

    async fn regulators(&self, assembly: &str) -> Result<Value> {
        let call = format!("regulators/{assembly}");
        match self.next_for(call.clone()) {
            ScriptedResponse::Regulators(raw) => Ok(raw),
            ScriptedResponse::Error(message) => Err(anyhow!(message)),
            other => unexpected(&call, other),
        }
    }

    async fn genes(&self, assembly: &str, query: &str) -> Result<Vec<String>> {
        let call = format!("genes/{assembly}/{query}");
        match self.next_for(call.clone()) {
            ScriptedResponse::Genes(genes) => Ok(genes),
            ScriptedResponse::Error(message) => Err(anyhow!(message)),
            other => unexpected(&call, other),
        }
    }

    async fn genomes(&self) -> Result<Vec<Genome>> {
        match self.next_for("genomes".to_string()) {
            ScriptedResponse::Genomes(genomes) => Ok(genomes),
            ScriptedResponse::Error(message) => Err(anyhow!(message)),
            other => unexpected("genomes", other),
        }
    }

    async fn assemblies(&self, genome: &str) -> Result<Vec<Assembly>> {
        let call = format!("assemblies/{genome}");
        match self.next_for(call.clone()) {
            ScriptedResponse::Assemblies(assemblies) => Ok(assemblies),
            ScriptedResponse::Error(message) => Err(anyhow!(message)),
            other => unexpected(&call, other),
        }
    }

    async fn download_results(&self, uuid: &str) -> Result<String> {
        let call = format!("download/results/{uuid}");
        match self.next_for(call.clone()) {
            ScriptedResponse::Download(body) => Ok(body),
            ScriptedResponse::Error(message) => Err(anyhow!(message)),
            other => unexpected(&call, other),
        }
    }
}

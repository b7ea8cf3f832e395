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

//! Network seam of the client.
//!
//! Everything that crosses the wire goes through [`SearchTransport`], so the
//! orchestration layer and its tests never depend on a live service; the
//! scripted fake in `test_utils` implements the same trait. [`HttpTransport`]
//! is the production implementation on `reqwest`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::{Assembly, Genome, ResultPage, SearchQuery, SearchStatus};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// The service endpoints the client needs. Object-safe so orchestration code
/// can hold an `Arc<dyn SearchTransport>`.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    /// `POST {prefix}/search`
    async fn submit(&self, query: &SearchQuery) -> Result<SearchStatus>;

    /// `GET {prefix}/status/{uuid}`
    async fn status(&self, uuid: &str) -> Result<SearchStatus>;

    /// `GET {prefix}/result/{uuid}[/{offset}]`
    async fn result_page(&self, uuid: &str, offset: Option<u64>) -> Result<ResultPage>;

    /// `GET {prefix}/regulators/{assembly}`. Returned raw; the catalogue
    /// module normalizes the two wire shapes.
    async fn regulators(&self, assembly: &str) -> Result<serde_json::Value>;

    /// `GET {prefix}/genes/{assembly}/{query}`
    async fn genes(&self, assembly: &str, query: &str) -> Result<Vec<String>>;

    /// `GET {prefix}/genomes`
    async fn genomes(&self) -> Result<Vec<Genome>>;

    /// `GET {prefix}/assemblies/{genome}`
    async fn assemblies(&self, genome: &str) -> Result<Vec<Assembly>>;

    /// `GET {prefix}/download/results/{uuid}`, the raw TSV export.
    async fn download_results(&self, uuid: &str) -> Result<String>;
}

#[derive(Deserialize)]
struct GenesResponse {
    #[serde(default)]
    genes: Vec<String>,
}

#[derive(Deserialize)]
struct GenomesResponse {
    #[serde(default)]
    genomes: Vec<Genome>,
}

#[derive(Deserialize)]
struct AssembliesResponse {
    #[serde(default)]
    assemblies: Vec<Assembly>,
}

/// HTTP implementation of [`SearchTransport`].
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_prefix: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_prefix: config.api_prefix.clone(),
        })
    }

    /// Join base url, optional API prefix and endpoint path.
    fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{base}/{path}")
        } else {
            format!("{base}/{prefix}/{path}")
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request error: GET {url}"))?;
        tracing::debug!(url = %url, status = %response.status(), "GET");
        if !response.status().is_success() {
            bail!("GET {} failed with status: {}", url, response.status());
        }
        response
            .json::<T>()
            .await
            .with_context(|| format!("json parse error: GET {url}"))
    }
}

#[async_trait]
impl SearchTransport for HttpTransport {
    async fn submit(&self, query: &SearchQuery) -> Result<SearchStatus> {
        let url = self.endpoint("search");
        let response = self
            .client
            .post(&url)
            .json(query)
            .send()
            .await
            .with_context(|| format!("request error: POST {url}"))?;
        tracing::debug!(url = %url, status = %response.status(), "POST search");
        if !response.status().is_success() {
            bail!("search submission failed with status: {}", response.status());
        }
        response
            .json::<SearchStatus>()
            .await
            .with_context(|| format!("json parse error: POST {url}"))
    }

    async fn status(&self, uuid: &str) -> Result<SearchStatus> {
        self.get_json(&format!("status/{uuid}")).await
    }

    async fn result_page(&self, uuid: &str, offset: Option<u64>) -> Result<ResultPage> {
        let path = match offset {
            Some(offset) => format!("result/{uuid}/{offset}"),
            None => format!("result/{uuid}"),
        };
        self.get_json(&path).await
    }

    async fn regulators(&self, assembly: &str) -> Result<serde_json::Value> {
        self.get_json(&format!("regulators/{assembly}")).await
    }

    async fn genes(&self, assembly: &str, query: &str) -> Result<Vec<String>> {
        let path = if query.is_empty() {
            format!("genes/{assembly}")
        } else {
            format!("genes/{assembly}/{query}")
        };
        let response: GenesResponse = self.get_json(&path).await?;
        Ok(response.genes)
    }

    async fn genomes(&self) -> Result<Vec<Genome>> {
        let response: GenomesResponse = self.get_json("genomes").await?;
        Ok(response.genomes)
    }

    async fn assemblies(&self, genome: &str) -> Result<Vec<Assembly>> {
        let response: AssembliesResponse =
            self.get_json(&format!("assemblies/{genome}")).await?;
        Ok(response.assemblies)
    }

    async fn download_results(&self, uuid: &str) -> Result<String> {
        let url = self.endpoint(&format!("download/results/{uuid}"));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request error: GET {url}"))?;
        if !response.status().is_success() {
            bail!("download failed with status: {}", response.status());
        }
        response
            .text()
            .await
            .with_context(|| format!("body read error: GET {url}"))
    }
}

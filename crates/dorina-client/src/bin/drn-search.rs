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
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use dorina_client::{
    load_client_config, ClientConfig, CombinatorialOp, MatchMode, MergeOpts, RegionFilter,
    SearchClient, SearchSelection,
};

/// Submit a regulator search, poll it to completion and print the decoded
/// results.
#[derive(Parser, Debug)]
#[clap(name = "drn-search")]
struct Opts {
    /// Genome assembly to search, e.g. hg19
    #[clap(long)]
    assembly: String,
    /// Set A regulator ids (repeat for several)
    #[clap(long = "set-a", required = true)]
    set_a: Vec<String>,
    /// Set B regulator ids; any value enables the combinatorial search
    #[clap(long = "set-b")]
    set_b: Vec<String>,
    /// Match mode for set A (any|all)
    #[clap(long, default_value = "any")]
    match_a: MatchMode,
    /// Region filter for set A (any|CDS|3prime|5prime|intron|intergenic)
    #[clap(long, default_value = "any")]
    region_a: RegionFilter,
    /// Match mode for set B
    #[clap(long, default_value = "any")]
    match_b: MatchMode,
    /// Region filter for set B
    #[clap(long, default_value = "any")]
    region_b: RegionFilter,
    /// Set operation combining A and B (or|and|xor|not)
    #[clap(long, default_value = "or")]
    combine: CombinatorialOp,
    /// Restrict the search to these genes (repeat for several; default: all)
    #[clap(long)]
    genes: Vec<String>,
    /// Widen set A matches by this many bases
    #[clap(long)]
    window_a: Option<u64>,
    /// Widen set B matches by this many bases
    #[clap(long)]
    window_b: Option<u64>,
    /// Result offset to start from
    #[clap(long, default_value = "0")]
    offset: u64,
    /// Session uuid to resume
    #[clap(long)]
    uuid: Option<String>,
    /// Keep paging until the backend reports no more results
    #[clap(long)]
    all: bool,
    /// Print decoded records as JSON instead of TSV
    #[clap(long)]
    json: bool,
    /// Also save the raw TSV export to this file
    #[clap(long)]
    download: Option<PathBuf>,
    /// Config file (TOML)
    #[clap(long)]
    config: Option<PathBuf>,
    /// Service root, e.g. http://localhost:5000
    #[clap(long)]
    base_url: Option<String>,
    /// API path prefix; empty for unversioned deployments
    #[clap(long)]
    api_prefix: Option<String>,
    /// Delay between status checks in milliseconds
    #[clap(long)]
    retry_after_ms: Option<u64>,
    /// Give up after this many status checks
    #[clap(long)]
    max_status_checks: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Opts::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_client_config(
        ClientConfig::default(),
        MergeOpts {
            config_path: opts.config.clone(),
            cli_base_url: opts.base_url.clone(),
            cli_api_prefix: opts.api_prefix.clone(),
            cli_retry_after_ms: opts.retry_after_ms,
            cli_max_status_checks: opts.max_status_checks,
        },
    )?;

    let selection = SearchSelection {
        set_a: opts.set_a,
        assembly: opts.assembly,
        match_a: opts.match_a,
        region_a: opts.region_a,
        genes: opts.genes,
        offset: opts.offset,
        use_window_a: opts.window_a.is_some(),
        window_a: opts.window_a.unwrap_or(0),
        set_b: opts.set_b,
        match_b: opts.match_b,
        region_b: opts.region_b,
        combinatorial_op: opts.combine,
        use_window_b: opts.window_b.is_some(),
        window_b: opts.window_b.unwrap_or(0),
        uuid: opts.uuid,
    };

    if !selection.set_b.is_empty() {
        tracing::info!(
            op = %selection.combinatorial_op,
            "combinatorial search: {}",
            selection.combinatorial_op.describe()
        );
    }

    let client = SearchClient::from_config(config)?;
    let status = client.run_search(&selection, false).await?;
    tracing::info!(state = %status.state, "search finished");

    if opts.all {
        while client.results().more_results() {
            let before = client.results().offset();
            client.load_more().await?;
            if client.results().more_results() && client.results().offset() == before {
                tracing::warn!("backend reports more results but no next offset; stopping");
                break;
            }
        }
    }

    if let Some(path) = opts.download.as_ref() {
        let tsv = client.download_results().await?;
        std::fs::write(path, tsv)?;
        tracing::info!(path = %path.display(), "wrote raw results");
    }

    let results = client.results();
    if opts.json {
        let decoded: Vec<_> = results.records().iter().map(|r| r.decoded()).collect();
        println!("{}", serde_json::to_string_pretty(&decoded)?);
    } else {
        for rec in results.records() {
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                rec.location(),
                rec.gene(),
                rec.score(),
                rec.strand(),
                rec.feature_location(),
                rec.feature_strand(),
                rec.data_source(),
                rec.track(),
                rec.site()
            );
        }
    }
    tracing::info!(
        total = results.total_results(),
        shown = results.records().len(),
        more = results.more_results(),
        "done"
    );
    Ok(())
}

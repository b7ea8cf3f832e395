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
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use dorina_client::regulators::fetch_regulators;
use dorina_client::{load_client_config, ClientConfig, HttpTransport, MergeOpts, SearchTransport};

/// Browse the genomes, assemblies, regulators and genes of a service.
#[derive(Parser, Debug)]
#[clap(name = "drn-browse")]
struct Opts {
    /// Config file (TOML)
    #[clap(long)]
    config: Option<PathBuf>,
    /// Service root, e.g. http://localhost:5000
    #[clap(long)]
    base_url: Option<String>,
    /// API path prefix; empty for unversioned deployments
    #[clap(long)]
    api_prefix: Option<String>,
    #[clap(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List available genomes
    Genomes,
    /// List the assemblies of one genome
    Assemblies { genome: String },
    /// List the regulator catalogue of an assembly
    Regulators {
        assembly: String,
        /// Inject the CUSTOM entry for this session uuid
        #[clap(long)]
        custom_uuid: Option<String>,
    },
    /// Complete gene names for an assembly
    Genes { assembly: String, query: String },
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
            ..MergeOpts::default()
        },
    )?;
    let transport = HttpTransport::new(&config)?;

    match opts.cmd {
        Cmd::Genomes => {
            for genome in transport.genomes().await? {
                println!("{}\t{}\t{}", genome.id, genome.label, genome.scientific);
            }
        }
        Cmd::Assemblies { genome } => {
            for assembly in transport.assemblies(&genome).await? {
                println!("{}\t{}", assembly.id, assembly.genome);
            }
        }
        Cmd::Regulators {
            assembly,
            custom_uuid,
        } => {
            let regulators =
                fetch_regulators(&transport, &assembly, custom_uuid.as_deref()).await?;
            for reg in regulators {
                println!(
                    "{}\t{}\t{}\t{}",
                    reg.id,
                    reg.experiment,
                    reg.summary,
                    reg.sites.map(|s| s.to_string()).unwrap_or_default()
                );
            }
        }
        Cmd::Genes { assembly, query } => {
            for gene in transport.genes(&assembly, &query).await? {
                println!("{gene}");
            }
        }
    }
    Ok(())
}

use std::{
    fs,
    net::{Ipv4Addr, SocketAddr},
    path::Path,
    sync::Arc,
};

use anyhow::Context;
use clap::Parser;
use log::info;

use crate::{
    chain_spec::{self, ChainSpec},
    cli::{Cli, Subcommand},
    rpc,
    service::{Scenario, Service},
};

/// Parse command line arguments and run the selected subcommand.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log.as_deref());

    let spec = chain_spec::load_spec(&cli.chain)?;

    match cli.subcommand {
        Subcommand::ExportChainSpec => {
            println!("{}", spec.as_json()?);
            Ok(())
        }
        Subcommand::Run { scenario } => {
            let outcomes = run_scenario(&spec, &scenario)?;
            println!("{}", serde_json::to_string_pretty(&outcomes)?);
            Ok(())
        }
        Subcommand::Serve { rpc_port, rpc_external } => {
            let ip = if rpc_external { Ipv4Addr::UNSPECIFIED } else { Ipv4Addr::LOCALHOST };
            let service = Arc::new(Service::new(&spec)?);
            rpc::serve(service, SocketAddr::from((ip, rpc_port))).await
        }
    }
}

fn init_logger(filter: Option<&str>) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(filter) = filter {
        builder.parse_filters(filter);
    }
    builder.init();
}

/// Replays `path` against a fresh deployment of `spec`.
pub fn run_scenario(spec: &ChainSpec, path: &Path) -> anyhow::Result<Vec<crate::service::Outcome>> {
    let raw = fs::read(path).with_context(|| format!("failed to read scenario {}", path.display()))?;
    let scenario: Scenario =
        serde_json::from_slice(&raw).with_context(|| format!("invalid scenario {}", path.display()))?;

    let service = Service::new(spec)?;
    info!("Replaying {} steps from {}", scenario.steps.len(), path.display());
    service.replay(&scenario)
}

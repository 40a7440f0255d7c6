use std::path::PathBuf;

use clap::Parser;

/// Development host for the KRC token contract.
#[derive(Debug, Parser)]
#[command(name = "krc-node", version)]
pub struct Cli {
    /// Chain spec to load: `dev` or a path to a JSON file.
    #[arg(long, global = true, default_value = "dev")]
    pub chain: String,

    /// Log filter, e.g. `info` or `krc-token=debug`. Overrides `RUST_LOG`.
    #[arg(long, global = true)]
    pub log: Option<String>,

    #[command(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    /// Replay a JSON scenario against a fresh ledger.
    Run {
        scenario: PathBuf,
    },

    /// Serve the contract over JSON-RPC.
    Serve {
        #[arg(long, default_value_t = 9944)]
        rpc_port: u16,

        /// Listen on all interfaces instead of localhost.
        #[arg(long)]
        rpc_external: bool,
    },

    /// Print the chain spec as JSON.
    ExportChainSpec,
}

mod chain_spec;
mod cli;
mod command;
mod rpc;
mod service;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    command::run().await
}

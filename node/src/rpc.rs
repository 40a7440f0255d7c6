//! Development JSON-RPC surface.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use jsonrpsee::{
    server::Server,
    types::{ErrorObject, ErrorObjectOwned},
    RpcModule,
};
use krc_token::TokenError;
use log::info;

use crate::service::{Caller, Service};

/// Error code of a call the contract rejected.
pub const CONTRACT_ERROR: i32 = -32000;

/// Error code of a failed compliance registration.
pub const KYC_ERROR: i32 = -32001;

fn contract_error(err: TokenError) -> ErrorObjectOwned {
    ErrorObject::owned(CONTRACT_ERROR, err.to_string(), None::<()>)
}

/// Builds the RPC methods served by the node.
pub fn create_full(service: Arc<Service>) -> anyhow::Result<RpcModule<Arc<Service>>> {
    let mut module = RpcModule::new(service);

    module.register_method("contract_invoke", |params, service, _| {
        let (caller, function, args): (Caller, String, Vec<String>) = params.parse()?;
        service.invoke(&caller, &function, &args).map_err(contract_error)
    })?;

    module.register_method("contract_query", |params, service, _| {
        let (caller, function, args): (Caller, String, Vec<String>) = params.parse()?;
        service.query(&caller, &function, &args).map_err(contract_error)
    })?;

    module.register_method("kyc_register", |params, service, _| {
        let user_id: String = params.one()?;
        service
            .register_kyc(&user_id)
            .map(|()| true)
            .map_err(|err| ErrorObject::owned(KYC_ERROR, err.to_string(), None::<()>))
    })?;

    Ok(module)
}

/// Serves the RPC methods on `addr` until ctrl-c.
pub async fn serve(service: Arc<Service>, addr: SocketAddr) -> anyhow::Result<()> {
    let server = Server::builder()
        .build(addr)
        .await
        .with_context(|| format!("failed to bind JSON-RPC server to {addr}"))?;
    let local_addr = server.local_addr().context("JSON-RPC server has no local address")?;
    let handle = server.start(create_full(service)?);
    info!("JSON-RPC server listening on {local_addr}");

    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    info!("Shutting down JSON-RPC server");
    if handle.stop().is_ok() {
        handle.stopped().await;
    }
    Ok(())
}

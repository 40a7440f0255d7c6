//! Per-invocation transaction context.
//!
//! The hosting ledger hands each invocation a set of capabilities: world
//! state, caller identity, eventing and cross-contract calls. [`TxContext`]
//! bundles them together with the transaction id and channel so that
//! operations take one explicit argument instead of reaching for globals.

use serde::{Deserialize, Serialize};

use crate::{
    error::{TokenError, TokenResult},
    events::EventSink,
    identity::IdentityResolver,
    state::StateStore,
};

/// Status of a successful contract response.
pub const OK: i32 = 200;

/// Status of a failed contract response.
pub const ERROR: i32 = 500;

/// Response returned by a contract invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: i32,
    pub message: String,
    pub payload: Vec<u8>,
}

impl Response {
    pub fn success(payload: impl Into<Vec<u8>>) -> Self {
        Self { status: OK, message: String::new(), payload: payload.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self { status: ERROR, payload: message.clone().into_bytes(), message }
    }

    pub fn is_success(&self) -> bool {
        self.status == OK
    }
}

/// Synchronous call into another deployed contract.
pub trait CrossContractCaller {
    /// Invokes `contract` on `channel`. `args[0]` is the function name.
    ///
    /// On the caller's own channel the callee's reads and writes join the
    /// calling transaction.
    fn invoke_contract(&mut self, contract: &str, args: &[Vec<u8>], channel: &str) -> Response;
}

/// Capabilities and metadata of one transaction invocation.
pub struct TxContext<'a> {
    tx_id: String,
    channel: String,
    state: &'a mut dyn StateStore,
    identity: &'a dyn IdentityResolver,
    events: &'a mut dyn EventSink,
    invoker: &'a mut dyn CrossContractCaller,
}

impl<'a> TxContext<'a> {
    pub fn new(
        tx_id: impl Into<String>,
        channel: impl Into<String>,
        state: &'a mut dyn StateStore,
        identity: &'a dyn IdentityResolver,
        events: &'a mut dyn EventSink,
        invoker: &'a mut dyn CrossContractCaller,
    ) -> Self {
        Self { tx_id: tx_id.into(), channel: channel.into(), state, identity, events, invoker }
    }

    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// Channel the transaction was submitted on.
    pub fn channel(&self) -> TokenResult<&str> {
        if self.channel.is_empty() {
            return Err(TokenError::Context("failed to get channel name".into()));
        }
        Ok(&self.channel)
    }

    pub fn state(&self) -> &(dyn StateStore + 'a) {
        &*self.state
    }

    pub fn state_mut(&mut self) -> &mut (dyn StateStore + 'a) {
        &mut *self.state
    }

    pub fn identity(&self) -> &'a dyn IdentityResolver {
        self.identity
    }

    pub fn events(&mut self) -> &mut (dyn EventSink + 'a) {
        &mut *self.events
    }

    pub fn invoker(&mut self) -> &mut (dyn CrossContractCaller + 'a) {
        &mut *self.invoker
    }
}

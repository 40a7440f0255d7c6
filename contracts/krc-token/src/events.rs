//! Token events.

use serde::{Deserialize, Serialize};

use crate::{amount::Amount, error::TokenResult};

pub const TRANSFER_EVENT: &str = "Transfer";
pub const APPROVAL_EVENT: &str = "Approval";

/// Counterparty used for mints (as `from`) and burns (as `to`).
pub const ZERO_ADDRESS: &str = "0x0";

/// Payload of both `Transfer` and `Approval` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEvent {
    pub from: String,
    pub to: String,
    pub value: Amount,
}

impl TokenEvent {
    pub fn new(from: impl Into<String>, to: impl Into<String>, value: Amount) -> Self {
        Self { from: from.into(), to: to.into(), value }
    }
}

/// Attaches an event to the transaction response.
///
/// A transaction carries at most one event; setting another replaces it.
pub trait EventSink {
    fn set_event(&mut self, name: &str, payload: Vec<u8>) -> TokenResult<()>;
}

/// Serializes `event` as JSON and hands it to `sink`.
pub fn emit(sink: &mut dyn EventSink, name: &str, event: &TokenEvent) -> TokenResult<()> {
    let payload = serde_json::to_vec(event)?;
    sink.set_event(name, payload)
}

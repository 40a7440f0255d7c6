//! Payment tracking for payable deployments.
//!
//! A payable deployment expects every submitted transaction to carry a JSON
//! payment record as its last argument. After the operation succeeds the
//! record is validated, stamped with the transaction id and persisted through
//! the KYC gate under that id.

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::TokenConfig,
    context::TxContext,
    error::{TokenError, TokenResult},
    kyc::KycGate,
    LOG_TARGET,
};

/// Document type of persisted payment records.
pub const PAYMENT_DOC_TYPE: &str = "PAYMENT-INFO";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PaymentMetaData {
    pub amount: f64,
    pub currency_code: String,
    /// RFC 3339 time the payment was made, as reported by the gateway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_timestamp: Option<String>,
    #[serde(default)]
    pub application_reference_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_payment_engine_used: Option<bool>,
}

/// Payment record as submitted by the client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PaymentInput {
    pub payment_transaction_id: String,
    pub payment_gateway_name: String,
    pub payment_meta_data: PaymentMetaData,
    #[serde(default)]
    pub asset_info: Option<Value>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub doc_type: Option<String>,
}

/// Payment record as persisted in the world state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub transaction_id: String,
    #[serde(rename = "DocType")]
    pub doc_type: String,
    pub payment_transaction_id: String,
    pub payment_gateway_name: String,
    pub payment_meta_data: PaymentMetaData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_info: Option<Value>,
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    #[serde(rename = "docType", default, skip_serializing_if = "Option::is_none")]
    pub asset_doc_type: Option<String>,
}

impl PaymentInput {
    pub fn decode(raw: &str) -> TokenResult<Self> {
        serde_json::from_str(raw).map_err(|e| TokenError::Payment(format!("malformed payment record: {e}")))
    }

    /// A payment must move at least one unit of a named currency.
    pub fn validate(&self) -> TokenResult<()> {
        let meta = &self.payment_meta_data;
        if meta.amount.is_nan() || meta.amount < 1.0 || meta.currency_code.is_empty() {
            return Err(TokenError::Payment(
                "payment transaction does not have valid amount or currency code".into(),
            ));
        }
        Ok(())
    }

    pub fn into_record(self, transaction_id: &str) -> PaymentRecord {
        PaymentRecord {
            transaction_id: transaction_id.to_string(),
            doc_type: PAYMENT_DOC_TYPE.to_string(),
            payment_transaction_id: self.payment_transaction_id,
            payment_gateway_name: self.payment_gateway_name,
            payment_meta_data: self.payment_meta_data,
            asset_info: self.asset_info,
            asset_id: self.id,
            asset_doc_type: self.doc_type,
        }
    }
}

/// After-transaction hook persisting payment records.
#[derive(Debug, Clone, Copy)]
pub struct PaymentTracker<'c> {
    gate: KycGate<'c>,
}

impl<'c> PaymentTracker<'c> {
    pub fn new(config: &'c TokenConfig) -> Self {
        Self { gate: KycGate::new(&config.compliance_contract) }
    }

    pub fn after_transaction(&self, ctx: &mut TxContext<'_>, raw_record: &str) -> TokenResult<()> {
        let input = PaymentInput::decode(raw_record)?;
        input.validate()?;

        let tx_id = ctx.tx_id().to_string();
        let record = input.into_record(&tx_id);
        let payload = serde_json::to_vec(&record)?;
        self.gate.gated_put(ctx, &tx_id, payload)?;

        info!(
            target: LOG_TARGET,
            "[{tx_id}] recorded payment {} via {}",
            record.payment_transaction_id,
            record.payment_gateway_name
        );
        Ok(())
    }
}

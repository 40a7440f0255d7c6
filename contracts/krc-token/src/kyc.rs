//! KYC-gated state access.
//!
//! Compliance status lives in a separately deployed contract. The gate asks it
//! at the moment of every gated write, so a verification can never go stale
//! within a transaction.

use log::warn;

use crate::{
    context::TxContext,
    error::{TokenError, TokenResult},
    LOG_TARGET,
};

const KYC_EXISTS_FN: &str = "KycExists";
const CREATE_KYC_FN: &str = "CreateKyc";

/// Policy wrapper around the mutating world state operations.
#[derive(Debug, Clone, Copy)]
pub struct KycGate<'c> {
    contract: &'c str,
}

impl<'c> KycGate<'c> {
    /// Gate backed by the compliance contract deployed as `contract`.
    pub fn new(contract: &'c str) -> Self {
        Self { contract }
    }

    /// Asks the compliance contract whether `user_id` has completed KYC.
    pub fn verify(&self, ctx: &mut TxContext<'_>, user_id: &str) -> TokenResult<bool> {
        let channel = ctx.channel()?.to_string();
        let args = [KYC_EXISTS_FN.as_bytes().to_vec(), user_id.as_bytes().to_vec()];
        let response = ctx.invoker().invoke_contract(self.contract, &args, &channel);

        if !response.is_success() {
            return Err(TokenError::ComplianceCheck {
                status: response.status,
                detail: String::from_utf8_lossy(&response.payload).into_owned(),
            });
        }
        parse_bool(&response.payload).ok_or_else(|| TokenError::ComplianceCheck {
            status: response.status,
            detail: format!(
                "unexpected KycExists payload {:?}",
                String::from_utf8_lossy(&response.payload)
            ),
        })
    }

    /// Writes `value` under `key` if the caller has completed KYC.
    pub fn gated_put(&self, ctx: &mut TxContext<'_>, key: &str, value: Vec<u8>) -> TokenResult<()> {
        self.ensure_caller_verified(ctx)?;
        ctx.state_mut().put(key, value)
    }

    /// Deletes `key` if the caller has completed KYC.
    pub fn gated_delete(&self, ctx: &mut TxContext<'_>, key: &str) -> TokenResult<()> {
        self.ensure_caller_verified(ctx)?;
        ctx.state_mut().delete(key)
    }

    /// Creates a compliance record for `subject_id`. Administrative use only.
    pub fn record_compliance(
        &self,
        ctx: &mut TxContext<'_>,
        subject_id: &str,
        record_id: &str,
        record_hash: &str,
    ) -> TokenResult<()> {
        let channel = ctx.channel()?.to_string();
        let args: Vec<Vec<u8>> = [CREATE_KYC_FN, subject_id, record_id, record_hash]
            .iter()
            .map(|arg| arg.as_bytes().to_vec())
            .collect();
        let response = ctx.invoker().invoke_contract(self.contract, &args, &channel);

        if !response.is_success() {
            return Err(TokenError::ComplianceCheck {
                status: response.status,
                detail: String::from_utf8_lossy(&response.payload).into_owned(),
            });
        }
        Ok(())
    }

    fn ensure_caller_verified(&self, ctx: &mut TxContext<'_>) -> TokenResult<()> {
        let user_id = ctx.identity().user_id()?;
        if !self.verify(ctx, &user_id)? {
            warn!(target: LOG_TARGET, "[{}] rejected gated write: {user_id} has not completed KYC", ctx.tx_id());
            return Err(TokenError::Compliance(user_id));
        }
        Ok(())
    }
}

/// Boolean spellings accepted in a `KycExists` payload.
fn parse_bool(payload: &[u8]) -> Option<bool> {
    match payload {
        b"1" | b"t" | b"T" | b"true" | b"TRUE" | b"True" => Some(true),
        b"0" | b"f" | b"F" | b"false" | b"FALSE" | b"False" => Some(false),
        _ => None,
    }
}

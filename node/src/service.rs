use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, bail, Context};
use krc_token::{
    KrcContract, KycGate, KycRegistry, MemoryLedger, Receipt, TokenError, TokenResult, X509Identity,
};
use log::info;
use serde::{Deserialize, Serialize};

use crate::chain_spec::ChainSpec;

/// Document hash recorded for KYC registrations made by the development node,
/// which never sees the underlying identity documents.
pub const DEV_KYC_HASH: &str = "dev-node-unverified-document";

/// Caller of an invocation as named by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Caller {
    pub msp_id: String,
    pub user_id: String,
}

impl Caller {
    /// Identity the ledger would attest for this caller.
    pub fn identity(&self) -> X509Identity {
        X509Identity::for_subject(&self.user_id, &self.msp_id)
    }
}

/// Event attached to an invocation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventView {
    pub name: String,
    pub payload: serde_json::Value,
}

/// Result of a successful invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub tx_id: String,
    pub payload: String,
    pub event: Option<EventView>,
}

impl Outcome {
    fn from_receipt(receipt: Receipt<Vec<u8>>) -> Self {
        let event = receipt.event.map(|event| EventView {
            payload: serde_json::from_slice(&event.payload)
                .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&event.payload).into_owned())),
            name: event.name,
        });
        Self { tx_id: receipt.tx_id, payload: String::from_utf8_lossy(&receipt.value).into_owned(), event }
    }
}

/// One step of a scenario file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Step {
    pub caller: Caller,
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Evaluate without committing.
    #[serde(default)]
    pub query: bool,
    #[serde(default)]
    pub expect: Option<Expectation>,
}

/// What a step must produce for the replay to continue.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub enum Expectation {
    /// Succeeds with exactly this payload.
    Payload(String),
    /// Fails with an error whose message contains this text.
    Error(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

/// The token contract running on an in-memory ledger.
pub struct Service {
    ledger: Mutex<MemoryLedger>,
    contract: KrcContract,
    contract_name: String,
    issuer: X509Identity,
}

impl Service {
    /// Deploys the contracts named in `spec` and applies its genesis.
    pub fn new(spec: &ChainSpec) -> anyhow::Result<Self> {
        let mut ledger = MemoryLedger::new(&spec.channel);
        ledger.deploy(&spec.token.compliance_contract, KycRegistry);

        let service = Self {
            ledger: Mutex::new(ledger),
            contract: KrcContract::new(spec.token.clone()),
            contract_name: spec.contract_name.clone(),
            issuer: X509Identity::for_subject(&spec.issuer_user, &spec.token.issuer_msp),
        };

        for user in &spec.kyc_verified {
            service.register_kyc(user).with_context(|| format!("failed to register genesis KYC for {user}"))?;
        }

        if let Some(genesis) = &spec.genesis {
            let token = service.contract.ledger();
            service
                .run_as_issuer(|ctx| token.initialize(ctx, &genesis.name, &genesis.symbol, &genesis.decimals))
                .context("genesis initialization failed")?;
            if genesis.initial_supply > 0 {
                service
                    .run_as_issuer(|ctx| token.mint(ctx, genesis.initial_supply))
                    .context("genesis mint failed")?;
            }
            info!(
                "Genesis: {} ({}) with {} tokens held by {}",
                genesis.name, genesis.symbol, genesis.initial_supply, spec.issuer_user
            );
        }

        info!("Deployed {} on channel {} ({})", service.contract_name, spec.channel, spec.name);
        Ok(service)
    }

    /// Submits a transaction; its writes are committed only if it succeeds.
    pub fn invoke(&self, caller: &Caller, function: &str, args: &[String]) -> TokenResult<Outcome> {
        let identity = caller.identity();
        let contract = &self.contract;
        let receipt = self
            .lock()?
            .execute(&self.contract_name, &identity, |ctx| contract.invoke(ctx, function, args))?;
        info!("[{}] {function} by {} committed", receipt.tx_id, caller.user_id);
        Ok(Outcome::from_receipt(receipt))
    }

    /// Evaluates a call against the committed state without committing.
    pub fn query(&self, caller: &Caller, function: &str, args: &[String]) -> TokenResult<Outcome> {
        let identity = caller.identity();
        let contract = &self.contract;
        let receipt = self
            .lock()?
            .query(&self.contract_name, &identity, |ctx| contract.invoke(ctx, function, args))?;
        Ok(Outcome::from_receipt(receipt))
    }

    /// Registers a completed KYC for `user_id` on behalf of the issuer.
    pub fn register_kyc(&self, user_id: &str) -> TokenResult<()> {
        let gate = KycGate::new(&self.contract.config().compliance_contract);
        self.run_as_issuer(|ctx| gate.record_compliance(ctx, user_id, &format!("kyc-{user_id}"), DEV_KYC_HASH))?;
        info!("Registered KYC for {user_id}");
        Ok(())
    }

    /// Runs every step of `scenario` in order, stopping at the first unmet expectation.
    pub fn replay(&self, scenario: &Scenario) -> anyhow::Result<Vec<Outcome>> {
        let mut outcomes = Vec::with_capacity(scenario.steps.len());
        for (index, step) in scenario.steps.iter().enumerate() {
            let result = if step.query {
                self.query(&step.caller, &step.function, &step.args)
            } else {
                self.invoke(&step.caller, &step.function, &step.args)
            };

            match (result, &step.expect) {
                (Ok(outcome), Some(Expectation::Payload(expected))) if outcome.payload != *expected => {
                    bail!("step {index} ({}): expected payload {expected:?}, got {:?}", step.function, outcome.payload)
                }
                (Ok(_), Some(Expectation::Error(expected))) => {
                    bail!("step {index} ({}): expected error containing {expected:?}, call succeeded", step.function)
                }
                (Ok(outcome), _) => outcomes.push(outcome),
                (Err(err), Some(Expectation::Error(expected))) if err.to_string().contains(expected.as_str()) => {
                    info!("step {index} ({}) failed as expected: {err}", step.function)
                }
                (Err(err), _) => {
                    return Err(anyhow!(err).context(format!("step {index} ({}) failed", step.function)))
                }
            }
        }
        Ok(outcomes)
    }

    fn run_as_issuer<T>(
        &self,
        f: impl FnOnce(&mut krc_token::TxContext<'_>) -> TokenResult<T>,
    ) -> TokenResult<T> {
        let receipt = self.lock()?.execute(&self.contract_name, &self.issuer, f)?;
        Ok(receipt.value)
    }

    fn lock(&self) -> TokenResult<MutexGuard<'_, MemoryLedger>> {
        self.ledger.lock().map_err(|_| TokenError::Storage("ledger lock poisoned".into()))
    }
}

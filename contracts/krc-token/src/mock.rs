use std::collections::BTreeMap;

use serde_json::json;

use crate::{
    amount::{self, Amount},
    config::TokenConfig,
    contract::KrcContract,
    error::TokenResult,
    events::TokenEvent,
    identity::X509Identity,
    memory::{KycRecord, KycRegistry, MemoryLedger, Receipt},
};

pub const CHANNEL: &str = "kalp";
pub const TOKEN: &str = "krc";
pub const KYC: &str = "kyc";

pub const ISSUER_ORG: &str = "mailabs";
pub const CLIENT_ORG: &str = "org1";

pub const ISSUER: &str = "issuer";
pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

/// Balance minted to the issuer at genesis.
pub const GENESIS_SUPPLY: Amount = 1_000;

pub fn issuer() -> X509Identity {
    X509Identity::for_subject(ISSUER, ISSUER_ORG)
}

pub fn client(name: &str) -> X509Identity {
    X509Identity::for_subject(name, CLIENT_ORG)
}

/// Payment record accepted by a payable deployment.
pub fn payment_record(amount: f64, currency: &str) -> String {
    json!({
        "paymentTransactionId": "pay-1",
        "paymentGatewayName": "stripe",
        "paymentMetaData": { "amount": amount, "currencyCode": currency },
    })
    .to_string()
}

/// Ledger with the token and compliance contracts deployed side by side.
pub struct TestExt {
    pub ledger: MemoryLedger,
    pub contract: KrcContract,
}

impl TestExt {
    pub fn submit(&mut self, who: &X509Identity, function: &str, args: &[&str]) -> TokenResult<Receipt<Vec<u8>>> {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        let contract = &self.contract;
        self.ledger.execute(TOKEN, who, |ctx| contract.invoke(ctx, function, &args))
    }

    pub fn query(&mut self, who: &X509Identity, function: &str, args: &[&str]) -> TokenResult<Vec<u8>> {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        let contract = &self.contract;
        self.ledger.query(TOKEN, who, |ctx| contract.invoke(ctx, function, &args)).map(|receipt| receipt.value)
    }

    pub fn query_amount(&mut self, who: &X509Identity, function: &str, args: &[&str]) -> TokenResult<Amount> {
        let payload = self.query(who, function, args)?;
        amount::decode(function, &payload)
    }

    /// Committed balance of `account`, bypassing the contract.
    pub fn balance(&self, account: &str) -> Option<Amount> {
        self.ledger.get(TOKEN, account).map(|raw| amount::decode(account, raw).unwrap())
    }

    pub fn total_supply(&self) -> Amount {
        self.balance("totalSupply").unwrap_or(0)
    }

    /// Registers a completed KYC for `user` in the compliance contract.
    pub fn verify_kyc(&mut self, user: &str) {
        let record = KycRecord::new(user, &format!("kyc-{user}"), "hash");
        self.ledger.seed(KYC, user, record.encode().unwrap());
    }

    /// Committed state of both contracts.
    pub fn snapshot(&self) -> [Option<BTreeMap<String, Vec<u8>>>; 2] {
        [TOKEN, KYC].map(|namespace| self.ledger.namespace(namespace).cloned())
    }
}

/// Decodes the event attached to a receipt.
pub fn event_of(receipt: &Receipt<Vec<u8>>) -> (String, TokenEvent) {
    let event = receipt.event.as_ref().expect("receipt carries an event");
    (event.name.clone(), serde_json::from_slice(&event.payload).unwrap())
}

fn ext_with(config: TokenConfig) -> TestExt {
    let mut ledger = MemoryLedger::new(CHANNEL);
    ledger.deploy(KYC, KycRegistry);
    TestExt { ledger, contract: KrcContract::new(config) }
}

/// Freshly deployed token that nobody has initialized yet.
pub fn empty_test_ext() -> TestExt {
    ext_with(TokenConfig::default())
}

/// Token initialized as Kalp (KLP, 2 decimals) with the genesis supply held
/// by the issuer. The issuer and alice have completed KYC, bob has not.
pub fn new_test_ext() -> TestExt {
    let mut ext = empty_test_ext();
    ext.verify_kyc(ISSUER);
    ext.verify_kyc(ALICE);
    ext.submit(&issuer(), "Initialize", &["Kalp", "KLP", "2"]).unwrap();
    ext.submit(&issuer(), "Mint", &[&GENESIS_SUPPLY.to_string()]).unwrap();
    ext
}

/// Same genesis as [`new_test_ext`] on a payable deployment.
pub fn payable_test_ext() -> TestExt {
    let mut ext = ext_with(TokenConfig { payable: true, ..TokenConfig::default() });
    ext.verify_kyc(ISSUER);
    ext.verify_kyc(ALICE);
    let payment = payment_record(10.0, "USD");
    ext.submit(&issuer(), "Initialize", &["Kalp", "KLP", "2", &payment]).unwrap();
    ext.submit(&issuer(), "Mint", &[&GENESIS_SUPPLY.to_string(), &payment]).unwrap();
    ext
}

/// Asserts that `$call` fails with `$err` and leaves the committed state untouched.
macro_rules! assert_noop {
    ($ext:ident, $call:expr, $err:expr $(,)?) => {{
        let before = $ext.snapshot();
        assert_eq!($call.map(|_| ()), Err($err));
        assert_eq!($ext.snapshot(), before, "failed call changed the committed state");
    }};
}

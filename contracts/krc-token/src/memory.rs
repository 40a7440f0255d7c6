//! In-memory ledger host.
//!
//! Provides every capability a contract needs with the semantics of a
//! permissioned ledger peer:
//!
//! - state is partitioned into one namespace per deployed contract;
//! - reads observe committed state only, writes are buffered in a write-set;
//! - contracts invoked on the same channel write into the caller's write-set;
//! - the write-set and the event are kept only if the invocation succeeds.
//!
//! Used by the unit tests and by the development node.

use std::{cell::RefCell, collections::BTreeMap};

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    context::{CrossContractCaller, Response, TxContext},
    error::{TokenError, TokenResult},
    events::EventSink,
    identity::IdentityResolver,
    state::StateStore,
    LOG_TARGET,
};

type Namespace = BTreeMap<String, Vec<u8>>;

/// Pending writes keyed by (namespace, key); `None` marks a deletion.
type WriteSet = BTreeMap<(String, String), Option<Vec<u8>>>;

/// A contract deployed next to the token contract.
pub trait Chaincode: Send + Sync {
    fn invoke(&self, stub: &mut dyn StateStore, function: &str, args: &[String]) -> Response;
}

/// Event attached to a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeEvent {
    pub name: String,
    pub payload: Vec<u8>,
}

/// Outcome of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt<T> {
    pub tx_id: String,
    pub value: T,
    pub event: Option<ChaincodeEvent>,
}

/// Single-channel ledger holding committed world state in memory.
pub struct MemoryLedger {
    channel: String,
    state: BTreeMap<String, Namespace>,
    contracts: BTreeMap<String, Box<dyn Chaincode>>,
    height: u64,
}

impl MemoryLedger {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            state: BTreeMap::new(),
            contracts: BTreeMap::new(),
            height: 0,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Number of transactions simulated so far.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Deploys `chaincode` so that other contracts can invoke it as `name`.
    pub fn deploy(&mut self, name: impl Into<String>, chaincode: impl Chaincode + 'static) {
        self.contracts.insert(name.into(), Box::new(chaincode));
    }

    /// Writes committed state directly, bypassing any transaction.
    pub fn seed(&mut self, namespace: &str, key: impl Into<String>, value: Vec<u8>) {
        self.state.entry(namespace.to_string()).or_default().insert(key.into(), value);
    }

    pub fn get(&self, namespace: &str, key: &str) -> Option<&[u8]> {
        self.state.get(namespace)?.get(key).map(Vec::as_slice)
    }

    /// Committed state of one namespace.
    pub fn namespace(&self, namespace: &str) -> Option<&BTreeMap<String, Vec<u8>>> {
        self.state.get(namespace)
    }

    /// Runs `f` as a transaction of the contract `namespace` submitted by
    /// `identity`, committing its writes if it succeeds.
    pub fn execute<T>(
        &mut self,
        namespace: &str,
        identity: &dyn IdentityResolver,
        f: impl FnOnce(&mut TxContext<'_>) -> TokenResult<T>,
    ) -> TokenResult<Receipt<T>> {
        let (receipt, writes) = self.simulate(namespace, identity, f)?;
        debug!(target: LOG_TARGET, "[{}] committing {} writes", receipt.tx_id, writes.len());
        self.commit(writes);
        Ok(receipt)
    }

    /// Runs `f` like [`execute`](Self::execute) but never commits.
    pub fn query<T>(
        &mut self,
        namespace: &str,
        identity: &dyn IdentityResolver,
        f: impl FnOnce(&mut TxContext<'_>) -> TokenResult<T>,
    ) -> TokenResult<Receipt<T>> {
        self.simulate(namespace, identity, f).map(|(receipt, _)| receipt)
    }

    fn simulate<T>(
        &mut self,
        namespace: &str,
        identity: &dyn IdentityResolver,
        f: impl FnOnce(&mut TxContext<'_>) -> TokenResult<T>,
    ) -> TokenResult<(Receipt<T>, WriteSet)> {
        self.height += 1;
        let tx_id = format!("tx{:016x}", self.height);

        let writes = RefCell::new(WriteSet::new());
        let (result, event) = {
            let mut store = WorldView { committed: &self.state, writes: &writes, namespace };
            let mut peer = Peer {
                committed: &self.state,
                contracts: &self.contracts,
                writes: &writes,
                channel: &self.channel,
            };
            let mut events = EventBuffer::default();
            let mut ctx =
                TxContext::new(tx_id.clone(), self.channel.clone(), &mut store, identity, &mut events, &mut peer);
            let result = f(&mut ctx);
            drop(ctx);
            (result, events.event)
        };

        match result {
            Ok(value) => Ok((Receipt { tx_id, value, event }, writes.into_inner())),
            Err(err) => {
                debug!(target: LOG_TARGET, "[{tx_id}] invocation failed, discarding write-set: {err}");
                Err(err)
            }
        }
    }

    fn commit(&mut self, writes: WriteSet) {
        for ((namespace, key), value) in writes {
            let entries = self.state.entry(namespace).or_default();
            match value {
                Some(value) => {
                    entries.insert(key, value);
                }
                None => {
                    entries.remove(&key);
                }
            }
        }
    }
}

/// One namespace of the world state as seen by a running transaction.
struct WorldView<'l> {
    committed: &'l BTreeMap<String, Namespace>,
    writes: &'l RefCell<WriteSet>,
    namespace: &'l str,
}

impl WorldView<'_> {
    fn buffer(&mut self, key: &str, value: Option<Vec<u8>>) -> TokenResult<()> {
        if key.is_empty() {
            return Err(TokenError::Storage("key must not be an empty string".into()));
        }
        self.writes.borrow_mut().insert((self.namespace.to_string(), key.to_string()), value);
        Ok(())
    }
}

#[derive(Deserialize)]
struct RichQuery {
    selector: Map<String, Value>,
}

impl StateStore for WorldView<'_> {
    fn get(&self, key: &str) -> TokenResult<Option<Vec<u8>>> {
        Ok(self.committed.get(self.namespace).and_then(|entries| entries.get(key)).cloned())
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> TokenResult<()> {
        self.buffer(key, Some(value))
    }

    fn delete(&mut self, key: &str) -> TokenResult<()> {
        self.buffer(key, None)
    }

    fn exists(&self, selector_query: &str) -> TokenResult<bool> {
        let query: RichQuery = serde_json::from_str(selector_query)
            .map_err(|e| TokenError::Storage(format!("invalid rich query: {e}")))?;
        let Some(entries) = self.committed.get(self.namespace) else {
            return Ok(false);
        };
        Ok(entries
            .values()
            .filter_map(|raw| serde_json::from_slice::<Value>(raw).ok())
            .any(|document| matches_selector(&document, &query.selector)))
    }
}

fn matches_selector(document: &Value, selector: &Map<String, Value>) -> bool {
    let Some(fields) = document.as_object() else {
        return false;
    };
    selector.iter().all(|(field, expected)| fields.get(field) == Some(expected))
}

#[derive(Default)]
struct EventBuffer {
    event: Option<ChaincodeEvent>,
}

impl EventSink for EventBuffer {
    fn set_event(&mut self, name: &str, payload: Vec<u8>) -> TokenResult<()> {
        if name.is_empty() {
            return Err(TokenError::Storage("event name can not be empty".into()));
        }
        self.event = Some(ChaincodeEvent { name: name.to_string(), payload });
        Ok(())
    }
}

/// Routes cross-contract calls to the contracts deployed on this ledger.
struct Peer<'l> {
    committed: &'l BTreeMap<String, Namespace>,
    contracts: &'l BTreeMap<String, Box<dyn Chaincode>>,
    writes: &'l RefCell<WriteSet>,
    channel: &'l str,
}

impl CrossContractCaller for Peer<'_> {
    fn invoke_contract(&mut self, contract: &str, args: &[Vec<u8>], channel: &str) -> Response {
        let channel = if channel.is_empty() { self.channel } else { channel };
        if channel != self.channel {
            return Response::error(format!("channel {channel} is not joined by this peer"));
        }
        let Some(chaincode) = self.contracts.get(contract) else {
            return Response::error(format!("chaincode {contract} is not deployed"));
        };
        let Some((function, rest)) = args.split_first() else {
            return Response::error("missing function name");
        };

        let function = String::from_utf8_lossy(function);
        let args: Vec<String> = rest.iter().map(|arg| String::from_utf8_lossy(arg).into_owned()).collect();
        let mut stub = WorldView { committed: self.committed, writes: self.writes, namespace: contract };
        chaincode.invoke(&mut stub, &function, &args)
    }
}

/// Compliance record kept by [`KycRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycRecord {
    pub id: String,
    pub kyc_id: String,
    pub kyc_hash: String,
    pub doc_type: String,
}

impl KycRecord {
    pub fn new(id: &str, kyc_id: &str, kyc_hash: &str) -> Self {
        Self {
            id: id.to_string(),
            kyc_id: kyc_id.to_string(),
            kyc_hash: kyc_hash.to_string(),
            doc_type: "KYC".to_string(),
        }
    }

    pub fn encode(&self) -> TokenResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Reference compliance contract answering `KycExists` and `CreateKyc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KycRegistry;

impl KycRegistry {
    fn kyc_exists(stub: &dyn StateStore, id: &str) -> TokenResult<Response> {
        Ok(Response::success(stub.get(id)?.is_some().to_string()))
    }

    fn create_kyc(stub: &mut dyn StateStore, id: &str, kyc_id: &str, kyc_hash: &str) -> TokenResult<Response> {
        if stub.get(id)?.is_some() {
            return Ok(Response::error(format!("the kyc {id} already exists")));
        }
        stub.put(id, KycRecord::new(id, kyc_id, kyc_hash).encode()?)?;
        Ok(Response::success(Vec::new()))
    }
}

impl Chaincode for KycRegistry {
    fn invoke(&self, stub: &mut dyn StateStore, function: &str, args: &[String]) -> Response {
        let result = match (function, args) {
            ("KycExists", [id]) => Self::kyc_exists(stub, id),
            ("CreateKyc", [id, kyc_id, kyc_hash]) => Self::create_kyc(stub, id, kyc_id, kyc_hash),
            (function, args) => Ok(Response::error(format!(
                "function {function} with {} arguments is not supported",
                args.len()
            ))),
        };
        result.unwrap_or_else(|err| Response::error(err.to_string()))
    }
}

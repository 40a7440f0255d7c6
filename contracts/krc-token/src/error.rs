//! Token contract errors

use thiserror::Error;

use crate::amount::Amount;

/// Error returned by any contract operation.
///
/// Every variant aborts the invocation: the host discards the buffered
/// write-set and no event is attached to the response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("contract options need to be set before calling any function, call Initialize() to initialize contract")]
    NotInitialized,

    #[error("contract options are already set, client is not authorized to change them")]
    AlreadyInitialized,

    #[error("client is not authorized to {0}")]
    Unauthorized(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("client account {account} has insufficient funds")]
    InsufficientBalance { account: String },

    #[error("spender {spender} does not have enough allowance from {owner} for transfer")]
    InsufficientAllowance { owner: String, spender: String },

    #[error("cannot transfer to and from same client account")]
    InvalidTransfer,

    #[error("addition overflow occurred {a} + {b}")]
    Overflow { a: Amount, b: Amount },

    #[error("the number {a} is not enough to be subtracted by {b}")]
    Underflow { a: Amount, b: Amount },

    #[error("the account {0} does not exist")]
    AccountNotFound(String),

    #[error("user {0} has not completed KYC")]
    Compliance(String),

    #[error("compliance check failed with status {status}: {detail}")]
    ComplianceCheck { status: i32, detail: String },

    #[error("invalid composite key: {0}")]
    KeyFormat(String),

    #[error("failed to resolve client identity: {0}")]
    Identity(String),

    #[error("invalid token metadata: {0}")]
    InvalidMetadata(String),

    #[error("the token with ID '{0}' is already minted")]
    AlreadyMinted(String),

    #[error("unknown function {0}")]
    UnknownFunction(String),

    #[error("{function} expects {expected} arguments, got {got}")]
    InvalidArguments { function: String, expected: usize, got: usize },

    #[error("corrupt value stored under key {key:?}")]
    CorruptState { key: String },

    #[error("invalid payment details: {0}")]
    Payment(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("world state error: {0}")]
    Storage(String),

    #[error("transaction context error: {0}")]
    Context(String),
}

impl From<serde_json::Error> for TokenError {
    fn from(err: serde_json::Error) -> Self {
        TokenError::Serialization(err.to_string())
    }
}

/// Result type for token operations
pub type TokenResult<T> = Result<T, TokenError>;

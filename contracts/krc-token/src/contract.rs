//! Invocation surface of the token contract.
//!
//! The hosting ledger delivers each call as a function name plus ordered
//! string arguments. [`KrcContract::invoke`] validates the arity, parses
//! integer arguments, runs the ledger operation and encodes its result as the
//! response payload.

use std::fmt;

use crate::{
    amount,
    config::TokenConfig,
    context::TxContext,
    error::{TokenError, TokenResult},
    ledger::TokenLedger,
    payment::PaymentTracker,
};

/// Functions exposed by the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Initialize,
    Mint,
    Burn,
    Transfer,
    TransferFrom,
    Approve,
    Allowance,
    BalanceOf,
    ClientAccountBalance,
    ClientAccountId,
    TotalSupply,
    Name,
    Symbol,
    Decimals,
}

impl Function {
    pub const ALL: [Function; 14] = [
        Function::Initialize,
        Function::Mint,
        Function::Burn,
        Function::Transfer,
        Function::TransferFrom,
        Function::Approve,
        Function::Allowance,
        Function::BalanceOf,
        Function::ClientAccountBalance,
        Function::ClientAccountId,
        Function::TotalSupply,
        Function::Name,
        Function::Symbol,
        Function::Decimals,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Function::Initialize => "Initialize",
            Function::Mint => "Mint",
            Function::Burn => "Burn",
            Function::Transfer => "Transfer",
            Function::TransferFrom => "TransferFrom",
            Function::Approve => "Approve",
            Function::Allowance => "Allowance",
            Function::BalanceOf => "BalanceOf",
            Function::ClientAccountBalance => "ClientAccountBalance",
            Function::ClientAccountId => "ClientAccountID",
            Function::TotalSupply => "TotalSupply",
            Function::Name => "Name",
            Function::Symbol => "Symbol",
            Function::Decimals => "Decimals",
        }
    }

    pub fn parse(name: &str) -> TokenResult<Self> {
        Self::ALL
            .into_iter()
            .find(|function| function.name() == name)
            .ok_or_else(|| TokenError::UnknownFunction(name.to_string()))
    }

    /// Number of contract arguments, excluding a trailing payment record.
    pub fn arity(self) -> usize {
        match self {
            Function::Initialize | Function::TransferFrom => 3,
            Function::Transfer | Function::Approve | Function::Allowance => 2,
            Function::Mint | Function::Burn | Function::BalanceOf => 1,
            Function::ClientAccountBalance
            | Function::ClientAccountId
            | Function::TotalSupply
            | Function::Name
            | Function::Symbol
            | Function::Decimals => 0,
        }
    }

    /// Whether the function changes the world state.
    pub fn is_submit(self) -> bool {
        matches!(
            self,
            Function::Initialize
                | Function::Mint
                | Function::Burn
                | Function::Transfer
                | Function::TransferFrom
                | Function::Approve
        )
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The deployed token contract.
#[derive(Debug, Clone, Default)]
pub struct KrcContract {
    config: TokenConfig,
}

impl KrcContract {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn ledger(&self) -> TokenLedger<'_> {
        TokenLedger::new(&self.config)
    }

    /// Runs `function` with `args` and returns the response payload.
    ///
    /// On a payable deployment, submit functions take one extra trailing
    /// argument: the JSON payment record, persisted after the operation.
    pub fn invoke(&self, ctx: &mut TxContext<'_>, function: &str, args: &[String]) -> TokenResult<Vec<u8>> {
        let function = Function::parse(function)?;

        let tracks_payment = self.config.payable && function.is_submit();
        let expected = function.arity() + usize::from(tracks_payment);
        if args.len() != expected {
            return Err(TokenError::InvalidArguments {
                function: function.to_string(),
                expected,
                got: args.len(),
            });
        }

        let (call_args, payment) = args.split_at(function.arity());
        let payload = self.dispatch(ctx, function, call_args)?;

        if let Some(record) = payment.first() {
            PaymentTracker::new(&self.config).after_transaction(ctx, record)?;
        }
        Ok(payload)
    }

    fn dispatch(&self, ctx: &mut TxContext<'_>, function: Function, args: &[String]) -> TokenResult<Vec<u8>> {
        let ledger = self.ledger();
        let payload = match (function, args) {
            (Function::Initialize, [name, symbol, decimals]) => {
                ledger.initialize(ctx, name, symbol, decimals)?.to_string().into_bytes()
            }
            (Function::Mint, [value]) => {
                ledger.mint(ctx, amount::parse_arg(value)?)?;
                Vec::new()
            }
            (Function::Burn, [value]) => {
                ledger.burn(ctx, amount::parse_arg(value)?)?;
                Vec::new()
            }
            (Function::Transfer, [recipient, value]) => {
                ledger.transfer(ctx, recipient, amount::parse_arg(value)?)?;
                Vec::new()
            }
            (Function::TransferFrom, [from, to, value]) => {
                ledger.transfer_from(ctx, from, to, amount::parse_arg(value)?)?;
                Vec::new()
            }
            (Function::Approve, [spender, value]) => {
                ledger.approve(ctx, spender, amount::parse_arg(value)?)?;
                Vec::new()
            }
            (Function::Allowance, [owner, spender]) => amount::encode(ledger.allowance(ctx, owner, spender)?),
            (Function::BalanceOf, [account]) => amount::encode(ledger.balance_of(ctx, account)?),
            (Function::ClientAccountBalance, []) => amount::encode(ledger.client_account_balance(ctx)?),
            (Function::ClientAccountId, []) => ledger.client_account_id(ctx)?.into_bytes(),
            (Function::TotalSupply, []) => amount::encode(ledger.total_supply(ctx)?),
            (Function::Name, []) => ledger.name(ctx)?.into_bytes(),
            (Function::Symbol, []) => ledger.symbol(ctx)?.into_bytes(),
            (Function::Decimals, []) => ledger.decimals(ctx)?.into_bytes(),
            (function, args) => {
                return Err(TokenError::InvalidArguments {
                    function: function.to_string(),
                    expected: function.arity(),
                    got: args.len(),
                })
            }
        };
        Ok(payload)
    }
}

//! Token ledger state machine.
//!
//! The contract starts `Uninitialized` and moves to `Initialized` once the
//! issuer sets the token metadata; the presence of the name key is the state.
//! Every other operation requires the initialized state.
//!
//! Reads always happen before writes within one operation and updates are
//! computed from the values read at the start of the invocation. The world
//! state does not expose buffered writes to later reads, so re-reading a key
//! after writing it would observe the pre-transaction value anyway.

use log::{debug, info};

use crate::{
    amount::{self, Amount},
    config::TokenConfig,
    context::TxContext,
    error::{TokenError, TokenResult},
    events::{self, TokenEvent, APPROVAL_EVENT, TRANSFER_EVENT, ZERO_ADDRESS},
    state::{composite_key, validate_part, StateStore},
    LOG_TARGET,
};

pub const NAME_KEY: &str = "name";
pub const SYMBOL_KEY: &str = "symbol";
pub const DECIMALS_KEY: &str = "decimals";
pub const TOTAL_SUPPLY_KEY: &str = "totalSupply";

/// Object type of allowance composite keys.
pub const ALLOWANCE_PREFIX: &str = "allowance";

/// Keys that share the namespace with balances and can never name an account.
pub const RESERVED_KEYS: [&str; 4] = [NAME_KEY, SYMBOL_KEY, DECIMALS_KEY, TOTAL_SUPPLY_KEY];

/// Fungible token bookkeeping over the world state.
#[derive(Debug, Clone, Copy)]
pub struct TokenLedger<'c> {
    config: &'c TokenConfig,
}

impl<'c> TokenLedger<'c> {
    pub fn new(config: &'c TokenConfig) -> Self {
        Self { config }
    }

    /// Sets the token metadata. Issuer only, and only once.
    pub fn initialize(
        &self,
        ctx: &mut TxContext<'_>,
        name: &str,
        symbol: &str,
        decimals: &str,
    ) -> TokenResult<bool> {
        self.ensure_issuer(ctx, "initialize contract")?;

        if ctx.state().get(NAME_KEY)?.is_some() {
            return Err(TokenError::AlreadyInitialized);
        }
        if name.is_empty() {
            return Err(TokenError::InvalidMetadata("token name must not be empty".into()));
        }

        let state = ctx.state_mut();
        state.put(NAME_KEY, name.as_bytes().to_vec())?;
        state.put(SYMBOL_KEY, symbol.as_bytes().to_vec())?;
        state.put(DECIMALS_KEY, decimals.as_bytes().to_vec())?;

        info!(target: LOG_TARGET, "[{}] token {name} ({symbol}) initialized with {decimals} decimals", ctx.tx_id());
        Ok(true)
    }

    /// Creates `amount` new tokens in the issuer's account.
    pub fn mint(&self, ctx: &mut TxContext<'_>, amount: Amount) -> TokenResult<()> {
        ensure_initialized(ctx)?;
        self.ensure_issuer(ctx, "mint new tokens")?;
        let minter = ctx.identity().user_id()?;
        ensure_account(&minter)?;

        if amount <= 0 {
            return Err(TokenError::InvalidAmount("mint amount must be a positive integer".into()));
        }

        let current_balance = read_amount(ctx.state(), &minter)?.unwrap_or(0);
        let total_supply = read_amount(ctx.state(), TOTAL_SUPPLY_KEY)?.unwrap_or(0);
        let updated_balance = amount::add(current_balance, amount)?;
        let updated_supply = amount::add(total_supply, amount)?;

        let state = ctx.state_mut();
        state.put(&minter, amount::encode(updated_balance))?;
        state.put(TOTAL_SUPPLY_KEY, amount::encode(updated_supply))?;

        events::emit(ctx.events(), TRANSFER_EVENT, &TokenEvent::new(ZERO_ADDRESS, &minter, amount))?;

        info!(
            target: LOG_TARGET,
            "[{}] minter account {minter} balance updated from {current_balance} to {updated_balance}",
            ctx.tx_id()
        );
        Ok(())
    }

    /// Redeems `amount` tokens from the issuer's account.
    pub fn burn(&self, ctx: &mut TxContext<'_>, amount: Amount) -> TokenResult<()> {
        ensure_initialized(ctx)?;
        self.ensure_issuer(ctx, "burn tokens")?;
        let minter = ctx.identity().user_id()?;
        ensure_account(&minter)?;

        if amount <= 0 {
            return Err(TokenError::InvalidAmount("burn amount must be a positive integer".into()));
        }

        let current_balance = read_amount(ctx.state(), &minter)?
            .ok_or_else(|| TokenError::InsufficientBalance { account: minter.clone() })?;
        let total_supply = read_amount(ctx.state(), TOTAL_SUPPLY_KEY)?.unwrap_or(0);
        let updated_balance = amount::sub(current_balance, amount)?;
        let updated_supply = amount::sub(total_supply, amount)?;

        let state = ctx.state_mut();
        state.put(&minter, amount::encode(updated_balance))?;
        state.put(TOTAL_SUPPLY_KEY, amount::encode(updated_supply))?;

        events::emit(ctx.events(), TRANSFER_EVENT, &TokenEvent::new(&minter, ZERO_ADDRESS, amount))?;

        info!(
            target: LOG_TARGET,
            "[{}] minter account {minter} balance updated from {current_balance} to {updated_balance}",
            ctx.tx_id()
        );
        Ok(())
    }

    /// Moves `amount` from the caller's account to `recipient`.
    pub fn transfer(&self, ctx: &mut TxContext<'_>, recipient: &str, amount: Amount) -> TokenResult<()> {
        ensure_initialized(ctx)?;
        let sender = ctx.identity().user_id()?;

        move_balance(ctx, &sender, recipient, amount)?;
        events::emit(ctx.events(), TRANSFER_EVENT, &TokenEvent::new(&sender, recipient, amount))
    }

    /// Balance of `account`.
    pub fn balance_of(&self, ctx: &mut TxContext<'_>, account: &str) -> TokenResult<Amount> {
        ensure_initialized(ctx)?;
        ensure_account(account)?;
        read_amount(ctx.state(), account)?.ok_or_else(|| TokenError::AccountNotFound(account.to_string()))
    }

    /// Balance of the caller's own account.
    pub fn client_account_balance(&self, ctx: &mut TxContext<'_>) -> TokenResult<Amount> {
        ensure_initialized(ctx)?;
        let client = ctx.identity().user_id()?;
        ensure_account(&client)?;
        read_amount(ctx.state(), &client)?.ok_or(TokenError::AccountNotFound(client))
    }

    /// Account id of the caller, which others use as the payment address.
    pub fn client_account_id(&self, ctx: &mut TxContext<'_>) -> TokenResult<String> {
        ensure_initialized(ctx)?;
        ctx.identity().user_id()
    }

    pub fn total_supply(&self, ctx: &mut TxContext<'_>) -> TokenResult<Amount> {
        ensure_initialized(ctx)?;
        let total_supply = read_amount(ctx.state(), TOTAL_SUPPLY_KEY)?.unwrap_or(0);
        debug!(target: LOG_TARGET, "[{}] TotalSupply: {total_supply} tokens", ctx.tx_id());
        Ok(total_supply)
    }

    /// Sets the amount `spender` may withdraw from the caller's account.
    ///
    /// The new value replaces any previous allowance.
    pub fn approve(&self, ctx: &mut TxContext<'_>, spender: &str, value: Amount) -> TokenResult<()> {
        ensure_initialized(ctx)?;
        let owner = ctx.identity().user_id()?;

        if value < 0 {
            return Err(TokenError::InvalidAmount("allowance cannot be negative".into()));
        }

        let allowance_key = composite_key(ALLOWANCE_PREFIX, &[&owner, spender])?;
        ctx.state_mut().put(&allowance_key, amount::encode(value))?;

        events::emit(ctx.events(), APPROVAL_EVENT, &TokenEvent::new(&owner, spender, value))?;

        info!(
            target: LOG_TARGET,
            "[{}] client {owner} approved a withdrawal allowance of {value} for spender {spender}",
            ctx.tx_id()
        );
        Ok(())
    }

    /// Amount `spender` may still withdraw from `owner`, zero when never approved.
    pub fn allowance(&self, ctx: &mut TxContext<'_>, owner: &str, spender: &str) -> TokenResult<Amount> {
        ensure_initialized(ctx)?;

        let allowance_key = composite_key(ALLOWANCE_PREFIX, &[owner, spender])?;
        let allowance = read_amount(ctx.state(), &allowance_key)?.unwrap_or(0);

        debug!(
            target: LOG_TARGET,
            "[{}] the allowance left for spender {spender} to withdraw from owner {owner}: {allowance}",
            ctx.tx_id()
        );
        Ok(allowance)
    }

    /// Moves `value` from `from` to `to` on behalf of the caller, spending
    /// the allowance `from` granted to the caller.
    pub fn transfer_from(
        &self,
        ctx: &mut TxContext<'_>,
        from: &str,
        to: &str,
        value: Amount,
    ) -> TokenResult<()> {
        ensure_initialized(ctx)?;
        let spender = ctx.identity().user_id()?;

        let allowance_key = composite_key(ALLOWANCE_PREFIX, &[from, &spender])?;
        let current_allowance = read_amount(ctx.state(), &allowance_key)?.unwrap_or(0);
        if current_allowance < value {
            return Err(TokenError::InsufficientAllowance {
                owner: from.to_string(),
                spender: spender.clone(),
            });
        }

        move_balance(ctx, from, to, value)?;

        let updated_allowance = amount::sub(current_allowance, value)?;
        ctx.state_mut().put(&allowance_key, amount::encode(updated_allowance))?;

        events::emit(ctx.events(), TRANSFER_EVENT, &TokenEvent::new(from, to, value))?;

        info!(
            target: LOG_TARGET,
            "[{}] spender {spender} allowance updated from {current_allowance} to {updated_allowance}",
            ctx.tx_id()
        );
        Ok(())
    }

    pub fn name(&self, ctx: &mut TxContext<'_>) -> TokenResult<String> {
        ensure_initialized(ctx)?;
        read_text(ctx.state(), NAME_KEY)
    }

    pub fn symbol(&self, ctx: &mut TxContext<'_>) -> TokenResult<String> {
        ensure_initialized(ctx)?;
        read_text(ctx.state(), SYMBOL_KEY)
    }

    pub fn decimals(&self, ctx: &mut TxContext<'_>) -> TokenResult<String> {
        ensure_initialized(ctx)?;
        read_text(ctx.state(), DECIMALS_KEY)
    }

    fn ensure_issuer(&self, ctx: &TxContext<'_>, action: &str) -> TokenResult<()> {
        let org = ctx.identity().org_tag()?;
        if org != self.config.issuer_msp {
            return Err(TokenError::Unauthorized(action.to_string()));
        }
        Ok(())
    }
}

/// Whether the token metadata has been set.
pub fn is_initialized(state: &dyn StateStore) -> TokenResult<bool> {
    Ok(state.get(NAME_KEY)?.is_some())
}

fn ensure_initialized(ctx: &TxContext<'_>) -> TokenResult<()> {
    if !is_initialized(ctx.state())? {
        return Err(TokenError::NotInitialized);
    }
    Ok(())
}

/// Debits `from` and credits `to`. Shared by `Transfer` and `TransferFrom`.
fn move_balance(ctx: &mut TxContext<'_>, from: &str, to: &str, value: Amount) -> TokenResult<()> {
    ensure_account(from)?;
    ensure_account(to)?;
    if from == to {
        return Err(TokenError::InvalidTransfer);
    }
    if value < 0 {
        return Err(TokenError::InvalidAmount("transfer amount cannot be negative".into()));
    }

    let from_balance = read_amount(ctx.state(), from)?
        .ok_or_else(|| TokenError::InsufficientBalance { account: from.to_string() })?;
    if from_balance < value {
        return Err(TokenError::InsufficientBalance { account: from.to_string() });
    }
    let to_balance = read_amount(ctx.state(), to)?.unwrap_or(0);

    let from_updated = amount::sub(from_balance, value)?;
    let to_updated = amount::add(to_balance, value)?;

    let state = ctx.state_mut();
    state.put(from, amount::encode(from_updated))?;
    state.put(to, amount::encode(to_updated))?;

    info!(target: LOG_TARGET, "[{}] client {from} balance updated from {from_balance} to {from_updated}", ctx.tx_id());
    info!(target: LOG_TARGET, "[{}] recipient {to} balance updated from {to_balance} to {to_updated}", ctx.tx_id());
    Ok(())
}

/// Ensures `account` can be used as a balance key.
///
/// Balances live next to the token metadata, the total supply and the
/// allowance composite keys, none of which may ever be written as a balance.
pub fn ensure_account(account: &str) -> TokenResult<()> {
    if account.is_empty() {
        return Err(TokenError::KeyFormat("account id must not be empty".into()));
    }
    if RESERVED_KEYS.contains(&account) {
        return Err(TokenError::KeyFormat(format!("{account:?} is a reserved key, not an account id")));
    }
    validate_part(account)
}

fn read_amount(state: &dyn StateStore, key: &str) -> TokenResult<Option<Amount>> {
    state.get(key)?.map(|raw| amount::decode(key, &raw)).transpose()
}

fn read_text(state: &dyn StateStore, key: &str) -> TokenResult<String> {
    match state.get(key)? {
        Some(raw) => String::from_utf8(raw).map_err(|_| TokenError::CorruptState { key: key.to_string() }),
        None => Ok(String::new()),
    }
}

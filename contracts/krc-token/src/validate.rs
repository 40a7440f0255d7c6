//! Checks for contracts that create uniquely identified assets.

use serde_json::json;

use crate::{
    context::TxContext,
    error::{TokenError, TokenResult},
    state::StateStore,
};

/// Ensures the caller is one of `owners` and no asset `id` of `doc_type` exists yet.
pub fn validate_create_token(
    ctx: &TxContext<'_>,
    id: &str,
    doc_type: &str,
    owners: &[String],
) -> TokenResult<()> {
    let operator = ctx.identity().user_id()?;
    if !owners.iter().any(|owner| *owner == operator) {
        return Err(TokenError::Unauthorized(
            "initiate create transaction, only the asset owner is allowed to".into(),
        ));
    }

    if is_minted(ctx.state(), id, doc_type)? {
        return Err(TokenError::AlreadyMinted(id.to_string()));
    }
    Ok(())
}

/// Whether an asset document with `id` and `doc_type` is already stored.
pub fn is_minted(state: &dyn StateStore, id: &str, doc_type: &str) -> TokenResult<bool> {
    let query = json!({ "selector": { "id": id, "docType": doc_type } });
    state.exists(&query.to_string())
}

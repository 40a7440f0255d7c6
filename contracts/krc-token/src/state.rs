//! World state access and composite keys.

use crate::error::{TokenError, TokenResult};

/// Delimiter that opens a composite key and terminates each of its parts.
pub const COMPOSITE_KEY_DELIMITER: char = '\u{0}';

/// Highest code point; reserved by range queries as an open upper bound.
const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

/// Key-value world state of one contract namespace.
///
/// Reads observe committed state only. Writes and deletes are buffered into
/// the transaction's write-set and become visible once the hosting ledger
/// commits the transaction.
pub trait StateStore {
    /// Reads the committed value under `key`.
    fn get(&self, key: &str) -> TokenResult<Option<Vec<u8>>>;

    /// Buffers a write of `value` under `key`.
    fn put(&mut self, key: &str, value: Vec<u8>) -> TokenResult<()>;

    /// Buffers a deletion of `key`.
    fn delete(&mut self, key: &str) -> TokenResult<()>;

    /// Whether the rich-query `selector_query` matches at least one stored document.
    fn exists(&self, selector_query: &str) -> TokenResult<bool>;
}

/// Builds the composite key for `object_type` and its ordered `attributes`.
pub fn composite_key(object_type: &str, attributes: &[&str]) -> TokenResult<String> {
    if object_type.is_empty() {
        return Err(TokenError::KeyFormat("object type must not be empty".into()));
    }
    validate_part(object_type)?;

    let mut key = String::with_capacity(
        2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>(),
    );
    key.push(COMPOSITE_KEY_DELIMITER);
    key.push_str(object_type);
    key.push(COMPOSITE_KEY_DELIMITER);
    for attribute in attributes {
        validate_part(attribute)?;
        key.push_str(attribute);
        key.push(COMPOSITE_KEY_DELIMITER);
    }
    Ok(key)
}

/// Splits a composite key back into its object type and attributes.
pub fn split_composite_key(key: &str) -> TokenResult<(String, Vec<String>)> {
    let body = key
        .strip_prefix(COMPOSITE_KEY_DELIMITER)
        .and_then(|rest| rest.strip_suffix(COMPOSITE_KEY_DELIMITER))
        .ok_or_else(|| TokenError::KeyFormat(format!("{key:?} is not a composite key")))?;
    if body.contains(MAX_UNICODE_RUNE) {
        return Err(TokenError::KeyFormat(format!("{key:?} contains a reserved code point")));
    }

    let mut parts = body.split(COMPOSITE_KEY_DELIMITER).map(str::to_string);
    let object_type = parts.next().filter(|t| !t.is_empty()).ok_or_else(|| {
        TokenError::KeyFormat(format!("{key:?} has an empty object type"))
    })?;
    Ok((object_type, parts.collect()))
}

/// Rejects `part` if it contains a code point reserved by composite keys.
pub fn validate_part(part: &str) -> TokenResult<()> {
    if part.contains(COMPOSITE_KEY_DELIMITER) || part.contains(MAX_UNICODE_RUNE) {
        return Err(TokenError::KeyFormat(format!(
            "{part:?} contains U+0000 or U+10FFFF, which are not allowed"
        )));
    }
    Ok(())
}

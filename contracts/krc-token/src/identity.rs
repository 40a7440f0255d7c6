//! Caller identity resolution.
//!
//! The hosting ledger attests every caller with an X.509 certificate and the
//! membership service provider (MSP) that issued it. The contract never sees
//! the certificate itself, only the base64-encoded client id
//! (`x509::<subject DN>::<issuer DN>`) and the MSP id.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{TokenError, TokenResult};

const SUBJECT_CN_MARKER: &str = "x509::CN=";

/// Resolves who is calling the current transaction.
pub trait IdentityResolver {
    /// Stable user identifier: the subject common name of the caller.
    fn user_id(&self) -> TokenResult<String>;

    /// Organizational membership tag (MSP id) of the caller.
    fn org_tag(&self) -> TokenResult<String>;
}

/// Identity as attested by the hosting ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X509Identity {
    encoded_id: String,
    msp_id: String,
}

impl X509Identity {
    pub fn new(encoded_id: impl Into<String>, msp_id: impl Into<String>) -> Self {
        Self { encoded_id: encoded_id.into(), msp_id: msp_id.into() }
    }

    /// Builds the identity a certificate authority of `org` would attest for `user`.
    pub fn for_subject(user: &str, org: &str) -> Self {
        let raw = format!("x509::CN={user},OU=client,O={org}::CN=ca.{org},O={org}");
        Self::new(STANDARD.encode(raw), org)
    }

    pub fn encoded_id(&self) -> &str {
        &self.encoded_id
    }
}

impl IdentityResolver for X509Identity {
    fn user_id(&self) -> TokenResult<String> {
        subject_common_name(&self.encoded_id)
    }

    fn org_tag(&self) -> TokenResult<String> {
        if self.msp_id.is_empty() {
            return Err(TokenError::Identity("client identity carries no MSP id".into()));
        }
        Ok(self.msp_id.clone())
    }
}

/// Extracts the subject common name from a base64-encoded client id.
pub fn subject_common_name(encoded_id: &str) -> TokenResult<String> {
    let decoded = STANDARD
        .decode(encoded_id)
        .map_err(|e| TokenError::Identity(format!("failed to base64 decode clientID: {e}")))?;
    let client_id = String::from_utf8(decoded)
        .map_err(|_| TokenError::Identity("clientID is not valid UTF-8".into()))?;

    let start = client_id
        .find(SUBJECT_CN_MARKER)
        .ok_or_else(|| TokenError::Identity("clientID has no subject common name".into()))?
        + SUBJECT_CN_MARKER.len();
    let subject = client_id[start..].split("::").next().unwrap_or_default();
    let common_name = subject.split(',').next().unwrap_or_default();

    if common_name.is_empty() {
        return Err(TokenError::Identity("subject common name is empty".into()));
    }
    Ok(common_name.to_string())
}

//! Deployment configuration.

use serde::{Deserialize, Serialize};

/// Parameters fixed when the contract is deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TokenConfig {
    /// MSP id of the organization allowed to initialize, mint and burn.
    pub issuer_msp: String,
    /// Name under which the compliance contract is deployed.
    pub compliance_contract: String,
    /// Whether submitted transactions carry a payment record to track.
    pub payable: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            issuer_msp: "mailabs".to_string(),
            compliance_contract: "kyc".to_string(),
            payable: false,
        }
    }
}

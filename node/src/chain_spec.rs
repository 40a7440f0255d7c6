use std::{fs, path::Path};

use anyhow::Context;
use krc_token::{Amount, TokenConfig};
use serde::{Deserialize, Serialize};

/// Deployment of the token contract on a single-channel development ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChainSpec {
    pub name: String,
    pub id: String,
    pub channel: String,
    /// Name the token contract is deployed under.
    #[serde(default = "default_contract_name")]
    pub contract_name: String,
    #[serde(default)]
    pub token: TokenConfig,
    /// Common name of the issuer identity that runs genesis.
    pub issuer_user: String,
    /// Users registered with the compliance contract at genesis.
    #[serde(default)]
    pub kyc_verified: Vec<String>,
    #[serde(default)]
    pub genesis: Option<TokenGenesis>,
}

/// Token metadata and supply set up before the first block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TokenGenesis {
    pub name: String,
    pub symbol: String,
    pub decimals: String,
    /// Minted to the issuer right after initialization.
    #[serde(default)]
    pub initial_supply: Amount,
}

fn default_contract_name() -> String {
    "krc".to_string()
}

impl ChainSpec {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed to read chain spec {}", path.display()))?;
        serde_json::from_slice(&raw).with_context(|| format!("invalid chain spec {}", path.display()))
    }

    pub fn as_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("failed to encode chain spec")
    }
}

/// Resolves `--chain`: `dev` selects the built-in spec, anything else is a path.
pub fn load_spec(id: &str) -> anyhow::Result<ChainSpec> {
    match id {
        "" | "dev" => Ok(development_config()),
        path => ChainSpec::from_json_file(Path::new(path)),
    }
}

/// Development chain specification.
///
/// The issuer runs on the `mailabs` organization and starts with the whole
/// supply. Alice and bob have completed KYC, so they can submit payable
/// transactions once the deployment is switched to payable.
pub fn development_config() -> ChainSpec {
    ChainSpec {
        name: "Kalp Development".to_string(),
        id: "kalp_dev".to_string(),
        channel: "kalp".to_string(),
        contract_name: default_contract_name(),
        token: TokenConfig::default(),
        issuer_user: "issuer".to_string(),
        kyc_verified: vec!["issuer".to_string(), "alice".to_string(), "bob".to_string()],
        genesis: Some(TokenGenesis {
            name: "Kalp".to_string(),
            symbol: "KLP".to_string(),
            decimals: "2".to_string(),
            initial_supply: 1_000_000,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn dev_spec_round_trips_through_json() {
        let spec = development_config();
        let json = spec.as_json().unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        assert_eq!(load_spec(file.path().to_str().unwrap()).unwrap(), spec);
    }

    #[test]
    fn minimal_spec_uses_defaults() {
        let spec: ChainSpec = serde_json::from_str(
            r#"{"name":"Local","id":"local","channel":"local","issuerUser":"admin"}"#,
        )
        .unwrap();

        assert_eq!(spec.contract_name, "krc");
        assert_eq!(spec.token, TokenConfig::default());
        assert!(spec.kyc_verified.is_empty());
        assert_eq!(spec.genesis, None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<ChainSpec>(
            r#"{"name":"Local","id":"local","channel":"local","issuerUser":"admin","sudo":"alice"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_is_reported() {
        let error = load_spec("/nonexistent/spec.json").unwrap_err();
        assert!(error.to_string().contains("failed to read chain spec"));
    }
}

//! Provider configuration
//!
//! Connection settings for the Snowflake account the provider manages. They
//! come either from a YAML file or straight from the credentials map the host
//! runtime hands over.
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use yaml_peg::serde as yaml;

use crate::logging::debug;

/// Fields that must be present and non-empty.
const REQUIRED_FIELDS: [&str; 6] = [
    "account",
    "role",
    "user",
    "warehouse",
    "private_key",
    "public_key_fp",
];

/// Everything needed to authenticate to Snowflake.
#[derive(Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Account locator, e.g. `xy12345.eu-central-1`.
    pub account: String,
    /// Role every statement runs as.
    pub role: String,
    /// Login name of the service user.
    pub user: String,
    /// Warehouse used for statements that need compute.
    pub warehouse: String,
    /// PEM-encoded RSA private key used to sign the JWT.
    pub private_key: String,
    /// Fingerprint of the registered public key.
    pub public_key_fp: String,
    /// Explicit statements endpoint. Defaults to the account URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Retry transient HTTP failures with exponential back-off.
    #[serde(default = "default_retry")]
    pub retry: bool,
}

fn default_retry() -> bool {
    true
}

// The private key never ends up in logs or error messages.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("account", &self.account)
            .field("role", &self.role)
            .field("user", &self.user)
            .field("warehouse", &self.warehouse)
            .field("private_key", &"<redacted>")
            .field("public_key_fp", &self.public_key_fp)
            .field("url", &self.url)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ProviderConfig {
    /// Read the config from a YAML file.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        debug!("Trying to read provider config from {:?}", path.as_ref());
        let config_raw = fs::read_to_string(&path).context("Reading file")?;
        let mut config =
            yaml::from_str::<ProviderConfig>(&config_raw).context("Deserializing config")?;
        let config = config
            .pop()
            .ok_or_else(|| anyhow!["provider config file is empty"])?;
        config.validate()?;
        Ok(config)
    }

    /// Build the config from a flat credentials map. Unknown keys are ignored.
    pub fn from_credentials(credentials: &HashMap<String, String>) -> Result<Self> {
        let mut conn = ProviderConfig {
            retry: true,
            ..Default::default()
        };
        let mut missing: BTreeSet<_> = REQUIRED_FIELDS.into_iter().collect();

        for (k, v) in credentials {
            match k.as_ref() {
                "account" => conn.account = v.to_owned(),
                "role" => conn.role = v.to_owned(),
                "user" => conn.user = v.to_owned(),
                "warehouse" => conn.warehouse = v.to_owned(),
                "private_key" => conn.private_key = v.to_owned(),
                "public_key_fp" => conn.public_key_fp = v.to_owned(),
                "url" => conn.url = Some(v.to_owned()),
                "retry" => {
                    conn.retry = v
                        .parse()
                        .with_context(|| format!("retry must be true or false, got {v:?}"))?
                }
                _ => (),
            }
            if !v.is_empty() {
                missing.remove(k.as_str());
            }
        }

        if !missing.is_empty() {
            bail!("Snowflake config missing required fields: {:?}", missing);
        }
        Ok(conn)
    }

    /// Perform simple field validation to catch bad input.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<_> = [
            ("account", &self.account),
            ("role", &self.role),
            ("user", &self.user),
            ("warehouse", &self.warehouse),
            ("private_key", &self.private_key),
            ("public_key_fp", &self.public_key_fp),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_empty())
        .map(|(k, _)| k)
        .collect();
        if !missing.is_empty() {
            bail!("Snowflake config missing required fields: {:?}", missing);
        }
        Ok(())
    }

    /// If the URL is explicitly defined, that's used first.
    /// Otherwise, the standard account configuration
    /// is used
    pub fn statements_url(&self) -> String {
        self.url.to_owned().unwrap_or_else(|| {
            format!(
                "https://{}.snowflakecomputing.com/api/v2/statements",
                self.account
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use maplit::hashmap;

    use super::*;

    fn credentials() -> HashMap<String, String> {
        hashmap! {
            "account".to_owned() => "my_account".to_owned(),
            "role".to_owned() => "role".to_owned(),
            "user".to_owned() => "user".to_owned(),
            "warehouse".to_owned() => "warehouse".to_owned(),
            "private_key".to_owned() => "private_key".to_owned(),
            "public_key_fp".to_owned() => "fp".to_owned(),
        }
    }

    #[test]
    fn credentials_map_builds_config() -> Result<()> {
        let config = ProviderConfig::from_credentials(&credentials())?;
        assert_eq!(config.account, "my_account");
        assert!(config.retry);
        assert_eq!(
            config.statements_url(),
            "https://my_account.snowflakecomputing.com/api/v2/statements"
        );
        Ok(())
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let mut creds = credentials();
        creds.remove("user");
        creds.insert("warehouse".to_owned(), String::new());
        let err = ProviderConfig::from_credentials(&creds).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("user"), "{msg}");
        assert!(msg.contains("warehouse"), "{msg}");
    }

    #[test]
    fn url_override_wins() -> Result<()> {
        let mut creds = credentials();
        creds.insert("url".to_owned(), "http://localhost:1234/x".to_owned());
        let config = ProviderConfig::from_credentials(&creds)?;
        assert_eq!(config.statements_url(), "http://localhost:1234/x");
        Ok(())
    }

    #[test]
    fn debug_output_hides_private_key() -> Result<()> {
        let mut creds = credentials();
        creds.insert("private_key".to_owned(), "SECRET-PEM".to_owned());
        let config = ProviderConfig::from_credentials(&creds)?;
        let printed = format!("{config:?}");
        assert!(!printed.contains("SECRET-PEM"));
        assert!(printed.contains("<redacted>"));
        Ok(())
    }

    #[test]
    fn yaml_file_is_read() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(
            file,
            "account: acc\nrole: r\nuser: u\nwarehouse: w\nprivate_key: k\npublic_key_fp: fp\nretry: false"
        )?;
        let config = ProviderConfig::read_from_file(file.path())?;
        assert_eq!(config.account, "acc");
        assert!(!config.retry);
        assert_eq!(config.url, None);
        Ok(())
    }
}

//! Client configuration and merchant credentials

use crate::{Result, TpayError};
use std::time::Duration;
use url::Url;

/// Default TPay API host
pub const DEFAULT_BASE_URL: &str = "https://api.tbcbank.ge";

/// Merchant credentials issued on the TBC developer portal
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Value sent in the `apikey` header of every request
    pub api_key: String,
    /// OAuth client id, sent as `client_Id` during the token exchange
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Create a new credential set
    pub fn new(
        api_key: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Reject blank fields
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("api_key", &self.api_key),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ] {
            if value.trim().is_empty() {
                return Err(TpayError::config(format!("{} cannot be empty", name)));
            }
        }
        Ok(())
    }
}

/// Configuration for [`crate::TpayClient`]
#[derive(Debug, Clone)]
pub struct TpayConfig {
    /// Merchant credentials
    pub credentials: Credentials,
    /// API host, without the `/v1/tpay` prefix
    pub base_url: String,
    /// Per-request timeout; `None` leaves it to the transport default
    pub timeout: Option<Duration>,
}

impl TpayConfig {
    /// Create a config pointing at the production host
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    /// Load configuration from `TBC_*` environment variables
    ///
    /// `TBC_API_KEY`, `TBC_CLIENT_ID` and `TBC_CLIENT_SECRET` are required.
    /// `TBC_BASE_URL` and `TBC_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| TpayError::config(format!("{} is not set", key)))
        };

        let credentials = Credentials::new(
            required("TBC_API_KEY")?,
            required("TBC_CLIENT_ID")?,
            required("TBC_CLIENT_SECRET")?,
        );
        let mut config = Self::new(credentials);

        if let Some(base_url) = lookup("TBC_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Some(secs) = lookup("TBC_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                TpayError::config(format!("TBC_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    /// Override the API host (sandbox, local mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.credentials.validate()?;

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(TpayError::config(
                "Base URL must start with http:// or https://",
            ));
        }
        Url::parse(&self.base_url)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn credentials() -> Credentials {
        Credentials::new("key", "client", "secret")
    }

    #[test]
    fn test_default_base_url() {
        let config = TpayConfig::new(credentials());
        assert_eq!(config.base_url, "https://api.tbcbank.ge");
        assert!(config.timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_credential_rejected() {
        let config = TpayConfig::new(Credentials::new("key", " ", "secret"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("client_id"));
    }

    #[test]
    fn test_bad_scheme_rejected() {
        let config = TpayConfig::new(credentials()).with_base_url("ftp://api.tbcbank.ge");
        assert!(matches!(config.validate(), Err(TpayError::Config { .. })));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", credentials());
        assert!(debug.contains("client"));
        assert!(!debug.contains("secret\""));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("TBC_API_KEY", "key"),
            ("TBC_CLIENT_ID", "client"),
            ("TBC_CLIENT_SECRET", "secret"),
            ("TBC_BASE_URL", "http://localhost:8080"),
            ("TBC_TIMEOUT_SECS", "15"),
        ]
        .into_iter()
        .collect();

        let config = TpayConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.credentials, credentials());
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_from_lookup_missing_secret() {
        let err = TpayConfig::from_lookup(|k| match k {
            "TBC_API_KEY" | "TBC_CLIENT_ID" => Some("x".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("TBC_CLIENT_SECRET"));
    }

    #[test]
    fn test_from_lookup_bad_timeout() {
        let err = TpayConfig::from_lookup(|k| match k {
            "TBC_TIMEOUT_SECS" => Some("soon".to_string()),
            _ => Some("x".to_string()),
        })
        .unwrap_err();
        assert!(err.to_string().contains("TBC_TIMEOUT_SECS"));
    }
}

//! # tbc-tpay
//!
//! A thin client for the TBC Bank TPay web payment API. It obtains an access
//! token and passes payment requests through to the bank, returning the decoded
//! JSON responses unchanged.
//!
//! ```rust,no_run
//! use rust_decimal::Decimal;
//! use tbc_tpay::{Credentials, TpayClient, TpayConfig};
//!
//! # async fn run() -> tbc_tpay::Result<()> {
//! let client = TpayClient::new(TpayConfig::new(Credentials::new(
//!     "api-key",
//!     "client-id",
//!     "client-secret",
//! )))?;
//!
//! if client.authenticate().await? {
//!     let payment = client
//!         .create_payment(
//!             Decimal::new(2500, 2),
//!             "https://shop.example/return",
//!             "https://shop.example/tpay/callback",
//!         )
//!         .await?;
//!     println!("{}", payment["links"]);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! A client is meant to be used by one logical flow per credential set.
//! Clones share the session token; [`TpayClient::authenticate`] takes an
//! exclusive lock on it while the token exchange is in flight.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use client::TpayClient;
pub use config::{Credentials, TpayConfig, DEFAULT_BASE_URL};
pub use error::{Result, TpayError};
pub use types::{format_amount, AccessToken};

/// Current version of the tbc-tpay library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_fixed_checkout_options() {
        assert_eq!(types::CURRENCY_GEL, "GEL");
        assert_eq!(types::EXPIRATION_MINUTES, 10);
        assert_eq!(types::LANGUAGE, "EN");
        assert_eq!(DEFAULT_BASE_URL, "https://api.tbcbank.ge");
    }
}

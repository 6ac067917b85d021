//! Wire types for the TPay API

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Currency of every payment this client creates
pub const CURRENCY_GEL: &str = "GEL";

/// Lifetime of a checkout link, in minutes
pub const EXPIRATION_MINUTES: u32 = 10;

/// Checkout page language
pub const LANGUAGE: &str = "EN";

/// Status the API reports for a completed recurring charge
pub const STATUS_SUCCEEDED: &str = "Succeeded";

/// Endpoint paths, relative to the API host
pub mod paths {
    pub const ACCESS_TOKEN: &str = "/v1/tpay/access-token";
    pub const PAYMENTS: &str = "/v1/tpay/payments";
    pub const EXECUTION: &str = "/v1/tpay/payments/execution";
}

/// Session token returned by the token exchange
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

impl AccessToken {
    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Raw token exchange response; either field may be missing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Both fields present and non-empty
    pub fn into_token(self) -> Option<AccessToken> {
        match (self.access_token, self.token_type) {
            (Some(access_token), Some(token_type))
                if !access_token.is_empty() && !token_type.is_empty() =>
            {
                Some(AccessToken {
                    access_token,
                    token_type,
                })
            }
            _ => None,
        }
    }
}

/// Form body of the token exchange
#[derive(Debug, Serialize)]
pub(crate) struct TokenRequest<'a> {
    #[serde(rename = "client_Id")]
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

/// Amount block of a web payment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentAmount {
    #[serde(serialize_with = "serialize_decimal_number")]
    pub total: Decimal,
    pub currency: &'static str,
}

/// Body of `POST /payments`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub amount: PaymentAmount,
    #[serde(rename = "returnurl")]
    pub return_url: String,
    pub callback_url: String,
    pub expiration_minutes: u32,
    pub language: &'static str,
    pub save_card: bool,
}

impl CreatePaymentRequest {
    /// GEL payment with the fixed checkout options
    pub fn new(
        amount: Decimal,
        return_url: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            amount: PaymentAmount {
                total: amount,
                currency: CURRENCY_GEL,
            },
            return_url: return_url.into(),
            callback_url: callback_url.into(),
            expiration_minutes: EXPIRATION_MINUTES,
            language: LANGUAGE,
            save_card: true,
        }
    }
}

/// Money block of a recurring charge; the amount travels as a string
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Money {
    pub amount: String,
    pub currency: &'static str,
}

/// Body of `POST /payments/execution`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringPaymentRequest {
    pub money: Money,
    #[serde(rename = "recId")]
    pub rec_id: String,
}

impl RecurringPaymentRequest {
    /// Charge `amount` GEL against a saved card
    pub fn new(rec_id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            money: Money {
                amount: format_amount(amount),
                currency: CURRENCY_GEL,
            },
            rec_id: rec_id.into(),
        }
    }
}

/// Render an amount with exactly two decimals, rounding half away from zero
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

/// Pay id of a recurring charge that should be refunded, if it succeeded
pub fn succeeded_pay_id(response: &Value) -> Option<&str> {
    if response.get("status").and_then(Value::as_str) != Some(STATUS_SUCCEEDED) {
        return None;
    }
    response.get("payId").and_then(Value::as_str)
}

// Whole amounts go out as integers (`100`), others as floats (`10.5`).
fn serialize_decimal_number<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let normalized = value.normalize();
    if normalized.fract().is_zero() {
        if let Some(whole) = normalized.to_i64() {
            return serializer.serialize_i64(whole);
        }
    }
    match normalized.to_f64() {
        Some(float) => serializer.serialize_f64(float),
        None => Err(serde::ser::Error::custom(format!(
            "amount {} is not representable as a JSON number",
            value
        ))),
    }
}

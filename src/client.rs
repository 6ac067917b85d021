//! HTTP client for the TPay checkout API

use crate::config::TpayConfig;
use crate::types::*;
use crate::{Result, TpayError};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

const APPLICATION_JSON: &str = "application/json";
const API_KEY_HEADER: &str = "apikey";

/// TPay client holding merchant credentials and the current session token
///
/// Clones share the token and the set of in-flight refunds.
#[derive(Clone)]
pub struct TpayClient {
    /// Underlying HTTP client
    client: Client,
    config: Arc<TpayConfig>,
    base_url: Url,
    /// Written only by [`TpayClient::authenticate`]
    token: Arc<RwLock<Option<AccessToken>>>,
    /// Locked only to push or take handles, never across an await
    refunds: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl std::fmt::Debug for TpayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TpayClient")
            .field("base_url", &self.base_url.as_str())
            .field("credentials", &self.config.credentials)
            .finish()
    }
}

impl TpayClient {
    /// Create a new client; fails fast on missing credentials or a bad base URL
    pub fn new(config: TpayConfig) -> Result<Self> {
        config.validate()?;
        let base_url = Url::parse(&config.base_url)?;

        let mut client_builder = Client::builder();
        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }
        let client = client_builder
            .build()
            .map_err(|e| TpayError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: Arc::new(config),
            base_url,
            token: Arc::new(RwLock::new(None)),
            refunds: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Exchange the client credentials for an access token
    ///
    /// Returns `Ok(false)` when the response lacks `access_token` or `token_type`.
    /// Every completed exchange replaces the stored token, so a failed one leaves
    /// the client unauthenticated. Transport failures are returned as errors and
    /// leave the token untouched.
    pub async fn authenticate(&self) -> Result<bool> {
        // Held across the exchange so no request goes out with a token that is being replaced.
        let mut token = self.token.write().await;

        let url = self.endpoint(paths::ACCESS_TOKEN, &[])?;
        debug!(%url, "Requesting TPay access token");

        let credentials = &self.config.credentials;
        let request = self
            .client
            .post(url)
            .header(ACCEPT, APPLICATION_JSON)
            .header(API_KEY_HEADER, &credentials.api_key)
            .form(&TokenRequest {
                client_id: &credentials.client_id,
                client_secret: &credentials.client_secret,
            });
        let body = Self::send(request).await?;

        let response: TokenResponse = serde_json::from_value(body).unwrap_or_default();
        *token = response.into_token();
        match token.as_ref() {
            Some(new_token) => {
                info!(token_type = %new_token.token_type, "TPay authentication succeeded");
                Ok(true)
            }
            None => {
                warn!("TPay token response is missing access_token or token_type");
                Ok(false)
            }
        }
    }

    /// Create a web payment and return the API response (payment link and id) verbatim
    ///
    /// `callback_url` receives a `POST {"PaymentId": ...}` from the bank once the
    /// payment reaches a final status.
    pub async fn create_payment(
        &self,
        amount: Decimal,
        return_url: &str,
        callback_url: &str,
    ) -> Result<Value> {
        let url = self.endpoint(paths::PAYMENTS, &[])?;
        debug!(%url, %amount, "Creating TPay web payment");

        let body = CreatePaymentRequest::new(amount, return_url, callback_url);
        let request = self.authorized(self.client.post(url)).await.json(&body);
        Self::send(request).await
    }

    /// Cancel (refund) a payment
    pub async fn cancel_payment(&self, payment_id: &str) -> Result<Value> {
        let url = self.endpoint(paths::PAYMENTS, &[payment_id, "cancel"])?;
        debug!(%url, "Cancelling TPay payment");

        let request = self.authorized(self.client.post(url)).await;
        Self::send(request).await
    }

    /// Fetch the details of a payment
    pub async fn get_payment_details(&self, payment_id: &str) -> Result<Value> {
        let url = self.endpoint(paths::PAYMENTS, &[payment_id])?;
        debug!(%url, "Fetching TPay payment details");

        let request = self.authorized(self.client.get(url)).await;
        Self::send(request).await
    }

    /// Charge a saved card
    ///
    /// With `refund_on_success`, a response with status `Succeeded` triggers a
    /// cancellation of its `payId` in the background. The response is returned
    /// without waiting for it, and a failed cancellation is only logged.
    /// Cancellation must be enabled for the merchant by the bank.
    pub async fn execute_recurring_payment(
        &self,
        rec_id: &str,
        amount: Decimal,
        refund_on_success: bool,
    ) -> Result<Value> {
        let url = self.endpoint(paths::EXECUTION, &[])?;
        let body = RecurringPaymentRequest::new(rec_id, amount);
        debug!(%url, amount = %body.money.amount, "Executing TPay recurring payment");

        let request = self.authorized(self.client.post(url)).await.json(&body);
        let response = Self::send(request).await?;

        if refund_on_success {
            if let Some(pay_id) = succeeded_pay_id(&response) {
                self.spawn_refund(pay_id.to_string());
            }
        }

        Ok(response)
    }

    /// Wait for every background refund started so far
    ///
    /// Refunds started while this runs are not waited for, and new recurring
    /// payments are never held up by it.
    pub async fn wait_for_refunds(&self) {
        let pending = std::mem::take(&mut *self.lock_refunds());
        for handle in pending {
            if let Err(e) = handle.await {
                warn!(error = %e, "Refund task did not complete");
            }
        }
    }

    /// Whether a session token is currently stored
    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Copy of the stored session token
    pub async fn access_token(&self) -> Option<AccessToken> {
        self.token.read().await.clone()
    }

    /// Get the client configuration
    pub fn config(&self) -> &TpayConfig {
        &self.config
    }

    fn spawn_refund(&self, pay_id: String) {
        let client = self.clone();

        info!(%pay_id, "Recurring payment succeeded, refunding in background");
        // Dropping a JoinHandle detaches the task; it is never aborted.
        let handle = tokio::spawn(async move {
            match client.cancel_payment(&pay_id).await {
                Ok(response) => debug!(%pay_id, %response, "Refund cancellation sent"),
                Err(e) => warn!(%pay_id, error = %e, "Refund cancellation failed"),
            }
        });

        let mut refunds = self.lock_refunds();
        refunds.retain(|handle| !handle.is_finished());
        refunds.push(handle);
    }

    fn lock_refunds(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.refunds.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Common headers for bearer-authenticated requests
    ///
    /// No local guard: without a token the request goes out without `Authorization`.
    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header(ACCEPT, APPLICATION_JSON)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .header(API_KEY_HEADER, &self.config.credentials.api_key);

        match self.token.read().await.as_ref() {
            Some(token) => request.header(AUTHORIZATION, token.bearer()),
            None => request,
        }
    }

    /// Build `base_url + path + segments`, percent-encoding each extra segment
    fn endpoint(&self, path: &str, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TpayError::config("Base URL cannot be a base"))?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()))
            .extend(segments);
        Ok(url)
    }

    /// Send and decode the body as JSON, whatever the status code
    async fn send(request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(%status, len = bytes.len(), "TPay response received");

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;

    fn client(base_url: &str) -> TpayClient {
        let config = TpayConfig::new(Credentials::new("key", "client", "secret"))
            .with_base_url(base_url);
        TpayClient::new(config).unwrap()
    }

    #[test]
    fn test_endpoint_paths() {
        let client = client("https://api.tbcbank.ge");
        assert_eq!(
            client.endpoint(paths::ACCESS_TOKEN, &[]).unwrap().as_str(),
            "https://api.tbcbank.ge/v1/tpay/access-token"
        );
        assert_eq!(
            client
                .endpoint(paths::PAYMENTS, &["abc123", "cancel"])
                .unwrap()
                .as_str(),
            "https://api.tbcbank.ge/v1/tpay/payments/abc123/cancel"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client("http://localhost:8080/sandbox/");
        assert_eq!(
            client.endpoint(paths::EXECUTION, &[]).unwrap().as_str(),
            "http://localhost:8080/sandbox/v1/tpay/payments/execution"
        );
    }

    #[test]
    fn test_endpoint_encodes_ids() {
        let client = client("https://api.tbcbank.ge");
        assert_eq!(
            client.endpoint(paths::PAYMENTS, &["a/b c"]).unwrap().as_str(),
            "https://api.tbcbank.ge/v1/tpay/payments/a%2Fb%20c"
        );
    }

    #[test]
    fn test_new_rejects_missing_credentials() {
        let config = TpayConfig::new(Credentials::new("", "client", "secret"));
        assert!(matches!(
            TpayClient::new(config),
            Err(TpayError::Config { .. })
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let debug = format!("{:?}", client("https://api.tbcbank.ge"));
        assert!(debug.contains("api.tbcbank.ge"));
        assert!(!debug.contains("\"secret\""));
    }

    #[tokio::test]
    async fn test_starts_unauthenticated() {
        let client = client("https://api.tbcbank.ge");
        assert!(!client.is_authenticated().await);
        assert!(client.access_token().await.is_none());
    }
}

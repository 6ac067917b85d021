//! Example checkout flow against the TPay API
//!
//! Reads credentials from `TBC_API_KEY`, `TBC_CLIENT_ID` and `TBC_CLIENT_SECRET`.
//! Pass a saved card id as the first argument to also run a 0.10 GEL
//! authorization that is refunded right away.

use rust_decimal::Decimal;
use tbc_tpay::{TpayClient, TpayConfig};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let client = TpayClient::new(TpayConfig::from_env()?)?;

    println!("🔑 Requesting access token...");
    if !client.authenticate().await? {
        eprintln!("Authentication failed, check your credentials");
        return Ok(());
    }

    println!("\n💳 Creating a 25.00 GEL web payment...");
    let payment = client
        .create_payment(
            Decimal::new(2500, 2),
            "https://shop.example/return",
            "https://shop.example/tpay/callback",
        )
        .await?;
    println!("{}", serde_json::to_string_pretty(&payment)?);

    if let Some(pay_id) = payment["payId"].as_str() {
        let details = client.get_payment_details(pay_id).await?;
        println!("Status: {}", details["status"]);
    }

    if let Some(rec_id) = std::env::args().nth(1) {
        println!("\n🔁 Charging saved card {}...", rec_id);
        let charge = client
            .execute_recurring_payment(&rec_id, Decimal::new(10, 2), true)
            .await?;
        println!("{}", serde_json::to_string_pretty(&charge)?);

        client.wait_for_refunds().await;
    }

    Ok(())
}

use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde_json::json;
use tracing::Level;

use tracing_http_hook::entry::{REQUEST_PARAM_KEY, ROUTE_KEY};
use tracing_http_hook::{Hook, LogEntry};

/// Calls the hook directly, without a subscriber, to show both callbacks:
/// one signs the request, the other inspects the collector's answer.
#[tokio::main]
async fn main() {
    let token = std::env::var("LOG_HOOK_TOKEN").unwrap_or_else(|_| "dev-token".to_string());

    let hook = Hook::new("orders", "http://127.0.0.1:8080/api/log", vec![Level::ERROR])
        .with_before_post(move |req| {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            req.headers_mut().insert(AUTHORIZATION, value);
            Ok(())
        })
        .with_after_post(|resp| {
            println!("collector answered {} ({} bytes)", resp.status, resp.body.len());
            Ok(())
        });

    let entry = LogEntry::new(Level::ERROR, "payment declined")
        .with_data(ROUTE_KEY, "/api/orders/981/pay")
        .with_data(REQUEST_PARAM_KEY, json!({"order_id": 981, "amount": "12.40"}));

    match hook.fire(&entry).await {
        Ok(()) => println!("log delivered"),
        Err(e) => eprintln!("log delivery failed: {}", e),
    }
}

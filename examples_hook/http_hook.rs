use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, Level};

use tracing_http_hook::hook::Hook;
use tracing_http_hook::init::init_tracing;

#[tokio::main]
async fn main() {
    let hook = Hook::new("auth-service", "http://127.0.0.1:8080/api/log", vec![Level::ERROR]);

    if let Err(e) = init_tracing(Arc::new(hook)) {
        eprintln!("failed to install log hook: {}", e);
        return;
    }

    info!("starting service");

    error!(
        route = "/api/login",
        request_param = "user=42",
        "authentication failed"
    );

    // Deliveries run on spawned tasks; give them a moment before exiting.
    sleep(Duration::from_secs(2)).await;
}

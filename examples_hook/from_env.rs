use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, warn};

use tracing_http_hook::config::HookConfig;
use tracing_http_hook::init::{init_tracing_with_config, LayerConfig};

/// Reads `LOG_HOOK_SERVICE_NAME`, `LOG_HOOK_ENDPOINT`, `LOG_HOOK_LEVELS`
/// and `LOG_HOOK_TIMEOUT_MS` from the environment.
#[tokio::main]
async fn main() {
    let hook = match HookConfig::from_env().and_then(HookConfig::build) {
        Ok(hook) => hook,
        Err(e) => {
            eprintln!("invalid log hook configuration: {}", e);
            return;
        }
    };

    let config = LayerConfig { enable_stdout: false };
    if let Err(e) = init_tracing_with_config(Arc::new(hook), config) {
        eprintln!("failed to install log hook: {}", e);
        return;
    }

    warn!(route = "/api/reports", "report generation slow");
    error!(route = "/api/reports", request_param = "month=2026-09", "report generation failed");

    sleep(Duration::from_secs(2)).await;
}

use crate::handler::LogHook;
use crate::layer::HookLayer;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the subscriber installed by [`init_tracing_with_config`].
///
/// **Fields**
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   stacked on top of [`HookLayer`] and every event is also printed to
///   the console.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self { enable_stdout: true }
    }
}

/// Error type returned when installing the global subscriber.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("log hook must be installed from within a tokio runtime")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    #[error("failed to set global subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Initialize the global `tracing` subscriber with `hook` attached.
///
/// **Parameters**
/// - `hook`: [`LogHook`] receiving every event at one of its levels.
/// - `config`: [`LayerConfig`] controlling console output.
///
/// **Effects**
///
/// Installs a [`Registry`] combined with [`HookLayer`] as the global
/// default subscriber. Deliveries are spawned onto the current tokio
/// runtime, so this must be called from inside one.
pub fn init_tracing_with_config(hook: Arc<dyn LogHook>, config: LayerConfig) -> Result<(), InitError> {
    let layer = HookLayer::new(hook, Handle::try_current()?);

    // The two branches build different subscriber types, hence the
    // duplicated `set_global_default`.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Initialize tracing with [`LayerConfig::default`].
pub fn init_tracing(hook: Arc<dyn LogHook>) -> Result<(), InitError> {
    init_tracing_with_config(hook, LayerConfig::default())
}

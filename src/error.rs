use std::error::Error;
use std::fmt;

/// Boxed error returned by callbacks and [`LogHook`](crate::handler::LogHook)
/// implementations.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Which extension point produced a [`HookError::Callback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStage {
    BeforePost,
    AfterPost,
}

impl fmt::Display for CallbackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackStage::BeforePost => f.write_str("before post"),
            CallbackStage::AfterPost => f.write_str("after post"),
        }
    }
}

/// Error type returned by [`Hook::fire`](crate::hook::Hook::fire).
#[derive(thiserror::Error, Debug)]
pub enum HookError {
    #[error("failed to serialize log payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to build request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("{stage} callback failed: {source}")]
    Callback {
        stage: CallbackStage,
        #[source]
        source: BoxError,
    },

    #[error("failed to send request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to post payload, the server responded with a status of {status}")]
    RemoteRejection { status: u16 },
}

impl HookError {
    /// Status code reported by the remote side, if it rejected the payload.
    pub fn status(&self) -> Option<u16> {
        match self {
            HookError::RemoteRejection { status } => Some(*status),
            _ => None,
        }
    }
}

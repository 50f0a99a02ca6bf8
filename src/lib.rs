pub mod entry;
pub mod error;
pub mod payload;
pub mod hook;
pub mod handler;
pub mod layer;

pub mod config;
pub mod init;

pub use entry::LogEntry;
pub use error::{BoxError, CallbackStage, HookError};
pub use handler::LogHook;
pub use hook::{Hook, PostResponse};
pub use layer::HookLayer;

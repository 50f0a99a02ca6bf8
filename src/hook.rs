use crate::entry::LogEntry;
use crate::error::{BoxError, CallbackStage, HookError};
use crate::payload::LogPayload;
use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, Request, StatusCode};
use std::fmt;
use std::sync::Arc;
use tracing::Level;

/// Header carrying the hook's service name on every request.
pub const SERVICE_NAME_HEADER: &str = "service-name";

/// Callback run against the fully-built request before it is sent.
pub type BeforePost = Arc<dyn Fn(&mut Request) -> Result<(), BoxError> + Send + Sync>;

/// Callback run against the received response before status classification.
pub type AfterPost = Arc<dyn Fn(&PostResponse) -> Result<(), BoxError> + Send + Sync>;

/// Response handed to an [`AfterPost`] callback.
#[derive(Debug, Clone)]
pub struct PostResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Delivers log entries to a remote collection endpoint over HTTP POST.
///
/// A hook is configured once and then shared; [`Hook::fire`] takes `&self`
/// and keeps no per-call state, so concurrent calls are independent. The
/// only shared resource is the connection pool inside the `reqwest`
/// client.
#[derive(Clone)]
pub struct Hook {
    client: Client,
    levels: Vec<Level>,
    endpoint: String,
    name: String,
    before_post: Option<BeforePost>,
    after_post: Option<AfterPost>,
}

impl Hook {
    /// Create a hook for the application `name` posting to `endpoint`.
    ///
    /// **Parameters**
    /// - `name`: logical service name, sent as the `service-name` header
    ///   and as the payload's `belong_system`.
    /// - `endpoint`: full URL of the collection endpoint.
    /// - `levels`: severities the owning framework should dispatch here.
    ///
    /// Nothing is validated and no I/O happens here; a bad endpoint
    /// surfaces from the first [`Hook::fire`].
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>, levels: Vec<Level>) -> Self {
        Hook {
            client: Client::new(),
            levels,
            endpoint: endpoint.into(),
            name: name.into(),
            before_post: None,
            after_post: None,
        }
    }

    /// Use a preconfigured client, e.g. one with a timeout or proxy.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_before_post<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Request) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.before_post = Some(Arc::new(f));
        self
    }

    pub fn with_after_post<F>(mut self, f: F) -> Self
    where
        F: Fn(&PostResponse) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.after_post = Some(Arc::new(f));
        self
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Serialize `entry` and POST it to the endpoint.
    ///
    /// **Returns**
    /// - `Ok(())` if the server answered with a status of 201 or below and
    ///   neither callback objected.
    /// - `Err(..)` with the first failure: serialization, request
    ///   construction, the before-post callback, transport, the after-post
    ///   callback, or a status above 201. Nothing is retried.
    ///
    /// An after-post callback error is returned even though the server has
    /// already received the payload.
    pub async fn fire(&self, entry: &LogEntry) -> Result<(), HookError> {
        let payload = LogPayload::from_entry(entry, &self.name)?;
        let body = payload.to_vec()?;

        let mut request = self
            .client
            .post(self.endpoint.as_str())
            .header(SERVICE_NAME_HEADER, self.name.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .build()
            .map_err(HookError::Request)?;

        if let Some(before_post) = &self.before_post {
            before_post(&mut request).map_err(|source| HookError::Callback {
                stage: CallbackStage::BeforePost,
                source,
            })?;
        }

        let response = self.client.execute(request).await.map_err(HookError::Transport)?;
        let status = response.status();

        if let Some(after_post) = &self.after_post {
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(HookError::Transport)?;
            let received = PostResponse { status, headers, body };
            after_post(&received).map_err(|source| HookError::Callback {
                stage: CallbackStage::AfterPost,
                source,
            })?;
        }

        if status.as_u16() > StatusCode::CREATED.as_u16() {
            tracing::debug!(status = status.as_u16(), endpoint = %self.endpoint, "log payload rejected");
            return Err(HookError::RemoteRejection { status: status.as_u16() });
        }

        tracing::debug!(status = status.as_u16(), endpoint = %self.endpoint, "log payload delivered");
        Ok(())
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("levels", &self.levels)
            .field("before_post", &self.before_post.is_some())
            .field("after_post", &self.after_post.is_some())
            .finish()
    }
}

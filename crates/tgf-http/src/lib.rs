//! reqwest adapter for the remote forwarding service.
//!
//! Every HTTP status is treated as data: the `success` flag in the body
//! decides the outcome. Transport errors and unreadable bodies fold into
//! `ApiOutcome::Failure` with a per-endpoint default message.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tgf_core::{
    api::{
        port::ForwarderApi,
        types::{ApiOutcome, Failure, RemoteReply, RunStatus},
        wire::{CredentialsPayload, StartPayload},
    },
    config::Config,
    domain::SessionBlob,
    errors::Error,
    model::{credentials::Credentials, forwarding::ForwardingConfig},
    Result,
};

pub const DEFAULT_UPLOAD_MESSAGE: &str = "Failed to upload session";
pub const DEFAULT_SEND_CODE_MESSAGE: &str = "Failed to send code";
pub const DEFAULT_VERIFY_MESSAGE: &str = "Failed to verify code";
pub const DEFAULT_START_MESSAGE: &str = "Failed to start forwarding";
pub const DEFAULT_STOP_MESSAGE: &str = "Failed to stop forwarding";

/// Multipart field name the service reads the session file from.
const SESSION_FIELD: &str = "session_file";

#[derive(Clone, Debug)]
pub struct HttpForwarderApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpForwarderApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build error: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.api_base_url.clone(), cfg.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        default_message: &str,
    ) -> ApiOutcome {
        let req = self.http.post(self.url(path)).json(body);
        self.send(req, path, default_message).await
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        path: &str,
        default_message: &str,
    ) -> ApiOutcome {
        let resp = match req.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(path, error = %e, "request failed");
                return ApiOutcome::Failure(Failure::transport(default_message));
            }
        };

        let status = resp.status();
        match resp.json::<RemoteReply>().await {
            Ok(reply) => {
                tracing::debug!(path, %status, success = reply.success, "reply received");
                ApiOutcome::from_reply(reply, default_message)
            }
            Err(e) => {
                tracing::warn!(path, %status, error = %e, "unreadable reply body");
                ApiOutcome::Failure(Failure::transport(default_message))
            }
        }
    }
}

#[async_trait]
impl ForwarderApi for HttpForwarderApi {
    async fn upload_session(&self, blob: &SessionBlob) -> ApiOutcome {
        let part = match reqwest::multipart::Part::bytes(blob.bytes.clone())
            .file_name(blob.file_name.clone())
            .mime_str("application/octet-stream")
        {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "multipart build failed");
                return ApiOutcome::Failure(Failure::transport(DEFAULT_UPLOAD_MESSAGE));
            }
        };
        let form = reqwest::multipart::Form::new().part(SESSION_FIELD, part);

        tracing::info!(file = %blob.file_name, bytes = blob.bytes.len(), "uploading session file");
        let req = self.http.post(self.url("/upload-session")).multipart(form);
        self.send(req, "/upload-session", DEFAULT_UPLOAD_MESSAGE).await
    }

    async fn request_code(&self, credentials: &Credentials) -> ApiOutcome {
        let body = CredentialsPayload::from(credentials);
        tracing::info!("requesting login code");
        self.post_json("/send-code", &body, DEFAULT_SEND_CODE_MESSAGE)
            .await
    }

    async fn verify_code(&self, credentials: &Credentials) -> ApiOutcome {
        let body = CredentialsPayload::from(credentials);
        self.post_json("/verify-code", &body, DEFAULT_VERIFY_MESSAGE)
            .await
    }

    async fn start_forwarding(
        &self,
        credentials: &Credentials,
        config: &ForwardingConfig,
    ) -> ApiOutcome {
        let body = StartPayload::new(credentials, config.pairs());
        tracing::info!(pairs = config.len(), "starting forwarding");
        self.post_json("/start", &body, DEFAULT_START_MESSAGE).await
    }

    async fn stop_forwarding(&self) -> ApiOutcome {
        self.post_json("/stop", &serde_json::json!({}), DEFAULT_STOP_MESSAGE)
            .await
    }

    async fn query_status(&self) -> RunStatus {
        let resp = match self.http.get(self.url("/status")).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, "status request failed");
                return RunStatus::unavailable();
            }
        };
        match resp.json::<RunStatus>().await {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(error = %e, "unreadable status body");
                RunStatus::unavailable()
            }
        }
    }
}

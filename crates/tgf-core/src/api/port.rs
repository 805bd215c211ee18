use async_trait::async_trait;

use crate::{
    api::types::{ApiOutcome, RunStatus},
    domain::SessionBlob,
    model::{credentials::Credentials, forwarding::ForwardingConfig},
};

/// Hexagonal port for the remote forwarding service.
///
/// Implementations never fail: transport and remote errors are folded into
/// `ApiOutcome::Failure`, and `query_status` degrades to
/// `RunStatus::unavailable()`. Phone numbers are canonicalized before they
/// leave the implementation (see `api::wire`).
#[async_trait]
pub trait ForwarderApi: Send + Sync {
    async fn upload_session(&self, blob: &SessionBlob) -> ApiOutcome;

    async fn request_code(&self, credentials: &Credentials) -> ApiOutcome;

    async fn verify_code(&self, credentials: &Credentials) -> ApiOutcome;

    async fn start_forwarding(
        &self,
        credentials: &Credentials,
        config: &ForwardingConfig,
    ) -> ApiOutcome;

    async fn stop_forwarding(&self) -> ApiOutcome;

    async fn query_status(&self) -> RunStatus;
}

use serde::Serialize;

use crate::{
    model::{credentials::Credentials, forwarding::ForwardingPair},
    utils::canonicalize_phone,
};

/// Credential fields as the remote service expects them.
///
/// The phone number is always canonicalized here, so nothing leaves the client
/// in any other form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsPayload {
    pub api_id: String,
    pub api_hash: String,
    pub phone_number: String,
    pub two_fa_password: String,
    pub confirmation_code: String,
    pub send_interval: u32,
}

impl From<&Credentials> for CredentialsPayload {
    fn from(c: &Credentials) -> Self {
        Self {
            api_id: c.app_id.trim().to_string(),
            api_hash: c.app_secret.trim().to_string(),
            phone_number: canonicalize_phone(&c.phone_number),
            two_fa_password: c.two_factor_secret.clone(),
            confirmation_code: c.confirmation_code.trim().to_string(),
            send_interval: c.send_interval,
        }
    }
}

/// Body of `POST /start`.
#[derive(Clone, Debug, Serialize)]
pub struct StartPayload<'a> {
    pub telegram: CredentialsPayload,
    pub pairs: &'a [ForwardingPair],
}

impl<'a> StartPayload<'a> {
    pub fn new(credentials: &Credentials, pairs: &'a [ForwardingPair]) -> Self {
        Self {
            telegram: CredentialsPayload::from(credentials),
            pairs,
        }
    }
}

use crate::{domain::SessionBlob, errors::ValidationError, utils::canonicalize_phone};

/// Scalar credential fields the user can edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialField {
    AppId,
    AppSecret,
    PhoneNumber,
    TwoFactorSecret,
    ConfirmationCode,
    SendInterval,
}

impl CredentialField {
    pub fn label(self) -> &'static str {
        match self {
            CredentialField::AppId => "API ID",
            CredentialField::AppSecret => "API Hash",
            CredentialField::PhoneNumber => "Phone number",
            CredentialField::TwoFactorSecret => "2FA password",
            CredentialField::ConfirmationCode => "Verification code",
            CredentialField::SendInterval => "Send interval",
        }
    }

    pub fn is_secret(self) -> bool {
        matches!(
            self,
            CredentialField::AppSecret | CredentialField::TwoFactorSecret
        )
    }
}

/// Authentication inputs collected while the wizard runs.
///
/// Owned by one wizard session; never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub app_id: String,
    pub app_secret: String,
    pub phone_number: String,
    /// Empty means "no 2FA password".
    pub two_factor_secret: String,
    pub confirmation_code: String,
    /// Seconds between forwarded message groups.
    pub send_interval: u32,
    pub session_blob: Option<SessionBlob>,
}

impl Credentials {
    pub fn new(send_interval: u32) -> Self {
        Self {
            app_id: String::new(),
            app_secret: String::new(),
            phone_number: String::new(),
            two_factor_secret: String::new(),
            confirmation_code: String::new(),
            send_interval,
            session_blob: None,
        }
    }

    pub fn get(&self, field: CredentialField) -> String {
        match field {
            CredentialField::AppId => self.app_id.clone(),
            CredentialField::AppSecret => self.app_secret.clone(),
            CredentialField::PhoneNumber => self.phone_number.clone(),
            CredentialField::TwoFactorSecret => self.two_factor_secret.clone(),
            CredentialField::ConfirmationCode => self.confirmation_code.clone(),
            CredentialField::SendInterval => self.send_interval.to_string(),
        }
    }

    /// Update one scalar field. Only the send interval can fail to parse; on
    /// failure the record is left untouched.
    pub fn set(&mut self, field: CredentialField, value: &str) -> Result<(), ValidationError> {
        match field {
            CredentialField::AppId => self.app_id = value.to_string(),
            CredentialField::AppSecret => self.app_secret = value.to_string(),
            CredentialField::PhoneNumber => self.phone_number = value.to_string(),
            CredentialField::TwoFactorSecret => self.two_factor_secret = value.to_string(),
            CredentialField::ConfirmationCode => self.confirmation_code = value.to_string(),
            CredentialField::SendInterval => {
                self.send_interval = value
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| ValidationError::InvalidInterval(value.to_string()))?;
            }
        }
        Ok(())
    }

    /// Set the interval from a minutes/seconds pair, each clamped to 0..=59.
    pub fn set_send_interval_parts(&mut self, minutes: u32, seconds: u32) {
        self.send_interval = minutes.min(59) * 60 + seconds.min(59);
    }

    /// Names of the phone-login fields that are still blank.
    pub fn missing_login_fields(&self) -> Vec<&'static str> {
        [
            (CredentialField::AppId, &self.app_id),
            (CredentialField::AppSecret, &self.app_secret),
            (CredentialField::PhoneNumber, &self.phone_number),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(f, _)| f.label())
        .collect()
    }

    pub fn canonicalize_phone(&mut self) {
        self.phone_number = canonicalize_phone(&self.phone_number);
    }
}

use std::fmt;

/// Wizard steps. Exactly one is current.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    CredentialUpload,
    PhoneEntry,
    TwoFactorEntry,
    CodeEntry,
    Authenticated,
    ChannelSetup,
}

/// Inputs a step asks the user for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputField {
    SessionFile,
    AppId,
    AppSecret,
    PhoneNumber,
    TwoFactorSecret,
    ConfirmationCode,
    SendInterval,
    ForwardingPairs,
}

/// Remote call issued when advancing from a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteOp {
    UploadSession,
    RequestCode,
    VerifyCode,
    StartForwarding,
}

impl Step {
    pub const INITIAL: Step = Step::CredentialUpload;

    pub fn as_str(self) -> &'static str {
        match self {
            Step::CredentialUpload => "credential-upload",
            Step::PhoneEntry => "phone-entry",
            Step::TwoFactorEntry => "two-factor-entry",
            Step::CodeEntry => "code-entry",
            Step::Authenticated => "authenticated",
            Step::ChannelSetup => "channel-setup",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::CredentialUpload => "Upload a session file",
            Step::PhoneEntry => "Log in with your phone number",
            Step::TwoFactorEntry => "Two-step verification",
            Step::CodeEntry => "Enter the verification code",
            Step::Authenticated => "Connected to Telegram",
            Step::ChannelSetup => "Configure channels",
        }
    }

    pub fn fields(self) -> &'static [InputField] {
        match self {
            Step::CredentialUpload => &[InputField::SessionFile],
            Step::PhoneEntry => &[
                InputField::AppId,
                InputField::AppSecret,
                InputField::PhoneNumber,
            ],
            Step::TwoFactorEntry => &[InputField::TwoFactorSecret],
            Step::CodeEntry => &[InputField::ConfirmationCode],
            Step::Authenticated => &[],
            Step::ChannelSetup => &[InputField::SendInterval, InputField::ForwardingPairs],
        }
    }

    /// Remote call made by `advance`, if any.
    pub fn remote_op(self) -> Option<RemoteOp> {
        match self {
            Step::CredentialUpload => Some(RemoteOp::UploadSession),
            Step::TwoFactorEntry => Some(RemoteOp::RequestCode),
            Step::CodeEntry => Some(RemoteOp::VerifyCode),
            Step::ChannelSetup => Some(RemoteOp::StartForwarding),
            Step::PhoneEntry | Step::Authenticated => None,
        }
    }

    /// Fixed reverse map for the `back` action.
    pub fn back(self) -> Option<Step> {
        match self {
            Step::CodeEntry => Some(Step::TwoFactorEntry),
            Step::TwoFactorEntry => Some(Step::PhoneEntry),
            Step::PhoneEntry => Some(Step::CredentialUpload),
            Step::ChannelSetup => Some(Step::Authenticated),
            Step::CredentialUpload | Step::Authenticated => None,
        }
    }

    /// Every step reachable from `self` in one transition (forward, error
    /// branch, redirect or back).
    pub fn transitions(self) -> &'static [Step] {
        match self {
            Step::CredentialUpload => &[Step::Authenticated, Step::PhoneEntry],
            Step::PhoneEntry => &[Step::TwoFactorEntry, Step::CredentialUpload],
            Step::TwoFactorEntry => &[Step::CodeEntry, Step::PhoneEntry],
            Step::CodeEntry => &[Step::Authenticated, Step::TwoFactorEntry],
            Step::Authenticated => &[Step::ChannelSetup],
            Step::ChannelSetup => &[Step::Authenticated],
        }
    }

    pub fn can_transition_to(self, to: Step) -> bool {
        self.transitions().contains(&to)
    }

    /// Steps gated by the rate-limit wait window.
    pub fn is_wait_gated(self) -> bool {
        matches!(self, Step::TwoFactorEntry | Step::CodeEntry)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

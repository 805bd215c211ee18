use crate::{domain::PairId, wizard::step::Step};

/// Core error type for the forwarder client.
///
/// Adapter crates map their specific errors into this type. Remote-call
/// failures are *not* errors: they travel as `api::types::ApiOutcome::Failure`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Local validation failures, raised before any remote call is attempted.
///
/// The `Display` text is what the user sees.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Select a session file first")]
    MissingSessionFile,

    #[error("Please fill in all fields: {}", .missing.join(", "))]
    MissingLoginFields { missing: Vec<&'static str> },

    #[error("Please enter the verification code")]
    MissingConfirmationCode,

    #[error("Add at least one channel pair")]
    NoPairs,

    #[error("Fill in all channel ids (pair {position})")]
    IncompletePair { position: usize, id: PairId },

    #[error("Send interval must be a whole number of seconds, got {0:?}")]
    InvalidInterval(String),
}

/// Why the wizard refused an action.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("A request is already in progress")]
    Busy,

    #[error("Wait {remaining} seconds before trying again")]
    RetryWait { remaining: u32 },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("{action} is not available on step {step}")]
    Unavailable { action: &'static str, step: Step },
}

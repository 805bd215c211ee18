//! Authentication/configuration state machine.
//!
//! A `WizardSession` owns the credentials being assembled, the forwarding
//! pairs, the current `Step`, and every timer bound to the session (status
//! poller, wait window, expiry redirect). State sits behind a mutex that is
//! never held across an `.await`; remote calls are serialized by an explicit
//! in-flight flag.

pub mod step;

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use crate::{
    api::{
        port::ForwarderApi,
        types::{ApiOutcome, RunStatus},
    },
    config::Config,
    domain::{PairId, SessionBlob},
    errors::{ValidationError, WizardError},
    model::{
        credentials::{CredentialField, Credentials},
        forwarding::{ForwardingConfig, ForwardingPair, PairField},
    },
    poller::StatusPoller,
    task::ScheduledTask,
    wait_timer::WaitTimer,
};

pub use step::{InputField, RemoteOp, Step};

pub const HINT_SESSION_LOADED: &str = "Session loaded successfully!";
pub const HINT_TWO_FACTOR: &str =
    "If you have two-step verification enabled, enter your 2FA password";
pub const HINT_CODE_SENT: &str = "Code sent! Check your Telegram app";
pub const HINT_LOGGED_IN: &str = "Logged in successfully!";
pub const HINT_ENTER_TWO_FACTOR: &str = "Please enter your 2FA password";
pub const HINT_STARTED: &str = "Forwarding started successfully!";
pub const HINT_STOPPED: &str = "Forwarding stopped successfully!";

#[derive(Clone, Debug)]
pub struct WizardOptions {
    pub status_poll_interval: Duration,
    pub expiry_redirect_delay: Duration,
    pub default_send_interval: u32,
}

impl Default for WizardOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for WizardOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            status_poll_interval: cfg.status_poll_interval,
            expiry_redirect_delay: cfg.expiry_redirect_delay,
            default_send_interval: cfg.default_send_interval,
        }
    }
}

/// Pending error/success messages. Both may be shown at once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Notices {
    pub error: Option<String>,
    pub success: Option<String>,
}

impl Notices {
    fn clear(&mut self) {
        self.error = None;
        self.success = None;
    }
}

/// What the main button does right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimaryAction {
    Advance,
    Stop,
}

/// Result of an accepted `advance`/`stop`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    Moved { from: Step, to: Step },
    Stayed { step: Step },
    /// The step changed while the call was in flight; messages were updated
    /// but no transition was applied.
    Discarded { step: Step },
}

impl Advance {
    pub fn step(self) -> Step {
        match self {
            Advance::Moved { to, .. } => to,
            Advance::Stayed { step } | Advance::Discarded { step } => step,
        }
    }
}

/// Read-only snapshot for presentation.
#[derive(Clone, Debug)]
pub struct WizardView {
    pub step: Step,
    pub fields: &'static [InputField],
    pub credentials: Credentials,
    pub pairs: Vec<ForwardingPair>,
    pub notices: Notices,
    pub loading: bool,
    pub wait_remaining: Option<u32>,
    pub status: RunStatus,
    pub primary: PrimaryAction,
}

#[derive(Debug)]
struct WizardState {
    step: Step,
    credentials: Credentials,
    forwarding: ForwardingConfig,
    notices: Notices,
    /// Bumped on every step change; lets late results and timers detect that
    /// the user has moved on.
    epoch: u64,
}

impl WizardState {
    fn go(&mut self, to: Step) {
        debug_assert!(
            self.step.can_transition_to(to),
            "illegal transition {} -> {to}",
            self.step
        );
        tracing::info!(from = %self.step, to = %to, "wizard step");
        self.step = to;
        self.epoch += 1;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CallKind {
    Upload,
    RequestCode,
    VerifyCode,
    Start,
    Stop,
}

enum RemoteCall {
    Upload(SessionBlob),
    RequestCode(Credentials),
    VerifyCode(Credentials),
    Start(Credentials, ForwardingConfig),
}

impl RemoteCall {
    fn kind(&self) -> CallKind {
        match self {
            RemoteCall::Upload(_) => CallKind::Upload,
            RemoteCall::RequestCode(_) => CallKind::RequestCode,
            RemoteCall::VerifyCode(_) => CallKind::VerifyCode,
            RemoteCall::Start(..) => CallKind::Start,
        }
    }
}

enum Plan {
    Local { to: Step, hint: Option<&'static str> },
    Remote(RemoteCall),
}

/// Validation gate + action for advancing from the current step.
fn plan(st: &mut WizardState) -> Result<Plan, ValidationError> {
    let Some(op) = st.step.remote_op() else {
        return plan_local(st);
    };

    let call = match op {
        RemoteOp::UploadSession => {
            let blob = st
                .credentials
                .session_blob
                .clone()
                .ok_or(ValidationError::MissingSessionFile)?;
            RemoteCall::Upload(blob)
        }
        RemoteOp::RequestCode => RemoteCall::RequestCode(st.credentials.clone()),
        RemoteOp::VerifyCode => {
            if st.credentials.confirmation_code.trim().is_empty() {
                return Err(ValidationError::MissingConfirmationCode);
            }
            RemoteCall::VerifyCode(st.credentials.clone())
        }
        RemoteOp::StartForwarding => {
            st.forwarding.validate()?;
            RemoteCall::Start(st.credentials.clone(), st.forwarding.clone())
        }
    };
    Ok(Plan::Remote(call))
}

/// Steps without a remote op move forward locally.
fn plan_local(st: &mut WizardState) -> Result<Plan, ValidationError> {
    if st.step == Step::PhoneEntry {
        let missing = st.credentials.missing_login_fields();
        if !missing.is_empty() {
            return Err(ValidationError::MissingLoginFields { missing });
        }
        st.credentials.canonicalize_phone();
        return Ok(Plan::Local {
            to: Step::TwoFactorEntry,
            hint: Some(HINT_TWO_FACTOR),
        });
    }
    // authenticated
    Ok(Plan::Local {
        to: Step::ChannelSetup,
        hint: None,
    })
}

/// How a settled remote call changes the wizard.
#[derive(Debug, Default, PartialEq, Eq)]
struct Resolution {
    to: Option<Step>,
    error: Option<String>,
    success: Option<String>,
    arm_wait: Option<u32>,
    redirect_to_phone: bool,
}

fn resolve(kind: CallKind, outcome: ApiOutcome) -> Resolution {
    let failure = match outcome {
        ApiOutcome::Success { .. } => {
            let (to, hint) = match kind {
                CallKind::Upload => (Some(Step::Authenticated), HINT_SESSION_LOADED),
                CallKind::RequestCode => (Some(Step::CodeEntry), HINT_CODE_SENT),
                CallKind::VerifyCode => (Some(Step::Authenticated), HINT_LOGGED_IN),
                CallKind::Start => (None, HINT_STARTED),
                CallKind::Stop => (None, HINT_STOPPED),
            };
            return Resolution {
                to,
                success: Some(hint.to_string()),
                ..Resolution::default()
            };
        }
        ApiOutcome::Failure(f) => f,
    };

    let mut res = Resolution {
        error: Some(failure.message.clone()),
        ..Resolution::default()
    };
    match kind {
        CallKind::Upload => res.redirect_to_phone = failure.is_session_expired(),
        CallKind::RequestCode => res.arm_wait = failure.wait_time_seconds,
        CallKind::VerifyCode => {
            res.arm_wait = failure.wait_time_seconds;
            if failure.requires_two_factor {
                res.to = Some(Step::TwoFactorEntry);
                res.success = Some(HINT_ENTER_TWO_FACTOR.to_string());
            }
        }
        CallKind::Start | CallKind::Stop => {}
    }
    res
}

/// Single in-flight call per session.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, WizardError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| WizardError::Busy)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct WizardSession {
    api: Arc<dyn ForwarderApi>,
    opts: WizardOptions,
    state: Arc<Mutex<WizardState>>,
    in_flight: AtomicBool,
    wait: WaitTimer,
    poller: StatusPoller,
    redirect: Mutex<Option<ScheduledTask>>,
}

impl WizardSession {
    /// Start a session at `credential-upload`. Must be called inside a tokio
    /// runtime: the status poller starts immediately.
    pub fn new(api: Arc<dyn ForwarderApi>, opts: WizardOptions) -> Self {
        let poller = StatusPoller::start(api.clone(), opts.status_poll_interval);
        let state = WizardState {
            step: Step::INITIAL,
            credentials: Credentials::new(opts.default_send_interval),
            forwarding: ForwardingConfig::default(),
            notices: Notices::default(),
            epoch: 0,
        };
        Self {
            api,
            opts,
            state: Arc::new(Mutex::new(state)),
            in_flight: AtomicBool::new(false),
            wait: WaitTimer::new(),
            poller,
            redirect: Mutex::new(None),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, WizardState> {
        lock(&self.state)
    }

    // ============== Queries ==============

    pub fn step(&self) -> Step {
        self.lock_state().step
    }

    pub fn notices(&self) -> Notices {
        self.lock_state().notices.clone()
    }

    pub fn credentials(&self) -> Credentials {
        self.lock_state().credentials.clone()
    }

    pub fn forwarding(&self) -> ForwardingConfig {
        self.lock_state().forwarding.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn wait_remaining(&self) -> Option<u32> {
        self.wait.remaining()
    }

    pub fn status(&self) -> RunStatus {
        self.poller.current()
    }

    /// Poll the remote status right away (outside the regular cadence).
    pub async fn refresh_status(&self) -> RunStatus {
        self.poller.poll_now().await
    }

    pub fn primary_action(&self) -> PrimaryAction {
        primary_for(self.step(), &self.poller.current())
    }

    /// Advance is refused while loading, and on gated steps while waiting.
    pub fn can_advance(&self) -> bool {
        !self.is_loading() && !(self.step().is_wait_gated() && self.wait.is_active())
    }

    pub fn view(&self) -> WizardView {
        let status = self.poller.current();
        let st = self.lock_state();
        WizardView {
            step: st.step,
            fields: st.step.fields(),
            credentials: st.credentials.clone(),
            pairs: st.forwarding.pairs().to_vec(),
            notices: st.notices.clone(),
            loading: self.is_loading(),
            wait_remaining: self.wait.remaining(),
            primary: primary_for(st.step, &status),
            status,
        }
    }

    // ============== Configuration Model ==============

    pub fn set_credential_field(
        &self,
        field: CredentialField,
        value: &str,
    ) -> Result<(), ValidationError> {
        let mut st = self.lock_state();
        st.notices.clear();
        let res = st.credentials.set(field, value);
        if let Err(e) = &res {
            st.notices.error = Some(e.to_string());
        }
        res
    }

    pub fn set_send_interval_parts(&self, minutes: u32, seconds: u32) {
        let mut st = self.lock_state();
        st.notices.clear();
        st.credentials.set_send_interval_parts(minutes, seconds);
    }

    /// Attach a session file. Contents are only judged by the remote service.
    pub fn set_session_blob(&self, blob: SessionBlob) {
        let mut st = self.lock_state();
        st.notices.clear();
        tracing::debug!(file = %blob.file_name, bytes = blob.bytes.len(), "session file attached");
        st.credentials.session_blob = Some(blob);
    }

    pub fn add_pair(&self) -> PairId {
        self.lock_state().forwarding.add_pair()
    }

    pub fn remove_pair(&self, id: &PairId) -> bool {
        self.lock_state().forwarding.remove_pair(id)
    }

    pub fn update_pair_field(&self, id: &PairId, field: PairField) -> bool {
        self.lock_state().forwarding.update_pair(id, field)
    }

    pub fn add_recipient(&self, id: &PairId) -> bool {
        self.lock_state().forwarding.add_recipient(id)
    }

    pub fn remove_recipient(&self, id: &PairId, index: usize) -> bool {
        self.lock_state().forwarding.remove_recipient(id, index)
    }

    pub fn update_recipient(&self, id: &PairId, index: usize, value: &str) -> bool {
        self.lock_state()
            .forwarding
            .update_recipient(id, index, value)
    }

    // ============== Navigation ==============

    /// Run the primary action: `stop` while forwarding runs in channel setup,
    /// `advance` otherwise.
    pub async fn submit(&self) -> Result<Advance, WizardError> {
        match self.primary_action() {
            PrimaryAction::Advance => self.advance().await,
            PrimaryAction::Stop => self.stop().await,
        }
    }

    /// Validate the current step and move forward (possibly via a remote call).
    pub async fn advance(&self) -> Result<Advance, WizardError> {
        let _flight = InFlight::acquire(&self.in_flight)?;

        let (from, epoch, call) = {
            let mut st = self.lock_state();
            let from = st.step;
            if from.is_wait_gated() {
                if let Some(remaining) = self.wait.remaining() {
                    return Err(WizardError::RetryWait { remaining });
                }
            }
            st.notices.clear();

            match plan(&mut st) {
                Err(e) => {
                    tracing::debug!(step = %from, error = %e, "advance rejected locally");
                    st.notices.error = Some(e.to_string());
                    return Err(WizardError::Invalid(e));
                }
                Ok(Plan::Local { to, hint }) => {
                    st.go(to);
                    st.notices.success = hint.map(str::to_string);
                    return Ok(Advance::Moved { from, to });
                }
                Ok(Plan::Remote(call)) => (from, st.epoch, call),
            }
        };

        // A fresh attempt supersedes any pending expiry redirect.
        self.cancel_redirect();

        let kind = call.kind();
        tracing::info!(step = %from, call = ?kind, "calling remote service");
        let outcome = match &call {
            RemoteCall::Upload(blob) => self.api.upload_session(blob).await,
            RemoteCall::RequestCode(c) => self.api.request_code(c).await,
            RemoteCall::VerifyCode(c) => self.api.verify_code(c).await,
            RemoteCall::Start(c, cfg) => self.api.start_forwarding(c, cfg).await,
        };

        Ok(self.settle(from, epoch, kind, outcome))
    }

    /// Stop remote forwarding. Only offered from channel setup.
    pub async fn stop(&self) -> Result<Advance, WizardError> {
        let _flight = InFlight::acquire(&self.in_flight)?;

        let (from, epoch) = {
            let mut st = self.lock_state();
            if st.step != Step::ChannelSetup {
                return Err(WizardError::Unavailable {
                    action: "stop",
                    step: st.step,
                });
            }
            st.notices.clear();
            (st.step, st.epoch)
        };

        tracing::info!("stopping forwarding");
        let outcome = self.api.stop_forwarding().await;
        Ok(self.settle(from, epoch, CallKind::Stop, outcome))
    }

    /// Fixed reverse navigation. Always clears messages, the wait window and
    /// any pending redirect, even when there is nowhere to go back to.
    pub fn back(&self) -> Option<Step> {
        self.wait.disarm();
        self.cancel_redirect();

        let mut st = self.lock_state();
        st.notices.clear();
        let prev = st.step.back()?;
        st.go(prev);
        Some(prev)
    }

    /// Skip the session-file upload and log in by phone instead.
    pub fn use_phone_login(&self) -> Result<Step, WizardError> {
        self.cancel_redirect();

        let mut st = self.lock_state();
        if st.step != Step::CredentialUpload {
            return Err(WizardError::Unavailable {
                action: "phone login",
                step: st.step,
            });
        }
        st.notices.clear();
        st.go(Step::PhoneEntry);
        Ok(Step::PhoneEntry)
    }

    /// Stop every timer owned by the session.
    pub fn shutdown(&self) {
        self.poller.stop();
        self.wait.disarm();
        self.cancel_redirect();
    }

    fn settle(&self, from: Step, epoch: u64, kind: CallKind, outcome: ApiOutcome) -> Advance {
        if let ApiOutcome::Failure(f) = &outcome {
            tracing::warn!(step = %from, call = ?kind, kind = ?f.kind, message = %f.message, "remote call failed");
        }
        let res = resolve(kind, outcome);

        // The remote run state may have changed even if the result is discarded.
        if matches!(kind, CallKind::Start | CallKind::Stop) {
            self.poller.request_refresh();
        }

        let advance = {
            let mut st = self.lock_state();
            st.notices.error = res.error;
            st.notices.success = res.success;

            if st.epoch != epoch {
                tracing::debug!(from = %from, now = %st.step, "result arrived after navigation; not applied");
                return Advance::Discarded { step: st.step };
            }

            match res.to {
                Some(to) => {
                    st.go(to);
                    Advance::Moved { from, to }
                }
                None => Advance::Stayed { step: st.step },
            }
        };

        if let Some(seconds) = res.arm_wait {
            self.wait.arm(seconds);
        }
        if res.redirect_to_phone {
            self.schedule_expiry_redirect(epoch);
        }
        advance
    }

    fn schedule_expiry_redirect(&self, epoch: u64) {
        let state = self.state.clone();
        let delay = self.opts.expiry_redirect_delay;
        let task = ScheduledTask::spawn(move |cancel| async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            let mut st = lock(&state);
            if st.step == Step::CredentialUpload && st.epoch == epoch {
                st.go(Step::PhoneEntry);
            }
        });
        *lock(&self.redirect) = Some(task);
    }

    fn cancel_redirect(&self) {
        if let Some(task) = lock(&self.redirect).take() {
            task.stop();
        }
    }
}

impl Drop for WizardSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn primary_for(step: Step, status: &RunStatus) -> PrimaryAction {
    if step == Step::ChannelSetup && status.is_running {
        PrimaryAction::Stop
    } else {
        PrimaryAction::Advance
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

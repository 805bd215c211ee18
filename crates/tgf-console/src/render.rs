//! Plain-text rendering of a wizard snapshot.

use std::fmt::Write as _;

use tgf_core::{
    api::types::RunStatus,
    model::credentials::{CredentialField, Credentials},
    model::forwarding::ForwardingPair,
    utils::format_interval,
    wizard::{InputField, PrimaryAction, Step, WizardView},
};

const EMPTY: &str = "(empty)";

/// Fixed-width mask so the length of a secret is not revealed.
fn mask(value: &str) -> &'static str {
    if value.is_empty() {
        EMPTY
    } else {
        "********"
    }
}

fn credential_for(field: InputField) -> Option<CredentialField> {
    Some(match field {
        InputField::AppId => CredentialField::AppId,
        InputField::AppSecret => CredentialField::AppSecret,
        InputField::PhoneNumber => CredentialField::PhoneNumber,
        InputField::TwoFactorSecret => CredentialField::TwoFactorSecret,
        InputField::ConfirmationCode => CredentialField::ConfirmationCode,
        InputField::SendInterval => CredentialField::SendInterval,
        InputField::SessionFile | InputField::ForwardingPairs => return None,
    })
}

fn field_value(field: CredentialField, creds: &Credentials) -> String {
    if field == CredentialField::SendInterval {
        return format_interval(creds.send_interval);
    }
    let value = creds.get(field);
    if field.is_secret() {
        return mask(&value).to_string();
    }
    if value.is_empty() {
        EMPTY.to_string()
    } else {
        value
    }
}

pub fn primary_label(step: Step, primary: PrimaryAction) -> &'static str {
    if primary == PrimaryAction::Stop {
        return "Stop forwarding";
    }
    match step {
        Step::CredentialUpload => "Upload session",
        Step::PhoneEntry => "Continue",
        Step::TwoFactorEntry => "Send code",
        Step::CodeEntry => "Verify code",
        Step::Authenticated => "Configure channels",
        Step::ChannelSetup => "Start forwarding",
    }
}

pub fn status_line(status: &RunStatus) -> String {
    let mut line = format!(
        "Forwarding: {} | Telegram: {}",
        if status.is_running { "running" } else { "stopped" },
        if status.is_connected {
            "connected"
        } else {
            "disconnected"
        },
    );
    if !status.last_message.is_empty() {
        let _ = write!(line, " | {}", status.last_message);
    }
    if let Some(at) = status.last_update_at() {
        let _ = write!(line, " ({})", at.format("%H:%M:%S"));
    }
    line
}

fn render_pairs(out: &mut String, pairs: &[ForwardingPair]) {
    if pairs.is_empty() {
        out.push_str("  Channel pairs: none (pair add)\n");
        return;
    }
    out.push_str("  Channel pairs:\n");
    for (i, pair) in pairs.iter().enumerate() {
        let source = if pair.donor_id.is_empty() {
            EMPTY
        } else {
            pair.donor_id.as_str()
        };
        let dests: Vec<&str> = pair
            .recipient_ids
            .iter()
            .map(|d| if d.is_empty() { EMPTY } else { d.as_str() })
            .collect();
        let _ = writeln!(out, "    {}. {source} -> {}", i + 1, dests.join(", "));
    }
}

pub fn render(view: &WizardView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", view.step.title());

    for &field in view.fields {
        match field {
            InputField::SessionFile => {
                let name = view
                    .credentials
                    .session_blob
                    .as_ref()
                    .map(|b| b.file_name.as_str())
                    .unwrap_or("(none)");
                let _ = writeln!(out, "  Session file: {name}");
            }
            InputField::ForwardingPairs => render_pairs(&mut out, &view.pairs),
            other => {
                if let Some(cf) = credential_for(other) {
                    let _ = writeln!(
                        out,
                        "  {}: {}",
                        cf.label(),
                        field_value(cf, &view.credentials)
                    );
                }
            }
        }
    }

    if let Some(err) = &view.notices.error {
        let _ = writeln!(out, "  ! {err}");
    }
    if let Some(ok) = &view.notices.success {
        let _ = writeln!(out, "  + {ok}");
    }
    if view.loading {
        out.push_str("  Working...\n");
    }
    if let Some(secs) = view.wait_remaining {
        let _ = writeln!(out, "  Retry available in {secs}s");
    }

    let _ = writeln!(out, "  {}", status_line(&view.status));
    let _ = writeln!(
        out,
        "  [next] {}",
        primary_label(view.step, view.primary)
    );
    out
}

/// Command list for the current view. `dest rm` only shows up when some pair
/// has a destination that can be removed.
pub fn help(view: &WizardView) -> String {
    let mut lines = vec![
        "next                      run the primary action",
        "back                      previous step",
    ];
    match view.step {
        Step::CredentialUpload => {
            lines.push("file <path>               attach a session file");
            lines.push("phone                     log in with a phone number instead");
        }
        Step::PhoneEntry => {
            lines.push("set app-id <value>");
            lines.push("set app-secret <value>");
            lines.push("set phone <value>");
        }
        Step::TwoFactorEntry => lines.push("set 2fa [<password>]      leave empty when 2FA is off"),
        Step::CodeEntry => lines.push("set code <value>"),
        Step::Authenticated => {}
        Step::ChannelSetup => {
            lines.push("set interval <seconds>");
            lines.push("interval <minutes> <seconds>");
            lines.push("pair add | pair rm <n>");
            lines.push("pair source <n> <id>");
            lines.push("pair dests <n> <id,id,...>");
            lines.push("dest add <n> | dest set <n> <i> <id>");
            if view.pairs.iter().any(ForwardingPair::can_remove_recipient) {
                lines.push("dest rm <n> <i>");
            }
        }
    }
    lines.push("status                    refresh the run status");
    lines.push("quit");

    let mut out = String::from("Commands:\n");
    for l in lines {
        let _ = writeln!(out, "  {l}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tgf_core::{
        domain::{PairId, SessionBlob},
        wizard::Notices,
    };

    fn view(step: Step) -> WizardView {
        WizardView {
            step,
            fields: step.fields(),
            credentials: Credentials::new(90),
            pairs: vec![],
            notices: Notices::default(),
            loading: false,
            wait_remaining: None,
            status: RunStatus::default(),
            primary: PrimaryAction::Advance,
        }
    }

    #[test]
    fn secrets_are_masked() {
        let mut v = view(Step::PhoneEntry);
        v.credentials.app_id = "123456".into();
        v.credentials.app_secret = "0123456789abcdef".into();

        let text = render(&v);
        assert!(text.contains("API ID: 123456"));
        assert!(text.contains("API Hash: ********"));
        assert!(!text.contains("0123456789abcdef"));
        assert!(text.contains("Phone number: (empty)"));
    }

    #[test]
    fn shows_messages_loading_and_wait() {
        let mut v = view(Step::TwoFactorEntry);
        v.notices.error = Some("Too many attempts".into());
        v.loading = true;
        v.wait_remaining = Some(12);

        let text = render(&v);
        assert!(text.contains("! Too many attempts"));
        assert!(text.contains("Working..."));
        assert!(text.contains("Retry available in 12s"));
        assert!(text.contains("[next] Send code"));
    }

    #[test]
    fn channel_setup_lists_pairs_and_interval() {
        let mut v = view(Step::ChannelSetup);
        v.pairs = vec![ForwardingPair {
            id: PairId("p1".into()),
            donor_id: "-1001".into(),
            recipient_ids: vec!["-2001".into(), String::new()],
        }];
        v.status.is_running = true;
        v.primary = PrimaryAction::Stop;

        let text = render(&v);
        assert!(text.contains("Send interval: 1m 30s"));
        assert!(text.contains("1. -1001 -> -2001, (empty)"));
        assert!(text.contains("Forwarding: running"));
        assert!(text.contains("[next] Stop forwarding"));
    }

    #[test]
    fn upload_shows_attached_file() {
        let mut v = view(Step::CredentialUpload);
        assert!(render(&v).contains("Session file: (none)"));
        v.credentials.session_blob = Some(SessionBlob::new("me.session", vec![1]));
        assert!(render(&v).contains("Session file: me.session"));
    }

    #[test]
    fn dest_rm_is_listed_only_when_removable() {
        let mut v = view(Step::ChannelSetup);
        v.pairs = vec![ForwardingPair {
            id: PairId("p1".into()),
            donor_id: "-1001".into(),
            recipient_ids: vec!["-2001".into()],
        }];
        assert!(!help(&v).contains("dest rm"));

        v.pairs[0].recipient_ids.push("-2002".into());
        assert!(help(&v).contains("dest rm"));
    }
}

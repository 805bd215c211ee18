//! Line-oriented terminal front end for the setup wizard.

pub mod commands;
pub mod render;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use tgf_core::{
    api::port::ForwarderApi,
    config::Config,
    domain::{PairId, SessionBlob},
    model::forwarding::PairField,
    wizard::{WizardOptions, WizardSession},
};

use crate::commands::{parse_command, Command, ParseError};

/// What the loop does after a command ran.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    /// Print the refreshed view.
    Render,
    /// Print a one-off note, then the view.
    Note(String),
    Help,
    Quit,
}

fn pair_at(session: &WizardSession, n: usize) -> Result<PairId, String> {
    session
        .forwarding()
        .pairs()
        .get(n - 1)
        .map(|p| p.id.clone())
        .ok_or_else(|| format!("no pair #{n}"))
}

fn note_unless(applied: bool, msg: impl FnOnce() -> String) -> Flow {
    if applied {
        Flow::Render
    } else {
        Flow::Note(msg())
    }
}

/// Apply one parsed command to the session.
pub async fn execute(session: &WizardSession, cmd: Command) -> Flow {
    match cmd {
        Command::Help => Flow::Help,
        Command::Quit => Flow::Quit,
        Command::Next => match session.submit().await {
            Ok(_) => Flow::Render,
            Err(e) => Flow::Note(e.to_string()),
        },
        Command::Back => {
            if session.back().is_none() {
                return Flow::Note("already at the first step".to_string());
            }
            Flow::Render
        }
        Command::Phone => match session.use_phone_login() {
            Ok(_) => Flow::Render,
            Err(e) => Flow::Note(e.to_string()),
        },
        Command::File(path) => match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let name = path
                    .file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or("session")
                    .to_string();
                session.set_session_blob(SessionBlob::new(name, bytes));
                Flow::Render
            }
            Err(e) => Flow::Note(format!("cannot read {}: {e}", path.display())),
        },
        Command::Set(field, value) => {
            // A rejected value shows up as the view's pending error.
            let _ = session.set_credential_field(field, &value);
            Flow::Render
        }
        Command::Interval { minutes, seconds } => {
            session.set_send_interval_parts(minutes, seconds);
            Flow::Render
        }
        Command::PairAdd => {
            session.add_pair();
            Flow::Render
        }
        Command::PairRemove(n) => match pair_at(session, n) {
            Ok(id) => note_unless(session.remove_pair(&id), || format!("no pair #{n}")),
            Err(e) => Flow::Note(e),
        },
        Command::PairSource(n, donor) => match pair_at(session, n) {
            Ok(id) => note_unless(
                session.update_pair_field(&id, PairField::DonorId(donor)),
                || format!("no pair #{n}"),
            ),
            Err(e) => Flow::Note(e),
        },
        Command::PairDests(n, ids) => match pair_at(session, n) {
            Ok(id) => note_unless(
                session.update_pair_field(&id, PairField::RecipientIds(ids)),
                || format!("no pair #{n}"),
            ),
            Err(e) => Flow::Note(e),
        },
        Command::DestAdd(n) => match pair_at(session, n) {
            Ok(id) => note_unless(session.add_recipient(&id), || format!("no pair #{n}")),
            Err(e) => Flow::Note(e),
        },
        Command::DestRemove(n, i) => {
            let cfg = session.forwarding();
            let Some(pair) = cfg.pairs().get(n - 1) else {
                return Flow::Note(format!("no pair #{n}"));
            };
            if !pair.can_remove_recipient() {
                return Flow::Note(format!("pair #{n} needs at least one destination"));
            }
            note_unless(session.remove_recipient(&pair.id, i - 1), || {
                format!("no destination #{i} in pair #{n}")
            })
        }
        Command::DestSet(n, i, value) => match pair_at(session, n) {
            Ok(id) => note_unless(session.update_recipient(&id, i - 1, &value), || {
                format!("no destination #{i} in pair #{n}")
            }),
            Err(e) => Flow::Note(e),
        },
        Command::Status => {
            session.refresh_status().await;
            Flow::Render
        }
    }
}

/// Drive a wizard session from stdin until `quit` or end of input.
pub async fn run(cfg: &Config, api: Arc<dyn ForwarderApi>) -> anyhow::Result<()> {
    let session = WizardSession::new(api, WizardOptions::from(cfg));
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    tracing::info!(api = %cfg.api_base_url, "console started");
    let view = session.view();
    let banner = format!("{}\n{}", render::help(&view), render::render(&view));
    stdout.write_all(banner.as_bytes()).await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let flow = match parse_command(&line) {
            Ok(cmd) => execute(&session, cmd).await,
            Err(ParseError::Empty) => Flow::Render,
            Err(e) => Flow::Note(e.to_string()),
        };

        let view = session.view();
        let text = match flow {
            Flow::Quit => break,
            Flow::Render => render::render(&view),
            Flow::Note(note) => format!("{note}\n{}", render::render(&view)),
            Flow::Help => render::help(&view),
        };
        stdout.write_all(text.as_bytes()).await?;
        stdout.flush().await?;
    }

    session.shutdown();
    tracing::info!("console closed");
    Ok(())
}

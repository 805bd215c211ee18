use std::path::PathBuf;

use tgf_core::model::credentials::CredentialField;

/// One console line, parsed. Pair and destination positions are 1-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Next,
    Back,
    Phone,
    File(PathBuf),
    Set(CredentialField, String),
    Interval { minutes: u32, seconds: u32 },
    PairAdd,
    PairRemove(usize),
    PairSource(usize, String),
    PairDests(usize, Vec<String>),
    DestAdd(usize),
    DestRemove(usize, usize),
    DestSet(usize, usize, String),
    Status,
    Quit,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

const USAGE_FILE: &str = "file <path>";
const USAGE_SET: &str = "set <app-id|app-secret|phone|2fa|code|interval> <value>";
const USAGE_INTERVAL: &str = "interval <minutes> <seconds>";
const USAGE_PAIR: &str = "pair add | pair rm <n> | pair source <n> <id> | pair dests <n> <id,id,...>";
const USAGE_DEST: &str = "dest add <n> | dest rm <n> <i> | dest set <n> <i> <id>";

fn split_first(text: &str) -> (String, &str) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").to_lowercase();
    let rest = parts.next().unwrap_or("").trim();
    (first, rest)
}

fn position(raw: &str, usage: &'static str) -> Result<usize, ParseError> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseError::Usage(usage)),
    }
}

fn field_key(key: &str) -> Option<CredentialField> {
    Some(match key {
        "app-id" => CredentialField::AppId,
        "app-secret" => CredentialField::AppSecret,
        "phone" => CredentialField::PhoneNumber,
        "2fa" => CredentialField::TwoFactorSecret,
        "code" => CredentialField::ConfirmationCode,
        "interval" => CredentialField::SendInterval,
        _ => return None,
    })
}

pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let (cmd, rest) = split_first(line);
    if cmd.is_empty() {
        return Err(ParseError::Empty);
    }

    match cmd.as_str() {
        "help" | "?" => Ok(Command::Help),
        "next" => Ok(Command::Next),
        "back" => Ok(Command::Back),
        "phone" => Ok(Command::Phone),
        "status" => Ok(Command::Status),
        "quit" | "exit" => Ok(Command::Quit),
        "file" => {
            if rest.is_empty() {
                return Err(ParseError::Usage(USAGE_FILE));
            }
            Ok(Command::File(PathBuf::from(rest)))
        }
        "set" => {
            let (key, value) = split_first(rest);
            let field = field_key(&key).ok_or(ParseError::Usage(USAGE_SET))?;
            // The 2FA password may legitimately be cleared.
            if value.is_empty() && field != CredentialField::TwoFactorSecret {
                return Err(ParseError::Usage(USAGE_SET));
            }
            Ok(Command::Set(field, value.to_string()))
        }
        "interval" => {
            let args: Vec<&str> = rest.split_whitespace().collect();
            let [m, s] = args.as_slice() else {
                return Err(ParseError::Usage(USAGE_INTERVAL));
            };
            let minutes = m.parse().map_err(|_| ParseError::Usage(USAGE_INTERVAL))?;
            let seconds = s.parse().map_err(|_| ParseError::Usage(USAGE_INTERVAL))?;
            Ok(Command::Interval { minutes, seconds })
        }
        "pair" => parse_pair(rest),
        "dest" => parse_dest(rest),
        other => Err(ParseError::Unknown(other.to_string())),
    }
}

fn parse_pair(rest: &str) -> Result<Command, ParseError> {
    let args: Vec<&str> = rest.split_whitespace().collect();
    match args.as_slice() {
        ["add"] => Ok(Command::PairAdd),
        ["rm", n] => Ok(Command::PairRemove(position(n, USAGE_PAIR)?)),
        ["source", n, id] => Ok(Command::PairSource(position(n, USAGE_PAIR)?, id.to_string())),
        ["dests", n, ids @ ..] if !ids.is_empty() => {
            let ids: Vec<String> = ids
                .iter()
                .flat_map(|chunk| chunk.split(','))
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
            if ids.is_empty() {
                return Err(ParseError::Usage(USAGE_PAIR));
            }
            Ok(Command::PairDests(position(n, USAGE_PAIR)?, ids))
        }
        _ => Err(ParseError::Usage(USAGE_PAIR)),
    }
}

fn parse_dest(rest: &str) -> Result<Command, ParseError> {
    let args: Vec<&str> = rest.split_whitespace().collect();
    match args.as_slice() {
        ["add", n] => Ok(Command::DestAdd(position(n, USAGE_DEST)?)),
        ["rm", n, i] => Ok(Command::DestRemove(
            position(n, USAGE_DEST)?,
            position(i, USAGE_DEST)?,
        )),
        ["set", n, i, id] => Ok(Command::DestSet(
            position(n, USAGE_DEST)?,
            position(i, USAGE_DEST)?,
            id.to_string(),
        )),
        _ => Err(ParseError::Usage(USAGE_DEST)),
    }
}

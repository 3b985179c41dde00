use colored::*;
use std::fmt::Display;
use vectara_core::client::ClientError;
use vectara_core::interpret::{Extracted, Outcome, StatusFailure};
use vectara_core::operation::CorpusInfo;
use vectara_core::status::StatusResult;

use crate::cli::ArgsError;

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

pub struct GenericError<T: Display>(pub &'static str, pub T);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<&Outcome> for FormattedString {
    fn from(outcome: &Outcome) -> Self {
        let mut out = match outcome {
            Outcome::Success { .. } => format!("{}", "OK".green().bold()),
            Outcome::Informational { statuses, .. } => {
                let mut out = format!("{}", "OK, with notices:".yellow().bold());
                for status in statuses {
                    out.push_str(&format!("\n  - {}", status_line(status)));
                }
                out
            }
            Outcome::PartialFailure { failures, .. } => {
                format!("{}{}", "Partially failed:".yellow().bold(), failure_lines(failures))
            }
            Outcome::Failure { failures } => {
                format!("{}{}", "Failed:".red().bold(), failure_lines(failures))
            }
        };

        if let Some(extracted) = outcome.extracted() {
            let body = extracted_lines(extracted);
            if !body.is_empty() {
                out.push_str("\n\n");
                out.push_str(&body);
            }
        }

        FormattedString(out)
    }
}

impl From<ClientError> for FormattedString {
    fn from(err: ClientError) -> Self {
        let label = match &err {
            ClientError::Auth(_) => "Authentication Failed:",
            ClientError::Transport(_) => "Call Failed:",
            ClientError::MissingCorpus(_) => "Invalid Call:",
        };
        FormattedString(format!("{}\n\n'{}'", label.red().bold(), err))
    }
}

impl From<ArgsError> for FormattedString {
    fn from(err: ArgsError) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Invalid configuration:".red().bold(),
            err
        ))
    }
}

impl From<std::io::Error> for FormattedString {
    fn from(err: std::io::Error) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Failed to read file:".red().bold(),
            err
        ))
    }
}

impl<T: Display> From<GenericError<T>> for FormattedString {
    fn from(GenericError(msg, err): GenericError<T>) -> Self {
        FormattedString(format!("{}:\n\n'{}'", msg.red().bold(), err))
    }
}

fn status_line(status: &StatusResult) -> String {
    if status.status_detail.is_empty() {
        status.code.to_string().yellow().to_string()
    } else {
        format!("{} {}", status.code.to_string().yellow(), status.status_detail)
    }
}

fn failure_lines(failures: &[StatusFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("\n  - {failure}"))
        .collect()
}

fn extracted_lines(extracted: &Extracted) -> String {
    match extracted {
        Extracted::Ack => String::new(),
        Extracted::CorpusId(id) => format!("{} {}", "Corpus id:".cyan(), id),
        Extracted::Hits(hits) if hits.is_empty() => "No results".dimmed().to_string(),
        Extracted::Hits(hits) => hits
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                format!(
                    "{:>3}. {} {}\n     {}",
                    i + 1,
                    format!("{:.3}", hit.score).cyan(),
                    hit.document_id.bold(),
                    hit.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Extracted::CorpusSize(size) => format!(
            "{} {} (as of epoch {})",
            "Size:".cyan(),
            size.size,
            size.epoch_secs
        ),
        Extracted::ApiKeyIds(ids) => ids
            .iter()
            .map(|id| format!("{} {}", "Key id:".cyan(), id))
            .collect::<Vec<_>>()
            .join("\n"),
        Extracted::ApiKeys(keys) if keys.is_empty() => "No API keys".dimmed().to_string(),
        Extracted::ApiKeys(keys) => keys
            .iter()
            .map(|key| {
                let state = if key.enabled {
                    "enabled".green()
                } else {
                    "disabled".red()
                };
                let corpora = key
                    .corpora
                    .iter()
                    .map(|c| format!("{} ({})", c.corpus_name, c.corpus_id))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "{} [{}] {} {}\n     {}",
                    key.key_id.bold(),
                    key.key_type,
                    state,
                    key.description,
                    corpora
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Extracted::CorpusInfo(info) => corpus_info_lines(info),
        Extracted::UsageMetrics(values) if values.is_empty() => {
            "No usage in this window".dimmed().to_string()
        }
        Extracted::UsageMetrics(values) => values
            .iter()
            .map(|value| {
                format!(
                    "{}  {} queries, {} rows read",
                    value.start.cyan(),
                    value.query_count,
                    value.rows_read
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Extracted::UserIds(ids) => ids
            .iter()
            .map(|id| format!("{} {}", "User id:".cyan(), id))
            .collect::<Vec<_>>()
            .join("\n"),
        Extracted::Users(users) if users.is_empty() => "No users".dimmed().to_string(),
        Extracted::Users(users) => users
            .iter()
            .map(|user| {
                format!(
                    "{:>6} {} <{}> {}",
                    user.user_id,
                    user.handle.bold(),
                    user.email,
                    user.user_status.dimmed()
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn corpus_info_lines(info: &CorpusInfo) -> String {
    let state = if info.enabled {
        "enabled".green()
    } else {
        "disabled".red()
    };
    let mut lines = vec![
        format!("{} {} ({}) {}", "Corpus:".cyan(), info.name.bold(), info.corpus_id, state),
        format!("{} {}", "Provisioned:".cyan(), info.provisioned),
    ];
    if !info.description.is_empty() {
        lines.push(format!("{} {}", "Description:".cyan(), info.description));
    }
    if let Some(size) = &info.size {
        lines.push(format!("{} {}", "Size:".cyan(), size.size));
    }
    lines.extend(info.api_keys.iter().map(|key| {
        format!(
            "{} {} [{}] {}",
            "Key:".cyan(),
            key.key_id,
            key.key_type,
            if key.enabled { "enabled" } else { "disabled" }
        )
    }));
    lines.join("\n")
}

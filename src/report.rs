//! Structured reports handed to the layer above this crate.
//!
//! Validation and resolution never print anything themselves. They produce
//! [`ReportItem`]s, and the caller decides whether a report is fatal, can be
//! overridden with a force flag, or is just shown to the user.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Debug,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Info => "Info",
            Severity::Debug => "Debug",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportCode {
    AgentNameGuessed,
    AgentNameGuessFoundNone,
    AgentNameGuessFoundMoreThanOne,
    InvalidResourceAgentName,
    InvalidStonithAgentName,
    UnableToGetAgentMetadata,
    InvalidOption,
    RequiredOptionIsMissing,
}

/// Which force flag lets the user override an error report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForceCode {
    ForceOptions,
    ForceMetadataIssue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportItem {
    pub severity: Severity,
    pub code: ReportCode,
    pub info: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forceable: Option<ForceCode>,
}

impl ReportItem {
    fn new(
        severity: Severity,
        code: ReportCode,
        info: Value,
        forceable: Option<ForceCode>,
    ) -> Self {
        let info = match info {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            severity,
            code,
            info,
            forceable,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn agent_name_guessed(entered_name: &str, guessed_name: &str) -> Self {
        Self::new(
            Severity::Info,
            ReportCode::AgentNameGuessed,
            json!({ "entered_name": entered_name, "guessed_name": guessed_name }),
            None,
        )
    }

    pub fn agent_name_guess_found_none(agent: &str) -> Self {
        Self::new(
            Severity::Error,
            ReportCode::AgentNameGuessFoundNone,
            json!({ "agent": agent }),
            None,
        )
    }

    pub fn agent_name_guess_found_more_than_one(agent: &str, possible_agents: &[String]) -> Self {
        Self::new(
            Severity::Error,
            ReportCode::AgentNameGuessFoundMoreThanOne,
            json!({ "agent": agent, "possible_agents": possible_agents }),
            None,
        )
    }

    pub fn invalid_resource_agent_name(name: &str) -> Self {
        Self::new(
            Severity::Error,
            ReportCode::InvalidResourceAgentName,
            json!({ "name": name }),
            None,
        )
    }

    pub fn invalid_stonith_agent_name(name: &str) -> Self {
        Self::new(
            Severity::Error,
            ReportCode::InvalidStonithAgentName,
            json!({ "name": name }),
            None,
        )
    }

    pub fn unable_to_get_agent_metadata(
        agent: &str,
        reason: &str,
        severity: Severity,
        forceable: Option<ForceCode>,
    ) -> Self {
        Self::new(
            severity,
            ReportCode::UnableToGetAgentMetadata,
            json!({ "agent": agent, "reason": reason }),
            forceable,
        )
    }

    pub fn invalid_option(
        option_names: &[String],
        allowed: &[String],
        option_type: &str,
        severity: Severity,
        forceable: Option<ForceCode>,
    ) -> Self {
        Self::new(
            severity,
            ReportCode::InvalidOption,
            json!({
                "option_names": option_names,
                "option_type": option_type,
                "allowed": allowed,
            }),
            forceable,
        )
    }

    pub fn required_option_is_missing(
        option_names: &[String],
        option_type: &str,
        severity: Severity,
        forceable: Option<ForceCode>,
    ) -> Self {
        Self::new(
            severity,
            ReportCode::RequiredOptionIsMissing,
            json!({ "option_names": option_names, "option_type": option_type }),
            forceable,
        )
    }

    fn info_str(&self, key: &str) -> &str {
        self.info.get(key).and_then(Value::as_str).unwrap_or("")
    }

    fn info_list(&self, key: &str) -> String {
        self.info
            .get(key)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|v| format!("'{}'", v))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default()
    }

    fn message(&self) -> String {
        match self.code {
            ReportCode::AgentNameGuessed => format!(
                "Assumed agent name '{}' (deduced from '{}')",
                self.info_str("guessed_name"),
                self.info_str("entered_name")
            ),
            ReportCode::AgentNameGuessFoundNone => format!(
                "Unable to find agent '{}', try specifying its full name",
                self.info_str("agent")
            ),
            ReportCode::AgentNameGuessFoundMoreThanOne => format!(
                "Multiple agents match '{}', please specify full name: {}",
                self.info_str("agent"),
                self.info_list("possible_agents")
            ),
            ReportCode::InvalidResourceAgentName => format!(
                "Invalid resource agent name '{}'. Use standard:provider:type when standard is 'ocf' or standard:type otherwise.",
                self.info_str("name")
            ),
            ReportCode::InvalidStonithAgentName => format!(
                "Invalid stonith agent name '{}'. Agent name cannot contain the ':' character.",
                self.info_str("name")
            ),
            ReportCode::UnableToGetAgentMetadata => format!(
                "Agent '{}' is not installed or does not provide valid metadata: {}",
                self.info_str("agent"),
                self.info_str("reason")
            ),
            ReportCode::InvalidOption => format!(
                "invalid {} option {}, allowed options are: {}",
                self.info_str("option_type"),
                self.info_list("option_names"),
                self.info_list("allowed")
            ),
            ReportCode::RequiredOptionIsMissing => format!(
                "required {} option {} is missing",
                self.info_str("option_type"),
                self.info_list("option_names")
            ),
        }
    }
}

impl fmt::Display for ReportItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity.as_str(), self.message())?;
        if self.is_error() && self.forceable.is_some() {
            write!(f, ", use --force to override")?;
        }
        Ok(())
    }
}

/// Sink for non-fatal reports produced while resolving agents.
pub trait ReportProcessor {
    fn process(&mut self, item: ReportItem);
}

impl ReportProcessor for Vec<ReportItem> {
    fn process(&mut self, item: ReportItem) {
        self.push(item);
    }
}

/// Prints reports on stderr, the way the CLI shows them to operators.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    errors: usize,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

impl ReportProcessor for ConsoleReporter {
    fn process(&mut self, item: ReportItem) {
        tracing::debug!(
            code = ?item.code,
            severity = item.severity.as_str(),
            info = ?item.info,
            "Report"
        );
        if item.is_error() {
            self.errors += 1;
        }
        if item.severity != Severity::Debug {
            eprintln!("{}", item);
        }
    }
}

use crate::report::{ForceCode, ReportItem, Severity};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PcmkError {
    #[error("Invalid resource agent name '{name}': {reason}")]
    InvalidAgentName { name: String, reason: String },

    #[error("Invalid stonith agent name '{name}'. List of agents can be obtained by using command 'pcmk-agents stonith-agents'. Do not use the 'stonith:' prefix. Agent name cannot contain the ':' character.")]
    InvalidStonithAgentName { name: String },

    #[error("Agent '{agent}' is not installed or does not provide valid metadata: {message}")]
    UnableToGetAgentMetadata { agent: String, message: String },

    #[error("Unable to find agent '{agent}', try specifying its full name")]
    AgentNameGuessFoundNone { agent: String },

    #[error("Multiple agents match '{agent}', please specify full name: {}", possible_agents.join(", "))]
    AgentNameGuessFoundMoreThanOne {
        agent: String,
        possible_agents: Vec<String>,
    },

    #[error("{}", render_reports(.0))]
    Reported(Vec<ReportItem>),

    #[error("Unable to run '{command}': {reason}")]
    CommandSpawn { command: String, reason: String },

    #[error("Command '{command}' did not finish within {seconds}s")]
    CommandTimeout { command: String, seconds: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PcmkError {
    /// Turn an agent error into a report the upper layer can print or force.
    ///
    /// Returns `None` for errors outside the agent domain, which callers
    /// propagate unchanged.
    pub fn to_report_item(
        &self,
        severity: Severity,
        forceable: Option<ForceCode>,
    ) -> Option<ReportItem> {
        let item = match self {
            PcmkError::InvalidAgentName { name, .. } => {
                ReportItem::invalid_resource_agent_name(name)
            }
            PcmkError::InvalidStonithAgentName { name } => {
                ReportItem::invalid_stonith_agent_name(name)
            }
            PcmkError::UnableToGetAgentMetadata { agent, message } => {
                ReportItem::unable_to_get_agent_metadata(agent, message, severity, forceable)
            }
            PcmkError::AgentNameGuessFoundNone { agent } => {
                ReportItem::agent_name_guess_found_none(agent)
            }
            PcmkError::AgentNameGuessFoundMoreThanOne {
                agent,
                possible_agents,
            } => ReportItem::agent_name_guess_found_more_than_one(agent, possible_agents),
            _ => return None,
        };
        Some(item)
    }

    /// Wrap an agent error into a single error report, leaving other errors as they are.
    pub fn into_reported(self, forceable: Option<ForceCode>) -> Self {
        match self.to_report_item(Severity::Error, forceable) {
            Some(item) => PcmkError::Reported(vec![item]),
            None => self,
        }
    }

    /// Drop force codes from carried reports, for callers with no way to force.
    pub fn into_unforceable(self) -> Self {
        match self {
            PcmkError::Reported(mut items) => {
                for item in &mut items {
                    item.forceable = None;
                }
                PcmkError::Reported(items)
            }
            other => other,
        }
    }

    /// Reports carried by a `Reported` error, empty for every other kind.
    pub fn reports(&self) -> &[ReportItem] {
        match self {
            PcmkError::Reported(items) => items,
            _ => &[],
        }
    }
}

fn render_reports(items: &[ReportItem]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

pub type Result<T> = std::result::Result<T, PcmkError>;

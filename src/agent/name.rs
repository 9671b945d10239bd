//! Agent identifiers: `standard[:provider]:type`.

use crate::error::{PcmkError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Standards Pacemaker knows how to run.
pub const STANDARDS: &[&str] = &["ocf", "lsb", "service", "systemd", "nagios", "stonith"];

/// systemd units may be instantiated (`getty@tty1`) and the instance part may
/// contain colons, so for these standards everything after the first colon
/// is the type.
static INSTANCE_UNIT: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(?P<standard>systemd|service):(?P<type>[^:@]+@.*)$").ok());

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AgentName {
    standard: String,
    provider: Option<String>,
    #[serde(rename = "type")]
    agent_type: String,
}

impl AgentName {
    /// Build a name from already validated parts.
    pub fn new(
        standard: impl Into<String>,
        provider: Option<String>,
        agent_type: impl Into<String>,
    ) -> Self {
        Self {
            standard: standard.into(),
            provider,
            agent_type: agent_type.into(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| PcmkError::InvalidAgentName {
            name: raw.to_string(),
            reason: reason.to_string(),
        };

        if let Some(caps) = INSTANCE_UNIT.as_ref().and_then(|re| re.captures(raw)) {
            return Ok(Self::new(&caps["standard"], None, &caps["type"]));
        }

        let parts: Vec<&str> = raw.split(':').collect();
        let (standard, provider, agent_type) = match parts.as_slice() {
            [standard, provider, agent_type] => (*standard, Some(*provider), *agent_type),
            [standard, agent_type] => (*standard, None, *agent_type),
            _ => {
                return Err(invalid(
                    "expected standard:provider:type or standard:type",
                ))
            }
        };

        if !STANDARDS.contains(&standard) {
            return Err(invalid(&format!("unknown standard '{}'", standard)));
        }
        if standard == "ocf" && provider.is_none() {
            return Err(invalid("ocf agents require a provider"));
        }
        if standard != "ocf" && provider.is_some() {
            return Err(invalid(&format!(
                "'{}' agents cannot have a provider",
                standard
            )));
        }
        if agent_type.is_empty() || provider.is_some_and(str::is_empty) {
            return Err(invalid("empty name segment"));
        }

        Ok(Self::new(standard, provider.map(str::to_string), agent_type))
    }

    /// Fence agents live in one flat namespace: the name is just the type.
    pub fn stonith(agent_type: &str) -> Result<Self> {
        if agent_type.contains(':') || agent_type.is_empty() {
            return Err(PcmkError::InvalidStonithAgentName {
                name: agent_type.to_string(),
            });
        }
        Ok(Self::new("stonith", None, agent_type))
    }

    pub fn standard(&self) -> &str {
        &self.standard
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn agent_type(&self) -> &str {
        &self.agent_type
    }

    pub fn is_ocf(&self) -> bool {
        self.standard == "ocf"
    }

    /// `standard[:provider]:type`
    pub fn full_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.provider {
            Some(provider) => write!(f, "{}:{}:{}", self.standard, provider, self.agent_type),
            None => write!(f, "{}:{}", self.standard, self.agent_type),
        }
    }
}

impl FromStr for AgentName {
    type Err = PcmkError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

//! Turning what a user typed into a usable agent.

use super::catalog::{list_agents, list_standards_and_providers};
use super::resource::{AbsentResourceAgent, ResourceAgent};
use super::stonith::StonithAgent;
use super::{Agent, AgentContext};
use crate::error::{PcmkError, Result};
use crate::report::{ForceCode, ReportItem, ReportProcessor, Severity};
use tracing::{debug, info};

/// Every OCF agent whose type matches `agent_type` case-insensitively and
/// whose metadata can be loaded, in provider order.
pub fn guess_full_name<'a>(ctx: AgentContext<'a>, agent_type: &str) -> Vec<ResourceAgent<'a>> {
    let wanted = agent_type.to_lowercase();

    let mut candidates = Vec::new();
    for standard_provider in list_standards_and_providers(ctx) {
        if !standard_provider.starts_with("ocf:") {
            continue;
        }
        for found in list_agents(ctx, &standard_provider) {
            if found.to_lowercase() != wanted {
                continue;
            }
            let full_name = format!("{}:{}", standard_provider, found);
            match ResourceAgent::new(ctx, &full_name) {
                Ok(agent) => candidates.push(agent),
                Err(e) => debug!(agent = %full_name, error = %e, "Skipping unusable agent name"),
            }
        }
    }

    candidates
        .into_iter()
        .filter_map(|mut agent| agent.is_valid_metadata().then_some(agent))
        .collect()
}

/// Like [`guess_full_name`], but anything other than a single match is an error.
pub fn guess_exactly_one_full_name<'a>(
    ctx: AgentContext<'a>,
    agent_type: &str,
) -> Result<ResourceAgent<'a>> {
    let mut agents = guess_full_name(ctx, agent_type);
    match agents.len() {
        0 => Err(PcmkError::AgentNameGuessFoundNone {
            agent: agent_type.to_string(),
        }),
        1 => Ok(agents.remove(0)),
        _ => Err(PcmkError::AgentNameGuessFoundMoreThanOne {
            agent: agent_type.to_string(),
            possible_agents: agents.iter().map(|agent| agent.name()).collect(),
        }),
    }
}

/// Resolve a resource agent by full name, or by bare type when there is no colon.
///
/// With `allowed_absent`, an agent whose metadata cannot be loaded is
/// replaced by an [`AbsentResourceAgent`] and a warning is reported.
/// Otherwise the failure is returned as a forceable error report.
pub fn find_valid_resource_agent_by_name<'a>(
    reporter: &mut dyn ReportProcessor,
    ctx: AgentContext<'a>,
    name: &str,
    allowed_absent: bool,
) -> Result<Box<dyn Agent + 'a>> {
    if !name.contains(':') {
        let agent = guess_exactly_one_full_name(ctx, name)?;
        info!(entered = name, guessed = %agent.name(), "Guessed agent name");
        reporter.process(ReportItem::agent_name_guessed(name, &agent.name()));
        return Ok(Box::new(agent));
    }

    let mut agent = ResourceAgent::new(ctx, name).map_err(|e| e.into_reported(None))?;

    match agent.validate_metadata() {
        Ok(()) => Ok(Box::new(agent)),
        Err(e @ PcmkError::UnableToGetAgentMetadata { .. }) if allowed_absent => {
            if let Some(item) = e.to_report_item(Severity::Warning, None) {
                reporter.process(item);
            }
            Ok(Box::new(AbsentResourceAgent::new(agent.agent_name().clone())))
        }
        Err(e) => Err(e.into_reported(Some(ForceCode::ForceMetadataIssue))),
    }
}

/// Resolve a fence agent by its bare type. There is no guessing and no fallback.
pub fn find_valid_stonith_agent_by_name<'a>(
    ctx: AgentContext<'a>,
    name: &str,
) -> Result<StonithAgent<'a>> {
    let mut agent = StonithAgent::new(ctx, name).map_err(|e| e.into_reported(None))?;

    agent
        .validate_metadata()
        .map_err(|e| e.into_reported(Some(ForceCode::ForceMetadataIssue)))?;

    Ok(agent)
}

use crate::agent::resolver::{find_valid_resource_agent_by_name, find_valid_stonith_agent_by_name};
use crate::agent::{Agent, AgentContext, ParameterValues};
use crate::error::{PcmkError, Result};
use crate::report::{ConsoleReporter, ReportProcessor};

/// Check `params` against the agent and print every report.
///
/// Returns whether the parameters are acceptable, which with `force` means
/// only that the agent name could be resolved.
pub fn execute(
    ctx: AgentContext<'_>,
    name: &str,
    params: &[(String, String)],
    stonith: bool,
    force: bool,
) -> Result<bool> {
    let mut reporter = ConsoleReporter::new();
    let mut agent: Box<dyn Agent + '_> = if stonith {
        // Fence agents have no absent stand-in, so a metadata failure cannot be forced.
        let agent =
            find_valid_stonith_agent_by_name(ctx, name).map_err(PcmkError::into_unforceable)?;
        Box::new(agent)
    } else {
        find_valid_resource_agent_by_name(&mut reporter, ctx, name, force)?
    };

    let actual: ParameterValues = params.iter().cloned().collect();
    for report in agent.validate_parameters(&actual, force)? {
        reporter.process(report);
    }

    if reporter.has_errors() {
        return Ok(false);
    }
    if agent.is_absent() {
        println!("Agent '{}' has no metadata, parameters were not checked", agent.name());
    } else {
        println!("Parameters of '{}' are valid", agent.name());
    }
    Ok(true)
}

//! Generic resource agents (ocf, lsb, systemd, service, nagios).

use super::metadata::{MetadataDocument, ParameterDescriptor};
use super::name::AgentName;
use super::validation::ParameterValues;
use super::{load_metadata, Agent, AgentContext};
use crate::error::Result;

/// A resource agent whose metadata comes from `crm_resource`.
pub struct ResourceAgent<'a> {
    ctx: AgentContext<'a>,
    name: AgentName,
    metadata: Option<MetadataDocument>,
}

impl<'a> ResourceAgent<'a> {
    /// Parse `full_name` and build the agent. Nothing is run yet.
    pub fn new(ctx: AgentContext<'a>, full_name: &str) -> Result<Self> {
        Ok(Self::from_name(ctx, AgentName::parse(full_name)?))
    }

    pub fn from_name(ctx: AgentContext<'a>, name: AgentName) -> Self {
        Self {
            ctx,
            name,
            metadata: None,
        }
    }

    pub fn agent_name(&self) -> &AgentName {
        &self.name
    }

    /// Pacemaker's own OCF agents understand the tracing parameters.
    fn supports_tracing(&self) -> bool {
        self.name.is_ocf() && self.name.provider() == Some("pacemaker")
    }
}

impl Agent for ResourceAgent<'_> {
    fn name(&self) -> String {
        self.name.full_name()
    }

    fn metadata(&mut self) -> Result<&MetadataDocument> {
        let document = match self.metadata.take() {
            Some(document) => document,
            None => {
                let full_name = self.name.full_name();
                let invocation = self.ctx.show_metadata(&full_name);
                load_metadata(self.ctx.runner, &invocation, &full_name)?
            }
        };
        Ok(&*self.metadata.insert(document))
    }

    fn parameters(&mut self) -> Result<Vec<ParameterDescriptor>> {
        let mut parameters = super::metadata::parameters(self.metadata()?.root());
        if self.supports_tracing() {
            for trace in trace_parameters() {
                if !parameters.iter().any(|p| p.name == trace.name) {
                    parameters.push(trace);
                }
            }
        }
        Ok(parameters)
    }
}

fn trace_parameters() -> [ParameterDescriptor; 2] {
    let trace_ra_short = "Set to 1 to turn on resource agent tracing (expect large output)";
    let trace_file_desc = "Path to a file to store resource agent tracing log";

    [
        ParameterDescriptor {
            shortdesc: trace_ra_short.to_string(),
            longdesc: format!(
                "{}\nThe trace output will be saved to trace_file, if set, or by default to \
                 $HA_VARRUN/ra_trace/<type>/<id>.<action>.<timestamp> e.g. \
                 $HA_VARRUN/ra_trace/oracle/db.start.2012-11-27.08:37:08",
                trace_ra_short
            ),
            param_type: "integer".to_string(),
            default: Some("0".to_string()),
            advanced: true,
            ..ParameterDescriptor::named("trace_ra")
        },
        ParameterDescriptor {
            shortdesc: trace_file_desc.to_string(),
            longdesc: trace_file_desc.to_string(),
            default: Some(String::new()),
            advanced: true,
            ..ParameterDescriptor::named("trace_file")
        },
    ]
}

/// Stand-in for a resource agent whose metadata could not be loaded.
///
/// It describes nothing and accepts any parameters, so commands run with
/// `--force` can go on without knowing the agent.
pub struct AbsentResourceAgent {
    name: AgentName,
    metadata: MetadataDocument,
}

impl AbsentResourceAgent {
    pub fn new(name: AgentName) -> Self {
        Self {
            name,
            metadata: MetadataDocument::empty(),
        }
    }

    pub fn agent_name(&self) -> &AgentName {
        &self.name
    }
}

impl Agent for AbsentResourceAgent {
    fn name(&self) -> String {
        self.name.full_name()
    }

    fn metadata(&mut self) -> Result<&MetadataDocument> {
        Ok(&self.metadata)
    }

    fn is_absent(&self) -> bool {
        true
    }

    fn parameters(&mut self) -> Result<Vec<ParameterDescriptor>> {
        Ok(Vec::new())
    }

    fn validate_parameters_values(
        &mut self,
        _actual: &ParameterValues,
    ) -> Result<(Vec<String>, Vec<String>)> {
        Ok((Vec::new(), Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::StonithdCache;
    use crate::config::ToolPaths;
    use crate::error::PcmkError;
    use crate::runner::ScriptedRunner;

    const METADATA: &str = r#"
        <resource-agent>
            <parameters>
                <parameter name="state"/>
                <parameter name="trace_file">
                    <shortdesc>Own trace file</shortdesc>
                </parameter>
            </parameters>
        </resource-agent>
    "#;

    fn parameter_names(full_name: &str) -> Vec<String> {
        let runner = ScriptedRunner::new().respond(METADATA, "", 0);
        let tools = ToolPaths::default();
        let cache = StonithdCache::new();
        let ctx = AgentContext::new(&runner, &tools, &cache);
        let mut agent = ResourceAgent::new(ctx, full_name).unwrap();
        agent
            .parameters()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect()
    }

    #[test]
    fn test_invalid_name_fails_before_running_anything() {
        let runner = ScriptedRunner::new();
        let tools = ToolPaths::default();
        let cache = StonithdCache::new();
        let ctx = AgentContext::new(&runner, &tools, &cache);

        let result = ResourceAgent::new(ctx, "ocf:Dummy");
        assert!(matches!(result, Err(PcmkError::InvalidAgentName { .. })));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_pacemaker_agents_get_missing_trace_parameters() {
        assert_eq!(
            parameter_names("ocf:pacemaker:Dummy"),
            vec!["state", "trace_file", "trace_ra"]
        );
    }

    #[test]
    fn test_other_agents_do_not_get_trace_parameters() {
        assert_eq!(parameter_names("ocf:heartbeat:Dummy"), vec!["state", "trace_file"]);
        assert_eq!(parameter_names("systemd:pacemaker"), vec!["state", "trace_file"]);
    }

    #[test]
    fn test_trace_parameter_descriptors() {
        let [trace_ra, trace_file] = trace_parameters();
        assert_eq!(trace_ra.param_type, "integer");
        assert_eq!(trace_ra.default.as_deref(), Some("0"));
        assert!(trace_ra.advanced);
        assert!(trace_ra.longdesc.starts_with(&trace_ra.shortdesc));
        assert!(trace_ra.longdesc.contains("$HA_VARRUN/ra_trace/<type>/<id>.<action>.<timestamp>"));
        assert_eq!(trace_file.param_type, "string");
        assert_eq!(trace_file.default.as_deref(), Some(""));
        assert_eq!(trace_file.shortdesc, trace_file.longdesc);
    }

    #[test]
    fn test_absent_agent_is_empty_but_valid() {
        let mut agent =
            AbsentResourceAgent::new(AgentName::parse("ocf:heartbeat:Missing").unwrap());
        assert!(agent.is_absent());
        assert!(agent.is_valid_metadata());
        assert_eq!(agent.name(), "ocf:heartbeat:Missing");
        assert_eq!(agent.shortdesc().unwrap(), "");
        assert_eq!(agent.longdesc().unwrap(), "");
        assert!(agent.parameters().unwrap().is_empty());
        assert!(agent.actions().unwrap().is_empty());

        let mut actual = ParameterValues::new();
        actual.insert("anything".to_string(), "goes".to_string());
        assert_eq!(
            agent.validate_parameters_values(&actual).unwrap(),
            (Vec::<String>::new(), Vec::<String>::new())
        );
        assert!(agent.validate_parameters(&actual, false).unwrap().is_empty());
    }

    #[test]
    fn test_absent_pacemaker_agent_has_no_trace_parameters() {
        let mut agent =
            AbsentResourceAgent::new(AgentName::parse("ocf:pacemaker:Missing").unwrap());
        assert!(agent.parameters().unwrap().is_empty());
    }
}

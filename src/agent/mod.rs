//! Resource and fence agents: naming, discovery, metadata and validation.

pub mod catalog;
pub mod metadata;
pub mod name;
pub mod resolver;
pub mod resource;
pub mod stonith;
pub mod validation;

pub use metadata::{ActionDescriptor, MetadataDocument, ParameterDescriptor};
pub use name::AgentName;
pub use resource::{AbsentResourceAgent, ResourceAgent};
pub use stonith::{StonithAgent, StonithdCache, StonithdMetadata};
pub use validation::ParameterValues;

use crate::config::ToolPaths;
use crate::error::{PcmkError, Result};
use crate::report::ReportItem;
use crate::runner::{CommandRunner, Invocation};
use serde::Serialize;
use tracing::debug;

/// What every agent needs to talk to the cluster stack.
#[derive(Clone, Copy)]
pub struct AgentContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub tools: &'a ToolPaths,
    pub stonithd: &'a StonithdCache,
}

impl<'a> AgentContext<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        tools: &'a ToolPaths,
        stonithd: &'a StonithdCache,
    ) -> Self {
        Self {
            runner,
            tools,
            stonithd,
        }
    }

    /// `crm_resource --show-metadata NAME`, run with the fixed agent `PATH`.
    fn show_metadata(&self, full_name: &str) -> Invocation {
        Invocation::new([
            self.tools.crm_resource(),
            "--show-metadata".to_string(),
            full_name.to_string(),
        ])
        .env("PATH", self.tools.metadata_path_env.as_str())
    }
}

/// Serializable summary of an agent, in three levels of detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentInfo {
    pub name: String,
    pub shortdesc: String,
    pub longdesc: String,
    pub parameters: Vec<ParameterDescriptor>,
    pub actions: Vec<ActionDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_actions: Option<Vec<ActionDescriptor>>,
}

/// An agent whose self-description is a metadata document.
///
/// Implementors provide the name and the lazily fetched document; every
/// derived view is computed from the document on request. Accessors take
/// `&mut self` because the first one to run fills the metadata cache.
pub trait Agent {
    fn name(&self) -> String;

    /// The metadata document, fetched on first use and kept afterwards.
    fn metadata(&mut self) -> Result<&MetadataDocument>;

    /// How parameters of this agent are called in reports.
    fn option_type(&self) -> &'static str {
        "resource agent parameter"
    }

    /// True for the stand-in used when a missing agent is tolerated.
    fn is_absent(&self) -> bool {
        false
    }

    fn shortdesc(&mut self) -> Result<String> {
        Ok(metadata::shortdesc(self.metadata()?.root()))
    }

    fn longdesc(&mut self) -> Result<String> {
        Ok(metadata::longdesc(self.metadata()?.root()))
    }

    fn parameters(&mut self) -> Result<Vec<ParameterDescriptor>> {
        Ok(metadata::parameters(self.metadata()?.root()))
    }

    fn actions(&mut self) -> Result<Vec<ActionDescriptor>> {
        Ok(metadata::actions(self.metadata()?.root()))
    }

    fn cib_default_actions(&mut self, necessary_only: bool) -> Result<Vec<ActionDescriptor>> {
        Ok(metadata::cib_default_actions(&self.actions()?, necessary_only))
    }

    /// Fetch the metadata now and fail if it cannot be obtained.
    fn validate_metadata(&mut self) -> Result<()> {
        self.metadata().map(|_| ())
    }

    fn is_valid_metadata(&mut self) -> bool {
        let error = match self.metadata() {
            Ok(_) => return true,
            Err(e) => e,
        };
        debug!(agent = %self.name(), error = %error, "Agent metadata is not usable");
        false
    }

    /// Names given but not accepted, and required names not given.
    fn validate_parameters_values(
        &mut self,
        actual: &ParameterValues,
    ) -> Result<(Vec<String>, Vec<String>)> {
        Ok(validation::invalid_and_missing(&self.parameters()?, actual))
    }

    /// Turn the parameter check into reports, forceable unless `allow_invalid`.
    fn validate_parameters(
        &mut self,
        actual: &ParameterValues,
        allow_invalid: bool,
    ) -> Result<Vec<ReportItem>> {
        let (invalid, missing) = self.validate_parameters_values(actual)?;
        let allowed = self
            .parameters()?
            .into_iter()
            .map(|param| param.name)
            .collect();
        Ok(validation::reports(
            &invalid,
            &missing,
            allowed,
            self.option_type(),
            allow_invalid,
        ))
    }

    fn name_info(&self) -> AgentInfo {
        AgentInfo {
            name: self.name(),
            shortdesc: String::new(),
            longdesc: String::new(),
            parameters: Vec::new(),
            actions: Vec::new(),
            default_actions: None,
        }
    }

    fn description_info(&mut self) -> Result<AgentInfo> {
        Ok(AgentInfo {
            shortdesc: self.shortdesc()?,
            longdesc: self.longdesc()?,
            ..self.name_info()
        })
    }

    fn full_info(&mut self) -> Result<AgentInfo> {
        Ok(AgentInfo {
            parameters: self.parameters()?,
            actions: self.actions()?,
            default_actions: Some(self.cib_default_actions(false)?),
            ..self.description_info()?
        })
    }
}

/// Run a metadata command and parse its output.
///
/// Every failure is reported as `UnableToGetAgentMetadata` for `agent`.
fn load_metadata(
    runner: &dyn CommandRunner,
    invocation: &Invocation,
    agent: &str,
) -> Result<MetadataDocument> {
    let unable = |message: String| PcmkError::UnableToGetAgentMetadata {
        agent: agent.to_string(),
        message,
    };

    let output = runner.run(invocation).map_err(|e| unable(e.to_string()))?;
    if !output.success() {
        return Err(unable(output.stderr.trim().to_string()));
    }

    let document = MetadataDocument::parse(&output.stdout).map_err(|e| unable(e.to_string()))?;
    debug!(agent, "Loaded agent metadata");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportCode, Severity};
    use crate::runner::ScriptedRunner;

    const DUMMY_METADATA: &str = r#"
        <resource-agent name="Dummy">
            <shortdesc>Example stateless resource agent</shortdesc>
            <longdesc>
                This is a Dummy Resource Agent.
            </longdesc>
            <parameters>
                <parameter name="state" required="1">
                    <shortdesc>State file</shortdesc>
                    <content type="string" default="/var/run/Dummy.state"/>
                </parameter>
                <parameter name="fake">
                    <content type="string" default="dummy"/>
                </parameter>
            </parameters>
            <actions>
                <action name="start" timeout="20s"/>
                <action name="stop" timeout="20s"/>
                <action name="monitor" timeout="20s" interval="10s" depth="0"/>
                <action name="meta-data" timeout="5s"/>
            </actions>
        </resource-agent>
    "#;

    fn with_agent<F>(runner: &ScriptedRunner, test: F)
    where
        F: FnOnce(&mut ResourceAgent<'_>),
    {
        let tools = ToolPaths::default();
        let cache = StonithdCache::new();
        let ctx = AgentContext::new(runner, &tools, &cache);
        let mut agent = ResourceAgent::new(ctx, "ocf:heartbeat:Dummy").unwrap();
        test(&mut agent);
    }

    #[test]
    fn test_metadata_is_fetched_once() {
        let runner = ScriptedRunner::new().respond(DUMMY_METADATA, "", 0);
        with_agent(&runner, |agent| {
            assert_eq!(agent.shortdesc().unwrap(), "Example stateless resource agent");
            assert_eq!(agent.longdesc().unwrap(), "This is a Dummy Resource Agent.");
            assert_eq!(agent.parameters().unwrap().len(), 2);
        });
        assert_eq!(runner.calls().len(), 1);
        assert_eq!(
            runner.calls()[0].argv,
            vec!["/usr/sbin/crm_resource", "--show-metadata", "ocf:heartbeat:Dummy"]
        );
        assert_eq!(
            runner.calls()[0].env_extend.get("PATH").map(String::as_str),
            Some("/usr/sbin/:/bin/:/usr/bin/")
        );
    }

    #[test]
    fn test_failed_fetch_reports_stderr() {
        let runner = ScriptedRunner::new().respond("", "  some error\n", 1);
        with_agent(&runner, |agent| match agent.validate_metadata() {
            Err(PcmkError::UnableToGetAgentMetadata { agent, message }) => {
                assert_eq!(agent, "ocf:heartbeat:Dummy");
                assert_eq!(message, "some error");
            }
            other => panic!("unexpected result: {:?}", other),
        });
    }

    #[test]
    fn test_invalid_xml_is_unable_to_get_metadata() {
        let runner = ScriptedRunner::new().respond("not xml", "", 0);
        with_agent(&runner, |agent| {
            assert!(matches!(
                agent.validate_metadata(),
                Err(PcmkError::UnableToGetAgentMetadata { .. })
            ));
        });
    }

    #[test]
    fn test_is_valid_metadata_swallows_failure() {
        let runner = ScriptedRunner::new().respond("", "missing", 1);
        with_agent(&runner, |agent| assert!(!agent.is_valid_metadata()));

        let runner = ScriptedRunner::new().respond(DUMMY_METADATA, "", 0);
        with_agent(&runner, |agent| assert!(agent.is_valid_metadata()));
    }

    #[test]
    fn test_full_info() {
        let runner = ScriptedRunner::new().respond(DUMMY_METADATA, "", 0);
        with_agent(&runner, |agent| {
            let info = agent.full_info().unwrap();
            assert_eq!(info.name, "ocf:heartbeat:Dummy");
            assert_eq!(info.parameters[0].name, "state");
            assert_eq!(info.actions.len(), 4);
            let defaults = info.default_actions.unwrap();
            assert_eq!(defaults.len(), 2);
            assert_eq!(defaults[0]["name"], "start");
            assert_eq!(defaults[0]["interval"], "0s");
            assert_eq!(defaults[1]["name"], "monitor");
            assert_eq!(defaults[1]["interval"], "10s");
            assert!(!defaults[1].contains_key("depth"));
        });
    }

    #[test]
    fn test_name_info_does_not_fetch() {
        let runner = ScriptedRunner::new();
        with_agent(&runner, |agent| {
            let value = serde_json::to_value(agent.name_info()).unwrap();
            assert_eq!(value["name"], "ocf:heartbeat:Dummy");
            assert_eq!(value["shortdesc"], "");
            assert!(value.get("default_actions").is_none());
        });
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_validate_parameters_reports() {
        let runner = ScriptedRunner::new().respond(DUMMY_METADATA, "", 0);
        with_agent(&runner, |agent| {
            let mut actual = ParameterValues::new();
            actual.insert("unknown".to_string(), "value".to_string());

            let reports = agent.validate_parameters(&actual, false).unwrap();
            assert_eq!(reports.len(), 2);
            assert_eq!(reports[0].code, ReportCode::InvalidOption);
            assert_eq!(reports[0].severity, Severity::Error);
            assert_eq!(reports[0].info["allowed"], serde_json::json!(["fake", "state"]));
            assert_eq!(reports[1].code, ReportCode::RequiredOptionIsMissing);
            assert_eq!(reports[1].info["option_names"], serde_json::json!(["state"]));

            let reports = agent.validate_parameters(&actual, true).unwrap();
            assert!(reports.iter().all(|r| r.severity == Severity::Warning));
            assert!(reports.iter().all(|r| r.forceable.is_none()));
        });
    }
}

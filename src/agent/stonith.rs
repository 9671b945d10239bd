//! Fence agents and the fencing daemon's own parameters.

use super::metadata::{self, MetadataDocument, ParameterDescriptor};
use super::name::AgentName;
use super::{load_metadata, Agent, AgentContext};
use crate::error::Result;
use crate::runner::Invocation;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Parameters every fence agent declares but Pacemaker drives itself.
const INTERNAL_PARAMETERS: &[&str] = &["debug", "verbose", "help", "version"];

const ACTION_WARNING: &str =
    "WARNING: specifying 'action' is deprecated and not necessary with current Pacemaker versions.";

const ADVANCED_PREFIX: &str = "Advanced use only:";

/// The fencing daemon's metadata, shared by every fence agent of a process.
///
/// It is fetched the first time a fence agent needs it and kept until
/// [`StonithdCache::reset`]. A failed fetch is not remembered.
#[derive(Debug, Default)]
pub struct StonithdCache {
    metadata: RefCell<Option<Rc<MetadataDocument>>>,
}

impl StonithdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_fetch<F>(&self, fetch: F) -> Result<Rc<MetadataDocument>>
    where
        F: FnOnce() -> Result<MetadataDocument>,
    {
        if let Some(document) = self.metadata.borrow().as_ref() {
            return Ok(Rc::clone(document));
        }

        let document = Rc::new(fetch()?);
        debug!("Cached fencing daemon metadata");
        *self.metadata.borrow_mut() = Some(Rc::clone(&document));
        Ok(document)
    }

    pub fn is_populated(&self) -> bool {
        self.metadata.borrow().is_some()
    }

    pub fn reset(&self) {
        self.metadata.borrow_mut().take();
    }
}

/// The fencing daemon, described as an agent. All its parameters are advanced.
pub struct StonithdMetadata<'a> {
    ctx: AgentContext<'a>,
    metadata: Option<Rc<MetadataDocument>>,
}

impl<'a> StonithdMetadata<'a> {
    pub fn new(ctx: AgentContext<'a>) -> Self {
        Self {
            ctx,
            metadata: None,
        }
    }
}

impl Agent for StonithdMetadata<'_> {
    fn name(&self) -> String {
        "stonithd".to_string()
    }

    fn metadata(&mut self) -> Result<&MetadataDocument> {
        let document = match self.metadata.take() {
            Some(document) => document,
            None => {
                let ctx = self.ctx;
                ctx.stonithd.get_or_fetch(|| {
                    let invocation =
                        Invocation::new([ctx.tools.stonithd(), "metadata".to_string()]);
                    load_metadata(ctx.runner, &invocation, "stonithd")
                })?
            }
        };
        Ok(&**self.metadata.insert(document))
    }

    fn option_type(&self) -> &'static str {
        "stonith agent parameter"
    }

    fn parameters(&mut self) -> Result<Vec<ParameterDescriptor>> {
        let parameters = metadata::parameters(self.metadata()?.root())
            .into_iter()
            .map(|mut param| {
                param.advanced = true;
                if param.shortdesc.starts_with(ADVANCED_PREFIX) {
                    param.longdesc =
                        join_lines(&[param.shortdesc.as_str(), param.longdesc.as_str()]);
                }
                param
            })
            .collect();
        Ok(parameters)
    }
}

/// A fence agent, named by its bare type (`fence_xvm`).
pub struct StonithAgent<'a> {
    ctx: AgentContext<'a>,
    name: AgentName,
    metadata: Option<MetadataDocument>,
}

impl<'a> StonithAgent<'a> {
    pub fn new(ctx: AgentContext<'a>, agent_type: &str) -> Result<Self> {
        Ok(Self {
            ctx,
            name: AgentName::stonith(agent_type)?,
            metadata: None,
        })
    }

    pub fn agent_name(&self) -> &AgentName {
        &self.name
    }

    /// Whether the agent must be run to unfence a node before it rejoins.
    pub fn provides_unfencing(&mut self) -> Result<bool> {
        Ok(self.actions()?.iter().any(|action| {
            action.get("name").is_some_and(|v| v == "on")
                && action.get("on_target").is_some_and(|v| v == "1")
                && action.get("automatic").is_some_and(|v| v == "1")
        }))
    }

    fn own_parameters(&mut self) -> Result<Vec<ParameterDescriptor>> {
        let parameters = metadata::parameters(self.metadata()?.root())
            .into_iter()
            .filter(|param| !INTERNAL_PARAMETERS.contains(&param.name.as_str()))
            .map(|mut param| {
                if param.name == "action" {
                    param.shortdesc = join_lines(&[param.shortdesc.as_str(), ACTION_WARNING]);
                    param.required = false;
                }
                param
            })
            .collect();
        Ok(parameters)
    }
}

impl Agent for StonithAgent<'_> {
    fn name(&self) -> String {
        self.name.agent_type().to_string()
    }

    fn metadata(&mut self) -> Result<&MetadataDocument> {
        let document = match self.metadata.take() {
            Some(document) => document,
            None => {
                let invocation = self.ctx.show_metadata(&self.name.full_name());
                load_metadata(self.ctx.runner, &invocation, self.name.agent_type())?
            }
        };
        Ok(&*self.metadata.insert(document))
    }

    fn option_type(&self) -> &'static str {
        "stonith agent parameter"
    }

    /// The agent's own parameters followed by the fencing daemon's.
    fn parameters(&mut self) -> Result<Vec<ParameterDescriptor>> {
        let mut parameters = self.own_parameters()?;
        parameters.extend(StonithdMetadata::new(self.ctx).parameters()?);
        Ok(parameters)
    }
}

fn join_lines(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}

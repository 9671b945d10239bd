use crate::agent::resolver::{find_valid_resource_agent_by_name, find_valid_stonith_agent_by_name};
use crate::agent::{ActionDescriptor, Agent, AgentContext, AgentInfo, ParameterDescriptor};
use crate::error::{PcmkError, Result};
use crate::report::ConsoleReporter;
use std::fmt::Write;

pub fn execute(ctx: AgentContext<'_>, name: &str, stonith: bool, json: bool) -> Result<()> {
    let mut reporter = ConsoleReporter::new();
    let mut agent: Box<dyn Agent + '_> = if stonith {
        let agent =
            find_valid_stonith_agent_by_name(ctx, name).map_err(PcmkError::into_unforceable)?;
        Box::new(agent)
    } else {
        find_valid_resource_agent_by_name(&mut reporter, ctx, name, false)
            .map_err(PcmkError::into_unforceable)?
    };

    let info = agent.full_info()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        let title = if stonith {
            "Stonith options"
        } else {
            "Resource options"
        };
        print!("{}", render(&info, title));
    }

    Ok(())
}

/// Human readable description of an agent.
fn render(info: &AgentInfo, options_title: &str) -> String {
    let mut out = String::new();

    if info.shortdesc.is_empty() {
        let _ = writeln!(out, "{}", info.name);
    } else {
        let _ = writeln!(out, "{} - {}", info.name, info.shortdesc);
    }
    if !info.longdesc.is_empty() {
        let _ = writeln!(out, "\n{}", indent(&info.longdesc, ""));
    }

    if !info.parameters.is_empty() {
        let _ = writeln!(out, "\n{}:", options_title);
        for param in &info.parameters {
            out.push_str(&render_parameter(param));
        }
    }

    if let Some(defaults) = &info.default_actions {
        if !defaults.is_empty() {
            let _ = writeln!(out, "\nDefault operations:");
            for action in defaults {
                let _ = writeln!(out, "  {}", render_action(action));
            }
        }
    }

    out
}

fn render_parameter(param: &ParameterDescriptor) -> String {
    let mut flags = Vec::new();
    if param.required {
        flags.push("required");
    }
    if param.advanced {
        flags.push("advanced");
    }
    if param.deprecated {
        flags.push("deprecated");
    }

    let mut line = format!("  {}", param.name);
    if !flags.is_empty() {
        line.push_str(&format!(" ({})", flags.join(", ")));
    }
    line.push(':');
    let desc = if param.longdesc.is_empty() {
        &param.shortdesc
    } else {
        &param.longdesc
    };
    if !desc.is_empty() {
        line.push(' ');
        line.push_str(indent(desc, "    ").trim_start());
    }
    if let Some(default) = param.default.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(&format!("\n    Default: {}", default));
    }
    line.push('\n');
    line
}

/// `name: key=value key=value`, name first and the rest in declared order.
fn render_action(action: &ActionDescriptor) -> String {
    let name = action.get("name").map(String::as_str).unwrap_or("");
    let attributes: Vec<String> = action
        .iter()
        .filter(|(key, _)| key.as_str() != "name")
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    format!("{}: {}", name, attributes.join(" "))
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

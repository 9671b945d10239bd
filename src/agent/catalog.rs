//! Listing the standards, providers and agents installed on a node.
//!
//! `crm_resource` exits non-zero when a category is simply empty, so none of
//! these functions fail: a tool error yields an empty list and a log line.

use super::AgentContext;
use crate::runner::Invocation;
use tracing::{debug, warn};

/// Fence helper binaries shipped next to real fence agents.
const HIDDEN_STONITH_AGENTS: &[&str] = &[
    "fence_ack_manual",
    "fence_check",
    "fence_kdump_send",
    "fence_legacy",
    "fence_na",
    "fence_node",
    "fence_nss_wrapper",
    "fence_pcmk",
    "fence_sanlockd",
    "fence_tool",
    "fence_virtd",
    "fence_vmware_helper",
];

/// Run `crm_resource` with `args` and return the non-empty trimmed lines.
fn crm_resource_lines(ctx: AgentContext<'_>, args: &[&str]) -> Vec<String> {
    let invocation = Invocation::new(
        std::iter::once(ctx.tools.crm_resource()).chain(args.iter().map(|arg| arg.to_string())),
    );

    let output = match ctx.runner.run(&invocation) {
        Ok(output) => output,
        Err(e) => {
            warn!(
                command = %invocation,
                error = %e,
                "Agent discovery failed, assuming nothing installed"
            );
            return Vec::new();
        }
    };
    if !output.success() {
        debug!(
            command = %invocation,
            exit_code = output.exit_code,
            stderr = %output.stderr.trim(),
            "Agent discovery returned an error, treating it as empty"
        );
    }

    output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn sort_case_insensitive(items: &mut [String]) {
    items.sort_by_key(|item| item.to_lowercase());
}

/// Resource agent standards, without the `stonith` pseudo-standard.
pub fn list_standards(ctx: AgentContext<'_>) -> Vec<String> {
    let mut standards: Vec<String> = crm_resource_lines(ctx, &["--list-standards"])
        .into_iter()
        .filter(|standard| standard != "stonith")
        .collect();
    standards.sort();
    standards
}

pub fn list_ocf_providers(ctx: AgentContext<'_>) -> Vec<String> {
    let mut providers = crm_resource_lines(ctx, &["--list-ocf-providers"]);
    providers.sort();
    providers
}

/// Standards, with `ocf` expanded into one `ocf:PROVIDER` entry per provider.
pub fn list_standards_and_providers(ctx: AgentContext<'_>) -> Vec<String> {
    let mut result: Vec<String> = list_standards(ctx)
        .into_iter()
        .filter(|standard| standard != "ocf")
        .collect();
    result.extend(
        list_ocf_providers(ctx)
            .into_iter()
            .map(|provider| format!("ocf:{}", provider)),
    );
    result.sort();
    result
}

/// Agent types of one `standard[:provider]`.
pub fn list_agents(ctx: AgentContext<'_>, standard_provider: &str) -> Vec<String> {
    let mut agents = crm_resource_lines(ctx, &["--list-agents", standard_provider]);
    sort_case_insensitive(&mut agents);
    agents
}

/// Installed fence agents a user can configure.
pub fn list_stonith_agents(ctx: AgentContext<'_>) -> Vec<String> {
    let mut agents: Vec<String> = crm_resource_lines(ctx, &["--list-agents", "stonith"])
        .into_iter()
        .filter(|agent| !HIDDEN_STONITH_AGENTS.contains(&agent.as_str()))
        .collect();
    sort_case_insensitive(&mut agents);
    agents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::StonithdCache;
    use crate::config::ToolPaths;
    use crate::runner::ScriptedRunner;

    fn run<T>(runner: &ScriptedRunner, list: impl FnOnce(AgentContext<'_>) -> T) -> T {
        let tools = ToolPaths::default();
        let cache = StonithdCache::new();
        list(AgentContext::new(runner, &tools, &cache))
    }

    #[test]
    fn test_list_standards() {
        let runner = ScriptedRunner::new().respond(
            "ocf\n  lsb \nservice\n\nsystemd\nnagios\nstonith\n",
            "",
            0,
        );
        let standards = run(&runner, list_standards);

        assert_eq!(standards, vec!["lsb", "nagios", "ocf", "service", "systemd"]);
        assert_eq!(
            runner.calls()[0].argv,
            vec!["/usr/sbin/crm_resource", "--list-standards"]
        );
    }

    #[test]
    fn test_list_standards_ignores_errors() {
        let runner = ScriptedRunner::new().respond("", "No agents found", 1);
        assert!(run(&runner, list_standards).is_empty());
    }

    #[test]
    fn test_list_standards_survives_missing_tool() {
        let runner = ScriptedRunner::new();
        assert!(run(&runner, list_standards).is_empty());
    }

    #[test]
    fn test_list_ocf_providers() {
        let runner = ScriptedRunner::new().respond("heartbeat\n\npacemaker\nbooth\n", "", 0);
        assert_eq!(
            run(&runner, list_ocf_providers),
            vec!["booth", "heartbeat", "pacemaker"]
        );
        assert_eq!(
            runner.calls()[0].argv,
            vec!["/usr/sbin/crm_resource", "--list-ocf-providers"]
        );
    }

    #[test]
    fn test_list_ocf_providers_ignores_errors() {
        let runner = ScriptedRunner::new().respond("", "No agents found", 1);
        assert!(run(&runner, list_ocf_providers).is_empty());
    }

    #[test]
    fn test_list_standards_and_providers() {
        let runner = ScriptedRunner::new()
            .respond("ocf\nlsb\nservice\nsystemd\nnagios\nstonith\n", "", 0)
            .respond("heartbeat\npacemaker\nbooth\n", "", 0);

        assert_eq!(
            run(&runner, list_standards_and_providers),
            vec![
                "lsb",
                "nagios",
                "ocf:booth",
                "ocf:heartbeat",
                "ocf:pacemaker",
                "service",
                "systemd",
            ]
        );
    }

    #[test]
    fn test_list_standards_and_providers_without_providers() {
        let runner = ScriptedRunner::new()
            .respond("ocf\nlsb\n", "", 0)
            .respond("", "No providers", 1);
        assert_eq!(run(&runner, list_standards_and_providers), vec!["lsb"]);
    }

    #[test]
    fn test_list_agents_sorted_case_insensitively() {
        let runner = ScriptedRunner::new().respond(
            "Delay\nStateful\n\nDummy\nSystemHealth\ncontrold\nremote\nping\nHealthCPU\n",
            "",
            0,
        );
        let agents = run(&runner, |ctx| list_agents(ctx, "ocf:pacemaker"));

        assert_eq!(
            agents,
            vec![
                "controld",
                "Delay",
                "Dummy",
                "HealthCPU",
                "ping",
                "remote",
                "Stateful",
                "SystemHealth",
            ]
        );
        assert_eq!(
            runner.calls()[0].argv,
            vec!["/usr/sbin/crm_resource", "--list-agents", "ocf:pacemaker"]
        );
    }

    #[test]
    fn test_list_agents_keeps_duplicates() {
        let runner = ScriptedRunner::new().respond("b\na\nb\n", "", 0);
        assert_eq!(run(&runner, |ctx| list_agents(ctx, "lsb")), vec!["a", "b", "b"]);
    }

    #[test]
    fn test_list_agents_ignores_errors() {
        let runner = ScriptedRunner::new().respond("", "No agents found for standard=nagios", 1);
        assert!(run(&runner, |ctx| list_agents(ctx, "nagios")).is_empty());
    }

    #[test]
    fn test_list_stonith_agents_hides_helpers() {
        let runner = ScriptedRunner::new().respond(
            "fence_xvm\nfence_xenapi\nfence_pcmk\nfence_legacy\nfence_apc\nfence_ack_manual\nfence_kdump_send\nfence_nss_wrapper\nfence_dummy\n",
            "",
            0,
        );
        assert_eq!(
            run(&runner, list_stonith_agents),
            vec!["fence_apc", "fence_dummy", "fence_xenapi", "fence_xvm"]
        );
        assert_eq!(
            runner.calls()[0].argv,
            vec!["/usr/sbin/crm_resource", "--list-agents", "stonith"]
        );
    }

    #[test]
    fn test_list_stonith_agents_ignores_errors() {
        let runner = ScriptedRunner::new().respond("", "No agents found for standard=stonith", 1);
        assert!(run(&runner, list_stonith_agents).is_empty());
    }
}

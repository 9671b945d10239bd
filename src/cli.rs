use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration files
    Validate,

    /// Show effective configuration after merging all sources
    Show,
}

#[derive(Parser, Debug)]
#[command(name = "pcmk-agents")]
#[command(
    about = "Resolve, describe and validate Pacemaker resource and fence agents",
    long_about = None
)]
#[command(version = env!("PCMK_AGENTS_VERSION"))]
#[command(after_help = "\
EXAMPLES:
  pcmk-agents standards --with-providers   List standards and OCF providers
  pcmk-agents agents ocf:heartbeat         List agents of one provider
  pcmk-agents describe IPaddr2             Describe an agent, guessing its full name
  pcmk-agents validate ocf:heartbeat:IPaddr2 ip=192.168.0.10
  pcmk-agents describe --stonith fence_xvm --json

For details about a specific command, use:
  pcmk-agents <command> --help")]
pub struct Cli {
    /// Log every external command and its output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Configuration file read after the system and user ones
    #[arg(long, global = true, env = "PCMK_AGENTS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to crm_resource
    #[arg(long, global = true)]
    pub crm_resource: Option<PathBuf>,

    /// Path to the fencing daemon binary
    #[arg(long, global = true)]
    pub stonithd: Option<PathBuf>,

    /// Kill external commands running longer than this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List resource agent standards
    Standards {
        /// Expand 'ocf' into one entry per OCF provider
        #[arg(long)]
        with_providers: bool,
    },

    /// List OCF resource agent providers
    Providers,

    /// List resource agents
    #[command(long_about = "List resource agents.\n\n\
        With STANDARD[:PROVIDER], list the agent types of that standard or\n\
        OCF provider. Without it, list every agent of every standard and\n\
        provider by its full name.")]
    Agents {
        /// Standard, or ocf:PROVIDER
        standard_provider: Option<String>,
    },

    /// List fence agents
    StonithAgents,

    /// Show an agent's description, parameters and default operations
    Describe {
        /// Agent name; a bare type is matched against installed OCF agents
        name: String,

        /// Describe a fence agent
        #[arg(long)]
        stonith: bool,

        /// Print the description as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check parameters against an agent's metadata
    Validate {
        /// Agent name; a bare type is matched against installed OCF agents
        name: String,

        /// Parameters as KEY=VALUE
        #[arg(value_parser = parse_key_value)]
        params: Vec<(String, String)>,

        /// Validate a fence agent's parameters
        #[arg(long)]
        stonith: bool,

        /// Report problems as warnings, and accept agents without metadata
        #[arg(long)]
        force: bool,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("ip=192.168.0.10").unwrap(),
            ("ip".to_string(), "192.168.0.10".to_string())
        );
        assert_eq!(
            parse_key_value("options=a=b").unwrap(),
            ("options".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_key_value("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=value").is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "pcmk-agents",
            "providers",
            "--crm-resource",
            "/opt/crm_resource",
            "--timeout",
            "5",
            "-v",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.crm_resource, Some(PathBuf::from("/opt/crm_resource")));
        assert_eq!(cli.timeout, Some(5));
        assert!(matches!(cli.command, Commands::Providers));
    }

    #[test]
    fn test_validate_collects_params() {
        let cli = Cli::parse_from([
            "pcmk-agents",
            "validate",
            "ocf:heartbeat:IPaddr2",
            "ip=10.0.0.1",
            "cidr_netmask=24",
            "--force",
        ]);
        match cli.command {
            Commands::Validate {
                name,
                params,
                stonith,
                force,
            } => {
                assert_eq!(name, "ocf:heartbeat:IPaddr2");
                assert_eq!(params.len(), 2);
                assert_eq!(params[1].0, "cidr_netmask");
                assert!(!stonith);
                assert!(force);
            }
            other => panic!("Expected Validate command, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_malformed_param() {
        let result = Cli::try_parse_from(["pcmk-agents", "validate", "Dummy", "broken"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

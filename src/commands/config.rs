use crate::cli::ConfigCommands;
use crate::config::Config;
use crate::error::Result;
use crate::runner::is_installed;
use std::path::{Path, PathBuf};

pub fn execute(command: &ConfigCommands, config: &Config, explicit: Option<&Path>) -> Result<()> {
    match command {
        ConfigCommands::Validate => validate(explicit),
        ConfigCommands::Show => {
            show(config);
            Ok(())
        }
    }
}

fn validate(explicit: Option<&Path>) -> Result<()> {
    let system_config = PathBuf::from("/etc/pcmk-agents.toml");
    let user_config = std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".pcmk-agents.toml"))
        .unwrap_or_else(|| PathBuf::from("~/.pcmk-agents.toml"));

    println!("Validating configuration files...\n");

    for (label, path) in [("System config", &system_config), ("User config", &user_config)] {
        if path.exists() {
            println!("  {}: {}", label, path.display());
        } else {
            println!("  {}: {} - not found (optional)", label, path.display());
        }
    }
    if let Some(path) = explicit {
        println!("  Explicit config: {}", path.display());
    }

    println!("\nLoading and validating configuration...");
    match Config::load(explicit) {
        Ok(_) => {
            println!("✓ Configuration is valid!");
            Ok(())
        }
        Err(e) => {
            println!("✗ Configuration is invalid!");
            println!("  Error: {}", e);
            Err(e)
        }
    }
}

fn show(config: &Config) {
    println!("Effective Configuration:");
    println!("(CLI > Environment > --config > User config > System config > Defaults)\n");

    println!("Tools:");
    for (name, path) in [
        ("crm_resource", &config.tools.crm_resource),
        ("stonithd", &config.tools.stonithd),
    ] {
        let status = if is_installed(path) { "" } else { " (not found)" };
        println!("  {}: {}{}", name, path.display(), status);
    }
    println!("  metadata PATH: {}", config.tools.metadata_path_env);

    println!("\nRunner:");
    match config.runner.timeout_secs {
        Some(secs) => println!("  timeout: {}s", secs),
        None => println!("  timeout: none"),
    }
}

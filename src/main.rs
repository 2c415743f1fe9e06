//! storagectl CLI
//!
//! Entry point for the `storagectl` command-line tool.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};

use storage_ctl::config::{ConfigError, CtlConfig, DEFAULT_LOG_FILTER};
use storage_ctl::logging;
use storage_ctl::{ClientFleet, FleetError, FleetInitializer, InventoryFleet, JobQuery, NodeClient};

#[derive(Parser)]
#[command(name = "storagectl")]
#[command(about = "Inspect jobs on remote storage nodes", version)]
struct Cli {
    /// Path to config file (default: ~/.config/storagectl/config.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Path to node inventory file (default: ~/.config/storagectl/nodes.toml)
    #[arg(long, short = 'i', global = true)]
    inventory: Option<PathBuf>,

    /// Only use nodes carrying all these tags (comma-separated)
    #[arg(long, short = 't', value_delimiter = ',', global = true)]
    tag: Option<Vec<String>>,

    /// Order nodes by priority instead of inventory file order
    #[arg(long, global = true)]
    by_priority: bool,

    /// SSH connect timeout in seconds
    #[arg(long, global = true)]
    connect_timeout: Option<u32>,

    /// Exit non-zero when a lookup fails (2: no clients, 3: query failed, 4: unrenderable record)
    #[arg(long, global = true)]
    strict_exit: bool,

    /// Increase log verbosity (logs go to stderr)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Storage node commands
    Storage {
        #[command(subcommand)]
        action: StorageCommands,
    },
}

#[derive(Subcommand)]
enum StorageCommands {
    /// Print the current state of a job
    Job {
        /// Job ID to look up
        id: Option<String>,
    },

    /// List the nodes the fleet would be built from
    Nodes {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = cli_overrides(&cli).and_then(|overrides| CtlConfig::build(cli.config.as_deref(), overrides));

    let configured_log = config.as_ref().map(|c| c.log.as_str()).unwrap_or(DEFAULT_LOG_FILTER);
    logging::init(&logging::directive(cli.verbose, configured_log));

    match cli.command {
        Commands::Storage { ref action } => match action {
            StorageCommands::Job { id } => run_job(id.as_deref(), &config, cli.strict_exit),
            StorageCommands::Nodes { json } => run_nodes(&config, *json),
        },
    }
}

/// Only flags the user actually passed become overrides
fn cli_overrides(cli: &Cli) -> Result<Value, ConfigError> {
    let mut overrides = Map::new();

    if let Some(ref path) = cli.inventory {
        let path = path.to_str().ok_or_else(|| {
            ConfigError::Invalid(format!("--inventory path is not valid UTF-8: {}", path.display()))
        })?;
        overrides.insert("inventory".to_string(), Value::String(path.to_string()));
    }
    if let Some(ref tags) = cli.tag {
        overrides.insert("tags".to_string(), json!(tags));
    }
    if cli.by_priority {
        overrides.insert("by_priority".to_string(), json!(true));
    }
    if cli.strict_exit {
        overrides.insert("strict_exit".to_string(), json!(true));
    }
    if let Some(timeout) = cli.connect_timeout {
        overrides.insert("ssh".to_string(), json!({ "connect_timeout_seconds": timeout }));
    }

    Ok(Value::Object(overrides))
}

fn run_job(job_id: Option<&str>, config: &Result<CtlConfig, ConfigError>, strict_flag: bool) {
    let initializer = || -> Result<ClientFleet<NodeClient>, FleetError> {
        let config = config.as_ref().map_err(|e| FleetError::Config(e.to_string()))?;
        InventoryFleet::from_config(config).initialize()
    };

    let strict = strict_flag || config.as_ref().map(|c| c.strict_exit).unwrap_or(false);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = JobQuery::new(initializer).run(job_id, &mut out);
    let _ = out.flush();

    if let Err(e) = result {
        tracing::warn!(error = %e, "job lookup ended without a record");
        if strict && e.exit_code() != 0 {
            process::exit(e.exit_code());
        }
    }
}

fn run_nodes(config: &Result<CtlConfig, ConfigError>, json_output: bool) {
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    };

    let fleet = InventoryFleet::from_config(config);

    let inventory = match fleet.load_inventory() {
        Ok(inv) => inv,
        Err(e) => {
            eprintln!("Error loading node inventory: {}", e);
            process::exit(1);
        }
    };

    let nodes = match fleet.order_nodes(&inventory) {
        Ok(nodes) => nodes,
        Err(FleetError::NoTagMatch { .. }) => Vec::new(),
        Err(FleetError::Empty) => Vec::new(),
        Err(e) => {
            eprintln!("Error building fleet: {}", e);
            process::exit(1);
        }
    };

    if json_output {
        let output: Vec<Value> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| {
                json!({
                    "name": n.name,
                    "host": n.host,
                    "port": n.port,
                    "user": n.user,
                    "tags": n.tags,
                    "priority": n.priority,
                    "ssh_key_path": n.ssh_key_path,
                    "remote_command": n.remote_command,
                    "default_target": i == 0,
                })
            })
            .collect();

        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    if nodes.is_empty() {
        if config.required_tags.is_empty() {
            println!("No nodes configured.");
        } else {
            println!("No nodes found matching the specified tags.");
        }
        return;
    }

    println!("Configured nodes ({} total):\n", nodes.len());

    for (i, node) in nodes.iter().enumerate() {
        let marker = if i == 0 { " [default]" } else { "" };
        println!("  {} ({}){}", node.name, node.host, marker);
        println!("    User: {}@{}:{}", node.user, node.host, node.port);
        if !node.tags.is_empty() {
            println!("    Tags: {}", node.tags.join(", "));
        }
        println!("    Priority: {}", node.priority);
        if let Some(ref key) = node.ssh_key_path {
            println!("    SSH Key: {}", key);
        }
        println!();
    }
}

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgGroup;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::help_text;
use crate::domain::models::SessionSnapshot;
use crate::domain::services::SessionSnapshots;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

fn format_snapshot(snapshot: &SessionSnapshot) -> String {
    let mut res = format!(
        "- (ID: {}) {}, Model: {}, State: {}",
        snapshot.id, snapshot.timestamp, snapshot.model, snapshot.state,
    );

    if let Some(spec) = &snapshot.spec {
        res = format!("{res}, Project: {} ({})", spec.name, spec.kind);
    }

    return res;
}

async fn print_sessions_list() -> Result<()> {
    let mut sessions = SessionSnapshots::default()
        .list()
        .await?
        .iter()
        .map(|snapshot| {
            return format_snapshot(snapshot);
        })
        .collect::<Vec<String>>();

    sessions.reverse();

    if sessions.is_empty() {
        println!("There are no sessions available. You should start your first one!");
    } else {
        println!("{}", sessions.join("\n"));
    }

    return Ok(());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if !config_file_path.parent().unwrap().exists() {
        fs::create_dir_all(config_file_path.parent().unwrap()).await?;
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    let config_path_display = config_file_path.as_os_str().to_str().unwrap();
    println!("Created default config file at {config_path_display}");
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for Autoforge")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running Autoforge with environment variable RUST_LOG=autoforge")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn subcommand_sessions_delete() -> Command {
    return Command::new("delete")
        .about("Delete one or all sessions.")
        .arg(
            clap::Arg::new("session-id")
                .short('i')
                .long("id")
                .help("Session ID")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("all")
                .long("all")
                .help("Delete all sessions.")
                .num_args(0),
        )
        .group(
            ArgGroup::new("delete-args")
                .args(["session-id", "all"])
                .required(true),
        );
}

fn subcommand_sessions() -> Command {
    return Command::new("sessions")
        .about("Manage saved session snapshots.")
        .arg_required_else_help(true)
        .subcommand(Command::new("dir").about("Print the sessions cache directory path."))
        .subcommand(
            Command::new("list").about("List all previous sessions with their ids and projects."),
        )
        .subcommand(subcommand_sessions_delete());
}

fn arg_backend_url() -> Arg {
    return Arg::new(ConfigKey::BackendURL.to_string())
        .long(ConfigKey::BackendURL.to_string())
        .env("AUTOFORGE_BACKEND_URL")
        .num_args(1)
        .help(format!(
            "Ollama API URL hosting the models. [default: {}]",
            Config::default(ConfigKey::BackendURL)
        ))
        .global(true);
}

fn arg_backend_health_check_timeout() -> Arg {
    return Arg::new(ConfigKey::BackendHealthCheckTimeout.to_string())
        .long(ConfigKey::BackendHealthCheckTimeout.to_string())
        .env("AUTOFORGE_BACKEND_HEALTH_CHECK_TIMEOUT")
        .num_args(1)
        .help(
            format!("Time to wait in milliseconds before timing out when doing a healthcheck for the backend. [default: {}]", Config::default(ConfigKey::BackendHealthCheckTimeout)),
        )
        .global(true);
}

fn arg_backend_startup_wait() -> Arg {
    return Arg::new(ConfigKey::BackendStartupWait.to_string())
        .long(ConfigKey::BackendStartupWait.to_string())
        .env("AUTOFORGE_BACKEND_STARTUP_WAIT")
        .num_args(1)
        .help(format!(
            "Time to wait in seconds for the backend to become ready at startup. [default: {}]",
            Config::default(ConfigKey::BackendStartupWait)
        ))
        .global(true);
}

fn arg_model() -> Arg {
    return Arg::new(ConfigKey::Model.to_string())
        .short('m')
        .long(ConfigKey::Model.to_string())
        .env("AUTOFORGE_MODEL")
        .num_args(1)
        .help("The model to use, skipping the GPU capability probe. Defaults to the best model fitting the detected GPU memory.")
        .global(true);
}

fn arg_vram_mb() -> Arg {
    return Arg::new(ConfigKey::VramMb.to_string())
        .long(ConfigKey::VramMb.to_string())
        .env("AUTOFORGE_VRAM_MB")
        .num_args(1)
        .help("GPU memory in megabytes to assume instead of probing with nvidia-smi.")
        .global(true);
}

fn arg_workspace_dir() -> Arg {
    return Arg::new(ConfigKey::WorkspaceDir.to_string())
        .short('w')
        .long(ConfigKey::WorkspaceDir.to_string())
        .env("AUTOFORGE_WORKSPACE_DIR")
        .num_args(1)
        .help(format!(
            "Directory where generated projects are created. [default: {}]",
            Config::default(ConfigKey::WorkspaceDir)
        ))
        .global(true);
}

fn arg_snapshot_dir() -> Arg {
    return Arg::new(ConfigKey::SnapshotDir.to_string())
        .long(ConfigKey::SnapshotDir.to_string())
        .env("AUTOFORGE_SNAPSHOT_DIR")
        .num_args(1)
        .help(format!(
            "Directory where session snapshots are stored. [default: {}]",
            Config::default(ConfigKey::SnapshotDir)
        ))
        .global(true);
}

fn arg_username() -> Arg {
    return Arg::new(ConfigKey::Username.to_string())
        .short('u')
        .long(ConfigKey::Username.to_string())
        .env("AUTOFORGE_USERNAME")
        .num_args(1)
        .help("Your user name, used for git commits.")
        .global(true);
}

fn arg_dev_server_port() -> Arg {
    return Arg::new(ConfigKey::DevServerPort.to_string())
        .long(ConfigKey::DevServerPort.to_string())
        .env("AUTOFORGE_DEV_SERVER_PORT")
        .num_args(1)
        .help(format!(
            "Port the development server is expected to listen on. [default: {}]",
            Config::default(ConfigKey::DevServerPort)
        ))
        .global(true);
}

fn arg_dev_server_startup_timeout() -> Arg {
    return Arg::new(ConfigKey::DevServerStartupTimeout.to_string())
        .long(ConfigKey::DevServerStartupTimeout.to_string())
        .env("AUTOFORGE_DEV_SERVER_STARTUP_TIMEOUT")
        .num_args(1)
        .help(format!(
            "Time to wait in seconds for the development server to answer its first request. [default: {}]",
            Config::default(ConfigKey::DevServerStartupTimeout)
        ))
        .global(true);
}

fn arg_generation_timeout() -> Arg {
    return Arg::new(ConfigKey::GenerationTimeout.to_string())
        .long(ConfigKey::GenerationTimeout.to_string())
        .env("AUTOFORGE_GENERATION_TIMEOUT")
        .num_args(1)
        .help(format!(
            "Time to wait in seconds for a single model completion. [default: {}]",
            Config::default(ConfigKey::GenerationTimeout)
        ))
        .global(true);
}

fn arg_install_timeout() -> Arg {
    return Arg::new(ConfigKey::InstallTimeout.to_string())
        .long(ConfigKey::InstallTimeout.to_string())
        .env("AUTOFORGE_INSTALL_TIMEOUT")
        .num_args(1)
        .help(format!(
            "Time to wait in seconds for npm installs and builds. [default: {}]",
            Config::default(ConfigKey::InstallTimeout)
        ))
        .global(true);
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return Paint::new(format!("SESSION {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("autoforge")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .subcommand(subcommand_sessions())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("AUTOFORGE_CONFIG_FILE")
                .num_args(1)
                .help(format!(
                    "Path to configuration file [default: {}]",
                    Config::default(ConfigKey::ConfigFile)
                ))
                .global(true),
        )
        .arg(arg_backend_url())
        .arg(arg_backend_health_check_timeout())
        .arg(arg_backend_startup_wait())
        .arg(arg_model())
        .arg(arg_vram_mb())
        .arg(arg_workspace_dir())
        .arg(arg_snapshot_dir())
        .arg(arg_username())
        .arg(arg_dev_server_port())
        .arg(arg_dev_server_startup_timeout())
        .arg(arg_generation_timeout())
        .arg(arg_install_timeout());
}

/// Handles one-shot subcommands in place. Returns true when the
/// interactive session should start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    let log_path = dirs::cache_dir().unwrap().join("autoforge/debug.log");
                    println!("{}", log_path.to_str().unwrap());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("sessions", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("dir", _)) => {
                let dir = SessionSnapshots::default()
                    .snapshot_dir
                    .to_string_lossy()
                    .to_string();
                println!("{dir}");
                return Ok(false);
            }
            Some(("list", _)) => {
                print_sessions_list().await?;
                return Ok(false);
            }
            Some(("delete", delete_matches)) => {
                if let Some(session_id) = delete_matches.get_one::<String>("session-id") {
                    SessionSnapshots::default().delete(session_id).await?;
                    println!("Deleted session {session_id}");
                } else if delete_matches.get_one::<bool>("all").is_some() {
                    SessionSnapshots::default().delete_all().await?;
                    println!("Deleted all sessions");
                } else {
                    subcommand_sessions_delete().print_long_help()?;
                }
                return Ok(false);
            }
            _ => {
                subcommand_sessions().print_long_help()?;
                return Ok(false);
            }
        },
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}

// crates/bucketeer-mcp-cli/src/main.rs
// ============================================================================
// Module: Bucketeer MCP CLI Entry Point
// Description: Command dispatcher for the Bucketeer MCP server.
// Purpose: Load configuration, initialize logging, and run the stdio server.
// Dependencies: bucketeer-mcp, bucketeer-mcp-config, clap, thiserror, tracing-subscriber
// ============================================================================

//! ## Overview
//! `bucketeer-mcp` with no subcommand serves MCP over stdio. `tools` prints
//! the advertised tool definitions and `config check` validates the
//! configuration without starting the server. Stdout belongs to the
//! protocol while serving, so logs are written as JSON lines to stderr.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use bucketeer_mcp::McpServer;
use bucketeer_mcp::tool_definitions;
use bucketeer_mcp_config::BucketeerMcpConfig;
use bucketeer_mcp_config::LogLevel;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use thiserror::Error;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "bucketeer-mcp", version, disable_help_subcommand = true)]
struct Cli {
    /// Shared options.
    #[command(flatten)]
    options: GlobalOptions,
    /// Selected subcommand; serves when omitted.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options accepted by every subcommand.
#[derive(Args, Debug, Default)]
struct GlobalOptions {
    /// Optional config file path (defaults to `BUCKETEER_MCP_CONFIG`, then `bucketeer-mcp.toml`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Serve MCP over stdio (default).
    Serve,
    /// Print the advertised tool definitions as JSON.
    Tools,
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum ConfigCommand {
    /// Load and validate the configuration, then exit.
    Check,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Parses arguments and runs the CLI.
fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the selected command.
fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => command_serve(&cli.options),
        Commands::Tools => command_tools(),
        Commands::Config {
            command: ConfigCommand::Check,
        } => command_config_check(&cli.options),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Loads configuration and serves until stdin closes.
fn command_serve(options: &GlobalOptions) -> CliResult<ExitCode> {
    let config = load_config(options)?;
    init_logging(config.logging.level());
    info!(
        host = %config.bucketeer.host,
        default_environment = config.bucketeer.environment_id.as_deref().unwrap_or(""),
        source = config.source.as_ref().map(|path| path.display().to_string()).unwrap_or_default(),
        "bucketeer mcp starting"
    );
    let server = McpServer::from_config(&config).map_err(|err| {
        error!(error = %err, "server init failed");
        CliError::new(err.to_string())
    })?;
    server.serve_stdio().map_err(|err| {
        error!(error = %err, "server stopped");
        CliError::new(err.to_string())
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Prints the tool definitions.
fn command_tools() -> CliResult<ExitCode> {
    let rendered = serde_json::to_string_pretty(&tool_definitions())
        .map_err(|err| CliError::new(format!("failed to render tools: {err}")))?;
    write_stdout_line(&rendered)?;
    Ok(ExitCode::SUCCESS)
}

/// Validates the configuration and reports the outcome.
fn command_config_check(options: &GlobalOptions) -> CliResult<ExitCode> {
    let config = load_config(options)?;
    let source = config
        .source
        .as_ref()
        .map_or_else(|| "environment".to_string(), |path| path.display().to_string());
    write_stdout_line(&format!(
        "config ok (source: {source}, host: {}, default environment: {})",
        config.bucketeer.host,
        config.bucketeer.environment_id.as_deref().unwrap_or("<none>")
    ))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads and validates configuration.
fn load_config(options: &GlobalOptions) -> CliResult<BucketeerMcpConfig> {
    BucketeerMcpConfig::load(options.config.as_deref()).map_err(|err| CliError::new(err.to_string()))
}

/// Installs the JSON stderr subscriber at `level`.
fn init_logging(level: LogLevel) {
    let filter = EnvFilter::new(level.as_str());
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false),
        )
        .init();
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "{message}");
    ExitCode::FAILURE
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use std::path::Path;

    use clap::CommandFactory;
    use clap::Parser;

    use super::Cli;
    use super::Commands;
    use super::ConfigCommand;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["bucketeer-mcp"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.options.config.is_none());
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["bucketeer-mcp", "config", "check", "--config", "mcp.toml"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Config {
                command: ConfigCommand::Check,
            })
        );
        assert_eq!(cli.options.config.as_deref(), Some(Path::new("mcp.toml")));
    }

    #[test]
    fn tools_subcommand_parses() {
        let cli = Cli::try_parse_from(["bucketeer-mcp", "tools"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Tools));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["bucketeer-mcp", "delete"]).is_err());
    }
}

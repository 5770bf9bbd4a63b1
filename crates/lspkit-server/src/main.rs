//! lspkit-server entry point.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use lspkit::ChannelPort;
use lspkit_server::config::{resolve_log_filter, ServerConfig, DEFAULT_LOG_FILTER};
use lspkit_server::server::{build_session, method_set, server_capabilities};
use lspkit_server::transport::StdioTransport;

#[derive(Parser)]
#[command(
    name = "lspkit-server",
    about = "Language server over stdio with text document synchronization",
    version
)]
struct Cli {
    /// Log filter (trace, debug, info, warn, error, or a tracing directive).
    /// Falls back to LSPKIT_LOG, then info.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve one client over stdio (default).
    Serve,

    /// Print server info, capabilities and registered methods as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   lspkit-server completions bash > ~/.local/share/bash-completion/completions/lspkit-server
    ///   lspkit-server completions zsh > ~/.zfunc/_lspkit-server
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_new(resolve_log_filter(
        cli.log_level.as_deref(),
    ))
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    // stdout carries protocol traffic.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let config = ServerConfig::default();
            tracing::info!(
                "{} {}",
                config.name,
                config.version.as_deref().unwrap_or("")
            );

            let (port, outbound) = ChannelPort::new();
            let session = build_session(config, port.clone());
            StdioTransport::new(session.clone(), port, outbound)
                .run()
                .await?;

            let code = session.exit_code();
            if code != 0 {
                tracing::warn!("Exiting with code {code}");
            }
            std::process::exit(code);
        }

        Commands::Info => {
            let config = ServerConfig::default();
            let methods = method_set();
            let mut descriptors: Vec<_> = methods
                .descriptors()
                .map(|d| {
                    serde_json::json!({
                        "method": d.name,
                        "kind": if d.result_type.is_some() { "request" } else { "notification" },
                    })
                })
                .collect();
            descriptors.sort_by(|a, b| a["method"].as_str().cmp(&b["method"].as_str()));

            let info = serde_json::json!({
                "server": { "name": config.name, "version": config.version },
                "capabilities": server_capabilities(),
                "methods": descriptors,
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "lspkit-server", &mut std::io::stdout());
        }
    }

    Ok(())
}

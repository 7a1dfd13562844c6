use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;
mod mcp;
mod process;
mod tools;
mod utils;

use cmd::{CallArgs, ListArgs, ServeArgs};

/// Kali MCP Server - expose Kali Linux security tools and Burp Suite to MCP clients.
///
/// Commands:
///   kali-mcp-server serve [--transport stdio|http] [--bind HOST:PORT]
///   kali-mcp-server list <tools|prompts|categories> [--json]
///   kali-mcp-server call <TOOL> [--param KEY=VALUE ...] [--param-file PATH] [--json]
///
/// Global flags / env:
///   -v / -vv          Increase verbosity (RUST_LOG overrides)
///   -q / --quiet      Errors only
///   -c / --config     YAML configuration file (or KALI_MCP_CONFIG)
///
/// Examples:
///   kali-mcp-server serve
///   kali-mcp-server serve --transport http --bind 127.0.0.1:9877
///   kali-mcp-server call run_security_tool --param tool=nmap --param arguments=-sV,scanme.nmap.org
///   kali-mcp-server call send_http1_request --param url=https://example.com --json
#[derive(Parser, Debug)]
#[command(
    name = "kali-mcp-server",
    version,
    author,
    about = "Kali Linux security tools and Burp Suite over the Model Context Protocol",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file (YAML)
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        value_name = "PATH",
        env = config::CONFIG_ENV
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the MCP server
    Serve(ServeArgs),

    /// List tools, prompts or security categories
    List(ListArgs),

    /// Invoke a single tool and print its output
    Call(CallArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    match cli.command {
        Commands::List(args) => cmd::execute_list(args),
        Commands::Serve(args) => {
            let config = config::load_config(cli.config.as_deref())?;
            cmd::execute_serve(args, &config)
        }
        Commands::Call(args) => {
            let config = config::load_config(cli.config.as_deref())?;
            cmd::execute_call(args, &config)
        }
    }
}

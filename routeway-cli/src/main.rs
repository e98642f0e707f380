//! Routeway CLI - diagnostics for logical route tables.
//!
//! # Commands
//!
//! - `routeway routes` - List the route table
//! - `routeway resolve <VERB> <PATH>` - Show candidate URLs without sending anything
//! - `routeway call <VERB> <PATH>` - Dispatch a call through the fallback chain
//! - `routeway login` / `routeway logout` - Manage the persisted session
//! - `routeway probe` - Check connectivity of every configured endpoint
//! - `routeway preflight <URL>` - Send an OPTIONS request to one endpoint

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod commands;
mod error;

use commands::{Context, call, probe, resolve, routes, session};
use error::CliResult;

/// Routeway CLI - logical route resolution and connectivity diagnostics
#[derive(Parser)]
#[command(name = "routeway")]
#[command(author = "Pegasus Heavy Industries LLC")]
#[command(version)]
#[command(about = "Resolve, call and probe logical routes with endpoint fallback")]
#[command(long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = format!(
    "{}\n  {} routeway resolve GET /agents/:id/performance -p id=42\n  {} routeway call GET /financial/summary\n  {} routeway probe --delay-ms 500",
    "Examples:".bright_cyan().bold(),
    "$".dimmed(),
    "$".dimmed(),
    "$".dimmed(),
))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Route configuration file (TOML, JSON or .env)
    #[arg(short, long, global = true, env = "ROUTEWAY_CONFIG", default_value = "routeway.toml")]
    config: PathBuf,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List all routes and their candidate endpoints
    #[command(alias = "r")]
    Routes,

    /// Resolve a logical route to candidate URLs (no network I/O)
    Resolve(RouteArgs),

    /// Dispatch a logical call and print the result envelope
    #[command(alias = "c")]
    Call(CallArgs),

    /// Log in through the configured login route
    Login(LoginArgs),

    /// Clear the persisted session
    Logout,

    /// Probe every configured endpoint sequentially
    #[command(alias = "p")]
    Probe(ProbeArgs),

    /// Send an OPTIONS request to an endpoint
    Preflight {
        /// Absolute URL or same-origin path
        url: String,
    },
}

#[derive(Args)]
struct RouteArgs {
    /// HTTP verb (GET, POST, PUT, PATCH, DELETE)
    verb: String,

    /// Logical path pattern, e.g. /agents/:id
    path: String,

    /// Path parameter as name=value (repeatable)
    #[arg(short, long = "param", value_name = "NAME=VALUE")]
    params: Vec<String>,
}

#[derive(Args)]
struct CallArgs {
    #[command(flatten)]
    route: RouteArgs,

    /// Query parameter as name=value (repeatable)
    #[arg(long = "query", value_name = "NAME=VALUE")]
    query: Vec<String>,

    /// JSON request body
    #[arg(short, long)]
    body: Option<String>,
}

#[derive(Args)]
struct LoginArgs {
    /// Account email
    #[arg(short, long)]
    email: String,

    /// Account password
    #[arg(short, long, env = "ROUTEWAY_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args)]
struct ProbeArgs {
    /// Delay between requests in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,
}

fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    init_tracing(cli.verbose, cli.quiet);

    let result: CliResult<()> = match routeway_config::load(&cli.config) {
        Ok(file) => {
            let ctx = Context::new(file, cli.json, cli.quiet);
            match cli.command {
                Commands::Routes => routes::execute(&ctx),
                Commands::Resolve(args) => {
                    resolve::execute(&ctx, &args.verb, &args.path, &args.params)
                }
                Commands::Call(args) => {
                    call::execute(
                        &ctx,
                        &args.route.verb,
                        &args.route.path,
                        &args.route.params,
                        &args.query,
                        args.body.as_deref(),
                    )
                    .await
                }
                Commands::Login(args) => session::login(&ctx, &args.email, &args.password).await,
                Commands::Logout => session::logout(&ctx).await,
                Commands::Probe(args) => probe::execute(&ctx, args.delay_ms).await,
                Commands::Preflight { url } => probe::preflight(&ctx, &url).await,
            }
        }
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("\n  {} {}\n", "Error:".red().bold(), e);
        std::process::exit(e.exit_code());
    };
}

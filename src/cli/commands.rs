use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::logging::{init_logging, LogConfig};
use crate::route_table::RouteTable;
use crate::router::Router;
use crate::runtime_config::RuntimeConfig;
use crate::server::{normalize_path, start_server, AppService, BufferedResponse};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Command-line interface for segroute
#[derive(Parser, Debug)]
#[command(name = "segroute", version)]
#[command(about = "Serve and inspect segment-tree route tables", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Serve a route table over HTTP until SIGINT/SIGTERM
    Serve {
        /// Route table (TOML)
        #[arg(short, long)]
        routes: PathBuf,

        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,

        /// Reject malformed regex constraints instead of ignoring them
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Show the candidate routes and the response for one request, without a network
    Match {
        /// Route table (TOML)
        #[arg(short, long)]
        routes: PathBuf,

        /// HTTP method, e.g. GET
        method: String,

        /// Request target, e.g. /users/42?verbose=1
        path: String,

        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Print the registrations and the routing tree
    Routes {
        /// Route table (TOML)
        #[arg(short, long)]
        routes: PathBuf,
    },
}

/// Parse arguments and run the selected command.
///
/// # Errors
///
/// Returns an error if the route table cannot be loaded, the address cannot be
/// bound, or logging cannot be initialized.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let mut config = RuntimeConfig::from_env();
    match cli.command {
        Commands::Serve {
            routes,
            addr,
            strict,
        } => {
            config.strict_patterns |= strict;
            serve(&routes, &addr, config)
        }
        Commands::Match {
            routes,
            method,
            path,
            strict,
        } => {
            config.strict_patterns |= strict;
            let router = load_router(&routes, config.strict_patterns)?;
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid method '{method}'"))?;
            let stdout = io::stdout();
            describe_match(&router, &method, &path, &mut stdout.lock())?;
            Ok(())
        }
        Commands::Routes { routes } => {
            let router = load_router(&routes, config.strict_patterns)?;
            router.dump_routes();
            Ok(())
        }
    }
}

/// Load a route table and build its router.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid.
pub fn load_router(path: &Path, strict: bool) -> Result<Router> {
    RouteTable::from_path(path)?.build_router(strict)
}

fn serve(routes: &Path, addr: &str, config: RuntimeConfig) -> Result<()> {
    // Keep the guard alive for the whole run.
    let _log_guard = init_logging(&LogConfig::from_env())?;
    config.apply();

    let router = load_router(routes, config.strict_patterns)?;
    router.log_summary();
    let service = AppService::new(Dispatcher::new(Arc::new(router)));
    let handle = start_server(service, addr)
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        addr = %handle.addr(),
        stack_size = config.stack_size,
        strict = config.strict_patterns,
        "Server listening"
    );

    wait_for_shutdown()?;
    info!("Shutdown signal received");
    handle.stop();
    Ok(())
}

#[cfg(unix)]
fn wait_for_shutdown() -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("failed to install signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Signal received");
    }
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown() -> Result<()> {
    let mut line = String::new();
    io::stdin().read_line(&mut line).context("failed to read stdin")?;
    Ok(())
}

/// Write the candidates for `uri` and the response dispatch produces.
///
/// # Errors
///
/// Returns an error if writing to `w` fails.
pub fn describe_match<W: Write>(router: &Router, method: &Method, uri: &str, w: &mut W) -> Result<DispatchOutcome> {
    let segments = normalize_path(uri);
    let routes = router.match_path(&segments);
    writeln!(w, "{method} {uri}")?;
    writeln!(w, "segments: {segments:?}")?;
    writeln!(w, "candidates: {}", routes.len())?;
    for (index, route) in routes.iter().enumerate() {
        let captures: Vec<String> = route
            .captures
            .iter()
            .map(|(k, v)| if k.is_empty() { format!("*={v}") } else { format!("{k}={v}") })
            .collect();
        writeln!(w, "  #{index} captures [{}] filters {:?}", captures.join(", "), route.filters)?;
    }

    let dispatcher = Dispatcher::new(Arc::new(router.clone()));
    let mut out = BufferedResponse::new();
    let outcome = dispatcher.dispatch(method, uri, &mut out);
    writeln!(w, "outcome: {outcome:?}")?;
    writeln!(w, "status: {}", out.status())?;
    for (name, value) in out.headers() {
        writeln!(w, "{name}: {value}")?;
    }
    writeln!(w, "body: {}", out.body_str())?;
    Ok(outcome)
}

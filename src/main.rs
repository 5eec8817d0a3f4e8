//! `idfs-edge` command line.
//!
//! ```text
//! idfs-edge serve                                   # local edge host on EDGE_SERVER__PORT (3000)
//! echo '{"request":{…}}'  | idfs-edge viewer-request
//! echo '{"response":{…}}' | idfs-edge viewer-response
//! ```
//!
//! The two hook subcommands read one event from stdin and print the hook's
//! result as JSON, the same exchange the CDN runtime performs.

use std::io::Read;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use idfs_edge::{Config, Error, Server, ViewerRequestEvent, ViewerResponseEvent};

#[derive(Parser)]
#[command(name = "idfs-edge", version, about = "Edge functions and local edge host for the IDFS site")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the local edge host.
    Serve,
    /// Run the apex redirect on a viewer-request event read from stdin.
    ViewerRequest,
    /// Run the security headers on a viewer-response event read from stdin.
    ViewerResponse,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("idfs-edge: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config);

    let result = match cli.command {
        Command::Serve => serve(&config).await,
        Command::ViewerRequest => viewer_request(&config),
        Command::ViewerResponse => viewer_response(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so the hook subcommands keep stdout for JSON.
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(config: &Config) -> Result<(), Error> {
    let addr = config.server.addr()?;
    Server::bind(addr).serve(idfs_edge::app(config)).await
}

fn viewer_request(config: &Config) -> Result<(), Error> {
    let event: ViewerRequestEvent = serde_json::from_str(&read_stdin()?)?;
    let out = config.edge.apex_redirect().handle(event);
    println!("{}", serde_json::to_string(&out)?);
    Ok(())
}

fn viewer_response(config: &Config) -> Result<(), Error> {
    let event: ViewerResponseEvent = serde_json::from_str(&read_stdin()?)?;
    let out = config.edge.security_headers().handle(event);
    println!("{}", serde_json::to_string(&out)?);
    Ok(())
}

fn read_stdin() -> Result<String, Error> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    Ok(input)
}

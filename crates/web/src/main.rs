use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use consulta::{Orchestrator, SessionConfig};
use tracing::info;

mod logging;
mod pages;
mod server;

#[derive(Parser, Debug)]
#[command(name = "consulta-web")]
#[command(about = "Runs the same cédula lookup across every configured government portal")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "5001")]
    port: u16,

    /// WebDriver endpoint driving the browser
    #[arg(long, default_value = "http://localhost:9515")]
    webdriver_url: String,

    /// Run the browser headless (nothing left on screen to inspect)
    #[arg(long)]
    headless: bool,

    /// Load site definitions from a JSON file instead of the built-in set
    #[arg(long, value_name = "FILE")]
    sites: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let sites = match &cli.sites {
        Some(path) => consulta::sites_from_file(path)?,
        None => consulta::builtin_sites(),
    };
    let session_config = SessionConfig {
        webdriver_url: cli.webdriver_url,
        headless: cli.headless,
    };

    let orchestrator = Orchestrator::new(sites, session_config);
    for site in orchestrator.sites() {
        info!(target = "consulta", site = %site.name, "portal configured");
    }

    let app = server::router(orchestrator);
    let addr = SocketAddr::from(([127, 0, 0, 1], cli.port));
    info!(target = "consulta", %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

//! zoning-dashboard daemon
//!
//! Loads the upazila geometry, starts the status feed refresh loop and
//! serves the dashboard API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zoning_dashboard::config::Config;
use zoning_dashboard::dashboard::{create_router, DashboardState};
use zoning_dashboard::feed::HttpFeedSource;
use zoning_dashboard::geometry::{self, GeometryDataset};
use zoning_dashboard::scheduler::RefreshScheduler;

#[derive(Parser)]
#[command(name = "zoning-dashboard")]
#[command(about = "Live land-zoning progress dashboard for Bangladesh upazilas")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "zoning-dashboard.toml")]
    config: String,

    /// Spreadsheet identifier (overrides config file)
    #[arg(long, env = "ZONING_SHEET_ID")]
    sheet_id: Option<String>,

    /// Upazila GeoJSON file (overrides config file)
    #[arg(long, env = "ZONING_REGIONS_PATH")]
    regions_path: Option<PathBuf>,

    /// HTTP port (overrides config file)
    #[arg(long, env = "ZONING_HTTP_PORT")]
    port: Option<u16>,

    /// Refresh interval in seconds (overrides config file)
    #[arg(long, env = "ZONING_REFRESH_SECS")]
    refresh_secs: Option<u64>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one feed tick, print the stats and exit
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "zoning_dashboard=info,info".into());
    if cli.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting zoning-dashboard");
    info!("Config file: {}", cli.config);

    let mut config = Config::load(std::path::Path::new(&cli.config))?;

    // Apply CLI overrides
    if let Some(sheet_id) = cli.sheet_id {
        config.feed.sheet_id = sheet_id;
    }
    if let Some(path) = cli.regions_path {
        config.geometry.regions_path = path;
    }
    if let Some(port) = cli.port {
        config.api.http_port = port;
    }
    if let Some(secs) = cli.refresh_secs {
        config.refresh.interval_secs = secs;
    }

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let feed_url = config.feed.url();
    info!("Feed: {}", feed_url);
    info!("Geometry: {}", config.geometry.regions_path.display());
    info!("Refresh every {}s", config.refresh.interval_secs);

    // Geometry is required; without it the map would render empty
    let geometry = match GeometryDataset::load(&config.geometry.regions_path, &config.geometry.keys) {
        Ok(dataset) => Arc::new(dataset),
        Err(e) => {
            error!(error = %e, "Cannot start without upazila geometry");
            return Err(e.into());
        }
    };

    let overlay_path = config
        .geometry
        .overlay_path
        .as_deref()
        .filter(|p| !p.as_os_str().is_empty());
    let overlay = geometry::load_overlay_optional(overlay_path, &config.geometry.overlay_name_key);

    let source = HttpFeedSource::new(feed_url, Duration::from_secs(config.feed.timeout_secs))?;
    let scheduler = Arc::new(RefreshScheduler::new(
        config.refresh.clone(),
        Arc::new(source),
        config.feed.columns.clone(),
        geometry.clone(),
    ));

    if let Some(Command::Check) = cli.command {
        let outcome = scheduler.refresh().await;
        let snapshot = scheduler.current();
        println!("{}", serde_json::to_string_pretty(&snapshot.summary())?);
        info!(?outcome, "Check complete");
        if snapshot.last_error.is_some() {
            std::process::exit(1);
        }
        return Ok(());
    }

    // Start refresh loop in background
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh_loop = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run(shutdown_rx).await })
    };

    let state = Arc::new(DashboardState::new(scheduler, geometry, overlay));
    let app = create_router(state, config.api.static_dir.as_deref());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api.http_port));
    info!("Dashboard listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = refresh_loop.await;

    Ok(())
}

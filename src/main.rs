use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{fs::OpenOptions, io, sync::Arc, time::Duration};
use tokio::sync::Notify;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod cli;

use crate::app::run_app;
use crate::cli::{Args, SourceKind};

use wxdash::geocode::Geocoder;
use wxdash::location::{Coordinates, FileStore, FixedPosition, Geolocator, IpGeolocator, Resolver};
use wxdash::provider::WeatherClient;
use wxdash::source::{LiveGeoSource, PolledSource};
use wxdash::{http, refresh_once, spawn_refresher, Dashboard, Error, Source};

fn init_logging(once: bool) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if once {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
        return Ok(());
    }

    // The terminal belongs to the dashboard, so logs go to a file.
    let dir = dirs::cache_dir()
        .context("no cache directory for the log file")?
        .join("wxdash");
    std::fs::create_dir_all(&dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("wxdash.log"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Arc::new(file))
        .init();
    Ok(())
}

fn build_source(args: &Args) -> anyhow::Result<Source> {
    let http = http::client(Duration::from_secs(args.timeout))?;
    let source = match args.source {
        SourceKind::Static => Source::Static,
        SourceKind::Polled => Source::Polled(PolledSource::new(http, &args.snapshot)),
        SourceKind::LiveGeo => {
            let api_key = args.api_key.clone().ok_or(Error::MissingApiKey)?;
            let store_path = args
                .location_file
                .clone()
                .or_else(FileStore::default_path)
                .context("no config directory; pass --location-file")?;
            let geolocator: Box<dyn Geolocator> = match (args.lat, args.lon) {
                (Some(lat), Some(lon)) => Box::new(FixedPosition(Coordinates::new(lat, lon))),
                _ => Box::new(IpGeolocator::new(http.clone(), &args.geoip_url)),
            };
            let resolver = Resolver::new(
                Box::new(FileStore::new(store_path)),
                geolocator,
                Geocoder::new(http.clone(), &args.geocode_url),
            );
            let weather = WeatherClient::new(http, &args.weather_url, api_key);
            Source::LiveGeo(LiveGeoSource::new(resolver, weather))
        }
    };
    Ok(source)
}

fn run_terminal(dashboard: Dashboard, refresh: Arc<Notify>) -> io::Result<()> {
    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, dashboard, refresh);

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.once)?;

    let mut source = build_source(&args)?;
    let dashboard = Dashboard::default();
    info!(source = source.name(), "starting");

    if args.once {
        if !refresh_once(&mut source, &dashboard).await {
            warn!("no weather data; printing placeholder state");
        }
        println!("{}", serde_json::to_string_pretty(&dashboard.current())?);
        return Ok(());
    }

    let period = args
        .interval
        .map(Duration::from_secs)
        .or(source.default_period());
    let refresher = spawn_refresher(source, dashboard.clone(), period);

    let trigger = refresher.trigger();
    let res = tokio::task::spawn_blocking(move || run_terminal(dashboard, trigger)).await?;

    drop(refresher);
    info!("stopped");
    Ok(res?)
}

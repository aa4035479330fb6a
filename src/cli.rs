use std::path::PathBuf;

use clap::builder::{styling::AnsiColor, Styles};
use clap::{Parser, ValueEnum};

use wxdash::{geocode, location, provider};

const ABOUT: &str = "Weather dashboard TUI";

const LONG_ABOUT: &str = "
TUI showing current conditions, wind, humidity, UV index, visibility and a three hour forecast strip.

The default `live-geo` source locates you (from --lat/--lon, or by IP address), names the place via
OpenStreetMap and queries Visual Crossing. The resolved place is saved, so subsequent runs of `wxdash`
reuse it instead of locating you again. Delete the location file to force a new lookup.

The `polled` source re-reads a published weatherData.json snapshot (URL or path) every two seconds,
and the `static` source shows built-in sample data.
";

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default())
    .usage(AnsiColor::Green.on_default())
    .literal(AnsiColor::Green.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Static,
    Polled,
    LiveGeo,
}

#[derive(Parser, Debug)]
#[command(version, styles=STYLES, about=ABOUT, long_about = LONG_ABOUT)]
pub struct Args {
    #[arg(long, value_enum, default_value_t = SourceKind::LiveGeo, help = "Where weather data comes from")]
    pub source: SourceKind,

    #[arg(long, default_value = "weatherData.json", help = "Snapshot URL or path for the polled source")]
    pub snapshot: String,

    #[arg(long, env = "WXDASH_API_KEY", hide_env_values = true, help = "Visual Crossing API key")]
    pub api_key: Option<String>,

    #[arg(long, default_value = provider::BASE_URL)]
    pub weather_url: String,

    #[arg(long, default_value = geocode::BASE_URL)]
    pub geocode_url: String,

    #[arg(long, default_value = location::GEOIP_URL)]
    pub geoip_url: String,

    #[arg(long, requires = "lon", allow_negative_numbers = true, help = "Latitude to use instead of IP geolocation")]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true, help = "Longitude to use instead of IP geolocation")]
    pub lon: Option<f64>,

    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..), help = "Refresh period (default: 2 for polled, 900 for live-geo)")]
    pub interval: Option<u64>,

    #[arg(long, value_name = "SECONDS", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..), help = "HTTP request timeout")]
    pub timeout: u64,

    #[arg(long, help = "Where the resolved location is saved")]
    pub location_file: Option<PathBuf>,

    #[arg(long, help = "Refresh once, print the result as JSON and exit")]
    pub once: bool,
}

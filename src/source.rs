//! Where the dashboard's data comes from.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::Local;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::display::{hour_strip, DisplayWeather, HourSlot, Reading, MISSING};
use crate::error::{LocationError, Result};
use crate::http::get_json;
use crate::icon::derive_icon;
use crate::location::{ResolvedLocation, Resolver};
use crate::provider::WeatherClient;

pub const POLLED_PERIOD: Duration = Duration::from_secs(2);
pub const LIVE_PERIOD: Duration = Duration::from_secs(15 * 60);

/// A published snapshot: the display schema without icons.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub day: Option<String>,
    pub location: Option<String>,
    pub condition: Option<String>,
    pub temperature: Option<Value>,
    pub wind_speed: Option<Value>,
    pub humidity: Option<Value>,
    pub uv_index: Option<Value>,
    pub visibility: Option<Value>,
    pub hourly_forecast: Option<Vec<SnapshotHour>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct SnapshotHour {
    pub time: Option<String>,
    pub desc: Option<String>,
    pub temp: Option<Value>,
    #[serde(default)]
    pub active: bool,
}

fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

// Metrics may be published as `{ "value": 15, ... }` or as a bare value.
fn metric_reading(value: &Option<Value>) -> Option<Reading> {
    match value {
        Some(Value::Object(fields)) => Reading::from_json(fields.get("value")),
        other => Reading::from_json(other.as_ref()),
    }
}

impl Snapshot {
    pub fn normalize(&self, previous: &DisplayWeather) -> DisplayWeather {
        let keep = |value: Option<&str>, old: &String| value.map(str::to_string).unwrap_or_else(|| old.clone());

        let (condition, condition_icon) = match text(&self.condition) {
            Some(c) => (c.to_string(), derive_icon(c)),
            None => (previous.condition.clone(), previous.condition_icon),
        };

        let hourly = match &self.hourly_forecast {
            Some(hours) => {
                // At most one slot may be current.
                let mut seen_current = false;
                hour_strip(hours.iter().map(|h| {
                    let is_current = h.active && !seen_current;
                    seen_current |= is_current;
                    HourSlot::new(
                        text(&h.time).unwrap_or(MISSING),
                        text(&h.desc).unwrap_or(MISSING),
                        Reading::from_json(h.temp.as_ref()).unwrap_or_default(),
                        is_current,
                    )
                }))
            }
            None => previous.hourly.clone(),
        };

        DisplayWeather {
            day: keep(text(&self.day), &previous.day),
            location: keep(text(&self.location), &previous.location),
            condition_icon,
            condition,
            temperature_c: Reading::from_json(self.temperature.as_ref())
                .unwrap_or_else(|| previous.temperature_c.clone()),
            wind: previous.wind.updated(metric_reading(&self.wind_speed)),
            humidity: previous.humidity.updated(metric_reading(&self.humidity)),
            uv_index: previous.uv_index.updated(metric_reading(&self.uv_index)),
            visibility: previous.visibility.updated(metric_reading(&self.visibility)),
            hourly,
        }
    }
}

/// Re-reads a snapshot from a URL or a local file.
#[derive(Debug, Clone)]
pub struct PolledSource {
    http: Client,
    target: String,
}

impl PolledSource {
    pub fn new(http: Client, target: impl Into<String>) -> Self {
        Self {
            http,
            target: target.into(),
        }
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        if self.target.starts_with("http://") || self.target.starts_with("https://") {
            // Cache buster
            let stamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis().to_string())
                .unwrap_or_default();
            let request = self.http.get(&self.target).query(&[("t", stamp)]);
            get_json(request, &self.target).await
        } else {
            let text = tokio::fs::read_to_string(&self.target).await?;
            Ok(serde_json::from_str(&text)?)
        }
    }
}

#[derive(Debug)]
enum Located {
    Pending,
    Resolved(ResolvedLocation),
    Failed,
}

/// Locates the device once per session, then queries the weather provider
/// for the last known coordinates on every refresh.
pub struct LiveGeoSource {
    resolver: Resolver,
    weather: WeatherClient,
    located: Located,
}

impl LiveGeoSource {
    pub fn new(resolver: Resolver, weather: WeatherClient) -> Self {
        Self {
            resolver,
            weather,
            located: Located::Pending,
        }
    }

    async fn location(&mut self) -> std::result::Result<Option<ResolvedLocation>, LocationError> {
        match &self.located {
            Located::Resolved(location) => Ok(Some(location.clone())),
            Located::Failed => Ok(None),
            Located::Pending => match self.resolver.locate().await {
                Ok(location) => {
                    self.located = Located::Resolved(location.clone());
                    Ok(Some(location))
                }
                Err(e) => {
                    self.located = Located::Failed;
                    Err(e)
                }
            },
        }
    }
}

pub enum Source {
    Static,
    Polled(PolledSource),
    LiveGeo(LiveGeoSource),
}

impl Source {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Polled(_) => "polled",
            Self::LiveGeo(_) => "live-geo",
        }
    }

    /// `None` means refresh only on demand.
    pub fn default_period(&self) -> Option<Duration> {
        match self {
            Self::Static => None,
            Self::Polled(_) => Some(POLLED_PERIOD),
            Self::LiveGeo(_) => Some(LIVE_PERIOD),
        }
    }

    /// Produces the next display state. `Ok(None)` means there is nothing
    /// to update this time.
    pub async fn refresh(&mut self, previous: &DisplayWeather) -> Result<Option<DisplayWeather>> {
        match self {
            Self::Static => Ok(Some(DisplayWeather::sample())),
            Self::Polled(source) => Ok(Some(source.snapshot().await?.normalize(previous))),
            Self::LiveGeo(source) => {
                let Some(location) = source.location().await? else {
                    debug!("no location this session; skipping refresh");
                    return Ok(None);
                };
                let weather = source
                    .weather
                    .fetch_and_normalize(location.coordinates, previous, Local::now().time())
                    .await?;
                info!(location = %location.label, "weather updated");
                Ok(Some(weather.with_location(&location.label)))
            }
        }
    }
}

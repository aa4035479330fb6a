//! Location resolution: a previously cached place first, then the
//! geolocator, with the resolved place persisted after reverse geocoding.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{LocationError, Result};
use crate::geocode::{place_label, Geocoder};
use crate::http::get_json;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// The last reverse-geocoded position. Never expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub country: String,
    pub resolved_at: DateTime<Utc>,
}

impl CachedLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn label(&self) -> String {
        place_label(&self.city, &self.country)
    }
}

/// Persistence for the single [`CachedLocation`] record.
pub trait LocationStore: Send + Sync {
    fn load(&self) -> Option<CachedLocation>;

    fn save(&self, location: &CachedLocation) -> Result<()>;
}

/// Stores the record as JSON text in one file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/wxdash/location.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("wxdash").join("location.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocationStore for FileStore {
    fn load(&self) -> Option<CachedLocation> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read cached location");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(location) => Some(location),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring malformed cached location");
                None
            }
        }
    }

    fn save(&self, location: &CachedLocation) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(location)?)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    location: Mutex<Option<CachedLocation>>,
}

impl MemoryStore {
    pub fn new(location: Option<CachedLocation>) -> Self {
        Self {
            location: Mutex::new(location),
        }
    }
}

impl LocationStore for MemoryStore {
    fn load(&self) -> Option<CachedLocation> {
        self.location.lock().clone()
    }

    fn save(&self, location: &CachedLocation) -> Result<()> {
        *self.location.lock() = Some(location.clone());
        Ok(())
    }
}

/// Source of the device's current position.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> std::result::Result<Coordinates, LocationError>;
}

/// Position configured up front.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl Geolocator for FixedPosition {
    async fn current_position(&self) -> std::result::Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

pub const GEOIP_URL: &str = "http://ip-api.com";

#[derive(Debug, Deserialize)]
struct GeoIpResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Approximates the position from the public IP address (ip-api.com).
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    http: Client,
    base_url: String,
}

impl IpGeolocator {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn current_position(&self) -> std::result::Result<Coordinates, LocationError> {
        let url = format!("{}/json", self.base_url);
        let body: GeoIpResponse = get_json(self.http.get(&url), &url)
            .await
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;

        if body.status != "success" {
            let reason = body.message.unwrap_or(body.status);
            return Err(match reason.as_str() {
                "reserved range" | "private range" => LocationError::Denied,
                _ => LocationError::Unavailable(reason),
            });
        }
        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
            _ => Err(LocationError::Unavailable("response had no coordinates".to_string())),
        }
    }
}

/// Coordinates to query plus the label shown for them.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub coordinates: Coordinates,
    pub label: String,
}

pub struct Resolver {
    store: Box<dyn LocationStore>,
    geolocator: Box<dyn Geolocator>,
    geocoder: Geocoder,
}

impl Resolver {
    pub fn new(
        store: Box<dyn LocationStore>,
        geolocator: Box<dyn Geolocator>,
        geocoder: Geocoder,
    ) -> Self {
        Self {
            store,
            geolocator,
            geocoder,
        }
    }

    /// Cached coordinates if any, otherwise a single geolocation attempt.
    pub async fn resolve(&self) -> std::result::Result<Coordinates, LocationError> {
        if let Some(cached) = self.store.load() {
            info!(city = %cached.city, "using cached location");
            return Ok(cached.coordinates());
        }
        self.geolocator.current_position().await
    }

    /// Names the place at `at` and persists it. Any failure yields the
    /// coordinate pair as the label and persists nothing.
    pub async fn reverse_geocode(&self, at: Coordinates) -> String {
        let place = match self.geocoder.lookup(at).await {
            Ok(Some(place)) => place,
            Ok(None) => {
                warn!(%at, "reverse geocode found no place name");
                return at.to_string();
            }
            Err(e) => {
                warn!(%at, error = %e, "reverse geocode failed");
                return at.to_string();
            }
        };

        let cached = CachedLocation {
            latitude: at.latitude,
            longitude: at.longitude,
            city: place.city.clone(),
            country: place.country.clone(),
            resolved_at: Utc::now(),
        };
        if let Err(e) = self.store.save(&cached) {
            warn!(error = %e, "failed to persist location");
        }
        info!(place = %place.label(), "resolved location");
        place.label()
    }

    /// Coordinates and display label for this session.
    pub async fn locate(&self) -> std::result::Result<ResolvedLocation, LocationError> {
        if let Some(cached) = self.store.load() {
            info!(city = %cached.city, "using cached location");
            return Ok(ResolvedLocation {
                coordinates: cached.coordinates(),
                label: cached.label(),
            });
        }
        let coordinates = self.geolocator.current_position().await?;
        let label = self.reverse_geocode(coordinates).await;
        Ok(ResolvedLocation { coordinates, label })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pune() -> CachedLocation {
        CachedLocation {
            latitude: 18.5204,
            longitude: 73.8567,
            city: "Pune".to_string(),
            country: "India".to_string(),
            resolved_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("location.json"));
        assert_eq!(store.load(), None);

        store.save(&pune()).unwrap();
        assert_eq!(store.load(), Some(pune()));

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\"resolvedAt\""));
    }

    #[test]
    fn test_file_store_ignores_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("location.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(FileStore::new(path).load(), None);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::default();
        store.save(&pune()).unwrap();
        assert_eq!(store.load(), Some(pune()));
    }

    #[test]
    fn test_coordinates_label() {
        assert_eq!(Coordinates::new(18.52043, -73.8).to_string(), "18.5204, -73.8000");
        assert_eq!(pune().label(), "Pune, India");
    }
}

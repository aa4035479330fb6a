//! Reverse geocoding through Nominatim (OpenStreetMap).

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::http::get_json;
use crate::location::Coordinates;

pub const BASE_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    municipality: Option<String>,
    village: Option<String>,
    country: Option<String>,
}

/// Human-readable place for a coordinate pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Place {
    pub city: String,
    pub country: String,
}

impl Place {
    /// `"City, Country"`, dropping whichever part is empty.
    pub fn label(&self) -> String {
        place_label(&self.city, &self.country)
    }
}

pub(crate) fn place_label(city: &str, country: &str) -> String {
    [city, country]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    http: Client,
    base_url: String,
}

impl Geocoder {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Looks up the place at `at`. `Ok(None)` means the service answered
    /// but named neither a settlement nor a country.
    pub async fn lookup(&self, at: Coordinates) -> Result<Option<Place>> {
        let url = format!("{}/reverse", self.base_url);
        let request = self.http.get(&url).query(&[
            ("format", "json".to_string()),
            ("lat", at.latitude.to_string()),
            ("lon", at.longitude.to_string()),
        ]);
        let body: NominatimResponse = get_json(request, &url).await?;

        let Some(addr) = body.address else {
            debug!("reverse geocode response had no address");
            return Ok(None);
        };

        // Prefer city > town > municipality > village
        let city = addr
            .city
            .or(addr.town)
            .or(addr.municipality)
            .or(addr.village)
            .unwrap_or_default();
        let country = addr.country.unwrap_or_default();
        if city.is_empty() && country.is_empty() {
            return Ok(None);
        }
        Ok(Some(Place { city, country }))
    }
}

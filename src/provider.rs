//! Visual Crossing timeline client and the mapping from its payload onto
//! [`DisplayWeather`].

use chrono::{NaiveDate, NaiveTime, Timelike};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::display::{hour_strip, DisplayWeather, HourSlot, Reading, MISSING};
use crate::error::Result;
use crate::http::get_json;
use crate::icon::derive_icon;
use crate::location::Coordinates;

pub const BASE_URL: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline";

#[derive(Deserialize, Debug, Default)]
pub struct Timeline {
    #[serde(rename = "currentConditions")]
    pub current_conditions: Option<Conditions>,

    pub days: Option<Vec<Day>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Conditions {
    pub temp: Option<Value>,
    pub windspeed: Option<Value>,
    pub humidity: Option<Value>,
    pub uvindex: Option<Value>,
    pub visibility: Option<Value>,
    pub conditions: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Day {
    pub datetime: Option<String>,
    pub hours: Option<Vec<Hour>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Hour {
    /// `HH:MM:SS`
    pub datetime: Option<String>,
    pub temp: Option<Value>,
    pub conditions: Option<String>,
}

impl Hour {
    fn to_slot(&self, is_current: bool) -> HourSlot {
        let time = self
            .datetime
            .as_deref()
            .map(|t| t.get(..5).unwrap_or(t))
            .unwrap_or(MISSING);
        let description = self
            .conditions
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(MISSING);
        let temperature = Reading::from_json(self.temp.as_ref()).unwrap_or_default();
        HourSlot::new(time, description, temperature, is_current)
    }
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub async fn timeline(&self, at: Coordinates) -> Result<Timeline> {
        let url = format!("{}/{},{}", self.base_url, at.latitude, at.longitude);
        debug!(%url, "fetching timeline");
        let request = self.http.get(&url).query(&[
            ("unitGroup", "metric"),
            ("key", self.api_key.as_str()),
            ("contentType", "json"),
        ]);
        get_json(request, &url).await
    }

    /// Fetches the timeline for `at` and reshapes it, keeping values from
    /// `previous` wherever the payload has nothing.
    pub async fn fetch_and_normalize(
        &self,
        at: Coordinates,
        previous: &DisplayWeather,
        now: NaiveTime,
    ) -> Result<DisplayWeather> {
        let timeline = self.timeline(at).await?;
        Ok(normalize(&timeline, previous, now))
    }
}

/// Index of the first hour shown in the strip: the hour whose `datetime`
/// starts with the current `HH:`, or the current hour clamped so that three
/// entries remain.
pub fn window_start(hours: &[Hour], current_hour: u32) -> usize {
    let prefix = format!("{current_hour:02}:");
    hours
        .iter()
        .position(|h| h.datetime.as_deref().is_some_and(|d| d.starts_with(&prefix)))
        .unwrap_or_else(|| (current_hour as usize).min(hours.len().saturating_sub(3)))
}

/// The three-slot strip. The middle slot is always the current one.
pub fn hour_window(hours: &[Hour], current_hour: u32) -> [HourSlot; 3] {
    let start = window_start(hours, current_hour);
    hour_strip((0..3).map(|offset| {
        let is_current = offset == 1;
        hours
            .get(start + offset)
            .map(|h| h.to_slot(is_current))
            .unwrap_or_else(|| HourSlot::placeholder(is_current))
    }))
}

pub fn normalize(timeline: &Timeline, previous: &DisplayWeather, now: NaiveTime) -> DisplayWeather {
    let current = timeline.current_conditions.as_ref();
    let reading = |pick: &dyn Fn(&Conditions) -> Option<&Value>| {
        current.and_then(|c| Reading::from_json(pick(c)))
    };

    let condition = current
        .and_then(|c| c.conditions.as_deref())
        .filter(|c| !c.trim().is_empty());
    let (condition, condition_icon) = match condition {
        Some(c) => (c.to_string(), derive_icon(c)),
        None => (previous.condition.clone(), previous.condition_icon),
    };

    let today = timeline.days.as_deref().and_then(|days| days.first());
    let day = today
        .and_then(|d| d.datetime.as_deref())
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|d| d.format("%A").to_string())
        .unwrap_or_else(|| previous.day.clone());
    let hourly = match today.and_then(|d| d.hours.as_deref()) {
        Some(hours) => hour_window(hours, now.hour()),
        None => previous.hourly.clone(),
    };

    DisplayWeather {
        day,
        location: previous.location.clone(),
        condition_icon,
        condition,
        temperature_c: reading(&|c| c.temp.as_ref()).unwrap_or_else(|| previous.temperature_c.clone()),
        wind: previous.wind.updated(reading(&|c| c.windspeed.as_ref())),
        humidity: previous.humidity.updated(reading(&|c| c.humidity.as_ref())),
        uv_index: previous.uv_index.updated(reading(&|c| c.uvindex.as_ref())),
        visibility: previous.visibility.updated(reading(&|c| c.visibility.as_ref())),
        hourly,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::Icon;
    use serde_json::json;

    fn hours(n: u32) -> Vec<Hour> {
        (0..n)
            .map(|h| Hour {
                datetime: Some(format!("{h:02}:00:00")),
                temp: Some(json!(h as f64 + 0.4)),
                conditions: Some("Rain".to_string()),
            })
            .collect()
    }

    fn at(hour: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, 12, 0).unwrap()
    }

    #[test]
    fn test_window_matches_current_hour() {
        let hours = hours(24);
        assert_eq!(window_start(&hours, 5), 5);

        let strip = hour_window(&hours, 5);
        assert_eq!(strip[0].time, "05:00");
        assert_eq!(strip[1].time, "06:00");
        assert_eq!(strip[1].temperature_c, Reading::Number(6));
        assert_eq!(strip[2].time, "07:00");
    }

    #[test]
    fn test_window_clamps_without_match() {
        let mut unmatched = hours(6);
        for h in &mut unmatched {
            h.datetime = Some("xx".to_string());
        }
        assert_eq!(window_start(&unmatched, 2), 2);
        assert_eq!(window_start(&unmatched, 22), 3);
        assert_eq!(window_start(&hours(2), 22), 0);
    }

    #[test]
    fn test_window_middle_slot_is_current() {
        for (n, hour) in [(24, 23), (24, 0), (1, 10), (4, 3)] {
            let strip = hour_window(&hours(n), hour);
            let current: Vec<_> = strip.iter().map(|s| s.is_current).collect();
            assert_eq!(current, vec![false, true, false], "n={n} hour={hour}");
        }
    }

    #[test]
    fn test_window_empty_hours_yields_placeholders() {
        let strip = hour_window(&[], 13);
        assert_eq!(strip[0], HourSlot::placeholder(false));
        assert_eq!(strip[1], HourSlot::placeholder(true));
        assert_eq!(strip[2], HourSlot::placeholder(false));
    }

    #[test]
    fn test_window_near_end_of_day_pads() {
        let strip = hour_window(&hours(24), 23);
        assert_eq!(strip[0].time, "23:00");
        assert_eq!(strip[1], HourSlot::placeholder(true));
    }

    #[test]
    fn test_normalize_full_payload() {
        let timeline: Timeline = serde_json::from_value(json!({
            "currentConditions": {
                "temp": 23.4,
                "windspeed": 11.6,
                "humidity": 64.2,
                "uvindex": 3,
                "visibility": 9.9,
                "conditions": "Partially cloudy"
            },
            "days": [{
                "datetime": "2024-01-15",
                "hours": [
                    {"datetime": "13:00:00", "temp": 20.1, "conditions": "Clear"},
                    {"datetime": "14:00:00", "temp": 21.5, "conditions": "Snow"},
                    {"datetime": "15:00:00", "temp": "n/a", "conditions": "Fog"}
                ]
            }]
        }))
        .unwrap();

        let previous = DisplayWeather::placeholder().with_location("Berlin, Germany");
        let weather = normalize(&timeline, &previous, at(13));

        assert_eq!(weather.day, "Monday");
        assert_eq!(weather.location, "Berlin, Germany");
        assert_eq!(weather.condition, "Partially cloudy");
        assert_eq!(weather.condition_icon, Icon::Cloud);
        assert_eq!(weather.temperature_c, Reading::Number(23));
        assert_eq!(weather.wind.value, Reading::Number(12));
        assert_eq!(weather.humidity.value, Reading::Number(64));
        assert_eq!(weather.uv_index.value, Reading::Number(3));
        assert_eq!(weather.visibility.value, Reading::Number(10));
        assert_eq!(weather.hourly[1].icon, Icon::Snow);
        assert_eq!(weather.hourly[2].temperature_c, Reading::Text("n/a".to_string()));
    }

    #[test]
    fn test_normalize_falls_back_to_previous() {
        let previous = DisplayWeather::sample();
        let weather = normalize(&Timeline::default(), &previous, at(9));
        assert_eq!(weather, previous);

        let timeline: Timeline = serde_json::from_value(json!({
            "currentConditions": {"temp": null, "humidity": 50},
            "days": [{"datetime": "garbage"}]
        }))
        .unwrap();
        let weather = normalize(&timeline, &previous, at(9));
        assert_eq!(weather.temperature_c, previous.temperature_c);
        assert_eq!(weather.humidity.value, Reading::Number(50));
        assert_eq!(weather.wind, previous.wind);
        assert_eq!(weather.condition, previous.condition);
        assert_eq!(weather.day, previous.day);
        assert_eq!(weather.hourly, previous.hourly);
    }
}

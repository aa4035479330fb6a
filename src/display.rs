//! The dashboard's display schema.
//!
//! Every data source produces a [`DisplayWeather`]; the terminal UI only
//! ever reads this shape. Values that could not be obtained are carried as
//! [`Reading::Placeholder`] and render as [`MISSING`], never as an absent
//! field.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::icon::{derive_icon, Icon};

pub const MISSING: &str = "--";

/// A displayed quantity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Reading {
    Number(i64),
    Text(String),
    #[default]
    Placeholder,
}

impl Reading {
    /// Reads an upstream JSON value. Numbers are rounded to the nearest
    /// integer (halves round up, so -2.5 becomes -2) and non-empty strings
    /// pass through unchanged. Returns `None` when the value is absent so
    /// the caller can keep its previous reading.
    pub fn from_json(value: Option<&Value>) -> Option<Self> {
        match value? {
            Value::Number(n) => n.as_f64().map(|f| Self::Number((f + 0.5).floor() as i64)),
            Value::String(s) if !s.trim().is_empty() => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Placeholder => f.write_str(MISSING),
        }
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_i64(*n),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Placeholder => serializer.serialize_str(MISSING),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub title: String,
    pub icon: Icon,
    pub value: Reading,
    pub unit: String,
}

impl Metric {
    fn new(title: &str, icon: Icon, unit: &str) -> Self {
        Self {
            title: title.to_string(),
            icon,
            value: Reading::Placeholder,
            unit: unit.to_string(),
        }
    }

    pub fn wind() -> Self {
        Self::new("Wind Speed", Icon::Wind, "km/h")
    }

    pub fn humidity() -> Self {
        Self::new("Humidity", Icon::Humidity, "%")
    }

    pub fn uv_index() -> Self {
        Self::new("UV Index", Icon::UvIndex, "")
    }

    pub fn visibility() -> Self {
        Self::new("Visibility", Icon::Visibility, "km")
    }

    pub fn with_value(mut self, value: Reading) -> Self {
        self.value = value;
        self
    }

    /// Same metric with `value` replaced, or unchanged when `value` is `None`.
    pub fn updated(&self, value: Option<Reading>) -> Self {
        match value {
            Some(value) => self.clone().with_value(value),
            None => self.clone(),
        }
    }
}

/// One entry of the three-slot hourly strip.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourSlot {
    pub time: String,
    pub description: String,
    pub icon: Icon,
    pub temperature_c: Reading,
    pub is_current: bool,
}

impl HourSlot {
    pub fn new(time: &str, description: &str, temperature_c: Reading, is_current: bool) -> Self {
        Self {
            time: time.to_string(),
            description: description.to_string(),
            icon: derive_icon(description),
            temperature_c,
            is_current,
        }
    }

    pub fn placeholder(is_current: bool) -> Self {
        Self {
            time: MISSING.to_string(),
            description: MISSING.to_string(),
            icon: Icon::Loading,
            temperature_c: Reading::Placeholder,
            is_current,
        }
    }
}

/// Builds exactly three slots from `slots`, padding with placeholders and
/// dropping anything past the third.
pub fn hour_strip<I>(slots: I) -> [HourSlot; 3]
where
    I: IntoIterator<Item = HourSlot>,
{
    let mut slots = slots.into_iter();
    let mut next = || slots.next().unwrap_or_else(|| HourSlot::placeholder(false));
    [next(), next(), next()]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayWeather {
    pub day: String,
    pub location: String,
    pub condition_icon: Icon,
    pub condition: String,
    pub temperature_c: Reading,
    pub wind: Metric,
    pub humidity: Metric,
    pub uv_index: Metric,
    pub visibility: Metric,
    pub hourly: [HourSlot; 3],
}

impl DisplayWeather {
    /// State shown before the first successful refresh.
    pub fn placeholder() -> Self {
        Self {
            day: "Today".to_string(),
            location: MISSING.to_string(),
            condition_icon: Icon::Loading,
            condition: MISSING.to_string(),
            temperature_c: Reading::Placeholder,
            wind: Metric::wind(),
            humidity: Metric::humidity(),
            uv_index: Metric::uv_index(),
            visibility: Metric::visibility(),
            hourly: [
                HourSlot::placeholder(false),
                HourSlot::placeholder(true),
                HourSlot::placeholder(false),
            ],
        }
    }

    /// Fixed mock dataset used by the static source.
    pub fn sample() -> Self {
        Self {
            day: "Today".to_string(),
            location: "Mumbai, India".to_string(),
            condition_icon: Icon::Clear,
            condition: "Clear sky".to_string(),
            temperature_c: Reading::Number(23),
            wind: Metric::wind().with_value(Reading::Number(15)),
            humidity: Metric::humidity().with_value(Reading::Number(78)),
            uv_index: Metric::uv_index().with_value(Reading::Number(5)),
            visibility: Metric::visibility().with_value(Reading::Number(10)),
            hourly: [
                HourSlot::new("12:00", "Snow", Reading::Number(16), false),
                HourSlot::new("14:00", "Rain", Reading::Number(11), true),
                HourSlot::new("16:00", "Cloudy", Reading::Number(22), false),
            ],
        }
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = location.to_string();
        self
    }
}

impl Default for DisplayWeather {
    fn default() -> Self {
        Self::placeholder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reading_from_json() {
        assert_eq!(Reading::from_json(Some(&json!(23.4))), Some(Reading::Number(23)));
        assert_eq!(Reading::from_json(Some(&json!(-0.6))), Some(Reading::Number(-1)));
        assert_eq!(Reading::from_json(Some(&json!(0))), Some(Reading::Number(0)));
        assert_eq!(Reading::from_json(Some(&json!(-2.5))), Some(Reading::Number(-2)));
        assert_eq!(Reading::from_json(Some(&json!(2.5))), Some(Reading::Number(3)));
        assert_eq!(
            Reading::from_json(Some(&json!("N/A"))),
            Some(Reading::Text("N/A".to_string()))
        );
        assert_eq!(Reading::from_json(Some(&json!(""))), None);
        assert_eq!(Reading::from_json(Some(&json!(null))), None);
        assert_eq!(Reading::from_json(None), None);
    }

    #[test]
    fn test_reading_display() {
        assert_eq!(Reading::Number(7).to_string(), "7");
        assert_eq!(Reading::Placeholder.to_string(), MISSING);
    }

    #[test]
    fn test_hour_strip_pads_and_truncates() {
        let strip = hour_strip(vec![HourSlot::new("01:00", "Rain", Reading::Number(3), true)]);
        assert_eq!(strip[0].time, "01:00");
        assert_eq!(strip[1], HourSlot::placeholder(false));
        assert_eq!(strip[2], HourSlot::placeholder(false));

        let many = (0..5).map(|i| HourSlot::new(&format!("{i:02}:00"), "", Reading::Number(i), false));
        let strip = hour_strip(many);
        assert_eq!(strip[2].time, "02:00");
    }

    #[test]
    fn test_placeholder_marks_middle_slot() {
        let weather = DisplayWeather::placeholder();
        let current: Vec<_> = weather.hourly.iter().map(|h| h.is_current).collect();
        assert_eq!(current, vec![false, true, false]);
    }

    #[test]
    fn test_serializes_placeholder_as_missing() {
        let value = serde_json::to_value(DisplayWeather::placeholder()).unwrap();
        assert_eq!(value["temperatureC"], json!(MISSING));
        assert_eq!(value["uvIndex"]["title"], json!("UV Index"));
        assert_eq!(value["hourly"][1]["isCurrent"], json!(true));
    }
}

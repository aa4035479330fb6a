use serde::Serialize;

/// Pictogram reference attached to conditions, metrics and hour slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Icon {
    Snow,
    Storm,
    Rain,
    Cloud,
    Fog,
    Clear,
    Loading,
    Wind,
    Humidity,
    UvIndex,
    Visibility,
}

impl Icon {
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Snow => "🌨️",
            Self::Storm => "⛈️",
            Self::Rain => "🌧️",
            Self::Cloud => "☁️",
            Self::Fog => "🌫️",
            Self::Clear => "☀️",
            Self::Loading => "⏳",
            Self::Wind => "💨",
            Self::Humidity => "💧",
            Self::UvIndex => "🔆",
            Self::Visibility => "👁️",
        }
    }
}

// First match wins. Storm is checked before rain so "Rain, Thunderstorm"
// shows the storm pictogram.
const PRIORITY: [(&[&str], Icon); 6] = [
    (&["snow"], Icon::Snow),
    (&["storm", "thunder"], Icon::Storm),
    (&["rain"], Icon::Rain),
    (&["cloud"], Icon::Cloud),
    (&["fog", "mist"], Icon::Fog),
    (&["clear"], Icon::Clear),
];

/// Picks a condition pictogram from free text.
pub fn derive_icon(condition: &str) -> Icon {
    let condition = condition.to_lowercase();
    PRIORITY
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| condition.contains(k)))
        .map(|(_, icon)| *icon)
        .unwrap_or(Icon::Loading)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_icon() {
        assert_eq!(derive_icon("Heavy Snow Showers"), Icon::Snow);
        assert_eq!(derive_icon("Light Rain"), Icon::Rain);
        assert_eq!(derive_icon("Thunder"), Icon::Storm);
        assert_eq!(derive_icon("Mist"), Icon::Fog);
        assert_eq!(derive_icon("CLEAR"), Icon::Clear);
        assert_eq!(derive_icon("Overcast"), Icon::Loading);
        assert_eq!(derive_icon(""), Icon::Loading);
    }

    #[test]
    fn test_derive_icon_tie_breaks() {
        assert_eq!(derive_icon("Rain, Thunderstorm"), Icon::Storm);
        assert_eq!(derive_icon("Partly Cloudy with Fog"), Icon::Cloud);
        assert_eq!(derive_icon("Snow, Rain, Overcast"), Icon::Snow);
    }
}

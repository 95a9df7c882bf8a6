use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unit system requested from the provider. Temperatures and wind speeds in
/// responses arrive already converted; nothing downstream re-converts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub fn temp_symbol(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "°C",
            UnitSystem::Imperial => "°F",
        }
    }

    pub fn wind_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m/s",
            UnitSystem::Imperial => "mph",
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported systems: metric, imperial."
            )),
        }
    }
}

/// A named point on the map: search result, reverse-geocode result, or a
/// saved city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Place {
    /// Coordinate equality, ignoring the display name. Saved-city dedupe and
    /// removal match on this, so the same spot saved under two names counts
    /// as one city.
    pub fn same_spot(&self, other: &Place) -> bool {
        self.lat == other.lat && self.lon == other.lon
    }
}

/// Current conditions at a location, one observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub observed_at: DateTime<Utc>,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub wind_speed: f64,
    /// Wind bearing in degrees; the provider omits it in calm conditions.
    pub wind_deg: Option<u16>,
    pub description: String,
    pub icon: String,
}

/// One raw forecast slot as delivered by the provider, typically every
/// 3 hours over a ~5 day horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    /// Provider epoch seconds. May carry UTC or a provider-applied offset,
    /// so it is never used to decide which calendar day a slot belongs to.
    pub timestamp: i64,
    /// `"YYYY-MM-DD HH:MM:SS"` in the provider's local framing. Authoritative
    /// for the slot's calendar day and hour.
    pub local_time_text: String,
    pub temperature: f64,
    pub description: String,
    pub icon: String,
}

/// The representative sample chosen for one calendar day, nearest local noon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    /// `"YYYY-MM-DD"`, unique across an output sequence.
    pub date: String,
    /// Hour of day (0-23) of the chosen sample.
    pub hour: u8,
    pub timestamp_millis: i64,
    pub temperature: f64,
    pub description: String,
    pub icon: String,
}

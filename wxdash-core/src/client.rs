//! HTTP client for the OpenWeather API.
//!
//! One GET per operation: current conditions, the 5-day/3-hour forecast
//! (reduced to daily summaries before it leaves this module), city search
//! and reverse geocoding. Credentials travel as the `appid` query parameter.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::forecast::daily_summaries;
use crate::model::{CurrentConditions, DailySummary, ForecastSample, Place, UnitSystem};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Default number of candidates returned by [`OpenWeatherClient::search_city`].
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Icon code substituted when a response carries no condition entry.
const CLEAR_SKY_ICON: &str = "01d";

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the client at a different host. Tests use this to talk to a
    /// local mock server.
    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    pub async fn current_weather(
        &self,
        lat: f64,
        lon: f64,
        units: UnitSystem,
    ) -> Result<CurrentConditions> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        tracing::debug!(lat, lon, %units, "requesting current weather");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("units", units.as_str().to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .context("Failed to send request to OpenWeather (current weather)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenWeather current response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather current request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: OwCurrentResponse =
            serde_json::from_str(&body).context("Failed to parse OpenWeather current JSON")?;

        let observed_at = unix_to_utc(parsed.dt).unwrap_or_else(Utc::now);
        let (description, icon) = condition_parts(&parsed.weather);

        Ok(CurrentConditions {
            observed_at,
            temperature: parsed.main.temp,
            feels_like: parsed.main.feels_like,
            humidity_pct: parsed.main.humidity,
            pressure_hpa: parsed.main.pressure,
            wind_speed: parsed.wind.speed,
            wind_deg: parsed.wind.deg,
            description,
            icon,
        })
    }

    /// Fetch the raw 5-day/3-hour forecast and reduce it to one summary per
    /// calendar day, nearest local noon, at most five entries.
    pub async fn forecast(
        &self,
        lat: f64,
        lon: f64,
        units: UnitSystem,
    ) -> Result<Vec<DailySummary>> {
        let url = format!("{}/data/2.5/forecast", self.base_url);
        tracing::debug!(lat, lon, %units, "requesting 5-day forecast");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("units", units.as_str().to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .context("Failed to send request to OpenWeather (5-day forecast)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenWeather forecast response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather forecast request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: OwForecastResponse =
            serde_json::from_str(&body).context("Failed to parse OpenWeather forecast JSON")?;

        let samples: Vec<ForecastSample> = parsed
            .list
            .into_iter()
            .map(|entry| {
                let (description, icon) = condition_parts(&entry.weather);
                ForecastSample {
                    timestamp: entry.dt,
                    local_time_text: entry.dt_txt,
                    temperature: entry.main.temp,
                    description,
                    icon,
                }
            })
            .collect();

        daily_summaries(&samples).context("OpenWeather forecast contained a malformed time slot")
    }

    /// Look up cities by free-form name, at most `limit` candidates.
    pub async fn search_city(&self, query: &str, limit: usize) -> Result<Vec<Place>> {
        let url = format!("{}/geo/1.0/direct", self.base_url);
        tracing::debug!(query, limit, "searching cities");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", query.to_string()),
                ("limit", limit.to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .context("Failed to send request to OpenWeather (city search)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenWeather city search response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather city search failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: Vec<GeoEntry> =
            serde_json::from_str(&body).context("Failed to parse OpenWeather city search JSON")?;

        Ok(parsed.into_iter().map(Place::from).collect())
    }

    /// Resolve coordinates to the nearest named place. An empty result is
    /// not an error: the caller gets a placeholder name and keeps the
    /// coordinates.
    pub async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<Place> {
        let url = format!("{}/geo/1.0/reverse", self.base_url);
        tracing::debug!(lat, lon, "reverse geocoding");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("limit", "1".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .context("Failed to send request to OpenWeather (reverse geocoding)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenWeather reverse geocoding response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather reverse geocoding failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: Vec<GeoEntry> = serde_json::from_str(&body)
            .context("Failed to parse OpenWeather reverse geocoding JSON")?;

        let place = match parsed.into_iter().next() {
            Some(entry) => Place::from(entry),
            None => {
                tracing::warn!(lat, lon, "no place found for coordinates");
                Place { name: "Unknown Location".to_string(), lat, lon }
            }
        };

        Ok(place)
    }
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    dt: i64,
    main: OwMain,
    wind: OwWind,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwSlotMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    dt_txt: String,
    main: OwSlotMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct GeoEntry {
    name: String,
    lat: f64,
    lon: f64,
    state: Option<String>,
    country: Option<String>,
}

impl From<GeoEntry> for Place {
    fn from(entry: GeoEntry) -> Self {
        let name = [Some(entry.name), entry.state, entry.country]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        Place { name, lat: entry.lat, lon: entry.lon }
    }
}

/// Description and icon of the leading condition entry; the provider may
/// send an empty list.
fn condition_parts(weather: &[OwWeather]) -> (String, String) {
    match weather.first() {
        Some(w) => (w.description.clone(), w.icon.clone()),
        None => (String::new(), CLEAR_SKY_ICON.to_string()),
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn slot(dt: i64, dt_txt: &str, temp: f64) -> serde_json::Value {
        json!({
            "dt": dt,
            "dt_txt": dt_txt,
            "main": { "temp": temp },
            "weather": [{ "description": "overcast clouds", "icon": "04d" }],
        })
    }

    fn client_for(server: &MockServer) -> OpenWeatherClient {
        OpenWeatherClient::with_base_url("TEST_KEY".to_string(), server.uri())
    }

    #[tokio::test]
    async fn current_weather_maps_response_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "TEST_KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "dt": 1_704_110_400,
                "main": { "temp": 21.4, "feels_like": 20.9, "humidity": 58, "pressure": 1013 },
                "wind": { "speed": 3.6, "deg": 200 },
                "weather": [{ "description": "few clouds", "icon": "02d" }],
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let current = client.current_weather(12.9716, 77.5946, UnitSystem::Metric).await.unwrap();

        assert_eq!(current.temperature, 21.4);
        assert_eq!(current.feels_like, 20.9);
        assert_eq!(current.humidity_pct, 58);
        assert_eq!(current.pressure_hpa, 1013);
        assert_eq!(current.wind_deg, Some(200));
        assert_eq!(current.description, "few clouds");
        assert_eq!(current.icon, "02d");
        assert_eq!(current.observed_at.timestamp(), 1_704_110_400);
    }

    #[tokio::test]
    async fn current_weather_defaults_when_condition_list_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "dt": 1_704_110_400,
                "main": { "temp": 10.0, "feels_like": 9.0, "humidity": 70, "pressure": 1001 },
                "wind": { "speed": 1.0 },
                "weather": [],
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let current = client.current_weather(0.0, 0.0, UnitSystem::Metric).await.unwrap();

        assert_eq!(current.description, "");
        assert_eq!(current.icon, "01d");
        assert_eq!(current.wind_deg, None);
    }

    #[tokio::test]
    async fn forecast_reduces_slots_to_daily_summaries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .and(query_param("units", "imperial"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "list": [
                    slot(1_704_099_600, "2024-01-01 09:00:00", 61.0),
                    slot(1_704_110_400, "2024-01-01 12:00:00", 66.0),
                    slot(1_704_121_200, "2024-01-01 15:00:00", 64.0),
                    slot(1_704_196_800, "2024-01-02 12:00:00", 59.0),
                ],
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let days = client.forecast(40.7, -74.0, UnitSystem::Imperial).await.unwrap();

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "2024-01-01");
        assert_eq!(days[0].hour, 12);
        assert_eq!(days[0].temperature, 66.0);
        assert_eq!(days[0].timestamp_millis, 1_704_110_400_000);
        assert_eq!(days[1].date, "2024-01-02");
    }

    #[tokio::test]
    async fn forecast_surfaces_http_failure_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string(r#"{"cod":401,"message":"Invalid API key"}"#),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.forecast(0.0, 0.0, UnitSystem::Metric).await.unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("401"), "unexpected error: {msg}");
        assert!(msg.contains("Invalid API key"), "unexpected error: {msg}");
    }

    #[tokio::test]
    async fn search_city_joins_name_state_and_country() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .and(query_param("q", "springfield"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "name": "Springfield", "lat": 39.8, "lon": -89.6, "state": "Illinois", "country": "US" },
                { "name": "Bengaluru", "lat": 12.9716, "lon": 77.5946, "country": "IN" },
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let places = client.search_city("springfield", DEFAULT_SEARCH_LIMIT).await.unwrap();

        assert_eq!(places.len(), 2);
        assert_eq!(places[0].name, "Springfield, Illinois, US");
        assert_eq!(places[1].name, "Bengaluru, IN");
        assert_eq!(places[1].lat, 12.9716);
    }

    #[tokio::test]
    async fn reverse_geocode_falls_back_on_empty_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geo/1.0/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let place = client.reverse_geocode(51.5, -0.1).await.unwrap();

        assert_eq!(place.name, "Unknown Location");
        assert_eq!(place.lat, 51.5);
        assert_eq!(place.lon, -0.1);
    }
}

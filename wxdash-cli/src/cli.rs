use anyhow::{Context, Result, anyhow, bail};
use chrono::{Local, TimeZone};
use clap::{Args, Parser, Subcommand};

use wxdash_core::{
    Config, CurrentConditions, DEFAULT_SEARCH_LIMIT, DailySummary, OpenWeatherClient, Place,
    Preferences, UnitSystem,
};

/// Fallback city used when no query, coordinates, or saved city identifies a
/// location.
const DEFAULT_CITY: (&str, f64, f64) = ("Bengaluru, IN", 12.9716, 77.5946);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxdash", version, about = "Weather dashboard CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key used by all other commands.
    Configure,

    /// Show current conditions for a location.
    Now {
        #[command(flatten)]
        target: Target,
    },

    /// Show the 5-day forecast, one entry per day nearest local noon.
    Forecast {
        #[command(flatten)]
        target: Target,
    },

    /// Search for cities by name.
    Search {
        /// Free-form city name, e.g. "Bengaluru" or "Springfield".
        query: String,

        /// Maximum number of candidates to list.
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },

    /// Add a city to the saved list for quick recall.
    Save {
        /// City name; the first search match is saved.
        query: String,
    },

    /// Remove a saved city by name.
    Remove {
        /// Saved city name, matched case-insensitively.
        name: String,
    },

    /// List saved cities, newest first.
    Cities,

    /// Show or set the preferred unit system.
    Units {
        /// "metric" or "imperial"; omit to show the current preference.
        system: Option<String>,
    },
}

/// Where and how to fetch weather, shared by `now` and `forecast`.
#[derive(Debug, Args)]
pub struct Target {
    /// City name; falls back to the first saved city, then a default city.
    pub query: Option<String>,

    /// Latitude; paired with --lon, skips the city lookup.
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude; paired with --lat.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Override the stored unit preference for this invocation only.
    #[arg(long)]
    pub units: Option<String>,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Now { target } => show_now(target).await,
            Command::Forecast { target } => show_forecast(target).await,
            Command::Search { query, limit } => search(&query, limit).await,
            Command::Save { query } => save_city(&query).await,
            Command::Remove { name } => remove_city(&name),
            Command::Cities => list_cities(),
            Command::Units { system } => units(system),
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Text::new("OpenWeather API key:")
        .with_help_message("Create one at https://home.openweathermap.org/api_keys")
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty.");
    }

    config.api_key = Some(api_key.to_string());
    config.save()?;

    println!("Saved API key to {}", Config::config_file_path()?.display());
    Ok(())
}

fn client() -> Result<OpenWeatherClient> {
    let config = Config::load()?;
    Ok(OpenWeatherClient::new(config.resolve_api_key()?))
}

/// Resolution order: explicit coordinates, then the query (saved cities
/// first, then city search), then the first saved city, then the default.
async fn resolve_place(
    client: &OpenWeatherClient,
    prefs: &Preferences,
    target: &Target,
) -> Result<Place> {
    if let (Some(lat), Some(lon)) = (target.lat, target.lon) {
        let place = match client.reverse_geocode(lat, lon).await {
            Ok(place) => place,
            Err(err) => {
                tracing::warn!("reverse geocoding failed: {err:#}");
                Place { name: "My Location".to_string(), lat, lon }
            }
        };
        return Ok(place);
    }

    if let Some(query) = &target.query {
        if let Some(city) = prefs.find_city(query) {
            return Ok(city.clone());
        }

        let mut matches = client.search_city(query, 1).await?;
        return matches.pop().ok_or_else(|| anyhow!("No city found matching '{query}'."));
    }

    if let Some(city) = prefs.saved_cities.first() {
        return Ok(city.clone());
    }

    let (name, lat, lon) = DEFAULT_CITY;
    Ok(Place { name: name.to_string(), lat, lon })
}

fn resolve_units(prefs: &Preferences, flag: Option<&str>) -> Result<UnitSystem> {
    match flag {
        Some(value) => UnitSystem::try_from(value),
        None => Ok(prefs.units),
    }
}

async fn show_now(target: Target) -> Result<()> {
    let client = client()?;
    let prefs = Preferences::load()?;
    let units = resolve_units(&prefs, target.units.as_deref())?;
    let place = resolve_place(&client, &prefs, &target).await?;

    let current = client.current_weather(place.lat, place.lon, units).await?;
    print_current(&place, &current, units);
    Ok(())
}

async fn show_forecast(target: Target) -> Result<()> {
    let client = client()?;
    let prefs = Preferences::load()?;
    let units = resolve_units(&prefs, target.units.as_deref())?;
    let place = resolve_place(&client, &prefs, &target).await?;

    let days = client.forecast(place.lat, place.lon, units).await?;
    print_forecast(&place, &days, units);
    Ok(())
}

async fn search(query: &str, limit: usize) -> Result<()> {
    let client = client()?;
    let places = client.search_city(query, limit).await?;

    if places.is_empty() {
        println!("No cities found matching '{query}'.");
        return Ok(());
    }

    for place in &places {
        println!("  {}  ({:.4}, {:.4})", place.name, place.lat, place.lon);
    }
    Ok(())
}

async fn save_city(query: &str) -> Result<()> {
    let client = client()?;
    let mut prefs = Preferences::load()?;

    let mut matches = client.search_city(query, 1).await?;
    let place = matches.pop().ok_or_else(|| anyhow!("No city found matching '{query}'."))?;

    if prefs.save_city(place.clone()) {
        prefs.save()?;
        println!("Saved {}.", place.name);
    } else {
        println!("{} is already saved.", place.name);
    }
    Ok(())
}

fn remove_city(name: &str) -> Result<()> {
    let mut prefs = Preferences::load()?;

    let Some(city) = prefs.find_city(name).cloned() else {
        bail!("No saved city named '{name}'.");
    };

    prefs.remove_city(city.lat, city.lon);
    prefs.save()?;
    println!("Removed {}.", city.name);
    Ok(())
}

fn list_cities() -> Result<()> {
    let prefs = Preferences::load()?;

    if prefs.saved_cities.is_empty() {
        println!("No cities saved yet.");
        return Ok(());
    }

    for city in &prefs.saved_cities {
        println!("  {}  ({:.4}, {:.4})", city.name, city.lat, city.lon);
    }
    Ok(())
}

fn units(system: Option<String>) -> Result<()> {
    let mut prefs = Preferences::load()?;

    match system {
        None => println!("{}", prefs.units),
        Some(value) => {
            prefs.units = UnitSystem::try_from(value.as_str())?;
            prefs.save()?;
            println!("Units set to {}.", prefs.units);
        }
    }
    Ok(())
}

fn print_current(place: &Place, current: &CurrentConditions, units: UnitSystem) {
    let observed = current.observed_at.with_timezone(&Local);

    println!("{}", place.name);
    println!("Observed {}", observed.format("%Y-%m-%d %H:%M"));
    println!();
    println!("  {}{}  {}", current.temperature.round(), units.temp_symbol(), current.description);
    println!("  Feels like {}{}", current.feels_like.round(), units.temp_symbol());
    println!("  Humidity   {}%", current.humidity_pct);
    println!("  Pressure   {} hPa", current.pressure_hpa);
    match current.wind_deg {
        Some(deg) => println!(
            "  Wind       {} {} ({})",
            current.wind_speed,
            units.wind_unit(),
            compass_point(deg)
        ),
        None => println!("  Wind       {} {}", current.wind_speed, units.wind_unit()),
    }
}

fn print_forecast(place: &Place, days: &[DailySummary], units: UnitSystem) {
    println!("5-day forecast for {}", place.name);
    for day in days {
        println!(
            "  {:<12} {:>4}{}  {:<24} {}",
            day_label(day),
            day.temperature.round(),
            units.temp_symbol(),
            day.description,
            day.icon,
        );
    }
}

/// Weekday/day/month label in local time, e.g. "Mon, 01 Jan".
fn day_label(day: &DailySummary) -> String {
    match Local.timestamp_millis_opt(day.timestamp_millis).single() {
        Some(dt) => dt.format("%a, %d %b").to_string(),
        None => day.date.clone(),
    }
}

/// 16-point compass label for a wind bearing in degrees.
fn compass_point(deg: u16) -> &'static str {
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];

    let idx = (f64::from(deg) / 22.5 + 0.5).floor() as usize;
    POINTS[idx % 16]
}

//! Core library for the `wxdash` weather dashboard.
//!
//! This crate defines:
//! - The forecast reducer (3-hourly slots down to one summary per day)
//! - The OpenWeather API client (conditions, forecast, geocoding)
//! - Credentials handling and persistent user preferences
//! - Shared domain models
//!
//! It is used by `wxdash-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod forecast;
pub mod model;
pub mod store;

pub use client::{DEFAULT_SEARCH_LIMIT, OpenWeatherClient};
pub use config::Config;
pub use forecast::{FORECAST_HORIZON_DAYS, ReduceError, daily_summaries};
pub use model::{CurrentConditions, DailySummary, ForecastSample, Place, UnitSystem};
pub use store::Preferences;

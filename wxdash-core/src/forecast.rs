//! Reduction of raw 3-hourly forecast slots into daily summaries.
//!
//! The provider returns a flat list of samples, up to 8 per calendar day.
//! The dashboard shows one entry per day, so this module picks the sample
//! nearest local noon for each day, orders the winners chronologically and
//! caps the result at [`FORECAST_HORIZON_DAYS`].

use std::collections::HashMap;

use thiserror::Error;

use crate::model::{DailySummary, ForecastSample};

/// Number of future days a forecast covers.
pub const FORECAST_HORIZON_DAYS: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReduceError {
    /// The slot's local time text did not look like `"YYYY-MM-DD HH:MM:SS"`.
    #[error("forecast slot has malformed local time text: {0:?}")]
    MalformedSlotText(String),
}

/// Collapse raw forecast slots into at most one summary per calendar day.
///
/// The calendar day and hour of each slot come from its `local_time_text`,
/// not from the epoch timestamp: the epoch may carry UTC or a provider
/// offset, while the text is the provider's own rendering of which local day
/// and hour the slot stands for. For each day the sample minimizing
/// `|hour - 12|` wins; on equal distance the sample seen earlier in the
/// input wins, so the result is stable under reorderings that keep
/// equally-good candidates in relative order. Winners are sorted ascending
/// by timestamp and truncated to the earliest [`FORECAST_HORIZON_DAYS`].
///
/// The input may be empty, unordered, and interleaved across days; output
/// length is `min(FORECAST_HORIZON_DAYS, distinct days)`.
pub fn daily_summaries(samples: &[ForecastSample]) -> Result<Vec<DailySummary>, ReduceError> {
    let mut best_by_date: HashMap<String, DailySummary> = HashMap::new();

    for sample in samples {
        let (date, hour) = split_slot_text(&sample.local_time_text)?;

        let replace = match best_by_date.get(date) {
            None => true,
            // Strictly closer only: ties keep the first-seen sample.
            Some(current) => hour.abs_diff(12) < current.hour.abs_diff(12),
        };

        if replace {
            best_by_date.insert(
                date.to_string(),
                DailySummary {
                    date: date.to_string(),
                    hour,
                    timestamp_millis: sample.timestamp * 1000,
                    temperature: sample.temperature,
                    description: sample.description.clone(),
                    icon: sample.icon.clone(),
                },
            );
        }
    }

    // Map iteration order is arbitrary; the explicit sort is what guarantees
    // chronological output.
    let mut days: Vec<DailySummary> = best_by_date.into_values().collect();
    days.sort_by_key(|day| day.timestamp_millis);
    days.truncate(FORECAST_HORIZON_DAYS);

    Ok(days)
}

/// Split `"YYYY-MM-DD HH:MM:SS"` into the date substring and the hour.
fn split_slot_text(text: &str) -> Result<(&str, u8), ReduceError> {
    let malformed = || ReduceError::MalformedSlotText(text.to_string());

    let (date, time) = text.split_once(' ').ok_or_else(malformed)?;
    let hour_text = time.split(':').next().ok_or_else(malformed)?;
    let hour: u8 = hour_text.parse().map_err(|_| malformed())?;

    Ok((date, hour))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp: i64, local_time_text: &str, temperature: f64) -> ForecastSample {
        ForecastSample {
            timestamp,
            local_time_text: local_time_text.to_string(),
            temperature,
            description: "scattered clouds".to_string(),
            icon: "03d".to_string(),
        }
    }

    /// Samples every 3 hours for one day, timestamps counting up from `base`.
    fn full_day(date: &str, base: i64) -> Vec<ForecastSample> {
        (0..8)
            .map(|slot| {
                let hour = slot * 3;
                sample(
                    base + i64::from(hour) * 3600,
                    &format!("{date} {hour:02}:00:00"),
                    20.0 + f64::from(slot),
                )
            })
            .collect()
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let days = daily_summaries(&[]).unwrap();
        assert!(days.is_empty());
    }

    #[test]
    fn noon_slot_wins_a_full_day() {
        let days = daily_summaries(&full_day("2024-01-01", 1_704_067_200)).unwrap();

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, "2024-01-01");
        assert_eq!(days[0].hour, 12);
    }

    #[test]
    fn tie_keeps_first_seen_sample() {
        // 09:00 and 15:00 are both 3 hours from noon.
        let samples = vec![
            sample(1_704_186_000, "2024-01-02 09:00:00", 18.0),
            sample(1_704_207_600, "2024-01-02 15:00:00", 23.0),
        ];

        let days = daily_summaries(&samples).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].hour, 9);

        // Reversed input: now 15:00 is first-seen and must win instead.
        let mut reversed = samples;
        reversed.reverse();

        let days = daily_summaries(&reversed).unwrap();
        assert_eq!(days[0].hour, 15);
    }

    #[test]
    fn sole_sample_represents_its_day() {
        let samples = vec![sample(1_704_153_600, "2024-01-01 23:00:00", 11.0)];

        let days = daily_summaries(&samples).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].hour, 23);
        assert_eq!(days[0].timestamp_millis, 1_704_153_600_000);
    }

    #[test]
    fn six_days_truncate_to_earliest_five() {
        let day_secs = 86_400;
        let mut samples = Vec::new();
        for day in 0..6 {
            samples.extend(full_day(
                &format!("2024-01-{:02}", day + 1),
                1_704_067_200 + i64::from(day) * day_secs,
            ));
        }

        let days = daily_summaries(&samples).unwrap();

        assert_eq!(days.len(), FORECAST_HORIZON_DAYS);
        let dates: Vec<&str> = days.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(
            dates,
            ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05"]
        );
    }

    #[test]
    fn output_is_sorted_even_when_input_is_not() {
        let samples = vec![
            sample(1_704_283_200, "2024-01-03 12:00:00", 7.0),
            sample(1_704_110_400, "2024-01-01 12:00:00", 9.0),
            sample(1_704_196_800, "2024-01-02 12:00:00", 8.0),
        ];

        let days = daily_summaries(&samples).unwrap();

        let millis: Vec<i64> = days.iter().map(|d| d.timestamp_millis).collect();
        assert_eq!(millis, [1_704_110_400_000, 1_704_196_800_000, 1_704_283_200_000]);
    }

    #[test]
    fn one_summary_per_distinct_date() {
        // Two days interleaved, morning and afternoon slots each.
        let samples = vec![
            sample(1_704_099_600, "2024-01-01 09:00:00", 10.0),
            sample(1_704_186_000, "2024-01-02 09:00:00", 12.0),
            sample(1_704_114_000, "2024-01-01 13:00:00", 15.0),
            sample(1_704_200_400, "2024-01-02 13:00:00", 16.0),
        ];

        let days = daily_summaries(&samples).unwrap();

        assert_eq!(days.len(), 2);
        // 13:00 beats 09:00 (distance 1 vs 3) for both days.
        assert!(days.iter().all(|d| d.hour == 13));
    }

    #[test]
    fn chosen_sample_fields_pass_through() {
        let mut chosen = sample(1_704_110_400, "2024-01-01 12:00:00", -3.5);
        chosen.description = "light snow".to_string();
        chosen.icon = "13d".to_string();
        let samples = vec![sample(1_704_099_600, "2024-01-01 09:00:00", 1.0), chosen];

        let days = daily_summaries(&samples).unwrap();

        assert_eq!(days[0].temperature, -3.5);
        assert_eq!(days[0].description, "light snow");
        assert_eq!(days[0].icon, "13d");
    }

    #[test]
    fn missing_separator_is_rejected() {
        let samples = vec![sample(1_704_110_400, "2024-01-01T12:00:00", 5.0)];

        let err = daily_summaries(&samples).unwrap_err();
        assert_eq!(err, ReduceError::MalformedSlotText("2024-01-01T12:00:00".to_string()));
    }

    #[test]
    fn non_numeric_hour_is_rejected() {
        let samples = vec![sample(1_704_110_400, "2024-01-01 noon:00:00", 5.0)];

        let err = daily_summaries(&samples).unwrap_err();
        assert!(matches!(err, ReduceError::MalformedSlotText(_)));
    }
}

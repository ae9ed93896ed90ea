//! Delivery time estimation.
//!
//! A fixed-weight linear surrogate over the same three normalized features the
//! original regression model consumed. Deterministic: same inputs, same output.

const MIN_MINUTES: i64 = 10;
const MAX_MINUTES: i64 = 120;

/// Normalization ceilings for the input features.
const MAX_DISTANCE_KM: f64 = 50.0;
const MAX_TRAFFIC_LEVEL: f64 = 10.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Feature weights. Distance dominates; traffic and time of day nudge.
const DISTANCE_WEIGHT: f64 = 0.80;
const TRAFFIC_WEIGHT: f64 = 0.15;
const HOUR_WEIGHT: f64 = 0.05;

/// Estimate delivery duration in minutes, clamped to [10, 120].
pub fn estimate_minutes(distance_km: f64, traffic_level: u8, hour: u8) -> i64 {
    let distance_norm = (distance_km / MAX_DISTANCE_KM).clamp(0.0, 1.0);
    let traffic_norm = (traffic_level as f64 / MAX_TRAFFIC_LEVEL).clamp(0.0, 1.0);
    let hour_norm = (hour as f64 / HOURS_PER_DAY).clamp(0.0, 1.0);

    let raw = distance_norm * DISTANCE_WEIGHT
        + traffic_norm * TRAFFIC_WEIGHT
        + hour_norm * HOUR_WEIGHT;

    let minutes = (raw * 110.0 + 10.0).round() as i64;
    minutes.clamp(MIN_MINUTES, MAX_MINUTES)
}

/// Traffic signal derived from the hour when no live feed is available:
/// heavy during the commute windows, moderate otherwise.
pub fn traffic_level_for_hour(hour: u8) -> u8 {
    if (7..=9).contains(&hour) || (17..=19).contains(&hour) {
        8
    } else {
        5
    }
}

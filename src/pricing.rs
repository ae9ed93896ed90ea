//! Closed-form delivery pricing from distance, hour of day and a demand signal.

/// Peak surcharge applies 7-9 and 17-19, boundaries inclusive.
const PEAK_MULTIPLIER: f64 = 1.3;
/// Night surcharge applies from 22:00 through 05:00.
const NIGHT_MULTIPLIER: f64 = 1.5;

/// Prices are quoted in whole thousands of currency units.
const ROUNDING_UNIT: f64 = 1000.0;

/// Quote a delivery price in integer currency units.
///
/// `demand` is an externally supplied pressure signal in [0,10]; it adds up to a
/// 50% surcharge. Long trips add 20% per additional 10 km on top of the per-km
/// base rate. The result is rounded to the nearest thousand and never negative.
pub fn quote(distance_km: f64, hour: u8, demand: f64, base_price_per_km: i64) -> i64 {
    let base = distance_km * base_price_per_km as f64;

    let demand_multiplier = 1.0 + (demand.clamp(0.0, 10.0) / 10.0) * 0.5;
    let distance_multiplier = 1.0 + (distance_km / 10.0) * 0.2;

    let adjusted = base * time_multiplier(hour) * demand_multiplier * distance_multiplier;

    let rounded = (adjusted / ROUNDING_UNIT).round() * ROUNDING_UNIT;
    (rounded as i64).max(0)
}

/// Peak wins if a misconfigured clock ever put an hour in both windows.
fn time_multiplier(hour: u8) -> f64 {
    if (7..=9).contains(&hour) || (17..=19).contains(&hour) {
        return PEAK_MULTIPLIER;
    }
    if hour >= 22 || hour <= 5 {
        return NIGHT_MULTIPLIER;
    }
    1.0
}

//! Synthetic plant-environment curves, keyed by the fraction of a
//! simulated day.

const MAX_SUNLIGHT_LUX: f64 = 12000.0;
const MAX_MOONLIGHT_LUX: f64 = 5.0;

const SUNRISE: f64 = 0.25;
const SUNSET: f64 = 0.75;

const NIGHT_SOIL_TEMP_C: f64 = 16.0;
const DAY_TEMP_SWING_C: f64 = 7.0;

// Capacitive probe counts: lower = wetter. The bed dries until the next
// simulated watering resets it.
const WET_COUNTS: f64 = 1400.0;
const DRY_COUNTS: f64 = 2900.0;
const CYCLES_PER_WATERING: u32 = 60;

pub fn sunlight_lux(day_fraction: f64) -> f64 {
    if (SUNRISE..=SUNSET).contains(&day_fraction) {
        // Half-sine daylight arc between sunrise and sunset.
        let arc = (day_fraction - SUNRISE) / (SUNSET - SUNRISE) * std::f64::consts::PI;
        (arc.sin() * MAX_SUNLIGHT_LUX).max(MAX_MOONLIGHT_LUX)
    } else {
        MAX_MOONLIGHT_LUX
    }
}

pub fn soil_temperature(day_fraction: f64) -> f64 {
    // Soil lags air: coolest just before sunrise, warmest mid-afternoon.
    let phase = (day_fraction - 0.3) * 2.0 * std::f64::consts::PI;
    NIGHT_SOIL_TEMP_C + DAY_TEMP_SWING_C * phase.sin().max(0.0)
}

pub fn moisture_counts(cycle_index: u32) -> u16 {
    let progress = f64::from(cycle_index % CYCLES_PER_WATERING) / f64::from(CYCLES_PER_WATERING);
    (WET_COUNTS + (DRY_COUNTS - WET_COUNTS) * progress) as u16
}

// src/engine/ability.rs

use serde::{Deserialize, Serialize};

/// Theta anchor for each ordinal difficulty level, lowest level first.
const DIFFICULTY_THETA: [f64; 5] = [-2.0, -1.0, 0.0, 1.0, 2.0];

/// Coarse performance band derived from an ability estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
    FarBelow,
    Below,
    OnLevel,
    Above,
}

impl PerformanceLevel {
    pub fn label(&self) -> &'static str {
        match self {
            PerformanceLevel::FarBelow => "far below",
            PerformanceLevel::Below => "below",
            PerformanceLevel::OnLevel => "on level",
            PerformanceLevel::Above => "above",
        }
    }
}

/// Maps a difficulty level (1..=5) onto the theta scale.
///
/// Levels outside the supported range fall back to the medium anchor (0.0).
pub fn difficulty_to_theta(level: u8) -> f64 {
    match level {
        1..=5 => DIFFICULTY_THETA[usize::from(level - 1)],
        _ => 0.0,
    }
}

/// Buckets a theta value into one of four bands.
/// Each threshold belongs to the higher band.
pub fn theta_to_performance_level(theta: f64) -> PerformanceLevel {
    if theta < -1.0 {
        PerformanceLevel::FarBelow
    } else if theta < 0.0 {
        PerformanceLevel::Below
    } else if theta < 1.0 {
        PerformanceLevel::OnLevel
    } else {
        PerformanceLevel::Above
    }
}

/// Converts theta to a population percentile using the standard normal CDF.
/// Result is rounded and clamped to 1..=99.
pub fn ability_to_percentile(theta: f64) -> u8 {
    let percentile = 50.0 + 50.0 * erf(theta / std::f64::consts::SQRT_2);
    percentile.round().clamp(1.0, 99.0) as u8
}

/// Abramowitz–Stegun 7.1.26 approximation of the error function.
/// Max absolute error is around 1.5e-7.
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    let y = 1.0 - poly * (-x * x).exp();

    sign * y
}

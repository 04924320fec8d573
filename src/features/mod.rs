//! Hospital feature encoding.
//!
//! Turns a hospital's structural profile and one reporting period's
//! operational numbers into the fixed-length feature vector every model
//! in the crate trains and predicts on. Encoding is a pure function;
//! callers supply sane defaults (0) for absent numeric fields.

use serde::{Deserialize, Serialize};

/// Canonical feature names, in feature-vector order.
///
/// The registry validates persisted artifacts against this list, so the
/// order is part of the on-disk contract.
pub const FEATURE_NAMES: [&str; 10] = [
    "beds",
    "rating",
    "patient_volume",
    "response_rate",
    "teaching_status",
    "urban_rural",
    "region_encoded",
    "beds_per_volume",
    "volume_per_bed",
    "rating_squared",
];

/// Length of the feature vector.
pub const N_FEATURES: usize = FEATURE_NAMES.len();

/// US census region of a hospital, plus a catch-all for anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    West,
    Midwest,
    South,
    Northeast,
    Other,
}

impl Region {
    /// Parses a region name. Unrecognized names map to `Other` rather
    /// than failing.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "West" => Region::West,
            "Midwest" => Region::Midwest,
            "South" => Region::South,
            "Northeast" => Region::Northeast,
            _ => Region::Other,
        }
    }

    /// Fixed ordinal code used in the feature vector.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Region::West => 0,
            Region::Midwest => 1,
            Region::South => 2,
            Region::Northeast => 3,
            Region::Other => 4,
        }
    }
}

/// Structural attributes of a hospital that change rarely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalProfile {
    /// Licensed bed count.
    pub beds: f32,
    /// Overall star rating on a bounded scale.
    pub rating: f32,
    /// Whether the hospital is a teaching hospital.
    pub teaching: bool,
    /// Urban (true) or rural (false) location.
    pub urban: bool,
    /// Census region.
    pub region: Region,
}

/// Operational numbers for one reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    /// Patients served during the period.
    pub patient_volume: f32,
    /// Survey response rate, in percent.
    pub response_rate: f32,
}

/// Encodes a hospital and period into the canonical feature vector.
///
/// Derived ratios floor their denominator at 1 instead of skipping the
/// feature, so zero-bed or zero-volume records still encode.
///
/// # Examples
///
/// ```
/// use pulso::features::{build_features, HospitalProfile, PeriodStats, Region, N_FEATURES};
///
/// let profile = HospitalProfile {
///     beds: 250.0,
///     rating: 4.0,
///     teaching: true,
///     urban: true,
///     region: Region::West,
/// };
/// let period = PeriodStats { patient_volume: 5_000.0, response_rate: 28.5 };
///
/// let features = build_features(&profile, &period);
/// assert_eq!(features.len(), N_FEATURES);
/// assert!((features[9] - 16.0).abs() < 1e-6); // rating squared
/// ```
#[must_use]
pub fn build_features(profile: &HospitalProfile, period: &PeriodStats) -> [f32; N_FEATURES] {
    let beds_per_volume = profile.beds / period.patient_volume.max(1.0);
    let volume_per_bed = period.patient_volume / profile.beds.max(1.0);

    [
        profile.beds,
        profile.rating,
        period.patient_volume,
        period.response_rate,
        if profile.teaching { 1.0 } else { 0.0 },
        if profile.urban { 1.0 } else { 0.0 },
        f32::from(profile.region.code()),
        beds_per_volume,
        volume_per_bed,
        profile.rating * profile.rating,
    ]
}

/// Renders one feature as a human-readable factor description.
///
/// Value-bearing features interpolate the input vector's value at that
/// feature's index; derived features get a fixed label. Unknown feature
/// names fall back to the raw name.
#[must_use]
pub fn describe_factor(feature: &str, value: f32) -> String {
    match feature {
        "beds" => format!("Hospital size ({value:.0} beds)"),
        "rating" => format!("Overall rating ({value:.1}/5)"),
        "patient_volume" => format!("Patient volume ({})", with_thousands(value)),
        "response_rate" => format!("Survey response rate ({value:.1}%)"),
        "teaching_status" => {
            if value == 1.0 {
                "Teaching hospital".to_string()
            } else {
                "Non-teaching hospital".to_string()
            }
        }
        "urban_rural" => {
            if value == 1.0 {
                "Urban location".to_string()
            } else {
                "Rural location".to_string()
            }
        }
        "region_encoded" => "Geographic region".to_string(),
        "beds_per_volume" => "Bed utilization ratio".to_string(),
        "volume_per_bed" => "Patient volume per bed".to_string(),
        "rating_squared" => "Rating performance".to_string(),
        other => other.to_string(),
    }
}

/// Formats a value rounded to an integer with `,` thousands separators.
fn with_thousands(value: f32) -> String {
    let negative = value < 0.0;
    let digits = format!("{:.0}", value.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

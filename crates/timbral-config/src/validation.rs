//! Profile validation.
//!
//! Checks every field of an [`AnalysisProfile`] and collects all problems
//! instead of stopping at the first, so a user fixing a profile sees the full
//! list at once.
//!
//! # Example
//!
//! ```rust
//! use timbral_config::{AnalysisProfile, validate_profile};
//! use timbral_registry::FeatureRegistry;
//!
//! let registry = FeatureRegistry::new();
//! let profile = AnalysisProfile::new("Ok").with_features(["f0", "mfcc"]);
//! validate_profile(&profile, &registry).expect("profile should be valid");
//! ```

use thiserror::Error;
use timbral_analysis::{FilterbankShift, Window};
use timbral_registry::FeatureRegistry;

use crate::AnalysisProfile;

/// Largest accepted frame size.
pub const MAX_FRAME_SIZE: usize = 1 << 20;

/// Largest accepted wavelet decimation depth.
pub const MAX_WAVELET_LEVELS: usize = 16;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Feature name not in the registry.
    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    /// Numeric field out of range.
    #[error("'{field}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Dotted path of the field.
        field: String,
        /// The value that was out of range.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Field with an unusable value that is not a plain range problem.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Dotted path of the field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Check `value` against an inclusive range.
pub fn check_range(field: &str, value: f64, min: f64, max: f64) -> ValidationResult<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        })
    }
}

/// Check that a feature name resolves in the registry.
pub fn validate_feature(name: &str, registry: &FeatureRegistry) -> ValidationResult<()> {
    if registry.by_name(name).is_some() {
        Ok(())
    } else {
        Err(ValidationError::UnknownFeature(name.to_string()))
    }
}

/// Validate a complete profile.
pub fn validate_profile(
    profile: &AnalysisProfile,
    registry: &FeatureRegistry,
) -> ValidationResult<()> {
    let mut errors = Vec::new();
    let mut push = |result: ValidationResult<()>| {
        if let Err(e) = result {
            errors.push(e);
        }
    };

    if profile.name.trim().is_empty() {
        push(Err(ValidationError::InvalidValue {
            field: "name".to_string(),
            reason: "must not be empty".to_string(),
        }));
    }

    if let Some(rate) = profile.sample_rate {
        push(check_range("sample_rate", f64::from(rate), 1.0, f64::from(u32::MAX)));
    }

    push(check_range(
        "frame_size",
        profile.frame_size as f64,
        2.0,
        MAX_FRAME_SIZE as f64,
    ));
    push(check_range(
        "hop_size",
        profile.hop_size as f64,
        1.0,
        MAX_FRAME_SIZE as f64,
    ));

    for name in &profile.features {
        push(validate_feature(name, registry));
    }

    if Window::from_name(&profile.spectrum.window).is_none() {
        let known: Vec<&str> = Window::ALL.iter().map(|w| w.name()).collect();
        push(Err(ValidationError::InvalidValue {
            field: "spectrum.window".to_string(),
            reason: format!(
                "unknown window '{}' (expected one of: {})",
                profile.spectrum.window,
                known.join(", ")
            ),
        }));
    }
    push(check_range(
        "spectrum.rolloff_percent",
        f64::from(profile.spectrum.rolloff_percent),
        0.0,
        100.0,
    ));

    push(check_range(
        "peaks.threshold_percent",
        f64::from(profile.peaks.threshold_percent),
        0.0,
        100.0,
    ));
    push(check_range(
        "harmonics.tolerance",
        f64::from(profile.harmonics.tolerance),
        0.0,
        0.5,
    ));

    let nyquist = profile
        .sample_rate
        .map_or(f64::from(u32::MAX), |sr| f64::from(sr) / 2.0);
    push(check_range(
        "pitch.max_frequency",
        f64::from(profile.pitch.max_frequency),
        f64::MIN_POSITIVE,
        nyquist,
    ));
    push(check_range(
        "pitch.max_levels",
        profile.pitch.max_levels as f64,
        1.0,
        MAX_WAVELET_LEVELS as f64,
    ));
    push(check_range(
        "pitch.difference_levels",
        profile.pitch.difference_levels as f64,
        1.0,
        profile.frame_size.max(1) as f64,
    ));
    push(check_range(
        "pitch.threshold_ratio",
        f64::from(profile.pitch.threshold_ratio),
        0.0,
        1.0,
    ));
    push(check_range(
        "pitch.yin_threshold",
        f64::from(profile.pitch.yin_threshold),
        0.0,
        1.0,
    ));
    if let Some(f0) = profile.pitch.f0 {
        push(check_range("pitch.f0", f64::from(f0), f64::MIN_POSITIVE, nyquist));
    }

    if FilterbankShift::from_name(&profile.pitch.filterbank_shift).is_none() {
        let known: Vec<&str> = FilterbankShift::ALL.iter().map(|s| s.name()).collect();
        push(Err(ValidationError::InvalidValue {
            field: "pitch.filterbank_shift".to_string(),
            reason: format!(
                "unknown shift '{}' (expected one of: {})",
                profile.pitch.filterbank_shift,
                known.join(", ")
            ),
        }));
    }
    push(check_range(
        "pitch.midi_low",
        f64::from(profile.pitch.midi_low),
        1.0,
        120.0,
    ));
    push(check_range(
        "pitch.midi_high",
        f64::from(profile.pitch.midi_high),
        f64::from(profile.pitch.midi_low),
        120.0,
    ));

    let max_order = profile.frame_size.saturating_sub(1).max(1) as f64;
    push(check_range("lpc.order", profile.lpc.order as f64, 1.0, max_order));
    if let Some(order) = profile.lpc.cepstral_order {
        push(check_range(
            "lpc.cepstral_order",
            order as f64,
            1.0,
            MAX_FRAME_SIZE as f64,
        ));
    }

    push(check_range(
        "resample.filter_order",
        profile.resample.filter_order as f64,
        2.0,
        MAX_FRAME_SIZE as f64,
    ));

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.swap_remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

//! Built-in analysis profiles.
//!
//! Embedded at compile time, always available, and resolvable by name from
//! the command line alongside user profile files.

use crate::{AnalysisProfile, ConfigError, paths};

/// Internal names of the factory profiles.
pub static FACTORY_PROFILE_NAMES: &[&str] = &["default", "timbre", "speech", "pitch"];

static FACTORY_PROFILES_TOML: &[(&str, &str)] = &[
    ("default", DEFAULT_PROFILE),
    ("timbre", TIMBRE_PROFILE),
    ("speech", SPEECH_PROFILE),
    ("pitch", PITCH_PROFILE),
];

const DEFAULT_PROFILE: &str = r#"
name = "Default"
description = "Core spectral shape and pitch at the input sample rate"
frame_size = 2048
hop_size = 1024
features = [
    "spectral_centroid",
    "spectral_spread",
    "spectral_flatness",
    "spectral_rolloff",
    "f0",
]
"#;

const TIMBRE_PROFILE: &str = r#"
name = "Timbre"
description = "Harmonic and spectral-shape descriptors for instrument tones"
frame_size = 4096
hop_size = 2048
features = [
    "spectral_centroid",
    "spectral_spread",
    "spectral_slope",
    "irregularity_k",
    "smoothness",
    "tonality",
    "tristimulus",
    "odd_even_ratio",
    "inharmonicity",
    "noisiness",
]

[spectrum]
window = "blackman-harris"

[peaks]
threshold_percent = 5.0

[harmonics]
tolerance = 0.05
"#;

const SPEECH_PROFILE: &str = r#"
name = "Speech"
description = "Voice analysis at 16 kHz with linear prediction"
sample_rate = 16000
frame_size = 512
hop_size = 160
features = ["yin_pitch", "spectral_centroid", "lpc", "lpcc"]

[spectrum]
window = "hamming"

[pitch]
max_frequency = 1000.0
yin_threshold = 0.15

[lpc]
order = 16
cepstral_order = 20
"#;

const PITCH_PROFILE: &str = r#"
name = "Pitch"
description = "Compare pitch estimators frame by frame"
frame_size = 2048
hop_size = 512
features = ["f0", "yin_pitch", "wavelet_pitch", "hps_pitch", "midicent", "pitch_class_profile"]

[spectrum]
window = "hann"
"#;

/// All factory profiles, in declaration order.
pub fn factory_profiles() -> Vec<AnalysisProfile> {
    FACTORY_PROFILES_TOML
        .iter()
        .filter_map(|(_, toml)| AnalysisProfile::from_toml(toml).ok())
        .collect()
}

/// Factory profile by internal or display name, case-insensitive.
pub fn get_factory_profile(name: &str) -> Option<AnalysisProfile> {
    let name_lower = name.to_lowercase();

    if let Some((_, toml)) = FACTORY_PROFILES_TOML
        .iter()
        .find(|(id, _)| id.to_lowercase() == name_lower)
    {
        return AnalysisProfile::from_toml(toml).ok();
    }

    factory_profiles()
        .into_iter()
        .find(|profile| profile.name.to_lowercase() == name_lower)
}

/// Whether `name` matches a factory profile.
pub fn is_factory_profile(name: &str) -> bool {
    get_factory_profile(name).is_some()
}

/// Resolve a profile argument: a factory profile name, then a file found via
/// [`paths::find_profile`].
///
/// # Errors
///
/// [`ConfigError::ProfileNotFound`] when nothing matches, or the load error
/// of a matching file.
pub fn resolve_profile(name: &str) -> Result<AnalysisProfile, ConfigError> {
    if let Some(profile) = get_factory_profile(name) {
        return Ok(profile);
    }
    match paths::find_profile(name) {
        Some(path) => AnalysisProfile::load(path),
        None => Err(ConfigError::ProfileNotFound(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timbral_registry::FeatureRegistry;

    #[test]
    fn test_all_factory_profiles_parse_and_validate() {
        let registry = FeatureRegistry::new();
        for (name, toml) in FACTORY_PROFILES_TOML {
            let profile = AnalysisProfile::from_toml(toml)
                .unwrap_or_else(|e| panic!("factory profile '{name}' should parse: {e}"));
            assert!(profile.description.is_some(), "'{name}' needs a description");
            assert!(!profile.features.is_empty(), "'{name}' selects no features");
            if let Err(e) = profile.validate(&registry) {
                panic!("factory profile '{name}' invalid: {e}");
            }
        }
        assert_eq!(factory_profiles().len(), FACTORY_PROFILE_NAMES.len());
    }

    #[test]
    fn test_get_factory_profile() {
        assert_eq!(get_factory_profile("speech").unwrap().name, "Speech");
        assert_eq!(get_factory_profile("TIMBRE").unwrap().name, "Timbre");
        assert!(get_factory_profile("nonexistent").is_none());
    }

    #[test]
    fn test_speech_profile_settings() {
        let speech = get_factory_profile("speech").unwrap();
        assert_eq!(speech.sample_rate, Some(16000));
        assert_eq!(speech.lpc.order, 16);
        assert_eq!(speech.lpc.cepstral_order, Some(20));
        assert_eq!(speech.window(), timbral_analysis::Window::Hamming);
    }

    #[test]
    fn test_is_factory_profile() {
        assert!(is_factory_profile("default"));
        assert!(is_factory_profile("Pitch"));
        assert!(!is_factory_profile("my_profile"));
    }

    #[test]
    fn test_resolve_profile_not_found() {
        assert!(matches!(
            resolve_profile("no_such_profile_98765"),
            Err(ConfigError::ProfileNotFound(name)) if name == "no_such_profile_98765"
        ));
    }
}

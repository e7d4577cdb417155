//! Analysis profile file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use timbral_analysis::{
    FilterbankShift, PitchEnergyOptions, ResampleConfig, SpectrumOptions, WaveletPitchConfig,
    Window,
};
use timbral_registry::{FeatureId, FeatureRegistry, FrameContext};

use crate::error::ConfigError;
use crate::validation::{ValidationResult, validate_profile};

/// Spectrum layout and the descriptors computed straight from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpectrumSection {
    /// Keep the DC bin in the shared spectrum.
    pub include_dc: bool,
    /// Scale amplitudes so the largest is 1.
    pub normalize: bool,
    /// Analysis window applied to every frame (see `Window::from_name`).
    pub window: String,
    /// Percentage for spectral rolloff.
    pub rolloff_percent: f32,
}

impl Default for SpectrumSection {
    fn default() -> Self {
        Self {
            include_dc: false,
            normalize: false,
            window: Window::Rectangular.name().to_string(),
            rolloff_percent: timbral_registry::context::DEFAULT_ROLLOFF_PERCENT,
        }
    }
}

/// Peak picking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PeakSection {
    /// Relative threshold in percent of the largest amplitude.
    pub threshold_percent: f32,
}

impl Default for PeakSection {
    fn default() -> Self {
        Self {
            threshold_percent: timbral_registry::context::DEFAULT_PEAK_THRESHOLD,
        }
    }
}

/// Harmonic filtering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HarmonicSection {
    /// Largest distance from an integer harmonic number, as a fraction.
    pub tolerance: f32,
}

impl Default for HarmonicSection {
    fn default() -> Self {
        Self {
            tolerance: timbral_registry::context::DEFAULT_HARMONIC_TOLERANCE,
        }
    }
}

/// Pitch estimation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PitchSection {
    /// Highest expected pitch for the wavelet tracker, in Hz.
    pub max_frequency: f32,
    /// Maximum wavelet decimation levels.
    pub max_levels: usize,
    /// Extrema pairing distance for the wavelet tracker.
    pub difference_levels: usize,
    /// Extrema threshold as a fraction of peak amplitude.
    pub threshold_ratio: f32,
    /// YIN absolute threshold.
    pub yin_threshold: f32,
    /// Fixed fundamental for harmonic descriptors instead of estimating one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f0: Option<f32>,
    /// Detuned bank read by `pitch_energy` (see `FilterbankShift::from_name`).
    pub filterbank_shift: String,
    /// Lowest MIDI pitch for `pitch_energy`.
    pub midi_low: u8,
    /// Highest MIDI pitch for `pitch_energy`.
    pub midi_high: u8,
}

impl Default for PitchSection {
    fn default() -> Self {
        let wavelet = WaveletPitchConfig::default();
        let energy = PitchEnergyOptions::default();
        Self {
            max_frequency: wavelet.max_frequency,
            max_levels: wavelet.max_levels,
            difference_levels: wavelet.difference_levels,
            threshold_ratio: wavelet.threshold_ratio,
            yin_threshold: timbral_registry::context::DEFAULT_YIN_THRESHOLD,
            f0: None,
            filterbank_shift: energy.shift.name().to_string(),
            midi_low: energy.midi_low,
            midi_high: energy.midi_high,
        }
    }
}

/// Linear prediction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LpcSection {
    /// Prediction order.
    pub order: usize,
    /// Cepstral order; the prediction order when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cepstral_order: Option<usize>,
}

impl Default for LpcSection {
    fn default() -> Self {
        Self {
            order: timbral_registry::context::DEFAULT_LPC_ORDER,
            cepstral_order: None,
        }
    }
}

/// Sample-rate conversion ahead of analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResampleSection {
    /// Lowpass filter order.
    pub filter_order: usize,
}

impl Default for ResampleSection {
    fn default() -> Self {
        Self {
            filter_order: ResampleConfig::default().filter_order,
        }
    }
}

/// Analysis profile: framing, feature selection, and per-stage parameters.
///
/// # TOML Format
///
/// ```toml
/// name = "Speech"
/// description = "Voice analysis at 16 kHz"
/// sample_rate = 16000
/// frame_size = 512
/// hop_size = 256
/// features = ["f0", "spectral_centroid", "lpcc"]
///
/// [spectrum]
/// window = "hann"
///
/// [lpc]
/// order = 16
/// cepstral_order = 20
/// ```
///
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisProfile {
    /// Name of the profile.
    pub name: String,

    /// Optional description of the profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Rate to convert input to before analysis. Input is analyzed at its own
    /// rate when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,

    /// Samples per analysis frame.
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,

    /// Samples between frame starts.
    #[serde(default = "default_hop_size")]
    pub hop_size: usize,

    /// Feature names to extract.
    #[serde(default)]
    pub features: Vec<String>,

    /// Spectrum settings.
    #[serde(default)]
    pub spectrum: SpectrumSection,

    /// Peak picking settings.
    #[serde(default)]
    pub peaks: PeakSection,

    /// Harmonic filtering settings.
    #[serde(default)]
    pub harmonics: HarmonicSection,

    /// Pitch settings.
    #[serde(default)]
    pub pitch: PitchSection,

    /// Linear prediction settings.
    #[serde(default)]
    pub lpc: LpcSection,

    /// Resampling settings.
    #[serde(default)]
    pub resample: ResampleSection,
}

fn default_frame_size() -> usize {
    2048
}

fn default_hop_size() -> usize {
    1024
}

impl AnalysisProfile {
    /// Create a profile with default settings and no features.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            sample_rate: None,
            frame_size: default_frame_size(),
            hop_size: default_hop_size(),
            features: Vec::new(),
            spectrum: SpectrumSection::default(),
            peaks: PeakSection::default(),
            harmonics: HarmonicSection::default(),
            pitch: PitchSection::default(),
            lpc: LpcSection::default(),
            resample: ResampleSection::default(),
        }
    }

    /// Create a profile with a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set frame and hop sizes.
    pub fn with_framing(mut self, frame_size: usize, hop_size: usize) -> Self {
        self.frame_size = frame_size;
        self.hop_size = hop_size;
        self
    }

    /// Add features by name.
    pub fn with_features<S: Into<String>>(mut self, features: impl IntoIterator<Item = S>) -> Self {
        self.features.extend(features.into_iter().map(Into::into));
        self
    }

    /// Load a profile from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let profile: AnalysisProfile = toml::from_str(&content)?;
        Ok(profile)
    }

    /// Load a profile from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the profile to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the profile to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check ranges and feature names against the registry.
    pub fn validate(&self, registry: &FeatureRegistry) -> ValidationResult<()> {
        validate_profile(self, registry)
    }

    /// Resolve the feature list to registry ids.
    pub fn feature_ids(&self, registry: &FeatureRegistry) -> Result<Vec<FeatureId>, ConfigError> {
        self.features
            .iter()
            .map(|name| {
                registry
                    .by_name(name)
                    .map(|d| d.id)
                    .ok_or_else(|| ConfigError::UnknownFeature(name.clone()))
            })
            .collect()
    }

    /// Analysis window. Unknown names fall back to rectangular; `validate`
    /// reports them.
    pub fn window(&self) -> Window {
        Window::from_name(&self.spectrum.window).unwrap_or_default()
    }

    /// Spectrum options for the shared spectrum feature.
    pub fn spectrum_options(&self) -> SpectrumOptions {
        SpectrumOptions {
            include_dc: self.spectrum.include_dc,
            normalize: self.spectrum.normalize,
        }
    }

    /// Wavelet tracker tuning.
    pub fn wavelet_config(&self) -> WaveletPitchConfig {
        WaveletPitchConfig {
            max_levels: self.pitch.max_levels,
            max_frequency: self.pitch.max_frequency,
            difference_levels: self.pitch.difference_levels,
            threshold_ratio: self.pitch.threshold_ratio,
        }
    }

    /// Pitch filterbank energy settings. An unknown shift falls back to
    /// `normal`; `validate` reports it.
    pub fn pitch_energy_options(&self) -> PitchEnergyOptions {
        PitchEnergyOptions {
            shift: FilterbankShift::from_name(&self.pitch.filterbank_shift).unwrap_or_default(),
            midi_low: self.pitch.midi_low,
            midi_high: self.pitch.midi_high,
            window_len: None,
            filter_order: self.resample.filter_order,
        }
    }

    /// Resampler settings.
    pub fn resample_config(&self) -> ResampleConfig {
        ResampleConfig {
            filter_order: self.resample.filter_order,
        }
    }

    /// Frame context for extraction at `sample_rate`, without injected tables.
    pub fn frame_context(&self, sample_rate: f32) -> FrameContext<'static> {
        let mut context = FrameContext::new(sample_rate);
        context.spectrum = self.spectrum_options();
        context.window = self.window();
        context.peak_threshold = self.peaks.threshold_percent;
        context.harmonic_tolerance = self.harmonics.tolerance;
        context.rolloff_percent = self.spectrum.rolloff_percent;
        context.f0 = self.pitch.f0;
        context.yin_threshold = self.pitch.yin_threshold;
        context.wavelet = self.wavelet_config();
        context.lpc_order = self.lpc.order;
        context.cepstral_order = self.lpc.cepstral_order;
        context.pitch_energy = self.pitch_energy_options();
        context
    }
}

impl Default for AnalysisProfile {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_new() {
        let profile = AnalysisProfile::new("Test");
        assert_eq!(profile.name, "Test");
        assert!(profile.description.is_none());
        assert_eq!(profile.frame_size, 2048);
        assert_eq!(profile.hop_size, 1024);
        assert!(profile.features.is_empty());
        assert_eq!(profile.window(), Window::Rectangular);
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let profile = AnalysisProfile::from_toml("name = \"Bare\"").unwrap();
        assert_eq!(profile, AnalysisProfile::new("Bare"));
    }

    #[test]
    fn test_sections_parse() {
        let toml = r#"
name = "Speech"
sample_rate = 16000
frame_size = 512
hop_size = 256
features = ["f0", "lpcc"]

[spectrum]
window = "hann"
normalize = true

[pitch]
f0 = 120.0
max_frequency = 800.0
filterbank_shift = "minus_half"
midi_low = 40

[lpc]
order = 16
cepstral_order = 20
"#;
        let profile = AnalysisProfile::from_toml(toml).unwrap();
        assert_eq!(profile.sample_rate, Some(16000));
        assert_eq!(profile.features, vec!["f0", "lpcc"]);
        assert_eq!(profile.window(), Window::Hann);
        assert!(profile.spectrum.normalize);
        assert!(!profile.spectrum.include_dc);
        assert_eq!(profile.pitch.f0, Some(120.0));
        assert_eq!(profile.pitch.max_levels, 6);
        let energy = profile.pitch_energy_options();
        assert_eq!(energy.shift, FilterbankShift::MinusHalf);
        assert_eq!((energy.midi_low, energy.midi_high), (40, 108));
        assert_eq!(profile.lpc.cepstral_order, Some(20));
        assert_eq!(profile.resample.filter_order, 512);
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut profile = AnalysisProfile::new("Roundtrip")
            .with_description("round trip")
            .with_framing(1024, 512)
            .with_features(["spectral_centroid", "mfcc"]);
        profile.pitch.f0 = Some(220.0);
        profile.lpc.cepstral_order = Some(8);

        let toml = profile.to_toml().unwrap();
        let parsed = AnalysisProfile::from_toml(&toml).unwrap();
        assert_eq!(profile, parsed);
    }

    #[test]
    fn test_frame_context_carries_sections() {
        let mut profile = AnalysisProfile::new("Context");
        profile.peaks.threshold_percent = 3.0;
        profile.harmonics.tolerance = 0.05;
        profile.pitch.f0 = Some(100.0);
        profile.lpc.order = 20;
        profile.resample.filter_order = 256;

        let context = profile.frame_context(22050.0);
        assert_eq!(context.sample_rate, 22050.0);
        assert_eq!(context.peak_threshold, 3.0);
        assert_eq!(context.harmonic_tolerance, 0.05);
        assert_eq!(context.f0, Some(100.0));
        assert_eq!(context.lpc_order, 20);
        assert_eq!(context.wavelet, WaveletPitchConfig::default());
        assert_eq!(context.window, Window::Rectangular);
        assert!(context.filterbank.is_none());
        assert!(context.pitch_filterbank.is_none());
        assert_eq!(context.pitch_energy.filter_order, 256);
        assert_eq!(context.pitch_energy.shift, FilterbankShift::Normal);
    }

    #[test]
    fn test_feature_ids() {
        let registry = FeatureRegistry::new();
        let profile = AnalysisProfile::new("Ids").with_features(["f0", "Spectral-Centroid"]);
        assert_eq!(
            profile.feature_ids(&registry).unwrap(),
            vec![FeatureId::F0, FeatureId::SpectralCentroid]
        );

        let profile = AnalysisProfile::new("Bad").with_features(["chroma"]);
        assert!(matches!(
            profile.feature_ids(&registry),
            Err(ConfigError::UnknownFeature(name)) if name == "chroma"
        ));
    }
}

//! Feature registry and dependency-resolving extractor for timbral descriptors.
//!
//! This crate maps every descriptor in `timbral-analysis` to a typed
//! capability with an explicit argument list. An [`Extractor`] resolves the
//! inputs of the requested features once, in dependency order, and then runs
//! that plan over as many frames as the caller feeds it.
//!
//! # Features
//!
//! - **Feature Discovery**: List all available features with metadata
//! - **Lookup by Name**: Resolve features from configuration strings
//! - **Category System**: Features grouped by kind (spectral, pitch, etc.)
//! - **Static Plans**: Inputs resolved up front, cycles rejected before any frame runs
//!
//! # Example
//!
//! ```rust
//! use timbral_registry::{Extractor, FeatureId, FeatureRegistry, FrameContext};
//!
//! let registry = FeatureRegistry::new();
//! let mut extractor = Extractor::new(&registry, &[FeatureId::SpectralCentroid]).unwrap();
//!
//! let sr = 8000.0;
//! let frame: Vec<f32> = (0..256)
//!     .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / sr).sin())
//!     .collect();
//!
//! let features = extractor.process(&frame, &FrameContext::new(sr)).unwrap();
//! let centroid = features.scalar(FeatureId::SpectralCentroid).unwrap();
//! assert!((centroid - 1000.0).abs() < 1.0);
//! ```

mod builtin;
pub mod context;
pub mod error;
pub mod extractor;

pub use context::FrameContext;
pub use error::{ExtractError, Result};
pub use extractor::{Capability, Extractor, FeatureArgs, FeatureSet};

use timbral_analysis::Spectrum;

/// Kind of descriptor, for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureCategory {
    /// Spectra and descriptors of spectral shape
    Spectral,
    /// Descriptors over harmonic peaks relative to a fundamental
    Harmonic,
    /// Fundamental frequency estimates
    Pitch,
    /// Time-domain lag functions
    Temporal,
    /// Linear prediction and cepstral coefficients
    Cepstral,
}

impl FeatureCategory {
    /// All categories in display order.
    pub const ALL: [FeatureCategory; 5] = [
        FeatureCategory::Spectral,
        FeatureCategory::Harmonic,
        FeatureCategory::Pitch,
        FeatureCategory::Temporal,
        FeatureCategory::Cepstral,
    ];

    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            FeatureCategory::Spectral => "Spectral",
            FeatureCategory::Harmonic => "Harmonic",
            FeatureCategory::Pitch => "Pitch",
            FeatureCategory::Temporal => "Temporal",
            FeatureCategory::Cepstral => "Cepstral",
        }
    }

    /// Returns a description of the category.
    pub const fn description(&self) -> &'static str {
        match self {
            FeatureCategory::Spectral => "Amplitude spectra and measures of their shape",
            FeatureCategory::Harmonic => "Harmonic peak structure relative to the fundamental",
            FeatureCategory::Pitch => "Fundamental frequency estimators",
            FeatureCategory::Temporal => "Lag-domain similarity functions of the raw frame",
            FeatureCategory::Cepstral => "Linear prediction and LPC cepstrum",
        }
    }
}

macro_rules! feature_ids {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Identifier of a registered feature.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum FeatureId {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl FeatureId {
            /// Every feature id, in declaration order.
            pub const ALL: &'static [FeatureId] = &[$(FeatureId::$variant),+];

            /// Stable lowercase name used in configuration and output.
            pub const fn name(&self) -> &'static str {
                match self {
                    $(FeatureId::$variant => $name,)+
                }
            }

            /// Look up an id by name. Case-insensitive; `-` is accepted for `_`.
            pub fn from_name(name: &str) -> Option<Self> {
                let name = name.trim().to_ascii_lowercase().replace('-', "_");
                Self::ALL.iter().copied().find(|id| id.name() == name)
            }
        }
    };
}

feature_ids! {
    Spectrum => "spectrum",
    PeakSpectrum => "peak_spectrum",
    HarmonicSpectrum => "harmonic_spectrum",
    SpectralCentroid => "spectral_centroid",
    SpectralSpread => "spectral_spread",
    SpectralFlatness => "spectral_flatness",
    FlatnessDb => "flatness_db",
    Tonality => "tonality",
    SpectralRolloff => "spectral_rolloff",
    SpectralSlope => "spectral_slope",
    IrregularityK => "irregularity_k",
    IrregularityJ => "irregularity_j",
    Smoothness => "smoothness",
    Mfcc => "mfcc",
    BarkCoefficients => "bark_coefficients",
    Loudness => "loudness",
    Sharpness => "sharpness",
    PitchClassProfile => "pitch_class_profile",
    Tristimulus => "tristimulus",
    OddEvenRatio => "odd_even_ratio",
    Inharmonicity => "inharmonicity",
    Noisiness => "noisiness",
    F0 => "f0",
    YinPitch => "yin_pitch",
    WaveletPitch => "wavelet_pitch",
    HpsPitch => "hps_pitch",
    Midicent => "midicent",
    PitchEnergy => "pitch_energy",
    Autocorrelation => "autocorrelation",
    Amdf => "amdf",
    Asdf => "asdf",
    Lpc => "lpc",
    Lpcc => "lpcc",
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One argument a feature consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureInput {
    /// The raw frame of samples.
    Frame,
    /// The value of another feature in the same plan.
    Feature(FeatureId),
    /// The mel filterbank injected through [`FrameContext::filterbank`].
    Filterbank,
    /// The bark band edges injected through [`FrameContext::bark_limits`].
    BarkLimits,
    /// The per-pitch IIR bank injected through [`FrameContext::pitch_filterbank`].
    PitchFilterbank,
    /// The bin-to-pitch-class map injected through [`FrameContext::pitch_classes`].
    PitchClasses,
}

impl FeatureInput {
    /// Argument name used in error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            FeatureInput::Frame => "frame",
            FeatureInput::Feature(id) => id.name(),
            FeatureInput::Filterbank => "filterbank",
            FeatureInput::BarkLimits => "bark_limits",
            FeatureInput::PitchFilterbank => "pitch_filterbank",
            FeatureInput::PitchClasses => "pitch_classes",
        }
    }
}

/// Describes a feature in the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDescriptor {
    /// Typed identifier.
    pub id: FeatureId,
    /// Human-readable name.
    pub name: &'static str,
    /// Brief description of the feature.
    pub description: &'static str,
    /// Category for organization.
    pub category: FeatureCategory,
    /// Arguments, in the order the capability reads them.
    pub inputs: &'static [FeatureInput],
}

impl FeatureDescriptor {
    /// Other features this one reads.
    pub fn dependencies(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.inputs.iter().filter_map(|input| match input {
            FeatureInput::Feature(id) => Some(*id),
            _ => None,
        })
    }
}

/// Value produced by a feature for one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    /// A single number.
    Scalar(f32),
    /// A pitch estimate; `None` when no pitch was found.
    Pitch(Option<f32>),
    /// An integer-valued measurement such as MIDI cents.
    Integer(i32),
    /// A coefficient or lag vector.
    Vector(Vec<f32>),
    /// An amplitude, peak, or harmonic spectrum.
    Spectrum(Spectrum),
}

impl FeatureValue {
    /// Short name of the variant, for diagnostics.
    pub const fn kind(&self) -> &'static str {
        match self {
            FeatureValue::Scalar(_) => "scalar",
            FeatureValue::Pitch(_) => "pitch",
            FeatureValue::Integer(_) => "integer",
            FeatureValue::Vector(_) => "vector",
            FeatureValue::Spectrum(_) => "spectrum",
        }
    }
}

/// Internal entry in the registry.
#[derive(Clone)]
pub(crate) struct RegistryEntry {
    pub(crate) descriptor: FeatureDescriptor,
    pub(crate) capability: Capability,
}

/// Registry of all available features.
///
/// [`FeatureRegistry::new`] registers every built-in descriptor. Entries can
/// be replaced with [`FeatureRegistry::register`], which is how callers swap
/// in their own implementation of a feature.
#[derive(Clone)]
pub struct FeatureRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for FeatureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FeatureRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.descriptor.id))
            .finish()
    }
}

impl FeatureRegistry {
    /// Create a new registry with all built-in features registered.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        builtin::register_all(&mut registry);
        registry
    }

    /// Create a registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            entries: Vec::with_capacity(FeatureId::ALL.len()),
        }
    }

    /// Register a feature, replacing any existing entry with the same id.
    pub fn register(&mut self, descriptor: FeatureDescriptor, capability: Capability) {
        let entry = RegistryEntry {
            descriptor,
            capability,
        };
        match self
            .entries
            .iter_mut()
            .find(|e| e.descriptor.id == entry.descriptor.id)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Returns descriptors for all registered features.
    pub fn all_features(&self) -> Vec<&FeatureDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    /// Returns descriptors for features in a specific category.
    pub fn features_in_category(&self, category: FeatureCategory) -> Vec<&FeatureDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.category == category)
            .map(|e| &e.descriptor)
            .collect()
    }

    /// Get a descriptor by id.
    pub fn get(&self, id: FeatureId) -> Option<&FeatureDescriptor> {
        self.entry(id).map(|e| &e.descriptor)
    }

    /// Get a descriptor by name (see [`FeatureId::from_name`]).
    pub fn by_name(&self, name: &str) -> Option<&FeatureDescriptor> {
        FeatureId::from_name(name).and_then(|id| self.get(id))
    }

    /// Resolve a name to a registered id.
    pub fn resolve(&self, name: &str) -> Result<FeatureId> {
        self.by_name(name)
            .map(|d| d.id)
            .ok_or_else(|| ExtractError::UnknownFeature(name.to_string()))
    }

    pub(crate) fn entry(&self, id: FeatureId) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.descriptor.id == id)
    }

    /// Returns the number of registered features.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no features are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = FeatureRegistry::new();
        assert_eq!(registry.len(), FeatureId::ALL.len());
        assert!(FeatureRegistry::empty().is_empty());
    }

    #[test]
    fn test_every_id_registered_once() {
        let registry = FeatureRegistry::new();
        for &id in FeatureId::ALL {
            let descriptor = registry.get(id).unwrap();
            assert_eq!(descriptor.id, id);
            assert_eq!(descriptor.name, id.name());
        }
    }

    #[test]
    fn test_by_name() {
        let registry = FeatureRegistry::new();
        assert_eq!(
            registry.by_name("spectral-centroid").unwrap().id,
            FeatureId::SpectralCentroid
        );
        assert_eq!(registry.by_name("LPCC").unwrap().id, FeatureId::Lpcc);
        assert!(registry.by_name("chroma").is_none());
        assert!(matches!(
            registry.resolve("chroma"),
            Err(ExtractError::UnknownFeature(name)) if name == "chroma"
        ));
    }

    #[test]
    fn test_features_by_category() {
        let registry = FeatureRegistry::new();

        let pitch = registry.features_in_category(FeatureCategory::Pitch);
        assert_eq!(pitch.len(), 6); // f0, YIN, wavelet, HPS, midicent, pitch energy

        let temporal = registry.features_in_category(FeatureCategory::Temporal);
        assert_eq!(temporal.len(), 3); // autocorrelation, AMDF, ASDF

        let cepstral = registry.features_in_category(FeatureCategory::Cepstral);
        assert_eq!(cepstral.len(), 2); // LPC, LPCC

        let harmonic = registry.features_in_category(FeatureCategory::Harmonic);
        assert_eq!(harmonic.len(), 4);

        let total: usize = FeatureCategory::ALL
            .iter()
            .map(|&c| registry.features_in_category(c).len())
            .sum();
        assert_eq!(total, registry.len());
    }

    #[test]
    fn test_dependencies_are_registered() {
        let registry = FeatureRegistry::new();
        for descriptor in registry.all_features() {
            for dep in descriptor.dependencies() {
                assert!(registry.get(dep).is_some(), "{} -> {}", descriptor.id, dep);
            }
        }
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = FeatureRegistry::new();
        let mut descriptor = registry.get(FeatureId::Loudness).unwrap().clone();
        descriptor.description = "replaced";
        registry.register(descriptor, |_| Ok(Some(FeatureValue::Scalar(1.0))));
        assert_eq!(registry.len(), FeatureId::ALL.len());
        assert_eq!(
            registry.get(FeatureId::Loudness).unwrap().description,
            "replaced"
        );
    }

    #[test]
    fn test_category_names() {
        assert_eq!(FeatureCategory::Spectral.name(), "Spectral");
        assert_eq!(FeatureCategory::Cepstral.name(), "Cepstral");
        assert_eq!(FeatureId::OddEvenRatio.to_string(), "odd_even_ratio");
    }
}

//! Analysis profiles for timbral.
//!
//! A profile fixes everything an extraction run needs besides the audio:
//! framing, the feature list, and the parameters of each analysis stage. Profiles
//! are TOML files; a handful of factory profiles are compiled in.
//!
//! # Features
//!
//! - **Profiles**: Load and save [`AnalysisProfile`] TOML files
//! - **Validation**: Check ranges and feature names, reporting every problem
//! - **Paths**: Platform-specific profile directories
//! - **Factory Profiles**: Built-in starting points
//!
//! # Example
//!
//! ```rust
//! use timbral_config::{AnalysisProfile, get_factory_profile};
//! use timbral_registry::{Extractor, FeatureRegistry};
//!
//! let registry = FeatureRegistry::new();
//! let profile = get_factory_profile("default").expect("factory profile");
//! profile.validate(&registry).expect("factory profiles are valid");
//!
//! let ids = profile.feature_ids(&registry).unwrap();
//! let extractor = Extractor::new(&registry, &ids).unwrap();
//! let context = profile.frame_context(44100.0);
//! assert_eq!(context.lpc_order, profile.lpc.order);
//! assert!(extractor.plan().count() >= ids.len());
//! ```

mod error;
mod profile;

/// Platform-specific paths for profiles.
pub mod paths;

/// Profile validation.
pub mod validation;

/// Built-in profiles.
pub mod factory_profiles;

pub use error::ConfigError;
pub use factory_profiles::{
    FACTORY_PROFILE_NAMES, factory_profiles, get_factory_profile, is_factory_profile,
    resolve_profile,
};
pub use paths::{
    ensure_user_profiles_dir, find_profile, list_system_profiles, list_user_profiles,
    profile_name_from_path, system_profiles_dir, user_config_dir, user_profiles_dir,
};
pub use profile::{
    AnalysisProfile, HarmonicSection, LpcSection, PeakSection, PitchSection, ResampleSection,
    SpectrumSection,
};
pub use validation::{ValidationError, ValidationResult, validate_feature, validate_profile};

//! Dependency-resolved extraction plans.
//!
//! [`Extractor::new`] walks the inputs of every requested feature
//! depth-first and emits each feature after everything it reads, so a plan is
//! a topological order of the requested closure. Cycles are reported with the
//! full path that closes them. Running a plan never consults the registry
//! again: each step holds its descriptor and capability directly.

use std::collections::BTreeMap;
use std::collections::HashMap;

use timbral_analysis::{PitchTrackerState, Spectrum};

use crate::context::FrameContext;
use crate::error::{ExtractError, Result};
use crate::{FeatureDescriptor, FeatureId, FeatureInput, FeatureRegistry, FeatureValue};

/// Computes one feature from its arguments.
///
/// `Ok(None)` means the feature is undefined for this frame, typically
/// because an upstream pitch estimate found nothing.
pub type Capability = fn(&mut FeatureArgs<'_>) -> Result<Option<FeatureValue>>;

/// Arguments handed to a [`Capability`].
pub struct FeatureArgs<'a> {
    /// Raw frame of samples.
    pub frame: &'a [f32],
    /// Frame parameters and injected tables.
    pub context: &'a FrameContext<'a>,
    /// Tracker state of the stream this frame belongs to.
    pub tracker: &'a mut PitchTrackerState,
    feature: &'static str,
    results: &'a FeatureSet,
}

impl<'a> FeatureArgs<'a> {
    /// Name of the feature being computed.
    pub fn feature(&self) -> &'static str {
        self.feature
    }

    fn lookup(&self, id: FeatureId) -> Result<Option<&'a FeatureValue>> {
        match self.results.values.get(&id) {
            Some(value) => Ok(value.as_ref()),
            None => Err(ExtractError::MissingArgument {
                feature: self.feature,
                argument: id.name(),
            }),
        }
    }

    fn unexpected(&self, id: FeatureId) -> ExtractError {
        ExtractError::UnexpectedValue {
            feature: self.feature,
            argument: id.name(),
        }
    }

    /// A spectrum-valued argument.
    pub fn spectrum(&self, id: FeatureId) -> Result<Option<&'a Spectrum>> {
        match self.lookup(id)? {
            None => Ok(None),
            Some(FeatureValue::Spectrum(s)) => Ok(Some(s)),
            Some(_) => Err(self.unexpected(id)),
        }
    }

    /// A scalar-valued argument.
    pub fn scalar(&self, id: FeatureId) -> Result<Option<f32>> {
        match self.lookup(id)? {
            None => Ok(None),
            Some(FeatureValue::Scalar(v)) => Ok(Some(*v)),
            Some(_) => Err(self.unexpected(id)),
        }
    }

    /// A pitch-valued argument; `None` if undefined or no pitch was found.
    pub fn pitch(&self, id: FeatureId) -> Result<Option<f32>> {
        match self.lookup(id)? {
            None => Ok(None),
            Some(FeatureValue::Pitch(p)) => Ok(*p),
            Some(_) => Err(self.unexpected(id)),
        }
    }

    /// A vector-valued argument.
    pub fn vector(&self, id: FeatureId) -> Result<Option<&'a [f32]>> {
        match self.lookup(id)? {
            None => Ok(None),
            Some(FeatureValue::Vector(v)) => Ok(Some(v)),
            Some(_) => Err(self.unexpected(id)),
        }
    }
}

/// Values computed for one frame, keyed by feature.
///
/// Every feature in the plan has an entry; the entry is `None` when the
/// feature was undefined for the frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    values: BTreeMap<FeatureId, Option<FeatureValue>>,
}

impl FeatureSet {
    /// Value of a feature, if it was computed and defined.
    pub fn get(&self, id: FeatureId) -> Option<&FeatureValue> {
        self.values.get(&id).and_then(Option::as_ref)
    }

    /// Whether the feature was part of the plan.
    pub fn contains(&self, id: FeatureId) -> bool {
        self.values.contains_key(&id)
    }

    /// Scalar value of a feature.
    pub fn scalar(&self, id: FeatureId) -> Option<f32> {
        match self.get(id)? {
            FeatureValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// Pitch value of a feature.
    pub fn pitch(&self, id: FeatureId) -> Option<f32> {
        match self.get(id)? {
            FeatureValue::Pitch(p) => *p,
            _ => None,
        }
    }

    /// Vector value of a feature.
    pub fn vector(&self, id: FeatureId) -> Option<&[f32]> {
        match self.get(id)? {
            FeatureValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Spectrum value of a feature.
    pub fn spectrum(&self, id: FeatureId) -> Option<&Spectrum> {
        match self.get(id)? {
            FeatureValue::Spectrum(s) => Some(s),
            _ => None,
        }
    }

    /// All entries in feature order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, Option<&FeatureValue>)> {
        self.values.iter().map(|(id, v)| (*id, v.as_ref()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if nothing was computed.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

struct PlanStep {
    descriptor: FeatureDescriptor,
    capability: Capability,
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    InProgress,
    Done,
}

/// Runs a fixed set of features over successive frames of one stream.
///
/// The extractor owns the stream's [`PitchTrackerState`], so independent
/// streams need independent extractors. Call [`Extractor::reset`] before
/// reusing one for a new stream.
pub struct Extractor {
    plan: Vec<PlanStep>,
    requested: Vec<FeatureId>,
    tracker: PitchTrackerState,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("plan", &self.plan().collect::<Vec<_>>())
            .field("requested", &self.requested)
            .field("tracker", &self.tracker)
            .finish()
    }
}

impl Extractor {
    /// Resolve the requested features and everything they depend on.
    ///
    /// # Errors
    ///
    /// [`ExtractError::UnknownFeature`] if a feature or dependency is not
    /// registered, [`ExtractError::DependencyCycle`] if inputs loop.
    pub fn new(registry: &FeatureRegistry, features: &[FeatureId]) -> Result<Self> {
        let mut plan = Vec::new();
        let mut state = HashMap::new();
        let mut path = Vec::new();
        for &id in features {
            resolve(registry, id, &mut state, &mut path, &mut plan)?;
        }

        let mut requested = Vec::with_capacity(features.len());
        for &id in features {
            if !requested.contains(&id) {
                requested.push(id);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            requested = ?requested,
            plan = ?plan.iter().map(|s: &PlanStep| s.descriptor.id).collect::<Vec<_>>(),
            "resolved extraction plan"
        );

        Ok(Self {
            plan,
            requested,
            tracker: PitchTrackerState::new(),
        })
    }

    /// Resolve features by name.
    pub fn from_names<S: AsRef<str>>(registry: &FeatureRegistry, names: &[S]) -> Result<Self> {
        let ids = names
            .iter()
            .map(|name| registry.resolve(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(registry, &ids)
    }

    /// Features in execution order, dependencies included.
    pub fn plan(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.plan.iter().map(|step| step.descriptor.id)
    }

    /// Features asked for, in request order without duplicates.
    pub fn requested(&self) -> &[FeatureId] {
        &self.requested
    }

    /// Current pitch-tracker state of the stream.
    pub fn tracker_state(&self) -> PitchTrackerState {
        self.tracker
    }

    /// Forget tracker history before starting a new stream.
    pub fn reset(&mut self) {
        self.tracker = PitchTrackerState::new();
    }

    /// Check that the context supplies every injected table the plan reads.
    fn check_context(&self, context: &FrameContext<'_>) -> Result<()> {
        for step in &self.plan {
            for input in step.descriptor.inputs {
                let present = match input {
                    FeatureInput::Filterbank => context.filterbank.is_some(),
                    FeatureInput::BarkLimits => context.bark_limits.is_some(),
                    FeatureInput::PitchFilterbank => context.pitch_filterbank.is_some(),
                    FeatureInput::PitchClasses => context.pitch_classes.is_some(),
                    FeatureInput::Frame | FeatureInput::Feature(_) => true,
                };
                if !present {
                    return Err(ExtractError::MissingArgument {
                        feature: step.descriptor.name,
                        argument: input.name(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Run the plan over one frame.
    ///
    /// The tracker state only advances when the whole plan succeeds; a failed
    /// frame leaves the stream as it was.
    pub fn process(&mut self, frame: &[f32], context: &FrameContext<'_>) -> Result<FeatureSet> {
        self.check_context(context)?;

        let mut tracker = self.tracker;
        let mut results = FeatureSet::default();
        for step in &self.plan {
            let value = {
                let mut args = FeatureArgs {
                    frame,
                    context,
                    tracker: &mut tracker,
                    feature: step.descriptor.name,
                    results: &results,
                };
                (step.capability)(&mut args)?
            };

            #[cfg(feature = "tracing")]
            tracing::trace!(
                feature = step.descriptor.name,
                kind = value.as_ref().map_or("undefined", FeatureValue::kind),
                "computed feature"
            );

            results.values.insert(step.descriptor.id, value);
        }
        self.tracker = tracker;
        Ok(results)
    }
}

fn resolve(
    registry: &FeatureRegistry,
    id: FeatureId,
    state: &mut HashMap<FeatureId, Visit>,
    path: &mut Vec<FeatureId>,
    plan: &mut Vec<PlanStep>,
) -> Result<()> {
    match state.get(&id) {
        Some(Visit::Done) => return Ok(()),
        Some(Visit::InProgress) => {
            let start = path.iter().position(|&p| p == id).unwrap_or(0);
            let cycle: Vec<&str> = path[start..]
                .iter()
                .chain(std::iter::once(&id))
                .map(|p| p.name())
                .collect();
            return Err(ExtractError::DependencyCycle(cycle.join(" -> ")));
        }
        None => {}
    }

    let entry = registry
        .entry(id)
        .ok_or_else(|| ExtractError::UnknownFeature(id.name().to_string()))?;

    state.insert(id, Visit::InProgress);
    path.push(id);
    for dep in entry.descriptor.dependencies() {
        resolve(registry, dep, state, path, plan)?;
    }
    path.pop();
    state.insert(id, Visit::Done);

    plan.push(PlanStep {
        descriptor: entry.descriptor.clone(),
        capability: entry.capability,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FeatureCategory;
    use std::f32::consts::PI;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    fn position(extractor: &Extractor, id: FeatureId) -> usize {
        extractor.plan().position(|p| p == id).unwrap()
    }

    #[test]
    fn test_plan_is_topological() {
        let registry = FeatureRegistry::new();
        let extractor = Extractor::new(&registry, &[FeatureId::Tristimulus]).unwrap();

        let plan: Vec<_> = extractor.plan().collect();
        assert_eq!(plan.len(), 5);
        assert!(position(&extractor, FeatureId::Spectrum) < position(&extractor, FeatureId::PeakSpectrum));
        assert!(
            position(&extractor, FeatureId::PeakSpectrum)
                < position(&extractor, FeatureId::HarmonicSpectrum)
        );
        assert!(position(&extractor, FeatureId::F0) < position(&extractor, FeatureId::HarmonicSpectrum));
        assert_eq!(*plan.last().unwrap(), FeatureId::Tristimulus);
    }

    #[test]
    fn test_shared_dependencies_run_once() {
        let registry = FeatureRegistry::new();
        let ids = [
            FeatureId::SpectralCentroid,
            FeatureId::SpectralSpread,
            FeatureId::SpectralCentroid,
        ];
        let extractor = Extractor::new(&registry, &ids).unwrap();
        assert_eq!(extractor.plan().count(), 3);
        assert_eq!(
            extractor.requested(),
            &[FeatureId::SpectralCentroid, FeatureId::SpectralSpread]
        );
    }

    #[test]
    fn test_unknown_feature_in_empty_registry() {
        let registry = FeatureRegistry::empty();
        let err = Extractor::new(&registry, &[FeatureId::Lpc]).unwrap_err();
        assert_eq!(err, ExtractError::UnknownFeature("lpc".into()));
    }

    #[test]
    fn test_from_names_rejects_unknown() {
        let registry = FeatureRegistry::new();
        assert!(Extractor::from_names(&registry, &["lpc", "lpcc"]).is_ok());
        assert!(matches!(
            Extractor::from_names(&registry, &["lpc", "chroma"]),
            Err(ExtractError::UnknownFeature(_))
        ));
    }

    #[test]
    fn test_cycle_detected() {
        fn never(_: &mut FeatureArgs<'_>) -> Result<Option<FeatureValue>> {
            Ok(None)
        }

        let mut registry = FeatureRegistry::empty();
        registry.register(
            FeatureDescriptor {
                id: FeatureId::Lpc,
                name: "lpc",
                description: "",
                category: FeatureCategory::Cepstral,
                inputs: &[FeatureInput::Feature(FeatureId::Lpcc)],
            },
            never,
        );
        registry.register(
            FeatureDescriptor {
                id: FeatureId::Lpcc,
                name: "lpcc",
                description: "",
                category: FeatureCategory::Cepstral,
                inputs: &[FeatureInput::Feature(FeatureId::Lpc)],
            },
            never,
        );

        let err = Extractor::new(&registry, &[FeatureId::Lpcc]).unwrap_err();
        assert_eq!(err, ExtractError::DependencyCycle("lpcc -> lpc -> lpcc".into()));
    }

    #[test]
    fn test_missing_filterbank() {
        let registry = FeatureRegistry::new();
        let mut extractor = Extractor::new(&registry, &[FeatureId::Mfcc]).unwrap();
        let err = extractor
            .process(&[0.0; 64], &FrameContext::new(8000.0))
            .unwrap_err();
        assert_eq!(
            err,
            ExtractError::MissingArgument {
                feature: "mfcc",
                argument: "filterbank",
            }
        );
    }

    #[test]
    fn test_process_centroid_and_dependencies() {
        let registry = FeatureRegistry::new();
        let mut extractor = Extractor::new(&registry, &[FeatureId::SpectralCentroid]).unwrap();
        let features = extractor
            .process(&sine(1000.0, 8000.0, 256), &FrameContext::new(8000.0))
            .unwrap();

        assert_eq!(features.len(), 2);
        assert!(features.spectrum(FeatureId::Spectrum).is_some());
        let centroid = features.scalar(FeatureId::SpectralCentroid).unwrap();
        assert!((centroid - 1000.0).abs() < 1.0, "centroid {centroid}");
    }

    #[test]
    fn test_silence_leaves_pitch_dependents_undefined() {
        let registry = FeatureRegistry::new();
        let mut extractor =
            Extractor::new(&registry, &[FeatureId::OddEvenRatio, FeatureId::Midicent]).unwrap();
        let features = extractor
            .process(&[0.0; 512], &FrameContext::new(8000.0))
            .unwrap();

        assert!(features.contains(FeatureId::F0));
        assert_eq!(features.get(FeatureId::F0), Some(&FeatureValue::Pitch(None)));
        assert!(features.contains(FeatureId::OddEvenRatio));
        assert!(features.get(FeatureId::OddEvenRatio).is_none());
        assert!(features.get(FeatureId::Midicent).is_none());
    }

    #[test]
    fn test_tracker_state_persists_across_frames() {
        let registry = FeatureRegistry::new();
        let mut extractor = Extractor::new(&registry, &[FeatureId::WaveletPitch]).unwrap();
        let context = FrameContext::new(44100.0);
        let signal = sine(220.0, 44100.0, 2048 * 3);

        for frame in signal.chunks(2048) {
            extractor.process(frame, &context).unwrap();
        }
        assert_eq!(extractor.tracker_state().confidence, 3);

        extractor.reset();
        assert_eq!(extractor.tracker_state(), PitchTrackerState::new());
    }

    #[test]
    fn test_failed_frame_keeps_tracker_state() {
        let registry = FeatureRegistry::new();
        let mut extractor =
            Extractor::new(&registry, &[FeatureId::WaveletPitch, FeatureId::Lpc]).unwrap();
        assert!(
            position(&extractor, FeatureId::WaveletPitch) < position(&extractor, FeatureId::Lpc)
        );
        let frame = sine(220.0, 44100.0, 2048);

        // prediction order beyond the frame fails after the tracker has run
        let mut bad = FrameContext::new(44100.0);
        bad.lpc_order = 4096;
        assert!(matches!(
            extractor.process(&frame, &bad),
            Err(ExtractError::Analysis(_))
        ));
        assert_eq!(extractor.tracker_state(), PitchTrackerState::new());

        let features = extractor.process(&frame, &FrameContext::new(44100.0)).unwrap();
        assert!(features.pitch(FeatureId::WaveletPitch).is_some());
        assert_eq!(extractor.tracker_state().confidence, 1);
    }
}

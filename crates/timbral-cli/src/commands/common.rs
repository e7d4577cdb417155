//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use std::collections::BTreeMap;
use std::path::Path;
use timbral_analysis::descriptors::PITCH_CLASS_REFERENCE;
use timbral_analysis::{
    BarkLimits, Filterbank, FilterbankShift, IirFilter, PitchClassMap, PitchFilterbank, Spectrum,
    resample,
};
use timbral_config::{AnalysisProfile, resolve_profile};
use timbral_registry::FeatureValue;

/// Profile used when none is named.
pub const DEFAULT_PROFILE: &str = "default";

/// Bark band edges in Hz.
const BARK_EDGES: [f32; 26] = [
    0.0, 100.0, 200.0, 300.0, 400.0, 510.0, 630.0, 770.0, 920.0, 1080.0, 1270.0, 1480.0,
    1720.0, 2000.0, 2320.0, 2700.0, 3150.0, 3700.0, 4400.0, 5300.0, 6400.0, 7700.0, 9500.0,
    12000.0, 15500.0, 20500.0,
];

/// Load a profile by factory name, profile name, or path.
pub fn load_profile(name: Option<&str>) -> anyhow::Result<AnalysisProfile> {
    let name = name.unwrap_or(DEFAULT_PROFILE);
    resolve_profile(name).with_context(|| {
        format!("cannot load profile '{name}' (see 'timbral profiles list')")
    })
}

/// Load a filterbank from a JSON array of filter rows.
pub fn load_filterbank(path: &Path) -> anyhow::Result<Filterbank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read filterbank {}", path.display()))?;
    let rows: Vec<Vec<f32>> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of filter rows", path.display()))?;
    Ok(Filterbank::new(rows)?)
}

/// Load a per-pitch IIR bank from a JSON object mapping shift names to
/// `[pitch, [b...], [a...]]` entries.
pub fn load_pitch_filterbank(path: &Path) -> anyhow::Result<PitchFilterbank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read pitch filterbank {}", path.display()))?;
    let shifts: BTreeMap<String, Vec<(u8, Vec<f64>, Vec<f64>)>> = serde_json::from_str(&content)
        .with_context(|| {
            format!(
                "{} is not a JSON object of [pitch, b, a] band lists",
                path.display()
            )
        })?;

    let mut bank = PitchFilterbank::new();
    for (name, bands) in shifts {
        let shift = FilterbankShift::from_name(&name).ok_or_else(|| {
            let known: Vec<&str> = FilterbankShift::ALL.iter().map(|s| s.name()).collect();
            anyhow::anyhow!("unknown filterbank shift '{name}' (expected one of {})", known.join(", "))
        })?;
        for (pitch, b, a) in bands {
            let filter = IirFilter::new(b, a)
                .with_context(|| format!("band {pitch} of shift '{name}'"))?;
            bank.insert(shift, pitch, filter)?;
        }
    }
    tracing::debug!(bands = bank.len(), "loaded pitch filterbank");
    Ok(bank)
}

/// Pitch class of every bin of a `frame_size`-sample spectrum, laid out as
/// the `spectrum` feature lays out its bins.
pub fn pitch_classes(
    frame_size: usize,
    sample_rate: f32,
    include_dc: bool,
) -> anyhow::Result<PitchClassMap> {
    let first = usize::from(!include_dc);
    let frequencies: Vec<f32> = (first..=frame_size / 2)
        .map(|k| k as f32 * sample_rate / frame_size as f32)
        .collect();
    Ok(PitchClassMap::from_frequencies(&frequencies, PITCH_CLASS_REFERENCE)?)
}

/// Bark band edges as bin indices into a spectrum of `spectrum_len` bins
/// from `frame_size`-sample frames.
///
/// Edges above the last bin collapse onto it, leaving empty upper bands at low
/// sample rates.
pub fn bark_limits(
    frame_size: usize,
    sample_rate: f32,
    spectrum_len: usize,
) -> anyhow::Result<BarkLimits> {
    let limits = BARK_EDGES
        .iter()
        .map(|edge| ((edge / sample_rate * frame_size as f32) as usize).min(spectrum_len))
        .collect();
    Ok(BarkLimits::new(limits)?)
}

/// Convert `samples` from `from` Hz to `to` Hz with the given filter order.
pub fn convert_rate(
    samples: &[f32],
    from: u32,
    to: u32,
    filter_order: usize,
) -> anyhow::Result<Vec<f32>> {
    if from == to {
        return Ok(samples.to_vec());
    }
    let g = gcd(from, to);
    let (p, q) = ((to / g) as usize, (from / g) as usize);
    tracing::info!(from, to, p, q, "converting sample rate");
    Ok(resample(samples, p, q, filter_order)?)
}

/// Greatest common divisor.
pub fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Compact text rendering of a feature value for tables.
pub fn format_value(value: Option<&FeatureValue>) -> String {
    match value {
        None | Some(FeatureValue::Pitch(None)) => "-".to_string(),
        Some(FeatureValue::Scalar(v) | FeatureValue::Pitch(Some(v))) => format!("{v:.4}"),
        Some(FeatureValue::Integer(v)) => v.to_string(),
        Some(FeatureValue::Vector(v)) => format_vector(v),
        Some(FeatureValue::Spectrum(s)) => format!("[{} bins]", s.len()),
    }
}

fn format_vector(values: &[f32]) -> String {
    const SHOWN: usize = 4;
    let head: Vec<String> = values.iter().take(SHOWN).map(|v| format!("{v:.3}")).collect();
    if values.len() > SHOWN {
        format!("[{}, ... ({})]", head.join(", "), values.len())
    } else {
        format!("[{}]", head.join(", "))
    }
}

/// JSON rendering of a feature value. Undefined values become `null`.
pub fn value_to_json(value: Option<&FeatureValue>) -> serde_json::Value {
    use serde_json::{Value, json};
    match value {
        None | Some(FeatureValue::Pitch(None)) => Value::Null,
        Some(FeatureValue::Scalar(v) | FeatureValue::Pitch(Some(v))) => json!(v),
        Some(FeatureValue::Integer(v)) => json!(v),
        Some(FeatureValue::Vector(v)) => json!(v),
        Some(FeatureValue::Spectrum(s)) => spectrum_to_json(s),
    }
}

fn spectrum_to_json(spectrum: &Spectrum) -> serde_json::Value {
    serde_json::json!({
        "amplitudes": spectrum.amplitudes(),
        "frequencies": spectrum.frequencies(),
    })
}

//! Frame-by-frame feature extraction.

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use timbral_registry::{Extractor, FeatureId, FeatureRegistry, FeatureSet};

use super::common::{
    bark_limits, convert_rate, format_value, load_filterbank, load_pitch_filterbank, load_profile,
    pitch_classes, value_to_json,
};
use crate::framing::{frame_count, frames};
use crate::wav::read_wav;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Profile name or path (defaults to the "default" factory profile)
    #[arg(short, long)]
    profile: Option<String>,

    /// Features to extract, overriding the profile (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    features: Vec<String>,

    /// Frame size override
    #[arg(long)]
    frame_size: Option<usize>,

    /// Hop size override
    #[arg(long)]
    hop_size: Option<usize>,

    /// Fixed fundamental in Hz for harmonic descriptors
    #[arg(long)]
    f0: Option<f32>,

    /// Mel filterbank for MFCC, as a JSON array of filter rows
    #[arg(long)]
    filterbank: Option<PathBuf>,

    /// Per-pitch IIR bank for pitch_energy, as a JSON object of
    /// shift name -> [pitch, [b...], [a...]] entries
    #[arg(long)]
    pitch_filterbank: Option<PathBuf>,

    /// Write results as JSON to this file instead of printing a table
    #[arg(short, long)]
    json: Option<PathBuf>,
}

/// Features computed for one frame.
struct FrameResult {
    index: usize,
    time: f32,
    features: FeatureSet,
}

pub fn run(args: AnalyzeArgs) -> anyhow::Result<()> {
    let registry = FeatureRegistry::new();

    let mut profile = load_profile(args.profile.as_deref())?;
    if !args.features.is_empty() {
        profile.features = args.features.clone();
    }
    if let Some(frame_size) = args.frame_size {
        profile.frame_size = frame_size;
    }
    if let Some(hop_size) = args.hop_size {
        profile.hop_size = hop_size;
    }
    if args.f0.is_some() {
        profile.pitch.f0 = args.f0;
    }
    profile.validate(&registry)?;

    let ids = profile.feature_ids(&registry)?;
    if ids.is_empty() {
        anyhow::bail!("No features selected. Use --features or a profile with features.");
    }
    let mut extractor = Extractor::new(&registry, &ids)?;

    let (samples, input_rate) = read_wav(&args.input)?;
    let sample_rate = profile.sample_rate.unwrap_or(input_rate);
    let samples = convert_rate(&samples, input_rate, sample_rate, profile.resample.filter_order)?;
    let sr = sample_rate as f32;

    let spectrum_len = profile.frame_size / 2 + usize::from(profile.spectrum.include_dc);
    let limits = bark_limits(profile.frame_size, sr, spectrum_len)?;
    let classes = pitch_classes(profile.frame_size, sr, profile.spectrum.include_dc)?;
    let filterbank = args.filterbank.as_deref().map(load_filterbank).transpose()?;
    let pitch_bank = args
        .pitch_filterbank
        .as_deref()
        .map(load_pitch_filterbank)
        .transpose()?;

    let mut context = profile
        .frame_context(sr)
        .with_bark_limits(&limits)
        .with_pitch_classes(&classes);
    if let Some(bank) = &filterbank {
        context = context.with_filterbank(bank);
    }
    if let Some(bank) = &pitch_bank {
        context = context.with_pitch_filterbank(bank);
    }

    tracing::info!(
        profile = %profile.name,
        sample_rate,
        frame_size = profile.frame_size,
        hop_size = profile.hop_size,
        features = ids.len(),
        "analyzing {}",
        args.input.display()
    );

    let total = frame_count(samples.len(), profile.hop_size);
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({eta})")?
            .progress_chars("##-"),
    );

    let mut results = Vec::with_capacity(total);
    for frame in frames(&samples, profile.frame_size, profile.hop_size) {
        let features = extractor.process(&frame.samples, &context)?;
        results.push(FrameResult {
            index: frame.index,
            time: frame.time(sr),
            features,
        });
        pb.inc(1);
    }
    pb.finish_and_clear();

    match &args.json {
        Some(path) => {
            let document = serde_json::json!({
                "file": args.input.display().to_string(),
                "profile": profile.name,
                "sample_rate": sample_rate,
                "frame_size": profile.frame_size,
                "hop_size": profile.hop_size,
                "features": ids.iter().map(|id| id.name()).collect::<Vec<_>>(),
                "frames": results.iter().map(|r| frame_json(r, &ids)).collect::<Vec<_>>(),
            });
            std::fs::write(path, serde_json::to_string_pretty(&document)?)?;
            println!("Wrote {} frame(s) to {}", results.len(), path.display());
        }
        None => print_table(&results, &ids),
    }

    Ok(())
}

fn frame_json(result: &FrameResult, ids: &[FeatureId]) -> serde_json::Value {
    let values: serde_json::Map<String, serde_json::Value> = ids
        .iter()
        .map(|id| (id.name().to_string(), value_to_json(result.features.get(*id))))
        .collect();
    serde_json::json!({
        "index": result.index,
        "time": result.time,
        "values": values,
    })
}

fn print_table(results: &[FrameResult], ids: &[FeatureId]) {
    let widths: Vec<usize> = ids.iter().map(|id| id.name().len().max(10)).collect();

    let mut header = format!("{:>6}  {:>9}", "frame", "time (s)");
    for (id, width) in ids.iter().zip(&widths) {
        header.push_str(&format!("  {:>width$}", id.name()));
    }
    println!("{header}");
    println!("{}", "-".repeat(header.len()));

    for result in results {
        let mut row = format!("{:>6}  {:>9.4}", result.index, result.time);
        for (id, width) in ids.iter().zip(&widths) {
            row.push_str(&format!("  {:>width$}", format_value(result.features.get(*id))));
        }
        println!("{row}");
    }
}

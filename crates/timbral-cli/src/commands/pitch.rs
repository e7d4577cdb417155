//! Pitch tracking over a file.

use clap::Args;
use std::path::PathBuf;
use timbral_analysis::{
    PitchTrackerState, WaveletPitch, f0_autocorrelation, midicent, yin_difference, yin_pitch,
};

use super::common::{convert_rate, load_profile};
use crate::framing::frames;
use crate::wav::read_wav;

#[derive(Args)]
pub struct PitchArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Profile supplying tracker settings and target sample rate
    #[arg(short, long)]
    profile: Option<String>,

    /// Frame size override
    #[arg(long)]
    frame_size: Option<usize>,

    /// Hop size (defaults to the frame size)
    #[arg(long)]
    hop_size: Option<usize>,

    /// Also print the YIN and autocorrelation estimates
    #[arg(long)]
    compare: bool,
}

fn hz(value: Option<f32>) -> String {
    value.map_or_else(|| "-".to_string(), |f| format!("{f:.2}"))
}

pub fn run(args: PitchArgs) -> anyhow::Result<()> {
    let mut profile = load_profile(args.profile.as_deref())?;
    if let Some(frame_size) = args.frame_size {
        profile.frame_size = frame_size;
    }
    profile.hop_size = args.hop_size.unwrap_or(profile.frame_size);
    profile.validate(&timbral_registry::FeatureRegistry::new())?;

    let (samples, input_rate) = read_wav(&args.input)?;
    let sample_rate = profile.sample_rate.unwrap_or(input_rate);
    let samples = convert_rate(&samples, input_rate, sample_rate, profile.resample.filter_order)?;
    let sr = sample_rate as f32;

    let tracker = WaveletPitch::new(profile.wavelet_config());
    let mut state = PitchTrackerState::new();

    let mut header = format!(
        "{:>9}  {:>9}  {:>9}  {:>4}  {:>8}",
        "time (s)", "raw", "smoothed", "conf", "midicent"
    );
    if args.compare {
        header.push_str(&format!("  {:>9}  {:>9}", "yin", "autocorr"));
    }
    println!("{header}");
    println!("{}", "-".repeat(header.len()));

    let mut voiced = 0usize;
    let mut total = 0usize;
    for frame in frames(&samples, profile.frame_size, profile.hop_size) {
        let raw = tracker.raw_estimate(&frame.samples, sr);
        let (next, smoothed) = state.advance(raw);
        state = next;

        total += 1;
        if smoothed.is_some() {
            voiced += 1;
        }

        let cents = smoothed
            .and_then(midicent)
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        let mut row = format!(
            "{:>9.4}  {:>9}  {:>9}  {:>4}  {:>8}",
            frame.time(sr),
            hz(raw),
            hz(smoothed),
            state.confidence,
            cents
        );
        if args.compare {
            let yin = yin_pitch(
                &yin_difference(&frame.samples),
                sr,
                profile.pitch.yin_threshold,
            );
            let autocorr = f0_autocorrelation(&frame.samples, sr);
            row.push_str(&format!("  {:>9}  {:>9}", hz(yin), hz(autocorr)));
        }
        println!("{row}");
    }

    println!();
    println!("{voiced}/{total} frame(s) voiced");
    Ok(())
}

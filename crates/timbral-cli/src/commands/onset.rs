//! Complex-domain onset detection over a file.

use clap::Args;
use std::path::PathBuf;
use timbral_analysis::onset_detection;

use crate::wav::read_wav;

#[derive(Args)]
pub struct OnsetArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Frame size (frames do not overlap)
    #[arg(long, default_value = "512")]
    frame_size: usize,

    /// Report local maxima above this fraction of the largest value
    #[arg(long, default_value = "0.3")]
    threshold: f32,

    /// Print the detection function for every frame
    #[arg(long)]
    all: bool,
}

/// Frames that are local maxima of `odf` and reach `threshold · max(odf)`.
pub fn pick_onsets(odf: &[f32], threshold: f32) -> Vec<usize> {
    let max = odf.iter().copied().fold(0.0f32, f32::max);
    if max <= 0.0 {
        return Vec::new();
    }
    let floor = threshold * max;
    (0..odf.len())
        .filter(|&i| {
            let left = if i > 0 { odf[i - 1] } else { f32::NEG_INFINITY };
            let right = odf.get(i + 1).copied().unwrap_or(f32::NEG_INFINITY);
            odf[i] >= floor && odf[i] > left && odf[i] >= right
        })
        .collect()
}

pub fn run(args: OnsetArgs) -> anyhow::Result<()> {
    if !(0.0..=1.0).contains(&args.threshold) {
        anyhow::bail!("--threshold must lie in [0, 1], got {}", args.threshold);
    }

    let (samples, sample_rate) = read_wav(&args.input)?;
    let odf = onset_detection(&samples, args.frame_size)?;
    let seconds_per_frame = args.frame_size as f32 / sample_rate as f32;

    if args.all {
        println!("{:>6}  {:>9}  {:>12}", "frame", "time (s)", "odf");
        for (i, value) in odf.iter().enumerate() {
            println!("{:>6}  {:>9.4}  {:>12.6}", i, i as f32 * seconds_per_frame, value);
        }
        println!();
    }

    let onsets = pick_onsets(&odf, args.threshold);
    println!("{} onset(s) in {} frame(s):", onsets.len(), odf.len());
    for i in onsets {
        println!("  {:>9.4}s  (frame {i}, odf {:.6})", i as f32 * seconds_per_frame, odf[i]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_onsets() {
        let odf = [0.0, 1.0, 0.2, 0.1, 0.5, 0.5, 0.0, 0.2];
        assert_eq!(pick_onsets(&odf, 0.3), vec![1, 4]);
        assert_eq!(pick_onsets(&odf, 0.0), vec![1, 4, 7]);
        assert!(pick_onsets(&[0.0; 4], 0.1).is_empty());
    }
}

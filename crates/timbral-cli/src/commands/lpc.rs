//! Linear prediction of a single frame.

use clap::Args;
use std::path::PathBuf;
use timbral_analysis::{Window, lpc_from_signal, lpcc};

use crate::wav::read_wav;

#[derive(Args)]
pub struct LpcArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Prediction order
    #[arg(short, long, default_value = "12")]
    order: usize,

    /// Cepstral order (defaults to the prediction order)
    #[arg(long)]
    cepstral_order: Option<usize>,

    /// Frame size
    #[arg(long, default_value = "1024")]
    frame_size: usize,

    /// Frame start in seconds (defaults to the middle of the file)
    #[arg(long)]
    start: Option<f32>,

    /// Window applied before prediction
    #[arg(long, default_value = "hamming")]
    window: String,
}

pub fn run(args: LpcArgs) -> anyhow::Result<()> {
    let window = Window::from_name(&args.window)
        .ok_or_else(|| anyhow::anyhow!("Unknown window '{}'", args.window))?;

    let (samples, sample_rate) = read_wav(&args.input)?;
    if samples.is_empty() {
        anyhow::bail!("{} contains no samples", args.input.display());
    }

    let start = match args.start {
        Some(seconds) => ((seconds.max(0.0) * sample_rate as f32) as usize).min(samples.len() - 1),
        None => samples.len().saturating_sub(args.frame_size) / 2,
    };
    let end = (start + args.frame_size).min(samples.len());
    let mut frame = samples[start..end].to_vec();
    frame.resize(args.frame_size, 0.0);
    window.apply(&mut frame);

    let result = lpc_from_signal(&frame, args.order)?;
    let cepstrum = lpcc(&result.coefficients, args.cepstral_order)?;

    println!("File:   {}", args.input.display());
    println!(
        "Frame:  {} samples at {:.3}s ({} window)",
        args.frame_size,
        start as f32 / sample_rate as f32,
        window.name()
    );
    println!("Order:  {}", result.order());
    println!("Error:  {:.6e}", result.error);
    println!();

    println!("  {:>3}  {:>12}  {:>12}", "k", "lpc", "reflection");
    println!("  {:>3}  {:>12}  {:>12}", "---", "---", "----------");
    for (k, (a, r)) in result
        .coefficients
        .iter()
        .zip(&result.reflection)
        .enumerate()
    {
        println!("  {:>3}  {:>12.6}  {:>12.6}", k + 1, a, r);
    }

    println!();
    println!("  {:>3}  {:>12}", "n", "lpcc");
    println!("  {:>3}  {:>12}", "---", "----");
    for (n, c) in cepstrum.iter().enumerate() {
        println!("  {:>3}  {:>12.6}", n + 1, c);
    }

    Ok(())
}

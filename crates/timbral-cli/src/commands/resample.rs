//! Rational sample-rate conversion of a WAV file.

use clap::Args;
use std::path::PathBuf;
use timbral_analysis::resample::{DEFAULT_FILTER_ORDER, resample};

use super::common::gcd;
use crate::wav::{read_wav, write_wav};

#[derive(Args)]
pub struct ResampleArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file (32-bit float, mono)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Interpolation factor
    #[arg(short, long, required_unless_present = "rate")]
    p: Option<usize>,

    /// Decimation factor
    #[arg(short, long, required_unless_present = "rate")]
    q: Option<usize>,

    /// Target sample rate; derives P and Q from the input rate
    #[arg(long, conflicts_with_all = ["p", "q"])]
    rate: Option<u32>,

    /// Lowpass filter order
    #[arg(long, default_value_t = DEFAULT_FILTER_ORDER)]
    filter_order: usize,
}

pub fn run(args: ResampleArgs) -> anyhow::Result<()> {
    let (samples, input_rate) = read_wav(&args.input)?;

    let (p, q) = match (args.rate, args.p, args.q) {
        (Some(rate), _, _) => {
            let g = gcd(rate, input_rate);
            ((rate / g) as usize, (input_rate / g) as usize)
        }
        (None, Some(p), Some(q)) => (p, q),
        _ => anyhow::bail!("Specify both -p and -q, or --rate"),
    };

    let output_rate = u64::from(input_rate) * p as u64 / q as u64;
    let output_rate = u32::try_from(output_rate)
        .map_err(|_| anyhow::anyhow!("output sample rate {output_rate} Hz is out of range"))?;

    println!(
        "Resampling {} by {p}/{q}: {} Hz -> {} Hz",
        args.input.display(),
        input_rate,
        output_rate
    );

    let output = resample(&samples, p, q, args.filter_order)?;
    write_wav(&args.output, &output, output_rate)?;

    println!(
        "  {} -> {} samples, wrote {}",
        samples.len(),
        output.len(),
        args.output.display()
    );
    Ok(())
}

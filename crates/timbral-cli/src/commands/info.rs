//! Display WAV file metadata.

use clap::Args;

use crate::wav::read_wav_info;

/// Display WAV file information.
#[derive(Args)]
pub struct InfoArgs {
    /// Path to the WAV file
    pub file: std::path::PathBuf,

    /// Frame size used to report the frame count
    #[arg(long, default_value = "2048")]
    pub frame_size: usize,

    /// Hop size used to report the frame count (defaults to half the frame size)
    #[arg(long)]
    pub hop_size: Option<usize>,
}

/// Run the info command.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let info = read_wav_info(&args.file)?;
    let hop_size = args.hop_size.unwrap_or(args.frame_size / 2).max(1);
    let frames = crate::framing::frame_count(info.num_frames as usize, hop_size);

    println!("File:        {}", args.file.display());
    println!("Format:      {} {}-bit", info.format.label(), info.bits_per_sample);
    println!("Channels:    {}", info.channels);
    println!("Sample Rate: {} Hz", info.sample_rate);
    println!(
        "Duration:    {:.3}s ({} frames)",
        info.duration_secs, info.num_frames
    );
    println!(
        "Analysis:    {} frame(s) of {} every {} samples",
        frames, args.frame_size, hop_size
    );

    let file_size = std::fs::metadata(&args.file)?.len();
    println!("File Size:   {}", format_bytes(file_size));

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

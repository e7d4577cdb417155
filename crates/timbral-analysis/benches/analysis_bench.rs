//! Criterion benchmarks for timbral-analysis components
//!
//! Run with: cargo bench -p timbral-analysis

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::f32::consts::PI;
use timbral_analysis::{
    SpectrumOptions, TransformEngine, WaveletPitch, descriptors, lpc_from_signal,
    onset_detection, peak_spectrum, resample, spectrum, transform, yin_difference,
};

const SAMPLE_RATE: f32 = 44100.0;

/// Generate a test sine wave
fn generate_sine(size: usize, frequency: f32) -> Vec<f32> {
    (0..size)
        .map(|i| (2.0 * PI * frequency * i as f32 / SAMPLE_RATE).sin())
        .collect()
}

/// Generate a signal with four decaying harmonics of 440 Hz
fn generate_complex_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (1..=4)
                .map(|h| (2.0 * PI * 440.0 * h as f32 * t).sin() / h as f32)
                .sum::<f32>()
                * 0.5
        })
        .collect()
}

// ============================================================================
// Transform benchmarks
// ============================================================================

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("Transform");

    // power-of-two sizes take the radix-2 path, the rest go through Bluestein
    for size in [256, 300, 1000, 1024, 2048, 4096] {
        let signal = generate_complex_signal(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut re = signal.clone();
                let mut im = vec![0.0f32; size];
                transform(black_box(&mut re), black_box(&mut im)).ok();
                re
            })
        });
    }

    group.finish();
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("TransformEngine");

    for size in [1000, 1024, 4096] {
        let signal = generate_complex_signal(size);
        let mut engine = TransformEngine::new();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut re = signal.clone();
                let mut im = vec![0.0f32; size];
                engine.transform(black_box(&mut re), black_box(&mut im)).ok();
                re
            })
        });
    }

    group.finish();
}

// ============================================================================
// Spectral descriptor benchmarks
// ============================================================================

fn bench_spectrum(c: &mut Criterion) {
    let mut group = c.benchmark_group("Spectrum");

    for size in [512, 2048] {
        let signal = generate_complex_signal(size);
        group.bench_with_input(BenchmarkId::new("amplitude", size), &signal, |b, signal| {
            b.iter(|| spectrum(black_box(signal), SAMPLE_RATE, SpectrumOptions::default()))
        });

        let Ok(spec) = spectrum(&signal, SAMPLE_RATE, SpectrumOptions::default()) else {
            continue;
        };
        let bin_width = SAMPLE_RATE / size as f32;
        group.bench_with_input(BenchmarkId::new("peaks", size), &spec, |b, spec| {
            b.iter(|| peak_spectrum(black_box(spec), bin_width, 5.0))
        });
        group.bench_with_input(BenchmarkId::new("scalar_descriptors", size), &spec, |b, spec| {
            b.iter(|| {
                let spec = black_box(spec);
                (
                    descriptors::spectral_centroid(spec),
                    descriptors::spectral_spread(spec),
                    descriptors::spectral_flatness(spec),
                    descriptors::spectral_slope(spec),
                    descriptors::smoothness(spec),
                )
            })
        });
    }

    group.finish();
}

// ============================================================================
// Pitch benchmarks
// ============================================================================

fn bench_pitch(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pitch");
    let frame = generate_sine(2048, 220.0);

    let wavelet = WaveletPitch::default();
    group.bench_function("wavelet_2048", |b| {
        b.iter(|| wavelet.raw_estimate(black_box(&frame), SAMPLE_RATE))
    });

    group.bench_function("yin_difference_1024", |b| {
        b.iter(|| yin_difference(black_box(&frame[..1024])))
    });

    group.finish();
}

// ============================================================================
// Linear prediction, resampling and onset benchmarks
// ============================================================================

fn bench_lpc(c: &mut Criterion) {
    let mut group = c.benchmark_group("LPC");
    let frame = generate_complex_signal(1024);

    for order in [8, 16, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(order), &order, |b, &order| {
            b.iter(|| lpc_from_signal(black_box(&frame), order))
        });
    }

    group.finish();
}

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("Resample");
    let signal = generate_complex_signal(SAMPLE_RATE as usize / 4);

    for (p, q) in [(2, 1), (1, 2), (3, 2), (160, 147)] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{p}/{q}")),
            &(p, q),
            |b, &(p, q)| b.iter(|| resample(black_box(&signal), p, q, 512)),
        );
    }

    group.finish();
}

fn bench_onset(c: &mut Criterion) {
    let signal = generate_complex_signal(SAMPLE_RATE as usize);
    c.bench_function("onset_1s_frame_1024", |b| {
        b.iter(|| onset_detection(black_box(&signal), 1024))
    });
}

criterion_group!(
    benches,
    bench_transform,
    bench_engine,
    bench_spectrum,
    bench_pitch,
    bench_lpc,
    bench_resample,
    bench_onset,
);

criterion_main!(benches);

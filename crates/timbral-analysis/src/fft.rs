//! Discrete Fourier transform engine with windowing functions.
//!
//! Power-of-two sizes run an iterative radix-2 Cooley-Tukey transform.
//! Every other size goes through Bluestein's chirp z-transform, which
//! re-expresses the DFT as a circular convolution of power-of-two length
//! `m >= 2n + 1`.
//!
//! All transforms are unnormalized. `inverse_transform` is the forward
//! transform with the real and imaginary operands swapped, so a true inverse
//! divides the result by `n`.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::f32::consts::PI;

pub use rustfft::num_complex::Complex;

use crate::error::{AnalysisError, Result};

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Window {
    /// Rectangular (no windowing)
    #[default]
    Rectangular,
    /// Hann window (raised cosine)
    Hann,
    /// Hamming window
    Hamming,
    /// Blackman window
    Blackman,
    /// Blackman-Harris window (better sidelobe suppression)
    BlackmanHarris,
}

impl Window {
    /// All window types, in declaration order.
    pub const ALL: [Window; 5] = [
        Window::Rectangular,
        Window::Hann,
        Window::Hamming,
        Window::Blackman,
        Window::BlackmanHarris,
    ];

    /// Lowercase identifier used in profiles and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Window::Rectangular => "rectangular",
            Window::Hann => "hann",
            Window::Hamming => "hamming",
            Window::Blackman => "blackman",
            Window::BlackmanHarris => "blackman-harris",
        }
    }

    /// Parse a window identifier (case-insensitive, `_` accepted for `-`).
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL.into_iter().find(|w| w.name() == normalized)
    }

    /// Apply window to a buffer
    pub fn apply(&self, buffer: &mut [f32]) {
        let n = buffer.len();
        match self {
            Window::Rectangular => {}
            Window::Hann => {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let w = 0.5 * (1.0 - (2.0 * PI * i as f32 / n as f32).cos());
                    *sample *= w;
                }
            }
            Window::Hamming => {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let w = 0.54 - 0.46 * (2.0 * PI * i as f32 / n as f32).cos();
                    *sample *= w;
                }
            }
            Window::Blackman => {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let x = 2.0 * PI * i as f32 / n as f32;
                    let w = 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos();
                    *sample *= w;
                }
            }
            Window::BlackmanHarris => {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let x = 2.0 * PI * i as f32 / n as f32;
                    let w = 0.35875 - 0.48829 * x.cos() + 0.14128 * (2.0 * x).cos()
                        - 0.01168 * (3.0 * x).cos();
                    *sample *= w;
                }
            }
        }
    }

    /// Get window coefficients
    pub fn coefficients(&self, size: usize) -> Vec<f32> {
        let mut coeffs = vec![1.0; size];
        self.apply(&mut coeffs);
        coeffs
    }
}

/// Precomputed tables for one power-of-two transform size.
///
/// Holds the bit-reversal permutation and `size / 2` cosine/sine twiddles.
/// Twiddles are evaluated in `f64` and rounded once so that large sizes do
/// not accumulate phase error.
#[derive(Debug, Clone)]
pub struct Radix2Plan {
    size: usize,
    bit_reverse: Vec<usize>,
    cos_table: Vec<f32>,
    sin_table: Vec<f32>,
}

impl Radix2Plan {
    /// Build a plan for `size` points.
    ///
    /// Returns [`AnalysisError::InvalidParameter`] unless `size` is a
    /// non-zero power of two.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 || !size.is_power_of_two() {
            return Err(AnalysisError::invalid(
                "size",
                format!("radix-2 plan requires a power of two, got {size}"),
            ));
        }
        Ok(Self::build(size))
    }

    fn build(size: usize) -> Self {
        let levels = size.trailing_zeros();
        let bit_reverse = (0..size)
            .map(|i| {
                i.reverse_bits()
                    .checked_shr(usize::BITS - levels)
                    .unwrap_or(0)
            })
            .collect();

        let half = size / 2;
        let mut cos_table = Vec::with_capacity(half);
        let mut sin_table = Vec::with_capacity(half);
        for i in 0..half {
            let angle = 2.0 * std::f64::consts::PI * i as f64 / size as f64;
            cos_table.push(angle.cos() as f32);
            sin_table.push(angle.sin() as f32);
        }

        Self {
            size,
            bit_reverse,
            cos_table,
            sin_table,
        }
    }

    /// Transform size in points.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward transform of split real/imaginary buffers of exactly `size` points.
    pub fn process(&self, real: &mut [f32], imag: &mut [f32]) -> Result<()> {
        AnalysisError::check_len(self.size, real.len())?;
        AnalysisError::check_len(self.size, imag.len())?;
        self.process_unchecked(real, imag);
        Ok(())
    }

    fn process_unchecked(&self, real: &mut [f32], imag: &mut [f32]) {
        let n = self.size;

        for i in 0..n {
            let j = self.bit_reverse[i];
            if j > i {
                real.swap(i, j);
                imag.swap(i, j);
            }
        }

        let mut span = 2;
        while span <= n {
            let half = span / 2;
            let step = n / span;
            for start in (0..n).step_by(span) {
                for j in 0..half {
                    let k = start + j;
                    let l = k + half;
                    let c = self.cos_table[j * step];
                    let s = self.sin_table[j * step];
                    let tpre = real[l] * c + imag[l] * s;
                    let tpim = -real[l] * s + imag[l] * c;
                    real[l] = real[k] - tpre;
                    imag[l] = imag[k] - tpim;
                    real[k] += tpre;
                    imag[k] += tpim;
                }
            }
            span *= 2;
        }
    }
}

fn plan_for(plans: &mut HashMap<usize, Radix2Plan>, size: usize) -> &Radix2Plan {
    match plans.entry(size) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => entry.insert(Radix2Plan::build(size)),
    }
}

fn transform_split(real: &mut [f32], imag: &mut [f32], plans: &mut HashMap<usize, Radix2Plan>) {
    let n = real.len();
    if n <= 1 {
        return;
    }
    if n.is_power_of_two() {
        plan_for(plans, n).process_unchecked(real, imag);
    } else {
        bluestein(real, imag, plans);
    }
}

/// Chirp z-transform for arbitrary `n`.
fn bluestein(real: &mut [f32], imag: &mut [f32], plans: &mut HashMap<usize, Radix2Plan>) {
    let n = real.len();
    let m = (2 * n + 1).next_power_of_two();

    #[cfg(feature = "tracing")]
    tracing::trace!(n, m, "bluestein transform");

    // chirp[k] = exp(-i*pi*k^2/n); k^2 is reduced mod 2n before the float conversion
    let modulus = 2 * n as u64;
    let mut chirp_cos = Vec::with_capacity(n);
    let mut chirp_sin = Vec::with_capacity(n);
    for k in 0..n as u64 {
        let angle = std::f64::consts::PI * ((k * k) % modulus) as f64 / n as f64;
        chirp_cos.push(angle.cos() as f32);
        chirp_sin.push(angle.sin() as f32);
    }

    let mut a_re = vec![0.0f32; m];
    let mut a_im = vec![0.0f32; m];
    for k in 0..n {
        let (c, s) = (chirp_cos[k], chirp_sin[k]);
        a_re[k] = real[k] * c + imag[k] * s;
        a_im[k] = imag[k] * c - real[k] * s;
    }

    let mut b_re = vec![0.0f32; m];
    let mut b_im = vec![0.0f32; m];
    b_re[0] = chirp_cos[0];
    b_im[0] = chirp_sin[0];
    for k in 1..n {
        b_re[k] = chirp_cos[k];
        b_im[k] = chirp_sin[k];
        b_re[m - k] = chirp_cos[k];
        b_im[m - k] = chirp_sin[k];
    }

    let plan = plan_for(plans, m);
    plan.process_unchecked(&mut a_re, &mut a_im);
    plan.process_unchecked(&mut b_re, &mut b_im);

    for i in 0..m {
        let re = a_re[i] * b_re[i] - a_im[i] * b_im[i];
        let im = a_re[i] * b_im[i] + a_im[i] * b_re[i];
        a_re[i] = re;
        a_im[i] = im;
    }

    // inverse via operand swap
    plan.process_unchecked(&mut a_im, &mut a_re);

    let scale = 1.0 / m as f32;
    for k in 0..n {
        let (c, s) = (chirp_cos[k], chirp_sin[k]);
        let re = a_re[k] * scale;
        let im = a_im[k] * scale;
        real[k] = re * c + im * s;
        imag[k] = im * c - re * s;
    }
}

fn split(buffer: &[Complex<f32>]) -> (Vec<f32>, Vec<f32>) {
    buffer.iter().map(|c| (c.re, c.im)).unzip()
}

fn join(buffer: &mut [Complex<f32>], real: &[f32], imag: &[f32]) {
    for ((c, &re), &im) in buffer.iter_mut().zip(real).zip(imag) {
        *c = Complex::new(re, im);
    }
}

/// Forward DFT of split real/imaginary buffers, in place.
///
/// Sizes 0 and 1 are the identity.
///
/// # Errors
///
/// [`AnalysisError::LengthMismatch`] if the buffers differ in length.
pub fn transform(real: &mut [f32], imag: &mut [f32]) -> Result<()> {
    AnalysisError::check_len(real.len(), imag.len())?;
    transform_split(real, imag, &mut HashMap::new());
    Ok(())
}

/// Unnormalized inverse DFT: the forward transform with operands swapped.
pub fn inverse_transform(real: &mut [f32], imag: &mut [f32]) -> Result<()> {
    transform(imag, real)
}

/// Forward DFT of an interleaved complex buffer, in place.
pub fn transform_complex(buffer: &mut [Complex<f32>]) {
    let (mut real, mut imag) = split(buffer);
    transform_split(&mut real, &mut imag, &mut HashMap::new());
    join(buffer, &real, &imag);
}

/// Unnormalized inverse DFT of an interleaved complex buffer, in place.
pub fn inverse_transform_complex(buffer: &mut [Complex<f32>]) {
    let (mut real, mut imag) = split(buffer);
    transform_split(&mut imag, &mut real, &mut HashMap::new());
    join(buffer, &real, &imag);
}

/// Circular convolution of two complex sequences of equal length.
///
/// Computed as the inverse transform of the pointwise product of both
/// forward transforms, divided by `n`.
pub fn convolve_complex(x: &[Complex<f32>], y: &[Complex<f32>]) -> Result<Vec<Complex<f32>>> {
    AnalysisError::check_len(x.len(), y.len())?;
    let n = x.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut plans = HashMap::new();
    let (mut x_re, mut x_im) = split(x);
    let (mut y_re, mut y_im) = split(y);
    transform_split(&mut x_re, &mut x_im, &mut plans);
    transform_split(&mut y_re, &mut y_im, &mut plans);

    for i in 0..n {
        let re = x_re[i] * y_re[i] - x_im[i] * y_im[i];
        let im = x_re[i] * y_im[i] + x_im[i] * y_re[i];
        x_re[i] = re;
        x_im[i] = im;
    }
    transform_split(&mut x_im, &mut x_re, &mut plans);

    let scale = 1.0 / n as f32;
    Ok(x_re
        .iter()
        .zip(&x_im)
        .map(|(&re, &im)| Complex::new(re * scale, im * scale))
        .collect())
}

/// Circular convolution of two real sequences of equal length.
pub fn convolve_real(x: &[f32], y: &[f32]) -> Result<Vec<f32>> {
    let to_complex = |s: &[f32]| -> Vec<Complex<f32>> {
        s.iter().map(|&v| Complex::new(v, 0.0)).collect()
    };
    let out = convolve_complex(&to_complex(x), &to_complex(y))?;
    Ok(out.into_iter().map(|c| c.re).collect())
}

/// Transform engine that caches radix-2 plans by size.
///
/// Output is identical to the free functions; only table construction is
/// amortized across calls. Bluestein sizes cache their inner power-of-two
/// plan.
#[derive(Debug, Default)]
pub struct TransformEngine {
    plans: HashMap<usize, Radix2Plan>,
}

impl TransformEngine {
    /// Create an engine with an empty plan cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward DFT of split buffers.
    pub fn transform(&mut self, real: &mut [f32], imag: &mut [f32]) -> Result<()> {
        AnalysisError::check_len(real.len(), imag.len())?;
        transform_split(real, imag, &mut self.plans);
        Ok(())
    }

    /// Unnormalized inverse DFT of split buffers.
    pub fn inverse_transform(&mut self, real: &mut [f32], imag: &mut [f32]) -> Result<()> {
        self.transform(imag, real)
    }

    /// Forward DFT of an interleaved complex buffer.
    pub fn forward_complex(&mut self, buffer: &mut [Complex<f32>]) {
        let (mut real, mut imag) = split(buffer);
        transform_split(&mut real, &mut imag, &mut self.plans);
        join(buffer, &real, &imag);
    }

    /// Unnormalized inverse DFT of an interleaved complex buffer.
    pub fn inverse_complex(&mut self, buffer: &mut [Complex<f32>]) {
        let (mut real, mut imag) = split(buffer);
        transform_split(&mut imag, &mut real, &mut self.plans);
        join(buffer, &real, &imag);
    }

    /// Number of distinct power-of-two plans built so far.
    pub fn cached_sizes(&self) -> usize {
        self.plans.len()
    }
}

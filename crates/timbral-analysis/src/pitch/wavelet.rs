//! Multi-resolution wavelet pitch estimation.
//!
//! Each level scans the frame for alternating extrema above an amplitude
//! threshold, builds a histogram of the distances between nearby extrema,
//! and takes the mode distance. The frame is then halved by pairwise
//! averaging (one Haar approximation step) and the process repeats. When
//! two consecutive levels agree on the period, the coarser estimate is
//! accepted.
//!
//! Reference: Larson & Maddox, "Real-time time-domain pitch tracking using
//! wavelets", 2005.

use super::tracker::PitchTrackerState;

/// Tuning for [`WaveletPitch`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveletPitchConfig {
    /// Maximum number of decimation levels.
    pub max_levels: usize,
    /// Highest expected pitch, in Hz. Sets the extrema debounce distance.
    pub max_frequency: f32,
    /// Extrema up to this many positions apart (exclusive) are paired.
    pub difference_levels: usize,
    /// Extrema must exceed this fraction of the peak DC-removed amplitude.
    pub threshold_ratio: f32,
}

impl Default for WaveletPitchConfig {
    fn default() -> Self {
        Self {
            max_levels: 6,
            max_frequency: 3000.0,
            difference_levels: 3,
            threshold_ratio: 0.75,
        }
    }
}

/// Wavelet pitch estimator. Stateless; see [`WaveletPitch::track`] for the
/// smoothed variant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WaveletPitch {
    config: WaveletPitchConfig,
}

struct Extrema {
    mins: Vec<usize>,
    maxs: Vec<usize>,
}

impl WaveletPitch {
    /// Create an estimator with the given tuning.
    pub fn new(config: WaveletPitchConfig) -> Self {
        Self { config }
    }

    /// Current tuning.
    pub fn config(&self) -> &WaveletPitchConfig {
        &self.config
    }

    /// Per-frame estimate without temporal smoothing.
    ///
    /// Only the largest power-of-two prefix of `samples` is used. Silent or
    /// too-short frames yield `None`, as do a non-positive sample rate or
    /// pitch ceiling.
    pub fn raw_estimate(&self, samples: &[f32], sample_rate: f32) -> Option<f32> {
        if samples.len() < 4 || samples.iter().all(|&s| s == 0.0) {
            return None;
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return None;
        }
        let max_frequency = self.config.max_frequency;
        if !(max_frequency.is_finite() && max_frequency > 0.0) {
            return None;
        }

        let len = 1usize << samples.len().ilog2();
        let mut sam = samples[..len].to_vec();

        let dc = sam.iter().sum::<f32>() / len as f32;
        let max_value = sam.iter().copied().fold(0.0f32, f32::max) - dc;
        let min_value = sam.iter().copied().fold(0.0f32, f32::min) - dc;
        let threshold = max_value.max(-min_value) * self.config.threshold_ratio;

        let mut distances = vec![0usize; len];
        let mut previous_mode: Option<f32> = None;
        let mut cur_len = len;

        for level in 0..self.config.max_levels {
            if cur_len < 2 {
                break;
            }
            let delta = (sample_rate / ((1u64 << level) as f32 * max_frequency)).floor() as usize;

            let extrema = find_extrema(&sam[..cur_len], dc, threshold, delta);
            if extrema.mins.len() < 2 && extrema.maxs.len() < 2 {
                #[cfg(feature = "tracing")]
                tracing::trace!(level, "too few extrema");
                return None;
            }

            let reach = self.config.difference_levels.saturating_sub(1);
            distances[..cur_len].fill(0);
            for positions in [&extrema.mins, &extrema.maxs] {
                for (i, &a) in positions.iter().enumerate() {
                    for &b in positions.iter().skip(i + 1).take(reach) {
                        distances[a.abs_diff(b)] += 1;
                    }
                }
            }

            let mode = mode_distance(&distances[..cur_len], delta);

            if let (Some(prev), Some(current)) = (previous_mode, mode) {
                if (2.0 * current - prev).abs() <= 2.0 * delta as f32 {
                    let scale = (1u64 << (level - 1)) as f32;
                    let pitch = sample_rate / (scale * prev);
                    #[cfg(feature = "tracing")]
                    tracing::trace!(level, pitch, "wavelet levels agree");
                    return Some(pitch);
                }
            }
            previous_mode = mode;

            let half = cur_len / 2;
            for i in 0..half {
                sam[i] = (sam[2 * i] + sam[2 * i + 1]) / 2.0;
            }
            cur_len = half;
        }

        None
    }

    /// Estimate this frame's pitch and fold it into the caller's tracker state.
    pub fn track(
        &self,
        state: PitchTrackerState,
        samples: &[f32],
        sample_rate: f32,
    ) -> (PitchTrackerState, Option<f32>) {
        state.advance(self.raw_estimate(samples, sample_rate))
    }
}

/// Alternating extrema beyond `threshold`, each kind debounced by `delta`.
///
/// A maximum is only accepted after an upward zero crossing of the
/// DC-removed signal, a minimum only after a downward one.
fn find_extrema(sam: &[f32], dc: f32, threshold: f32, delta: usize) -> Extrema {
    let mut mins = Vec::new();
    let mut maxs = Vec::new();
    let mut last_min: Option<usize> = None;
    let mut last_max: Option<usize> = None;
    let mut find_max = false;
    let mut find_min = false;
    let mut previous_dv: Option<f32> = None;

    let debounced = |last: Option<usize>, i: usize| last.is_none_or(|l| i > l.saturating_add(delta));

    for i in 2..sam.len() {
        let si = sam[i] - dc;
        let si1 = sam[i - 1] - dc;

        if si1 <= 0.0 && si > 0.0 {
            find_max = true;
        }
        if si1 >= 0.0 && si < 0.0 {
            find_min = true;
        }

        let dv = si - si1;
        if let Some(prev) = previous_dv {
            if find_min && prev < 0.0 && dv >= 0.0 && si.abs() >= threshold && debounced(last_min, i) {
                mins.push(i);
                last_min = Some(i);
                find_min = false;
            }
            if find_max && prev > 0.0 && dv <= 0.0 && si.abs() >= threshold && debounced(last_max, i) {
                maxs.push(i);
                last_max = Some(i);
                find_max = false;
            }
        }
        previous_dv = Some(dv);
    }

    Extrema { mins, maxs }
}

/// Weighted mean of the distance neighbourhood with the most support.
///
/// Support for distance `i` is the histogram mass within `±delta`. On equal
/// support the later candidate wins only if it is exactly twice the current
/// best distance.
fn mode_distance(distances: &[usize], delta: usize) -> Option<f32> {
    let n = distances.len();
    let window = |i: usize| i.saturating_sub(delta)..i.saturating_add(delta).saturating_add(1).min(n);

    let mut best: Option<(usize, usize)> = None;
    for i in 0..n {
        let summed: usize = distances[window(i)].iter().sum();
        best = match best {
            None => Some((i, summed)),
            Some((best_i, best_sum)) if summed == best_sum && i == 2 * best_i => Some((i, summed)),
            Some((_, best_sum)) if summed > best_sum => Some((i, summed)),
            keep => keep,
        };
    }

    let (best_i, _) = best?;
    let (count, weighted) = window(best_i).fold((0usize, 0.0f32), |(c, w), d| {
        (c + distances[d], w + (d * distances[d]) as f32)
    });
    (count > 0).then(|| weighted / count as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine_frames(freq: f32, sr: f32, frame: usize, count: usize) -> Vec<Vec<f32>> {
        let signal: Vec<f32> = (0..frame * count)
            .map(|i| (2.0 * PI * freq * i as f32 / sr).sin())
            .collect();
        signal.chunks(frame).map(<[f32]>::to_vec).collect()
    }

    #[test]
    fn test_raw_estimate_220() {
        let wp = WaveletPitch::default();
        let frame = &sine_frames(220.0, 44100.0, 2048, 1)[0];
        let f = wp.raw_estimate(frame, 44100.0).unwrap();
        assert!((f - 220.0).abs() / 220.0 < 0.02, "estimated {f}");
    }

    #[test]
    fn test_raw_estimate_other_rate() {
        let wp = WaveletPitch::default();
        let frame = &sine_frames(300.0, 22050.0, 2048, 1)[0];
        let f = wp.raw_estimate(frame, 22050.0).unwrap();
        assert!((f - 300.0).abs() / 300.0 < 0.03, "estimated {f}");
    }

    #[test]
    fn test_silence_and_short() {
        let wp = WaveletPitch::default();
        assert_eq!(wp.raw_estimate(&[0.0; 1024], 44100.0), None);
        assert_eq!(wp.raw_estimate(&[1.0, -1.0, 1.0], 44100.0), None);
    }

    #[test]
    fn test_degenerate_pitch_ceiling() {
        let frame = &sine_frames(220.0, 44100.0, 2048, 1)[0];
        for max_frequency in [0.0, -5.0, f32::NAN, 1e-30] {
            let wp = WaveletPitch::new(WaveletPitchConfig {
                max_frequency,
                ..WaveletPitchConfig::default()
            });
            assert_eq!(wp.raw_estimate(frame, 44100.0), None, "max_frequency {max_frequency}");
        }
    }

    #[test]
    fn test_mode_distance_huge_delta() {
        let mut d = vec![0usize; 10];
        d[4] = 1;
        assert_eq!(mode_distance(&d, usize::MAX), Some(4.0));
    }

    #[test]
    fn test_mode_distance_tie_prefers_double() {
        // equal support at 3 and 6 with delta 0
        let mut d = vec![0usize; 10];
        d[3] = 2;
        d[6] = 2;
        assert_eq!(mode_distance(&d, 0), Some(6.0));

        let mut d = vec![0usize; 10];
        d[3] = 2;
        d[7] = 2;
        assert_eq!(mode_distance(&d, 0), Some(3.0));
    }

    #[test]
    fn test_mode_distance_empty() {
        assert_eq!(mode_distance(&[0; 8], 1), None);
    }

    #[test]
    fn test_tracker_converges_and_decays() {
        let sr = 44100.0;
        let wp = WaveletPitch::default();
        let mut state = PitchTrackerState::new();
        let mut last = None;

        for frame in sine_frames(220.0, sr, 2048, 6) {
            let (next, out) = wp.track(state, &frame, sr);
            state = next;
            last = out;
        }
        let f = last.unwrap();
        assert!((f - 220.0).abs() / 220.0 < 0.02, "tracked {f}");
        assert_eq!(state.confidence, super::super::MAX_CONFIDENCE);

        let silence = vec![0.0f32; 2048];
        for expected in (1..5).rev() {
            let (next, out) = wp.track(state, &silence, sr);
            assert_eq!(out, Some(f));
            assert_eq!(next.confidence, expected);
            state = next;
        }
        let (_, out) = wp.track(state, &silence, sr);
        assert_eq!(out, None);
    }
}

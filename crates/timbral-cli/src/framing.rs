//! Splitting a signal into analysis frames.

/// One analysis frame and where it starts in the signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Frame number.
    pub index: usize,
    /// First sample of the frame.
    pub start: usize,
    /// Samples, zero-padded to the frame size at the end of the signal.
    pub samples: Vec<f32>,
}

impl Frame {
    /// Start time in seconds.
    pub fn time(&self, sample_rate: f32) -> f32 {
        self.start as f32 / sample_rate
    }
}

/// Number of frames covering `len` samples: `ceil(len / hop)`.
pub fn frame_count(len: usize, hop_size: usize) -> usize {
    if hop_size == 0 {
        return 0;
    }
    len.div_ceil(hop_size)
}

/// Frames of `frame_size` samples every `hop_size` samples.
///
/// Every hop position inside the signal starts a frame, so the tail is
/// covered by zero-padded frames.
pub fn frames(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
) -> impl Iterator<Item = Frame> + '_ {
    (0..frame_count(samples.len(), hop_size)).map(move |index| {
        let start = index * hop_size;
        let end = (start + frame_size).min(samples.len());
        let mut frame = samples[start..end].to_vec();
        frame.resize(frame_size, 0.0);
        Frame {
            index,
            start,
            samples: frame,
        }
    })
}

//! Temporal smoothing of per-frame pitch estimates.
//!
//! [`PitchTrackerState`] is a small `Copy` value owned by the caller. Each
//! frame passes the current state and the frame's raw estimate to
//! [`PitchTrackerState::advance`], which returns the next state and the
//! smoothed output. Independent streams keep independent states.

/// Upper bound on tracker confidence.
pub const MAX_CONFIDENCE: u8 = 5;

/// Relative error under which two estimates count as the same pitch.
pub const ACCEPTED_ERROR: f32 = 0.2;

/// Confidence at which octave jumps are folded back onto the previous pitch.
const OCTAVE_CONFIDENCE: u8 = MAX_CONFIDENCE - 2;

/// `|reference - candidate| / candidate < ACCEPTED_ERROR`.
fn close(candidate: f32, reference: f32) -> bool {
    (reference - candidate).abs() / candidate < ACCEPTED_ERROR
}

/// Smoothing state carried between frames of one stream.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PitchTrackerState {
    /// Last adopted or held pitch, in Hz.
    pub previous_pitch: Option<f32>,
    /// Trust in `previous_pitch`, in `0..=MAX_CONFIDENCE`.
    pub confidence: u8,
}

impl PitchTrackerState {
    /// Fresh state with no previous pitch.
    pub fn new() -> Self {
        Self::default()
    }

    fn adopt(pitch: f32) -> Self {
        Self {
            previous_pitch: Some(pitch),
            confidence: 1,
        }
    }

    /// Fold one raw estimate into the state.
    ///
    /// Returns the next state and the smoothed pitch, which is `None`
    /// whenever the resulting confidence is zero.
    pub fn advance(self, raw: Option<f32>) -> (Self, Option<f32>) {
        let next = match (raw, self.previous_pitch) {
            (Some(r), None) => Self::adopt(r),
            (Some(r), Some(prev)) if close(r, prev) => Self {
                previous_pitch: Some(r),
                confidence: (self.confidence + 1).min(MAX_CONFIDENCE),
            },
            (Some(r), Some(prev)) if self.confidence >= OCTAVE_CONFIDENCE && close(2.0 * r, prev) => {
                Self {
                    previous_pitch: Some(2.0 * r),
                    ..self
                }
            }
            (Some(r), Some(prev)) if self.confidence >= OCTAVE_CONFIDENCE && close(0.5 * r, prev) => {
                Self {
                    previous_pitch: Some(0.5 * r),
                    ..self
                }
            }
            (Some(_) | None, Some(_)) if self.confidence >= 1 => Self {
                confidence: self.confidence - 1,
                ..self
            },
            (Some(r), Some(_)) => Self::adopt(r),
            (None, Some(_)) => Self::default(),
            (None, None) => self,
        };

        let output = if next.confidence >= 1 {
            next.previous_pitch
        } else {
            None
        };
        (next, output)
    }
}

//! Memory mode: sequence generation, answer validation and playback timing

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::Direction;

/// Longest any single playback or success timer may run
pub const MAX_PHASE_MS: u64 = 60_000;
/// Upper bounds on sequence growth settings
pub const MAX_BASE_LENGTH: usize = 64;
pub const MAX_LENGTH_STEP: usize = 16;

/// Tunable memory-mode rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryTuning {
    /// Sequence length at level 1 (L0)
    pub base_length: usize,
    /// Extra directions per level
    pub length_step: usize,
    /// How long each cue is animated
    pub show_ms: u64,
    /// Blank pause after each cue
    pub gap_ms: u64,
    /// How long the success screen stays up before the next level
    pub success_ms: u64,
}

impl Default for MemoryTuning {
    fn default() -> Self {
        Self {
            base_length: 3,
            length_step: 1,
            show_ms: 650,
            gap_ms: 350,
            success_ms: 1000,
        }
    }
}

impl MemoryTuning {
    /// Length must start positive and strictly grow; cues need a visible
    /// duration; nothing may be large enough to overflow the timers
    pub fn sanitized(mut self) -> Self {
        self.base_length = self.base_length.clamp(1, MAX_BASE_LENGTH);
        self.length_step = self.length_step.clamp(1, MAX_LENGTH_STEP);
        self.show_ms = self.show_ms.clamp(1, MAX_PHASE_MS);
        self.gap_ms = self.gap_ms.min(MAX_PHASE_MS);
        self.success_ms = self.success_ms.min(MAX_PHASE_MS);
        self
    }

    /// `L0 + (level - 1) * step`
    pub fn sequence_length(&self, level: u32) -> usize {
        let steps = level.max(1) as usize - 1;
        self.base_length
            .saturating_add(steps.saturating_mul(self.length_step))
    }

    /// Playback schedule for a sequence of `len` cues starting at `started_ms`
    pub fn playback(&self, len: usize, started_ms: u64) -> Playback {
        Playback {
            len,
            started_ms,
            show_ms: self.show_ms,
            gap_ms: self.gap_ms,
        }
    }
}

/// Draw `len` directions independently and uniformly
pub fn generate_sequence<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Vec<Direction> {
    (0..len)
        .map(|_| {
            if rng.random_bool(0.5) {
                Direction::Up
            } else {
                Direction::Down
            }
        })
        .collect()
}

/// Per-position result of comparing an answer with the sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectnessMap(Vec<bool>);

impl CorrectnessMap {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_correct(&self, index: usize) -> Option<bool> {
        self.0.get(index).copied()
    }

    /// True iff every position matched
    pub fn all_correct(&self) -> bool {
        self.0.iter().all(|&ok| ok)
    }

    /// Indices that did not match
    pub fn mismatches(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, ok)| !**ok)
            .map(|(i, _)| i)
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }
}

/// Compare an answer with the sequence position by position.
///
/// Both must have the same length; the state machine only compares once the
/// answer is complete.
pub fn validate(sequence: &[Direction], input: &[Direction]) -> CorrectnessMap {
    debug_assert_eq!(
        sequence.len(),
        input.len(),
        "answer compared before it was complete"
    );
    CorrectnessMap(
        sequence
            .iter()
            .zip(input)
            .map(|(expected, given)| expected == given)
            .collect(),
    )
}

/// What the playback animation shows at a given moment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PlaybackCue {
    /// Cue `index` is on screen; `progress` runs 0→1 over its show time
    Showing { index: usize, progress: f32 },
    /// Blank pause after cue `index`
    Gap { index: usize },
    /// Every cue has been shown
    Done,
}

/// Time-driven playback of a sequence: each cue is shown, then a gap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Playback {
    pub len: usize,
    pub started_ms: u64,
    pub show_ms: u64,
    pub gap_ms: u64,
}

impl Playback {
    /// Total playback duration
    pub fn duration_ms(&self) -> u64 {
        (self.len as u64).saturating_mul(self.slot_ms())
    }

    /// One cue plus its gap
    fn slot_ms(&self) -> u64 {
        self.show_ms.saturating_add(self.gap_ms)
    }

    pub fn cue_at(&self, now_ms: u64) -> PlaybackCue {
        let elapsed = now_ms.saturating_sub(self.started_ms);
        let slot = self.slot_ms();
        if slot == 0 || elapsed >= self.duration_ms() {
            return PlaybackCue::Done;
        }
        let index = (elapsed / slot) as usize;
        let offset = elapsed % slot;
        if offset < self.show_ms {
            PlaybackCue::Showing {
                index,
                progress: offset as f32 / self.show_ms as f32,
            }
        } else {
            PlaybackCue::Gap { index }
        }
    }

    pub fn is_done(&self, now_ms: u64) -> bool {
        matches!(self.cue_at(now_ms), PlaybackCue::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Direction::{Down, Up};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_sequence_length_formula() {
        let rules = MemoryTuning::default();
        assert_eq!(rules.sequence_length(1), 3);
        assert_eq!(rules.sequence_length(2), 4);
        assert_eq!(rules.sequence_length(10), 12);

        let rules = MemoryTuning {
            base_length: 2,
            length_step: 3,
            ..Default::default()
        };
        assert_eq!(rules.sequence_length(4), 2 + 3 * 3);
    }

    #[test]
    fn test_sanitized_length_strictly_grows() {
        let rules = MemoryTuning {
            base_length: 0,
            length_step: 0,
            ..Default::default()
        }
        .sanitized();
        assert!(rules.sequence_length(1) >= 1);
        assert!(rules.sequence_length(2) > rules.sequence_length(1));
    }

    #[test]
    fn test_sanitized_caps_huge_values() {
        let rules = MemoryTuning {
            base_length: usize::MAX,
            length_step: usize::MAX,
            show_ms: u64::MAX,
            gap_ms: u64::MAX,
            success_ms: u64::MAX,
        }
        .sanitized();
        assert_eq!(rules.base_length, MAX_BASE_LENGTH);
        assert_eq!(rules.length_step, MAX_LENGTH_STEP);
        assert_eq!(rules.show_ms, MAX_PHASE_MS);
        assert_eq!(rules.gap_ms, MAX_PHASE_MS);
        assert_eq!(rules.success_ms, MAX_PHASE_MS);
        assert!(rules.sequence_length(u32::MAX) > rules.sequence_length(1));
    }

    #[test]
    fn test_playback_saturates_instead_of_overflowing() {
        let pb = Playback {
            len: 3,
            started_ms: 0,
            show_ms: u64::MAX,
            gap_ms: 1,
        };
        assert_eq!(pb.duration_ms(), u64::MAX);
        assert_eq!(
            pb.cue_at(5),
            PlaybackCue::Showing {
                index: 0,
                progress: 5.0 / u64::MAX as f32
            }
        );
        assert!(!pb.is_done(u64::MAX - 1));
    }

    #[test]
    fn test_generate_uses_both_directions() {
        let mut rng = Pcg32::seed_from_u64(7);
        let seq = generate_sequence(&mut rng, 200);
        assert_eq!(seq.len(), 200);
        assert!(seq.contains(&Up));
        assert!(seq.contains(&Down));
    }

    #[test]
    fn test_generate_is_deterministic_per_seed() {
        let a = generate_sequence(&mut Pcg32::seed_from_u64(42), 16);
        let b = generate_sequence(&mut Pcg32::seed_from_u64(42), 16);
        assert_eq!(a, b);
    }

    #[test]
    fn test_validate_exact_match() {
        let map = validate(&[Up, Down, Up], &[Up, Down, Up]);
        assert_eq!(map.as_slice(), &[true, true, true]);
        assert!(map.all_correct());
        assert_eq!(map.mismatches().count(), 0);
    }

    #[test]
    fn test_validate_mismatch() {
        let map = validate(&[Up, Down], &[Up, Up]);
        assert_eq!(map.as_slice(), &[true, false]);
        assert!(!map.all_correct());
        assert_eq!(map.mismatches().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    #[should_panic(expected = "before it was complete")]
    fn test_validate_length_mismatch_is_detected() {
        validate(&[Up, Down, Up], &[Up]);
    }

    #[test]
    fn test_playback_schedule() {
        let pb = MemoryTuning::default().playback(2, 1000);
        assert_eq!(pb.duration_ms(), 2000);
        assert_eq!(
            pb.cue_at(1000),
            PlaybackCue::Showing {
                index: 0,
                progress: 0.0
            }
        );
        assert!(matches!(
            pb.cue_at(1325),
            PlaybackCue::Showing { index: 0, .. }
        ));
        assert_eq!(pb.cue_at(1650), PlaybackCue::Gap { index: 0 });
        assert!(matches!(
            pb.cue_at(2000),
            PlaybackCue::Showing { index: 1, .. }
        ));
        assert_eq!(pb.cue_at(2999), PlaybackCue::Gap { index: 1 });
        assert_eq!(pb.cue_at(3000), PlaybackCue::Done);
        assert!(pb.is_done(5000));
        // Before start counts as the very beginning
        assert!(!pb.is_done(0));
    }

    fn direction() -> impl Strategy<Value = Direction> {
        prop_oneof![Just(Up), Just(Down)]
    }

    proptest! {
        #[test]
        fn prop_identical_answer_is_all_correct(seq in prop::collection::vec(direction(), 1..32)) {
            prop_assert!(validate(&seq, &seq).all_correct());
        }

        #[test]
        fn prop_single_flip_marks_exactly_that_index(
            seq in prop::collection::vec(direction(), 1..32),
            pick in any::<prop::sample::Index>(),
        ) {
            let i = pick.index(seq.len());
            let mut answer = seq.clone();
            answer[i] = match answer[i] { Up => Down, Down => Up };
            let map = validate(&seq, &answer);
            prop_assert_eq!(map.len(), seq.len());
            prop_assert_eq!(map.mismatches().collect::<Vec<_>>(), vec![i]);
            prop_assert!(!map.all_correct());
        }
    }
}

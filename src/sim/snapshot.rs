//! Render-facing view of the controller
//!
//! Built fresh each tick from the machine; owns its data so the renderer
//! never holds on to session state.

use glam::Vec2;
use serde::Serialize;

use super::geometry::Rect;
use super::machine::GameStateMachine;
use super::memory::{CorrectnessMap, PlaybackCue};
use super::state::{Direction, GamePhase, GameSession, MemorySession, RunnerSession};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    /// Best memory level ever reached
    pub record: u32,
    pub view: View,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum View {
    /// Mode select or a menu with nothing in play
    Menu,
    Runner(RunnerView),
    Memory(MemoryView),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunnerView {
    pub ship: Rect,
    pub ship_hitbox: Rect,
    pub lives: u8,
    pub score: u32,
    pub level: u8,
    pub icebergs: Vec<Rect>,
    /// Star centers
    pub stars: Vec<Vec2>,
}

/// The cue currently animating during playback
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CueView {
    pub direction: Direction,
    /// 0→1 across the cue's show time
    pub progress: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryView {
    pub level: u32,
    /// Length of the sequence being played or answered
    pub length: usize,
    /// Only set while a cue is on screen
    pub cue: Option<CueView>,
    /// Whole sequence, revealed only once the answer has been judged
    pub sequence: Option<Vec<Direction>>,
    pub input: Vec<Direction>,
    pub correctness: Option<CorrectnessMap>,
}

impl RunnerView {
    fn from_session(run: &RunnerSession) -> Self {
        Self {
            ship: run.ship.bounds(),
            ship_hitbox: run.ship.hitbox(),
            lives: run.ship.lives,
            score: run.score,
            level: run.level,
            icebergs: run.icebergs.iter().map(|i| i.bounds()).collect(),
            stars: run.stars.iter().map(|s| s.pos).collect(),
        }
    }
}

impl GameStateMachine {
    /// View of the current tick, with playback sampled at `now_ms`
    pub fn snapshot(&self, now_ms: u64) -> Snapshot {
        let view = match self.session() {
            GameSession::Idle => View::Menu,
            GameSession::Runner(run) => View::Runner(RunnerView::from_session(run)),
            GameSession::Memory(mem) => View::Memory(self.memory_view(mem, now_ms)),
        };
        Snapshot {
            phase: self.phase(),
            record: self.records().best(),
            view,
        }
    }

    fn memory_view(&self, mem: &MemorySession, now_ms: u64) -> MemoryView {
        let phase = self.phase();

        let cue = if phase == GamePhase::MemoryShow {
            match self
                .memory_tuning()
                .playback(mem.sequence.len(), mem.phase_started_ms)
                .cue_at(now_ms)
            {
                PlaybackCue::Showing { index, progress } => {
                    mem.sequence.get(index).map(|&direction| CueView {
                        direction,
                        progress,
                    })
                }
                PlaybackCue::Gap { .. } | PlaybackCue::Done => None,
            }
        } else {
            None
        };

        let revealed = matches!(phase, GamePhase::MemorySuccess | GamePhase::MemoryGameOver);

        MemoryView {
            level: mem.level,
            length: mem.sequence.len(),
            cue,
            sequence: revealed.then(|| mem.sequence.clone()),
            input: mem.input.clone(),
            correctness: mem.correctness.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputEvent;
    use crate::records::RecordStore;
    use crate::settings::Settings;
    use crate::sim::machine::TickInput;

    fn tick(m: &mut GameStateMachine, now_ms: u64, events: Vec<InputEvent>) {
        m.tick(&TickInput {
            now_ms,
            dt: 1.0 / 60.0,
            events,
        });
    }

    fn memory_machine() -> GameStateMachine {
        let mut m = GameStateMachine::new(&Settings::default(), RecordStore::in_memory(), 9);
        tick(&mut m, 0, vec![InputEvent::pressed(Direction::Down)]);
        tick(&mut m, 1000, vec![InputEvent::Confirm]);
        m
    }

    fn memory_view(snap: &Snapshot) -> &MemoryView {
        match &snap.view {
            View::Memory(view) => view,
            other => panic!("expected memory view, got {:?}", other),
        }
    }

    #[test]
    fn test_mode_select_is_menu() {
        let m = GameStateMachine::new(&Settings::default(), RecordStore::in_memory(), 1);
        let snap = m.snapshot(0);
        assert_eq!(snap.phase, GamePhase::ModeSelect);
        assert_eq!(snap.view, View::Menu);
        assert_eq!(snap.record, 0);
    }

    #[test]
    fn test_runner_view() {
        let mut m = GameStateMachine::new(&Settings::default(), RecordStore::in_memory(), 1);
        tick(&mut m, 0, vec![InputEvent::pressed(Direction::Up)]);
        tick(&mut m, 16, vec![InputEvent::Confirm]);
        tick(&mut m, 1100, vec![]);

        let snap = m.snapshot(1100);
        let View::Runner(view) = &snap.view else {
            panic!("expected runner view");
        };
        assert_eq!(view.lives, 3);
        assert_eq!(view.level, 1);
        assert_eq!(view.icebergs.len(), 2);
        assert_eq!(view.stars.len(), 1);
        assert!(view.ship_hitbox.width() < view.ship.width());
    }

    #[test]
    fn test_playback_exposes_only_current_cue() {
        let m = memory_machine();
        let snap = m.snapshot(1000);
        assert_eq!(snap.phase, GamePhase::MemoryShow);
        let view = memory_view(&snap);
        let first = m.session().memory().unwrap().sequence[0];
        assert_eq!(
            view.cue,
            Some(CueView {
                direction: first,
                progress: 0.0
            })
        );
        assert_eq!(view.sequence, None);
        assert_eq!(view.length, 3);

        // Inside the gap after the first cue nothing is shown
        let gap = 1000 + m.memory_tuning().show_ms;
        assert_eq!(memory_view(&m.snapshot(gap)).cue, None);
    }

    #[test]
    fn test_game_over_reveals_everything() {
        let mut m = memory_machine();
        let done = 1000 + m.memory_tuning().playback(3, 0).duration_ms();
        tick(&mut m, done, vec![]);
        assert_eq!(m.phase(), GamePhase::MemoryInput);
        assert_eq!(memory_view(&m.snapshot(done)).sequence, None);

        let sequence = m.session().memory().unwrap().sequence.clone();
        let wrong = match sequence[0] {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        };
        let mut answer = vec![wrong];
        answer.extend_from_slice(&sequence[1..]);
        let events = answer.iter().map(|&d| InputEvent::pressed(d)).collect();
        tick(&mut m, done + 10, events);
        assert_eq!(m.phase(), GamePhase::MemoryGameOver);

        let snap = m.snapshot(done + 10);
        let view = memory_view(&snap);
        assert_eq!(view.sequence.as_deref(), Some(sequence.as_slice()));
        assert_eq!(view.input, answer);
        let map = view.correctness.as_ref().unwrap();
        assert_eq!(map.mismatches().collect::<Vec<_>>(), vec![0]);
        assert_eq!(snap.record, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let m = memory_machine();
        let json = serde_json::to_string(&m.snapshot(1000)).unwrap();
        assert!(json.contains("\"phase\":\"MemoryShow\""));
        assert!(json.contains("\"kind\":\"memory\""));
    }
}

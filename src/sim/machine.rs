//! Top-level game controller
//!
//! Phase changes go through one table, [`transition`], keyed by
//! (phase, signal). Entering a phase runs its entry action, which is where
//! session data is created or reset. Nothing else assigns the phase.

use super::difficulty::DifficultyController;
use super::memory::{MemoryTuning, generate_sequence, validate};
use super::runner::{RunnerOutcome, Steer};
use super::state::{Direction, GamePhase, GameSession, MemorySession, Mode, RunnerSession};
use crate::consts::MAX_DT;
use crate::input::{InputEvent, Press};
use crate::records::RecordStore;
use crate::settings::Settings;

/// Input for one tick of the controller
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Monotonic clock, sampled once at the start of the tick
    pub now_ms: u64,
    /// Seconds since the previous tick
    pub dt: f32,
    /// This tick's merged input, in order
    pub events: Vec<InputEvent>,
}

/// Everything that can move the controller between phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// A direction went down (keyboard press or pad byte)
    Pressed(Direction),
    ChooseMode(Mode),
    Confirm,
    Back,
    LivesExhausted,
    PlaybackFinished,
    AnswerCorrect,
    AnswerWrong,
    SuccessShown,
}

/// The transition table. `None` means the signal is ignored in that phase.
pub fn transition(phase: GamePhase, signal: Signal) -> Option<GamePhase> {
    use GamePhase::*;

    match (phase, signal) {
        (ModeSelect, Signal::ChooseMode(Mode::Titanic))
        | (ModeSelect, Signal::Pressed(Direction::Up)) => Some(TitanicMenu),
        (ModeSelect, Signal::ChooseMode(Mode::Memory))
        | (ModeSelect, Signal::Pressed(Direction::Down)) => Some(MemoryReady),
        (ModeSelect, _) => None,

        (_, Signal::Back) => Some(ModeSelect),

        (TitanicMenu, Signal::Confirm) | (TitanicMenu, Signal::Pressed(_)) => Some(TitanicPlaying),
        (TitanicPlaying, Signal::LivesExhausted) => Some(TitanicGameOver),
        (TitanicGameOver, Signal::Confirm) => Some(TitanicPlaying),

        (MemoryReady, Signal::Confirm) | (MemoryReady, Signal::Pressed(_)) => Some(MemoryShow),
        (MemoryShow, Signal::PlaybackFinished) => Some(MemoryInput),
        (MemoryInput, Signal::AnswerCorrect) => Some(MemorySuccess),
        (MemoryInput, Signal::AnswerWrong) => Some(MemoryGameOver),
        (MemorySuccess, Signal::SuccessShown) => Some(MemoryShow),
        (MemoryGameOver, Signal::Confirm) => Some(MemoryReady),

        _ => None,
    }
}

/// Owns the phase, the active session and the record
#[derive(Debug)]
pub struct GameStateMachine {
    phase: GamePhase,
    session: GameSession,
    difficulty: DifficultyController,
    memory: MemoryTuning,
    records: RecordStore,
    seed: u64,
    sessions_started: u64,
}

impl GameStateMachine {
    pub fn new(settings: &Settings, records: RecordStore, seed: u64) -> Self {
        Self {
            phase: GamePhase::ModeSelect,
            session: GameSession::Idle,
            difficulty: DifficultyController::new(settings.difficulty.clone()),
            memory: settings.memory.clone().sanitized(),
            records,
            seed,
            sessions_started: 0,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn memory_tuning(&self) -> &MemoryTuning {
        &self.memory
    }

    /// Run exactly one tick: route events, then advance timers and the runner.
    ///
    /// Input changes the phase at most once per tick. Events after that change
    /// still steer a run in progress but are not routed, so a key and a pad
    /// press landing in the same tick cannot skip a menu.
    pub fn tick(&mut self, input: &TickInput) {
        let now = input.now_ms;
        let mut steer = Steer::default();
        let mut switched = false;

        for event in &input.events {
            if let InputEvent::Move { direction, .. } = *event {
                if self.phase == GamePhase::TitanicPlaying {
                    match direction {
                        Direction::Up => steer.up = true,
                        Direction::Down => steer.down = true,
                    }
                }
            }
            if switched {
                log::trace!("{:?} dropped after this tick's phase change", event);
                continue;
            }

            let before = self.phase;
            match *event {
                InputEvent::Move {
                    direction,
                    press: Press::Pressed,
                } => self.on_pressed(direction, now),
                InputEvent::Move { .. } => {}
                InputEvent::ChooseMode(mode) => self.fire(Signal::ChooseMode(mode), now),
                InputEvent::Confirm => self.fire(Signal::Confirm, now),
                InputEvent::Back => self.fire(Signal::Back, now),
            }
            switched = self.phase != before;
        }

        self.advance(steer, input.dt.clamp(0.0, MAX_DT), now);
    }

    fn on_pressed(&mut self, direction: Direction, now_ms: u64) {
        if self.phase != GamePhase::MemoryInput {
            self.fire(Signal::Pressed(direction), now_ms);
            return;
        }

        let GameSession::Memory(mem) = &mut self.session else {
            return;
        };
        mem.input.push(direction);
        if mem.input.len() < mem.sequence.len() {
            return;
        }

        let map = validate(&mem.sequence, &mem.input);
        let correct = map.all_correct();
        mem.correctness = Some(map);
        let signal = if correct {
            Signal::AnswerCorrect
        } else {
            Signal::AnswerWrong
        };
        self.fire(signal, now_ms);
    }

    /// Time-driven work for the current phase
    fn advance(&mut self, steer: Steer, dt: f32, now_ms: u64) {
        let signal = match (&mut self.session, self.phase) {
            (GameSession::Runner(run), GamePhase::TitanicPlaying) => {
                match run.step(steer, now_ms, dt, &self.difficulty) {
                    RunnerOutcome::Running => None,
                    RunnerOutcome::Ended { score, level } => {
                        log::info!("Titanic run over: score {}, level {}", score, level);
                        Some(Signal::LivesExhausted)
                    }
                }
            }
            (GameSession::Memory(mem), GamePhase::MemoryShow) => self
                .memory
                .playback(mem.sequence.len(), mem.phase_started_ms)
                .is_done(now_ms)
                .then_some(Signal::PlaybackFinished),
            (GameSession::Memory(mem), GamePhase::MemorySuccess) => {
                let shown = now_ms.saturating_sub(mem.phase_started_ms);
                (shown >= self.memory.success_ms).then_some(Signal::SuccessShown)
            }
            _ => None,
        };

        if let Some(signal) = signal {
            self.fire(signal, now_ms);
        }
    }

    /// Apply a signal through the transition table
    pub fn fire(&mut self, signal: Signal, now_ms: u64) {
        let Some(next) = transition(self.phase, signal) else {
            log::trace!("{:?} ignored in {:?}", signal, self.phase);
            return;
        };
        log::debug!("{:?} --{:?}--> {:?}", self.phase, signal, next);
        let from = self.phase;
        self.phase = next;
        self.enter(from, now_ms);
    }

    fn next_seed(&mut self) -> u64 {
        self.sessions_started += 1;
        self.seed
            .wrapping_add(self.sessions_started.wrapping_mul(2_654_435_761))
    }

    /// Entry action for the phase just entered
    fn enter(&mut self, from: GamePhase, now_ms: u64) {
        match self.phase {
            GamePhase::ModeSelect => {
                self.session = GameSession::Idle;
            }
            GamePhase::TitanicMenu => {
                self.session = GameSession::Idle;
            }
            GamePhase::TitanicPlaying => {
                let seed = self.next_seed();
                self.session = GameSession::Runner(RunnerSession::new(seed, now_ms));
            }
            GamePhase::TitanicGameOver => {}
            GamePhase::MemoryReady => {
                let seed = self.next_seed();
                self.session = GameSession::Memory(MemorySession::new(seed, now_ms));
            }
            GamePhase::MemoryShow => {
                let GameSession::Memory(mem) = &mut self.session else {
                    return;
                };
                if from == GamePhase::MemorySuccess {
                    mem.level += 1;
                    log::info!("Memory level {}", mem.level);
                    self.records.update(mem.level);
                }
                let len = self.memory.sequence_length(mem.level);
                mem.sequence = generate_sequence(&mut mem.rng, len);
                mem.input.clear();
                mem.correctness = None;
                mem.phase_started_ms = now_ms;
            }
            GamePhase::MemoryInput => {
                if let GameSession::Memory(mem) = &mut self.session {
                    mem.input.clear();
                    mem.phase_started_ms = now_ms;
                }
            }
            GamePhase::MemorySuccess => {
                if let GameSession::Memory(mem) = &mut self.session {
                    mem.phase_started_ms = now_ms;
                }
            }
            GamePhase::MemoryGameOver => {
                if let GameSession::Memory(mem) = &mut self.session {
                    log::info!("Memory run over at level {}", mem.level);
                    self.records.update(mem.level);
                }
            }
        }
    }
}

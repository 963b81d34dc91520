//! Game state and core entity types
//!
//! Everything a run needs lives in a [`GameSession`], which the state machine
//! owns exclusively and replaces wholesale when a mode is (re-)entered.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::memory::CorrectnessMap;
use crate::consts::*;

/// A logical direction, regardless of which device produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Wire byte used by the serial pad
    pub fn as_byte(self) -> u8 {
        match self {
            Direction::Up => b'U',
            Direction::Down => b'D',
        }
    }
}

/// The two game modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Endless runner: steer the ship between icebergs, collect stars
    Titanic,
    /// Repeat an ever-growing sequence of directions
    Memory,
}

/// Current phase of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Choosing between Titanic and Memory
    ModeSelect,
    /// Titanic instructions, waiting for start
    TitanicMenu,
    /// Active runner
    TitanicPlaying,
    /// Lives exhausted
    TitanicGameOver,
    /// Memory run prepared, waiting for start
    MemoryReady,
    /// Sequence playback (time-driven, input ignored)
    MemoryShow,
    /// Collecting the player's answer
    MemoryInput,
    /// Brief "correct" display before the next level
    MemorySuccess,
    /// Answer mismatched
    MemoryGameOver,
}

impl GamePhase {
    /// Mode this phase belongs to (None for mode selection)
    pub fn mode(&self) -> Option<Mode> {
        match self {
            GamePhase::ModeSelect => None,
            GamePhase::TitanicMenu | GamePhase::TitanicPlaying | GamePhase::TitanicGameOver => {
                Some(Mode::Titanic)
            }
            GamePhase::MemoryReady
            | GamePhase::MemoryShow
            | GamePhase::MemoryInput
            | GamePhase::MemorySuccess
            | GamePhase::MemoryGameOver => Some(Mode::Memory),
        }
    }

    /// Run ended; only restart or back are accepted
    pub fn is_game_over(&self) -> bool {
        matches!(self, GamePhase::TitanicGameOver | GamePhase::MemoryGameOver)
    }
}

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    /// Center of the visual box
    pub pos: Vec2,
    /// Vertical velocity (px/s, positive is down)
    pub vel_y: f32,
    /// Lives remaining (0..=INITIAL_LIVES)
    pub lives: u8,
    pub size: Vec2,
}

impl Default for Ship {
    fn default() -> Self {
        Self {
            pos: Vec2::new(SHIP_START_X, CANVAS_HEIGHT / 2.0),
            vel_y: 0.0,
            lives: INITIAL_LIVES,
            size: Vec2::new(SHIP_WIDTH, SHIP_HEIGHT),
        }
    }
}

impl Ship {
    /// Visual bounding box
    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.pos, self.size)
    }

    /// Collision box: the visual box shrunk around its center
    pub fn hitbox(&self) -> Rect {
        self.bounds().shrink(SHIP_HITBOX_SHRINK)
    }

    /// Set velocity from the active directions; opposing inputs cancel
    pub fn steer(&mut self, up: bool, down: bool) {
        self.vel_y = match (up, down) {
            (true, false) => -SHIP_SPEED,
            (false, true) => SHIP_SPEED,
            _ => 0.0,
        };
    }

    /// Integrate velocity and clamp to the playable band
    pub fn advance(&mut self, dt: f32) {
        let half_h = self.size.y / 2.0;
        let min_y = SHIP_MARGIN + half_h;
        let max_y = CANVAS_HEIGHT - SHIP_MARGIN - half_h;
        self.pos.y = (self.pos.y + self.vel_y * dt).clamp(min_y, max_y);
    }

    /// Remove one life; returns true when none are left
    pub fn lose_life(&mut self) -> bool {
        debug_assert!(self.lives > 0, "ship hit with no lives remaining");
        self.lives = self.lives.saturating_sub(1);
        self.lives == 0
    }
}

/// An iceberg (one half of a gate)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Iceberg {
    pub id: u32,
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Session clock time it entered play
    pub spawned_at_ms: u64,
}

impl Iceberg {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Thin vertical strip through the middle of the visual box
    pub fn hitbox(&self) -> Rect {
        self.bounds().scale_width(ICEBERG_HITBOX_SCALE_X)
    }

    pub fn advance(&mut self, speed: f32, dt: f32) {
        self.x -= speed * dt;
    }

    pub fn is_off_screen(&self) -> bool {
        self.x + self.width < -ICEBERG_CULL_MARGIN
    }
}

/// A collectible star sitting in a gate opening
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Star {
    pub id: u32,
    /// Center
    pub pos: Vec2,
    pub collected: bool,
}

impl Star {
    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.pos, Vec2::splat(STAR_SIZE))
    }

    pub fn advance(&mut self, speed: f32, dt: f32) {
        self.pos.x -= speed * dt;
    }

    pub fn is_off_screen(&self) -> bool {
        self.pos.x + STAR_SIZE / 2.0 < -ICEBERG_CULL_MARGIN
    }
}

/// State of one Titanic run
#[derive(Debug, Clone)]
pub struct RunnerSession {
    pub ship: Ship,
    pub icebergs: Vec<Iceberg>,
    pub stars: Vec<Star>,
    pub score: u32,
    /// Difficulty level, never decreases within a run
    pub level: u8,
    /// Session clock time of the next gate spawn
    pub next_spawn_ms: u64,
    pub(crate) rng: Pcg32,
    next_id: u32,
}

impl RunnerSession {
    /// Fresh run: full lives, no score, first gate after a short delay
    pub fn new(seed: u64, now_ms: u64) -> Self {
        Self {
            ship: Ship::default(),
            icebergs: Vec::new(),
            stars: Vec::new(),
            score: 0,
            level: 1,
            next_spawn_ms: now_ms.saturating_add(FIRST_SPAWN_DELAY_MS),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// State of one Memory run
#[derive(Debug, Clone)]
pub struct MemorySession {
    /// Current level (1-based)
    pub level: u32,
    /// Sequence to reproduce for this level
    pub sequence: Vec<Direction>,
    /// Directions entered so far
    pub input: Vec<Direction>,
    /// Set once the answer has been compared
    pub correctness: Option<CorrectnessMap>,
    /// Session clock time the current phase began (playback / success timers)
    pub phase_started_ms: u64,
    pub(crate) rng: Pcg32,
}

impl MemorySession {
    pub fn new(seed: u64, now_ms: u64) -> Self {
        Self {
            level: 1,
            sequence: Vec::new(),
            input: Vec::new(),
            correctness: None,
            phase_started_ms: now_ms,
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

/// Everything owned by the active mode
#[derive(Debug, Clone, Default)]
pub enum GameSession {
    /// Mode selection, nothing in play
    #[default]
    Idle,
    Runner(RunnerSession),
    Memory(MemorySession),
}

impl GameSession {
    pub fn runner(&self) -> Option<&RunnerSession> {
        match self {
            GameSession::Runner(run) => Some(run),
            _ => None,
        }
    }

    pub fn memory(&self) -> Option<&MemorySession> {
        match self {
            GameSession::Memory(mem) => Some(mem),
            _ => None,
        }
    }
}

//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure and deterministic:
//! - Time comes in through [`TickInput`], never from a clock
//! - Seeded RNG only
//! - No terminal, device or file access (the record store is the one
//!   collaborator with storage, and it never fails the tick)

pub mod collision;
pub mod difficulty;
pub mod geometry;
pub mod machine;
pub mod memory;
pub mod runner;
pub mod snapshot;
pub mod state;

pub use collision::{CollisionReport, resolve_collisions, ship_collects_star, ship_hits_iceberg};
pub use difficulty::{DifficultyController, DifficultyParams, DifficultyTuning, MAX_LEVEL};
pub use geometry::Rect;
pub use machine::{GameStateMachine, Signal, TickInput, transition};
pub use memory::{
    CorrectnessMap, MemoryTuning, Playback, PlaybackCue, generate_sequence, validate,
};
pub use runner::{RunnerOutcome, Steer};
pub use snapshot::{CueView, MemoryView, RunnerView, Snapshot, View};
pub use state::{
    Direction, GamePhase, GameSession, Iceberg, MemorySession, Mode, RunnerSession, Ship, Star,
};

//! Titanic + Memory - a two-mode arcade controller
//!
//! Core modules:
//! - `sim`: Deterministic game logic (state machine, runner, memory, collisions)
//! - `input`: Keyboard + serial pad unified into logical direction events
//! - `records`: Best memory level, persisted across runs
//! - `settings`: Data-driven tuning and device configuration

pub mod input;
pub mod records;
pub mod settings;
pub mod sim;

pub use input::{InputEvent, InputSource, Press};
pub use records::RecordStore;
pub use settings::Settings;
pub use sim::{Direction, GamePhase, GameStateMachine, Mode, Snapshot, TickInput};

/// Game configuration constants
pub mod consts {
    /// Logical canvas dimensions (owned by the renderer, mirrored here for bounds)
    pub const CANVAS_WIDTH: f32 = 960.0;
    pub const CANVAS_HEIGHT: f32 = 540.0;

    /// Drive loop rate
    pub const TARGET_FPS: u32 = 60;
    /// Nominal frame time
    pub const SIM_DT: f32 = 1.0 / TARGET_FPS as f32;
    /// Largest dt a single tick may integrate (stalls are not replayed)
    pub const MAX_DT: f32 = 0.1;

    /// Ship visual box and placement
    pub const SHIP_WIDTH: f32 = 96.0;
    pub const SHIP_HEIGHT: f32 = 64.0;
    pub const SHIP_START_X: f32 = CANVAS_WIDTH / 4.0;
    /// Vertical speed while a direction is active (px/s; 4.5 px per 60 Hz frame)
    pub const SHIP_SPEED: f32 = 270.0;
    /// Gap kept between the ship and the top/bottom of the canvas
    pub const SHIP_MARGIN: f32 = 20.0;
    /// Fraction of each dimension removed from the ship box to get its hitbox
    pub const SHIP_HITBOX_SHRINK: f32 = 0.2;
    pub const INITIAL_LIVES: u8 = 3;

    /// Iceberg geometry
    pub const ICEBERG_WIDTH: f32 = 120.0;
    /// Hitbox keeps 1% of the visual width
    pub const ICEBERG_HITBOX_SCALE_X: f32 = 0.01;
    pub const ICEBERG_SPAWN_X: f32 = CANVAS_WIDTH + 40.0;
    /// Icebergs are culled once their right edge passes this far off-screen
    pub const ICEBERG_CULL_MARGIN: f32 = 10.0;
    /// Gate centers stay this far from the top and bottom
    pub const GATE_CENTER_MARGIN: f32 = 140.0;
    /// Delay before the first gate of a run (and after a restart)
    pub const FIRST_SPAWN_DELAY_MS: u64 = 1000;

    /// Star pickup size
    pub const STAR_SIZE: f32 = 32.0;
    /// Extra clearance between a star and the icebergs around it
    pub const STAR_GAP_MARGIN: f32 = 8.0;
}

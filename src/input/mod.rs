//! Input unification
//!
//! Two producers feed one ordered event list per tick:
//! - the keyboard (held/pressed latch, not debounced)
//! - the serial pad (decoded bytes, debounced on receipt)
//!
//! The game never learns which one an event came from.

pub mod debounce;
pub mod device;
pub mod keyboard;

pub use debounce::Debouncer;
pub use device::{ByteSource, DeviceError, SerialDevice, decode_byte, pick_pad_port, resolve_port};
pub use keyboard::{KeyAction, KeyboardState, ReleaseTiming, bind_key, should_quit};

use crate::sim::{Direction, Mode};

/// How a direction arrived this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    /// Went down this tick (every device byte is a press)
    Pressed,
    /// Still down from an earlier tick
    Held,
}

/// A logical input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Move { direction: Direction, press: Press },
    ChooseMode(Mode),
    Confirm,
    Back,
}

impl InputEvent {
    pub fn pressed(direction: Direction) -> Self {
        InputEvent::Move {
            direction,
            press: Press::Pressed,
        }
    }
}

/// Keyboard + optional serial pad, polled once per tick
pub struct InputSource {
    keyboard: KeyboardState,
    device: Option<Box<dyn ByteSource>>,
    debouncer: Debouncer,
    buf: Vec<u8>,
}

impl InputSource {
    pub fn new(
        keyboard: KeyboardState,
        device: Option<Box<dyn ByteSource>>,
        debounce_ms: u64,
    ) -> Self {
        Self {
            keyboard,
            device,
            debouncer: Debouncer::new(debounce_ms),
            buf: Vec::new(),
        }
    }

    /// Keyboard only
    pub fn keyboard_only(keyboard: KeyboardState) -> Self {
        Self::new(keyboard, None, 0)
    }

    pub fn keyboard_mut(&mut self) -> &mut KeyboardState {
        &mut self.keyboard
    }

    /// False once the pad is absent or has failed
    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    /// Collect this tick's events: keyboard first, then accepted pad presses.
    ///
    /// Never fails. A pad error is logged and the pad is dropped for the rest
    /// of the process.
    pub fn poll(&mut self, now_ms: u64) -> Vec<InputEvent> {
        let mut events = self.keyboard.drain(now_ms);

        let Some(device) = self.device.as_mut() else {
            return events;
        };

        self.buf.clear();
        if let Err(e) = device.read_available(&mut self.buf) {
            log::warn!("Serial pad lost ({}), continuing with keyboard only", e);
            self.device = None;
            return events;
        }

        for &byte in &self.buf {
            let Some(direction) = decode_byte(byte) else {
                log::trace!("Ignoring pad byte {:#04x}", byte);
                continue;
            };
            if self.debouncer.accept(now_ms) {
                events.push(InputEvent::pressed(direction));
            } else {
                log::trace!("Debounced pad {:?} at {} ms", direction, now_ms);
            }
        }
        events
    }
}

impl std::fmt::Debug for InputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputSource")
            .field("keyboard", &self.keyboard)
            .field("has_device", &self.device.is_some())
            .field("debouncer", &self.debouncer)
            .finish()
    }
}

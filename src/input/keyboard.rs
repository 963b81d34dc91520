//! Keyboard binding and held/pressed tracking
//!
//! Terminals differ in what they report: some send Release events, many only
//! send a stream of Press events while a key is held. Direction keys are
//! latched so each tick sees one `Pressed` on the first tick a key goes down
//! and `Held` afterwards.
//!
//! Without release reporting, a held key looks like one press, a pause of the
//! OS autorepeat delay, then a fast stream of presses. A key counts as
//! released once nothing has been seen for the release timeout. A press that
//! comes back within the repeat window of the last fresh press is only a
//! candidate: if another press follows within the release timeout it was
//! autorepeat and stays `Held`, otherwise it was a second tap and is reported
//! as `Pressed` when it times out.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use serde::{Deserialize, Serialize};

use super::{InputEvent, Press};
use crate::sim::{Direction, Mode};

/// Key considered released after this long without a press/repeat
pub const DEFAULT_RELEASE_TIMEOUT_MS: u64 = 150;
/// Longest autorepeat delay recognised after a fresh press
pub const DEFAULT_REPEAT_WINDOW_MS: u64 = 1000;

const MAX_RELEASE_TIMEOUT_MS: u64 = 1000;
const MAX_REPEAT_WINDOW_MS: u64 = 5000;

/// Release detection for terminals that never report key releases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseTiming {
    pub release_timeout_ms: u64,
    pub repeat_window_ms: u64,
}

impl Default for ReleaseTiming {
    fn default() -> Self {
        Self {
            release_timeout_ms: DEFAULT_RELEASE_TIMEOUT_MS,
            repeat_window_ms: DEFAULT_REPEAT_WINDOW_MS,
        }
    }
}

impl ReleaseTiming {
    pub fn sanitized(mut self) -> Self {
        self.release_timeout_ms = self.release_timeout_ms.clamp(1, MAX_RELEASE_TIMEOUT_MS);
        self.repeat_window_ms = self.repeat_window_ms.min(MAX_REPEAT_WINDOW_MS);
        self
    }
}

/// What a key means to the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Move(Direction),
    ChooseMode(Mode),
    Confirm,
    Back,
}

/// Resolve a key code to its logical action
pub fn bind_key(code: KeyCode) -> Option<KeyAction> {
    match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => {
            Some(KeyAction::Move(Direction::Up))
        }
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => {
            Some(KeyAction::Move(Direction::Down))
        }
        KeyCode::Char('1') => Some(KeyAction::ChooseMode(Mode::Titanic)),
        KeyCode::Char('2') => Some(KeyAction::ChooseMode(Mode::Memory)),
        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('r') | KeyCode::Char('R') => {
            Some(KeyAction::Confirm)
        }
        KeyCode::Char('m') | KeyCode::Char('M') => Some(KeyAction::Back),
        _ => None,
    }
}

/// Esc, Q or Ctrl-C
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(
        key.code,
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q')
    ) || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

#[derive(Debug, Clone, Copy, Default)]
struct Latch {
    /// Key currently down
    down: bool,
    /// Went down since the last drain
    pending_press: bool,
    /// Came back inside the repeat window; tap or autorepeat not yet known
    candidate: bool,
    last_seen_ms: u64,
    /// Last press that counted as a fresh key-down
    pressed_at_ms: Option<u64>,
}

impl Latch {
    fn press(&mut self, now_ms: u64, timing: Option<ReleaseTiming>) {
        if self.down {
            // Anything arriving while a candidate is down is autorepeat
            self.candidate = false;
        } else {
            self.down = true;
            let in_window = match (timing, self.pressed_at_ms) {
                (Some(t), Some(at)) => now_ms.saturating_sub(at) <= t.repeat_window_ms,
                _ => false,
            };
            if in_window {
                self.candidate = true;
            } else {
                self.pending_press = true;
                self.pressed_at_ms = Some(now_ms);
            }
        }
        self.last_seen_ms = now_ms;
    }

    fn release(&mut self) {
        self.down = false;
        if self.candidate {
            self.candidate = false;
            self.pending_press = true;
        }
        self.pressed_at_ms = None;
    }

    fn expire(&mut self, now_ms: u64, timing: ReleaseTiming) {
        if self.down && now_ms.saturating_sub(self.last_seen_ms) > timing.release_timeout_ms {
            self.down = false;
            if self.candidate {
                // Nothing followed it, so it was a second tap
                self.candidate = false;
                self.pending_press = true;
                self.pressed_at_ms = Some(self.last_seen_ms);
            }
        }
    }

    fn take(&mut self) -> Option<Press> {
        if self.pending_press {
            self.pending_press = false;
            Some(Press::Pressed)
        } else if self.down {
            Some(Press::Held)
        } else {
            None
        }
    }
}

/// Keyboard producer for [`super::InputSource`]
#[derive(Debug, Clone)]
pub struct KeyboardState {
    up: Latch,
    down: Latch,
    /// Discrete command keys seen since the last drain, in arrival order
    commands: Vec<InputEvent>,
    /// None when the terminal reports key releases
    timing: Option<ReleaseTiming>,
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self::new(Some(ReleaseTiming::default()))
    }
}

impl KeyboardState {
    pub fn new(timing: Option<ReleaseTiming>) -> Self {
        Self {
            up: Latch::default(),
            down: Latch::default(),
            commands: Vec::new(),
            timing: timing.map(ReleaseTiming::sanitized),
        }
    }

    fn latch(&mut self, direction: Direction) -> &mut Latch {
        match direction {
            Direction::Up => &mut self.up,
            Direction::Down => &mut self.down,
        }
    }

    /// Feed a raw terminal key event
    pub fn handle_key(&mut self, key: KeyEvent, now_ms: u64) {
        match key.kind {
            KeyEventKind::Press => self.press(key.code, now_ms),
            KeyEventKind::Repeat => self.repeat(key.code, now_ms),
            KeyEventKind::Release => self.release(key.code),
        }
    }

    pub fn press(&mut self, code: KeyCode, now_ms: u64) {
        match bind_key(code) {
            Some(KeyAction::Move(direction)) => {
                let timing = self.timing;
                self.latch(direction).press(now_ms, timing);
            }
            Some(KeyAction::ChooseMode(mode)) => self.commands.push(InputEvent::ChooseMode(mode)),
            Some(KeyAction::Confirm) => self.commands.push(InputEvent::Confirm),
            Some(KeyAction::Back) => self.commands.push(InputEvent::Back),
            None => {}
        }
    }

    /// Auto-repeat keeps a direction held; it never re-triggers commands
    pub fn repeat(&mut self, code: KeyCode, now_ms: u64) {
        if let Some(KeyAction::Move(direction)) = bind_key(code) {
            let timing = self.timing;
            self.latch(direction).press(now_ms, timing);
        }
    }

    pub fn release(&mut self, code: KeyCode) {
        if let Some(KeyAction::Move(direction)) = bind_key(code) {
            self.latch(direction).release();
        }
    }

    /// Whether a direction is currently held
    pub fn is_down(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.up.down,
            Direction::Down => self.down.down,
        }
    }

    /// Events for this tick: direction presses/holds first, then commands.
    ///
    /// A press that was released before the drain still yields `Pressed`, so a
    /// quick tap between two ticks is never lost.
    pub fn drain(&mut self, now_ms: u64) -> Vec<InputEvent> {
        if let Some(timing) = self.timing {
            self.up.expire(now_ms, timing);
            self.down.expire(now_ms, timing);
        }

        let mut events = Vec::new();
        for direction in [Direction::Up, Direction::Down] {
            if let Some(press) = self.latch(direction).take() {
                events.push(InputEvent::Move { direction, press });
            }
        }
        events.append(&mut self.commands);
        events
    }
}

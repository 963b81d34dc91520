//! Titanic + Memory entry point
//!
//! Loads settings, finds and opens the serial pad, and runs the 60 Hz
//! drive loop in the terminal: poll input, tick the machine, print a status
//! line. Logs go to stderr (`RUST_LOG=debug titanic-memory 2>game.log`).

use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{QueueableCommand, cursor};

use titanic_memory::consts::TARGET_FPS;
use titanic_memory::input::{
    ByteSource, InputSource, KeyboardState, SerialDevice, resolve_port, should_quit,
};
use titanic_memory::settings::{DeviceSettings, settings_path};
use titanic_memory::sim::{
    CorrectnessMap, Direction, GamePhase, MemoryView, RunnerView, Snapshot, View,
};
use titanic_memory::{GameStateMachine, RecordStore, Settings, TickInput};

fn main() -> Result<()> {
    env_logger::init();
    log::info!("Titanic + Memory starting...");

    let env = |key: &str| std::env::var(key).ok();
    let config = settings_path(env);
    let mut settings = Settings::load(&config);
    settings.apply_overrides(env);

    let records = RecordStore::load(&settings.record_path);
    let device = open_device(&settings.device);
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    log::info!("Session seed {}", seed);

    let mut term = Terminal::new();
    let release_events = term.enter()?;

    let keyboard = KeyboardState::new((!release_events).then_some(settings.keyboard));
    let input = InputSource::new(keyboard, device, settings.device.debounce_ms);
    let machine = GameStateMachine::new(&settings, records, seed);

    let result = run(&mut term, machine, input);

    // Always try to restore terminal state.
    let _ = term.exit();
    log::info!("Titanic + Memory exiting");
    result
}

fn open_device(cfg: &DeviceSettings) -> Option<Box<dyn ByteSource>> {
    if !cfg.enabled {
        log::info!("Serial pad disabled, keyboard only");
        return None;
    }
    let port = resolve_port(&cfg.port);
    match SerialDevice::open(&port, cfg.baud, Duration::from_millis(cfg.read_timeout_ms)) {
        Ok(device) => {
            log::info!("Serial pad on {}", device.name());
            Some(Box::new(device))
        }
        Err(e) => {
            log::warn!("{}; continuing with keyboard only", e);
            None
        }
    }
}

fn run(term: &mut Terminal, mut machine: GameStateMachine, mut input: InputSource) -> Result<()> {
    let clock = Instant::now();
    let now_ms = || clock.elapsed().as_millis() as u64;
    let frame = Duration::from_secs(1) / TARGET_FPS;
    let mut last_tick = Instant::now();
    let mut last_line = String::new();

    loop {
        // Keys until the next tick is due
        while event::poll(frame.saturating_sub(last_tick.elapsed()))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && should_quit(key) {
                    return Ok(());
                }
                input.keyboard_mut().handle_key(key, now_ms());
            }
        }

        let dt = last_tick.elapsed().as_secs_f32();
        last_tick = Instant::now();
        let now = now_ms();

        let events = input.poll(now);
        machine.tick(&TickInput {
            now_ms: now,
            dt,
            events,
        });

        let line = status_line(&machine.snapshot(now), input.has_device());
        if line != last_line {
            term.status(&line)?;
            last_line = line;
        }
    }
}

/// Raw-mode terminal with a single status line
struct Terminal {
    stdout: Stdout,
    enhanced: bool,
}

impl Terminal {
    fn new() -> Self {
        Self {
            stdout: io::stdout(),
            enhanced: false,
        }
    }

    /// Returns whether the terminal reports key releases
    fn enter(&mut self) -> Result<bool> {
        terminal::enable_raw_mode()?;
        self.enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.enhanced {
            self.stdout.queue(PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
            ))?;
        }
        self.stdout.queue(cursor::Hide)?;
        self.stdout.flush()?;
        log::debug!("Key release events: {}", self.enhanced);
        Ok(self.enhanced)
    }

    fn exit(&mut self) -> Result<()> {
        if self.enhanced {
            self.stdout.queue(PopKeyboardEnhancementFlags)?;
        }
        self.stdout.queue(Print("\r\n"))?;
        self.stdout.queue(cursor::Show)?;
        self.stdout.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    fn status(&mut self, line: &str) -> Result<()> {
        self.stdout.queue(cursor::MoveToColumn(0))?;
        self.stdout.queue(Clear(ClearType::CurrentLine))?;
        self.stdout.queue(Print(line))?;
        self.stdout.flush()?;
        Ok(())
    }
}

fn arrow(direction: Direction) -> char {
    match direction {
        Direction::Up => '↑',
        Direction::Down => '↓',
    }
}

fn arrows(directions: &[Direction]) -> String {
    directions.iter().map(|&d| arrow(d)).collect()
}

/// Player's answer with wrong positions bracketed
fn marked(input: &[Direction], map: &CorrectnessMap) -> String {
    input
        .iter()
        .enumerate()
        .map(|(i, &d)| match map.is_correct(i) {
            Some(false) => format!("[{}]", arrow(d)),
            _ => arrow(d).to_string(),
        })
        .collect()
}

fn status_line(snap: &Snapshot, pad: bool) -> String {
    let source = if pad { "pad+keys" } else { "keys" };
    let body = match &snap.view {
        View::Menu => match snap.phase {
            GamePhase::TitanicMenu => {
                "TITANIC  steer between icebergs, grab stars  [Space] start  [M] back".to_string()
            }
            _ => format!(
                "TITANIC+MEMORY  [↑/1] Titanic  [↓/2] Memory  record L{}  [Esc] quit",
                snap.record
            ),
        },
        View::Runner(run) => runner_line(snap.phase, run),
        View::Memory(mem) => memory_line(snap.phase, mem, snap.record),
    };
    format!("{}  ({})", body, source)
}

fn runner_line(phase: GamePhase, run: &RunnerView) -> String {
    let hearts = "♥".repeat(run.lives as usize);
    match phase {
        GamePhase::TitanicGameOver => format!(
            "TITANIC  sunk! score {} level {}  [Space] again  [M] back",
            run.score, run.level
        ),
        _ => format!(
            "TITANIC  {:<3} score {:>3}  level {:>2}  y {:>3.0}  icebergs {}",
            hearts,
            run.score,
            run.level,
            run.ship.center().y,
            run.icebergs.len()
        ),
    }
}

fn memory_line(phase: GamePhase, mem: &MemoryView, record: u32) -> String {
    match phase {
        GamePhase::MemoryReady => format!(
            "MEMORY  watch the arrows, then repeat them  record L{}  [Space] start  [M] back",
            record
        ),
        GamePhase::MemoryShow => {
            let cue = match mem.cue {
                Some(cue) => {
                    let rise = (cue.progress * 5.0) as usize;
                    format!("{}{}", " ".repeat(5 - rise.min(5)), arrow(cue.direction))
                }
                None => "     ·".to_string(),
            };
            format!("MEMORY  level {}  watch: {}", mem.level, cue)
        }
        GamePhase::MemoryInput => format!(
            "MEMORY  level {}  your turn {}/{}: {}",
            mem.level,
            mem.input.len(),
            mem.length,
            arrows(&mem.input)
        ),
        GamePhase::MemorySuccess => format!(
            "MEMORY  correct! {}  next level coming",
            arrows(mem.sequence.as_deref().unwrap_or_default())
        ),
        _ => {
            let expected = arrows(mem.sequence.as_deref().unwrap_or_default());
            let given = match &mem.correctness {
                Some(map) => marked(&mem.input, map),
                None => arrows(&mem.input),
            };
            format!(
                "MEMORY  game over at level {}  wanted {}  got {}  record L{}  [Space] again  [M] back",
                mem.level, expected, given, record
            )
        }
    }
}

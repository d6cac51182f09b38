mod render;
mod scripted_input;

use std::path::{Path, PathBuf};

use bracket_geometry::prelude::Point;
use bracket_terminal::prelude::*;
use clap::Parser;
use crossterm::style::Stylize;
use render::{draw_log, draw_map, draw_status};
use roguedepths::{
    Command, Direction, EnglishText, EquipSlot, FrameView, GameConfig, GameHooks, GameMode,
    Localizer, Session, SessionSnapshot, SoundEvent,
    ecs::resources::LogEntry,
    text::MessageCategory,
};
use scripted_input::ScriptedInput;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const MAP_ORIGIN_X: i32 = 1;
const MAP_ORIGIN_Y: i32 = 5;
const LOG_ROWS: usize = 6;
const LOG_RESERVED_ROWS: i32 = LOG_ROWS as i32 + 2;
const SCREEN_HEIGHT: i32 = 50;
const LOG_PANEL_START: i32 = SCREEN_HEIGHT - LOG_ROWS as i32 - 1;
const LOG_KEEP: usize = 200;

#[derive(Parser, Debug)]
#[command(name = "roguedepths", about = "Descend a generated dungeon one turn at a time")]
struct Args {
    /// Seed for dungeon generation and every roll.
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file with game parameters.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replay keypresses from a file and print the message log instead of
    /// opening a window.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Write tracing output to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Resume from a saved snapshot.
    #[arg(long)]
    load: Option<PathBuf>,

    /// Where F5 (or the end of a script) writes a snapshot.
    #[arg(long)]
    save: Option<PathBuf>,
}

/// Collects what the core reports so the terminal can draw it.
#[derive(Default)]
struct TerminalHooks {
    frame: Option<FrameView>,
    log: Vec<(MessageCategory, String)>,
    localizer: EnglishText,
}

impl GameHooks for TerminalHooks {
    fn render(&mut self, frame: &FrameView) {
        self.frame = Some(frame.clone());
    }

    fn play_sound(&mut self, event: SoundEvent) {
        debug!(sound = event.name(), "sound");
    }

    fn message(&mut self, entry: &LogEntry) {
        let text = self.localizer.text(entry.key, &entry.params);
        self.log.push((entry.category, text));
        if self.log.len() > LOG_KEEP {
            self.log.remove(0);
        }
    }
}

fn command_for(key: VirtualKeyCode, mode: GameMode) -> Option<Command> {
    if key == VirtualKeyCode::Escape {
        return Some(Command::Cancel);
    }
    if let Some(slot) = digit(key) {
        return match mode {
            GameMode::Inventory => Some(Command::Equip(slot)),
            GameMode::MagicSelection => Some(Command::CastSpell(slot)),
            GameMode::Shop { .. } => Some(Command::Buy(slot)),
            _ => Some(Command::UseItem(slot)),
        };
    }
    if let Some(direction) = direction(key) {
        return match mode {
            GameMode::Targeting { .. } => Some(Command::Aim(direction)),
            _ => Some(Command::Move(direction)),
        };
    }
    match key {
        VirtualKeyCode::Space | VirtualKeyCode::Period => Some(Command::Wait),
        VirtualKeyCode::G => Some(Command::PickUp),
        VirtualKeyCode::I => Some(Command::OpenInventory),
        VirtualKeyCode::U => Some(Command::OpenItemSelection),
        VirtualKeyCode::M => Some(Command::OpenMagic),
        VirtualKeyCode::X => Some(Command::Unequip(EquipSlot::Weapon)),
        _ => None,
    }
}

fn direction(key: VirtualKeyCode) -> Option<Direction> {
    match key {
        VirtualKeyCode::W | VirtualKeyCode::Up | VirtualKeyCode::Numpad8 => Some(Direction::North),
        VirtualKeyCode::S | VirtualKeyCode::Down | VirtualKeyCode::Numpad2 => {
            Some(Direction::South)
        }
        VirtualKeyCode::A | VirtualKeyCode::Left | VirtualKeyCode::Numpad4 => Some(Direction::West),
        VirtualKeyCode::D | VirtualKeyCode::Right | VirtualKeyCode::Numpad6 => {
            Some(Direction::East)
        }
        VirtualKeyCode::Q | VirtualKeyCode::Numpad7 => Some(Direction::NorthWest),
        VirtualKeyCode::E | VirtualKeyCode::Numpad9 => Some(Direction::NorthEast),
        VirtualKeyCode::Z | VirtualKeyCode::Numpad1 => Some(Direction::SouthWest),
        VirtualKeyCode::C | VirtualKeyCode::Numpad3 => Some(Direction::SouthEast),
        _ => None,
    }
}

fn digit(key: VirtualKeyCode) -> Option<usize> {
    let index = match key {
        VirtualKeyCode::Key1 => 0,
        VirtualKeyCode::Key2 => 1,
        VirtualKeyCode::Key3 => 2,
        VirtualKeyCode::Key4 => 3,
        VirtualKeyCode::Key5 => 4,
        VirtualKeyCode::Key6 => 5,
        VirtualKeyCode::Key7 => 6,
        VirtualKeyCode::Key8 => 7,
        VirtualKeyCode::Key9 => 8,
        _ => return None,
    };
    Some(index)
}

struct RogueState {
    session: Session<TerminalHooks>,
    save_path: Option<PathBuf>,
}

impl GameState for RogueState {
    fn tick(&mut self, ctx: &mut BTerm) {
        if let Some(key) = ctx.key {
            self.handle_key(key);
        }
        ctx.cls();
        let hooks = self.session.hooks();
        if let Some(frame) = &hooks.frame {
            draw_status(ctx, frame);
            draw_map(
                ctx,
                frame,
                Point::new(MAP_ORIGIN_X, MAP_ORIGIN_Y),
                LOG_RESERVED_ROWS,
            );
        }
        draw_log(ctx, &hooks.log, LOG_PANEL_START, LOG_ROWS);
    }
}

impl RogueState {
    fn handle_key(&mut self, key: VirtualKeyCode) {
        if key == VirtualKeyCode::F5 {
            self.save();
            return;
        }
        let Some(command) = command_for(key, self.session.mode()) else {
            return;
        };
        if let Ok(report) = self.session.handle(command) {
            debug!(?command, turn = report.turn, advanced = report.turn_advanced, "command");
        }
    }

    fn save(&mut self) {
        let Some(path) = &self.save_path else {
            warn!("no --save path given");
            return;
        };
        match self.session.snapshot().save(path) {
            Ok(()) => info!(path = %path.display(), "saved"),
            Err(err) => warn!(%err, "save failed"),
        }
    }
}

fn init_tracing(log_file: Option<&Path>) -> std::io::Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roguedepths=info"));
    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "roguedepths.log".into());
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();
    Ok(Some(guard))
}

fn start(args: &Args) -> Result<Session<TerminalHooks>, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(path) = &args.load {
        let snapshot = SessionSnapshot::load(path)?;
        return Ok(Session::restore(snapshot, TerminalHooks::default())?);
    }
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    Ok(Session::new(config, TerminalHooks::default())?)
}

fn run_script(
    mut session: Session<TerminalHooks>,
    script: ScriptedInput,
    save_path: Option<&Path>,
) -> BError {
    info!(keys = script.len(), "replaying script");
    for key in script {
        if session.mode() == GameMode::Dead {
            break;
        }
        if let Some(command) = command_for(key, session.mode()) {
            let _ = session.handle(command);
        }
    }

    for (category, text) in &session.hooks().log {
        match category {
            MessageCategory::Combat => println!("{}", text.as_str().red()),
            MessageCategory::Item => println!("{}", text.as_str().cyan()),
            MessageCategory::System => println!("{text}"),
        }
    }
    let player = session.player();
    println!(
        "{}",
        format!(
            "floor {} turn {} hp {}/{} level {} gold {}",
            session.floor(),
            session.turn(),
            player.hp,
            player.max_hp,
            player.level,
            player.gold
        )
        .bold()
    );
    drop(player);

    if let Some(path) = save_path {
        session.snapshot().save(path)?;
    }
    Ok(())
}

fn main() -> BError {
    let args = Args::parse();
    let _guard = init_tracing(args.log_file.as_deref())?;
    let session = start(&args)?;

    if let Some(path) = &args.script {
        let script = ScriptedInput::from_file(path)?;
        return run_script(session, script, args.save.as_deref());
    }

    let context = BTermBuilder::simple80x50()
        .with_title("Rogue Depths")
        .build()?;
    main_loop(
        context,
        RogueState {
            session,
            save_path: args.save.clone(),
        },
    )
}

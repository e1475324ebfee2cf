//! pitch_player - headless baseball pitch analyzer
//!
//! Loads a video (or image directory, or `stub://` source), plays it frame by
//! frame through the configured detector and reports "Baseball detected!" /
//! "No baseball detected." per frame. Controlled from stdin:
//!
//! ```text
//! load <path>   release the current video and open another
//! play          resume playback
//! pause         stop advancing (ticks keep idling)
//! rewind        restart the current video from frame 0
//! quit          exit (Ctrl-C does the same)
//! ```

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use pitch_detector::config::PlayerSettings;
use pitch_detector::detect::{DetectorBackend, MotionBackend, Strategy};
use pitch_detector::ingest::FileOpener;
use pitch_detector::playback::{DisplaySurface, LogDisplay, PeriodicTask, Player, SnapshotDisplay};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Video, image directory or stub:// URI to load at startup.
    path: Option<String>,
    /// Detection strategy (motion or model).
    #[arg(long)]
    strategy: Option<String>,
    /// Write annotated frames as PNG into this directory.
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,
    /// Load without starting playback; send `play` to begin.
    #[arg(long)]
    paused: bool,
    /// Delay between frames in milliseconds.
    #[arg(long)]
    tick_delay_ms: Option<u64>,
    /// Exit once nothing is left to play: the video has been analyzed or the
    /// startup load failed.
    #[arg(long)]
    exit_when_finished: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Command {
    Load(String),
    Play,
    Pause,
    Rewind,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let command = match verb.to_ascii_lowercase().as_str() {
            "load" | "open" if !rest.is_empty() => Command::Load(rest.to_string()),
            "load" | "open" => return Err(anyhow!("usage: load <path>")),
            "play" => Command::Play,
            "pause" => Command::Pause,
            "rewind" => Command::Rewind,
            "quit" | "exit" => Command::Quit,
            other => return Err(anyhow!("unknown command '{}'", other)),
        };
        Ok(Some(command))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut settings = PlayerSettings::load()?;
    if let Some(strategy) = args.strategy.as_deref() {
        settings.strategy = strategy.parse()?;
    }
    if let Some(dir) = args.snapshot_dir.clone() {
        settings.snapshot_dir = Some(dir);
    }
    if args.paused {
        settings.playback.autoplay = false;
    }
    if let Some(millis) = args.tick_delay_ms {
        settings.playback.tick_delay = Duration::from_millis(millis);
    }
    settings.validate()?;

    let detector = build_detector(&settings)?;
    let mut player = Player::new(Box::new(FileOpener), detector, settings.playback.clone());
    let mut display: Box<dyn DisplaySurface> = match settings.snapshot_dir.as_deref() {
        Some(dir) => {
            log::info!("writing annotated frames to {}", dir.display());
            Box::new(SnapshotDisplay::new(dir)?)
        }
        None => Box::new(LogDisplay::new()),
    };

    let (tx, rx) = mpsc::channel();
    let ctrlc_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(Command::Quit);
    })
    .context("set Ctrl-C handler")?;
    std::thread::spawn(move || read_commands(tx));

    let mut task = PeriodicTask::new();
    publish_status(&player, display.as_mut());
    if let Some(path) = args.path.clone() {
        apply(&mut player, &mut task, display.as_mut(), Command::Load(path));
    }

    run(&mut player, &mut task, display.as_mut(), &rx, args.exit_when_finished);
    log::info!("pitch_player exiting");
    Ok(())
}

fn run(
    player: &mut Player,
    task: &mut PeriodicTask,
    display: &mut dyn DisplaySurface,
    rx: &Receiver<Command>,
    exit_when_finished: bool,
) {
    loop {
        if done_running(exit_when_finished, task, player) {
            return;
        }
        let received = match task.time_until(Instant::now()) {
            Some(wait) => rx.recv_timeout(wait),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(Command::Quit) => return,
            Ok(command) => apply(player, task, display, command),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return,
        }

        let now = Instant::now();
        if task.take_due(now) {
            let outcome = player.tick(display);
            task.apply(outcome, Instant::now());
        }
    }
}

/// No tick pending and no source to play (never loaded, failed load, or finished).
fn done_running(exit_when_finished: bool, task: &PeriodicTask, player: &Player) -> bool {
    exit_when_finished && !task.is_armed() && !player.is_active()
}

fn apply(
    player: &mut Player,
    task: &mut PeriodicTask,
    display: &mut dyn DisplaySurface,
    command: Command,
) {
    log::debug!("command: {:?}", command);
    match command {
        Command::Load(path) => {
            if let Err(e) = player.load(&path) {
                log::error!("{:#}", anyhow::Error::new(e));
            } else {
                task.arm_now();
            }
        }
        Command::Play => player.play(),
        Command::Pause => player.pause(),
        Command::Rewind => {
            if let Err(e) = player.rewind() {
                log::error!("{:#}", anyhow::Error::new(e));
            }
        }
        Command::Quit => {}
    }

    if !player.is_active() {
        task.cancel();
    } else if !task.is_armed() {
        task.arm_now();
    }
    publish_status(player, display);
}

fn publish_status(player: &Player, display: &mut dyn DisplaySurface) {
    if let Err(e) = display.present(None, &player.snapshot()) {
        log::warn!("display update failed: {:#}", e);
    }
}

fn read_commands(tx: Sender<Command>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("stdin read failed: {}", e);
                return;
            }
        };
        match Command::parse(&line) {
            Ok(Some(command)) => {
                if tx.send(command).is_err() {
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => eprintln!("{}", e),
        }
    }
    log::debug!("stdin closed; commands now only via Ctrl-C");
}

fn build_detector(settings: &PlayerSettings) -> Result<Box<dyn DetectorBackend>> {
    match settings.strategy {
        Strategy::Motion => Ok(Box::new(MotionBackend::default())),
        Strategy::Model => build_model_detector(settings),
    }
}

#[cfg(feature = "backend-tract")]
fn build_model_detector(settings: &PlayerSettings) -> Result<Box<dyn DetectorBackend>> {
    use pitch_detector::detect::backends::TractNetwork;
    use pitch_detector::detect::ModelBackend;

    let assets = settings.model.assets().load()?;
    let network = TractNetwork::load(&assets)?;
    Ok(Box::new(ModelBackend::new(
        Box::new(network),
        assets.classes,
        settings.model.filter_config(),
    )))
}

#[cfg(not(feature = "backend-tract"))]
fn build_model_detector(settings: &PlayerSettings) -> Result<Box<dyn DetectorBackend>> {
    settings.model.assets().load()?;
    Err(anyhow!(
        "the model strategy requires the backend-tract feature"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitch_detector::playback::{PlaybackConfig, PlaybackState};

    #[test]
    fn parses_control_commands() {
        assert_eq!(
            Command::parse("load /videos/pitch one.mp4").unwrap(),
            Some(Command::Load("/videos/pitch one.mp4".to_string()))
        );
        assert_eq!(Command::parse(" PLAY ").unwrap(), Some(Command::Play));
        assert_eq!(Command::parse("pause").unwrap(), Some(Command::Pause));
        assert_eq!(Command::parse("rewind").unwrap(), Some(Command::Rewind));
        assert_eq!(Command::parse("exit").unwrap(), Some(Command::Quit));
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn rejects_bad_commands() {
        assert!(Command::parse("load").is_err());
        assert!(Command::parse("fast-forward").is_err());
    }

    fn player() -> Player {
        Player::new(
            Box::new(FileOpener),
            Box::new(MotionBackend::default()),
            PlaybackConfig::default(),
        )
    }

    #[test]
    fn failed_startup_load_ends_run_when_exit_requested() {
        let mut player = player();
        let mut task = PeriodicTask::new();
        let mut display = LogDisplay::new();
        apply(
            &mut player,
            &mut task,
            &mut display,
            Command::Load("/nonexistent/pitch.mp4".to_string()),
        );
        assert_eq!(player.state(), PlaybackState::NotLoaded);
        assert!(!task.is_armed());
        assert!(done_running(true, &task, &player));
        assert!(!done_running(false, &task, &player));

        let (_tx, rx) = mpsc::channel();
        run(&mut player, &mut task, &mut display, &rx, true);
    }

    #[test]
    fn loaded_video_keeps_running_until_finished() {
        let mut player = player();
        let mut task = PeriodicTask::new();
        let mut display = LogDisplay::new();
        apply(
            &mut player,
            &mut task,
            &mut display,
            Command::Load("stub://t?frames=2".to_string()),
        );
        assert!(task.is_armed());
        assert!(!done_running(true, &task, &player));

        let (_tx, rx) = mpsc::channel();
        run(&mut player, &mut task, &mut display, &rx, true);
        assert_eq!(player.state(), PlaybackState::Finished);
        assert!(done_running(true, &task, &player));
    }

    #[test]
    fn paused_player_is_not_done() {
        let mut player = player();
        let mut task = PeriodicTask::new();
        let mut display = LogDisplay::new();
        apply(
            &mut player,
            &mut task,
            &mut display,
            Command::Load("stub://t?frames=2".to_string()),
        );
        apply(&mut player, &mut task, &mut display, Command::Pause);
        assert_eq!(player.state(), PlaybackState::Paused);
        assert!(!done_running(true, &task, &player));
    }
}

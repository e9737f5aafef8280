//! BlockPilot CLI
//!
//! Runs canned missions, single typed goals or an interactive console
//! against the mirrored game window.

use std::fs::{self, File};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use blockpilot::config::{Config, LoggingSettings, Settings};
use blockpilot::mission::{install_ctrl_c_handler, CancelToken, EpisodeReport, GoalExecutor};
use blockpilot::vision::{FrameRecorder, Palette};
use blockpilot::{Mission, Pilot};

#[derive(Parser)]
#[command(name = "blockpilot", version)]
#[command(about = "Screen-driven agent for Minecraft in iPhone Mirroring")]
struct Cli {
    /// Configuration file, created with defaults if missing
    #[arg(short, long, default_value = "config/default.yaml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Log input instead of sending it
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Ready {
    Y,
    N,
}

#[derive(Args)]
struct MissionArgs {
    /// Confirm the game is running in iPhone Mirroring
    #[arg(long, value_enum, default_value_t = Ready::N)]
    ready: Ready,

    /// Number of steps to run
    #[arg(long)]
    steps: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Long-range water search
    Water(MissionArgs),
    /// Compact water sweep with downward looks
    CompactWater(MissionArgs),
    /// Search for trees
    Trees(MissionArgs),
    /// Explore without a target
    Explore(MissionArgs),
    /// Let the language model decide
    Llm(MissionArgs),
    /// Gather materials and build a shelter
    Shelter(MissionArgs),
    /// Execute one typed goal, e.g. "find water within 30 blocks"
    Goal {
        #[arg(long, value_enum, default_value_t = Ready::N)]
        ready: Ready,
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Interactive goal console
    Chat {
        #[arg(long, value_enum, default_value_t = Ready::N)]
        ready: Ready,
    },
    /// Capture frames and print terrain coverage, sends no input
    Vision {
        #[arg(long, default_value_t = 3)]
        frames: u32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load_or_create(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            init_logging(cli.debug, &LoggingSettings::default());
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let settings = config.settings().clone();
    init_logging(cli.debug, &settings.logging);

    let cancel = CancelToken::new();
    if let Err(e) = install_ctrl_c_handler(cancel.clone()) {
        log::warn!("Ctrl-C handler unavailable: {}", e);
    }

    let mission = match &cli.command {
        Command::Water(args) => Some((Mission::Water, args)),
        Command::CompactWater(args) => Some((Mission::CompactWater, args)),
        Command::Trees(args) => Some((Mission::Trees, args)),
        Command::Explore(args) => Some((Mission::Explore, args)),
        Command::Llm(args) => Some((Mission::Llm, args)),
        Command::Shelter(args) => Some((Mission::Shelter, args)),
        _ => None,
    };
    if let Some((mission, args)) = mission {
        return run_mission(mission, args, settings, cli.dry_run, cancel);
    }

    match cli.command {
        Command::Goal { ready, text } => {
            if ready != Ready::Y {
                print_setup("goal --ready y \"find water\"");
                return ExitCode::SUCCESS;
            }
            let delay = settings.mission.start_delay_secs;
            let Some(mut executor) = executor(settings, cli.dry_run, cancel.clone()) else {
                return ExitCode::FAILURE;
            };
            if countdown(delay, &cancel) {
                let result = executor.execute_command(&text.join(" "));
                println!("{}", result.message);
            }
            ExitCode::SUCCESS
        }
        Command::Chat { ready } => {
            if ready != Ready::Y {
                print_setup("chat --ready y");
                return ExitCode::SUCCESS;
            }
            let name = settings.agent.name.clone();
            let Some(executor) = executor(settings, cli.dry_run, cancel.clone()) else {
                return ExitCode::FAILURE;
            };
            chat(executor, &name, &cancel);
            ExitCode::SUCCESS
        }
        Command::Vision { frames } => debug_vision(settings, frames, cancel),
        _ => ExitCode::SUCCESS,
    }
}

fn init_logging(debug: bool, logging: &LoggingSettings) {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        logging.level_filter()
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).parse_default_env();
    if let Some(path) = &logging.file {
        match open_log_file(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Cannot open log file {}: {}", path.display(), e),
        }
    }
    builder.init();
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    File::options().create(true).append(true).open(path)
}

fn print_setup(command: &str) {
    println!("Please start Minecraft in iPhone Mirroring first, then confirm with --ready y");
    println!();
    println!("Steps:");
    println!("  1. Open the iPhone Mirroring app");
    println!("  2. Launch Minecraft on your iPhone");
    println!("  3. Enter a world and position yourself");
    println!("  4. Run: blockpilot {}", command);
}

/// Count down before input starts; false if interrupted
fn countdown(secs: u64, cancel: &CancelToken) -> bool {
    for remaining in (1..=secs).rev() {
        if cancel.is_cancelled() {
            return false;
        }
        println!("Starting in {}...", remaining);
        thread::sleep(Duration::from_secs(1));
    }
    !cancel.is_cancelled()
}

fn pilot(settings: Settings, dry_run: bool, cancel: CancelToken) -> Option<Pilot> {
    match Pilot::live(settings, dry_run, cancel) {
        Ok(pilot) => Some(pilot),
        Err(e) => {
            log::error!("Startup failed: {}", e);
            None
        }
    }
}

fn executor(settings: Settings, dry_run: bool, cancel: CancelToken) -> Option<GoalExecutor> {
    pilot(settings, dry_run, cancel).map(Pilot::into_executor)
}

fn run_mission(
    mission: Mission,
    args: &MissionArgs,
    settings: Settings,
    dry_run: bool,
    cancel: CancelToken,
) -> ExitCode {
    if args.ready != Ready::Y {
        print_setup(&format!("{} --ready y", mission));
        return ExitCode::SUCCESS;
    }

    let delay = settings.mission.start_delay_secs;
    let Some(mut pilot) = pilot(settings, dry_run, cancel.clone()) else {
        return ExitCode::FAILURE;
    };

    println!("Mission: {}", mission);
    if !countdown(delay, &cancel) {
        return ExitCode::SUCCESS;
    }

    match pilot.run(mission, args.steps) {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Mission failed to start: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_report(report: &EpisodeReport) {
    println!();
    println!("Result: {}", report.verdict);
    println!("  {}", report.summary());
    println!("  Steps: {}", report.steps_taken);
    println!("  Max coverage: {:.3}%", report.max_coverage * 100.0);
    if let Some(step) = report.first_detection {
        println!("  First detection: step {}", step);
    }
    if report.skipped_ticks > 0 {
        println!("  Skipped ticks: {}", report.skipped_ticks);
    }
    println!("  Time: {:.1}s", report.elapsed.as_secs_f64());
}

const CHAT_HELP: &str = "Commands:
  find water | look for trees | locate animal
  go north 30 blocks | head left | walk to tree
  explore area | scout the area in a grid
  status    show agent status
  history   list executed goals
  help      show this help
  quit      leave the console";

fn chat(mut executor: GoalExecutor, name: &str, cancel: &CancelToken) {
    println!("{} console. Type 'help' for commands, Ctrl-C stops the running goal.", name);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                log::error!("Failed to read input: {}", e);
                break;
            }
            None => break,
        };

        match line.trim().to_lowercase().as_str() {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "help" => println!("{}", CHAT_HELP),
            "status" => println!("{}", executor.status()),
            "history" => {
                if executor.history().is_empty() {
                    println!("No goals executed yet");
                }
                for (i, result) in executor.history().iter().enumerate() {
                    println!(
                        "{:2}. {} - {:?} ({} steps) {}",
                        i + 1,
                        result.goal,
                        result.status,
                        result.steps_taken,
                        result.message
                    );
                }
            }
            command => {
                cancel.reset();
                let result = executor.execute_command(command);
                let mark = if result.success { "done" } else { "failed" };
                println!("[{}] {}", mark, result.message);
            }
        }
    }
    println!("Goodbye");
}

fn debug_vision(settings: Settings, frames: u32, cancel: CancelToken) -> ExitCode {
    let output_dir = settings.debug.output_dir.clone();
    // Dry-run input: this command only looks
    let Some(mut pilot) = pilot(settings, true, cancel.clone()) else {
        return ExitCode::FAILURE;
    };
    let mut recorder = FrameRecorder::new(output_dir);
    pilot.vision_mut().set_palette(Palette::terrain());

    for n in 0..frames {
        if cancel.is_cancelled() {
            break;
        }
        let observed = match pilot.vision_mut().capture() {
            Ok(observed) => observed,
            Err(e) => {
                log::error!("Capture failed: {}", e);
                return ExitCode::FAILURE;
            }
        };

        println!(
            "Frame {} ({}x{}):",
            n,
            observed.frame.width(),
            observed.frame.height()
        );
        for (name, coverage) in observed.coverage.iter() {
            println!(
                "  {:<6} {:6.2}%  (L {:5.1}% C {:5.1}% R {:5.1}%)",
                name,
                coverage.global() * 100.0,
                coverage.left() * 100.0,
                coverage.center() * 100.0,
                coverage.right() * 100.0
            );
        }
        if let Some((name, value)) = observed.coverage.dominant() {
            println!("  dominant: {} ({:.1}%)", name, value * 100.0);
        }
        match recorder.save(&observed.frame, &format!("debug_frame_{}.png", n)) {
            Ok(path) => println!("  saved {}", path.display()),
            Err(e) => log::warn!("Failed to save frame: {}", e),
        }
        thread::sleep(Duration::from_millis(500));
    }
    ExitCode::SUCCESS
}

//! seatshuffle CLI
//!
//! Shuffle a class onto its seating chart, step through the animated
//! one-student-at-a-time mode in the terminal, or run the deterministic
//! verification scenarios.

use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use seatshuffle_core::{
    Assignment, ChartRenderer, Config, ConfigStore, HtmlChart, HtmlExport, JsonExport,
    SeatingController, SessionPhase,
};
use seatshuffle_env::{ShuffleContext, TokioContext};
use seatshuffle_sim::scenarios::ScenarioId;
use seatshuffle_sim::{PacedContext, ScenarioResult, ScenarioRunner, SimContext, TerminalChart};
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Classroom seat-assignment randomizer
#[derive(Parser, Debug)]
#[command(name = "seatshuffle", version)]
#[command(about = "Randomly assign students to classroom seats", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assign every student at once
    Shuffle(ChartArgs),

    /// Place students one at a time with the dithering animation
    Step {
        #[command(flatten)]
        chart: ChartArgs,

        /// Run through the whole roster without waiting for keys
        #[arg(long)]
        auto: bool,
    },

    /// Run the deterministic verification scenarios
    Verify(VerifyArgs),
}

#[derive(Args, Debug)]
struct ChartArgs {
    /// Directory holding config.toml, member_list.csv and seat_position_matrix.csv
    #[arg(short, long, default_value = ".")]
    config_dir: PathBuf,

    /// Settings file, relative to the config directory unless absolute
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Roster CSV, relative to the config directory unless absolute
    #[arg(long, value_name = "FILE")]
    roster: Option<PathBuf>,

    /// Seat grid CSV, relative to the config directory unless absolute
    #[arg(long, value_name = "FILE")]
    grid: Option<PathBuf>,

    /// Write the chart as a standalone HTML page
    #[arg(long)]
    html: Option<PathBuf>,

    /// Write the assignment as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Seed for reproducible charts (0 = OS entropy)
    #[arg(short, long, default_value = "0")]
    seed: u64,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// Scenario to run (pair, mismatch, classroom, incremental, reset, uniformity, step_uniformity, structural, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of consecutive seeds to test
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Shuffles per statistical scenario
    #[arg(short, long, default_value = "4000")]
    trials: usize,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The step screen owns stdout; keep routine logs off it.
    let level = match (&cli.command, cli.verbose) {
        (_, true) => Level::DEBUG,
        (Command::Step { .. }, false) => Level::ERROR,
        (_, false) => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let outcome = match cli.command {
        Command::Shuffle(args) => shuffle(args).await,
        Command::Step { chart, auto } => step(chart, auto).await,
        Command::Verify(args) => verify(args).await,
    };

    if let Err(e) = outcome {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn config_store(args: &ChartArgs) -> ConfigStore {
    let dir = &args.config_dir;
    let mut store = ConfigStore::new(dir);
    if let Some(path) = &args.settings {
        store = store.with_settings_path(dir.join(path));
    }
    if let Some(path) = &args.roster {
        store = store.with_roster_path(dir.join(path));
    }
    if let Some(path) = &args.grid {
        store = store.with_grid_path(dir.join(path));
    }
    store
}

fn load_config(args: &ChartArgs) -> Result<Config> {
    let dir = &args.config_dir;
    let config = config_store(args)
        .load()
        .with_context(|| format!("loading configuration from {}", dir.display()))?;
    info!(
        "Loaded {} students, {} seats ({})",
        config.roster.len(),
        config.seat_grid.available_count(),
        config.labels.class_label()
    );
    Ok(config)
}

// ---------------------------------------------------------------------------
// shuffle
// ---------------------------------------------------------------------------

async fn shuffle(args: ChartArgs) -> Result<()> {
    let config = load_config(&args)?;
    if args.seed == 0 {
        shuffle_with(TokioContext::shared(), config, &args)
    } else {
        info!("Using seed {}", args.seed);
        shuffle_with(SimContext::shared(args.seed), config, &args)
    }
}

fn shuffle_with<C: ShuffleContext>(ctx: Arc<C>, config: Config, args: &ChartArgs) -> Result<()> {
    let chart = HtmlChart::new(config.seat_grid.clone(), config.labels.clone());
    let mut controller = SeatingController::new(ctx, config, chart);

    if controller.shuffle_all().is_err() {
        bail!(
            "{}",
            controller.error_message().unwrap_or("shuffle failed")
        );
    }

    let assignment = controller.current_assignment().unwrap_or_default();
    print_assignment(&controller.config().labels.class_label(), &assignment);
    export(&controller, args)
}

fn print_assignment(class_label: &str, assignment: &Assignment) {
    println!("{}", class_label);
    for placement in assignment.iter() {
        println!("  {}  {}", placement.coord, placement.student);
    }
}

fn export<C: ShuffleContext, R: ChartRenderer>(
    controller: &SeatingController<C, R>,
    args: &ChartArgs,
) -> Result<()> {
    if let Some(path) = &args.json {
        controller
            .export(&JsonExport, path)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(path) = &args.html {
        controller
            .export(&HtmlExport, path)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// step
// ---------------------------------------------------------------------------

const STEP_KEYS: &str = "[Enter] next student  [s] shuffle all  [r] reset  [q] quit";

/// Restores the terminal however the step loop ends.
struct ScreenGuard;

impl ScreenGuard {
    fn enter(out: &mut Stdout) -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(out, EnterAlternateScreen, Hide)?;
        Ok(Self)
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Step,
    ShuffleAll,
    Reset,
    Quit,
}

async fn next_action() -> Result<Action> {
    loop {
        let key = tokio::task::spawn_blocking(event::read).await??;
        if let Event::Key(key) = key {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('n') => return Ok(Action::Step),
                KeyCode::Char('s') => return Ok(Action::ShuffleAll),
                KeyCode::Char('r') => return Ok(Action::Reset),
                KeyCode::Char('q') | KeyCode::Esc => return Ok(Action::Quit),
                _ => {}
            }
        }
    }
}

async fn step(args: ChartArgs, auto: bool) -> Result<()> {
    let config = load_config(&args)?;
    if args.seed == 0 {
        step_with(TokioContext::shared(), config, &args, auto).await
    } else {
        step_with(Arc::new(PacedContext::new(args.seed)), config, &args, auto).await
    }
}

async fn step_with<C: ShuffleContext>(
    ctx: Arc<C>,
    config: Config,
    args: &ChartArgs,
    auto: bool,
) -> Result<()> {
    let mut stdout = io::stdout();
    let guard = ScreenGuard::enter(&mut stdout).context("preparing terminal")?;

    let chart = TerminalChart::new(stdout, config.labels.class_label());
    let mut controller = SeatingController::new(Arc::clone(&ctx), config, chart);
    controller.renderer_mut().set_footer(if auto { "[Ctrl-C] abort" } else { STEP_KEYS });

    loop {
        let action = if auto {
            if controller.session().phase() == SessionPhase::Complete {
                ctx.sleep(Duration::from_secs(2)).await;
                Action::Quit
            } else {
                Action::Step
            }
        } else {
            next_action().await?
        };
        debug!("action {:?}", action);

        match action {
            Action::Step => {
                if !controller.controls().step_enabled {
                    continue;
                }
                if controller.step().await.is_err() {
                    let message = controller.error_message().unwrap_or_default().to_string();
                    controller.renderer_mut().set_message(message);
                    if auto {
                        ctx.sleep(Duration::from_secs(2)).await;
                        break;
                    }
                } else if auto {
                    ctx.sleep(Duration::from_millis(800)).await;
                }
            }
            Action::ShuffleAll => {
                if !controller.controls().shuffle_enabled {
                    continue;
                }
                if controller.shuffle_all().is_err() {
                    let message = controller.error_message().unwrap_or_default().to_string();
                    controller.renderer_mut().set_message(message);
                }
            }
            Action::Reset => controller.reset(),
            Action::Quit => break,
        }
    }

    drop(guard);
    let mut out = io::stdout();
    writeln!(out)?;

    match controller.current_assignment() {
        Some(assignment) => {
            print_assignment(&controller.config().labels.class_label(), &assignment);
            info!("{} students placed", assignment.len());
            export(&controller, args)
        }
        None => {
            if args.json.is_some() || args.html.is_some() {
                println!("Nothing placed, skipping export");
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// verify
// ---------------------------------------------------------------------------

/// `all`, `structural` (skips the sampling scenarios) or a single name.
fn select_scenarios(name: &str) -> Result<Vec<ScenarioId>> {
    match name {
        "all" => Ok(ScenarioId::all()),
        "structural" => Ok(ScenarioId::structural()),
        single => Ok(vec![single
            .parse()
            .map_err(|e: String| anyhow::anyhow!("{e}"))?]),
    }
}

async fn verify(args: VerifyArgs) -> Result<()> {
    if !args.json {
        info!("seatshuffle verification v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let scenarios = select_scenarios(&args.scenario)?;

    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    } else {
        args.seed
    };

    let mut all_results: Vec<ScenarioResult> = Vec::new();
    for seed_offset in 0..args.seeds.max(1) {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        let runner = ScenarioRunner::new(seed).with_trials(args.trials);

        for scenario in &scenarios {
            let result = runner.run(*scenario).await;
            if !args.json {
                if result.passed {
                    info!("✓ {} (seed={}) PASSED", scenario.name(), seed);
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }
            all_results.push(result);
        }
    }

    let total = all_results.len();
    let failed = all_results.iter().filter(|r| !r.passed).count();

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": total - failed,
            "failed": failed,
            "results": all_results,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        if failed == 0 {
            info!("All {} scenario runs passed", total);
        } else {
            error!("{}/{} scenario runs failed", failed, total);
        }
    }

    if failed > 0 {
        bail!("{} scenario run(s) failed", failed);
    }
    Ok(())
}

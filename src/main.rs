use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use road_follow::simulation::{
    generate_traffic, LogObserver, ProfileLibrary, ScenarioType, SimulationClock, TickFrame,
    TickObserver, VehicleControllerType, DEFAULT_DELTA,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScenarioArg {
    Platoon,
    Wall,
}

impl From<ScenarioArg> for ScenarioType {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::Platoon => ScenarioType::Platoon,
            ScenarioArg::Wall => ScenarioType::Wall,
        }
    }
}

#[derive(Parser)]
#[command(name = "road_follow")]
#[command(about = "One-dimensional car-following simulation")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "1000")]
    ticks: u64,

    /// Simulated seconds per tick
    #[arg(long, default_value_t = DEFAULT_DELTA)]
    delta: f64,

    /// Tick at the wall-clock cadence instead of as fast as possible
    #[arg(long)]
    realtime: bool,

    /// Scenario to generate traffic for
    #[arg(long, value_enum, default_value = "platoon")]
    scenario: ScenarioArg,

    /// Number of autonomous vehicles
    #[arg(long, default_value = "3")]
    autonomous: usize,

    /// Number of human-driven vehicles
    #[arg(long, default_value = "2")]
    human: usize,

    /// Vehicle profile for the generated traffic
    #[arg(long, default_value = "regular")]
    profile: String,

    /// TOML file with additional vehicle profiles
    #[arg(long)]
    profile_file: Option<PathBuf>,

    /// Seed for reproducible traffic
    #[arg(long)]
    seed: Option<u64>,

    /// Print a summary every N ticks (default: one simulated second)
    #[arg(long)]
    print_every: Option<u64>,
}

/// Statistics gathered over the run
#[derive(Debug, Default)]
struct RunStats {
    ticks: u64,
    min_gap: f64,
    overlaps: u64,
}

struct StatsObserver {
    stats: Arc<Mutex<RunStats>>,
}

impl TickObserver for StatsObserver {
    fn on_tick(&mut self, frame: &TickFrame<'_>) {
        let mut stats = self.stats.lock();
        stats.ticks = frame.tick;
        for vehicle in frame.world.vehicles() {
            let gap = frame.world.front_distance(vehicle.id()).unwrap_or(f64::INFINITY);
            if gap < stats.min_gap {
                stats.min_gap = gap;
            }
            if gap < 0.0 {
                stats.overlaps += 1;
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let library = match &cli.profile_file {
        Some(path) => ProfileLibrary::load(path)?,
        None => ProfileLibrary::new(),
    };
    let profile = library
        .resolve(&cli.profile)
        .with_context(|| format!("Unknown vehicle profile '{}'", cli.profile))?;

    let scenario = ScenarioType::from(cli.scenario);
    let counts = [
        (VehicleControllerType::Autonomous, cli.autonomous),
        (VehicleControllerType::Human, cli.human),
    ];
    let world = generate_traffic(scenario, &counts, &profile, cli.seed)
        .context("Failed to generate traffic")?;

    let mut clock = SimulationClock::new(world, scenario.scale());
    clock.set_delta(cli.delta).context("Invalid --delta")?;

    let stats = Arc::new(Mutex::new(RunStats {
        min_gap: f64::INFINITY,
        ..RunStats::default()
    }));
    clock.add_observer(StatsObserver {
        stats: Arc::clone(&stats),
    });
    clock.add_observer(LogObserver::default());

    info!(
        "Running {} scenario with profile '{}': {} ticks, delta {}s",
        scenario, profile.name, cli.ticks, cli.delta
    );

    println!("Initial state:");
    clock.with_world(|w| w.print_summary());
    println!();

    if cli.realtime {
        run_realtime(&mut clock, cli.ticks)?;
    } else {
        let print_every = cli
            .print_every
            .unwrap_or_else(|| (1.0 / cli.delta).ceil() as u64)
            .max(1);
        run_headless(&mut clock, cli.ticks, print_every)?;
    }

    println!("=== Final State ===");
    clock.with_world(|w| w.print_summary());

    let stats = stats.lock();
    info!("=== SIMULATION COMPLETE ===");
    info!("Ticks: {}", stats.ticks);
    info!("Simulated time: {:.1}s", clock.with_world(|w| w.time()));
    info!("Vehicles: {}", clock.with_world(|w| w.len()));
    info!("Minimum gap: {:.2}m", stats.min_gap);
    info!("Overlaps: {}", stats.overlaps);
    Ok(())
}

/// Step the clock as fast as possible, printing a summary every `print_every` ticks
fn run_headless(clock: &mut SimulationClock, ticks: u64, print_every: u64) -> Result<()> {
    let mut tick = 0;
    while tick < ticks {
        let ticks_to_run = print_every.min(ticks - tick);
        for _ in 0..ticks_to_run {
            tick += 1;
            clock.step()?;
        }

        println!(
            "--- After tick {} ({:.1}s simulated time) ---",
            tick,
            clock.with_world(|w| w.time())
        );
        clock.with_world(|w| w.print_summary());
        println!();
    }
    Ok(())
}

/// Let the clock tick at its own cadence until `ticks` have run
fn run_realtime(clock: &mut SimulationClock, ticks: u64) -> Result<()> {
    clock.start()?;
    while clock.tick_count() < ticks {
        thread::sleep(clock.cadence());
    }
    clock.stop()?;
    Ok(())
}

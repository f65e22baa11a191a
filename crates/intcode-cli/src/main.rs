//! Command-line driver for the Intcode virtual machine: load a program image
//! from disk and either run it once against the terminal, or hand it to one
//! of the reference clients.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use intcode_clients::geometry::Vec2;
use intcode_clients::{adventure, amplifier, maze, network, painter};
use intcode_vm::ports::{DisplayPort, PromptPort};
use intcode_vm::{load_image, Machine, RunConfig, RunResult, Word};
use std::path::{Path, PathBuf};

/// Which reference client to run a loaded image through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Client {
    /// Run the image once against the terminal, prompting for input and
    /// printing every output word.
    Run,
    /// Amplifier chain: search every phase permutation, sequential and feedback.
    Amplifier,
    /// Hull-painting robot: print the painted registration identifier.
    Painter,
    /// Repair-droid maze: map it and report distances to the oxygen system.
    Maze,
    /// Peer-to-peer network with NAT wakeup: report the repeated packet.
    Network,
    /// Text-adventure checkpoint: run a command script and print the transcript.
    Adventure,
}

/// Load and run Intcode program images.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a comma-separated Intcode program image.
    image: PathBuf,

    /// Which client drives the loaded image.
    #[arg(long, value_enum, default_value_t = Client::Run)]
    client: Client,

    /// Raise the tracing filter (repeatable: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of networked machines, for `--client network`.
    #[arg(long, default_value_t = 50)]
    network_size: Word,

    /// Command script file for `--client adventure`, one command per line.
    #[arg(long)]
    commands: Option<PathBuf>,

    /// Abort `--client run` after this many instructions without halting,
    /// instead of running forever. Leave unset to run to natural completion.
    #[arg(long)]
    max_steps: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let image = load_image(&cli.image)
        .with_context(|| format!("loading image from {}", cli.image.display()))?;

    let config = match cli.max_steps {
        Some(limit) => RunConfig::with_step_limit(limit),
        None => RunConfig::default(),
    };

    match cli.client {
        Client::Run => run_once(&image, &config)?,
        Client::Amplifier => run_amplifier(&image),
        Client::Painter => run_painter(&image),
        Client::Maze => run_maze(&image),
        Client::Network => run_network(&image, cli.network_size)?,
        Client::Adventure => run_adventure(&image, cli.commands.as_deref())?,
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn run_once(image: &[Word], config: &RunConfig) -> Result<()> {
    let input = PromptPort::new("> ");
    let output = DisplayPort::new();
    let mut machine = Machine::new(image.to_vec(), input, output);
    let outcome = match config.step_limit {
        Some(limit) => machine.run_with_step_limit(limit)?,
        None => machine.run_until_terminate()?,
    };
    match outcome {
        RunResult::Halted => Ok(()),
        RunResult::Cancelled => bail!("machine was cancelled before halting"),
    }
}

fn run_amplifier(image: &[Word]) {
    let best_sequential = permutations(&[0, 1, 2, 3, 4])
        .map(|phases| amplifier::run_sequential(image, &phases))
        .max()
        .expect("the phase-setting permutation space is non-empty");
    println!("sequential max thruster signal: {best_sequential}");

    let best_feedback = permutations(&[5, 6, 7, 8, 9])
        .map(|phases| amplifier::run_feedback(image, &phases))
        .max()
        .expect("the phase-setting permutation space is non-empty");
    println!("feedback-loop max thruster signal: {best_feedback}");
}

/// All permutations of `values`, via Heap's algorithm.
fn permutations(values: &[Word]) -> impl Iterator<Item = Vec<Word>> {
    let mut items = values.to_vec();
    let n = items.len();
    let mut c = vec![0usize; n];
    let mut first = true;
    let mut i = 0usize;
    std::iter::from_fn(move || {
        if first {
            first = false;
            return Some(items.clone());
        }
        while i < n {
            if c[i] < i {
                if i % 2 == 0 {
                    items.swap(0, i);
                } else {
                    items.swap(c[i], i);
                }
                c[i] += 1;
                i = 0;
                return Some(items.clone());
            }
            c[i] = 0;
            i += 1;
        }
        None
    })
}

fn run_painter(image: &[Word]) {
    let canvas = painter::paint(image, 0);
    println!("panels painted at least once: {}", painter::panels_painted(&canvas));
    print!("{}", painter::render(&canvas));
}

fn run_maze(image: &[Word]) {
    let maze = maze::explore(image);
    let Some(oxygen) = maze.oxygen else {
        println!("oxygen system not found");
        return;
    };
    let distances = maze::distances_from(&maze.area, Vec2::new(0, 0));
    println!("steps to oxygen system: {}", distances[&oxygen]);
    let from_oxygen = maze::distances_from(&maze.area, oxygen);
    let fill_time = from_oxygen.values().copied().max().unwrap_or(0);
    println!("minutes to fill the maze with oxygen: {fill_time}");
}

fn run_network(image: &[Word], count: Word) -> Result<()> {
    let (x, y) = network::run_until_repeat(image, count)?;
    println!("first packet repeated to address 0: ({x}, {y})");
    Ok(())
}

fn run_adventure(image: &[Word], commands: Option<&Path>) -> Result<()> {
    let Some(path) = commands else {
        bail!("--commands <FILE> is required for --client adventure");
    };
    let script = std::fs::read_to_string(path)
        .with_context(|| format!("reading command script from {}", path.display()))?;
    let lines: Vec<&str> = script.lines().collect();

    let (controller, handle) = adventure::DroneController::spawn(image);
    for line in &lines {
        controller.send_line(line);
    }
    controller.wait_for_droid();
    println!("{}", controller.transcript());
    controller.stop();
    handle.join().context("droid machine failed")?;
    Ok(())
}

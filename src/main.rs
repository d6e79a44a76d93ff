//! Command-line driver: loads a flat MIPS32 binary image, runs the core to
//! completion (or a bounded cycle count), and reports the result.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mips_pipe_sim::config::Config;
use mips_pipe_sim::cpu::Cpu;
use mips_pipe_sim::memory::MainMemory;

#[derive(Parser)]
#[command(name = "sim", about = "Cycle-accurate five-stage MIPS32 pipeline simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs a flat binary image to completion (or to `--max-cycles`).
    Run {
        /// Flat binary image, loaded at address 0.
        #[arg(long)]
        file: PathBuf,
        /// Optional JSON configuration overriding cache geometry and driver
        /// knobs; unset fields fall back to compiled-in defaults.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Stop after this many cycles even if the program hasn't halted.
        #[arg(long)]
        max_cycles: Option<u64>,
        /// Print a per-cycle pipeline trace to stderr.
        #[arg(long)]
        trace: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            file,
            config,
            max_cycles,
            trace,
        } => match cmd_run(&file, config.as_deref(), max_cycles, trace) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::FAILURE
            }
        },
    }
}

fn cmd_run(
    file: &std::path::Path,
    config_path: Option<&std::path::Path>,
    max_cycles: Option<u64>,
    trace: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = std::fs::read(file)?;

    let mut config = match config_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str(&text)?
        }
        None => Config::default(),
    };
    config.general.trace = config.general.trace || trace;

    let mut mem = MainMemory::new();
    mem.load_image(0, &image);

    let mut cpu = Cpu::new(&config, mem)?;

    loop {
        if cpu.halted() {
            break;
        }
        if let Some(limit) = max_cycles {
            if cpu.cycle() >= limit {
                break;
            }
        }
        cpu.tick();
    }

    cpu.drain_caches();

    println!("{}", cpu.stats.report(cpu.cycle(), cpu.icache(), cpu.dcache()));
    if cpu.halted() {
        println!("status: HALTED at cycle {}", cpu.cycle());
    } else {
        println!("status: NOT_HALTED (stopped at max-cycles bound)");
    }

    Ok(())
}

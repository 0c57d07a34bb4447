//! tinyrv0_sim command line
//!
//! Loads an ELF, a raw binary or the built-in demo program, runs it to
//! completion under the given configuration and prints cycles, statistics
//! and the final registers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use tinyrv0_sim::config::HarnessConfig;
use tinyrv0_sim::error::SimError;
use tinyrv0_sim::harness::{ExpectedState, RunSummary, TestHarness};
use tinyrv0_sim::image::{DEFAULT_ENTRY, MemoryImage};

/// TinyRV0 cycle-level simulator
#[derive(Parser, Debug)]
#[command(name = "tinyrv0_sim")]
#[command(version)]
#[command(about = "Cycle-level TinyRV0 processor simulator", long_about = None)]
struct Args {
    /// RISC-V ELF to run
    #[arg(long, value_name = "FILE", conflicts_with_all = ["bin", "demo"])]
    elf: Option<PathBuf>,

    /// Raw binary to run, loaded at --load-addr
    #[arg(long, value_name = "FILE", conflicts_with = "demo")]
    bin: Option<PathBuf>,

    /// Load address (and entry) of --bin
    #[arg(long, value_name = "ADDR", value_parser = parse_u32, default_value_t = DEFAULT_ENTRY)]
    load_addr: u32,

    /// Run the built-in add/store/load program and check its result
    #[arg(long)]
    demo: bool,

    /// Harness configuration (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Start from the randomized delay preset
    #[arg(long)]
    rand_delays: bool,

    #[arg(long, value_name = "CYCLES")]
    src_delay: Option<u32>,

    #[arg(long, value_name = "CYCLES")]
    sink_delay: Option<u32>,

    #[arg(long, value_name = "P")]
    mem_stall_prob: Option<f64>,

    #[arg(long, value_name = "CYCLES")]
    mem_latency: Option<u32>,

    #[arg(long, value_name = "CYCLES")]
    xcel_latency: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_name = "CYCLES")]
    max_cycles: Option<u64>,

    /// Print a line trace for every cycle
    #[arg(short, long)]
    trace: bool,

    /// Quiet mode (suppress log messages)
    #[arg(short, long)]
    quiet: bool,
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address {s:?}: {e}"))
}

fn build_config(args: &Args) -> Result<HarnessConfig, SimError> {
    let mut config = match (&args.config, args.rand_delays) {
        (Some(path), _) => HarnessConfig::load(path)?,
        (None, true) => HarnessConfig::rand_delays(),
        (None, false) => HarnessConfig::default(),
    };
    if let Some(v) = args.src_delay {
        config.src_delay = v;
    }
    if let Some(v) = args.sink_delay {
        config.sink_delay = v;
    }
    if let Some(v) = args.mem_stall_prob {
        config.mem_stall_prob = v;
    }
    if let Some(v) = args.mem_latency {
        config.mem_latency = v;
    }
    if let Some(v) = args.xcel_latency {
        config.xcel_latency = v;
    }
    if let Some(v) = args.seed {
        config.seed = v;
    }
    if let Some(v) = args.max_cycles {
        config.max_cycles = v;
    }
    config.validate()?;
    Ok(config)
}

/// Stores 5 + 7 to mem[0] and reads it back.
fn demo_image() -> (MemoryImage, ExpectedState) {
    let image = MemoryImage::new().with_text(&[
        0x00500093, // addi x1, x0, 5
        0x00700113, // addi x2, x0, 7
        0x002081B3, // add  x3, x1, x2
        0x00302023, // sw   x3, 0(x0)
        0x00002203, // lw   x4, 0(x0)
    ]);
    let expected = ExpectedState::new().reg(3, 12).reg(4, 12).mem_word(0, 12);
    (image, expected)
}

fn print_summary(th: &TestHarness, summary: &RunSummary) {
    let stats = &summary.stats;
    println!("Cycles:          {}", summary.cycles);
    println!("Retired:         {}", summary.retired);
    if summary.retired > 0 {
        println!("CPI:             {:.2}", summary.cycles as f64 / summary.retired as f64);
    }
    println!("Stall cycles:    {}", stats.stall_cycles);
    println!("Fetches:         {}", stats.fetches);
    println!("Mem requests:    {}", stats.mem_requests);
    println!("Xcel requests:   {}", stats.xcel_requests);
    println!("imem accepted:   {} (stalls {})", summary.imem.accepted, summary.imem.stalls);
    println!("dmem accepted:   {} (stalls {})", summary.dmem.accepted, summary.dmem.stalls);
    if stats.stats_cycles > 0 {
        println!("Stats region:    {} cycles, {} retired", stats.stats_cycles, stats.stats_retired);
    }
    if !th.received().is_empty() {
        println!("proc2mngr:       {:08x?}", th.received());
    }
    println!();
    th.processor().dump_regs();
}

fn run(args: &Args) -> Result<(), SimError> {
    let config = build_config(args)?;

    let (image, expected) = if let Some(path) = &args.elf {
        (MemoryImage::from_elf(path)?, None)
    } else if let Some(path) = &args.bin {
        (MemoryImage::from_bin_file(path, args.load_addr)?, None)
    } else if args.demo {
        let (image, expected) = demo_image();
        (image, Some(expected))
    } else {
        return Err(SimError::Config("nothing to run: pass --elf, --bin or --demo".into()));
    };

    let mut th = TestHarness::new(config)?;
    th.load(&image)?;
    let summary = if args.trace {
        th.run_with_trace(|cycle, line| println!("{cycle:>4}: {line}"))?
    } else {
        th.run()?
    };

    if let Some(expected) = expected {
        th.check(&expected)?;
        println!("Result check passed");
    }
    print_summary(&th, &summary);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.quiet { "error" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            if e.is_test_failure() {
                ExitCode::from(1)
            } else {
                ExitCode::from(2)
            }
        }
    }
}

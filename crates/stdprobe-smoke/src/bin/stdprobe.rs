//! CLI entrypoint for the stdprobe smoke programs.

use std::io::{self, Write};
use std::panic;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use stdprobe_harness::structured_log::LogEmitter;
use stdprobe_harness::{FaultSupport, HarnessConfig, TestHarness};
use stdprobe_smoke::trace::Trace;
use stdprobe_smoke::{Suite, newdel, streamiter};

/// Standard library smoke programs.
#[derive(Debug, Parser)]
#[command(name = "stdprobe")]
#[command(about = "Smoke programs for allocation, destruction and stream iteration")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the allocation/destruction program and print its trace.
    Newdel,
    /// Prompt for a line on stdin and echo the first characters read.
    Streamiter,
    /// Run harness checks and print the pass/fail summary.
    Check {
        /// Which suite to run.
        #[arg(long, value_enum, default_value_t = SuiteArg::All)]
        suite: SuiteArg,
        /// Write one JSONL event per assertion to this path.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Write the JSON summary to this path.
        #[arg(long)]
        report: Option<PathBuf>,
        /// Treat fault signaling as unavailable (`assert_throws` checks are skipped).
        #[arg(long)]
        no_faults: bool,
        /// Suppress per-assertion progress markers.
        #[arg(long)]
        quiet: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SuiteArg {
    Newdel,
    Streamiter,
    All,
}

impl SuiteArg {
    fn suites(self) -> Vec<Suite> {
        match self {
            Self::Newdel => vec![Suite::Newdel],
            Self::Streamiter => vec![Suite::Streamiter],
            Self::All => Suite::ALL.to_vec(),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Newdel => {
            let trace = Trace::new();
            let outcome = newdel::run(&trace);
            let mut out = io::stdout().lock();
            for line in trace.lines() {
                writeln!(out, "{line}")?;
            }
            outcome?;
        }
        Command::Streamiter => {
            let stdin = io::stdin().lock();
            let mut out = io::stdout().lock();
            streamiter::run(stdin, &mut out)?;
        }
        Command::Check {
            suite,
            log,
            report,
            no_faults,
            quiet,
        } => {
            let mut config = HarnessConfig::from_env();
            if no_faults {
                config = config.with_faults(FaultSupport::Disabled);
            }
            if quiet {
                config = config.with_progress(false);
            }

            let mut harness = TestHarness::with_config(config);
            if let Some(path) = &log {
                let run_id = std::process::id().to_string();
                let emitter = LogEmitter::to_file(path, "stdprobe", &run_id)?;
                harness = harness.with_log(emitter);
            }

            // Faults raised by checks are caught and tallied; keep their panic
            // lines off stderr while the suites run.
            let default_hook = panic::take_hook();
            panic::set_hook(Box::new(|_| {}));
            harness.init();
            for suite in suite.suites() {
                suite.check(&mut harness);
            }
            panic::set_hook(default_hook);
            harness.results();

            let summary = harness.summary();
            if let Some(path) = &log {
                eprintln!("Wrote assertion log to {}", path.display());
            }
            if let Some(path) = report {
                summary.write_json(&path)?;
                eprintln!("Wrote summary report to {}", path.display());
            }
            if !summary.all_passed() {
                return Err(format!("{} of {} checks failed", summary.failed, summary.total).into());
            }
        }
    }

    Ok(())
}

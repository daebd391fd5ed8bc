//! Process Scheduler Simulation CLI
//!
//! Runs a deterministic round-robin simulation over a list of
//! (arrival-tick, program-file) pairs. Program files are newline-delimited
//! instruction lines; a blank line ends the program.
//!
//! # Output Format
//!
//! Program output (`print`, `readFile`, prompts, diagnostics) is written to
//! stdout. A statistics line is written to stderr upon completion:
//! `processes=N executed=N ticks=N finished=N faulted=N never_admitted=N
//! queue_overflows=N var_overflows=N truncated_lines=N outcome=...`
//!
//! # Exit Codes
//!
//! - `0`: Run completed (every admitted process finished)
//! - `1`: Deadlock detected or the tick backstop fired
//! - `2`: Invalid arguments or a program file could not be loaded

use std::env;
use std::io;
use std::path::PathBuf;
use std::process::exit;

use schedsim_rs::{load_program, Kernel, KernelConfig, RunOutcome, StdIo};

fn print_usage(exe: &std::ffi::OsStr) {
    eprintln!(
        "usage: {} [OPTIONS] <arrival> <program> [<arrival> <program> ...]

OPTIONS:
    --quantum=<N>           Instructions per scheduling turn (default: 1)
    --max-ticks=<N>         Abort the run past this many clock ticks (default: 100000)
    --show-queues           Print queue/storage tables and scheduling announcements
    --trace-json=<PATH>     Write the run report (counters + trace) as JSON
    --help, -h              Show this help message",
        exe.to_string_lossy()
    );
}

fn main() -> io::Result<()> {
    let mut args = env::args_os();
    let exe = args.next().unwrap_or_else(|| "schedsim".into());

    let mut cfg = KernelConfig::default();
    let mut trace_json: Option<PathBuf> = None;
    let mut positional: Vec<String> = Vec::new();

    for arg in args {
        let arg = match arg.into_string() {
            Ok(arg) => arg,
            Err(bad) => {
                eprintln!("error: argument is not valid UTF-8: {}", bad.to_string_lossy());
                exit(2);
            }
        };

        if arg == "--help" || arg == "-h" {
            print_usage(&exe);
            return Ok(());
        } else if arg == "--show-queues" {
            cfg.show_queues = true;
        } else if let Some(value) = arg.strip_prefix("--quantum=") {
            cfg.time_quantum = match value.parse() {
                Ok(n) if n >= 1 => n,
                _ => {
                    eprintln!("error: --quantum expects an integer >= 1");
                    exit(2);
                }
            };
        } else if let Some(value) = arg.strip_prefix("--max-ticks=") {
            cfg.max_ticks = match value.parse() {
                Ok(n) => n,
                Err(_) => {
                    eprintln!("error: --max-ticks expects an integer");
                    exit(2);
                }
            };
        } else if let Some(value) = arg.strip_prefix("--trace-json=") {
            trace_json = Some(PathBuf::from(value));
        } else if arg.starts_with("--") {
            eprintln!("error: unknown option {arg}");
            print_usage(&exe);
            exit(2);
        } else {
            positional.push(arg);
        }
    }

    if positional.is_empty() || positional.len() % 2 != 0 {
        eprintln!("error: expected (arrival, program) pairs");
        print_usage(&exe);
        exit(2);
    }

    let mut kernel = Kernel::new(cfg);
    let mut spawned = 0u32;
    for pair in positional.chunks(2) {
        let arrival: u64 = match pair[0].parse() {
            Ok(n) => n,
            Err(_) => {
                eprintln!("error: invalid arrival tick: {}", pair[0]);
                exit(2);
            }
        };
        let path = PathBuf::from(&pair[1]);
        let program = match load_program(&path) {
            Ok(program) => program,
            Err(err) => {
                eprintln!("error: cannot load program {}: {err}", path.display());
                exit(2);
            }
        };
        match kernel.spawn(arrival, program) {
            Ok(_) => spawned += 1,
            Err(err) => {
                eprintln!("error: {err}");
                exit(2);
            }
        }
    }

    let mut io = StdIo::new();
    let report = kernel.run(&mut io);

    if let RunOutcome::Deadlock { blocked } = &report.outcome {
        let pids: Vec<String> = blocked.iter().map(|pid| pid.to_string()).collect();
        eprintln!(
            "deadlock: processes {} are blocked with no pending arrivals",
            pids.join(", ")
        );
    }

    eprintln!(
        "processes={} executed={} ticks={} finished={} faulted={} never_admitted={} \
         queue_overflows={} var_overflows={} truncated_lines={} outcome={}",
        spawned,
        report.executed,
        report.final_tick,
        report.finished,
        report.faulted,
        report.never_admitted,
        report.queue_overflows,
        report.var_overflows,
        report.truncated_lines,
        report.outcome,
    );

    if let Some(path) = trace_json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        std::fs::write(&path, json)?;
    }

    match report.outcome {
        RunOutcome::Completed => Ok(()),
        RunOutcome::Deadlock { .. } | RunOutcome::TickLimit => exit(1),
    }
}

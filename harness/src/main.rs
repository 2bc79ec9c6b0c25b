use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use cgen::{generate_with_options, Options, TestCase};
use clap::Parser;
use colored::Colorize;
use rand::Rng;
use similar::TextDiff;

mod run;
use crate::run::run;

/// Differential testing loop: generate a test case under a fresh seed,
/// build and run it with two compilers, compare the printed checksums,
/// and keep every test case the compilers disagree on.
#[derive(Parser, Debug)]
struct Args {
    /// Path to a script that builds and runs a test case with compiler A
    compiler_a: PathBuf,
    /// Path to a script that builds and runs a test case with compiler B
    compiler_b: PathBuf,
    /// Directory mismatching test cases are saved under, named by seed
    out: PathBuf,

    /// Path to .toml configuration for the generator
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Number of trials to run; loops forever when omitted
    #[arg(short, long)]
    num_trials: Option<usize>,
    /// How long to wait before timing out one build-and-run
    #[arg(short, long)]
    timeout: Option<u64>,
}

enum Termination {
    Match,
    Mismatch,
}

struct TrialResult {
    seed: u64,
    termination: Termination,
    both_ended: bool,
    both_compiled: bool,
}

fn trial(cli: &Args, options: &Options, seed: u64) -> Result<(TestCase, TrialResult)> {
    let case = generate_with_options(options.clone(), seed)?;

    let case_dir = tempfile::tempdir()?;
    case.write_to(case_dir.path())?;

    let a = run(
        cli.compiler_a
            .to_str()
            .expect("Can't coerce compiler A script path into string."),
        case_dir.path(),
        cli.timeout,
    )?;
    let b = run(
        cli.compiler_b
            .to_str()
            .expect("Can't coerce compiler B script path into string."),
        case_dir.path(),
        cli.timeout,
    )?;

    let diff = TextDiff::from_lines(&a.output, &b.output);
    let termination = if diff.ratio() == 1.0 {
        Termination::Match
    } else {
        Termination::Mismatch
    };

    let result = TrialResult {
        seed: case.seed,
        termination,
        both_ended: a.termination && b.termination,
        both_compiled: a.compilation && b.compilation,
    };
    Ok((case, result))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Args::parse();

    let options = if let Some(ref path) = cli.config {
        assert!(path.exists(), "Configuration path doesn't exist!");
        toml::from_str::<Options>(&fs::read_to_string(path)?)?
    } else {
        Options::default()
    };

    assert!(cli.out.exists(), "Output path doesn't exist!");

    let mut num_failures = 0usize;
    let mut num_hangs = 0usize;
    let mut trials = 0usize;

    loop {
        if let Some(max) = cli.num_trials {
            if trials >= max {
                break;
            }
        }
        trials += 1;

        // A fresh nonzero seed per trial; the generator records it in the
        // test case so a mismatch can be replayed exactly.
        let seed = rand::rng().random_range(1..=u64::MAX);
        let (case, result) = trial(&cli, &options, seed)?;

        if !result.both_ended {
            num_hangs += 1;
            println!("{} seed {}", "hang".yellow().bold(), result.seed);
        }
        if !result.both_compiled {
            println!("{} seed {}", "build failure".yellow().bold(), result.seed);
        }
        match result.termination {
            Termination::Mismatch => {
                num_failures += 1;
                let dest = cli.out.join(result.seed.to_string());
                case.write_to(&dest)?;
                println!(
                    "{} seed {} saved to {}",
                    "mismatch".red().bold(),
                    result.seed,
                    dest.display()
                );
            }
            Termination::Match => {
                println!("{} seed {}", "ok".green(), result.seed);
            }
        }
    }

    println!(
        "{trials} trials, {} mismatches, {} hangs",
        num_failures.to_string().red(),
        num_hangs.to_string().yellow()
    );
    Ok(())
}

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use cgen::{generate_with_options, parse_seed, Options, Standard, GENERATOR_VERSION};
use clap::Parser;

/// Command-line front end of the generator: parses the knobs, produces one
/// test case, writes the artifact set and reports the seed in use.
#[derive(Parser, Debug)]
#[command(name = "cgen", version = GENERATOR_VERSION)]
struct Args {
    /// Predefined seed (accepted in form of SSS or VV_SSS)
    #[arg(short, long)]
    seed: Option<String>,
    /// Output directory
    #[arg(short = 'd', long, default_value = "./")]
    out_dir: PathBuf,
    /// Generated test's bit mode (32/64)
    #[arg(short = 'm', long)]
    bit_mode: Option<String>,
    /// Generated test's language standard
    #[arg(long = "std")]
    standard: Option<String>,
    /// Path to .toml configuration with generation limits
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Quiet mode
    #[arg(short, long)]
    quiet: bool,

    #[arg(long)]
    max_arith_depth: Option<u32>,
    #[arg(long)]
    min_scope_stmt_count: Option<u32>,
    #[arg(long)]
    max_scope_stmt_count: Option<u32>,
    #[arg(long)]
    max_cse_count: Option<u32>,
    #[arg(long)]
    max_if_depth: Option<u32>,
    #[arg(long)]
    min_inp_var_count: Option<u32>,
    #[arg(long)]
    max_inp_var_count: Option<u32>,
    #[arg(long)]
    min_mix_var_count: Option<u32>,
    #[arg(long)]
    max_mix_var_count: Option<u32>,
    #[arg(long)]
    min_struct_type_count: Option<u32>,
    #[arg(long)]
    max_struct_type_count: Option<u32>,
    #[arg(long)]
    min_inp_struct_count: Option<u32>,
    #[arg(long)]
    max_inp_struct_count: Option<u32>,
    #[arg(long)]
    min_mix_struct_count: Option<u32>,
    #[arg(long)]
    max_mix_struct_count: Option<u32>,
    #[arg(long)]
    min_out_struct_count: Option<u32>,
    #[arg(long)]
    max_out_struct_count: Option<u32>,
    #[arg(long)]
    enable_arrays: Option<bool>,
    #[arg(long)]
    enable_bit_fields: Option<bool>,
    #[arg(long)]
    print_assignments: Option<bool>,
}

macro_rules! apply_overrides {
    ($args:ident, $opts:ident, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $args.$field {
                $opts.$field = value;
            }
        )+
    };
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut options = if let Some(ref path) = args.config {
        Options::from_toml_str(&fs::read_to_string(path)?)?
    } else {
        Options::default()
    };

    if let Some(ref mode) = args.bit_mode {
        options.set_bit_mode(mode)?;
    }
    if let Some(ref std_name) = args.standard {
        options.standard = Standard::parse(std_name)?;
    }
    apply_overrides!(
        args,
        options,
        max_arith_depth,
        min_scope_stmt_count,
        max_scope_stmt_count,
        max_cse_count,
        max_if_depth,
        min_inp_var_count,
        max_inp_var_count,
        min_mix_var_count,
        max_mix_var_count,
        min_struct_type_count,
        max_struct_type_count,
        min_inp_struct_count,
        max_inp_struct_count,
        min_mix_struct_count,
        max_mix_struct_count,
        min_out_struct_count,
        max_out_struct_count,
        enable_arrays,
        enable_bit_fields,
        print_assignments,
    );
    options.validate()?;

    let seed = match args.seed {
        Some(ref arg) => parse_seed(arg)?,
        None => 0,
    };

    let case = generate_with_options(options, seed)?;
    case.write_to(&args.out_dir)?;

    if !args.quiet {
        println!("seed: {}", case.seed);
    }
    Ok(())
}

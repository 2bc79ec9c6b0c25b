mod context;
mod emit;
mod error;
mod expr;
mod options;
mod policy;
mod program;
mod random;
mod stmt;
mod symtab;
mod types;

pub use crate::context::{Context, ScopeStack};
pub use crate::error::{Error, Result};
pub use crate::options::{parse_seed, Options, Standard, GENERATOR_VERSION, PLANE_VERSION};
pub use crate::policy::GenPolicy;
pub use crate::program::{Program, TestCase};
pub use crate::random::RandGen;

/// Generates a full test case under the given options. A seed of zero
/// mints a fresh one; the seed actually used is recorded in the result.
pub fn generate_with_options(options: Options, seed: u64) -> Result<TestCase> {
    options.validate()?;
    let mut rng = RandGen::new(seed);
    let program = Program::generate(options, &mut rng)?;
    Ok(program.emit())
}

pub fn generate(seed: u64) -> Result<TestCase> {
    generate_with_options(Options::default(), seed)
}

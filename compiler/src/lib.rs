pub mod config;
pub mod error;
pub mod factor;
pub mod gate;
pub mod lowering;
pub mod rational;
pub mod reducer;
pub mod scope;

pub use config::CompilerConfig;
pub use error::{
    ArityError, CompileError, GateLoweringError, ScopeError, UnsupportedFeatureError,
};
pub use factor::{Factor, FactorList, Reference};
pub use gate::{Gate, GateContainer, GateKey, GateKind};
pub use lowering::{lower, LoweringOptions};
pub use rational::Rational;
pub use reducer::{reduce_program, Reduced, Reduction};

use constraints::ConstraintSystem;
use ercs_parser::{parse_program, parse_program_buffered, Program};
use tracing::info;

/// A compiled circuit: the lowered system plus the gate list it came from.
#[derive(Clone, Debug)]
pub struct CompiledCircuit {
    pub system: ConstraintSystem,
    pub gates: Vec<Gate>,
    pub entry: String,
    pub inputs: Vec<String>,
    pub output: Option<String>,
}

/// Parse, reduce and lower `source`.
pub fn compile(source: &str, config: &CompilerConfig) -> Result<CompiledCircuit, CompileError> {
    let _span = tracing::info_span!("compile", entry = %config.entry).entered();
    let program = match config.token_buffer {
        Some(capacity) => parse_program_buffered(source, capacity)?,
        None => parse_program(source)?,
    };
    tracing::debug!(functions = program.functions.len(), "parsed");
    compile_program(&program, config)
}

/// Reduce and lower an already parsed program.
pub fn compile_program(program: &Program, config: &CompilerConfig) -> Result<CompiledCircuit, CompileError> {
    let reduced = reduce_program(program, config)?;
    let system = lower(
        reduced.gates.gates(),
        &reduced.inputs,
        reduced.output.as_deref(),
        LoweringOptions {
            randomize: config.randomize,
        },
    )?;
    info!(
        entry = %config.entry,
        rows = system.num_rows(),
        wires = system.num_wires(),
        "circuit compiled"
    );
    Ok(CompiledCircuit {
        system,
        gates: reduced.gates.into_gates(),
        entry: config.entry.clone(),
        inputs: reduced.inputs,
        output: reduced.output,
    })
}

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use compiler::{compile, CompilerConfig};
use constraints::{evaluate, write_witness_json};
use field::Bn254G1Oracle;

/// Compile `path`, evaluate the witness for `inputs` and write it as JSON.
/// The witness is checked against every row before it is written.
pub fn witness_file(
    path: &Path,
    inputs: &str,
    out: Option<&Path>,
    config: &CompilerConfig,
) -> Result<()> {
    let source = super::read_source(path)?;
    let circuit = compile(&source, config)
        .with_context(|| format!("compile error in {}", path.display()))?;
    let inputs = super::parse_inputs(inputs)?;

    let witness = evaluate(&circuit.system, &inputs, &Bn254G1Oracle)
        .context("witness evaluation failed")?;
    circuit
        .system
        .verify(witness.values(), &Bn254G1Oracle)
        .map_err(|row| anyhow!("witness verification failed at row {row}"))?;

    let mut writer = super::output(out)?;
    write_witness_json(&mut writer, &circuit.system, &witness)
        .context("cannot serialize witness")?;
    writer.flush()?;

    eprintln!(
        "evaluated {} ({} values) - verified OK",
        path.display(),
        witness.values().len()
    );
    Ok(())
}

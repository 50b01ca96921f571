use std::path::Path;

use anyhow::{Context, Result};
use compiler::{compile, CompilerConfig};
use constraints::write_system_json;

/// Compile `path` and write the lowered system as JSON.
pub fn compile_file(path: &Path, out: Option<&Path>, config: &CompilerConfig) -> Result<()> {
    let source = super::read_source(path)?;
    let circuit = compile(&source, config)
        .with_context(|| format!("compile error in {}", path.display()))?;

    let mut writer = super::output(out)?;
    write_system_json(&mut writer, &circuit.system, config.encoding)
        .context("cannot serialize constraint system")?;
    writer.flush()?;

    eprintln!(
        "compiled {} ({} rows, {} wires, {} gates)",
        path.display(),
        circuit.system.num_rows(),
        circuit.system.num_wires(),
        circuit.gates.len(),
    );
    Ok(())
}
